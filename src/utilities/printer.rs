//! Console printer with color support for verbose crew output.

use serde::{Deserialize, Serialize};

/// Available colors for printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterColor {
    Red,
    Green,
    Yellow,
    Cyan,
    BoldGreen,
    BoldYellow,
    BoldPurple,
}

impl PrinterColor {
    fn ansi_code(&self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Cyan => "\x1b[36m",
            Self::BoldGreen => "\x1b[1;32m",
            Self::BoldYellow => "\x1b[1;33m",
            Self::BoldPurple => "\x1b[1;35m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Printer for console output with color support.
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer;

impl Printer {
    pub fn new() -> Self {
        Self
    }

    /// Print a message with the specified color.
    pub fn print(&self, content: &str, color: PrinterColor) {
        println!("{}", Self::paint(content, color));
    }

    /// Print a colored label followed by plain content, e.g.
    /// `# Agent: Research Analyst`.
    pub fn print_labeled(&self, label: &str, content: &str, color: PrinterColor) {
        println!("{}{}{} {}", color.ansi_code(), label, RESET, content);
    }

    /// Wrap `content` in the ANSI codes for `color`.
    pub fn paint(content: &str, color: PrinterColor) -> String {
        format!("{}{}{}", color.ansi_code(), content, RESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_with_reset() {
        let painted = Printer::paint("done", PrinterColor::BoldGreen);
        assert!(painted.starts_with("\x1b[1;32m"));
        assert!(painted.ends_with("\x1b[0m"));
        assert!(painted.contains("done"));
    }
}
