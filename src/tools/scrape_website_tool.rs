//! Fetch a web page and return its readable text.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::base_tool::{action_input_value, BaseTool, ToolError};

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>").expect("Invalid regex")
});
static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div|h[1-6]|li|tr)>|<br\s*/?>").expect("Invalid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f]+").expect("Invalid regex"));

/// Convert HTML to plain text: drop scripts and styles, strip tags, decode
/// common entities and collapse whitespace.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_STYLE.replace_all(html, "");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let text = SPACES.replace_all(&text, " ");
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read the content of a website.
#[derive(Debug, Clone)]
pub struct ScrapeWebsiteTool {
    max_length: usize,
}

impl Default for ScrapeWebsiteTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeWebsiteTool {
    pub fn new() -> Self {
        Self { max_length: 20_000 }
    }

    /// Builder: cap the returned text at `max_length` characters.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn normalize_url(input: &str) -> String {
        let url = action_input_value(input, &["website_url", "url"]);
        if url.starts_with("http://") || url.starts_with("https://") {
            url
        } else {
            format!("https://{}", url)
        }
    }
}

#[async_trait]
impl BaseTool for ScrapeWebsiteTool {
    fn name(&self) -> &str {
        "scrape"
    }

    fn description(&self) -> &str {
        "Read a website's content as plain text. Input: the page URL."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let url = Self::normalize_url(input);
        if url == "https://" {
            return Err(ToolError::InvalidInput("empty URL".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("minicrew/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let mut text = html_to_text(&body);
        if let Some((idx, _)) = text.char_indices().nth(self.max_length) {
            text.truncate(idx);
            text.push_str("\n[truncated]");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><style>p { color: red; }</style>
            <script>var x = 1;</script></head>
            <body><h1>Venues</h1><p>Moscone&nbsp;Center &amp; more</p>
            <ul><li>One</li><li>Two</li></ul></body></html>"#;
        assert_eq!(html_to_text(html), "Venues\nMoscone Center & more\nOne\nTwo");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(ScrapeWebsiteTool::normalize_url("example.com"), "https://example.com");
        assert_eq!(
            ScrapeWebsiteTool::normalize_url(r#"{"website_url": "http://a.example/x"}"#),
            "http://a.example/x"
        );
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let err = ScrapeWebsiteTool::new().run("  ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
