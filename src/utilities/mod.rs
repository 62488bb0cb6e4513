//! Shared utilities: errors, prompts, placeholder interpolation and colored
//! console output.

pub mod errors;
pub mod printer;
pub mod prompts;
pub mod string_utils;
