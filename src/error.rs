//! Error types for the md2pdf library.
//!
//! Only *fatal* conditions live here — situations where the pipeline cannot
//! produce anything useful. A failed LaTeX compilation is deliberately not
//! an error: it is an expected, reportable outcome carried as
//! [`crate::CompilationResult::Failure`] with its diagnostic log, and a
//! failed LLM rewrite falls back to the unmodified source. The split keeps
//! `Result` signatures honest: `Err` means "nothing was produced", not
//! "something was produced that you may not like".

use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    /// Upstream text extraction produced no usable text. The pipeline does
    /// not run at all for empty input.
    #[error("Input text is empty.\nNothing to convert — check that text extraction produced output.")]
    EmptyInput,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (runtime construction, task join).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display_mentions_extraction() {
        let msg = Md2PdfError::EmptyInput.to_string();
        assert!(msg.contains("empty"), "got: {msg}");
        assert!(msg.contains("extraction"), "got: {msg}");
    }

    #[test]
    fn invalid_config_display() {
        let e = Md2PdfError::InvalidConfig("max_tokens must be ≥ 1".into());
        assert!(e.to_string().contains("max_tokens"));
    }
}
