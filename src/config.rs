//! Configuration types for text-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.
//!
//! # Design choice: no global backend state
//! The rewrite backend (provider, model) is a per-call value threaded through
//! this struct, never a process-wide selection. Two concurrent conversions
//! can use different models without observing each other.

use crate::error::Md2PdfError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a text-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .title("Quarterly Report")
///     .authors("A. Author")
///     .output("report.pdf")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Document title, escaped before it enters the template.
    /// Default: None ("Untitled Document" is used).
    pub title: Option<String>,

    /// Author line, escaped before it enters the template. Default: None
    /// (an empty `\author{}`).
    pub authors: Option<String>,

    /// Optional natural-language edit instruction for the LLM rewriter.
    ///
    /// An instruction is optional enrichment, never a correctness
    /// requirement: if the rewrite fails for any reason the pipeline
    /// continues with the unmodified source.
    pub instruction: Option<String>,

    /// Run the LaTeX toolchain after assembly. Default: true.
    ///
    /// Disable to obtain the `.tex` source only (`--tex-only` in the CLI),
    /// for example when compilation happens on a different machine.
    pub compile: bool,

    /// Destination path for the PDF artifact. Default: `paper.pdf`.
    ///
    /// The compilation itself happens in a private working directory; only
    /// the finished artifact lands here. When pdflatex is unavailable the
    /// LaTeX source is persisted at this path with a `.tex` extension
    /// instead.
    pub output: PathBuf,

    /// Maximum bytes of diagnostic log kept on failure. Default: 5000.
    ///
    /// TeX logs routinely run to hundreds of kilobytes; the actionable error
    /// is nearly always in the final screenful, so failures keep the tail.
    pub max_log_bytes: usize,

    /// LLM model identifier for the rewriter, e.g. "gpt-4.1-nano".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name for the rewriter (e.g. "openai", "anthropic").
    /// If None along with `provider`, auto-detection from the environment
    /// is attempted when an instruction is present.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the rewrite completion. Default: 0.1.
    ///
    /// A rewrite must change exactly what the instruction asks for and
    /// nothing else; low temperature keeps the model faithful to the
    /// surrounding document.
    pub temperature: f32,

    /// Maximum tokens the rewriter may generate. Default: 8192.
    ///
    /// The rewriter returns the *complete* replacement document, so this
    /// must cover the whole source plus the edit, not just the changed part.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient rewrite failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            title: None,
            authors: None,
            instruction: None,
            compile: true,
            output: PathBuf::from("paper.pdf"),
            max_log_bytes: 5000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("title", &self.title)
            .field("authors", &self.authors)
            .field("instruction", &self.instruction)
            .field("compile", &self.compile)
            .field("output", &self.output)
            .field("max_log_bytes", &self.max_log_bytes)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.config.authors = Some(authors.into());
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.instruction = Some(instruction.into());
        self
    }

    pub fn compile(mut self, v: bool) -> Self {
        self.config.compile = v;
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    pub fn max_log_bytes(mut self, n: usize) -> Self {
        self.config.max_log_bytes = n.max(256);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.output.file_name().is_none() {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Output path '{}' has no file name",
                c.output.display()
            )));
        }
        if c.max_tokens == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ConversionConfig::default();
        assert!(config.compile);
        assert_eq!(config.output, PathBuf::from("paper.pdf"));
        assert_eq!(config.max_log_bytes, 5000);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn builder_round_trip() {
        let config = ConversionConfig::builder()
            .title("T")
            .authors("A")
            .instruction("make the abstract shorter")
            .compile(false)
            .output("out/doc.pdf")
            .max_retries(1)
            .build()
            .unwrap();
        assert_eq!(config.title.as_deref(), Some("T"));
        assert_eq!(config.authors.as_deref(), Some("A"));
        assert!(!config.compile);
        assert_eq!(config.output, PathBuf::from("out/doc.pdf"));
    }

    #[test]
    fn temperature_is_clamped() {
        let config = ConversionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn max_log_bytes_has_a_floor() {
        let config = ConversionConfig::builder().max_log_bytes(1).build().unwrap();
        assert_eq!(config.max_log_bytes, 256);
    }

    #[test]
    fn output_without_file_name_is_rejected() {
        let err = ConversionConfig::builder().output("/").build().unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn debug_elides_the_provider() {
        let s = format!("{:?}", ConversionConfig::default());
        assert!(s.contains("provider: None"));
    }
}
