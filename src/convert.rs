//! Top-level conversion entry points.
//!
//! The full pipeline, in order:
//!
//! ```text
//! text ──▶ lex ──▶ render ──▶ escape ──▶ assemble ──▶ [rewrite] ──▶ [compile]
//!        (tokens)  (LaTeX)  (safe body) (document)    (LLM edit)   (pdflatex)
//! ```
//!
//! Escaping happens exactly once per string: the body after rendering, the
//! title and authors independently. A rewritten document is opaque
//! replacement source — it is never escaped or parsed again, only compiled.
//!
//! The orchestrator blocks on subprocesses, so [`convert`] runs it under
//! `spawn_blocking` to keep the async executor responsive.

use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::pipeline::compile::{compile, CompilationResult};
use crate::pipeline::{assemble, emit, escape, markdown};
use crate::rewrite;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Title used when the caller supplies none.
const DEFAULT_TITLE: &str = "Untitled Document";

/// The result of a full conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete LaTeX source (after any rewrite).
    pub latex: String,
    /// Compilation outcome; `None` when `config.compile` is false.
    pub compilation: Option<CompilationResult>,
    /// Timing and rewrite bookkeeping.
    pub stats: ConversionStats,
}

/// Timing statistics for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Whether the rewriter actually changed the document.
    pub rewritten: bool,
    pub rewrite_duration_ms: u64,
    pub compile_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Convert document text into a complete LaTeX document, without invoking
/// the rewriter or the compiler.
///
/// Pure and synchronous; the only error is empty input.
pub fn text_to_latex(text: &str, config: &ConversionConfig) -> Result<String, Md2PdfError> {
    if text.trim().is_empty() {
        return Err(Md2PdfError::EmptyInput);
    }

    let tokens = markdown::lex(text);
    debug!("lexed {} tokens", tokens.len());
    let body = emit::render(&tokens);
    let body = escape::escape(&body);

    let title = escape::escape(config.title.as_deref().unwrap_or(DEFAULT_TITLE));
    let authors = escape::escape(config.authors.as_deref().unwrap_or(""));

    Ok(assemble::assemble(&title, &authors, &body))
}

/// Convert document text to a typeset PDF (or LaTeX source).
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(Md2PdfError)` only for fatal conditions (empty input,
/// internal task failure). A failed compilation is *not* an error — inspect
/// `output.compilation`.
pub async fn convert(
    text: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    info!("Starting conversion ({} bytes of input)", text.len());

    // ── Step 1: text → LaTeX ─────────────────────────────────────────────
    let mut latex = text_to_latex(text, config)?;
    let mut stats = ConversionStats::default();

    // ── Step 2: optional LLM rewrite ─────────────────────────────────────
    if let Some(ref instruction) = config.instruction {
        let rewrite_start = Instant::now();
        let rewritten = rewrite::rewrite(&latex, instruction, config).await;
        stats.rewrite_duration_ms = rewrite_start.elapsed().as_millis() as u64;
        stats.rewritten = rewritten != latex;
        latex = rewritten;
        info!(
            "rewrite {} in {}ms",
            if stats.rewritten { "applied" } else { "left the document unchanged" },
            stats.rewrite_duration_ms
        );
    }

    // ── Step 3: optional compilation ─────────────────────────────────────
    let compilation = if config.compile {
        let compile_start = Instant::now();
        let source = latex.clone();
        let cfg = config.clone();
        let result = tokio::task::spawn_blocking(move || compile(&source, &cfg))
            .await
            .map_err(|e| Md2PdfError::Internal(format!("compile task failed: {e}")))?;
        stats.compile_duration_ms = compile_start.elapsed().as_millis() as u64;
        Some(result)
    } else {
        None
    };

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!("Conversion complete in {}ms", stats.total_duration_ms);

    Ok(ConversionOutput {
        latex,
        compilation,
        stats,
    })
}

/// Compile an existing complete LaTeX document without re-running the text
/// pipeline — the recompile path for sources edited by hand or by the
/// rewriter.
pub async fn compile_source(
    source: &str,
    config: &ConversionConfig,
) -> Result<CompilationResult, Md2PdfError> {
    let source = source.to_string();
    let cfg = config.clone();
    tokio::task::spawn_blocking(move || compile(&source, &cfg))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("compile task failed: {e}")))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    text: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(text, config))
}

// ── Tests ────────────────────────────────────────────────────────────────────
