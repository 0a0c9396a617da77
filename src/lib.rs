//! # md2pdf
//!
//! Convert plain text and lightweight Markdown into typeset PDF documents
//! via LaTeX.
//!
//! ## Why this crate?
//!
//! Text extracted from uploads (plain text, Markdown-ish notes, the output
//! of PDF/DOCX extractors) is almost-but-not-quite structured. Feeding it to
//! LaTeX directly fails on the first `%` or `&`; hand-writing LaTeX for
//! every document does not scale. This crate recognises a small, robust
//! Markdown dialect, rewrites it into LaTeX without corrupting literal
//! content, escapes everything that needs escaping exactly once, and drives
//! pdflatex through the fixed multi-pass dance it needs for cross-references
//! and bibliographies.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Lex       headings / lists / bold / paragraph breaks → tokens
//!  ├─ 2. Emit      tokens → LaTeX body commands
//!  ├─ 3. Escape    reserved characters, preserving inserted commands
//!  ├─ 4. Assemble  fixed template + escaped title/authors + body
//!  ├─ 5. Rewrite   optional LLM edit (falls back to the original on failure)
//!  └─ 6. Compile   pdflatex → bibtex → pdflatex ×2 in a scratch directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .title("Field Notes")
//!         .authors("R. Mansuy")
//!         .output("notes.pdf")
//!         .build()?;
//!     let output = convert("# Day one\nWe saw **everything**.", &config).await?;
//!     match output.compilation {
//!         Some(result) if result.is_success() => println!("PDF written"),
//!         Some(result) => eprintln!("compile failed:\n{}", result.log().unwrap_or("")),
//!         None => println!("{}", output.latex),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf = { version = "0.3", default-features = false }
//! ```
//!
//! ## External requirements
//!
//! Compilation needs a `pdflatex` binary on PATH (TeX Live or MiKTeX); the
//! optional bibliography step uses `bibtex` from the same distribution. When
//! pdflatex is missing the pipeline still produces the `.tex` source and
//! reports a deterministic failure instead of erroring.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod rewrite;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    compile_source, convert, convert_sync, text_to_latex, ConversionOutput, ConversionStats,
};
pub use error::Md2PdfError;
pub use pipeline::compile::{compile, pdflatex_available, CompilationResult};
pub use rewrite::rewrite;
