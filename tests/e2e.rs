//! End-to-end integration tests for md2pdf.
//!
//! The text→LaTeX tests always run. Tests that invoke the TeX toolchain are
//! gated on a local `pdflatex` and skip with a message otherwise, so CI
//! without TeX stays green.
//!
//! Run everything (with a TeX installation):
//!   cargo test --test e2e -- --nocapture

use md2pdf::{convert, text_to_latex, CompilationResult, ConversionConfig};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless pdflatex is installed locally.
macro_rules! skip_unless_pdflatex {
    () => {{
        if !md2pdf::pdflatex_available() {
            println!("SKIP — pdflatex not found on PATH");
            return;
        }
    }};
}

fn output_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("create test output dir")
}

/// Assert the generated LaTeX passes basic structural checks.
fn assert_latex_quality(latex: &str, context: &str) {
    assert!(!latex.trim().is_empty(), "[{context}] LaTeX is empty");
    assert!(
        latex.starts_with(r"\documentclass"),
        "[{context}] must start with \\documentclass"
    );
    assert_eq!(
        latex.matches(r"\begin{document}").count(),
        1,
        "[{context}] exactly one \\begin{{document}}"
    );
    assert_eq!(
        latex.matches(r"\end{document}").count(),
        1,
        "[{context}] exactly one \\end{{document}}"
    );
    for (i, c) in latex.char_indices() {
        if "&%$#_".contains(c) {
            let prev = latex[..i].chars().next_back();
            assert_eq!(
                prev,
                Some('\\'),
                "[{context}] unescaped '{c}' at byte {i}"
            );
        }
    }
    println!("[{context}] ✓  {} bytes, quality checks passed", latex.len());
}

fn no_compile_config() -> ConversionConfig {
    ConversionConfig::builder().compile(false).build().unwrap()
}

// ── Text → LaTeX tests (no TeX needed, always run) ───────────────────────────

#[test]
fn full_dialect_document() {
    let input = "\
# Introduction

This report covers **everything** important.

## Findings

- finding one
- finding **two**
- finding three

Costs rose by 40% ($12 per unit) in Q3_2025.

### Details

#### Appendix note
";
    let latex = text_to_latex(input, &no_compile_config()).unwrap();
    assert_latex_quality(&latex, "full_dialect");

    assert!(latex.contains(r"\section{Introduction}"));
    assert!(latex.contains(r"\subsection{Findings}"));
    assert!(latex.contains(r"\subsubsection{Details}"));
    assert!(latex.contains(r"\paragraph{Appendix note}"));
    assert!(latex.contains(r"\textbf{everything}"));
    assert!(latex.contains(r"\item finding \textbf{two}"));
    assert!(latex.contains(r"40\% (\$12 per unit) in Q3\_2025"));
    assert_eq!(latex.matches(r"\begin{itemize}").count(), 1);
    assert_eq!(latex.matches(r"\end{itemize}").count(), 1);
}

#[test]
fn hostile_input_is_neutralised() {
    // Binary-ish garbage, emoji, stray backslashes, reserved characters:
    // the pipeline must stay total and the output structurally sound.
    let input = "title & 100% $$$ ### \u{7}\u{1b}[31m 🟢🔴 \\evil \\ ~caret^ _u_";
    let latex = text_to_latex(input, &no_compile_config()).unwrap();
    assert_latex_quality(&latex, "hostile_input");
    assert!(latex.contains(r"\textasciitilde{}"));
    assert!(latex.contains(r"\textasciicircum{}"));
    assert!(!latex.contains('\u{7}'));
    assert!(!latex.contains('🟢'));
}

#[test]
fn metadata_appears_verbatim_after_escaping() {
    let config = ConversionConfig::builder()
        .title("Research & Development")
        .authors("A. One and B. Two")
        .compile(false)
        .build()
        .unwrap();
    let latex = text_to_latex("body", &config).unwrap();
    assert!(latex.contains(r"\title{Research \& Development}"));
    assert!(latex.contains(r"\author{A. One and B. Two}"));
}

#[tokio::test]
async fn convert_skips_compilation_when_disabled() {
    let output = convert("# T\ntext", &no_compile_config()).await.unwrap();
    assert!(output.compilation.is_none());
    assert_latex_quality(&output.latex, "no_compile");
}

// ── Compilation tests (need pdflatex) ────────────────────────────────────────

#[tokio::test]
async fn compile_simple_document_produces_pdf() {
    skip_unless_pdflatex!();
    let dir = output_dir();
    let pdf = dir.path().join("simple.pdf");

    let config = ConversionConfig::builder()
        .title("Smoke Test")
        .output(pdf.clone())
        .build()
        .unwrap();

    let output = convert("# Hello\nA **bold** start.\n\n- one\n- two", &config)
        .await
        .expect("conversion should succeed");

    let result = output.compilation.expect("compilation requested");
    match result {
        CompilationResult::Success { ref pdf_path } => {
            assert_eq!(*pdf_path, pdf);
            let bytes = std::fs::read(pdf_path).expect("artifact readable");
            assert!(bytes.starts_with(b"%PDF"), "artifact must be a PDF");
        }
        CompilationResult::Failure { ref log } => {
            panic!("compile failed:\n{log}");
        }
    }
}

#[tokio::test]
async fn compile_failure_reports_a_log() {
    skip_unless_pdflatex!();
    let dir = output_dir();
    let config = ConversionConfig::builder()
        .output(dir.path().join("broken.pdf"))
        .build()
        .unwrap();

    // Invalid document: truncated before \end{document}.
    let broken = r"\documentclass{article}\begin{document}\undefinedmacro";
    let result = md2pdf::compile_source(broken, &config).await.unwrap();

    assert!(!result.is_success(), "broken source must not compile");
    let log = result.log().expect("failure carries a log");
    assert!(!log.trim().is_empty(), "log must not be empty");
    assert!(
        log.len() <= config.max_log_bytes + 200,
        "log must be bounded (got {} bytes)",
        log.len()
    );
    // The artifact must not appear on failure.
    assert!(!dir.path().join("broken.pdf").exists());
}

#[tokio::test]
async fn citing_document_compiles_against_placeholder_bibliography() {
    skip_unless_pdflatex!();
    let dir = output_dir();
    let pdf = dir.path().join("cited.pdf");
    let config = ConversionConfig::builder()
        .output(pdf.clone())
        .build()
        .unwrap();

    // References a citation database that does not exist; the orchestrator
    // must create the placeholder and still reach an artifact.
    let source = "\\documentclass{article}\n\\begin{document}\nBody text.\n\\bibliography{references}\n\\end{document}\n";
    let result = md2pdf::compile_source(source, &config).await.unwrap();

    match result {
        CompilationResult::Success { pdf_path } => {
            assert!(pdf_path.is_file());
        }
        CompilationResult::Failure { log } => {
            panic!("placeholder-bibliography compile failed:\n{log}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_compilations_do_not_collide() {
    skip_unless_pdflatex!();
    let dir = output_dir();

    let mut handles = Vec::new();
    for i in 0..4 {
        let pdf = dir.path().join(format!("doc{i}.pdf"));
        let config = ConversionConfig::builder()
            .title(format!("Document {i}"))
            .output(pdf)
            .build()
            .unwrap();
        handles.push(tokio::spawn(async move {
            convert("# Same\nsource text", &config).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let output = handle.await.unwrap().expect("conversion succeeds");
        let result = output.compilation.expect("compilation requested");
        assert!(
            result.is_success(),
            "concurrent compile {i} failed:\n{}",
            result.log().unwrap_or("")
        );
    }

    // Each invocation delivered its own artifact.
    for i in 0..4 {
        assert!(dir.path().join(format!("doc{i}.pdf")).is_file());
    }
}

#[test]
fn sync_wrapper_compiles_too() {
    skip_unless_pdflatex!();
    let dir = output_dir();
    let config = ConversionConfig::builder()
        .output(dir.path().join("sync.pdf"))
        .build()
        .unwrap();
    let output = md2pdf::convert_sync("plain paragraph text", &config).unwrap();
    assert!(output.compilation.unwrap().is_success());
}

// ── Output path handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn nested_output_directory_is_created() {
    skip_unless_pdflatex!();
    let dir = output_dir();
    let pdf = dir.path().join("a/b/c/deep.pdf");
    let config = ConversionConfig::builder()
        .output(pdf.clone())
        .build()
        .unwrap();
    let output = convert("text", &config).await.unwrap();
    assert!(output.compilation.unwrap().is_success());
    assert!(pdf.is_file());
}
