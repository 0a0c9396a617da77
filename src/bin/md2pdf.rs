//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::{
    compile_source, convert, pdflatex_available, rewrite, CompilationResult, ConversionConfig,
    ConversionOutput, ConversionStats,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a text/Markdown file to PDF
  md2pdf notes.md -o notes.pdf

  # Set the title block
  md2pdf notes.md --title "Field Notes" --authors "R. Mansuy" -o notes.pdf

  # Emit LaTeX source only (no TeX installation needed)
  md2pdf notes.md --tex-only > notes.tex

  # Apply an LLM edit before compiling
  md2pdf notes.md --instruction "add a short abstract" -o notes.pdf

  # Recompile an existing LaTeX document (skips the text pipeline)
  md2pdf paper.tex -o paper.pdf

  # Structured output for scripting
  md2pdf notes.md --json > result.json

REWRITE PROVIDERS:
  The --instruction flag sends the assembled LaTeX document to an LLM
  provider. The provider is resolved from --provider/--model, or
  auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY.
  A failed rewrite never fails the run — the unmodified document is used.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (rewrite)
  ANTHROPIC_API_KEY       Anthropic API key (rewrite)
  GEMINI_API_KEY          Google Gemini API key (rewrite)
  EDGEQUAKE_MODEL         Override rewrite model ID
  EDGEQUAKE_PROVIDER      Override rewrite provider
  MD2PDF_OUTPUT           Default output path

SETUP:
  PDF output needs pdflatex on PATH (TeX Live or MiKTeX). Without it md2pdf
  still produces the .tex source next to the requested output path.
"#;

/// Convert plain text and lightweight Markdown to typeset PDF via LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert plain text and lightweight Markdown to typeset PDF via LaTeX",
    long_about = "Convert plain text and lightweight Markdown documents into typeset PDFs. \
Recognises headings (#, ##, ###), unordered lists (-, *), bold (**…**), and paragraph \
breaks; everything else passes through with LaTeX-safe escaping. A .tex input file is \
recompiled directly, skipping the text pipeline.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document: .txt/.md text, or a complete .tex source to recompile.
    input: PathBuf,

    /// Destination path for the PDF artifact.
    #[arg(short, long, env = "MD2PDF_OUTPUT", default_value = "paper.pdf")]
    output: PathBuf,

    /// Document title (defaults to the input file stem).
    #[arg(long, env = "MD2PDF_TITLE")]
    title: Option<String>,

    /// Author line for the title block.
    #[arg(long, env = "MD2PDF_AUTHORS")]
    authors: Option<String>,

    /// Natural-language edit instruction applied by the LLM rewriter.
    #[arg(long, env = "MD2PDF_INSTRUCTION")]
    instruction: Option<String>,

    /// Emit LaTeX source to stdout instead of compiling.
    #[arg(long)]
    tex_only: bool,

    /// Also write the generated LaTeX source to this file.
    #[arg(long)]
    save_tex: Option<PathBuf>,

    /// LLM model ID for the rewriter (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider for the rewriter: openai, anthropic, gemini, ollama.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Retries for a failing rewrite call.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Output structured JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file {:?}", cli.input))?;

    let config = build_config(&cli)?;

    let is_tex_input = cli
        .input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tex"));

    if is_tex_input {
        run_recompile(&cli, &text, &config).await
    } else {
        run_pipeline(&cli, &text, &config).await
    }
}

/// Recompile path: the input is already a complete LaTeX document.
async fn run_recompile(cli: &Cli, source: &str, config: &ConversionConfig) -> Result<()> {
    let mut source = source.to_string();
    let mut stats = ConversionStats::default();

    if let Some(ref instruction) = cli.instruction {
        let spinner = spinner(cli, "Rewriting…");
        let rewritten = rewrite(&source, instruction, config).await;
        stats.rewritten = rewritten != source;
        source = rewritten;
        finish(spinner);
    }

    if cli.tex_only {
        emit_tex(cli, &source)?;
        return Ok(());
    }
    if let Some(ref path) = cli.save_tex {
        std::fs::write(path, &source)
            .with_context(|| format!("Failed to write LaTeX source to {:?}", path))?;
    }

    let spinner = spinner(cli, "Compiling LaTeX (3 passes)…");
    let result = compile_source(&source, config).await?;
    finish(spinner);

    if cli.json {
        let output = ConversionOutput {
            latex: source,
            compilation: Some(result.clone()),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    report(cli, &result)
}

/// Full pipeline path: text → LaTeX → (rewrite) → compile.
async fn run_pipeline(cli: &Cli, text: &str, config: &ConversionConfig) -> Result<()> {
    let spinner = if config.compile {
        spinner(cli, "Converting and compiling…")
    } else {
        None
    };
    let output = convert(text, config).await.context("Conversion failed")?;
    finish(spinner);

    if cli.tex_only {
        emit_tex(cli, &output.latex)?;
        return Ok(());
    }
    if let Some(ref path) = cli.save_tex {
        std::fs::write(path, &output.latex)
            .with_context(|| format!("Failed to write LaTeX source to {:?}", path))?;
        if !cli.quiet && !cli.json {
            eprintln!("{} LaTeX source saved to {}", dim("•"), path.display());
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    match output.compilation {
        Some(ref result) => report(cli, result),
        None => Ok(()),
    }
}

/// Print the LaTeX source to stdout (tex-only mode) or to --save-tex.
fn emit_tex(cli: &Cli, latex: &str) -> Result<()> {
    if let Some(ref path) = cli.save_tex {
        std::fs::write(path, latex)
            .with_context(|| format!("Failed to write LaTeX source to {:?}", path))?;
        if !cli.quiet {
            eprintln!("{} LaTeX source saved to {}", green("✔"), path.display());
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(latex.as_bytes())
            .context("Failed to write to stdout")?;
        if !latex.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

/// Print the compilation outcome; non-zero exit on failure.
fn report(cli: &Cli, result: &CompilationResult) -> Result<()> {
    match result {
        CompilationResult::Success { pdf_path } => {
            if !cli.quiet && !cli.json {
                eprintln!("{}  {}", green("✔"), bold(&pdf_path.display().to_string()));
            }
            Ok(())
        }
        CompilationResult::Failure { log } => {
            if !cli.json {
                eprintln!("{} LaTeX compilation failed", red("✘"));
                eprintln!("{}", dim(log));
            }
            anyhow::bail!("LaTeX compilation failed");
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    // The input file name stands in for a missing title.
    let title = cli.title.clone().or_else(|| {
        cli.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    });

    let mut builder = ConversionConfig::builder()
        .output(cli.output.clone())
        .compile(!cli.tex_only)
        .max_retries(cli.max_retries);

    if let Some(title) = title {
        builder = builder.title(title);
    }
    if let Some(ref authors) = cli.authors {
        builder = builder.authors(authors.clone());
    }
    if let Some(ref instruction) = cli.instruction {
        builder = builder.instruction(instruction.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    let config = builder.build().context("Invalid configuration")?;

    if config.compile && !pdflatex_available() && !cli.quiet {
        eprintln!(
            "{} pdflatex not found — the LaTeX source will be saved instead of a PDF",
            dim("•")
        );
    }

    Ok(config)
}

/// A steady-tick spinner, unless quiet/json mode disables decoration.
fn spinner(cli: &Cli, message: &'static str) -> Option<ProgressBar> {
    if cli.quiet || cli.json {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish(bar: Option<ProgressBar>) {
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}
