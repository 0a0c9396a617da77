//! Compilation orchestrator: drive pdflatex/bibtex to a PDF artifact.
//!
//! ## The fixed three-pass sequence
//!
//! LaTeX resolves cross-references through an auxiliary file: pass 1 only
//! *writes* the reference table, pass 2 reads it, and bibliography
//! resolution has to interleave between them because bibtex both reads the
//! `.aux` from pass 1 and produces citation data pass 2 must re-read. A
//! third unconditional pass picks up references that bibliography
//! resolution itself introduced. The pass count is fixed — no
//! loop-until-stable — trading a little extra work for bounded latency and
//! a state machine with no cycles.
//!
//! ## Failure model
//!
//! [`compile`] is total: every subprocess and filesystem failure becomes a
//! [`CompilationResult::Failure`] carrying a tail-truncated diagnostic log
//! (the actionable TeX error is almost always at the end). The presence of
//! `paper.pdf` is the sole success signal — pdflatex can exit zero and still
//! produce nothing.
//!
//! ## Working directory
//!
//! Each invocation owns a fresh [`tempfile::TempDir`]; its uniqueness is the
//! only concurrency control this module needs, and its `Drop` removes the
//! directory recursively on every exit path, including early failure
//! returns. The artifact is copied out to the configured output path before
//! the guard drops.

use crate::config::ConversionConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Fixed filenames shared with the TeX toolchain. pdflatex and bibtex derive
/// their outputs from the entry stem, so these four names move together.
const ENTRY_FILE: &str = "paper.tex";
const JOB_STEM: &str = "paper";
const ARTIFACT_FILE: &str = "paper.pdf";
const LOG_FILE: &str = "paper.log";
const BIB_FILE: &str = "references.bib";

/// Source substrings that signal a bibliography database is expected.
const BIB_DIRECTIVES: [&str; 2] = [r"\bibliography{references}", r"\addbibresource"];

/// Outcome of one compilation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompilationResult {
    /// The artifact exists and was copied to the configured output path.
    Success { pdf_path: PathBuf },
    /// Any step failed, or the artifact was missing after a clean run.
    /// Carries the combined subprocess output plus the compiler's own log,
    /// truncated from the head so the final (most useful) lines survive.
    Failure { log: String },
}

impl CompilationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationResult::Success { .. })
    }

    /// The failure log, if this is a failure.
    pub fn log(&self) -> Option<&str> {
        match self {
            CompilationResult::Success { .. } => None,
            CompilationResult::Failure { log } => Some(log),
        }
    }
}

/// Resolved once per process and cached; a missing TeX installation does not
/// come back mid-run, and probing PATH on every call would be noise.
static PDFLATEX: Lazy<Option<PathBuf>> = Lazy::new(|| {
    let found = find_tool("pdflatex");
    match &found {
        Some(path) => info!("pdflatex found at {}", path.display()),
        None => warn!("pdflatex not found on PATH; compilation will be unavailable"),
    }
    found
});

/// Whether a pdflatex binary was found on PATH at first use.
pub fn pdflatex_available() -> bool {
    PDFLATEX.is_some()
}

/// Compile a complete LaTeX document to PDF.
///
/// Never panics and never returns an error type: every failure mode is a
/// [`CompilationResult::Failure`]. When pdflatex is unavailable the source
/// is persisted verbatim next to the configured output path (`.tex`
/// extension) for later manual compilation and no subprocess is spawned.
pub fn compile(source: &str, config: &ConversionConfig) -> CompilationResult {
    match PDFLATEX.as_deref() {
        Some(tool) => compile_with_tool(source, config, tool),
        None => persist_uncompiled(source, config),
    }
}

/// Short-circuit path for a missing toolchain: keep the source, report why.
fn persist_uncompiled(source: &str, config: &ConversionConfig) -> CompilationResult {
    let tex_path = config.output.with_extension("tex");
    let reason = "pdflatex was not found on PATH.\n\
                  Install a TeX distribution (TeX Live, MiKTeX) to enable PDF output.";
    let log = match fs::write(&tex_path, source) {
        Ok(()) => format!(
            "{reason}\nThe LaTeX source was saved to '{}' for manual compilation.",
            tex_path.display()
        ),
        Err(e) => format!(
            "{reason}\nAdditionally, saving the LaTeX source to '{}' failed: {e}",
            tex_path.display()
        ),
    };
    CompilationResult::Failure { log }
}

fn compile_with_tool(source: &str, config: &ConversionConfig, pdflatex: &Path) -> CompilationResult {
    let workdir = match TempDir::with_prefix("md2pdf-") {
        Ok(dir) => dir,
        Err(e) => {
            return CompilationResult::Failure {
                log: format!("Failed to create a compilation working directory: {e}"),
            }
        }
    };
    let dir = workdir.path();

    if let Err(e) = fs::write(dir.join(ENTRY_FILE), source) {
        return CompilationResult::Failure {
            log: format!("Failed to write {ENTRY_FILE} into the working directory: {e}"),
        };
    }

    let wants_bib = references_bibliography(source);
    if wants_bib {
        if let Err(e) = ensure_bib_placeholder(dir) {
            // The compiler pass will surface any real consequence.
            warn!("could not create placeholder {BIB_FILE}: {e}");
        }
    }

    let mut log = String::new();
    match run_sequence(pdflatex, dir, wants_bib, &mut log) {
        Ok(()) => {
            let artifact = dir.join(ARTIFACT_FILE);
            if artifact.is_file() {
                deliver_artifact(&artifact, &config.output, &mut log, config.max_log_bytes)
            } else {
                let mut full = format!(
                    "All compiler passes exited cleanly but no {ARTIFACT_FILE} was produced.\n"
                );
                full.push_str(&log);
                append_compiler_log(dir, &mut full);
                CompilationResult::Failure {
                    log: tail_truncate(&full, config.max_log_bytes),
                }
            }
        }
        Err(step) => {
            let mut full = format!("{step}\n");
            full.push_str(&log);
            append_compiler_log(dir, &mut full);
            CompilationResult::Failure {
                log: tail_truncate(&full, config.max_log_bytes),
            }
        }
    }
    // `workdir` drops here: the working directory is removed recursively on
    // every path above.
}

/// Pass 1 → optional bibtex → pass 2 → pass 3. Compiler failures abort the
/// sequence; a bibtex failure only costs unresolved citations.
fn run_sequence(
    pdflatex: &Path,
    dir: &Path,
    wants_bib: bool,
    log: &mut String,
) -> Result<(), String> {
    run_compiler_pass(pdflatex, dir, log, 1)?;

    if wants_bib && dir.join(BIB_FILE).exists() {
        match run_tool("bibtex", &[JOB_STEM], dir, log) {
            Ok(true) => debug!("bibtex completed"),
            Ok(false) => warn!("bibtex exited non-zero; citations may render unresolved"),
            Err(e) => {
                warn!("bibtex could not be spawned: {e}");
                log.push_str(&format!("bibtex could not be spawned: {e}\n"));
            }
        }
    }

    run_compiler_pass(pdflatex, dir, log, 2)?;
    run_compiler_pass(pdflatex, dir, log, 3)?;
    Ok(())
}

fn run_compiler_pass(
    pdflatex: &Path,
    dir: &Path,
    log: &mut String,
    pass: u8,
) -> Result<(), String> {
    debug!("pdflatex pass {pass} starting");
    match run_tool(pdflatex, &["-interaction=nonstopmode", ENTRY_FILE], dir, log) {
        Ok(true) => {
            info!("pdflatex pass {pass} completed");
            Ok(())
        }
        Ok(false) => Err(format!("pdflatex pass {pass} exited with a non-zero status.")),
        Err(e) => Err(format!("pdflatex pass {pass} could not be spawned: {e}.")),
    }
}

/// Run one external tool inside the working directory, blocking until it
/// exits, and append its combined output to the log. Returns whether the
/// exit status was zero.
fn run_tool(
    program: impl AsRef<OsStr>,
    args: &[&str],
    dir: &Path,
    log: &mut String,
) -> std::io::Result<bool> {
    let output = Command::new(program).args(args).current_dir(dir).output()?;
    log.push_str(&String::from_utf8_lossy(&output.stdout));
    log.push('\n');
    log.push_str(&String::from_utf8_lossy(&output.stderr));
    log.push('\n');
    Ok(output.status.success())
}

/// Copy the artifact out of the working directory before the guard drops.
fn deliver_artifact(
    artifact: &Path,
    dest: &Path,
    log: &mut String,
    max_log_bytes: usize,
) -> CompilationResult {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                log.push_str(&format!(
                    "Failed to create output directory '{}': {e}\n",
                    parent.display()
                ));
                return CompilationResult::Failure {
                    log: tail_truncate(log, max_log_bytes),
                };
            }
        }
    }
    match fs::copy(artifact, dest) {
        Ok(_) => {
            info!("PDF artifact written to {}", dest.display());
            CompilationResult::Success {
                pdf_path: dest.to_path_buf(),
            }
        }
        Err(e) => {
            log.push_str(&format!(
                "Compilation succeeded but copying the artifact to '{}' failed: {e}\n",
                dest.display()
            ));
            CompilationResult::Failure {
                log: tail_truncate(log, max_log_bytes),
            }
        }
    }
}

/// Does the source reference a citation database?
fn references_bibliography(source: &str) -> bool {
    BIB_DIRECTIVES.iter().any(|d| source.contains(d))
}

/// Create an empty-but-valid bibliography database so bibtex and
/// `\bibliography{references}` have a file to open. A real database supplied
/// upstream is left untouched.
fn ensure_bib_placeholder(dir: &Path) -> std::io::Result<()> {
    let path = dir.join(BIB_FILE);
    if !path.exists() {
        fs::write(&path, "% placeholder bibliography database\n")?;
    }
    Ok(())
}

/// Append the compiler's own log file when readable. TeX logs are not
/// reliably UTF-8, hence the lossy read.
fn append_compiler_log(dir: &Path, log: &mut String) {
    if let Ok(bytes) = fs::read(dir.join(LOG_FILE)) {
        log.push_str("--- paper.log ---\n");
        log.push_str(&String::from_utf8_lossy(&bytes));
    }
}

/// Keep the final `max_bytes` of the log, respecting char boundaries. The
/// head is the expendable part: TeX prints its fatal error last.
fn tail_truncate(log: &str, max_bytes: usize) -> String {
    if log.len() <= max_bytes {
        return log.to_string();
    }
    let mut start = log.len() - max_bytes;
    while !log.is_char_boundary(start) {
        start += 1;
    }
    format!(
        "… (log truncated to the final {} bytes)\n{}",
        log.len() - start,
        &log[start..]
    )
}

/// Locate a binary on PATH, the way the shell would.
fn find_tool(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;

    #[test]
    fn bibliography_detection() {
        assert!(references_bibliography(r"text \bibliography{references} more"));
        assert!(references_bibliography(r"\addbibresource{refs.bib}"));
        assert!(!references_bibliography(r"\section{References} by hand"));
        assert!(!references_bibliography(""));
    }

    #[test]
    fn bib_placeholder_created_once() {
        let dir = TempDir::new().unwrap();
        ensure_bib_placeholder(dir.path()).unwrap();
        let path = dir.path().join(BIB_FILE);
        assert!(path.is_file());

        // A pre-existing database must not be overwritten.
        fs::write(&path, "@article{real,}").unwrap();
        ensure_bib_placeholder(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "@article{real,}");
    }

    #[test]
    fn tail_truncation_keeps_the_end() {
        let log = format!("{}THE ACTUAL ERROR", "x".repeat(10_000));
        let truncated = tail_truncate(&log, 100);
        assert!(truncated.contains("THE ACTUAL ERROR"));
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < 200);
    }

    #[test]
    fn tail_truncation_respects_char_boundaries() {
        let log = format!("{}end", "é".repeat(5_000));
        let truncated = tail_truncate(&log, 100);
        assert!(truncated.ends_with("end"));
    }

    #[test]
    fn short_log_is_untouched() {
        assert_eq!(tail_truncate("short", 5000), "short");
    }

    #[test]
    fn missing_binary_is_not_found() {
        assert!(find_tool("definitely-not-a-real-binary-name").is_none());
    }

    #[test]
    fn working_directories_never_collide() {
        let dirs: Vec<TempDir> = (0..16)
            .map(|_| TempDir::with_prefix("md2pdf-").unwrap())
            .collect();
        let mut paths: Vec<_> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 16);
    }

    #[test]
    fn unavailable_tool_persists_source_and_reports() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("doc.pdf");
        let config = ConversionConfig::builder()
            .output(output.clone())
            .build()
            .unwrap();

        let result = persist_uncompiled("\\documentclass{article}", &config);
        assert!(!result.is_success());
        assert!(result.log().unwrap().contains("pdflatex was not found"));

        let tex = dir.path().join("doc.tex");
        assert_eq!(
            fs::read_to_string(tex).unwrap(),
            "\\documentclass{article}"
        );
        // No artifact and no stray working directory appear.
        assert!(!output.exists());
    }

    #[test]
    fn failure_log_serialises_for_json_output() {
        let result = CompilationResult::Failure {
            log: "boom".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status\":\"failure\""));
        let back: CompilationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.log(), Some("boom"));
    }
}
