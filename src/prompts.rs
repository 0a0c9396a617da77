//! Prompts for the LLM-backed document rewriter.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the edit contract (e.g. the
//!    no-fences rule) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live provider, making prompt regressions easy to catch.

/// System prompt for applying one edit instruction to a LaTeX document.
///
/// The contract is deliberately strict: the model must return the complete
/// document with only the requested change applied, because the pipeline
/// treats the response as a full replacement source and never re-escapes or
/// re-parses it.
pub const REWRITE_SYSTEM_PROMPT: &str = r#"You are an expert LaTeX editor working on a complete LaTeX document.

Follow these rules precisely:

1. Apply ONLY the change the instruction asks for.
2. Preserve ALL other content exactly as it is — do not summarise, shorten,
   rephrase, reformat, or "improve" anything the instruction does not cover.
3. Keep the document compilable: balanced environments, valid preamble,
   escaped special characters preserved as they are.
4. Reply with the complete modified LaTeX document and nothing else.
5. Do NOT wrap the document in ``` fences and do NOT add commentary."#;

/// Build the user message carrying the instruction and the current source.
pub fn rewrite_request(source: &str, instruction: &str) -> String {
    format!(
        "Instruction: {instruction}\n\nHere is the current LaTeX document:\n\n{source}"
    )
}
