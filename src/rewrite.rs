//! Generative rewriter: apply a natural-language edit to a LaTeX document.
//!
//! This is a boundary, not a pipeline stage: the provider is a black box
//! that either returns a complete replacement document or fails. Two rules
//! keep the boundary safe:
//!
//! * **Fallback, never failure.** An edit instruction is optional
//!   enrichment. If the provider cannot be resolved, errors out after
//!   retries, or returns an empty document, [`rewrite`] returns the
//!   original source unchanged and logs a warning.
//! * **Opaque output.** The returned text re-enters the pipeline at the
//!   compile boundary only — it is never re-escaped or re-parsed. The one
//!   repair applied is stripping a ``` fence wrapped around the whole
//!   response, because models disobey the no-fences rule often enough to
//!   make the repair cheaper than the retry.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering a
//! recovering endpoint: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s.

use crate::config::ConversionConfig;
use crate::prompts::{rewrite_request, REWRITE_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Model used when a provider name is given without a model.
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Apply `instruction` to `source` via the configured LLM provider.
///
/// Total: always returns a usable document. On success that is the
/// provider's replacement text (fence-stripped); on any failure it is
/// `source` unchanged.
pub async fn rewrite(source: &str, instruction: &str, config: &ConversionConfig) -> String {
    let provider = match resolve_provider(config) {
        Ok(p) => p,
        Err(reason) => {
            warn!("rewrite skipped: {reason}");
            return source.to_string();
        }
    };

    let messages = vec![
        ChatMessage::system(REWRITE_SYSTEM_PROMPT),
        ChatMessage::user(rewrite_request(source, instruction)),
    ];
    let options = CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "rewrite retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let text = strip_outer_fences(&response.content);
                if text.trim().is_empty() {
                    warn!("rewrite returned an empty document; keeping the original source");
                    return source.to_string();
                }
                debug!(
                    "rewrite succeeded: {} input tokens, {} output tokens",
                    response.prompt_tokens, response.completion_tokens
                );
                return text;
            }
            Err(e) => {
                warn!("rewrite attempt {} failed — {}", attempt + 1, e);
            }
        }
    }

    warn!(
        "rewrite failed after {} retries; keeping the original source",
        config.max_retries
    );
    source.to_string()
}

/// Resolve the rewrite provider, from most-specific to least-specific:
/// a pre-built provider in the config, then a named provider (API key read
/// from the environment by the factory), then full auto-detection across all
/// known API key variables.
fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, String> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return ProviderFactory::create_llm_provider(name, model)
            .map_err(|e| format!("provider '{name}' is not configured: {e}"));
    }

    ProviderFactory::from_env()
        .map(|(llm_provider, _embedding)| llm_provider)
        .map_err(|e| {
            format!(
                "no LLM provider auto-detected from the environment \
                 (set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure one): {e}"
            )
        })
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:latex|tex)?\n(.*)\n```\s*$").unwrap());

/// Strip a code fence wrapped around the entire response, if present.
fn strip_outer_fences(response: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(response.trim()) {
        caps[1].to_string()
    } else {
        response.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_latex_fences() {
        let wrapped = "```latex\n\\documentclass{article}\n```";
        assert_eq!(strip_outer_fences(wrapped), "\\documentclass{article}");
    }

    #[test]
    fn strips_bare_fences() {
        let wrapped = "```\n\\documentclass{article}\n```\n";
        assert_eq!(strip_outer_fences(wrapped), "\\documentclass{article}");
    }

    #[test]
    fn unfenced_response_passes_through() {
        let doc = "\\documentclass{article}\n\\begin{document}x\\end{document}";
        assert_eq!(strip_outer_fences(doc), doc);
    }

    #[test]
    fn interior_fences_are_preserved() {
        // Only a fence around the whole response is a wrapper; fences inside
        // the document (verbatim examples) must stay.
        let doc = "start\n```\ncode\n```\nend";
        assert_eq!(strip_outer_fences(doc), doc);
    }

    #[tokio::test]
    async fn unresolvable_provider_falls_back_to_original() {
        // No provider, no provider_name, and (in a clean test environment)
        // nothing for auto-detection to find on the happy path — either way
        // the contract is the same: the original source comes back.
        let config = ConversionConfig::builder()
            .provider_name("definitely-not-a-real-provider")
            .max_retries(0)
            .build()
            .unwrap();
        let source = "\\documentclass{article}\\begin{document}x\\end{document}";
        let out = rewrite(source, "do nothing", &config).await;
        assert_eq!(out, source);
    }
}
