//! Finalizer: render the token stream into LaTeX body text.
//!
//! A single pure pass over [`Token`]s — each token maps to exactly one line
//! of output, and no token ever produces something that needs rendering
//! again, so one pass reaches a fixed point by construction.
//!
//! Paragraph breaks render as exactly one empty line regardless of how many
//! blank lines the input contained; LaTeX treats one empty line and ten
//! identically, and collapsing here keeps the generated source diffable.
//!
//! The output is *not yet escaped* — [`crate::pipeline::escape`] runs over
//! the rendered body afterwards and knows how to carry the commands inserted
//! here through untouched.

use super::markdown::{HeadingLevel, Span, Token};

/// Render the token stream to a LaTeX body string.
pub fn render(tokens: &[Token]) -> String {
    let mut lines = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Paragraph(spans) => lines.push(render_spans(spans)),
            Token::Heading { level, content } => lines.push(format!(
                "{}{{{}}}",
                heading_command(*level),
                render_spans(content)
            )),
            Token::ListBegin => lines.push(r"\begin{itemize}".to_string()),
            Token::ListItem(spans) => lines.push(format!(r"\item {}", render_spans(spans))),
            Token::ListEnd => lines.push(r"\end{itemize}".to_string()),
            Token::ParagraphBreak | Token::Blank => lines.push(String::new()),
        }
    }
    lines.join("\n")
}

fn render_spans(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(s) => out.push_str(s),
            Span::Bold(s) => {
                out.push_str(r"\textbf{");
                out.push_str(s);
                out.push('}');
            }
        }
    }
    out
}

fn heading_command(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::Section => r"\section",
        HeadingLevel::Subsection => r"\subsection",
        HeadingLevel::Subsubsection => r"\subsubsection",
        HeadingLevel::Paragraph => r"\paragraph",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
