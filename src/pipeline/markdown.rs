//! Markdown transducer: lex the input dialect into a typed token stream.
//!
//! ## The dialect
//!
//! Uploaded document text is rarely real Markdown — it is whatever a text
//! extractor produced, with a handful of Markdown habits sprinkled in. This
//! lexer therefore recognises a deliberately small dialect and passes
//! everything else through as plain text:
//!
//! | Input                     | Token                         |
//! |---------------------------|-------------------------------|
//! | `# H` / `## H` / `### H`  | `Heading` (levels 1–3)        |
//! | `#### H` and deeper       | `Heading` (paragraph level)   |
//! | `- item` / `* item`       | `ListItem` (+ begin/end)      |
//! | `**text**`                | `Span::Bold` (inline)         |
//! | blank-line run            | `ParagraphBreak`              |
//! | anything else             | `Paragraph`                   |
//!
//! ## Why typed tokens?
//!
//! An earlier design marked structure with placeholder strings
//! (`%%SECTION%%`-style) that a later pass substituted for real commands.
//! That scheme breaks the moment a placeholder happens to appear in user
//! content. A tagged token stream cannot collide with content: text is text
//! and structure is structure by type, not by convention. [`crate::pipeline::emit`]
//! renders the stream into LaTeX in a single pass.
//!
//! Lexing is total: any input string, including empty or binary-garbage
//! text, produces a token stream.

use once_cell::sync::Lazy;
use regex::Regex;

/// An inline run of text within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Literal text, passed through untouched.
    Text(String),
    /// A `**bold**` span; holds the content between the markers.
    Bold(String),
}

/// Heading depth. Any `#` run deeper than three degrades to [`Paragraph`]
/// rather than failing — extractors produce odd heading runs routinely.
///
/// [`Paragraph`]: HeadingLevel::Paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Section,
    Subsection,
    Subsubsection,
    /// Run-in heading for depth > 3.
    Paragraph,
}

impl HeadingLevel {
    fn from_depth(depth: usize) -> Self {
        match depth {
            1 => HeadingLevel::Section,
            2 => HeadingLevel::Subsection,
            3 => HeadingLevel::Subsubsection,
            _ => HeadingLevel::Paragraph,
        }
    }
}

/// One element of the intermediate representation. Ordering is significant:
/// the sequence defines document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An ordinary content line (leading whitespace preserved).
    Paragraph(Vec<Span>),
    /// A heading line; content has already been span-parsed.
    Heading {
        level: HeadingLevel,
        content: Vec<Span>,
    },
    /// Opens an unordered list. Emitted exactly once per run of items.
    ListBegin,
    /// One `- `/`* ` item; content has already been span-parsed.
    ListItem(Vec<Span>),
    /// Closes an unordered list.
    ListEnd,
    /// A collapsed run of blank lines between content.
    ParagraphBreak,
    /// A blank line at the document edge (not between content).
    Blank,
}

/// Intermediate line classification, after blank-run collapsing but before
/// the structural pass.
enum PreLine<'a> {
    Content(&'a str),
    Break,
    Blank,
}

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// Lex input text into the token stream.
///
/// The algorithm runs three phases:
///
/// 1. Normalise line endings (`\r\n`/`\r` → `\n`) and split into lines.
/// 2. Collapse each maximal run of blank lines *between content* into a
///    single [`Token::ParagraphBreak`]; a run of 2, 3, or 10 blank lines
///    produces the same stream. Runs at the document edges stay [`Token::Blank`].
/// 3. Walk the lines with a single `in_list` flag, closing the list on any
///    non-item line and re-opening it on the next item. List detection takes
///    priority over heading detection, and inline bold is parsed before any
///    structural wrapping so `**bold**` works inside items and headings.
pub fn lex(text: &str) -> Vec<Token> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.split('\n').collect();
    let pre = collapse_blank_runs(&lines);

    let mut tokens = Vec::with_capacity(pre.len());
    let mut in_list = false;

    for line in pre {
        match line {
            PreLine::Break => {
                close_list(&mut tokens, &mut in_list);
                tokens.push(Token::ParagraphBreak);
            }
            PreLine::Blank => {
                close_list(&mut tokens, &mut in_list);
                tokens.push(Token::Blank);
            }
            PreLine::Content(raw) => {
                let trimmed = raw.trim();
                if let Some(content) = list_item_content(trimmed) {
                    if !in_list {
                        tokens.push(Token::ListBegin);
                        in_list = true;
                    }
                    tokens.push(Token::ListItem(parse_spans(content)));
                } else {
                    close_list(&mut tokens, &mut in_list);
                    if let Some((level, content)) = heading(trimmed) {
                        tokens.push(Token::Heading {
                            level,
                            content: parse_spans(content),
                        });
                    } else {
                        // Ordinary line: keep the original indentation.
                        tokens.push(Token::Paragraph(parse_spans(raw)));
                    }
                }
            }
        }
    }

    close_list(&mut tokens, &mut in_list);
    tokens
}

/// Split a line into [`Span`]s, turning each non-greedy `**…**` pair into a
/// bold span. Unmatched `**` markers stay literal text.
pub fn parse_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in BOLD_RE.captures_iter(line) {
        let m = caps.get(0).expect("capture 0 always present");
        if m.start() > last {
            spans.push(Span::Text(line[last..m.start()].to_string()));
        }
        spans.push(Span::Bold(caps[1].to_string()));
        last = m.end();
    }
    if last < line.len() {
        spans.push(Span::Text(line[last..].to_string()));
    }
    spans
}

fn close_list(tokens: &mut Vec<Token>, in_list: &mut bool) {
    if *in_list {
        tokens.push(Token::ListEnd);
        *in_list = false;
    }
}

/// Collapse maximal blank-line runs between content lines into one `Break`.
fn collapse_blank_runs<'a>(lines: &[&'a str]) -> Vec<PreLine<'a>> {
    let blank: Vec<bool> = lines.iter().map(|l| l.trim().is_empty()).collect();
    let first_content = blank.iter().position(|b| !b);
    let last_content = blank.iter().rposition(|b| !b);

    let mut pre = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if !blank[i] {
            pre.push(PreLine::Content(lines[i]));
            i += 1;
            continue;
        }
        let run_start = i;
        while i < lines.len() && blank[i] {
            i += 1;
        }
        let interior = matches!((first_content, last_content),
            (Some(first), Some(last)) if run_start > first && i <= last);
        if interior {
            pre.push(PreLine::Break);
        } else {
            for _ in run_start..i {
                pre.push(PreLine::Blank);
            }
        }
    }
    pre
}

/// A line is a list item iff, after trimming, it starts with `-` or `*`
/// followed by a space. Returns the trimmed item content.
fn list_item_content(trimmed: &str) -> Option<&str> {
    let bytes = trimmed.as_bytes();
    if bytes.len() > 1 && (bytes[0] == b'-' || bytes[0] == b'*') && bytes[1] == b' ' {
        Some(trimmed[2..].trim())
    } else {
        None
    }
}

/// A heading line starts with a run of `#`. Returns the level for the run
/// depth and the trimmed heading content.
fn heading(trimmed: &str) -> Option<(HeadingLevel, &str)> {
    if !trimmed.starts_with('#') {
        return None;
    }
    let depth = trimmed.chars().take_while(|&c| c == '#').count();
    Some((HeadingLevel::from_depth(depth), trimmed[depth..].trim()))
}

// ── Tests ────────────────────────────────────────────────────────────────────
