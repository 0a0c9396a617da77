//! Escaper: make arbitrary text safe to paste into a LaTeX document body.
//!
//! The function runs three phases:
//!
//! 1. A coarse character filter that removes control characters and the
//!    DEL..=U+009F range while letting printable ASCII, newlines, and
//!    code points ≥ 160 through to the stricter pass.
//! 2. A single replacement pass over the seven reserved characters
//!    (`& % $ # _ ~ ^`). One pass means an escaped form can never be
//!    re-escaped — the backslash it introduces is not a reserved character.
//! 3. A re-scan that copies recognised backslash sequences through as one
//!    unit and silently drops everything else that could upset the
//!    compiler: stray backslashes and any remaining non-ASCII character
//!    (decorative symbols, emoji).
//!
//! Backslash and curly braces are never escaped here. The caller contract is
//! that input either contains no literal LaTeX, or contains only commands
//! matching the recognised patterns below — which is exactly what
//! [`crate::pipeline::emit`] produces.
//!
//! ## Not idempotent — on purpose
//!
//! `escape` is idempotent on output containing only recognised sequences,
//! but not in general: re-running it on text with stray backslashes drops
//! them. Every caller in this crate escapes each string exactly once (the
//! body after rendering, the title and authors independently, rewritten
//! sources never). Do not "fix" this by making the function idempotent; that
//! would change observable output for edge-case inputs.

/// Escape reserved LaTeX characters in `text`.
///
/// Total over any input: empty strings, pure whitespace, and strings of
/// nothing but reserved characters all produce valid output.
pub fn escape(text: &str) -> String {
    let filtered = coarse_filter(text);
    let replaced = replace_reserved(&filtered);
    rescan(&replaced)
}

/// Phase 1: printable ASCII and newlines pass; code points ≥ 160 survive for
/// the stricter phase-3 pass to judge.
fn coarse_filter(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || (' '..='\u{7e}').contains(&c) || c as u32 >= 160)
        .collect()
}

/// Phase 2: replace the seven reserved characters with their escaped forms.
fn replace_reserved(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Phase 3: copy ASCII through, keep recognised backslash sequences intact,
/// drop stray backslashes and residual non-ASCII silently.
fn rescan(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            match recognised_sequence(&chars[i..]) {
                Some(len) => {
                    out.extend(chars[i..i + len].iter());
                    i += len;
                }
                None => i += 1,
            }
        } else if (c as u32) < 128 {
            out.push(c);
            i += 1;
        } else {
            i += 1;
        }
    }
    out
}

/// Length of the recognised sequence starting at a backslash, if any.
///
/// Recognised forms, longest first:
/// - `\text<letters>{}` — the shape phase 2 itself produces for `~` and `^`
/// - `\<letters>` — a bare command name
/// - `\<c>` for `c` in `` &%$#_{}~^"<>| `` — a single escaped character
fn recognised_sequence(rest: &[char]) -> Option<usize> {
    debug_assert_eq!(rest[0], '\\');

    if rest.len() > 5 && rest[1..5] == ['t', 'e', 'x', 't'] {
        let mut j = 5;
        while j < rest.len() && rest[j].is_ascii_alphabetic() {
            j += 1;
        }
        if j + 1 < rest.len() && rest[j] == '{' && rest[j + 1] == '}' {
            return Some(j + 2);
        }
    }

    let mut j = 1;
    while j < rest.len() && rest[j].is_ascii_alphabetic() {
        j += 1;
    }
    if j > 1 {
        return Some(j);
    }

    if rest.len() > 1 && r#"&%$#_{}~^"<>|"#.contains(rest[1]) {
        return Some(2);
    }

    None
}

// ── Tests ────────────────────────────────────────────────────────────────────
