//! Document assembler: embed an escaped body and metadata into the fixed
//! LaTeX template.
//!
//! This is a pure string interpolation with three named holes — title,
//! authors, body — never a templating language evaluated over user input.
//! All three values must already be escaped by the caller; the assembler
//! performs no transformation of its own, which is what makes the
//! "assembled output contains the inputs verbatim" property testable.
//!
//! The preamble is fixed: article class, the standard maths/graphics/table
//! packages, hyperref with coloured links, and 2.5 cm margins all round.

/// Assemble a complete LaTeX document around an escaped body.
///
/// `\begin{document}` / `\end{document}` are balanced by construction.
pub fn assemble(title: &str, authors: &str, body: &str) -> String {
    format!(
        r"\documentclass[12pt,a4paper]{{article}}
\usepackage[utf8]{{inputenc}}
\usepackage[T1]{{fontenc}}
\usepackage{{amsmath}}
\usepackage{{amsfonts}}
\usepackage{{amssymb}}
\usepackage{{graphicx}}
\usepackage{{booktabs}}
\usepackage{{url}}
\usepackage[colorlinks=true,urlcolor=blue,citecolor=blue,linkcolor=blue]{{hyperref}}
\usepackage[left=2.5cm,right=2.5cm,top=2.5cm,bottom=2.5cm]{{geometry}}

\title{{{title}}}
\author{{{authors}}}
\date{{\today}}

\begin{{document}}

\maketitle

{body}

\end{{document}}
"
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holes_are_interpolated_verbatim() {
        let doc = assemble("My Title", "A. Author and B. Author", "body text here");
        assert!(doc.contains(r"\title{My Title}"));
        assert!(doc.contains(r"\author{A. Author and B. Author}"));
        assert!(doc.contains("body text here"));
    }

    #[test]
    fn document_markers_are_balanced() {
        let doc = assemble("t", "a", "b");
        assert_eq!(doc.matches(r"\begin{document}").count(), 1);
        assert_eq!(doc.matches(r"\end{document}").count(), 1);
        assert!(doc.starts_with(r"\documentclass[12pt,a4paper]{article}"));
        assert!(doc.trim_end().ends_with(r"\end{document}"));
    }

    #[test]
    fn pre_escaped_metadata_is_not_mutated() {
        // The caller already escaped these; the assembler must not touch them.
        let doc = assemble(r"Profit \& Loss", r#"M\"{u}ller"#, r"40\% done");
        assert!(doc.contains(r"\title{Profit \& Loss}"));
        assert!(doc.contains(r"40\% done"));
    }

    #[test]
    fn empty_metadata_still_produces_a_well_formed_document() {
        let doc = assemble("", "", "");
        assert!(doc.contains(r"\title{}"));
        assert!(doc.contains(r"\author{}"));
        assert!(doc.contains(r"\maketitle"));
    }
}
