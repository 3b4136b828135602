//! GitHub Markdown dialect.
//!
//! Each segment renders as an optional `####` heading followed by its body in
//! a fenced code block, which keeps the source tracker's preformatted text
//! intact. References inside the fence do not autolink, so they are repeated
//! in the footer.
//!
//! A literal legacy `<pre>` opener in user text gets a zero-width space after
//! its `<`, so Markdown output never carries the legacy wrapper.

use super::{FENCE, Footer, LEGACY_PREFIX};
use crate::error::Diagnostic;
use crate::model::TextSegment;

const INDENT: &str = "    ";
const NEUTRAL_PREFIX: &str = "<\u{200B}pre>\n";

pub(super) fn render(
    segments: &[TextSegment],
    footer: &Footer<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let mut blocks = Vec::new();

    for segment in segments {
        if segment.is_title {
            blocks.push(format!("#### {}", segment.title.trim()));
        }
        // Text after a bold label always starts with a separating space.
        let body = if segment.is_title {
            segment.body.trim()
        } else {
            segment.body.trim_matches(['\n', '\r'])
        };
        if body.trim().is_empty() {
            continue;
        }
        blocks.push(code_block(body, diagnostics));
    }

    let lines = footer.lines(link);
    if !lines.is_empty() {
        blocks.push(format!("---\n{}", lines.join("\n")));
    }

    neutralize_legacy_prefix(blocks.join("\n\n"), diagnostics)
}

pub(super) fn link(text: &str, url: &str) -> String {
    format!("[{text}]({url})")
}

fn neutralize_legacy_prefix(rendered: String, diagnostics: &mut Vec<Diagnostic>) -> String {
    if !rendered.contains(LEGACY_PREFIX) {
        return rendered;
    }
    let diagnostic = Diagnostic::UnexpectedMarkup {
        sequence: LEGACY_PREFIX.trim_end().to_string(),
    };
    diagnostic.emit();
    diagnostics.push(diagnostic);
    rendered.replace(LEGACY_PREFIX, NEUTRAL_PREFIX)
}

fn code_block(body: &str, diagnostics: &mut Vec<Diagnostic>) -> String {
    if body.contains(FENCE) {
        let diagnostic = Diagnostic::UnexpectedMarkup {
            sequence: FENCE.to_string(),
        };
        diagnostic.emit();
        diagnostics.push(diagnostic);
        return indent(body);
    }
    format!("{FENCE}\n{body}\n{FENCE}")
}

fn indent(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
