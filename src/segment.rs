//! Paragraph segmentation.
//!
//! Turns a sequence of scraped text nodes into `(title, body)` pairs. Title
//! nodes are the bold labels Google Code renders in front of update lines
//! (`Status:`, `Labels:`, ...); body nodes are everything else.

use crate::model::{Node, NodeKind, TextSegment};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(/?)\s*([a-z][a-z0-9]*)[^>]*?(/?)\s*>").expect("valid tag pattern")
});

/// Split nodes into ordered `(title, body)` segments.
///
/// Consecutive nodes of the same kind are concatenated. A title run becomes
/// the title of the body run that follows it; a trailing title run yields a
/// segment with an empty body. Whitespace-only nodes are skipped and never
/// count as a transition.
#[must_use]
pub fn segment(nodes: &[Node]) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut pending_title = String::new();
    let mut run = String::new();
    let mut run_kind: Option<NodeKind> = None;

    for node in nodes.iter().filter(|node| !node.is_blank()) {
        if run_kind.is_some_and(|kind| kind != node.kind) {
            close_run(&mut segments, &mut pending_title, &mut run, run_kind);
        }
        run_kind = Some(node.kind);
        run.push_str(&node.text);
    }
    close_run(&mut segments, &mut pending_title, &mut run, run_kind);

    if !pending_title.is_empty() {
        segments.push(TextSegment::new(pending_title, String::new()));
    }

    segments
}

fn close_run(
    segments: &mut Vec<TextSegment>,
    pending_title: &mut String,
    run: &mut String,
    kind: Option<NodeKind>,
) {
    let text = std::mem::take(run);
    match kind {
        Some(NodeKind::Title) => *pending_title = text,
        Some(NodeKind::Body) => {
            segments.push(TextSegment::new(std::mem::take(pending_title), text));
        }
        None => {}
    }
}

/// Write nodes back as plain text, titles as `**title**`.
///
/// Only nodes that came from real markup are titles, so body text is copied
/// verbatim, `**` included.
#[must_use]
pub fn nodes_to_text(nodes: &[Node]) -> String {
    let mut text = String::new();
    for node in nodes {
        match node.kind {
            NodeKind::Title if !node.is_blank() => {
                text.push_str("**");
                text.push_str(node.text.trim());
                text.push_str("**");
            }
            _ => text.push_str(&node.text),
        }
    }
    text
}

/// Tokenize a scraped HTML fragment.
///
/// Text inside `<b>` or `<strong>` becomes title nodes, `<br>` becomes a
/// newline, every other tag is dropped. Common entities are decoded.
#[must_use]
pub fn nodes_from_html(fragment: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut bold_depth = 0usize;
    let mut current = String::new();
    let mut last = 0;

    let flush = |nodes: &mut Vec<Node>, current: &mut String, bold: bool| {
        if current.is_empty() {
            return;
        }
        let text = decode_entities(&std::mem::take(current));
        nodes.push(if bold { Node::title(text) } else { Node::body(text) });
    };

    for caps in TAG_RE.captures_iter(fragment) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        current.push_str(&fragment[last..whole.start()]);
        last = whole.end();

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let name = caps
            .get(2)
            .map_or_else(String::new, |m| m.as_str().to_ascii_lowercase());

        match name.as_str() {
            "b" | "strong" => {
                flush(&mut nodes, &mut current, bold_depth > 0);
                if closing {
                    bold_depth = bold_depth.saturating_sub(1);
                } else {
                    bold_depth += 1;
                }
            }
            "br" => current.push('\n'),
            _ => {}
        }
    }
    current.push_str(&fragment[last..]);
    flush(&mut nodes, &mut current, bold_depth > 0);

    nodes
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#37;", "%")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
