//! Legacy Textile dialect.

use super::Footer;

/// Opening of the block every legacy body is wrapped in.
pub const LEGACY_PREFIX: &str = "<pre>\n";
/// Closing of the legacy block.
pub const LEGACY_SUFFIX: &str = "\n</pre>";

pub(super) fn render(body: &str, footer: &Footer<'_>) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(LEGACY_PREFIX);
    out.push_str(&escape_html(body.trim_matches(['\n', '\r'])));
    out.push_str(LEGACY_SUFFIX);

    let lines = footer.lines(link);
    if !lines.is_empty() {
        out.push_str("\n\n");
        out.push_str(&lines.join("\n"));
    }
    out
}

pub(super) fn link(text: &str, url: &str) -> String {
    format!("\"{text}\":{url}")
}

/// Escape text for inclusion inside `<pre>`.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
