//! Message formatting.
//!
//! A message moves through three stages:
//!
//! 1. **Raw** - as scraped ([`Message`]).
//! 2. **References rewritten** - [`RewrittenMessage`], produced by
//!    [`Formatter::rewrite`].
//! 3. **Rendered** - [`RenderedMessage`], produced by [`Formatter::render`].
//!
//! Rendering picks one of two dialects from the creation timestamp: messages
//! created on or after the cutoff are rendered as GitHub Markdown, older ones
//! as Textile, which was the destination's markup before that date.

mod markdown;
mod textile;

use crate::dates::{human_date, parse_source_date};
use crate::error::Diagnostic;
use crate::model::{Dialect, Message, MessageKind, Node, RenderedMessage};
use crate::refs::ReferenceRewriter;
use crate::segment::{nodes_to_text, segment};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

pub use textile::{LEGACY_PREFIX, LEGACY_SUFFIX};

/// Rendered bodies this long (in characters) or longer are replaced.
pub const MAX_BODY_CHARS: usize = 65534;

/// Replacement for bodies that reach [`MAX_BODY_CHARS`]. The back-link line
/// of the footer follows it.
pub const TOO_LONG_PLACEHOLDER: &str =
    "_This message was too long to migrate. Please see the original for its full text._";

/// Code fence used by the Markdown dialect.
pub const FENCE: &str = "```";

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<lead>^|\s)@(?P<name>[A-Za-z0-9][A-Za-z0-9-]*)\b").expect("valid mention pattern")
});

/// When the destination switched its house markup to Markdown.
#[must_use]
pub fn default_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 4, 20, 19, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Rendering options, fixed for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    pub cutoff: DateTime<Utc>,
    /// Turn `@name` into `@-name` so the destination does not notify users.
    pub escape_mentions: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            escape_mentions: true,
        }
    }
}

/// A message whose body has had its references rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenMessage {
    /// `body` holds the plain text form of `nodes`.
    pub message: Message,
    /// Rewritten body nodes, titles only where the source had markup.
    pub nodes: Vec<Node>,
    /// Destination ids mentioned in the body text itself.
    pub text_references: BTreeSet<u64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RewrittenMessage {
    /// References listed in the footer.
    ///
    /// Ids a relation update removed are hidden unless the text mentions them.
    #[must_use]
    pub fn footer_references(&self) -> BTreeSet<u64> {
        self.message
            .references
            .iter()
            .chain(self.text_references.iter())
            .copied()
            .filter(|id| {
                !self.message.hidden_references.contains(id) || self.text_references.contains(id)
            })
            .collect()
    }
}

/// Footer fields shared by both dialects.
pub(crate) struct Footer<'m> {
    pub kind: MessageKind,
    pub link: &'m str,
    pub author: &'m str,
    pub date: String,
    pub references: Vec<u64>,
    pub owner: Option<&'m str>,
}

impl Footer<'_> {
    pub const fn origin_label(&self) -> &'static str {
        match self.kind {
            MessageKind::Issue => "Original issue",
            MessageKind::Comment => "Original comment",
        }
    }

    pub const fn attribution_verb(&self) -> &'static str {
        match self.kind {
            MessageKind::Issue => "Reported by",
            MessageKind::Comment => "Posted by",
        }
    }

    pub fn reference_list(&self) -> String {
        self.references
            .iter()
            .map(|id| format!("#{id}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The `_Original issue: ..._` line, if there is a link.
    pub fn origin_line(&self, link: impl Fn(&str, &str) -> String) -> Option<String> {
        (!self.link.is_empty())
            .then(|| format!("_{}: {}_", self.origin_label(), link(self.link, self.link)))
    }

    /// Footer lines, given a function that renders `(text, url)` as a link.
    pub fn lines(&self, link: impl Fn(&str, &str) -> String) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(origin) = self.origin_line(&link) {
            lines.push(origin);
        }
        if !self.author.is_empty() {
            lines.push(format!(
                "_{} {} on {}_",
                self.attribution_verb(),
                self.author,
                self.date
            ));
        }
        if !self.references.is_empty() {
            lines.push(format!("_Referenced issues: {}_", self.reference_list()));
        }
        if let Some(owner) = self.owner {
            lines.push(format!("_Original owner: {owner}_"));
        }
        lines
    }
}

/// Renders messages for one migration run.
pub struct Formatter<'a> {
    config: FormatterConfig,
    rewriter: &'a ReferenceRewriter<'a>,
}

impl<'a> Formatter<'a> {
    #[must_use]
    pub const fn new(config: FormatterConfig, rewriter: &'a ReferenceRewriter<'a>) -> Self {
        Self { config, rewriter }
    }

    #[must_use]
    pub const fn config(&self) -> &FormatterConfig {
        &self.config
    }

    #[must_use]
    pub const fn rewriter(&self) -> &ReferenceRewriter<'a> {
        self.rewriter
    }

    /// Rewrite, then render. The body is a single untitled node.
    #[must_use]
    pub fn format(&self, message: Message) -> RenderedMessage {
        self.render(self.rewrite(message))
    }

    /// Format a message whose body is given as parsed nodes.
    ///
    /// The nodes replace `message.body`.
    #[must_use]
    pub fn format_nodes(&self, message: Message, nodes: &[Node]) -> RenderedMessage {
        self.render(self.rewrite_nodes(message, nodes))
    }

    /// Rewrite references in the body.
    #[must_use]
    pub fn rewrite(&self, message: Message) -> RewrittenMessage {
        let nodes = [Node::body(message.body.as_str())];
        self.rewrite_nodes(message, &nodes)
    }

    /// Rewrite references node by node.
    #[must_use]
    pub fn rewrite_nodes(&self, mut message: Message, nodes: &[Node]) -> RewrittenMessage {
        let mut text_references = BTreeSet::new();
        let mut diagnostics = Vec::new();

        let nodes: Vec<Node> = nodes
            .iter()
            .map(|node| {
                let rewrite = self.rewriter.rewrite(&node.text);
                text_references.extend(rewrite.references);
                diagnostics.extend(rewrite.diagnostics);
                let text = if self.config.escape_mentions {
                    escape_mentions(&rewrite.text)
                } else {
                    rewrite.text
                };
                Node {
                    text,
                    kind: node.kind,
                }
            })
            .collect();
        message.body = nodes_to_text(&nodes);

        RewrittenMessage {
            message,
            nodes,
            text_references,
            diagnostics,
        }
    }

    /// Choose the dialect for a scraped timestamp.
    ///
    /// Unparsable timestamps render as Markdown.
    #[must_use]
    pub fn dialect_for(&self, created_at: &str) -> (Dialect, Option<DateTime<Utc>>) {
        match parse_source_date(created_at) {
            Some(created) if created >= self.config.cutoff => (Dialect::Markdown, Some(created)),
            Some(created) => (Dialect::Textile, Some(created)),
            None => (Dialect::Markdown, None),
        }
    }

    /// Render a rewritten message.
    #[must_use]
    pub fn render(&self, rewritten: RewrittenMessage) -> RenderedMessage {
        let references = rewritten.footer_references();
        let RewrittenMessage {
            message,
            nodes,
            mut diagnostics,
            ..
        } = rewritten;

        let (dialect, created) = self.dialect_for(&message.created_at);
        if created.is_none() {
            let diagnostic = Diagnostic::UnparsableDate {
                raw: message.created_at.clone(),
            };
            diagnostic.emit();
            diagnostics.push(diagnostic);
        }

        let owner = match (&message.kind, &message.owner) {
            (MessageKind::Issue, Some(owner)) if owner.needs_credit() => {
                Some(owner.original.as_str())
            }
            _ => None,
        };
        let footer = Footer {
            kind: message.kind,
            link: &message.original_link,
            author: &message.original_author,
            date: human_date(&message.created_at),
            references: references.iter().copied().collect(),
            owner,
        };

        let body = match dialect {
            Dialect::Markdown => {
                let segments = segment(&nodes);
                markdown::render(&segments, &footer, &mut diagnostics)
            }
            Dialect::Textile => textile::render(&message.body, &footer),
        };
        let back_link = match dialect {
            Dialect::Markdown => footer.origin_line(markdown::link),
            Dialect::Textile => footer.origin_line(textile::link),
        };
        debug!(
            dialect = ?dialect,
            kind = message.kind.label(),
            chars = body.chars().count(),
            "Rendered message"
        );

        let (body, oversize) = enforce_ceiling(body, back_link.as_deref());
        if let Some(diagnostic) = oversize {
            diagnostic.emit();
            diagnostics.push(diagnostic);
        }

        RenderedMessage {
            body,
            dialect,
            references,
            diagnostics,
        }
    }
}

/// Replace a rendered body that reaches the size ceiling.
///
/// The replacement keeps `back_link` so the original stays traceable.
#[must_use]
pub fn enforce_ceiling(
    rendered: String,
    back_link: Option<&str>,
) -> (String, Option<Diagnostic>) {
    let length = rendered.chars().count();
    if length < MAX_BODY_CHARS {
        return (rendered, None);
    }
    let placeholder = match back_link {
        Some(line) => format!("{TOO_LONG_PLACEHOLDER}\n\n{line}"),
        None => TOO_LONG_PLACEHOLDER.to_string(),
    };
    (placeholder, Some(Diagnostic::OversizeBody { length }))
}

/// Turn `@name` into `@-name`.
#[must_use]
pub fn escape_mentions(text: &str) -> String {
    MENTION_RE.replace_all(text, "${lead}@-${name}").into_owned()
}
