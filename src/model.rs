//! Records passed between the rewriter, segmenter and formatter.
//!
//! Everything here is created fresh for one input record and dropped once the
//! rendered body has been produced.

use crate::error::Diagnostic;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of a scraped text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Bold or emphasized text, used as a paragraph title.
    Title,
    /// Plain text.
    Body,
}

/// One text node of a parsed document fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub text: String,
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn title(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NodeKind::Title,
        }
    }

    #[must_use]
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NodeKind::Body,
        }
    }

    /// True when the node carries no visible text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A `(title, body)` pair produced by segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextSegment {
    pub title: String,
    pub body: String,
    pub is_title: bool,
}

impl TextSegment {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        let is_title = !title.is_empty();
        Self {
            title,
            body: body.into(),
            is_title,
        }
    }
}

/// What a reference in free text points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Issue,
    Commit,
    SourceLink,
}

/// A single reference located by one of the rewriter's matchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ReferenceMatch {
    pub kind: ReferenceKind,
    /// The id, revision or path as written in the source text.
    pub raw_value: String,
    /// Issue numbering offset in effect for this rewrite.
    pub offset: u64,
    /// Replacement text, or `None` when the reference was left untouched.
    pub resolved_target: Option<String>,
    /// Byte range of the match in the input text.
    pub start: usize,
    pub end: usize,
}

/// Whether a message is the issue description or a follow-up comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Issue,
    Comment,
}

impl MessageKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Comment => "comment",
        }
    }
}

/// Owner information carried by issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OwnerAttribution {
    /// Owner as shown on the source tracker.
    pub original: String,
    /// Destination user the owner maps to, if any.
    #[serde(default)]
    pub mapped: Option<String>,
    /// Destination assignee actually set on the new issue.
    #[serde(default)]
    pub assignee: Option<String>,
}

impl OwnerAttribution {
    /// The original owner is credited when the assignee is not the mapped owner.
    #[must_use]
    pub fn needs_credit(&self) -> bool {
        self.assignee != self.mapped
    }
}

/// The unit handed to the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    #[serde(default)]
    pub kind: MessageKind,
    /// Creation timestamp exactly as scraped.
    pub created_at: String,
    pub body: String,
    pub original_author: String,
    pub original_link: String,
    /// Destination issue numbers already known to be referenced.
    #[serde(default)]
    pub references: BTreeSet<u64>,
    /// Destination issue numbers a relation update removed.
    #[serde(default)]
    pub hidden_references: BTreeSet<u64>,
    #[serde(default)]
    pub owner: Option<OwnerAttribution>,
}

impl Message {
    #[must_use]
    pub fn new(
        kind: MessageKind,
        created_at: impl Into<String>,
        body: impl Into<String>,
        original_author: impl Into<String>,
        original_link: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            created_at: created_at.into(),
            body: body.into(),
            original_author: original_author.into(),
            original_link: original_link.into(),
            references: BTreeSet::new(),
            hidden_references: BTreeSet::new(),
            owner: None,
        }
    }
}

/// Markup dialect a message was rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Markdown,
    Textile,
}

/// Final output of the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RenderedMessage {
    pub body: String,
    pub dialect: Dialect,
    pub references: BTreeSet<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}
