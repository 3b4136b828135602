//! Comment "updates" boxes.
//!
//! Google Code appends a box of field changes under each comment:
//!
//! ```text
//! <b>Status:</b> Fixed<br/><b>Blockedon:</b> 12 -13<br/>
//! ```
//!
//! This module turns that box into title and body nodes for the comment and
//! extracts the relation changes (`Blockedon`, `Blocking`, `Mergedinto`),
//! where `-N` marks a removed relation.

use crate::model::{Node, NodeKind};
use crate::segment::{nodes_from_html, nodes_to_text, segment};
use std::collections::BTreeSet;

/// Text the tracker inserts when a change was made without a comment.
pub const NO_COMMENT_PLACEHOLDER: &str = "(No comment was entered for this change.)";

/// Which relation field an update line changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BlockedOn,
    Blocking,
    MergedInto,
}

impl RelationKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_end_matches(':').to_ascii_lowercase().as_str() {
            "blockedon" => Some(Self::BlockedOn),
            "blocking" => Some(Self::Blocking),
            "mergedinto" => Some(Self::MergedInto),
            _ => None,
        }
    }
}

/// One relation line, in source issue numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationUpdate {
    pub kind: RelationKind,
    pub added: Vec<u64>,
    pub removed: Vec<u64>,
}

/// Parsed updates box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Updates {
    /// `<b>` labels as title nodes, values as body nodes.
    pub nodes: Vec<Node>,
    pub relations: Vec<RelationUpdate>,
}

impl Updates {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Node::is_blank)
    }

    /// One `**Field:** value` line per update.
    #[must_use]
    pub fn text(&self) -> String {
        nodes_to_text(&self.nodes).trim().to_string()
    }

    /// Destination ids of relations this update added.
    #[must_use]
    pub fn added_references(&self, offset: u64) -> BTreeSet<u64> {
        self.relations
            .iter()
            .flat_map(|relation| relation.added.iter())
            .filter_map(|id| id.checked_add(offset))
            .collect()
    }

    /// Destination ids of relations this update removed and did not re-add.
    #[must_use]
    pub fn hidden_references(&self, offset: u64) -> BTreeSet<u64> {
        let added = self.added_references(offset);
        self.relations
            .iter()
            .flat_map(|relation| relation.removed.iter())
            .filter_map(|id| id.checked_add(offset))
            .filter(|id| !added.contains(id))
            .collect()
    }
}

/// Parse the inner HTML of an updates box.
#[must_use]
pub fn parse_updates(html: &str) -> Updates {
    let flat = html.trim().replace(['\n', '\r'], "");
    let nodes = nodes_from_html(&flat);

    let relations = segment(&nodes)
        .into_iter()
        .filter_map(|pair| {
            let kind = RelationKind::parse(&pair.title)?;
            let ids = pair.body.lines().next().unwrap_or("");
            let (added, removed) = parse_relation_ids(ids);
            Some(RelationUpdate {
                kind,
                added,
                removed,
            })
        })
        .collect();

    Updates { nodes, relations }
}

/// Split `12 -13 other:4` into added `[12]` and removed `[13]`.
///
/// Cross-project references (`project:id`) are skipped.
fn parse_relation_ids(raw: &str) -> (Vec<u64>, Vec<u64>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    for token in raw.split([' ', ',', '\t']).filter(|t| !t.is_empty()) {
        let (target, digits) = match token.strip_prefix('-') {
            Some(rest) => (&mut removed, rest),
            None => (&mut added, token),
        };
        if let Ok(id) = digits.parse::<u64>() {
            target.push(id);
        }
    }
    (added, removed)
}

/// Append the updates box to a comment's body nodes.
///
/// The user's own nodes are kept as they are. The no-comment placeholder is
/// dropped when updates follow it.
#[must_use]
pub fn compose_comment_body(
    mut nodes: Vec<Node>,
    updates_html: Option<&str>,
) -> (Vec<Node>, Updates) {
    let updates = updates_html.map(parse_updates).unwrap_or_default();
    if updates.is_empty() {
        return (nodes, updates);
    }

    if is_placeholder(&nodes) {
        nodes.clear();
    } else if !nodes.is_empty() {
        nodes.push(Node::body("\n\n"));
    }
    nodes.extend(updates.nodes.iter().cloned());
    (nodes, updates)
}

fn is_placeholder(nodes: &[Node]) -> bool {
    let text: String = nodes.iter().map(|node| node.text.as_str()).collect();
    nodes.iter().all(|node| node.kind == NodeKind::Body) && text.trim() == NO_COMMENT_PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_box_becomes_title_and_body_nodes() {
        let updates = parse_updates("\n<b>Status:</b> Fixed<br/>\n<b>Owner:</b> bob<br />\n");
        assert_eq!(
            updates.nodes,
            vec![
                Node::title("Status:"),
                Node::body(" Fixed\n"),
                Node::title("Owner:"),
                Node::body(" bob\n"),
            ]
        );
        assert_eq!(updates.text(), "**Status:** Fixed\n**Owner:** bob");
        assert!(updates.relations.is_empty());
    }

    #[test]
    fn relations_split_added_and_removed() {
        let updates = parse_updates(
            "<b>Blockedon:</b> 12 -13 other:4<br/><b>Mergedinto:</b> 5<br/><b>Status:</b> Duplicate",
        );
        assert_eq!(
            updates.relations,
            vec![
                RelationUpdate {
                    kind: RelationKind::BlockedOn,
                    added: vec![12],
                    removed: vec![13],
                },
                RelationUpdate {
                    kind: RelationKind::MergedInto,
                    added: vec![5],
                    removed: vec![],
                },
            ]
        );
        assert_eq!(updates.added_references(10), BTreeSet::from([15, 22]));
        assert_eq!(updates.hidden_references(10), BTreeSet::from([23]));
    }

    #[test]
    fn readded_relation_is_not_hidden() {
        let updates = parse_updates("<b>Blockedon:</b> -3<br/><b>Blocking:</b> 3");
        assert!(updates.hidden_references(0).is_empty());
    }

    #[test]
    fn placeholder_dropped_when_updates_present() {
        let (nodes, _) = compose_comment_body(
            vec![Node::body("(No comment was entered for this change.)")],
            Some("<b>Status:</b> WontFix"),
        );
        assert_eq!(nodes, vec![Node::title("Status:"), Node::body(" WontFix")]);
    }

    #[test]
    fn user_text_stays_a_body_node() {
        let (nodes, _) = compose_comment_body(
            vec![Node::body("**not a label** here")],
            Some("<b>Status:</b> Fixed"),
        );
        assert_eq!(
            nodes,
            vec![
                Node::body("**not a label** here"),
                Node::body("\n\n"),
                Node::title("Status:"),
                Node::body(" Fixed"),
            ]
        );
    }

    #[test]
    fn comment_without_updates_is_unchanged() {
        let (nodes, updates) = compose_comment_body(vec![Node::body("Just text")], None);
        assert_eq!(nodes, vec![Node::body("Just text")]);
        assert_eq!(updates, Updates::default());
    }
}
