//! Property tests for rewriting, segmentation and dialect selection.

mod common;

use chrono::{TimeZone, Utc};
use common::{ISSUE_LINK, context};
use gcode_migrate::format::{LEGACY_PREFIX, default_cutoff};
use gcode_migrate::model::{Node, NodeKind};
use gcode_migrate::segment::segment;
use gcode_migrate::{CommitMap, Formatter, FormatterConfig, Message, MessageKind, ReferenceRewriter};
use proptest::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

fn node_kind() -> impl Strategy<Value = NodeKind> {
    prop_oneof![Just(NodeKind::Title), Just(NodeKind::Body)]
}

proptest! {
    #[test]
    fn issue_mentions_map_to_offset_ids(ids in prop::collection::vec(1u64..100_000, 0..12)) {
        let commits = CommitMap::new();
        let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
        let text = ids
            .iter()
            .map(|id| format!("issue {id}"))
            .collect::<Vec<_>>()
            .join(" and ");

        let rewrite = rewriter.rewrite(&text);

        let number = Regex::new(r"#(\d+)").expect("pattern");
        let found: Vec<u64> = number
            .captures_iter(&rewrite.text)
            .map(|caps| caps[1].parse().expect("number"))
            .collect();
        let expected: Vec<u64> = ids.iter().map(|id| id + 10).collect();
        prop_assert_eq!(found, expected);

        let distinct: BTreeSet<u64> = ids.iter().map(|id| id + 10).collect();
        prop_assert_eq!(rewrite.references, distinct);
    }

    #[test]
    fn text_without_references_is_unchanged(text in "[g-z ,.!?]{0,80}") {
        let commits = CommitMap::new();
        let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
        let rewrite = rewriter.rewrite(&text);
        prop_assert_eq!(rewrite.text, text);
        prop_assert!(rewrite.references.is_empty());
    }

    #[test]
    fn untitled_nodes_concatenate(texts in prop::collection::vec("[a-z ]{0,10}", 1..8)) {
        let nodes: Vec<Node> = texts.iter().map(Node::body).collect();
        prop_assume!(nodes.iter().any(|node| !node.is_blank()));

        let expected: String = nodes
            .iter()
            .filter(|node| !node.is_blank())
            .map(|node| node.text.as_str())
            .collect();
        let segments = segment(&nodes);

        prop_assert_eq!(segments.len(), 1);
        prop_assert_eq!(segments[0].title.as_str(), "");
        prop_assert!(!segments[0].is_title);
        prop_assert_eq!(segments[0].body.as_str(), expected.as_str());
    }

    #[test]
    fn whitespace_nodes_segment_to_nothing(
        nodes in prop::collection::vec(("[ \t\n]{0,5}", node_kind()), 0..8)
    ) {
        let nodes: Vec<Node> = nodes
            .into_iter()
            .map(|(text, kind)| Node { text, kind })
            .collect();
        prop_assert!(segment(&nodes).is_empty());
    }

    #[test]
    fn dialect_follows_cutoff(
        seconds in -400_000_000i64..400_000_000,
        head in "[e-z ,.\n<>/]{0,100}",
        pasted in any::<bool>(),
        tail in "[e-z ,.\n<>/]{0,100}",
    ) {
        let body = if pasted {
            format!("{head}{LEGACY_PREFIX}{tail}")
        } else {
            format!("{head}{tail}")
        };
        let commits = CommitMap::new();
        let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
        let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

        let created = default_cutoff().timestamp() + seconds;
        let created = Utc.timestamp_opt(created, 0).single().expect("valid timestamp");
        let message = Message::new(
            MessageKind::Comment,
            created.to_rfc3339(),
            body,
            "someone",
            ISSUE_LINK,
        );
        let rendered = formatter.format(message);

        if created < default_cutoff() {
            prop_assert!(rendered.body.starts_with(LEGACY_PREFIX));
        } else {
            prop_assert!(!rendered.body.contains(LEGACY_PREFIX));
        }
    }
}
