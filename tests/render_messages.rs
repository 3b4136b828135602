//! End-to-end formatting of scraped messages.

mod common;

use common::{ISSUE_LINK, commit_map, context, legacy_issue, modern_issue};
use gcode_migrate::format::{LEGACY_PREFIX, MAX_BODY_CHARS, TOO_LONG_PLACEHOLDER};
use gcode_migrate::model::{Dialect, OwnerAttribution};
use gcode_migrate::segment::nodes_from_html;
use gcode_migrate::updates::compose_comment_body;
use gcode_migrate::{
    CommitMap, Diagnostic, Formatter, FormatterConfig, Message, MessageKind, Node,
    ReferenceRewriter,
};
use std::collections::BTreeSet;

#[test]
fn modern_issue_with_sections() {
    common::init_test_logging();
    let commits = commit_map();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let nodes = [
        Node::title("What steps will reproduce the problem?"),
        Node::body(" Run it after r7.\n\n"),
        Node::title("What is the expected output?"),
        Node::body(" No crash, like issue 2."),
    ];
    let rendered = formatter.format_nodes(modern_issue(""), &nodes);

    assert_eq!(rendered.dialect, Dialect::Markdown);
    assert_eq!(rendered.references, BTreeSet::from([12]));
    insta::assert_snapshot!(rendered.body, @r###"
    #### What steps will reproduce the problem?

    ```
    Run it after abc123.
    ```

    #### What is the expected output?

    ```
    No crash, like #12.
    ```

    ---
    _Original issue: [http://code.google.com/p/proj/issues/detail?id=3](http://code.google.com/p/proj/issues/detail?id=3)_
    _Reported by alice on January 02, 2010 03:04:05_
    _Referenced issues: #12_
    "###);
}

#[test]
fn legacy_issue_is_preformatted_textile() {
    let commits = commit_map();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let rendered = formatter.format(legacy_issue("Crash in <init>, see issue 1"));
    assert_eq!(rendered.dialect, Dialect::Textile);
    assert!(rendered.body.starts_with(LEGACY_PREFIX));
    assert!(rendered.body.contains("Crash in &lt;init&gt;, see #11"));
    assert!(rendered.body.contains(&format!("\"{ISSUE_LINK}\":{ISSUE_LINK}")));
}

#[test]
fn comment_with_updates_lists_relation_references() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let (nodes, updates) = compose_comment_body(
        vec![Node::body("(No comment was entered for this change.)")],
        Some("<b>Status:</b> Duplicate<br/><b>Mergedinto:</b> 8<br/>"),
    );
    let mut message = Message::new(
        MessageKind::Comment,
        "Tue Mar 02 10:00:00 2010",
        "",
        "bob",
        "",
    );
    message.references.extend(updates.added_references(10));

    let rendered = formatter.format_nodes(message, &nodes);
    assert_eq!(rendered.references, BTreeSet::from([18]));
    assert!(
        rendered.body.starts_with("#### Status:\n\n```\nDuplicate\n```\n\n#### Mergedinto:\n\n```\n8\n```"),
        "unexpected body: {}",
        rendered.body
    );
    assert!(rendered.body.contains("_Posted by bob on March 02, 2010 10:00:00_"));
}

#[test]
fn html_labels_become_headings() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let nodes = nodes_from_html("<b>Version:</b> 1.2<br><b>OS:</b> linux");
    let rendered = formatter.format_nodes(modern_issue(""), &nodes);
    assert!(
        rendered
            .body
            .starts_with("#### Version:\n\n```\n1.2\n```\n\n#### OS:\n\n```\nlinux\n```\n\n---\n"),
        "unexpected body: {}",
        rendered.body
    );
}

#[test]
fn user_bold_markers_survive_with_updates() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let (nodes, _) = compose_comment_body(
        vec![Node::body("x = 2**10** in python")],
        Some("<b>Status:</b> Fixed<br/>"),
    );
    let message = Message::new(
        MessageKind::Comment,
        "Tue Mar 02 10:00:00 2010",
        "",
        "bob",
        "",
    );
    let rendered = formatter.format_nodes(message, &nodes);
    assert!(
        rendered
            .body
            .starts_with("```\nx = 2**10** in python\n```\n\n#### Status:\n\n```\nFixed\n```"),
        "unexpected body: {}",
        rendered.body
    );
}

#[test]
fn modern_body_never_carries_legacy_wrapper() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let rendered = formatter.format(modern_issue("paste:\n<pre>\nfoo\n</pre>"));
    assert_eq!(rendered.dialect, Dialect::Markdown);
    assert!(!rendered.body.contains(LEGACY_PREFIX), "{}", rendered.body);
    assert!(rendered.body.contains("foo\n</pre>"));
}

#[test]
fn owner_credit_follows_assignment() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let mut message = modern_issue("body");
    message.owner = Some(OwnerAttribution {
        original: "owner@example.com".to_string(),
        mapped: Some("owner".to_string()),
        assignee: Some("owner".to_string()),
    });
    assert!(!formatter.format(message.clone()).body.contains("Original owner"));

    if let Some(owner) = message.owner.as_mut() {
        owner.assignee = None;
    }
    assert!(
        formatter
            .format(message)
            .body
            .contains("_Original owner: owner@example.com_")
    );
}

#[test]
fn oversize_body_is_replaced() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);

    let rendered = formatter.format(modern_issue(&"x".repeat(MAX_BODY_CHARS)));
    assert_eq!(
        rendered.body,
        format!("{TOO_LONG_PLACEHOLDER}\n\n_Original issue: [{ISSUE_LINK}]({ISSUE_LINK})_")
    );
    assert!(matches!(
        rendered.diagnostics.as_slice(),
        [Diagnostic::OversizeBody { length }] if *length > MAX_BODY_CHARS
    ));
}

#[test]
fn mention_escaping_can_be_disabled() {
    let commits = CommitMap::new();
    let rewriter = ReferenceRewriter::new(context(), &commits).expect("rewriter");

    let escaped = Formatter::new(FormatterConfig::default(), &rewriter)
        .format(modern_issue("thanks @carol"));
    assert!(escaped.body.contains("thanks @-carol"));

    let config = FormatterConfig {
        escape_mentions: false,
        ..FormatterConfig::default()
    };
    let kept = Formatter::new(config, &rewriter).format(modern_issue("thanks @carol"));
    assert!(kept.body.contains("thanks @carol"));
}
