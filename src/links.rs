//! Tracker URLs and the back-link footer.

use once_cell::sync::Lazy;
use regex::Regex;

static FOOTER_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"_Original issue: [\["]?https?://code\.google\.com/p/(?P<project>[^/\s]+)/issues/detail\?id=(?P<id>\d+)"#,
    )
    .expect("valid footer pattern")
});

/// URL of an issue detail page on the source tracker.
#[must_use]
pub fn source_issue_url(project: &str, id: u64) -> String {
    format!("http://code.google.com/p/{project}/issues/detail?id={id}")
}

/// Find the source issue id a migrated body points back to.
///
/// Used to recognise issues that were already migrated in an earlier run.
#[must_use]
pub fn original_id_from_body(body: &str, project: &str) -> Option<u64> {
    FOOTER_ID_RE
        .captures_iter(body)
        .find(|caps| caps.name("project").is_some_and(|m| m.as_str() == project))
        .and_then(|caps| caps.name("id")?.as_str().parse().ok())
}
