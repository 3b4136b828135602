//! Reference rewriting.
//!
//! Scans free text for issue mentions, revision mentions and source-browse
//! links written in Google Code conventions and rewrites them for the
//! destination repository:
//!
//! | Source text | Rewritten to |
//! |-------------|--------------|
//! | `issue 42`, `Issue #42`, `issue-42` | `#` + (42 + offset) |
//! | `http://code.google.com/p/<project>/issues/detail?id=42` | `#` + (42 + offset) |
//! | `r7`, `revision 7`, `commit 3fa1b2c` | mapped destination commit |
//! | `.../source/browse/trunk/src/main.c?r=7#20` | `{repo}/blob/{commit}/src/main.c#20` |
//!
//! Matching is a single forward pass. At each position the leftmost match over
//! all matchers wins; ties go to the matcher listed first (issue, commit,
//! source link).

use crate::commits::CommitMap;
use crate::error::{Diagnostic, Result};
use crate::model::{ReferenceKind, ReferenceMatch};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

static COMMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?P<kw>(?i:revision|rev))[ \t]*r?(?P<kw_rev>[0-9a-fA-F]{7,40}|\d+)|(?P<ckw>(?i:commit))[ \t]+(?P<hash>[0-9a-fA-F]{7,40})|r(?P<short_rev>\d+))\b",
    )
    .expect("valid commit pattern")
});

/// Run-wide settings for reference rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    /// Google Code project name, as in `code.google.com/p/<project>`.
    pub project: String,
    /// Added to every source issue id (destination start - 1).
    pub offset: u64,
    /// Destination repository web URL, e.g. `https://github.com/org/repo`.
    pub repo_url: String,
    /// Branch used for `trunk` links and unmapped revisions.
    pub default_branch: String,
}

impl RewriteContext {
    #[must_use]
    pub fn new(project: impl Into<String>, offset: u64, repo_url: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            offset,
            repo_url: repo_url.into().trim_end_matches('/').to_string(),
            default_branch: "master".to_string(),
        }
    }

    #[must_use]
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }
}

/// Result of one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    pub text: String,
    /// Destination issue numbers referenced in the text.
    pub references: BTreeSet<u64>,
    pub matches: Vec<ReferenceMatch>,
    pub diagnostics: Vec<Diagnostic>,
}

enum Matcher {
    Issue(Regex),
    Commit(Regex),
    SourceLink(Regex),
}

impl Matcher {
    const fn kind(&self) -> ReferenceKind {
        match self {
            Self::Issue(_) => ReferenceKind::Issue,
            Self::Commit(_) => ReferenceKind::Commit,
            Self::SourceLink(_) => ReferenceKind::SourceLink,
        }
    }

    const fn regex(&self) -> &Regex {
        match self {
            Self::Issue(re) | Self::Commit(re) | Self::SourceLink(re) => re,
        }
    }
}

struct Resolved {
    raw_value: String,
    target: Option<String>,
    issue: Option<u64>,
    diagnostic: Option<Diagnostic>,
}

/// Rewrites references in text for one migration run.
pub struct ReferenceRewriter<'a> {
    context: RewriteContext,
    commits: &'a CommitMap,
    matchers: Vec<Matcher>,
}

impl<'a> ReferenceRewriter<'a> {
    /// Compile the matchers for `context.project`.
    ///
    /// # Errors
    ///
    /// Returns an error if a project-specific pattern fails to compile.
    pub fn new(context: RewriteContext, commits: &'a CommitMap) -> Result<Self> {
        let project = regex::escape(&context.project);
        let issue = Regex::new(&format!(
            r#"(?i:\bissue(?:[ \t]*#|[ \t]+|-)?(?P<id>\d+)\b)|(?:https?://)?code\.google\.com/p/{project}/issues/detail\?(?:[^\s#&]*&)*id=(?P<url_id>\d+)\b(?:&[^\s#)\]>"']*)?(?:#c\d+)?"#
        ))?;
        let source = Regex::new(&format!(
            r#"(?:https?://)?code\.google\.com/p/{project}/source/browse/(?P<path>[^\s?#)\]>"']*)(?:\?(?P<query>[^\s#)\]>"']*))?(?:#(?P<line>\d+))?"#
        ))?;

        Ok(Self {
            context,
            commits,
            matchers: vec![
                Matcher::Issue(issue),
                Matcher::Commit(COMMIT_RE.clone()),
                Matcher::SourceLink(source),
            ],
        })
    }

    #[must_use]
    pub const fn context(&self) -> &RewriteContext {
        &self.context
    }

    /// Rewrite every reference in `text`.
    #[must_use]
    pub fn rewrite(&self, text: &str) -> Rewrite {
        let mut out = Rewrite {
            text: String::with_capacity(text.len()),
            ..Rewrite::default()
        };
        let mut pos = 0;

        while pos < text.len() {
            let Some((matcher, caps)) = self.next_match(text, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            out.text.push_str(&text[pos..whole.start()]);

            let resolved = match matcher {
                Matcher::Issue(_) => self.resolve_issue(&caps),
                Matcher::Commit(_) => self.resolve_commit(&caps),
                Matcher::SourceLink(_) => self.resolve_source_link(&caps),
            };

            if let Some(target) = &resolved.target {
                debug!(
                    kind = ?matcher.kind(),
                    raw = %whole.as_str(),
                    target = %target,
                    "Rewrote reference"
                );
                out.text.push_str(target);
            } else {
                out.text.push_str(whole.as_str());
            }
            if let Some(id) = resolved.issue {
                out.references.insert(id);
            }
            if let Some(diagnostic) = resolved.diagnostic {
                diagnostic.emit();
                out.diagnostics.push(diagnostic);
            }
            out.matches.push(ReferenceMatch {
                kind: matcher.kind(),
                raw_value: resolved.raw_value,
                offset: self.context.offset,
                resolved_target: resolved.target,
                start: whole.start(),
                end: whole.end(),
            });

            pos = whole.end();
        }

        out.text.push_str(&text[pos..]);
        out
    }

    fn next_match<'t>(&self, text: &'t str, pos: usize) -> Option<(&Matcher, Captures<'t>)> {
        let mut best: Option<(&Matcher, Captures<'t>)> = None;
        for matcher in &self.matchers {
            let Some(caps) = matcher.regex().captures_at(text, pos) else {
                continue;
            };
            let start = caps.get(0).map_or(usize::MAX, |m| m.start());
            let better = best
                .as_ref()
                .and_then(|(_, current)| current.get(0))
                .is_none_or(|current| start < current.start());
            if better {
                best = Some((matcher, caps));
            }
        }
        best
    }

    fn resolve_issue(&self, caps: &Captures<'_>) -> Resolved {
        let raw = caps
            .name("id")
            .or_else(|| caps.name("url_id"))
            .map_or("", |m| m.as_str());
        let issue = raw
            .parse::<u64>()
            .ok()
            .and_then(|id| id.checked_add(self.context.offset));

        Resolved {
            raw_value: raw.to_string(),
            target: issue.map(|id| format!("#{id}")),
            issue,
            diagnostic: None,
        }
    }

    fn resolve_commit(&self, caps: &Captures<'_>) -> Resolved {
        let (keyword, revision) = if let Some(rev) = caps.name("kw_rev") {
            (caps.name("kw").map(|m| m.as_str()), rev.as_str())
        } else if let Some(hash) = caps.name("hash") {
            (caps.name("ckw").map(|m| m.as_str()), hash.as_str())
        } else {
            (None, caps.name("short_rev").map_or("", |m| m.as_str()))
        };

        match self.commits.get(revision) {
            Some(commit) => Resolved {
                raw_value: revision.to_string(),
                target: Some(keyword.map_or_else(
                    || commit.to_string(),
                    |keyword| format!("{keyword} {commit}"),
                )),
                issue: None,
                diagnostic: None,
            },
            // Maps are keyed by svn revision; a hex hash is only rewritten when
            // a mapping file lists it.
            None => Resolved {
                raw_value: revision.to_string(),
                target: None,
                issue: None,
                diagnostic: revision
                    .bytes()
                    .all(|b| b.is_ascii_digit())
                    .then(|| Diagnostic::UnresolvedReference {
                        revision: revision.to_string(),
                    }),
            },
        }
    }

    fn resolve_source_link(&self, caps: &Captures<'_>) -> Resolved {
        let raw_path = caps.name("path").map_or("", |m| m.as_str());
        let query = caps.name("query").map_or("", |m| m.as_str());
        let (branch, path) = split_branch(raw_path, query, &self.context.default_branch);

        if path.is_empty() {
            return Resolved {
                raw_value: raw_path.to_string(),
                target: None,
                issue: None,
                diagnostic: None,
            };
        }

        let mut diagnostic = None;
        let git_ref = match query_param(query, "r") {
            Some(revision) => match self.commits.get(revision) {
                Some(commit) => commit.to_string(),
                None => {
                    diagnostic = Some(Diagnostic::UnresolvedReference {
                        revision: revision.to_string(),
                    });
                    branch
                }
            },
            None => branch,
        };

        let mut target = format!("{}/blob/{git_ref}/{path}", self.context.repo_url);
        if let Some(line) = caps.name("line") {
            target.push('#');
            target.push_str(line.as_str());
        }

        Resolved {
            raw_value: raw_path.to_string(),
            target: Some(target),
            issue: None,
            diagnostic,
        }
    }
}

/// Split a browse path into `(branch, file path)`.
///
/// `trunk/` maps to the default branch, `branches/<name>/` and `tags/<name>/`
/// map to `<name>`. A `name=` query parameter (git and hg projects) selects the
/// branch for paths without an svn layout.
fn split_branch<'p>(raw_path: &'p str, query: &str, default_branch: &str) -> (String, &'p str) {
    let path = raw_path.strip_prefix("svn/").unwrap_or(raw_path);

    if path == "trunk" {
        return (default_branch.to_string(), "");
    }
    if let Some(rest) = path.strip_prefix("trunk/") {
        return (default_branch.to_string(), rest.trim_end_matches('/'));
    }
    for prefix in ["branches/", "tags/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            let (name, rest) = rest.split_once('/').unwrap_or((rest, ""));
            return (name.to_string(), rest.trim_end_matches('/'));
        }
    }

    let branch = query_param(query, "name").unwrap_or(default_branch);
    (branch.to_string(), path.trim_end_matches('/'))
}

fn query_param<'q>(query: &'q str, key: &str) -> Option<&'q str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, v)| *k == key && !v.is_empty())
        .map(|(_, v)| v)
}
