#![allow(dead_code)]

use gcode_migrate::{CommitMap, Message, MessageKind, RewriteContext};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

pub mod cli;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        gcode_migrate::logging::init_test_logging();
    });
}

pub const PROJECT: &str = "proj";
pub const REPO_URL: &str = "https://github.com/org/proj";
pub const ISSUE_LINK: &str = "http://code.google.com/p/proj/issues/detail?id=3";

/// Context used across tests: source issue N becomes destination N + 10.
pub fn context() -> RewriteContext {
    RewriteContext::new(PROJECT, 10, REPO_URL)
}

pub fn commit_map() -> CommitMap {
    [("7", "abc123"), ("12", "def4567")].into_iter().collect()
}

pub fn modern_issue(body: &str) -> Message {
    Message::new(
        MessageKind::Issue,
        "Sat Jan 02 03:04:05 2010",
        body,
        "alice",
        ISSUE_LINK,
    )
}

pub fn legacy_issue(body: &str) -> Message {
    Message::new(
        MessageKind::Issue,
        "Thu Jan 01 10:00:00 2009",
        body,
        "alice",
        ISSUE_LINK,
    )
}

/// A scratch directory with helpers for writing input files.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        init_test_logging();
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }
}
