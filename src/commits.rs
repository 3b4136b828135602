//! Revision to destination commit lookup table.
//!
//! Mapping files hold one `<revision> <commit>` pair per line, as produced by
//! `git svn` style conversions. Blank lines and `#` comments are ignored.
//! The left column may also be a hex hash (git or hg projects), which lets
//! `commit <hash>` mentions be rewritten.

use crate::error::{MigrateError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read-only map from source revision to destination commit reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMap {
    entries: HashMap<String, String>,
}

impl CommitMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load several mapping files. Later files override earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or contains a malformed line.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut map = Self::new();
        for path in paths.iter().rev() {
            let path = path.as_ref();
            let contents = fs::read_to_string(path)?;
            let added = map.absorb(path, &contents)?;
            debug!(path = %path.display(), added, "Loaded commit map");
        }
        Ok(map)
    }

    /// Parse one file's contents, keeping entries that are already present.
    fn absorb(&mut self, path: &Path, contents: &str) -> Result<usize> {
        let mut added = 0;
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(revision), Some(commit), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(MigrateError::InvalidMapping {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: "expected '<revision> <commit>'".to_string(),
                });
            };
            let revision = normalize_revision(revision);
            if !self.entries.contains_key(revision) {
                self.entries.insert(revision.to_string(), commit.to_string());
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn insert(&mut self, revision: impl AsRef<str>, commit: impl Into<String>) {
        self.entries
            .insert(normalize_revision(revision.as_ref()).to_string(), commit.into());
    }

    /// Look up a revision, accepting both `r42` and `42`.
    #[must_use]
    pub fn get(&self, revision: &str) -> Option<&str> {
        self.entries
            .get(normalize_revision(revision))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for CommitMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (revision, commit) in iter {
            map.insert(revision, commit);
        }
        map
    }
}

fn normalize_revision(revision: &str) -> &str {
    match revision.strip_prefix('r') {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => rest,
        _ => revision,
    }
}
