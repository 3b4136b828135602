//! Source author to destination user lookup.
//!
//! The map is loaded from a JSON object (`authors.json`) whose keys are source
//! identifiers (usually e-mail addresses or profile URLs) and whose values are
//! destination usernames, or `""` when the author has no account there.
//!
//! Google Code obfuscates addresses of users who are not project members as
//! `jdoe...@example.com`. Such an identifier is expanded to a wildcard and
//! matched against the known keys; it resolves only when exactly one key
//! matches.

use crate::error::Result;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Marker Google Code uses in obfuscated addresses.
pub const OBFUSCATION_MARKER: &str = "...";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorMap {
    entries: BTreeMap<String, String>,
}

impl AuthorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. A missing file yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No author map, starting empty");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), count = entries.len(), "Loaded author map");
        Ok(Self { entries })
    }

    pub fn insert(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        self.entries.insert(source.into(), destination.into());
    }

    /// Resolve a source identifier to a destination username.
    #[must_use]
    pub fn lookup(&self, source: &str) -> Option<&str> {
        if let Some(destination) = self.entries.get(source) {
            return non_empty(destination);
        }
        if !source.contains(OBFUSCATION_MARKER) {
            return None;
        }

        let pattern = source
            .split(OBFUSCATION_MARKER)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".+");
        let Ok(re) = Regex::new(&format!("^{pattern}$")) else {
            return None;
        };

        let mut found = self.entries.iter().filter(|(key, _)| re.is_match(key));
        match (found.next(), found.next()) {
            (Some((_, destination)), None) => non_empty(destination),
            (Some(_), Some(_)) => {
                warn!(source, "Obfuscated author matches several entries, not mapping");
                None
            }
            (None, _) => None,
        }
    }

    /// Destination users claimed by more than one source identifier.
    #[must_use]
    pub fn duplicate_targets(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut by_target: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (source, destination) in &self.entries {
            if destination.is_empty() {
                continue;
            }
            by_target
                .entry(destination.clone())
                .or_default()
                .insert(source.clone());
        }
        by_target.retain(|_, sources| sources.len() > 1);
        by_target
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

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
