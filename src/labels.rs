//! Label and milestone mapping.
//!
//! Source labels come from the CSV export's `AllLabels` column
//! (`Type-Defect, Priority-Medium, Milestone-1.2`). Every migrated issue also
//! gets the `imported` marker label so it can be recognised later.

use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

pub const IMPORTED_LABEL: &str = "imported";
pub const DEFAULT_MILESTONE: &str = "backlog";

const PRIORITY_PREFIX: &str = "Priority-";
const MILESTONE_PREFIX: &str = "Milestone-";

/// Labels and milestone for one destination issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MappedLabels {
    pub labels: Vec<String>,
    pub milestone: String,
}

/// Read-only label tables for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapper {
    labels: BTreeMap<String, String>,
    states: BTreeMap<String, String>,
    omit_priority: bool,
}

impl Default for LabelMapper {
    fn default() -> Self {
        let labels = [("Type-Defect", "bug"), ("Type-Enhancement", "enhancement")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let states = ["invalid", "duplicate", "wontfix"]
            .into_iter()
            .map(|s| (s.to_string(), s.to_string()))
            .collect();
        Self {
            labels,
            states,
            omit_priority: false,
        }
    }
}

impl LabelMapper {
    #[must_use]
    pub fn with_omit_priority(mut self, omit: bool) -> Self {
        self.omit_priority = omit;
        self
    }

    /// Add or replace a source label mapping.
    pub fn map_label(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        self.labels.insert(source.into(), destination.into());
    }

    /// Add or replace a status that becomes a label.
    pub fn map_state(&mut self, status: impl Into<String>, destination: impl Into<String>) {
        self.states
            .insert(status.into().to_lowercase(), destination.into());
    }

    /// Map a comma-separated label list and the issue status.
    #[must_use]
    pub fn map(&self, all_labels: &str, status: &str) -> MappedLabels {
        let mut labels = vec![IMPORTED_LABEL.to_string()];
        let mut milestone = DEFAULT_MILESTONE.to_string();

        for label in all_labels.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            if self.omit_priority && label.starts_with(PRIORITY_PREFIX) {
                continue;
            }
            if let Some(name) = label.strip_prefix(MILESTONE_PREFIX) {
                milestone = name.to_string();
                continue;
            }
            let mapped = self.labels.get(label).map_or(label, String::as_str);
            push_unique(&mut labels, mapped);
        }

        if let Some(state) = self.states.get(&status.trim().to_lowercase()) {
            push_unique(&mut labels, state);
        }

        MappedLabels { labels, milestone }
    }
}

fn push_unique(labels: &mut Vec<String>, label: &str) {
    if !labels.iter().any(|existing| existing == label) {
        labels.push(label.to_string());
    }
}
