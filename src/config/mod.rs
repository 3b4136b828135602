//! Configuration management for `gcode_migrate`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`GCMIGRATE_*`)
//! 3. Project config (`--config <path>`, else `./gcmigrate.yaml`)
//! 4. User config (~/.config/gcmigrate/config.yaml)
//! 5. Defaults
//!
//! Every layer is a flat map of dotted keys. YAML mappings are flattened, so
//! `labels: { Type-Defect: bug }` becomes `labels.Type-Defect = bug`.

use crate::authors::AuthorMap;
use crate::commits::CommitMap;
use crate::error::{MigrateError, Result};
use crate::format::{FormatterConfig, default_cutoff};
use crate::labels::LabelMapper;
use crate::refs::RewriteContext;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config filename looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "gcmigrate.yaml";
/// Author map used when none is configured.
pub const DEFAULT_AUTHORS_FILENAME: &str = "authors.json";

const ENV_PREFIX: &str = "GCMIGRATE_";

/// A configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    pub fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values
            .get(&normalize_key(key))
            .filter(|value| !value.trim().is_empty())
    }

    /// Entries under `prefix.`, with the prefix removed.
    #[must_use]
    pub fn section(&self, prefix: &str) -> BTreeMap<String, String> {
        let head = format!("{}.", normalize_key(prefix));
        self.values
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&head)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub project: Option<String>,
    pub repo_url: Option<String>,
    pub destination_start: Option<u64>,
    pub default_branch: Option<String>,
    pub authors_file: Option<PathBuf>,
    pub commit_maps: Vec<PathBuf>,
    pub no_escape_mentions: Option<bool>,
    pub omit_priority: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(project) = &self.project {
            layer.insert("project", project.clone());
        }
        if let Some(repo_url) = &self.repo_url {
            layer.insert("repo-url", repo_url.clone());
        }
        if let Some(start) = self.destination_start {
            layer.insert("destination-start", start.to_string());
        }
        if let Some(branch) = &self.default_branch {
            layer.insert("default-branch", branch.clone());
        }
        if let Some(path) = &self.authors_file {
            layer.insert("authors-file", path.to_string_lossy().to_string());
        }
        if !self.commit_maps.is_empty() {
            let joined = self
                .commit_maps
                .iter()
                .map(|path| path.to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(",");
            layer.insert("commit-maps", joined);
        }
        if let Some(no_escape) = self.no_escape_mentions {
            layer.insert("escape-mentions", (!no_escape).to_string());
        }
        if let Some(omit) = self.omit_priority {
            layer.insert("omit-priority", omit.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("destination-start", "1".to_string());
    layer.insert("default-branch", "master".to_string());
    layer.insert("escape-mentions", "true".to_string());
    layer.insert("omit-priority", "false".to_string());
    layer.insert("authors-file", DEFAULT_AUTHORS_FILENAME.to_string());
    layer
}

/// Load user config (~/.config/gcmigrate/config.yaml).
///
/// A missing `HOME` yields an empty layer.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("gcmigrate")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(project_config: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let project_path = project_config.map_or_else(
        || PathBuf::from(PROJECT_CONFIG_FILENAME),
        Path::to_path_buf,
    );
    if project_config.is_some() && !project_path.exists() {
        return Err(MigrateError::Config(format!(
            "config file not found: {}",
            project_path.display()
        )));
    }

    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        ConfigLayer::from_yaml(&project_path)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Typed settings for one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub project: String,
    /// Destination number of source issue 1.
    pub destination_start: u64,
    pub repo_url: String,
    pub default_branch: String,
    pub cutoff: DateTime<Utc>,
    pub escape_mentions: bool,
    pub omit_priority: bool,
    pub authors_file: Option<PathBuf>,
    pub commit_maps: Vec<PathBuf>,
    pub labels: BTreeMap<String, String>,
    pub states: BTreeMap<String, String>,
}

impl MigrationConfig {
    /// Build typed settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value is malformed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let project = layer
            .get("project")
            .cloned()
            .ok_or_else(|| MigrateError::missing_key("project"))?;
        let repo_url = layer
            .get("repo-url")
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| MigrateError::missing_key("repo-url"))?;

        let destination_start = match layer.get("destination-start") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|n| *n >= 1).ok_or_else(|| {
                MigrateError::Config(format!(
                    "destination-start must be a positive integer, got '{raw}'"
                ))
            })?,
            None => 1,
        };
        let cutoff = match layer.get("cutoff") {
            Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|e| MigrateError::Config(format!("invalid cutoff '{raw}': {e}")))?,
            None => default_cutoff(),
        };

        Ok(Self {
            project,
            destination_start,
            repo_url,
            default_branch: layer
                .get("default-branch")
                .cloned()
                .unwrap_or_else(|| "master".to_string()),
            cutoff,
            escape_mentions: parse_bool_key(layer, "escape-mentions")?.unwrap_or(true),
            omit_priority: parse_bool_key(layer, "omit-priority")?.unwrap_or(false),
            authors_file: layer.get("authors-file").map(PathBuf::from),
            commit_maps: layer
                .get("commit-maps")
                .map(|joined| {
                    joined
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
            labels: layer.section("labels"),
            states: layer.section("states"),
        })
    }

    /// Offset added to source issue ids.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.destination_start.saturating_sub(1)
    }

    #[must_use]
    pub fn rewrite_context(&self) -> RewriteContext {
        RewriteContext::new(&self.project, self.offset(), &self.repo_url)
            .with_default_branch(&self.default_branch)
    }

    #[must_use]
    pub fn formatter_config(&self) -> FormatterConfig {
        FormatterConfig {
            cutoff: self.cutoff,
            escape_mentions: self.escape_mentions,
        }
    }

    #[must_use]
    pub fn label_mapper(&self) -> LabelMapper {
        let mut mapper = LabelMapper::default().with_omit_priority(self.omit_priority);
        for (source, destination) in &self.labels {
            mapper.map_label(source, destination);
        }
        for (status, destination) in &self.states {
            mapper.map_state(status, destination);
        }
        mapper
    }

    /// Load the configured commit maps.
    ///
    /// # Errors
    ///
    /// Returns an error if a mapping file cannot be read or parsed.
    pub fn load_commit_map(&self) -> Result<CommitMap> {
        CommitMap::load(&self.commit_maps)
    }

    /// Load the configured author map.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_author_map(&self) -> Result<AuthorMap> {
        self.authors_file
            .as_deref()
            .map_or_else(|| Ok(AuthorMap::default()), AuthorMap::load)
    }
}

/// Normalize the leading segment of a key; the rest stays verbatim so label
/// names keep their case.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let (head, rest) = key.split_once('.').map_or((key, None), |(h, r)| (h, Some(r)));
    let head = head.to_lowercase().replace('_', "-");
    match rest {
        Some(rest) => format!("{head}.{rest}"),
        None => head,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_key(layer: &ConfigLayer, key: &str) -> Result<Option<bool>> {
    layer
        .get(key)
        .map(|raw| {
            parse_bool(raw)
                .ok_or_else(|| MigrateError::Config(format!("{key} must be a boolean, got '{raw}'")))
        })
        .transpose()
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = yaml_scalar_to_string(key) else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base_layer() -> ConfigLayer {
        let mut layer = default_config_layer();
        layer.insert("project", "proj".to_string());
        layer.insert("repo-url", "https://github.com/org/proj/".to_string());
        layer
    }

    #[test]
    fn merge_precedence_order() {
        let mut defaults = default_config_layer();
        defaults.insert("project", "defaults".to_string());

        let mut yaml = ConfigLayer::default();
        yaml.insert("project", "yaml".to_string());

        let mut env_layer = ConfigLayer::default();
        env_layer.insert("project", "env".to_string());

        let cli = CliOverrides {
            project: Some("cli".to_string()),
            ..CliOverrides::default()
        };

        let merged = ConfigLayer::merge_layers(&[defaults, yaml, env_layer, cli.as_layer()]);
        assert_eq!(merged.get("project").unwrap(), "cli");
    }

    #[test]
    fn yaml_is_flattened_with_label_case_kept() {
        let yaml = r"
project: proj
repo_url: https://github.com/org/proj
commit-maps:
  - revs.txt
  - fixups.txt
labels:
  Type-Defect: defect
states:
  Fixed: fixed
";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse yaml");
        let layer = ConfigLayer::merge_layers(&[default_config_layer(), layer_from_yaml_value(&value)]);
        let config = MigrationConfig::from_layer(&layer).expect("config");

        assert_eq!(config.repo_url, "https://github.com/org/proj");
        assert_eq!(
            config.commit_maps,
            vec![PathBuf::from("revs.txt"), PathBuf::from("fixups.txt")]
        );
        assert_eq!(config.labels.get("Type-Defect").map(String::as_str), Some("defect"));

        let mapped = config.label_mapper().map("Type-Defect", "fixed");
        assert_eq!(mapped.labels, vec!["imported", "defect", "fixed"]);
    }

    #[test]
    fn env_vars_map_to_keys() {
        let layer = ConfigLayer::from_vars([
            ("GCMIGRATE_REPO_URL".to_string(), "https://x".to_string()),
            ("OTHER".to_string(), "ignored".to_string()),
        ]);
        assert_eq!(layer.get("repo-url").unwrap(), "https://x");
        assert_eq!(layer.values.len(), 1);
    }

    #[test]
    fn offset_derives_from_destination_start() {
        let mut layer = base_layer();
        layer.insert("destination-start", "101".to_string());
        let config = MigrationConfig::from_layer(&layer).expect("config");
        assert_eq!(config.offset(), 100);
        assert_eq!(config.rewrite_context().offset, 100);
        assert_eq!(config.cutoff, default_cutoff());
    }

    #[test]
    fn missing_project_is_an_error() {
        let err = MigrationConfig::from_layer(&default_config_layer()).expect_err("should fail");
        assert!(err.to_string().contains("project"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut layer = base_layer();
        layer.insert("destination-start", "0".to_string());
        assert!(MigrationConfig::from_layer(&layer).is_err());

        let mut layer = base_layer();
        layer.insert("escape-mentions", "sometimes".to_string());
        assert!(MigrationConfig::from_layer(&layer).is_err());

        let mut layer = base_layer();
        layer.insert("cutoff", "2010-01-01T00:00:00Z".to_string());
        let config = MigrationConfig::from_layer(&layer).expect("config");
        assert_eq!(config.cutoff.to_rfc3339(), "2010-01-01T00:00:00+00:00");
    }

    #[test]
    fn explicit_missing_config_file_errors() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("nope.yaml");
        assert!(load_config(Some(&missing), &CliOverrides::default()).is_err());
    }

    #[test]
    fn yaml_file_layer_loads() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("gcmigrate.yaml");
        fs::write(&path, "project: proj\ndestination-start: 5\n").expect("write");
        let layer = ConfigLayer::from_yaml(&path).expect("layer");
        assert_eq!(layer.get("destination-start").unwrap(), "5");
    }
}
