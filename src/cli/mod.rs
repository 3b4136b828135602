//! Command-line interface for `gcmigrate`.

pub mod commands;

use crate::config::{self, CliOverrides, MigrationConfig};
use crate::error::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rewrite and render scraped Google Code issue text for GitHub.
#[derive(Debug, Parser)]
#[command(name = "gcmigrate", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Project config file (defaults to ./gcmigrate.yaml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Google Code project name
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Destination repository URL, e.g. https://github.com/org/repo
    #[arg(long, global = true)]
    pub repo_url: Option<String>,

    /// Destination issue number of source issue 1
    #[arg(long = "start", global = true, value_name = "N")]
    pub destination_start: Option<u64>,

    /// Branch used for trunk links
    #[arg(long, global = true)]
    pub default_branch: Option<String>,

    /// Author map (JSON object of source id to destination user)
    #[arg(long, global = true, value_name = "PATH")]
    pub authors: Option<PathBuf>,

    /// Revision mapping file; repeat to layer fixups on top
    #[arg(long = "commit-map", global = true, value_name = "PATH")]
    pub commit_maps: Vec<PathBuf>,

    /// Keep @mentions as written
    #[arg(long, global = true)]
    pub no_escape_mentions: bool,

    /// Drop Priority-* labels
    #[arg(long, global = true)]
    pub omit_priority: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            project: self.project.clone(),
            repo_url: self.repo_url.clone(),
            destination_start: self.destination_start,
            default_branch: self.default_branch.clone(),
            authors_file: self.authors.clone(),
            commit_maps: self.commit_maps.clone(),
            no_escape_mentions: self.no_escape_mentions.then_some(true),
            omit_priority: self.omit_priority.then_some(true),
        }
    }

    /// Resolve the run configuration from files, environment and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if config files are unreadable or required keys are
    /// missing.
    pub fn migration_config(&self) -> Result<MigrationConfig> {
        let layer = config::load_config(self.config.as_deref(), &self.overrides())?;
        MigrationConfig::from_layer(&layer)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render scraped messages (JSONL in) into destination bodies (JSONL out)
    Render(RenderArgs),
    /// Rewrite references in a piece of text
    Refs(RefsArgs),
    /// Print JSON Schemas of the input and output records
    Schema(SchemaArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Input JSONL file (stdin when omitted or "-")
    pub input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RefsArgs {
    /// Text to rewrite (words are joined with spaces)
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Print the rewrite as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    All,
    Input,
    Message,
    Node,
    Output,
    Diagnostic,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaTarget::All)]
    pub target: SchemaTarget,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns an error if configuration is invalid or command I/O fails.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Render(args) => commands::render::execute(args, &cli.migration_config()?),
        Commands::Refs(args) => commands::refs::execute(args, &cli.migration_config()?),
        Commands::Schema(args) => commands::schema::execute(args),
        Commands::Completions(args) => {
            commands::completions::execute(args);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::parse_from([
            "gcmigrate",
            "--project",
            "proj",
            "--start",
            "11",
            "--commit-map",
            "a.txt",
            "--commit-map",
            "b.txt",
            "--no-escape-mentions",
            "refs",
            "issue",
            "1",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.project.as_deref(), Some("proj"));
        assert_eq!(overrides.destination_start, Some(11));
        assert_eq!(overrides.commit_maps.len(), 2);
        assert_eq!(overrides.no_escape_mentions, Some(true));
        assert_eq!(overrides.omit_priority, None);
        match cli.command {
            Commands::Refs(args) => assert_eq!(args.text, vec!["issue", "1"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
