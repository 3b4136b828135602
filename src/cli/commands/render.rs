//! Render command implementation.
//!
//! Reads one scraped message per JSONL line and writes one rendered record
//! per line, in input order. Blank lines are skipped; a malformed line aborts
//! the run with its line number.
//!
//! Title nodes only come from real markup: the record's `nodes`, or the `<b>`
//! labels of the updates box. A plain `body` is one untitled node.

use crate::authors::AuthorMap;
use crate::cli::RenderArgs;
use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use crate::format::Formatter;
use crate::labels::{LabelMapper, MappedLabels};
use crate::links::{original_id_from_body, source_issue_url};
use crate::model::{Message, MessageKind, Node, RenderedMessage};
use crate::refs::ReferenceRewriter;
use crate::segment::nodes_to_text;
use crate::updates::compose_comment_body;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// One input line.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MessageRecord {
    #[serde(flatten)]
    pub message: Message,
    /// Inner HTML of a comment's updates box.
    #[serde(default)]
    pub updates_html: Option<String>,
    /// Parsed body nodes. When present they replace `body`.
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
    /// Source issue number; fills an empty `original_link`.
    #[serde(default)]
    pub source_id: Option<u64>,
    /// Comma-separated source labels of an issue.
    #[serde(default)]
    pub labels: Option<String>,
    /// Source status of an issue.
    #[serde(default)]
    pub status: Option<String>,
}

/// One output line.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RenderedRecord {
    /// 1-based line number of the input record.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<MappedLabels>,
    /// Source issue id of a back-link footer already present in the input,
    /// meaning the message went through a migration before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<u64>,
    #[serde(flatten)]
    pub rendered: RenderedMessage,
}

/// Lookup tables consulted for every record.
#[derive(Debug, Clone, Default)]
pub struct RenderTables {
    pub authors: AuthorMap,
    pub labels: LabelMapper,
}

struct Prepared {
    message: Message,
    nodes: Vec<Node>,
    migrated_from: Option<u64>,
    destination_id: Option<u64>,
    labels: Option<MappedLabels>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub messages: usize,
    pub with_diagnostics: usize,
    pub already_migrated: usize,
}

/// Execute the render command.
///
/// # Errors
///
/// Returns an error if lookup tables cannot be loaded, the input cannot be
/// read or contains a malformed record, or the output cannot be written.
pub fn execute(args: &RenderArgs, config: &MigrationConfig) -> Result<()> {
    let commits = config.load_commit_map()?;
    let tables = RenderTables {
        authors: config.load_author_map()?,
        labels: config.label_mapper(),
    };
    for (target, sources) in tables.authors.duplicate_targets() {
        warn!(
            target = %target,
            sources = ?sources,
            "Several source authors map to the same destination user"
        );
    }
    info!(
        project = %config.project,
        offset = config.offset(),
        commits = commits.len(),
        authors = tables.authors.len(),
        "Starting render"
    );

    let rewriter = ReferenceRewriter::new(config.rewrite_context(), &commits)?;
    let formatter = Formatter::new(config.formatter_config(), &rewriter);

    let reader: Box<dyn BufRead> = match args.input.as_deref() {
        Some(path) if path != Path::new("-") => Box::new(BufReader::new(File::open(path)?)),
        _ => Box::new(io::stdin().lock()),
    };
    let mut writer: Box<dyn Write> = match args.output.as_deref() {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = render_stream(reader, &mut writer, &formatter, &tables)?;
    writer.flush()?;

    info!(
        messages = summary.messages,
        with_diagnostics = summary.with_diagnostics,
        already_migrated = summary.already_migrated,
        "Render complete"
    );
    Ok(())
}

/// Render every record of `reader` into `writer`.
///
/// # Errors
///
/// Returns an error on I/O failure or a line that is not a valid record.
pub fn render_stream<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    formatter: &Formatter<'_>,
    tables: &RenderTables,
) -> Result<RenderSummary> {
    let context = formatter.rewriter().context();
    let mut summary = RenderSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: MessageRecord =
            serde_json::from_str(&line).map_err(|e| MigrateError::InvalidRecord {
                line: line_number,
                reason: e.to_string(),
            })?;
        let Prepared {
            message,
            nodes,
            migrated_from,
            destination_id,
            labels,
        } = prepare(record, &context.project, context.offset, tables);

        let span = tracing::debug_span!("message", line = line_number, kind = message.kind.label());
        let _guard = span.enter();
        if let Some(id) = migrated_from {
            warn!(source_id = id, "Message already carries a migration back-link");
            summary.already_migrated += 1;
        }
        let rendered = formatter.format_nodes(message, &nodes);

        summary.messages += 1;
        if !rendered.diagnostics.is_empty() {
            summary.with_diagnostics += 1;
        }

        let output = RenderedRecord {
            line: line_number,
            destination_id,
            labels,
            migrated_from,
            rendered,
        };
        serde_json::to_writer(&mut *writer, &output)?;
        writer.write_all(b"\n")?;
    }

    Ok(summary)
}

/// Fold the auxiliary input fields into the message.
fn prepare(record: MessageRecord, project: &str, offset: u64, tables: &RenderTables) -> Prepared {
    let MessageRecord {
        mut message,
        updates_html,
        nodes,
        source_id,
        labels,
        status,
    } = record;

    if let Some(id) = source_id {
        if message.original_link.is_empty() && message.kind == MessageKind::Issue {
            message.original_link = source_issue_url(project, id);
        }
    }
    let labels = (message.kind == MessageKind::Issue && (labels.is_some() || status.is_some()))
        .then(|| {
            tables
                .labels
                .map(labels.as_deref().unwrap_or(""), status.as_deref().unwrap_or(""))
        });

    let mut nodes = nodes.unwrap_or_else(|| vec![Node::body(message.body.as_str())]);
    let migrated_from = original_id_from_body(&nodes_to_text(&nodes), project);

    if let Some(html) = updates_html.as_deref() {
        let (composed, updates) = compose_comment_body(nodes, Some(html));
        nodes = composed;
        message.references.extend(updates.added_references(offset));
        message
            .hidden_references
            .extend(updates.hidden_references(offset));
    }

    if let Some(owner) = message.owner.as_mut() {
        if owner.mapped.is_none() {
            owner.mapped = tables.authors.lookup(&owner.original).map(str::to_string);
            debug!(owner = %owner.original, mapped = ?owner.mapped, "Resolved owner");
        }
    }

    Prepared {
        message,
        nodes,
        migrated_from,
        destination_id: source_id.and_then(|id| id.checked_add(offset)),
        labels,
    }
}
