//! Schema command implementation.
//!
//! Emits JSON Schema documents for the records `render` reads and writes, so
//! scrapers feeding the tool can be checked without reading source code.

use crate::cli::commands::render::{MessageRecord, RenderedRecord};
use crate::cli::{SchemaArgs, SchemaTarget};
use crate::error::{Diagnostic, Result};
use crate::model::{Message, Node};
use chrono::{DateTime, Utc};
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
struct SchemaOutput {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    schemas: BTreeMap<&'static str, RootSchema>,
}

/// Execute the schema command.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn execute(args: &SchemaArgs) -> Result<()> {
    let payload = SchemaOutput {
        tool: "gcmigrate",
        generated_at: Utc::now(),
        schemas: build_schemas(args.target),
    };

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &payload)?;
    writeln!(out)?;
    Ok(())
}

fn build_schemas(target: SchemaTarget) -> BTreeMap<&'static str, RootSchema> {
    let mut schemas = BTreeMap::new();

    match target {
        SchemaTarget::All => {
            schemas.insert("MessageRecord", schema_for!(MessageRecord));
            schemas.insert("Message", schema_for!(Message));
            schemas.insert("Node", schema_for!(Node));
            schemas.insert("RenderedRecord", schema_for!(RenderedRecord));
            schemas.insert("Diagnostic", schema_for!(Diagnostic));
        }
        SchemaTarget::Input => {
            schemas.insert("MessageRecord", schema_for!(MessageRecord));
        }
        SchemaTarget::Message => {
            schemas.insert("Message", schema_for!(Message));
        }
        SchemaTarget::Node => {
            schemas.insert("Node", schema_for!(Node));
        }
        SchemaTarget::Output => {
            schemas.insert("RenderedRecord", schema_for!(RenderedRecord));
        }
        SchemaTarget::Diagnostic => {
            schemas.insert("Diagnostic", schema_for!(Diagnostic));
        }
    }

    schemas
}
