//! Refs command implementation.

use crate::cli::RefsArgs;
use crate::config::MigrationConfig;
use crate::error::Result;
use crate::refs::{ReferenceRewriter, Rewrite};
use std::io::{self, Write};

/// Execute the refs command.
///
/// # Errors
///
/// Returns an error if the commit maps cannot be loaded or stdout fails.
pub fn execute(args: &RefsArgs, config: &MigrationConfig) -> Result<()> {
    let commits = config.load_commit_map()?;
    let rewriter = ReferenceRewriter::new(config.rewrite_context(), &commits)?;
    let rewrite = rewriter.rewrite(&args.text.join(" "));

    let mut out = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &rewrite)?;
        writeln!(out)?;
    } else {
        write_text(&mut out, &rewrite)?;
    }
    Ok(())
}

fn write_text<W: Write>(out: &mut W, rewrite: &Rewrite) -> io::Result<()> {
    writeln!(out, "{}", rewrite.text)?;
    if !rewrite.references.is_empty() {
        let ids = rewrite
            .references
            .iter()
            .map(|id| format!("#{id}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "references: {ids}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn text_output_lists_references() {
        let rewrite = Rewrite {
            text: "See #52".to_string(),
            references: BTreeSet::from([52, 60]),
            ..Rewrite::default()
        };
        let mut out = Vec::new();
        write_text(&mut out, &rewrite).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "See #52\nreferences: #52, #60\n"
        );
    }

    #[test]
    fn text_output_without_references_is_one_line() {
        let rewrite = Rewrite {
            text: "nothing".to_string(),
            ..Rewrite::default()
        };
        let mut out = Vec::new();
        write_text(&mut out, &rewrite).expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "nothing\n");
    }
}
