#![no_main]

use gcode_migrate::authors::AuthorMap;
use gcode_migrate::cli::commands::render::{RenderTables, render_stream};
use gcode_migrate::{CommitMap, Formatter, FormatterConfig, ReferenceRewriter, RewriteContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let commits = CommitMap::new();
    let Ok(rewriter) = ReferenceRewriter::new(
        RewriteContext::new("proj", 0, "https://github.com/org/proj"),
        &commits,
    ) else {
        return;
    };
    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);
    let tables = RenderTables {
        authors: AuthorMap::new(),
        ..RenderTables::default()
    };

    // Malformed records are errors, never panics.
    let mut out = Vec::new();
    let _ = render_stream(data, &mut out, &formatter, &tables);
    for line in String::from_utf8_lossy(&out).lines() {
        let _: serde_json::Value = serde_json::from_str(line).expect("rendered lines are JSON");
    }
});
