#![no_main]

use gcode_migrate::{CommitMap, Formatter, FormatterConfig, Message, MessageKind, ReferenceRewriter, RewriteContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let commits: CommitMap = [("7", "abc123")].into_iter().collect();
    let Ok(rewriter) = ReferenceRewriter::new(
        RewriteContext::new("proj", 10, "https://github.com/org/proj"),
        &commits,
    ) else {
        return;
    };

    let rewrite = rewriter.rewrite(text);
    for m in &rewrite.matches {
        assert!(m.start <= m.end && m.end <= text.len());
    }

    let formatter = Formatter::new(FormatterConfig::default(), &rewriter);
    let rendered = formatter.format(Message::new(
        MessageKind::Comment,
        "Sat Jan 02 03:04:05 2010",
        text,
        "fuzz",
        "",
    ));
    assert!(rendered.body.chars().count() < gcode_migrate::format::MAX_BODY_CHARS);
});
