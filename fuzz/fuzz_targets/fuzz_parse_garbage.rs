#![no_main]

use armature_core::parser::ast::SourceType;
use armature_core::parser::parser::{LangOpts, ParseOptions, parse};
use armature_core::parser::visit::{CancelToken, NodeRef, Visitor, visit};
use libfuzzer_sys::fuzz_target;

/// Asserts the structural span invariant while the tree is walked: every
/// node's span stays inside its parent's span, and enter/exit stay balanced.
struct SpanChecker {
    stack: Vec<(usize, usize)>,
}

impl Visitor for SpanChecker {
    fn enter(&mut self, node: NodeRef<'_>) -> bool {
        let loc = node.loc();
        assert!(
            loc.start.offset <= loc.end.offset,
            "span must not be inverted"
        );
        if let Some(&(start, end)) = self.stack.last() {
            assert!(
                start <= loc.start.offset && loc.end.offset <= end,
                "child span must stay inside its parent"
            );
        }
        self.stack.push((loc.start.offset, loc.end.offset));
        true
    }
    fn exit(&mut self, _node: NodeRef<'_>) {
        self.stack.pop().expect("exit without matching enter");
    }
}

fuzz_target!(|data: &[u8]| {
    // Parse arbitrary character noise and verify the no-crash contract:
    // every input yields a result; malformed input is flagged as recovered
    // with at least one diagnostic; diagnostics come back ordered; the tree
    // satisfies span containment.

    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);

    for source_type in [SourceType::Script, SourceType::Module] {
        let options = ParseOptions {
            source_type,
            lang: LangOpts {
                type_annotations: data.first().is_some_and(|b| b & 1 != 0),
                markup: data.first().is_some_and(|b| b & 2 != 0),
            },
        };
        let result = parse(&src, options);

        if result.was_recovered {
            assert!(
                !result.diagnostics.is_empty(),
                "a recovered parse must explain itself"
            );
        }

        let mut prev = 0usize;
        for diagnostic in &result.diagnostics {
            assert!(
                diagnostic.span.start.offset >= prev,
                "diagnostics must be ordered by span start"
            );
            prev = diagnostic.span.start.offset;
        }

        let mut checker = SpanChecker { stack: Vec::new() };
        let completed = visit(&result.program, &mut checker, &CancelToken::new());
        assert!(completed);
        assert!(checker.stack.is_empty(), "enter/exit must balance");
    }
});
