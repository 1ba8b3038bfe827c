#![no_main]

use armature_core::parser::diagnostics::Diagnostics;
use armature_core::parser::scanner::{Scanner, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Verify the scanner's progress invariant on arbitrary input: every call
    // advances the scan position by at least one code unit or returns Eof,
    // so tokenization always terminates with a finite token sequence.

    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);

    let mut scanner = Scanner::new(&src);
    let mut diagnostics = Diagnostics::new();
    let mut prev_end = 0usize;
    let mut count = 0usize;

    loop {
        let tok = scanner.next_token(&mut diagnostics);
        if tok.kind == TokenKind::Eof {
            assert_eq!(
                tok.span.start.offset, tok.span.end.offset,
                "the Eof sentinel is zero-width"
            );
            break;
        }
        assert!(
            tok.span.end.offset > prev_end || tok.span.end.offset > tok.span.start.offset,
            "every token must advance the scan position"
        );
        assert!(
            tok.span.start.offset >= prev_end,
            "tokens must not overlap"
        );
        assert!(
            tok.span.end.offset <= src.len(),
            "tokens must stay inside the input"
        );
        prev_end = tok.span.end.offset;

        count += 1;
        assert!(
            count <= src.len() + 1,
            "token count must be bounded by input length"
        );
    }
});
