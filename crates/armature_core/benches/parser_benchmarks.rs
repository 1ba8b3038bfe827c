use armature_core::parser::parser::{ParseOptions, parse};
use armature_core::parser::scanner::Scanner;
use armature_core::parser::visit::{CancelToken, NodeRef, Visitor, visit};
use criterion::{Criterion, criterion_group, criterion_main};

/// A realistic mixed-feature source unit, repeated to a useful size.
fn sample_source() -> String {
    let unit = r#"
import { api } from "./api";

export class Session extends Base {
    #token = null;
    constructor(user) {
        super();
        this.user = user;
    }
    static async open(name, opts = {}) {
        const { retries = 3, ...rest } = opts;
        for (let i = 0; i < retries; i++) {
            try {
                return await api.connect(`${name}-${i}`, rest);
            } catch (err) {
                if (i === retries - 1) throw err;
            }
        }
        return null;
    }
}

export const make = (user) => new Session(user);
const pattern = /[a-z]+-\d+/gi;
let total = items.map((x) => x * 2).filter((x) => x > 10).reduce((a, b) => a + b, 0);
"#;
    unit.repeat(16)
}

// ---------------------------------------------------------------------------
// Tokenization throughput
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    let src = sample_source();
    c.bench_function("scanner_tokenize_all", |b| {
        b.iter(|| Scanner::tokenize_all(&src));
    });
}

// ---------------------------------------------------------------------------
// Full parse throughput
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let src = sample_source();
    c.bench_function("parse_clean_source", |b| {
        b.iter(|| parse(&src, ParseOptions::default()));
    });

    // Malformed input exercises the recovery paths.
    let broken = src.replace("return", "return )").replace("const", "const =");
    c.bench_function("parse_with_recovery", |b| {
        b.iter(|| parse(&broken, ParseOptions::default()));
    });
}

// ---------------------------------------------------------------------------
// Visitor walk
// ---------------------------------------------------------------------------

struct CountingVisitor {
    nodes: usize,
}

impl Visitor for CountingVisitor {
    fn enter(&mut self, _node: NodeRef<'_>) -> bool {
        self.nodes += 1;
        true
    }
    fn exit(&mut self, _node: NodeRef<'_>) {}
}

fn bench_visit(c: &mut Criterion) {
    let src = sample_source();
    let result = parse(&src, ParseOptions::default());
    let token = CancelToken::new();
    c.bench_function("visit_full_tree", |b| {
        b.iter(|| {
            let mut counter = CountingVisitor { nodes: 0 };
            visit(&result.program, &mut counter, &token);
            counter.nodes
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_visit);
criterion_main!(benches);
