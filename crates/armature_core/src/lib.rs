//! `armature_core` — an error-tolerant JavaScript/TypeScript-family parser
//! front-end for IDE tooling.
//!
//! The crate turns an in-memory source snapshot into a span-annotated AST
//! plus an ordered diagnostics list.  It never fails on malformed input: a
//! parse always returns a best-effort tree that downstream consumers
//! (completion, outlining, navigation, debugger expression evaluation) can
//! walk while the user is still typing.
//!
//! # Crate layout
//!
//! - [`parser`] — scanner, AST, diagnostics, the recursive-descent parser,
//!   and the visitor API.

/// Error types for the strict parse entry points.
pub mod error;
/// Parser infrastructure: scanner, AST, diagnostics, parser, visitor.
pub mod parser;
