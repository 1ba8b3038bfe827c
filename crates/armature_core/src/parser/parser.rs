//! Recursive-descent parser with automatic semicolon insertion and error
//! recovery.
//!
//! The parser pulls tokens from the [`Scanner`] through a lazily-filled token
//! arena (a `Vec` plus a cursor index), which gives it cheap bounded
//! backtracking: [`Parser::checkpoint`] saves the cursor, [`Parser::rewind`]
//! restores it, and the arena can be truncated at the cursor when a token has
//! to be rescanned under a different interpretation (regular expression
//! instead of division, raw markup text between tags).
//!
//! A parse always terminates and always produces a tree: malformed input is
//! reported to the [`Diagnostics`] collector, the offending region is skipped
//! up to a statement boundary, and an [`ErrorStmt`] / [`ErrorExpr`] marker
//! takes the place of the production that failed, so every parent node
//! receives a well-typed child.  There is no failure outcome distinct from
//! "succeeded with diagnostics"; callers that refuse a diagnostics-bearing
//! tree use [`parse_script_strict`] / [`parse_module_strict`].

use crate::error::{ArmatureError, ArmatureResult};
use crate::parser::ast::*;
use crate::parser::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::parser::scanner::{
    Position, Scanner, ScannerState, Span, Token, TokenKind, TokenValue,
};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Dialect switches for optional syntax extensions.
///
/// Both default to off.  In a mode where an extension is disabled, its
/// syntax produces ordinary recovered syntax errors, never a crash.
#[derive(Debug, Clone, Copy, Default)]
pub struct LangOpts {
    /// Recognize `: Type` annotations on bindings, parameters, and function
    /// return positions.
    pub type_annotations: bool,
    /// Recognize markup elements (`<tag …>…</tag>`) in expression position.
    pub markup: bool,
}

/// Configuration for a single parse invocation.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Whether top-level `import`/`export` are allowed.
    pub source_type: SourceType,
    /// Optional dialect switches.
    pub lang: LangOpts,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_type: SourceType::Script,
            lang: LangOpts::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// The result of parsing a complete source unit.
///
/// Created once per parse invocation and immutable after return; a reparse of
/// updated text produces a fresh result rather than mutating this one.
#[derive(Debug)]
pub struct ParseResult {
    /// The root of the parsed tree.  Always present, even for garbage input.
    pub program: Program,
    /// Everything that went wrong, ordered by span start.
    pub diagnostics: Vec<Diagnostic>,
    /// `true` when the tree contains recovered regions (at least one
    /// error-severity diagnostic was recorded).
    pub was_recovered: bool,
}

/// The result of parsing a standalone expression fragment
/// (see [`Parser::parse_expression_fragment`]).
#[derive(Debug)]
pub struct FragmentResult {
    /// The parsed expression.
    pub expr: Expr,
    /// Everything that went wrong, ordered by span start.
    pub diagnostics: Vec<Diagnostic>,
    /// `true` when at least one error-severity diagnostic was recorded.
    pub was_recovered: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a complete source unit with the given options.
///
/// # Example
///
/// ```
/// use armature_core::parser::parser::{parse, ParseOptions};
///
/// let result = parse("let x = 1 + 2;", ParseOptions::default());
/// assert!(result.diagnostics.is_empty());
/// assert!(!result.was_recovered);
/// assert_eq!(result.program.body.len(), 1);
/// ```
pub fn parse(source: &str, options: ParseOptions) -> ParseResult {
    Parser::new(source, options).parse_program()
}

/// Parse a standalone expression fragment (e.g. a debugger watch
/// expression).  Leftover tokens after the expression produce a
/// [`DiagnosticCode::TrailingTokens`] diagnostic.
pub fn parse_fragment(source: &str, options: ParseOptions) -> FragmentResult {
    Parser::new(source, options).parse_expression_fragment()
}

/// Parse a classic script, rejecting any input that produces diagnostics.
///
/// IDE-style callers want the recovered tree from [`parse`]; this entry is
/// for callers that cannot use a partial AST.
pub fn parse_script_strict(source: &str) -> ArmatureResult<Program> {
    strict(source, SourceType::Script)
}

/// Parse a module, rejecting any input that produces diagnostics.
pub fn parse_module_strict(source: &str) -> ArmatureResult<Program> {
    strict(source, SourceType::Module)
}

fn strict(source: &str, source_type: SourceType) -> ArmatureResult<Program> {
    let options = ParseOptions {
        source_type,
        lang: LangOpts::default(),
    };
    let result = parse(source, options);
    match result.diagnostics.first() {
        Some(first) if result.was_recovered => Err(ArmatureError::SyntaxError(format!(
            "{} at {}:{}",
            first.message, first.span.start.line, first.span.start.column
        ))),
        _ => Ok(result.program),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Recursive-descent parser over the token arena.
///
/// One method per statement/expression kind; binary expressions use
/// operator-precedence climbing over the table in [`binary_prec`].
pub struct Parser<'src> {
    source: &'src str,
    scanner: Scanner<'src>,
    diagnostics: Diagnostics,
    options: ParseOptions,
    /// Significant (non-trivia) tokens scanned so far, each paired with the
    /// scanner state saved immediately before its leading trivia.  The state
    /// is what [`Scanner::rescan_as_regexp`] and
    /// [`Scanner::rescan_markup_text`] need to retokenize from that position.
    tokens: Vec<(Token, ScannerState)>,
    /// Index of the current token within `tokens`.
    cursor: usize,
    /// `true` while a speculative arrow-head parse is in flight.  Nested
    /// paren heads are then decided by lookahead scan instead of opening a
    /// second speculation, which bounds backtracking to one rewind per
    /// position.
    speculating: bool,
}

/// A saved parse position for bounded backtracking.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    cursor: usize,
    diagnostics_len: usize,
}

impl<'src> Parser<'src> {
    /// Create a parser for `source`.
    pub fn new(source: &'src str, options: ParseOptions) -> Self {
        let mut scanner = Scanner::new(source);
        scanner.set_markup(options.lang.markup);
        Self {
            source,
            scanner,
            diagnostics: Diagnostics::new(),
            options,
            tokens: Vec::new(),
            cursor: 0,
            speculating: false,
        }
    }

    // ── Token pump ──────────────────────────────────────────────────────────

    /// Ensure the arena holds a token at index `upto` (or ends in
    /// [`TokenKind::Eof`]).  Comment trivia is skipped here; a line
    /// terminator before or inside a skipped comment is folded into the
    /// following significant token's ASI flag.
    fn fill(&mut self, upto: usize) {
        while self.tokens.len() <= upto {
            if let Some((last, _)) = self.tokens.last()
                && last.kind == TokenKind::Eof
            {
                break;
            }
            let state = self.scanner.save();
            let mut had_lt = false;
            let mut tok = loop {
                let t = self.scanner.next_token(&mut self.diagnostics);
                had_lt |= t.had_line_terminator_before;
                match t.kind {
                    TokenKind::SingleLineComment | TokenKind::MultiLineComment => continue,
                    _ => break t,
                }
            };
            tok.had_line_terminator_before = had_lt;
            self.tokens.push((tok, state));
        }
    }

    /// The arena index the cursor resolves to (clamped to the Eof sentinel).
    fn index(&mut self, k: usize) -> usize {
        self.fill(self.cursor + k);
        (self.cursor + k).min(self.tokens.len() - 1)
    }

    /// Peek `k` tokens ahead without consuming.
    fn peek(&mut self, k: usize) -> &Token {
        let idx = self.index(k);
        &self.tokens[idx].0
    }

    /// The current token.
    fn cur(&mut self) -> &Token {
        self.peek(0)
    }

    /// The current token's kind.
    fn kind(&mut self) -> TokenKind {
        self.cur().kind
    }

    /// Consume and return the current token.  At end of input the Eof
    /// sentinel is returned and the cursor does not advance.
    fn bump(&mut self) -> Token {
        let idx = self.index(0);
        let tok = self.tokens[idx].0.clone();
        if tok.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        tok
    }

    /// `true` when the current token has the given kind.
    fn at(&mut self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token when it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) { Some(self.bump()) } else { None }
    }

    /// Consume a required token.  When it is missing, record an
    /// [`DiagnosticCode::ExpectedToken`] diagnostic and return a zero-width
    /// span at the current position so the caller's span arithmetic still
    /// works.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Span {
        if let Some(tok) = self.eat(kind) {
            return tok.span;
        }
        let span = self.cur().span;
        self.diagnostics.error(
            span,
            DiagnosticCode::ExpectedToken,
            format!("expected {what}"),
        );
        Span {
            start: span.start,
            end: span.start,
        }
    }

    /// A zero-width span at the current token's start.
    fn here(&mut self) -> Span {
        let start = self.cur().span.start;
        Span { start, end: start }
    }

    /// The raw source text under `span`.
    fn slice(&self, span: Span) -> &str {
        &self.source[span.start.offset..span.end.offset]
    }

    // ── Backtracking ────────────────────────────────────────────────────────

    /// Save the cursor and the diagnostics length for a speculative parse.
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cursor: self.cursor,
            diagnostics_len: self.diagnostics.len(),
        }
    }

    /// Abandon a speculative parse: restore the cursor and retract the
    /// grammar diagnostics it emitted.  The arena keeps the tokens already
    /// scanned (and the lexical diagnostics attached to scanning them);
    /// only the position moves.
    fn rewind(&mut self, cp: Checkpoint) {
        self.cursor = cp.cursor;
        self.diagnostics.rollback_to(cp.diagnostics_len);
    }

    // ── Parser-directed rescans ─────────────────────────────────────────────

    /// The scanner state saved immediately before the current token's
    /// leading trivia.  When the cursor sits past everything scanned so far,
    /// the scanner itself is at exactly that position; no token is scanned
    /// here, because a rescan caller wants to tokenize the region
    /// differently.
    fn state_before_cursor(&mut self) -> ScannerState {
        if self.cursor < self.tokens.len() {
            self.tokens[self.cursor].1.clone()
        } else {
            self.scanner.save()
        }
    }

    /// Retokenize the current `/` / `/=` as a regular-expression literal.
    ///
    /// Truncates the arena at the cursor (discarding any lookahead scanned
    /// under the division interpretation), rewinds the scanner, and scans a
    /// fresh token.  Previously issued tokens are never mutated.
    fn relex_regexp(&mut self) -> Token {
        let state = self.state_before_cursor();
        self.tokens.truncate(self.cursor);
        let tok = self.scanner.rescan_as_regexp(state.clone(), &mut self.diagnostics);
        self.tokens.push((tok.clone(), state));
        tok
    }

    /// Retokenize from the current position as a raw markup text run.
    fn relex_markup_text(&mut self) -> Token {
        let state = self.state_before_cursor();
        self.tokens.truncate(self.cursor);
        let tok = self.scanner.rescan_markup_text(state.clone());
        self.tokens.push((tok.clone(), state));
        tok
    }

    // ── Automatic semicolon insertion ───────────────────────────────────────

    /// Consume a statement terminator.
    ///
    /// Satisfied by an explicit `;`, by a token preceded by a line
    /// terminator, by a closing `}`, or by end of input.  When none of the
    /// four conditions hold, an [`DiagnosticCode::ExpectedSemicolon`]
    /// diagnostic is recorded but the statement is still treated as
    /// terminated, so parsing keeps moving forward.
    fn eat_semicolon(&mut self) {
        if self.eat(TokenKind::Semicolon).is_some() {
            return;
        }
        let tok = self.cur();
        if tok.kind == TokenKind::Eof
            || tok.kind == TokenKind::RightBrace
            || tok.had_line_terminator_before
        {
            return;
        }
        let span = tok.span;
        self.diagnostics.error(
            span,
            DiagnosticCode::ExpectedSemicolon,
            "expected ';' or a line break between statements",
        );
    }

    // ── Error recovery ──────────────────────────────────────────────────────

    /// Panic-mode resynchronization: skip tokens up to a statement boundary
    /// (`;`, `}`, end of input, a keyword that starts a new statement, or a
    /// newline-preceded token), consuming at least one token so recovery
    /// can never loop.  Returns an [`ErrorStmt`] marker covering the
    /// skipped region.
    fn recover_statement(&mut self, start: Position) -> Stmt {
        let mut end = start;
        let mut consumed = false;
        loop {
            let tok = self.cur().clone();
            match tok.kind {
                TokenKind::Eof | TokenKind::RightBrace => break,
                TokenKind::Semicolon => {
                    self.bump();
                    end = tok.span.end;
                    break;
                }
                _ if consumed && (starts_statement(tok.kind) || tok.had_line_terminator_before) => {
                    break;
                }
                _ => {
                    self.bump();
                    end = tok.span.end;
                    consumed = true;
                }
            }
        }
        if end.offset < start.offset {
            end = start;
        }
        Stmt::Error(ErrorStmt {
            loc: Span { start, end },
        })
    }

    // ── Program ─────────────────────────────────────────────────────────────

    /// Parse a complete source unit and consume the parser.
    pub fn parse_program(mut self) -> ParseResult {
        let start = Position {
            offset: 0,
            line: 1,
            column: 1,
        };
        let mut body = Vec::new();
        while !self.at(TokenKind::Eof) {
            let before = self.cursor;
            body.push(self.parse_program_item());
            if self.cursor == before && !self.at(TokenKind::Eof) {
                // A production failed to make progress; force it.
                let tok = self.bump();
                body.push(ProgramItem::Stmt(Stmt::Error(ErrorStmt { loc: tok.span })));
            }
        }
        let end = self.cur().span.end;
        let program = Program {
            loc: Span { start, end },
            source_type: self.options.source_type,
            body,
        };
        self.finish(program)
    }

    fn finish(self, program: Program) -> ParseResult {
        let was_recovered = self.diagnostics.has_errors();
        ParseResult {
            program,
            diagnostics: self.diagnostics.into_sorted(),
            was_recovered,
        }
    }

    /// Parse a standalone expression fragment and consume the parser.
    ///
    /// Same machinery as a full parse with the root production restricted to
    /// a single expression; trailing tokens produce a diagnostic.
    pub fn parse_expression_fragment(mut self) -> FragmentResult {
        let expr = self.parse_expression(false);
        if !self.at(TokenKind::Eof) {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::TrailingTokens,
                "unexpected tokens after expression",
            );
        }
        let was_recovered = self.diagnostics.has_errors();
        FragmentResult {
            expr,
            diagnostics: self.diagnostics.into_sorted(),
            was_recovered,
        }
    }

    /// One top-level item: a module declaration or a statement.
    fn parse_program_item(&mut self) -> ProgramItem {
        match self.kind() {
            TokenKind::Import
                if !matches!(
                    self.peek(1).kind,
                    TokenKind::LeftParen | TokenKind::Dot
                ) =>
            {
                self.check_module_item();
                ProgramItem::ModuleDecl(self.parse_import_decl())
            }
            TokenKind::Export => {
                self.check_module_item();
                ProgramItem::ModuleDecl(self.parse_export_decl())
            }
            _ => ProgramItem::Stmt(self.parse_statement()),
        }
    }

    /// `import`/`export` outside a module source unit is a recovered error;
    /// the declaration is still parsed so navigation keeps working.
    fn check_module_item(&mut self) {
        if self.options.source_type != SourceType::Module {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::ModuleItemInScript,
                "'import' and 'export' may only appear in a module",
            );
        }
    }

    // ── Module declarations ─────────────────────────────────────────────────

    /// `import … from "source";` (the `import` keyword is current).
    fn parse_import_decl(&mut self) -> ModuleDecl {
        let start = self.bump().span; // import
        let mut specifiers = Vec::new();

        if let Some(tok) = self.eat(TokenKind::StringLiteral) {
            // `import "side-effect";`
            let source = self.string_lit(&tok);
            self.eat_semicolon();
            return ModuleDecl::Import(ImportDecl {
                loc: start.to(source.loc),
                specifiers,
                source,
            });
        }

        // Default binding, then optionally `, {…}` or `, * as ns`.
        if let Some(local) = self.try_parse_ident() {
            specifiers.push(ImportSpecifier::Default(ImportDefaultSpecifier {
                loc: local.loc,
                local,
            }));
            if self.eat(TokenKind::Comma).is_some() {
                self.parse_import_specifier_group(&mut specifiers);
            }
        } else {
            self.parse_import_specifier_group(&mut specifiers);
        }

        self.expect(TokenKind::From, "'from'");
        let source = self.parse_module_source();
        self.eat_semicolon();
        ModuleDecl::Import(ImportDecl {
            loc: start.to(source.loc),
            specifiers,
            source,
        })
    }

    /// `{ a, b as c }` or `* as ns` after `import` (or after the default
    /// binding's comma).
    fn parse_import_specifier_group(&mut self, specifiers: &mut Vec<ImportSpecifier>) {
        if let Some(star) = self.eat(TokenKind::Star) {
            self.expect(TokenKind::As, "'as'");
            let local = self.parse_ident("namespace import binding");
            specifiers.push(ImportSpecifier::Namespace(ImportNamespaceSpecifier {
                loc: star.span.to(local.loc),
                local,
            }));
            return;
        }
        self.expect(TokenKind::LeftBrace, "'{'");
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let imported = self.parse_module_export_name();
            let local = if self.eat(TokenKind::As).is_some() {
                self.parse_ident("import binding")
            } else {
                match &imported {
                    ModuleExportName::Ident(id) => id.clone(),
                    ModuleExportName::Str(s) => {
                        let span = s.loc;
                        self.diagnostics.error(
                            span,
                            DiagnosticCode::ExpectedIdentifier,
                            "a string import name requires 'as'",
                        );
                        Ident {
                            loc: s.loc,
                            name: s.value.clone(),
                        }
                    }
                }
            };
            specifiers.push(ImportSpecifier::Named(ImportNamedSpecifier {
                loc: imported_loc(&imported).to(local.loc),
                imported,
                local,
            }));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBrace, "'}'");
    }

    /// The `"source"` string of an `import`/`export … from` declaration.
    fn parse_module_source(&mut self) -> StringLit {
        if let Some(tok) = self.eat(TokenKind::StringLiteral) {
            self.string_lit(&tok)
        } else {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::ExpectedToken,
                "expected a module specifier string",
            );
            StringLit {
                loc: Span {
                    start: span.start,
                    end: span.start,
                },
                value: String::new(),
            }
        }
    }

    /// An identifier or string literal naming a module export.
    fn parse_module_export_name(&mut self) -> ModuleExportName {
        if let Some(tok) = self.eat(TokenKind::StringLiteral) {
            ModuleExportName::Str(self.string_lit(&tok))
        } else {
            ModuleExportName::Ident(self.parse_ident("export name"))
        }
    }

    /// `export …` (the `export` keyword is current).
    fn parse_export_decl(&mut self) -> ModuleDecl {
        let start = self.bump().span; // export

        if self.eat(TokenKind::Star).is_some() {
            let exported = if self.eat(TokenKind::As).is_some() {
                Some(self.parse_module_export_name())
            } else {
                None
            };
            self.expect(TokenKind::From, "'from'");
            let source = self.parse_module_source();
            self.eat_semicolon();
            return ModuleDecl::ExportAll(ExportAllDecl {
                loc: start.to(source.loc),
                exported,
                source,
            });
        }

        if self.eat(TokenKind::Default).is_some() {
            let declaration = match self.kind() {
                TokenKind::Function => ExportDefaultExpr::Fn(Box::new(self.parse_fn_decl(false))),
                TokenKind::Async if self.peek(1).kind == TokenKind::Function => {
                    let async_span = self.bump().span;
                    let mut decl = self.parse_fn_decl(true);
                    decl.loc.start = async_span.start;
                    ExportDefaultExpr::Fn(Box::new(decl))
                }
                TokenKind::Class => ExportDefaultExpr::Class(Box::new(self.parse_class_decl())),
                _ => {
                    let expr = self.parse_assignment(false);
                    self.eat_semicolon();
                    ExportDefaultExpr::Expr(Box::new(expr))
                }
            };
            let end = export_default_end(&declaration);
            return ModuleDecl::ExportDefault(ExportDefaultDecl {
                loc: Span {
                    start: start.start,
                    end,
                },
                declaration,
            });
        }

        if self.at(TokenKind::LeftBrace) {
            self.bump();
            let mut specifiers = Vec::new();
            while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
                let local = self.parse_module_export_name();
                let exported = if self.eat(TokenKind::As).is_some() {
                    self.parse_module_export_name()
                } else {
                    local.clone()
                };
                specifiers.push(ExportSpecifier {
                    loc: imported_loc(&local).to(imported_loc(&exported)),
                    local,
                    exported,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            let close = self.expect(TokenKind::RightBrace, "'}'");
            let source = if self.eat(TokenKind::From).is_some() {
                Some(self.parse_module_source())
            } else {
                None
            };
            self.eat_semicolon();
            let end = source.as_ref().map(|s| s.loc.end).unwrap_or(close.end);
            return ModuleDecl::ExportNamed(ExportNamedDecl {
                loc: Span {
                    start: start.start,
                    end,
                },
                specifiers,
                source,
                declaration: None,
            });
        }

        // `export <declaration>`
        let stmt = self.parse_statement();
        let end = stmt.loc().end;
        ModuleDecl::ExportNamed(ExportNamedDecl {
            loc: Span {
                start: start.start,
                end,
            },
            specifiers: Vec::new(),
            source: None,
            declaration: Some(Box::new(stmt)),
        })
    }

    // ── Statements ──────────────────────────────────────────────────────────

    /// One statement.  Never fails: unexpected input is diagnosed and
    /// replaced by an [`ErrorStmt`] after resynchronizing.
    fn parse_statement(&mut self) -> Stmt {
        match self.kind() {
            TokenKind::LeftBrace => Stmt::Block(self.parse_block()),
            TokenKind::Semicolon => {
                let tok = self.bump();
                Stmt::Empty(EmptyStmt { loc: tok.span })
            }
            TokenKind::Var => self.parse_var_statement(VarKind::Var),
            TokenKind::Const => self.parse_var_statement(VarKind::Const),
            TokenKind::Let => {
                // `let` is only a declaration keyword when a binding follows;
                // otherwise it is an ordinary identifier.
                if matches!(
                    self.peek(1).kind,
                    TokenKind::LeftBracket | TokenKind::LeftBrace
                ) || self.peek_is_binding_ident(1)
                {
                    self.parse_var_statement(VarKind::Let)
                } else {
                    self.parse_expression_statement()
                }
            }
            TokenKind::Function => Stmt::FnDecl(Box::new(self.parse_fn_decl(false))),
            TokenKind::Async
                if self.peek(1).kind == TokenKind::Function
                    && !self.peek(1).had_line_terminator_before =>
            {
                let async_span = self.bump().span;
                let mut decl = self.parse_fn_decl(true);
                decl.loc.start = async_span.start;
                Stmt::FnDecl(Box::new(decl))
            }
            TokenKind::Class => Stmt::ClassDecl(Box::new(self.parse_class_decl())),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Break => self.parse_break_continue(true),
            TokenKind::Continue => self.parse_break_continue(false),
            TokenKind::Debugger => {
                let tok = self.bump();
                self.eat_semicolon();
                Stmt::Debugger(DebuggerStmt { loc: tok.span })
            }
            TokenKind::With => self.parse_with(),
            TokenKind::Import | TokenKind::Export
                if !matches!(
                    self.peek(1).kind,
                    TokenKind::LeftParen | TokenKind::Dot
                ) =>
            {
                // A module declaration below the top level: diagnose, then
                // parse through it so the cursor lands on the next statement.
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::UnexpectedToken,
                    "'import' and 'export' may only appear at the top level",
                );
                let decl = if self.at(TokenKind::Import) {
                    self.parse_import_decl()
                } else {
                    self.parse_export_decl()
                };
                Stmt::Error(ErrorStmt { loc: decl.loc() })
            }
            TokenKind::Identifier if self.peek(1).kind == TokenKind::Colon => {
                let label = self.parse_ident("label");
                self.bump(); // :
                let body = self.parse_statement();
                let loc = label.loc.to(body.loc());
                Stmt::Labeled(LabeledStmt {
                    loc,
                    label,
                    body: Box::new(body),
                })
            }
            TokenKind::Eof | TokenKind::RightBrace => {
                // Callers guard against these; reaching here means a missing
                // statement.  Produce a zero-width marker without consuming.
                let loc = self.here();
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::UnexpectedToken,
                    "expected a statement",
                );
                Stmt::Error(ErrorStmt { loc })
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// `true` when the token `k` ahead could begin a binding identifier.
    fn peek_is_binding_ident(&mut self, k: usize) -> bool {
        ident_like(self.peek(k).kind)
    }

    /// `{ statements }` — the `{` is current.
    fn parse_block(&mut self) -> BlockStmt {
        let open = self.expect(TokenKind::LeftBrace, "'{'");
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let before = self.cursor;
            body.push(self.parse_statement());
            if self.cursor == before {
                let tok = self.bump();
                body.push(Stmt::Error(ErrorStmt { loc: tok.span }));
            }
        }
        let close = self.expect(TokenKind::RightBrace, "'}'");
        BlockStmt {
            loc: open.to(close),
            body,
        }
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        let start = self.cur().span.start;
        let before = self.cursor;
        let expr = self.parse_expression(false);
        if self.cursor == before {
            // The expression grammar could not consume anything here.
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::UnexpectedToken,
                format!("unexpected token '{}'", self.slice(span)),
            );
            return self.recover_statement(start);
        }
        self.eat_semicolon();
        let loc = expr.loc();
        Stmt::Expr(ExprStmt {
            loc: Span {
                start,
                end: loc.end,
            },
            expr: Box::new(expr),
        })
    }

    /// `var/let/const declarators ;` — the keyword is current.
    fn parse_var_statement(&mut self, kind: VarKind) -> Stmt {
        let decl = self.parse_var_decl(kind, false);
        self.eat_semicolon();
        Stmt::VarDecl(decl)
    }

    /// The declarator list of a `var/let/const` declaration.  `no_in` is set
    /// inside a `for (…)` head, where `in` must not be consumed as a binary
    /// operator.
    fn parse_var_decl(&mut self, kind: VarKind, no_in: bool) -> VarDecl {
        let start = self.bump().span; // var / let / const
        let mut declarators = Vec::new();
        loop {
            let decl_start = self.cur().span.start;
            let id = match self.parse_binding_pattern() {
                Some(pat) => pat,
                None => {
                    let span = self.cur().span;
                    self.diagnostics.error(
                        span,
                        DiagnosticCode::ExpectedIdentifier,
                        "expected a binding name",
                    );
                    break;
                }
            };
            let ty = self.maybe_parse_type_annotation();
            let init = if self.eat(TokenKind::Equal).is_some() {
                Some(Box::new(self.parse_assignment(no_in)))
            } else {
                None
            };
            let end = init
                .as_ref()
                .map(|e| e.loc().end)
                .or_else(|| ty.as_ref().map(|t| t.loc.end))
                .unwrap_or(id.loc().end);
            declarators.push(VarDeclarator {
                loc: Span {
                    start: decl_start,
                    end,
                },
                id,
                ty,
                init,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = declarators
            .last()
            .map(|d| d.loc.end)
            .unwrap_or(start.end);
        VarDecl {
            loc: Span {
                start: start.start,
                end,
            },
            kind,
            declarators,
        }
    }

    fn parse_if(&mut self) -> Stmt {
        let start = self.bump().span; // if
        self.expect(TokenKind::LeftParen, "'('");
        let test = self.parse_expression(false);
        self.expect(TokenKind::RightParen, "')'");
        let consequent = self.parse_statement();
        let alternate = if self.eat(TokenKind::Else).is_some() {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };
        let end = alternate
            .as_ref()
            .map(|s| s.loc().end)
            .unwrap_or(consequent.loc().end);
        Stmt::If(IfStmt {
            loc: Span {
                start: start.start,
                end,
            },
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    /// `for (…;…;…)`, `for (… in …)`, or `for [await] (… of …)`.
    fn parse_for(&mut self) -> Stmt {
        let start = self.bump().span; // for
        let is_await = self.eat(TokenKind::Await).is_some();
        self.expect(TokenKind::LeftParen, "'('");

        // Empty initializer: `for (;;)`.
        if self.eat(TokenKind::Semicolon).is_some() {
            return self.parse_for_tail(start, None);
        }

        // Declaration head.
        let decl_kind = match self.kind() {
            TokenKind::Var => Some(VarKind::Var),
            TokenKind::Const => Some(VarKind::Const),
            TokenKind::Let
                if matches!(
                    self.peek(1).kind,
                    TokenKind::LeftBracket | TokenKind::LeftBrace
                ) || self.peek_is_binding_ident(1) =>
            {
                Some(VarKind::Let)
            }
            _ => None,
        };
        if let Some(kind) = decl_kind {
            let decl = self.parse_var_decl(kind, true);
            if self.eat(TokenKind::In).is_some() {
                let left = ForInOfLeft::VarDecl(decl);
                return self.parse_for_in_of_tail(start, left, false, is_await);
            }
            if self.eat(TokenKind::Of).is_some() {
                let left = ForInOfLeft::VarDecl(decl);
                return self.parse_for_in_of_tail(start, left, true, is_await);
            }
            self.expect(TokenKind::Semicolon, "';'");
            return self.parse_for_tail(start, Some(ForInit::VarDecl(decl)));
        }

        // Expression head.
        let init = self.parse_expression(true);
        if self.eat(TokenKind::In).is_some() {
            let left = self.for_head_target(init);
            return self.parse_for_in_of_tail(start, left, false, is_await);
        }
        if self.eat(TokenKind::Of).is_some() {
            let left = self.for_head_target(init);
            return self.parse_for_in_of_tail(start, left, true, is_await);
        }
        self.expect(TokenKind::Semicolon, "';'");
        self.parse_for_tail(start, Some(ForInit::Expr(Box::new(init))))
    }

    /// Reinterpret a `for (… in/of …)` head expression as a binding target.
    fn for_head_target(&mut self, expr: Expr) -> ForInOfLeft {
        let loc = expr.loc();
        match expr_to_pattern(expr) {
            Some(pat) => ForInOfLeft::Pat(pat),
            None => {
                self.diagnostics.error(
                    loc,
                    DiagnosticCode::InvalidAssignmentTarget,
                    "invalid left-hand side in for-loop head",
                );
                ForInOfLeft::Pat(Pat::Ident(Ident {
                    loc,
                    name: String::new(),
                }))
            }
        }
    }

    /// `test; update) body` after the first `;` of a C-style `for`.
    fn parse_for_tail(&mut self, start: Span, init: Option<ForInit>) -> Stmt {
        let test = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression(false)))
        };
        self.expect(TokenKind::Semicolon, "';'");
        let update = if self.at(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression(false)))
        };
        self.expect(TokenKind::RightParen, "')'");
        let body = self.parse_statement();
        let end = body.loc().end;
        Stmt::For(ForStmt {
            loc: Span {
                start: start.start,
                end,
            },
            init,
            test,
            update,
            body: Box::new(body),
        })
    }

    /// `right) body` after `in` / `of`.
    fn parse_for_in_of_tail(
        &mut self,
        start: Span,
        left: ForInOfLeft,
        is_of: bool,
        is_await: bool,
    ) -> Stmt {
        let right = if is_of {
            // The iterable is an AssignmentExpression, not a full sequence.
            self.parse_assignment(false)
        } else {
            self.parse_expression(false)
        };
        self.expect(TokenKind::RightParen, "')'");
        let body = self.parse_statement();
        let end = body.loc().end;
        let loc = Span {
            start: start.start,
            end,
        };
        if is_of {
            Stmt::ForOf(ForOfStmt {
                loc,
                is_await,
                left,
                right: Box::new(right),
                body: Box::new(body),
            })
        } else {
            Stmt::ForIn(ForInStmt {
                loc,
                left,
                right: Box::new(right),
                body: Box::new(body),
            })
        }
    }

    fn parse_while(&mut self) -> Stmt {
        let start = self.bump().span; // while
        self.expect(TokenKind::LeftParen, "'('");
        let test = self.parse_expression(false);
        self.expect(TokenKind::RightParen, "')'");
        let body = self.parse_statement();
        let end = body.loc().end;
        Stmt::While(WhileStmt {
            loc: Span {
                start: start.start,
                end,
            },
            test: Box::new(test),
            body: Box::new(body),
        })
    }

    fn parse_do_while(&mut self) -> Stmt {
        let start = self.bump().span; // do
        let body = self.parse_statement();
        self.expect(TokenKind::While, "'while'");
        self.expect(TokenKind::LeftParen, "'('");
        let test = self.parse_expression(false);
        let close = self.expect(TokenKind::RightParen, "')'");
        // The terminator after `do … while (…)` is always insertable.
        let end = match self.eat(TokenKind::Semicolon) {
            Some(semi) => semi.span.end,
            None => close.end,
        };
        Stmt::DoWhile(DoWhileStmt {
            loc: Span {
                start: start.start,
                end,
            },
            body: Box::new(body),
            test: Box::new(test),
        })
    }

    fn parse_switch(&mut self) -> Stmt {
        let start = self.bump().span; // switch
        self.expect(TokenKind::LeftParen, "'('");
        let discriminant = self.parse_expression(false);
        self.expect(TokenKind::RightParen, "')'");
        self.expect(TokenKind::LeftBrace, "'{'");
        let mut cases = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let case_start = self.cur().span.start;
            let test = if self.eat(TokenKind::Case).is_some() {
                Some(self.parse_expression(false))
            } else if self.eat(TokenKind::Default).is_some() {
                None
            } else {
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::ExpectedToken,
                    "expected 'case' or 'default'",
                );
                let marker = self.recover_statement(case_start);
                cases.push(SwitchCase {
                    loc: marker.loc(),
                    test: None,
                    consequent: vec![marker],
                });
                continue;
            };
            self.expect(TokenKind::Colon, "':'");
            let mut consequent = Vec::new();
            while !matches!(
                self.kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                let before = self.cursor;
                consequent.push(self.parse_statement());
                if self.cursor == before {
                    let tok = self.bump();
                    consequent.push(Stmt::Error(ErrorStmt { loc: tok.span }));
                }
            }
            let end = consequent
                .last()
                .map(|s| s.loc().end)
                .unwrap_or(case_start);
            cases.push(SwitchCase {
                loc: Span {
                    start: case_start,
                    end,
                },
                test,
                consequent,
            });
        }
        let close = self.expect(TokenKind::RightBrace, "'}'");
        Stmt::Switch(SwitchStmt {
            loc: start.to(close),
            discriminant: Box::new(discriminant),
            cases,
        })
    }

    fn parse_try(&mut self) -> Stmt {
        let start = self.bump().span; // try
        let block = self.parse_block();
        let handler = if self.at(TokenKind::Catch) {
            let catch_start = self.bump().span;
            let param = if self.eat(TokenKind::LeftParen).is_some() {
                let pat = self.parse_binding_pattern();
                if pat.is_none() {
                    let span = self.cur().span;
                    self.diagnostics.error(
                        span,
                        DiagnosticCode::ExpectedIdentifier,
                        "expected a catch binding",
                    );
                }
                self.expect(TokenKind::RightParen, "')'");
                pat
            } else {
                None
            };
            let body = self.parse_block();
            Some(CatchClause {
                loc: catch_start.to(body.loc),
                param,
                body,
            })
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Finally).is_some() {
            Some(self.parse_block())
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::ExpectedToken,
                "expected 'catch' or 'finally' after a try block",
            );
        }
        let end = finalizer
            .as_ref()
            .map(|b| b.loc.end)
            .or_else(|| handler.as_ref().map(|h| h.loc.end))
            .unwrap_or(block.loc.end);
        Stmt::Try(TryStmt {
            loc: Span {
                start: start.start,
                end,
            },
            block,
            handler,
            finalizer,
        })
    }

    /// `return [argument];` — `return` is a restricted production: a line
    /// terminator after the keyword ends the statement.
    fn parse_return(&mut self) -> Stmt {
        let start = self.bump().span; // return
        let argument = if self.return_argument_follows() {
            Some(Box::new(self.parse_expression(false)))
        } else {
            None
        };
        self.eat_semicolon();
        let end = argument.as_ref().map(|e| e.loc().end).unwrap_or(start.end);
        Stmt::Return(ReturnStmt {
            loc: Span {
                start: start.start,
                end,
            },
            argument,
        })
    }

    fn return_argument_follows(&mut self) -> bool {
        let tok = self.cur();
        !tok.had_line_terminator_before
            && !matches!(
                tok.kind,
                TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
            )
    }

    /// `throw argument;` — also a restricted production, but unlike `return`
    /// the argument is mandatory, so a newline here is an error plus an
    /// error-marker argument.
    fn parse_throw(&mut self) -> Stmt {
        let start = self.bump().span; // throw
        let argument = if self.return_argument_follows() {
            self.parse_expression(false)
        } else {
            let loc = self.here();
            self.diagnostics.error(
                Span {
                    start: start.start,
                    end: loc.start,
                },
                DiagnosticCode::ExpectedExpression,
                "'throw' requires an argument on the same line",
            );
            Expr::Error(ErrorExpr { loc })
        };
        self.eat_semicolon();
        let end = argument.loc().end;
        Stmt::Throw(ThrowStmt {
            loc: Span {
                start: start.start,
                end,
            },
            argument: Box::new(argument),
        })
    }

    /// `break [label];` / `continue [label];` — restricted productions: the
    /// label must start on the same line.
    fn parse_break_continue(&mut self, is_break: bool) -> Stmt {
        let start = self.bump().span;
        let label = if self.at(TokenKind::Identifier) && !self.cur().had_line_terminator_before {
            Some(self.parse_ident("label"))
        } else {
            None
        };
        self.eat_semicolon();
        let end = label.as_ref().map(|l| l.loc.end).unwrap_or(start.end);
        let loc = Span {
            start: start.start,
            end,
        };
        if is_break {
            Stmt::Break(BreakStmt { loc, label })
        } else {
            Stmt::Continue(ContinueStmt { loc, label })
        }
    }

    fn parse_with(&mut self) -> Stmt {
        let start = self.bump().span; // with
        self.expect(TokenKind::LeftParen, "'('");
        let object = self.parse_expression(false);
        self.expect(TokenKind::RightParen, "')'");
        let body = self.parse_statement();
        let end = body.loc().end;
        Stmt::With(WithStmt {
            loc: Span {
                start: start.start,
                end,
            },
            object: Box::new(object),
            body: Box::new(body),
        })
    }

    // ── Functions ───────────────────────────────────────────────────────────

    /// `function [*] [name] (params) [: T] { body }` — `function` is
    /// current, `async` (if any) already consumed.
    fn parse_fn_decl(&mut self, is_async: bool) -> FnDecl {
        let start = self.bump().span; // function
        let is_generator = self.eat(TokenKind::Star).is_some();
        let id = self.try_parse_ident();
        let (params, return_ty, body) = self.parse_fn_rest();
        FnDecl {
            loc: Span {
                start: start.start,
                end: body.loc.end,
            },
            id,
            is_async,
            is_generator,
            params,
            return_ty,
            body,
        }
    }

    /// Same tail as [`Parser::parse_fn_decl`], producing a function
    /// expression value (also used for methods).
    fn parse_fn_expr(&mut self, is_async: bool) -> FnExpr {
        let start = self.bump().span; // function
        let is_generator = self.eat(TokenKind::Star).is_some();
        let id = self.try_parse_ident();
        let (params, return_ty, body) = self.parse_fn_rest();
        FnExpr {
            loc: Span {
                start: start.start,
                end: body.loc.end,
            },
            id,
            is_async,
            is_generator,
            params,
            return_ty,
            body,
        }
    }

    /// Parameter list, optional return annotation, and body.  When the body
    /// `{` is missing after a malformed parameter list, the function still
    /// gets a well-typed body: a block holding an error marker that covers
    /// the malformed region, so the tree stays structurally complete and the
    /// next statement parses normally.
    fn parse_fn_rest(&mut self) -> (Vec<Param>, Option<TypeRef>, BlockStmt) {
        let params_start = self.cur().span.start;
        let params = self.parse_params();
        let return_ty = self.maybe_parse_type_annotation();
        let body = if self.at(TokenKind::LeftBrace) {
            self.parse_block()
        } else {
            let here = self.here();
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::ExpectedToken,
                "expected '{' to open the function body",
            );
            let marker = Span {
                start: params_start,
                end: here.start,
            };
            BlockStmt {
                loc: marker,
                body: vec![Stmt::Error(ErrorStmt { loc: marker })],
            }
        };
        (params, return_ty, body)
    }

    /// `( param, … )` with defaults, rest elements, destructuring, and
    /// optional type annotations.  Malformed entries are diagnosed and
    /// skipped up to the next `,`, `)`, `{`, or statement boundary.
    fn parse_params(&mut self) -> Vec<Param> {
        self.expect(TokenKind::LeftParen, "'('");
        let mut params = Vec::new();
        while !matches!(self.kind(), TokenKind::RightParen | TokenKind::Eof) {
            let start = self.cur().span.start;
            let pat = if self.at(TokenKind::DotDotDot) {
                let dots = self.bump().span;
                match self.parse_binding_pattern() {
                    Some(inner) => Some(Pat::Rest(Box::new(RestElement {
                        loc: dots.to(inner.loc()),
                        argument: Box::new(inner),
                    }))),
                    None => None,
                }
            } else {
                self.parse_binding_pattern()
            };
            let Some(pat) = pat else {
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::ExpectedIdentifier,
                    "expected a parameter name",
                );
                self.skip_malformed_param();
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                break;
            };
            let ty = self.maybe_parse_type_annotation();
            let default = if self.eat(TokenKind::Equal).is_some() {
                Some(self.parse_assignment(false))
            } else {
                None
            };
            let end = default
                .as_ref()
                .map(|e| e.loc().end)
                .or_else(|| ty.as_ref().map(|t| t.loc.end))
                .unwrap_or(pat.loc().end);
            params.push(Param {
                loc: Span { start, end },
                pat,
                ty,
                default,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if !self.at(TokenKind::RightParen) && !self.at(TokenKind::Eof) {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::ExpectedToken,
                "expected ',' or ')' in the parameter list",
            );
            self.skip_malformed_param();
        }
        self.expect(TokenKind::RightParen, "')'");
        params
    }

    /// Skip past a malformed parameter without crossing into the body or
    /// the next statement.  A newline-preceded token is a statement boundary
    /// here: an unterminated parameter list must not eat the line below it.
    fn skip_malformed_param(&mut self) {
        while !matches!(
            self.kind(),
            TokenKind::Comma
                | TokenKind::RightParen
                | TokenKind::LeftBrace
                | TokenKind::Semicolon
                | TokenKind::Eof
        ) {
            if starts_statement(self.kind()) || self.cur().had_line_terminator_before {
                break;
            }
            self.bump();
        }
    }

    // ── Classes ─────────────────────────────────────────────────────────────

    fn parse_class_decl(&mut self) -> ClassDecl {
        let (loc, id, super_class, body) = self.parse_class_parts();
        ClassDecl {
            loc,
            id,
            super_class,
            body,
        }
    }

    fn parse_class_expr(&mut self) -> ClassExpr {
        let (loc, id, super_class, body) = self.parse_class_parts();
        ClassExpr {
            loc,
            id,
            super_class,
            body,
        }
    }

    fn parse_class_parts(&mut self) -> (Span, Option<Ident>, Option<Box<Expr>>, ClassBody) {
        let start = self.bump().span; // class
        let id = self.try_parse_ident();
        let super_class = if self.eat(TokenKind::Extends).is_some() {
            Some(Box::new(self.parse_lhs_expr()))
        } else {
            None
        };
        let body = self.parse_class_body();
        (
            Span {
                start: start.start,
                end: body.loc.end,
            },
            id,
            super_class,
            body,
        )
    }

    fn parse_class_body(&mut self) -> ClassBody {
        let open = self.expect(TokenKind::LeftBrace, "'{'");
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let before = self.cursor;
            if let Some(member) = self.parse_class_member() {
                body.push(member);
            }
            if self.cursor == before {
                let tok = self.bump();
                self.diagnostics.error(
                    tok.span,
                    DiagnosticCode::UnexpectedToken,
                    format!("unexpected token '{}' in class body", self.slice(tok.span)),
                );
            }
        }
        let close = self.expect(TokenKind::RightBrace, "'}'");
        ClassBody {
            loc: open.to(close),
            body,
        }
    }

    fn parse_class_member(&mut self) -> Option<ClassMember> {
        let start = self.cur().span.start;

        // `static { … }` initialization block, or the `static` modifier.
        let is_static = if self.at(TokenKind::Static)
            && !matches!(
                self.peek(1).kind,
                TokenKind::Equal
                    | TokenKind::LeftParen
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
            ) {
            self.bump();
            if self.at(TokenKind::LeftBrace) {
                let block = self.parse_block();
                return Some(ClassMember::StaticBlock(StaticBlock {
                    loc: Span {
                        start,
                        end: block.loc.end,
                    },
                    body: block.body,
                }));
            }
            true
        } else {
            false
        };

        let is_async = self.at(TokenKind::Async)
            && !self.peek(1).had_line_terminator_before
            && !matches!(
                self.peek(1).kind,
                TokenKind::Equal
                    | TokenKind::LeftParen
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::Colon
            );
        if is_async {
            self.bump();
        }
        let is_generator = self.eat(TokenKind::Star).is_some();

        // `get name() {}` / `set name(v) {}` — only when a key follows.
        let accessor = if !is_async
            && !is_generator
            && matches!(self.kind(), TokenKind::Get | TokenKind::Set)
            && !matches!(
                self.peek(1).kind,
                TokenKind::Equal
                    | TokenKind::LeftParen
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::Colon
            ) {
            let kind = if self.at(TokenKind::Get) {
                MethodKind::Get
            } else {
                MethodKind::Set
            };
            self.bump();
            Some(kind)
        } else {
            None
        };

        let (key, is_computed) = self.parse_prop_key()?;

        if accessor.is_some() || self.at(TokenKind::LeftParen) {
            let kind = accessor.unwrap_or_else(|| match &key {
                PropKey::Ident(id) if !is_static && id.name == "constructor" => {
                    MethodKind::Constructor
                }
                _ => MethodKind::Method,
            });
            let fn_start = self.cur().span.start;
            let (params, return_ty, body) = self.parse_fn_rest();
            let value = FnExpr {
                loc: Span {
                    start: fn_start,
                    end: body.loc.end,
                },
                id: None,
                is_async,
                is_generator,
                params,
                return_ty,
                body,
            };
            return Some(ClassMember::Method(MethodDef {
                loc: Span {
                    start,
                    end: value.loc.end,
                },
                is_static,
                kind,
                key,
                is_computed,
                value,
            }));
        }

        // Field definition.
        let ty = self.maybe_parse_type_annotation();
        let value = if self.eat(TokenKind::Equal).is_some() {
            Some(Box::new(self.parse_assignment(false)))
        } else {
            None
        };
        self.eat_semicolon();
        let end = value
            .as_ref()
            .map(|e| e.loc().end)
            .or_else(|| ty.as_ref().map(|t| t.loc.end))
            .unwrap_or(prop_key_loc(&key).end);
        Some(ClassMember::Property(PropertyDef {
            loc: Span { start, end },
            is_static,
            key,
            is_computed,
            ty,
            value,
        }))
    }

    /// A property key: identifier, keyword-as-name, private name, string,
    /// number, or computed `[expr]`.  Returns `None` (without consuming)
    /// when the current token cannot be a key.
    fn parse_prop_key(&mut self) -> Option<(PropKey, bool)> {
        match self.kind() {
            TokenKind::LeftBracket => {
                self.bump();
                let expr = self.parse_assignment(false);
                self.expect(TokenKind::RightBracket, "']'");
                Some((PropKey::Computed(Box::new(expr)), true))
            }
            TokenKind::PrivateIdentifier => {
                let tok = self.bump();
                let name = match tok.value {
                    TokenValue::Str(s) => s,
                    _ => String::new(),
                };
                Some((
                    PropKey::Private(PrivateIdent {
                        loc: tok.span,
                        name,
                    }),
                    false,
                ))
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                Some((PropKey::Str(self.string_lit(&tok)), false))
            }
            TokenKind::NumericLiteral => {
                let tok = self.bump();
                Some((PropKey::Num(self.num_lit(&tok)), false))
            }
            k if prop_name_like(k) => {
                let tok = self.bump();
                Some((
                    PropKey::Ident(Ident {
                        loc: tok.span,
                        name: self.token_text(&tok),
                    }),
                    false,
                ))
            }
            _ => None,
        }
    }

    // ── Binding patterns ────────────────────────────────────────────────────

    /// A binding pattern: identifier, array destructuring, or object
    /// destructuring.  Returns `None` (without consuming) when the current
    /// token cannot start one; recovery is the caller's decision.
    fn parse_binding_pattern(&mut self) -> Option<Pat> {
        match self.kind() {
            TokenKind::LeftBracket => Some(self.parse_array_pattern()),
            TokenKind::LeftBrace => Some(self.parse_object_pattern()),
            k if ident_like(k) => {
                let tok = self.bump();
                Some(Pat::Ident(Ident {
                    loc: tok.span,
                    name: self.token_text(&tok),
                }))
            }
            _ => None,
        }
    }

    /// `[a, , b = 1, ...rest]`
    fn parse_array_pattern(&mut self) -> Pat {
        let open = self.bump().span; // [
        let mut elements = Vec::new();
        while !matches!(self.kind(), TokenKind::RightBracket | TokenKind::Eof) {
            if self.at(TokenKind::Comma) {
                self.bump();
                elements.push(None); // elision
                continue;
            }
            if self.at(TokenKind::DotDotDot) {
                let dots = self.bump().span;
                match self.parse_binding_pattern() {
                    Some(inner) => elements.push(Some(Pat::Rest(Box::new(RestElement {
                        loc: dots.to(inner.loc()),
                        argument: Box::new(inner),
                    })))),
                    None => {
                        let span = self.cur().span;
                        self.diagnostics.error(
                            span,
                            DiagnosticCode::ExpectedIdentifier,
                            "expected a binding after '...'",
                        );
                    }
                }
            } else {
                match self.parse_binding_pattern() {
                    Some(pat) => elements.push(Some(self.maybe_default(pat))),
                    None => {
                        let span = self.cur().span;
                        self.diagnostics.error(
                            span,
                            DiagnosticCode::ExpectedIdentifier,
                            "expected a binding pattern",
                        );
                        self.bump();
                        continue;
                    }
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBracket, "']'");
        Pat::Array(Box::new(ArrayPat {
            loc: open.to(close),
            elements,
        }))
    }

    /// `{ a, b: c, d = 1, [k]: v, ...rest }`
    fn parse_object_pattern(&mut self) -> Pat {
        let open = self.bump().span; // {
        let mut properties = Vec::new();
        while !matches!(self.kind(), TokenKind::RightBrace | TokenKind::Eof) {
            if self.at(TokenKind::DotDotDot) {
                let dots = self.bump().span;
                match self.parse_binding_pattern() {
                    Some(inner) => properties.push(ObjectPatProp::Rest(RestElement {
                        loc: dots.to(inner.loc()),
                        argument: Box::new(inner),
                    })),
                    None => {
                        let span = self.cur().span;
                        self.diagnostics.error(
                            span,
                            DiagnosticCode::ExpectedIdentifier,
                            "expected a binding after '...'",
                        );
                    }
                }
            } else if let Some((key, is_computed)) = self.parse_prop_key() {
                if self.eat(TokenKind::Colon).is_some() {
                    let value = match self.parse_binding_pattern() {
                        Some(pat) => self.maybe_default(pat),
                        None => {
                            let span = self.cur().span;
                            self.diagnostics.error(
                                span,
                                DiagnosticCode::ExpectedIdentifier,
                                "expected a binding pattern",
                            );
                            Pat::Ident(Ident {
                                loc: self.here(),
                                name: String::new(),
                            })
                        }
                    };
                    properties.push(ObjectPatProp::KeyValue(KeyValuePatProp {
                        loc: prop_key_loc(&key).to(value.loc()),
                        key,
                        is_computed,
                        value,
                    }));
                } else {
                    // Shorthand `{ a }` or `{ a = default }`.
                    let key = match key {
                        PropKey::Ident(id) => id,
                        other => {
                            let loc = prop_key_loc(&other);
                            self.diagnostics.error(
                                loc,
                                DiagnosticCode::ExpectedIdentifier,
                                "only identifier properties may use shorthand",
                            );
                            Ident {
                                loc,
                                name: String::new(),
                            }
                        }
                    };
                    let value = if self.eat(TokenKind::Equal).is_some() {
                        Some(Box::new(self.parse_assignment(false)))
                    } else {
                        None
                    };
                    let end = value.as_ref().map(|e| e.loc().end).unwrap_or(key.loc.end);
                    properties.push(ObjectPatProp::Assign(AssignPatProp {
                        loc: Span {
                            start: key.loc.start,
                            end,
                        },
                        key,
                        value,
                    }));
                }
            } else {
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::ExpectedIdentifier,
                    "expected a property name",
                );
                self.bump();
                continue;
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBrace, "'}'");
        Pat::Object(Box::new(ObjectPat {
            loc: open.to(close),
            properties,
        }))
    }

    /// Wrap `pat` in a default-value pattern when `= expr` follows.
    fn maybe_default(&mut self, pat: Pat) -> Pat {
        if self.eat(TokenKind::Equal).is_some() {
            let right = self.parse_assignment(false);
            let loc = pat.loc().to(right.loc());
            Pat::Assign(Box::new(AssignPat {
                loc,
                left: Box::new(pat),
                right: Box::new(right),
            }))
        } else {
            pat
        }
    }

    // ── Type annotations (optional dialect) ─────────────────────────────────

    /// Parse `: Type` when the next token is `:`.  The annotation is always
    /// consumed for recovery, but it only reaches the tree when the dialect
    /// is enabled; otherwise it is diagnosed and dropped.
    fn maybe_parse_type_annotation(&mut self) -> Option<TypeRef> {
        if !self.at(TokenKind::Colon) {
            return None;
        }
        let colon = self.bump().span;
        let ty = self.parse_type_ref();
        if self.options.lang.type_annotations {
            Some(ty)
        } else {
            self.diagnostics.error(
                colon.to(ty.loc),
                DiagnosticCode::TypeAnnotationsDisabled,
                "type annotations are not enabled for this source",
            );
            None
        }
    }

    /// A dotted type name with optional generic arguments and `[]` suffixes,
    /// e.g. `ns.Map<string, T[]>`.
    fn parse_type_ref(&mut self) -> TypeRef {
        let start = self.cur().span;
        let mut name = String::new();
        match self.try_parse_ident() {
            Some(id) => name.push_str(&id.name),
            None => {
                self.diagnostics.error(
                    start,
                    DiagnosticCode::ExpectedIdentifier,
                    "expected a type name",
                );
                return TypeRef {
                    loc: Span {
                        start: start.start,
                        end: start.start,
                    },
                    name,
                    args: Vec::new(),
                    array_dims: 0,
                };
            }
        }
        let mut end = start.end;
        while self.at(TokenKind::Dot) {
            self.bump();
            let seg = self.parse_ident("type name segment");
            name.push('.');
            name.push_str(&seg.name);
            end = seg.loc.end;
        }
        let mut args = Vec::new();
        if self.eat(TokenKind::Less).is_some() {
            loop {
                args.push(self.parse_type_ref());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            end = self.expect(TokenKind::Greater, "'>'").end;
        }
        let mut array_dims = 0;
        while self.at(TokenKind::LeftBracket) && self.peek(1).kind == TokenKind::RightBracket {
            self.bump();
            end = self.bump().span.end;
            array_dims += 1;
        }
        TypeRef {
            loc: Span {
                start: start.start,
                end,
            },
            name,
            args,
            array_dims,
        }
    }

    // ── Identifier / literal helpers ────────────────────────────────────────

    /// The text of an identifier-like token (identifier value, or the raw
    /// keyword text for contextual keywords used as names).
    fn token_text(&self, tok: &Token) -> String {
        match &tok.value {
            TokenValue::Str(s) => s.clone(),
            _ => self.slice(tok.span).to_string(),
        }
    }

    /// Consume an identifier-like token as an [`Ident`], or `None`.
    fn try_parse_ident(&mut self) -> Option<Ident> {
        if ident_like(self.kind()) {
            let tok = self.bump();
            Some(Ident {
                loc: tok.span,
                name: self.token_text(&tok),
            })
        } else {
            None
        }
    }

    /// Consume a required identifier; a missing one is diagnosed and
    /// replaced by a zero-width empty name.
    fn parse_ident(&mut self, what: &str) -> Ident {
        match self.try_parse_ident() {
            Some(id) => id,
            None => {
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::ExpectedIdentifier,
                    format!("expected {what}"),
                );
                Ident {
                    loc: Span {
                        start: span.start,
                        end: span.start,
                    },
                    name: String::new(),
                }
            }
        }
    }

    /// Build a [`StringLit`] from a string token (quotes stripped, escapes
    /// decoded best-effort).
    fn string_lit(&self, tok: &Token) -> StringLit {
        let raw = match &tok.value {
            TokenValue::Str(s) => s.as_str(),
            _ => "",
        };
        StringLit {
            loc: tok.span,
            value: cook_string(raw),
        }
    }

    /// Build a [`NumLit`] from a numeric token.
    fn num_lit(&self, tok: &Token) -> NumLit {
        let value = match tok.value {
            TokenValue::Number(n) => n,
            _ => f64::NAN,
        };
        NumLit {
            loc: tok.span,
            value,
            raw: self.slice(tok.span).to_string(),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    /// A full (possibly comma-sequenced) expression.
    fn parse_expression(&mut self, no_in: bool) -> Expr {
        let first = self.parse_assignment(no_in);
        if !self.at(TokenKind::Comma) {
            return first;
        }
        let mut expressions = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            expressions.push(self.parse_assignment(no_in));
        }
        let loc = expressions[0]
            .loc()
            .to(expressions.last().expect("nonempty").loc());
        Expr::Sequence(Box::new(SequenceExpr { loc, expressions }))
    }

    /// An assignment-level expression: arrow functions, `yield`, the
    /// conditional/binary ladder, and the right-associative assignment
    /// operators.
    fn parse_assignment(&mut self, no_in: bool) -> Expr {
        if self.at(TokenKind::Yield) {
            return self.parse_yield(no_in);
        }
        if let Some(arrow) = self.try_parse_arrow() {
            return arrow;
        }

        let left = self.parse_conditional(no_in);

        let Some(op) = assign_op(self.kind()) else {
            return left;
        };
        self.bump();
        let target = self.assignment_target(left, op);
        let right = self.parse_assignment(no_in);
        let loc = assign_target_loc(&target).to(right.loc());
        Expr::Assign(Box::new(AssignExpr {
            loc,
            op,
            left: target,
            right: Box::new(right),
        }))
    }

    /// Validate (and for destructuring, reinterpret) the left side of an
    /// assignment.  An unassignable target is diagnosed but kept, so the
    /// tree still reflects what the user wrote.
    fn assignment_target(&mut self, left: Expr, op: AssignOp) -> AssignTarget {
        match &left {
            Expr::Ident(_) | Expr::Member(_) | Expr::OptionalMember(_) => {
                AssignTarget::Expr(Box::new(left))
            }
            Expr::Array(_) | Expr::Object(_) if op == AssignOp::Assign => {
                let loc = left.loc();
                match expr_to_pattern(left) {
                    Some(pat) => AssignTarget::Pat(pat),
                    None => {
                        self.diagnostics.error(
                            loc,
                            DiagnosticCode::InvalidAssignmentTarget,
                            "invalid destructuring assignment target",
                        );
                        AssignTarget::Expr(Box::new(Expr::Error(ErrorExpr { loc })))
                    }
                }
            }
            _ => {
                let loc = left.loc();
                self.diagnostics.error(
                    loc,
                    DiagnosticCode::InvalidAssignmentTarget,
                    "invalid assignment target",
                );
                AssignTarget::Expr(Box::new(left))
            }
        }
    }

    /// `yield [*] [argument]` — the argument must start on the same line.
    fn parse_yield(&mut self, no_in: bool) -> Expr {
        let start = self.bump().span; // yield
        let delegate = self.eat(TokenKind::Star).is_some();
        let argument = if !self.cur().had_line_terminator_before && self.expr_follows() {
            Some(Box::new(self.parse_assignment(no_in)))
        } else {
            None
        };
        let end = argument.as_ref().map(|e| e.loc().end).unwrap_or(start.end);
        Expr::Yield(Box::new(YieldExpr {
            loc: Span {
                start: start.start,
                end,
            },
            delegate,
            argument,
        }))
    }

    /// `true` when the current token can begin an expression.
    fn expr_follows(&mut self) -> bool {
        starts_expression(self.kind())
    }

    // ── Arrow functions ─────────────────────────────────────────────────────

    /// Attempt an arrow function at the current position.
    ///
    /// Simple heads (`x =>`, `async x =>`) are decided by fixed lookahead.
    /// Parenthesized heads are speculative: [`Parser::checkpoint`], attempt
    /// the parameter-list parse, and if no `=>` follows the `)`,
    /// [`Parser::rewind`] and let the caller parse a parenthesized
    /// expression instead.  One rewind per attempt; speculation never
    /// restarts inside the region it already abandoned.
    fn try_parse_arrow(&mut self) -> Option<Expr> {
        // `async` prefix — only when the head follows on the same line.
        let (is_async, head_offset) = if self.at(TokenKind::Async)
            && !self.peek(1).had_line_terminator_before
            && (self.peek(1).kind == TokenKind::LeftParen || ident_like(self.peek(1).kind))
        {
            (true, 1)
        } else {
            (false, 0)
        };

        // The arrow's span starts at `async` when the modifier is present.
        let head_start = self.cur().span;

        // Simple head: `ident =>`.
        if ident_like(self.peek(head_offset).kind)
            && self.peek(head_offset + 1).kind == TokenKind::Arrow
            && !self.peek(head_offset + 1).had_line_terminator_before
        {
            if is_async {
                self.bump(); // async
            }
            let tok = self.bump();
            let param = Param {
                loc: tok.span,
                pat: Pat::Ident(Ident {
                    loc: tok.span,
                    name: self.token_text(&tok),
                }),
                ty: None,
                default: None,
            };
            self.bump(); // =>
            return Some(self.finish_arrow(head_start, is_async, vec![param], None));
        }

        // Parenthesized head: speculative.
        if self.peek(head_offset).kind != TokenKind::LeftParen {
            return None;
        }
        if self.speculating {
            // Already inside a speculative head; decide this one by scanning
            // to the matching ')' instead of nesting a second speculation.
            if !self.paren_head_is_arrow(head_offset) {
                return None;
            }
            if is_async {
                self.bump(); // async
            }
            let params = self.parse_params();
            let return_ty = self.maybe_parse_type_annotation();
            self.expect(TokenKind::Arrow, "'=>'");
            return Some(self.finish_arrow(head_start, is_async, params, return_ty));
        }
        let cp = self.checkpoint();
        self.speculating = true;
        if is_async {
            self.bump(); // async
        }
        let params = self.parse_params();
        let return_ty = self.maybe_parse_type_annotation();
        let committed = self.at(TokenKind::Arrow) && !self.cur().had_line_terminator_before;
        self.speculating = false;
        if committed {
            self.bump(); // =>
            Some(self.finish_arrow(head_start, is_async, params, return_ty))
        } else {
            self.rewind(cp);
            None
        }
    }

    /// Scan ahead from a `(` at `head_offset` to its matching `)` and report
    /// whether `=>` follows — the lookahead form of the arrow/paren
    /// decision, used where a rewind is not available.
    fn paren_head_is_arrow(&mut self, head_offset: usize) -> bool {
        let mut depth = 0usize;
        let mut k = head_offset;
        loop {
            match self.peek(k).kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek(k + 1).kind == TokenKind::Arrow;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            k += 1;
        }
    }

    /// Body of an arrow whose `=>` has been consumed.
    fn finish_arrow(
        &mut self,
        start: Span,
        is_async: bool,
        params: Vec<Param>,
        return_ty: Option<TypeRef>,
    ) -> Expr {
        let body = if self.at(TokenKind::LeftBrace) {
            ArrowBody::Block(self.parse_block())
        } else {
            ArrowBody::Expr(Box::new(self.parse_assignment(false)))
        };
        let end = match &body {
            ArrowBody::Block(b) => b.loc.end,
            ArrowBody::Expr(e) => e.loc().end,
        };
        Expr::Arrow(Box::new(ArrowExpr {
            loc: Span {
                start: start.start,
                end,
            },
            is_async,
            params,
            return_ty,
            body,
        }))
    }

    // ── Conditional / binary ────────────────────────────────────────────────

    fn parse_conditional(&mut self, no_in: bool) -> Expr {
        let test = self.parse_binary(1, no_in, None);
        if self.eat(TokenKind::Question).is_none() {
            return test;
        }
        let consequent = self.parse_assignment(false);
        self.expect(TokenKind::Colon, "':'");
        let alternate = self.parse_assignment(no_in);
        let loc = test.loc().to(alternate.loc());
        Expr::Conditional(Box::new(ConditionalExpr {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    /// Operator-precedence climbing: parse a unary operand, then fold every
    /// following binary operator whose precedence is at least `min_prec`.
    /// Left-associative operators parse their right side at `prec + 1`,
    /// right-associative (`**`) at `prec`.  `logical_ctx` carries the
    /// nearest enclosing unparenthesized logical operator so that `??`
    /// mixed with `&&`/`||` is diagnosed.
    fn parse_binary(&mut self, min_prec: u8, no_in: bool, logical_ctx: Option<LogicalOp>) -> Expr {
        let mut left = self.parse_unary();
        let mut prev_logical = logical_ctx;
        loop {
            let kind = self.kind();
            if no_in && kind == TokenKind::In {
                break;
            }
            let Some((prec, right_assoc)) = binary_prec(kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump();
            let next_min = if right_assoc { prec } else { prec + 1 };
            if let Some(op) = logical_op(kind) {
                self.check_nullish_mix(prev_logical, op);
                let right = self.parse_binary(next_min, no_in, Some(op));
                let loc = left.loc().to(right.loc());
                left = Expr::Logical(Box::new(LogicalExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }));
                prev_logical = Some(op);
            } else {
                let op = binary_op(kind).expect("kind has a precedence entry");
                let right = self.parse_binary(next_min, no_in, None);
                let loc = left.loc().to(right.loc());
                left = Expr::Binary(Box::new(BinaryExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }));
            }
        }
        left
    }

    /// `a ?? b || c` and friends must be parenthesized.
    fn check_nullish_mix(&mut self, prev: Option<LogicalOp>, op: LogicalOp) {
        let mixed = matches!(
            (prev, op),
            (Some(LogicalOp::And | LogicalOp::Or), LogicalOp::NullishCoalesce)
                | (Some(LogicalOp::NullishCoalesce), LogicalOp::And | LogicalOp::Or)
        );
        if mixed {
            let span = self.cur().span;
            self.diagnostics.error(
                span,
                DiagnosticCode::MixedNullishLogical,
                "'??' cannot be mixed with '&&' or '||' without parentheses",
            );
        }
    }

    // ── Unary / update ──────────────────────────────────────────────────────

    fn parse_unary(&mut self) -> Expr {
        if let Some(op) = unary_op(self.kind()) {
            let start = self.bump().span;
            let argument = self.parse_unary();
            let loc = Span {
                start: start.start,
                end: argument.loc().end,
            };
            return Expr::Unary(Box::new(UnaryExpr {
                loc,
                op,
                argument: Box::new(argument),
            }));
        }
        match self.kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let tok = self.bump();
                let op = if tok.kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let argument = self.parse_unary();
                self.check_update_target(&argument);
                let loc = Span {
                    start: tok.span.start,
                    end: argument.loc().end,
                };
                Expr::Update(Box::new(UpdateExpr {
                    loc,
                    op,
                    prefix: true,
                    argument: Box::new(argument),
                }))
            }
            TokenKind::Await => {
                let start = self.bump().span;
                let argument = self.parse_unary();
                let loc = Span {
                    start: start.start,
                    end: argument.loc().end,
                };
                Expr::Await(Box::new(AwaitExpr {
                    loc,
                    argument: Box::new(argument),
                }))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Postfix `++` / `--` — restricted productions: a line terminator
    /// before the operator ends the previous statement instead.
    fn parse_postfix(&mut self) -> Expr {
        let expr = self.parse_lhs_expr();
        if matches!(self.kind(), TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.cur().had_line_terminator_before
        {
            let tok = self.bump();
            let op = if tok.kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.check_update_target(&expr);
            let loc = Span {
                start: expr.loc().start,
                end: tok.span.end,
            };
            return Expr::Update(Box::new(UpdateExpr {
                loc,
                op,
                prefix: false,
                argument: Box::new(expr),
            }));
        }
        expr
    }

    fn check_update_target(&mut self, argument: &Expr) {
        if !matches!(
            argument,
            Expr::Ident(_) | Expr::Member(_) | Expr::OptionalMember(_) | Expr::Error(_)
        ) {
            self.diagnostics.error(
                argument.loc(),
                DiagnosticCode::InvalidAssignmentTarget,
                "invalid operand for '++' / '--'",
            );
        }
    }

    // ── Member / call chains ────────────────────────────────────────────────

    /// A left-hand-side expression: `new`, dynamic `import`, a primary, and
    /// the member/call/tagged-template chain.
    fn parse_lhs_expr(&mut self) -> Expr {
        let base = match self.kind() {
            TokenKind::New => self.parse_new(),
            TokenKind::Import => self.parse_import_expr(),
            _ => self.parse_primary(),
        };
        self.parse_chain(base)
    }

    /// `new.target`, or `new callee [(args)]`.
    fn parse_new(&mut self) -> Expr {
        let start = self.bump().span; // new
        if self.at(TokenKind::Dot) {
            self.bump();
            let property = if self.at(TokenKind::Target) {
                let tok = self.bump();
                Ident {
                    loc: tok.span,
                    name: "target".to_string(),
                }
            } else {
                self.parse_ident("'target'")
            };
            return Expr::MetaProp(MetaPropExpr {
                loc: Span {
                    start: start.start,
                    end: property.loc.end,
                },
                meta: Ident {
                    loc: start,
                    name: "new".to_string(),
                },
                property,
            });
        }
        // The callee is itself a member chain without call arguments —
        // `new a.b.C(x)` binds the argument list to the `new`.
        let callee_base = match self.kind() {
            TokenKind::New => self.parse_new(),
            TokenKind::Import => self.parse_import_expr(),
            _ => self.parse_primary(),
        };
        let callee = self.parse_member_chain_no_call(callee_base);
        let (arguments, end) = if self.at(TokenKind::LeftParen) {
            let (args, close) = self.parse_arguments();
            (args, close.end)
        } else {
            (Vec::new(), callee.loc().end)
        };
        Expr::New(Box::new(NewExpr {
            loc: Span {
                start: start.start,
                end,
            },
            callee: Box::new(callee),
            arguments,
        }))
    }

    /// `import(source[, options])` or `import.meta` in expression position.
    fn parse_import_expr(&mut self) -> Expr {
        let start = self.bump().span; // import
        if self.at(TokenKind::Dot) {
            self.bump();
            let property = if self.at(TokenKind::Meta) {
                let tok = self.bump();
                Ident {
                    loc: tok.span,
                    name: "meta".to_string(),
                }
            } else {
                self.parse_ident("'meta'")
            };
            return Expr::MetaProp(MetaPropExpr {
                loc: Span {
                    start: start.start,
                    end: property.loc.end,
                },
                meta: Ident {
                    loc: start,
                    name: "import".to_string(),
                },
                property,
            });
        }
        self.expect(TokenKind::LeftParen, "'('");
        let source = self.parse_assignment(false);
        let options = if self.eat(TokenKind::Comma).is_some() && self.expr_follows() {
            Some(Box::new(self.parse_assignment(false)))
        } else {
            None
        };
        let _ = self.eat(TokenKind::Comma); // optional trailing comma
        let close = self.expect(TokenKind::RightParen, "')'");
        Expr::Import(Box::new(ImportExpr {
            loc: Span {
                start: start.start,
                end: close.end,
            },
            source: Box::new(source),
            options,
        }))
    }

    /// The member/call chain: `.name`, `?.name`, `[expr]`, `(args)`, and
    /// tagged templates.
    fn parse_chain(&mut self, mut expr: Expr) -> Expr {
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.bump();
                    expr = self.finish_member(expr, false);
                }
                TokenKind::QuestionDot => {
                    self.bump();
                    expr = match self.kind() {
                        TokenKind::LeftParen => {
                            let (arguments, close) = self.parse_arguments();
                            let loc = expr.loc().to(close);
                            Expr::OptionalCall(Box::new(OptionalCallExpr {
                                loc,
                                callee: Box::new(expr),
                                arguments,
                            }))
                        }
                        TokenKind::LeftBracket => {
                            self.bump();
                            let prop = self.parse_expression(false);
                            let close = self.expect(TokenKind::RightBracket, "']'");
                            let loc = expr.loc().to(close);
                            Expr::OptionalMember(Box::new(OptionalMemberExpr {
                                loc,
                                object: Box::new(expr),
                                property: MemberProp::Computed(Box::new(prop)),
                                is_computed: true,
                            }))
                        }
                        _ => {
                            let property = self.parse_member_prop();
                            let loc = expr.loc().to(member_prop_loc(&property));
                            Expr::OptionalMember(Box::new(OptionalMemberExpr {
                                loc,
                                object: Box::new(expr),
                                property,
                                is_computed: false,
                            }))
                        }
                    };
                }
                TokenKind::LeftBracket => {
                    self.bump();
                    let prop = self.parse_expression(false);
                    let close = self.expect(TokenKind::RightBracket, "']'");
                    let loc = expr.loc().to(close);
                    expr = Expr::Member(Box::new(MemberExpr {
                        loc,
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(prop)),
                        is_computed: true,
                    }));
                }
                TokenKind::LeftParen => {
                    let (arguments, close) = self.parse_arguments();
                    let loc = expr.loc().to(close);
                    expr = Expr::Call(Box::new(CallExpr {
                        loc,
                        callee: Box::new(expr),
                        arguments,
                    }));
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    let quasi = self.parse_template_lit();
                    let loc = expr.loc().to(quasi.loc);
                    expr = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc,
                        tag: Box::new(expr),
                        quasi,
                    }));
                }
                _ => break,
            }
        }
        expr
    }

    /// Member accesses only — used for `new` callees, where `(` belongs to
    /// the `new` itself.
    fn parse_member_chain_no_call(&mut self, mut expr: Expr) -> Expr {
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.bump();
                    expr = self.finish_member(expr, false);
                }
                TokenKind::LeftBracket => {
                    self.bump();
                    let prop = self.parse_expression(false);
                    let close = self.expect(TokenKind::RightBracket, "']'");
                    let loc = expr.loc().to(close);
                    expr = Expr::Member(Box::new(MemberExpr {
                        loc,
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(prop)),
                        is_computed: true,
                    }));
                }
                _ => break,
            }
        }
        expr
    }

    fn finish_member(&mut self, object: Expr, is_computed: bool) -> Expr {
        let property = self.parse_member_prop();
        let loc = object.loc().to(member_prop_loc(&property));
        Expr::Member(Box::new(MemberExpr {
            loc,
            object: Box::new(object),
            property,
            is_computed,
        }))
    }

    /// The name after `.` / `?.` — any identifier-like word, a keyword, or
    /// a private name.
    fn parse_member_prop(&mut self) -> MemberProp {
        if self.at(TokenKind::PrivateIdentifier) {
            let tok = self.bump();
            let name = match tok.value {
                TokenValue::Str(s) => s,
                _ => String::new(),
            };
            return MemberProp::Private(PrivateIdent {
                loc: tok.span,
                name,
            });
        }
        if prop_name_like(self.kind()) {
            let tok = self.bump();
            return MemberProp::Ident(Ident {
                loc: tok.span,
                name: self.token_text(&tok),
            });
        }
        let span = self.cur().span;
        self.diagnostics.error(
            span,
            DiagnosticCode::ExpectedIdentifier,
            "expected a property name after '.'",
        );
        MemberProp::Ident(Ident {
            loc: Span {
                start: span.start,
                end: span.start,
            },
            name: String::new(),
        })
    }

    /// `( arg, …, ...spread )` — returns the arguments and the span of the
    /// closing parenthesis.
    fn parse_arguments(&mut self) -> (Vec<Expr>, Span) {
        self.expect(TokenKind::LeftParen, "'('");
        let mut arguments = Vec::new();
        while !matches!(self.kind(), TokenKind::RightParen | TokenKind::Eof) {
            if self.at(TokenKind::DotDotDot) {
                let dots = self.bump().span;
                let argument = self.parse_assignment(false);
                let loc = dots.to(argument.loc());
                arguments.push(Expr::Spread(Box::new(SpreadElement {
                    loc,
                    argument: Box::new(argument),
                })));
            } else {
                arguments.push(self.parse_assignment(false));
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen, "')'");
        (arguments, close)
    }

    // ── Primary expressions ─────────────────────────────────────────────────

    fn parse_primary(&mut self) -> Expr {
        match self.kind() {
            TokenKind::Null => {
                let tok = self.bump();
                Expr::Null(NullLit { loc: tok.span })
            }
            TokenKind::True | TokenKind::False => {
                let tok = self.bump();
                Expr::Bool(BoolLit {
                    loc: tok.span,
                    value: tok.kind == TokenKind::True,
                })
            }
            TokenKind::NumericLiteral => {
                let tok = self.bump();
                let raw = self.slice(tok.span);
                if raw.ends_with('n') {
                    Expr::BigInt(BigIntLit {
                        loc: tok.span,
                        value: raw[..raw.len() - 1].to_string(),
                    })
                } else {
                    Expr::Num(self.num_lit(&tok))
                }
            }
            TokenKind::StringLiteral => {
                let tok = self.bump();
                Expr::Str(self.string_lit(&tok))
            }
            TokenKind::RegExpLiteral => {
                let tok = self.bump();
                Expr::Regexp(regexp_lit(&tok))
            }
            // An expression was expected, so a `/` here is a regular
            // expression, whatever the scanner's heuristic said.
            TokenKind::Slash | TokenKind::SlashEqual => {
                let tok = self.relex_regexp();
                if tok.kind == TokenKind::RegExpLiteral {
                    self.bump();
                    Expr::Regexp(regexp_lit(&tok))
                } else {
                    // The rescan did not find a slash (parser defect, not an
                    // input error); treat the token as unexpected.
                    self.unexpected_expression_token()
                }
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Expr::Template(Box::new(self.parse_template_lit()))
            }
            TokenKind::This => {
                let tok = self.bump();
                Expr::This(ThisExpr { loc: tok.span })
            }
            TokenKind::Super => {
                // `super.x` / `super(…)`: the chain loop attaches the rest.
                let tok = self.bump();
                Expr::Ident(Ident {
                    loc: tok.span,
                    name: "super".to_string(),
                })
            }
            TokenKind::LeftParen => self.parse_paren_expr(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => Expr::Fn(Box::new(self.parse_fn_expr(false))),
            TokenKind::Async
                if self.peek(1).kind == TokenKind::Function
                    && !self.peek(1).had_line_terminator_before =>
            {
                let async_span = self.bump().span;
                let mut f = self.parse_fn_expr(true);
                f.loc.start = async_span.start;
                Expr::Fn(Box::new(f))
            }
            TokenKind::Class => Expr::Class(Box::new(self.parse_class_expr())),
            TokenKind::Less => self.parse_markup_or_error(),
            k if ident_like(k) => {
                let tok = self.bump();
                Expr::Ident(Ident {
                    loc: tok.span,
                    name: self.token_text(&tok),
                })
            }
            _ => self.unexpected_expression_token(),
        }
    }

    /// An expression was required and the current token cannot start one.
    ///
    /// Tokens a parent production is waiting for (closers, separators, end
    /// of input) are left in place and a zero-width error marker is
    /// returned; anything else is consumed so the parse makes progress.
    fn unexpected_expression_token(&mut self) -> Expr {
        let tok = self.cur().clone();
        self.diagnostics.error(
            tok.span,
            DiagnosticCode::ExpectedExpression,
            format!("expected an expression, found '{}'", self.slice(tok.span)),
        );
        match tok.kind {
            TokenKind::Eof
            | TokenKind::Semicolon
            | TokenKind::RightBrace
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::Comma
            | TokenKind::Colon
            | TokenKind::TemplateMiddle
            | TokenKind::TemplateTail => Expr::Error(ErrorExpr { loc: self.here() }),
            _ => {
                self.bump();
                Expr::Error(ErrorExpr { loc: tok.span })
            }
        }
    }

    /// `( expression )` — arrow heads were already ruled out by
    /// [`Parser::try_parse_arrow`].
    fn parse_paren_expr(&mut self) -> Expr {
        let open = self.bump().span; // (
        if self.at(TokenKind::RightParen) {
            let close = self.bump().span;
            let loc = open.to(close);
            self.diagnostics.error(
                loc,
                DiagnosticCode::ExpectedExpression,
                "empty parentheses are not an expression",
            );
            return Expr::Error(ErrorExpr { loc });
        }
        let expr = self.parse_expression(false);
        self.expect(TokenKind::RightParen, "')'");
        expr
    }

    /// `[a, , b, ...rest]`
    fn parse_array_literal(&mut self) -> Expr {
        let open = self.bump().span; // [
        let mut elements = Vec::new();
        while !matches!(self.kind(), TokenKind::RightBracket | TokenKind::Eof) {
            if self.at(TokenKind::Comma) {
                self.bump();
                elements.push(None); // elision
                continue;
            }
            if self.at(TokenKind::DotDotDot) {
                let dots = self.bump().span;
                let argument = self.parse_assignment(false);
                let loc = dots.to(argument.loc());
                elements.push(Some(Expr::Spread(Box::new(SpreadElement {
                    loc,
                    argument: Box::new(argument),
                }))));
            } else {
                elements.push(Some(self.parse_assignment(false)));
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBracket, "']'");
        Expr::Array(Box::new(ArrayExpr {
            loc: open.to(close),
            elements,
        }))
    }

    /// `{ key: value, shorthand, method() {}, get g() {}, ...spread }`
    fn parse_object_literal(&mut self) -> Expr {
        let open = self.bump().span; // {
        let mut properties = Vec::new();
        while !matches!(self.kind(), TokenKind::RightBrace | TokenKind::Eof) {
            let before = self.cursor;
            if let Some(prop) = self.parse_object_prop() {
                properties.push(prop);
            }
            if self.cursor == before {
                let tok = self.bump();
                self.diagnostics.error(
                    tok.span,
                    DiagnosticCode::UnexpectedToken,
                    format!(
                        "unexpected token '{}' in object literal",
                        self.slice(tok.span)
                    ),
                );
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBrace, "'}'");
        Expr::Object(Box::new(ObjectExpr {
            loc: open.to(close),
            properties,
        }))
    }

    fn parse_object_prop(&mut self) -> Option<ObjectProp> {
        if self.at(TokenKind::DotDotDot) {
            let dots = self.bump().span;
            let argument = self.parse_assignment(false);
            let loc = dots.to(argument.loc());
            return Some(ObjectProp::Spread(SpreadElement {
                loc,
                argument: Box::new(argument),
            }));
        }

        let start = self.cur().span.start;
        let is_async = self.at(TokenKind::Async)
            && !self.peek(1).had_line_terminator_before
            && !matches!(
                self.peek(1).kind,
                TokenKind::Colon | TokenKind::Comma | TokenKind::RightBrace | TokenKind::LeftParen
            );
        if is_async {
            self.bump();
        }
        let is_generator = self.eat(TokenKind::Star).is_some();

        let accessor = if !is_async
            && !is_generator
            && matches!(self.kind(), TokenKind::Get | TokenKind::Set)
            && !matches!(
                self.peek(1).kind,
                TokenKind::Colon | TokenKind::Comma | TokenKind::RightBrace | TokenKind::LeftParen
            ) {
            let kind = self.kind();
            self.bump();
            Some(kind)
        } else {
            None
        };

        let (key, is_computed) = self.parse_prop_key()?;

        // Method forms.
        if accessor.is_some() || is_async || is_generator || self.at(TokenKind::LeftParen) {
            let fn_start = self.cur().span.start;
            let (params, return_ty, body) = self.parse_fn_rest();
            let value = FnExpr {
                loc: Span {
                    start: fn_start,
                    end: body.loc.end,
                },
                id: None,
                is_async,
                is_generator,
                params,
                return_ty,
                body,
            };
            let end = value.loc.end;
            let prop_value = match accessor {
                Some(TokenKind::Get) => PropValue::Get(value),
                Some(TokenKind::Set) => PropValue::Set(value),
                _ => PropValue::Method(value),
            };
            return Some(ObjectProp::Prop(Box::new(Prop {
                loc: Span { start, end },
                key,
                is_computed,
                value: prop_value,
            })));
        }

        // `key: value`.
        if self.eat(TokenKind::Colon).is_some() {
            let value = self.parse_assignment(false);
            let end = value.loc().end;
            return Some(ObjectProp::Prop(Box::new(Prop {
                loc: Span { start, end },
                key,
                is_computed,
                value: PropValue::Value(Box::new(value)),
            })));
        }

        if !matches!(key, PropKey::Ident(_)) {
            self.diagnostics.error(
                prop_key_loc(&key),
                DiagnosticCode::ExpectedToken,
                "expected ':' after a non-identifier property key",
            );
        }

        // Shorthand default (`{ a = 1 }`) is only meaningful when the object
        // is later reinterpreted as a destructuring target; it is carried as
        // an assignment value so [`expr_to_pattern`] can recover it.
        if self.at(TokenKind::Equal)
            && let PropKey::Ident(id) = &key
        {
            let id = id.clone();
            self.bump(); // =
            let right = self.parse_assignment(false);
            let loc = id.loc.to(right.loc());
            let value = Expr::Assign(Box::new(AssignExpr {
                loc,
                op: AssignOp::Assign,
                left: AssignTarget::Expr(Box::new(Expr::Ident(id))),
                right: Box::new(right),
            }));
            return Some(ObjectProp::Prop(Box::new(Prop {
                loc: Span {
                    start,
                    end: loc.end,
                },
                key,
                is_computed,
                value: PropValue::Value(Box::new(value)),
            })));
        }

        let end = prop_key_loc(&key).end;
        Some(ObjectProp::Prop(Box::new(Prop {
            loc: Span { start, end },
            key,
            is_computed,
            value: PropValue::Shorthand,
        })))
    }

    /// A (possibly substituted) template literal; the head token is current.
    fn parse_template_lit(&mut self) -> TemplateLit {
        let head = self.bump();
        let raw = match &head.value {
            TokenValue::Str(s) => s.clone(),
            _ => String::new(),
        };
        if head.kind == TokenKind::NoSubstitutionTemplate {
            return TemplateLit {
                loc: head.span,
                quasis: vec![TemplateElement {
                    loc: head.span,
                    cooked: decode_escapes(&raw),
                    raw,
                    tail: true,
                }],
                expressions: Vec::new(),
            };
        }

        let mut quasis = vec![TemplateElement {
            loc: head.span,
            cooked: decode_escapes(&raw),
            raw,
            tail: false,
        }];
        let mut expressions = Vec::new();
        let mut end = head.span.end;
        loop {
            expressions.push(self.parse_expression(false));
            match self.kind() {
                TokenKind::TemplateMiddle | TokenKind::TemplateTail => {
                    let tok = self.bump();
                    let raw = match &tok.value {
                        TokenValue::Str(s) => s.clone(),
                        _ => String::new(),
                    };
                    let tail = tok.kind == TokenKind::TemplateTail;
                    quasis.push(TemplateElement {
                        loc: tok.span,
                        cooked: decode_escapes(&raw),
                        raw,
                        tail,
                    });
                    end = tok.span.end;
                    if tail {
                        break;
                    }
                }
                _ => {
                    // Unterminated substitution (the scanner already reported
                    // the unterminated template if input ran out).
                    let span = self.cur().span;
                    self.diagnostics.error(
                        span,
                        DiagnosticCode::ExpectedToken,
                        "expected '}' to close the template substitution",
                    );
                    let here = self.here();
                    quasis.push(TemplateElement {
                        loc: here,
                        raw: String::new(),
                        cooked: Some(String::new()),
                        tail: true,
                    });
                    end = here.end;
                    break;
                }
            }
        }
        TemplateLit {
            loc: Span {
                start: head.span.start,
                end,
            },
            quasis,
            expressions,
        }
    }

    // ── Markup dialect ──────────────────────────────────────────────────────

    /// A `<` in expression position: a markup element when the dialect is
    /// on, otherwise a recovered error.
    fn parse_markup_or_error(&mut self) -> Expr {
        if self.options.lang.markup {
            let element = self.parse_markup_element();
            return Expr::Markup(Box::new(element));
        }
        let span = self.cur().span;
        if ident_like(self.peek(1).kind) {
            self.diagnostics.error(
                span,
                DiagnosticCode::MarkupDisabled,
                "markup elements are not enabled for this source",
            );
        } else {
            self.diagnostics.error(
                span,
                DiagnosticCode::ExpectedExpression,
                "expected an expression, found '<'",
            );
        }
        self.bump();
        Expr::Error(ErrorExpr { loc: span })
    }

    /// `<name attrs> children </name>` or `<name attrs />` — `<` is current.
    fn parse_markup_element(&mut self) -> MarkupElement {
        let open = self.bump().span; // <
        let name = self.parse_markup_name();

        let mut attributes = Vec::new();
        while ident_like(self.kind()) {
            let attr_name = self.parse_ident("attribute name");
            let value = if self.eat(TokenKind::Equal).is_some() {
                match self.kind() {
                    TokenKind::StringLiteral => {
                        let tok = self.bump();
                        Some(MarkupAttrValue::Str(self.string_lit(&tok)))
                    }
                    TokenKind::LeftBrace => {
                        self.bump();
                        let expr = self.parse_assignment(false);
                        self.expect(TokenKind::RightBrace, "'}'");
                        Some(MarkupAttrValue::Expr(Box::new(expr)))
                    }
                    _ => {
                        let span = self.cur().span;
                        self.diagnostics.error(
                            span,
                            DiagnosticCode::ExpectedToken,
                            "expected a string or '{expression}' attribute value",
                        );
                        None
                    }
                }
            } else {
                None
            };
            let end = match &value {
                Some(MarkupAttrValue::Str(s)) => s.loc.end,
                Some(MarkupAttrValue::Expr(e)) => e.loc().end,
                None => attr_name.loc.end,
            };
            attributes.push(MarkupAttr {
                loc: Span {
                    start: attr_name.loc.start,
                    end,
                },
                name: attr_name,
                value,
            });
        }

        // Self-closing: `<name … />`.
        if self.at(TokenKind::Slash) && self.peek(1).kind == TokenKind::Greater {
            self.bump(); // /
            let close = self.bump().span; // >
            return MarkupElement {
                loc: open.to(close),
                name,
                attributes,
                children: Vec::new(),
                self_closing: true,
            };
        }

        self.expect(TokenKind::Greater, "'>'");
        let (children, end) = self.parse_markup_children(&name, open);
        MarkupElement {
            loc: Span {
                start: open.start,
                end,
            },
            name,
            attributes,
            children,
            self_closing: false,
        }
    }

    /// Child content up to (and including) the matching closing tag.
    fn parse_markup_children(
        &mut self,
        element_name: &str,
        open: Span,
    ) -> (Vec<MarkupChild>, Position) {
        let mut children = Vec::new();
        loop {
            // Between tags ordinary tokenization does not apply: rescan the
            // raw text run up to the next `<` or `{`.
            let text = self.relex_markup_text();
            let text_value = match &text.value {
                TokenValue::Str(s) => s.clone(),
                _ => String::new(),
            };
            self.bump(); // the text token (possibly zero-width)
            if !text_value.is_empty() {
                children.push(MarkupChild::Text(MarkupText {
                    loc: text.span,
                    value: text_value,
                }));
            }
            match self.kind() {
                TokenKind::LeftBrace => {
                    self.bump();
                    let expr = self.parse_expression(false);
                    self.expect(TokenKind::RightBrace, "'}'");
                    children.push(MarkupChild::Expr(Box::new(expr)));
                }
                TokenKind::Less if self.peek(1).kind == TokenKind::Slash => {
                    self.bump(); // <
                    self.bump(); // /
                    let close_name_start = self.cur().span;
                    let close_name = self.parse_markup_name();
                    let close = self.expect(TokenKind::Greater, "'>'");
                    if close_name != element_name {
                        self.diagnostics.error(
                            close_name_start.to(close),
                            DiagnosticCode::MismatchedMarkupTag,
                            format!(
                                "closing tag '</{close_name}>' does not match '<{element_name}>'"
                            ),
                        );
                    }
                    return (children, close.end);
                }
                TokenKind::Less => {
                    let nested = self.parse_markup_element();
                    children.push(MarkupChild::Element(Box::new(nested)));
                }
                TokenKind::Eof => {
                    self.diagnostics.error(
                        open,
                        DiagnosticCode::ExpectedToken,
                        format!("missing closing tag '</{element_name}>'"),
                    );
                    let end = self.cur().span.end;
                    return (children, end);
                }
                _ => {
                    // rescan_markup_text stops only at `<`, `{`, or Eof.
                    let tok = self.bump();
                    self.diagnostics.error(
                        tok.span,
                        DiagnosticCode::UnexpectedToken,
                        "unexpected token in markup content",
                    );
                }
            }
        }
    }

    /// A (possibly dotted) markup tag name.
    fn parse_markup_name(&mut self) -> String {
        let mut name = match self.try_parse_ident() {
            Some(id) => id.name,
            None => {
                let span = self.cur().span;
                self.diagnostics.error(
                    span,
                    DiagnosticCode::ExpectedIdentifier,
                    "expected a markup tag name",
                );
                String::new()
            }
        };
        while self.at(TokenKind::Dot) {
            self.bump();
            let seg = self.parse_ident("tag name segment");
            name.push('.');
            name.push_str(&seg.name);
        }
        name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token classification
// ─────────────────────────────────────────────────────────────────────────────

/// Tokens usable as binding identifiers: plain identifiers plus the
/// contextual keywords, which are ordinary names outside their one special
/// position.
fn ident_like(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Async
            | TokenKind::From
            | TokenKind::As
            | TokenKind::Get
            | TokenKind::Set
            | TokenKind::Target
            | TokenKind::Meta
            | TokenKind::Of
            | TokenKind::Static
            | TokenKind::Let
            | TokenKind::Await
            | TokenKind::Yield
    )
}

/// Tokens usable as property names after `.` or as literal object keys —
/// every reserved word qualifies there.
fn prop_name_like(kind: TokenKind) -> bool {
    ident_like(kind)
        || matches!(
            kind,
            TokenKind::Break
                | TokenKind::Case
                | TokenKind::Catch
                | TokenKind::Class
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Debugger
                | TokenKind::Default
                | TokenKind::Delete
                | TokenKind::Do
                | TokenKind::Else
                | TokenKind::Enum
                | TokenKind::Export
                | TokenKind::Extends
                | TokenKind::False
                | TokenKind::Finally
                | TokenKind::For
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Instanceof
                | TokenKind::New
                | TokenKind::Null
                | TokenKind::Return
                | TokenKind::Super
                | TokenKind::Switch
                | TokenKind::This
                | TokenKind::Throw
                | TokenKind::True
                | TokenKind::Try
                | TokenKind::Typeof
                | TokenKind::Var
                | TokenKind::Void
                | TokenKind::While
                | TokenKind::With
        )
}

/// Keywords that can only begin a statement — the resynchronization points
/// for panic-mode recovery.
fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Var
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::Switch
            | TokenKind::Try
            | TokenKind::Return
            | TokenKind::Throw
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Debugger
            | TokenKind::With
            | TokenKind::Import
            | TokenKind::Export
    )
}

/// Tokens that can begin an expression — used for optional-argument
/// decisions (`yield`, `import(x,)`).
fn starts_expression(kind: TokenKind) -> bool {
    ident_like(kind)
        || matches!(
            kind,
            TokenKind::NumericLiteral
                | TokenKind::StringLiteral
                | TokenKind::RegExpLiteral
                | TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateHead
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::New
                | TokenKind::Import
                | TokenKind::Delete
                | TokenKind::Void
                | TokenKind::Typeof
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Tilde
                | TokenKind::Bang
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Slash
                | TokenKind::SlashEqual
                | TokenKind::Less
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Operator tables
// ─────────────────────────────────────────────────────────────────────────────

/// Precedence and associativity for binary/logical operators.
///
/// Follows the published ECMAScript grammar: each token kind maps to exactly
/// one entry, and only exponentiation is right-associative here (assignment
/// associativity is handled by [`Parser::parse_assignment`] recursing on its
/// right side).
fn binary_prec(kind: TokenKind) -> Option<(u8, bool)> {
    let entry = match kind {
        TokenKind::QuestionQuestion => (1, false),
        TokenKind::PipePipe => (2, false),
        TokenKind::AmpersandAmpersand => (3, false),
        TokenKind::Pipe => (4, false),
        TokenKind::Caret => (5, false),
        TokenKind::Ampersand => (6, false),
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::EqualEqualEqual
        | TokenKind::BangEqualEqual => (7, false),
        TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::In
        | TokenKind::Instanceof => (8, false),
        TokenKind::LessLess | TokenKind::GreaterGreater | TokenKind::GreaterGreaterGreater => {
            (9, false)
        }
        TokenKind::Plus | TokenKind::Minus => (10, false),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (11, false),
        TokenKind::StarStar => (12, true),
        _ => return None,
    };
    Some(entry)
}

fn logical_op(kind: TokenKind) -> Option<LogicalOp> {
    match kind {
        TokenKind::AmpersandAmpersand => Some(LogicalOp::And),
        TokenKind::PipePipe => Some(LogicalOp::Or),
        TokenKind::QuestionQuestion => Some(LogicalOp::NullishCoalesce),
        _ => None,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::NotEq,
        TokenKind::EqualEqualEqual => BinaryOp::StrictEq,
        TokenKind::BangEqualEqual => BinaryOp::StrictNotEq,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::LtEq,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::GtEq,
        TokenKind::LessLess => BinaryOp::Shl,
        TokenKind::GreaterGreater => BinaryOp::Shr,
        TokenKind::GreaterGreaterGreater => BinaryOp::UShr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::StarStar => BinaryOp::Exp,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    let op = match kind {
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Typeof => UnaryOp::Typeof,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Delete => UnaryOp::Delete,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Equal => AssignOp::Assign,
        TokenKind::PlusEqual => AssignOp::AddAssign,
        TokenKind::MinusEqual => AssignOp::SubAssign,
        TokenKind::StarEqual => AssignOp::MulAssign,
        TokenKind::SlashEqual => AssignOp::DivAssign,
        TokenKind::PercentEqual => AssignOp::RemAssign,
        TokenKind::StarStarEqual => AssignOp::ExpAssign,
        TokenKind::LessLessEqual => AssignOp::ShlAssign,
        TokenKind::GreaterGreaterEqual => AssignOp::ShrAssign,
        TokenKind::GreaterGreaterGreaterEqual => AssignOp::UShrAssign,
        TokenKind::AmpersandEqual => AssignOp::BitAndAssign,
        TokenKind::PipeEqual => AssignOp::BitOrAssign,
        TokenKind::CaretEqual => AssignOp::BitXorAssign,
        TokenKind::AmpersandAmpersandEqual => AssignOp::LogicalAndAssign,
        TokenKind::PipePipeEqual => AssignOp::LogicalOrAssign,
        TokenKind::QuestionQuestionEqual => AssignOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}

// ─────────────────────────────────────────────────────────────────────────────
// Location helpers
// ─────────────────────────────────────────────────────────────────────────────

fn imported_loc(name: &ModuleExportName) -> Span {
    match name {
        ModuleExportName::Ident(id) => id.loc,
        ModuleExportName::Str(s) => s.loc,
    }
}

fn export_default_end(declaration: &ExportDefaultExpr) -> Position {
    match declaration {
        ExportDefaultExpr::Fn(f) => f.loc.end,
        ExportDefaultExpr::Class(c) => c.loc.end,
        ExportDefaultExpr::Expr(e) => e.loc().end,
    }
}

fn prop_key_loc(key: &PropKey) -> Span {
    match key {
        PropKey::Ident(id) => id.loc,
        PropKey::Private(p) => p.loc,
        PropKey::Str(s) => s.loc,
        PropKey::Num(n) => n.loc,
        PropKey::Computed(e) => e.loc(),
    }
}

fn member_prop_loc(property: &MemberProp) -> Span {
    match property {
        MemberProp::Ident(id) => id.loc,
        MemberProp::Private(p) => p.loc,
        MemberProp::Computed(e) => e.loc(),
    }
}

fn assign_target_loc(target: &AssignTarget) -> Span {
    match target {
        AssignTarget::Expr(e) => e.loc(),
        AssignTarget::Pat(p) => p.loc(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expression → pattern reinterpretation
// ─────────────────────────────────────────────────────────────────────────────

/// Reinterpret an already-parsed expression as a destructuring pattern, for
/// `[a, b] = …`, `({x} = …)`, and `for ([a, b] of …)` heads.  Returns `None`
/// when the expression contains something that cannot be a binding target;
/// the caller decides how to diagnose.
fn expr_to_pattern(expr: Expr) -> Option<Pat> {
    match expr {
        Expr::Ident(id) => Some(Pat::Ident(id)),
        Expr::Assign(a) if a.op == AssignOp::Assign => {
            let a = *a;
            let left = match a.left {
                AssignTarget::Pat(p) => p,
                AssignTarget::Expr(e) => expr_to_pattern(*e)?,
            };
            Some(Pat::Assign(Box::new(AssignPat {
                loc: a.loc,
                left: Box::new(left),
                right: a.right,
            })))
        }
        Expr::Array(arr) => {
            let arr = *arr;
            let mut elements = Vec::with_capacity(arr.elements.len());
            for element in arr.elements {
                match element {
                    None => elements.push(None),
                    Some(Expr::Spread(spread)) => {
                        let spread = *spread;
                        let argument = expr_to_pattern(*spread.argument)?;
                        elements.push(Some(Pat::Rest(Box::new(RestElement {
                            loc: spread.loc,
                            argument: Box::new(argument),
                        }))));
                    }
                    Some(e) => elements.push(Some(expr_to_pattern(e)?)),
                }
            }
            Some(Pat::Array(Box::new(ArrayPat {
                loc: arr.loc,
                elements,
            })))
        }
        Expr::Object(obj) => {
            let obj = *obj;
            let mut properties = Vec::with_capacity(obj.properties.len());
            for prop in obj.properties {
                match prop {
                    ObjectProp::Spread(spread) => {
                        let argument = expr_to_pattern(*spread.argument)?;
                        properties.push(ObjectPatProp::Rest(RestElement {
                            loc: spread.loc,
                            argument: Box::new(argument),
                        }));
                    }
                    ObjectProp::Prop(p) => {
                        let p = *p;
                        match p.value {
                            PropValue::Shorthand => {
                                let key = match p.key {
                                    PropKey::Ident(id) => id,
                                    _ => return None,
                                };
                                properties.push(ObjectPatProp::Assign(AssignPatProp {
                                    loc: p.loc,
                                    key,
                                    value: None,
                                }));
                            }
                            PropValue::Value(v) => {
                                // A shorthand default (`{ a = 1 }`) is carried
                                // as `a = 1`; recover it as such.
                                if let PropKey::Ident(key) = &p.key
                                    && let Expr::Assign(a) = v.as_ref()
                                    && a.op == AssignOp::Assign
                                    && matches!(
                                        &a.left,
                                        AssignTarget::Expr(l)
                                            if matches!(l.as_ref(), Expr::Ident(i) if i.name == key.name)
                                    )
                                {
                                    let key = key.clone();
                                    let Expr::Assign(a) = *v else { unreachable!() };
                                    properties.push(ObjectPatProp::Assign(AssignPatProp {
                                        loc: p.loc,
                                        key,
                                        value: Some(a.right),
                                    }));
                                    continue;
                                }
                                let value = expr_to_pattern(*v)?;
                                properties.push(ObjectPatProp::KeyValue(KeyValuePatProp {
                                    loc: p.loc,
                                    key: p.key,
                                    is_computed: p.is_computed,
                                    value,
                                }));
                            }
                            _ => return None,
                        }
                    }
                }
            }
            Some(Pat::Object(Box::new(ObjectPat {
                loc: obj.loc,
                properties,
            })))
        }
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literal cooking
// ─────────────────────────────────────────────────────────────────────────────

/// Strip the quotes from a string literal's raw text and decode its escape
/// sequences.  Malformed escapes (already diagnosed by the scanner) fall
/// back to the raw body text.
fn cook_string(raw: &str) -> String {
    let mut body = raw;
    if let Some(quote) = body.chars().next()
        && (quote == '"' || quote == '\'')
    {
        body = &body[1..];
        if body.ends_with(quote) {
            body = &body[..body.len() - 1];
        }
    }
    decode_escapes(body).unwrap_or_else(|| body.to_string())
}

/// Decode the escape sequences of a string or template body.  Returns
/// `None` when a sequence is malformed — template elements record that as a
/// missing cooked value.
fn decode_escapes(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !matches!(chars.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                out.push(char::from_u32(hi * 16 + lo)?);
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut value: u32 = 0;
                    let mut any = false;
                    while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                        value = value.checked_mul(16)?.checked_add(d)?;
                        any = true;
                        chars.next();
                    }
                    if chars.next() != Some('}') || !any {
                        return None;
                    }
                    out.push(char::from_u32(value)?);
                } else {
                    let mut value: u32 = 0;
                    for _ in 0..4 {
                        value = value * 16 + chars.next()?.to_digit(16)?;
                    }
                    out.push(char::from_u32(value)?);
                }
            }
            // Line continuation: an escaped line terminator contributes
            // nothing to the cooked value.
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    Some(out)
}

/// Split a regular-expression literal's raw text into pattern and flags.
fn regexp_lit(tok: &Token) -> RegExpLit {
    let raw = match &tok.value {
        TokenValue::Str(s) => s.as_str(),
        _ => "",
    };
    let body = raw.strip_prefix('/').unwrap_or(raw);
    match body.rfind('/') {
        Some(idx) => RegExpLit {
            loc: tok.span,
            pattern: body[..idx].to_string(),
            flags: body[idx + 1..].to_string(),
        },
        // Unterminated literal: everything is pattern, no flags.
        None => RegExpLit {
            loc: tok.span,
            pattern: body.to_string(),
            flags: String::new(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> ParseResult {
        parse(src, ParseOptions::default())
    }

    fn p_module(src: &str) -> ParseResult {
        parse(
            src,
            ParseOptions {
                source_type: SourceType::Module,
                lang: LangOpts::default(),
            },
        )
    }

    fn p_clean(src: &str) -> Program {
        let result = p(src);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics for {src:?}: {:?}",
            result.diagnostics
        );
        assert!(!result.was_recovered);
        result.program
    }

    fn stmt(program: &Program, i: usize) -> &Stmt {
        match &program.body[i] {
            ProgramItem::Stmt(s) => s,
            ProgramItem::ModuleDecl(_) => panic!("expected a statement at index {i}"),
        }
    }

    fn expr_stmt(program: &Program, i: usize) -> &Expr {
        match stmt(program, i) {
            Stmt::Expr(e) => &e.expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    // ── Progress / termination ───────────────────────────────────────────────

    #[test]
    fn test_empty_source() {
        let program = p_clean("");
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_garbage_never_panics_and_recovers() {
        let inputs = [
            "@#$%^&",
            "}}}}",
            ")))((",
            "let = = = ;",
            "if while for",
            "\u{0}\u{1}\u{2}",
            "function ( { [ <",
            "£€¥ 😀 ;;;",
        ];
        for src in inputs {
            let result = p(src);
            assert!(result.was_recovered, "expected recovery for {src:?}");
            assert!(
                !result.diagnostics.is_empty(),
                "expected diagnostics for {src:?}"
            );
        }
    }

    #[test]
    fn test_deeply_nested_input_terminates() {
        let src = format!("{}x{}", "(".repeat(64), ")".repeat(64));
        let result = p(&src);
        assert!(result.diagnostics.is_empty());
    }

    // ── ASI ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_asi_newline_separates_statements() {
        let program = p_clean("a\nb");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(expr_stmt(&program, 0), Expr::Ident(id) if id.name == "a"));
        assert!(matches!(expr_stmt(&program, 1), Expr::Ident(id) if id.name == "b"));
    }

    #[test]
    fn test_asi_return_is_restricted() {
        let program = p_clean("function f() { return\na }");
        let Stmt::FnDecl(f) = stmt(&program, 0) else {
            panic!("expected a function declaration");
        };
        assert_eq!(f.body.body.len(), 2);
        let Stmt::Return(ret) = &f.body.body[0] else {
            panic!("expected a return statement");
        };
        assert!(ret.argument.is_none(), "newline after return triggers ASI");
        assert!(matches!(&f.body.body[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_asi_missing_separator_is_diagnosed_but_parsed() {
        let result = p("a = 1 b = 2");
        assert_eq!(result.program.body.len(), 2);
        assert!(result.was_recovered);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::ExpectedSemicolon),
            "expected an ASI diagnostic: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn test_asi_closing_brace_terminates() {
        let program = p_clean("{ a }");
        let Stmt::Block(block) = stmt(&program, 0) else {
            panic!("expected a block");
        };
        assert_eq!(block.body.len(), 1);
    }

    #[test]
    fn test_asi_postfix_update_is_restricted() {
        // A newline before `++` ends the previous statement.
        let program = p_clean("a\n++b");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(expr_stmt(&program, 0), Expr::Ident(_)));
        let Expr::Update(update) = expr_stmt(&program, 1) else {
            panic!("expected a prefix update");
        };
        assert!(update.prefix);
    }

    // ── Precedence ──────────────────────────────────────────────────────────

    #[test]
    fn test_precedence_mul_binds_tighter_than_add() {
        let program = p_clean("1 + 2 * 3;");
        let Expr::Binary(add) = expr_stmt(&program, 0) else {
            panic!("expected a binary expression");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(&*add.left, Expr::Num(n) if n.value == 1.0));
        let Expr::Binary(mul) = &*add.right else {
            panic!("expected the right child to be the multiplication");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    }

    #[test]
    fn test_precedence_exponentiation_right_assoc() {
        let program = p_clean("2 ** 3 ** 2;");
        let Expr::Binary(outer) = expr_stmt(&program, 0) else {
            panic!("expected a binary expression");
        };
        assert_eq!(outer.op, BinaryOp::Exp);
        assert!(matches!(&*outer.left, Expr::Num(n) if n.value == 2.0));
        let Expr::Binary(inner) = &*outer.right else {
            panic!("expected 2 ** (3 ** 2) nesting");
        };
        assert_eq!(inner.op, BinaryOp::Exp);
        assert!(matches!(&*inner.left, Expr::Num(n) if n.value == 3.0));
    }

    #[test]
    fn test_precedence_logical_and_binds_tighter_than_or() {
        let program = p_clean("a || b && c;");
        let Expr::Logical(or) = expr_stmt(&program, 0) else {
            panic!("expected a logical expression");
        };
        assert_eq!(or.op, LogicalOp::Or);
        assert!(matches!(&*or.right, Expr::Logical(and) if and.op == LogicalOp::And));
    }

    #[test]
    fn test_nullish_mixed_with_or_is_diagnosed() {
        let result = p("a ?? b || c;");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::MixedNullishLogical)
        );
    }

    #[test]
    fn test_nullish_parenthesized_mix_is_fine() {
        p_clean("(a ?? b) || c;");
        p_clean("a ?? (b || c);");
    }

    #[test]
    fn test_assignment_right_assoc() {
        let program = p_clean("a = b = 1;");
        let Expr::Assign(outer) = expr_stmt(&program, 0) else {
            panic!("expected an assignment");
        };
        assert!(matches!(&*outer.right, Expr::Assign(_)));
    }

    // ── Statements ──────────────────────────────────────────────────────────

    #[test]
    fn test_var_decl_kinds_and_declarators() {
        let program = p_clean("var a; let b = 1; const c = 2, d = 3;");
        let Stmt::VarDecl(v) = stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(v.kind, VarKind::Var);
        let Stmt::VarDecl(l) = stmt(&program, 1) else {
            panic!()
        };
        assert_eq!(l.kind, VarKind::Let);
        assert!(l.declarators[0].init.is_some());
        let Stmt::VarDecl(c) = stmt(&program, 2) else {
            panic!()
        };
        assert_eq!(c.kind, VarKind::Const);
        assert_eq!(c.declarators.len(), 2);
    }

    #[test]
    fn test_let_as_identifier() {
        let program = p_clean("let;");
        assert!(matches!(expr_stmt(&program, 0), Expr::Ident(id) if id.name == "let"));
    }

    #[test]
    fn test_if_else_chain() {
        let program = p_clean("if (a) b; else if (c) d; else e;");
        let Stmt::If(outer) = stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(
            outer.alternate.as_deref(),
            Some(Stmt::If(inner)) if inner.alternate.is_some()
        ));
    }

    #[test]
    fn test_for_classic() {
        let program = p_clean("for (let i = 0; i < 10; i++) body();");
        let Stmt::For(f) = stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(f.init, Some(ForInit::VarDecl(_))));
        assert!(f.test.is_some());
        assert!(f.update.is_some());
    }

    #[test]
    fn test_for_in_and_for_of() {
        let program = p_clean("for (const k in obj) {}\nfor await (const v of it) {}");
        assert!(matches!(stmt(&program, 0), Stmt::ForIn(_)));
        let Stmt::ForOf(fo) = stmt(&program, 1) else {
            panic!()
        };
        assert!(fo.is_await);
    }

    #[test]
    fn test_for_of_expression_head_becomes_pattern() {
        let program = p_clean("for ([a, b] of pairs) {}");
        let Stmt::ForOf(fo) = stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(&fo.left, ForInOfLeft::Pat(Pat::Array(_))));
    }

    #[test]
    fn test_switch_cases() {
        let program = p_clean("switch (x) { case 1: a; break; default: b; }");
        let Stmt::Switch(s) = stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(s.cases.len(), 2);
        assert!(s.cases[0].test.is_some());
        assert!(s.cases[1].test.is_none());
    }

    #[test]
    fn test_try_catch_finally() {
        let program = p_clean("try { a; } catch (e) { b; } finally { c; }");
        let Stmt::Try(t) = stmt(&program, 0) else {
            panic!()
        };
        assert!(t.handler.as_ref().is_some_and(|h| h.param.is_some()));
        assert!(t.finalizer.is_some());
    }

    #[test]
    fn test_optional_catch_binding() {
        let program = p_clean("try { a; } catch { b; }");
        let Stmt::Try(t) = stmt(&program, 0) else {
            panic!()
        };
        assert!(t.handler.as_ref().is_some_and(|h| h.param.is_none()));
    }

    #[test]
    fn test_labeled_break_continue() {
        let program = p_clean("outer: while (x) { break outer; continue outer; }");
        let Stmt::Labeled(l) = stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(l.label.name, "outer");
    }

    #[test]
    fn test_do_while() {
        let program = p_clean("do x(); while (y)");
        assert!(matches!(stmt(&program, 0), Stmt::DoWhile(_)));
    }

    #[test]
    fn test_throw_requires_same_line_argument() {
        let result = p("throw\nx;");
        let Stmt::Throw(t) = stmt(&result.program, 0) else {
            panic!()
        };
        assert!(matches!(&*t.argument, Expr::Error(_)));
        assert!(result.was_recovered);
    }

    // ── Error recovery ──────────────────────────────────────────────────────

    #[test]
    fn test_recovery_malformed_params_yields_error_marker() {
        let result = p("function f( { }\nlet y = 2;");
        assert!(result.was_recovered);
        assert!(!result.diagnostics.is_empty());
        let Stmt::FnDecl(f) = stmt(&result.program, 0) else {
            panic!("expected a function declaration, got {:?}", result.program);
        };
        assert!(
            f.body.body.iter().any(|s| matches!(s, Stmt::Error(_))),
            "expected an error marker inside the function"
        );
        // Parsing resumed at the following well-formed statement.
        let Stmt::VarDecl(v) = stmt(&result.program, 1) else {
            panic!("expected the trailing let declaration to parse");
        };
        assert_eq!(v.kind, VarKind::Let);
    }

    #[test]
    fn test_recovery_stray_token_between_statements() {
        let result = p("let a = 1; @ let b = 2;");
        assert!(result.was_recovered);
        assert!(matches!(stmt(&result.program, 0), Stmt::VarDecl(_)));
        assert!(
            result
                .program
                .body
                .iter()
                .any(|item| matches!(item, ProgramItem::Stmt(Stmt::VarDecl(v)) if v.declarators[0]
                    .id
                    .loc()
                    .start
                    .offset
                    > 10)),
            "the second declaration must survive recovery"
        );
    }

    #[test]
    fn test_recovery_error_statement_spans_skipped_region() {
        let result = p("let x = ][;\nok();");
        assert!(result.was_recovered);
        // The trailing call still parses.
        assert!(
            result
                .program
                .body
                .iter()
                .any(|item| matches!(item, ProgramItem::Stmt(Stmt::Expr(e)) if matches!(&*e.expr, Expr::Call(_))))
        );
    }

    #[test]
    fn test_recovery_missing_paren() {
        let result = p("if (a { b(); }");
        assert!(result.was_recovered);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::ExpectedToken)
        );
        assert!(matches!(stmt(&result.program, 0), Stmt::If(_)));
    }

    // ── Regexp vs. division ─────────────────────────────────────────────────

    #[test]
    fn test_regexp_in_statement_position_after_paren() {
        // The scanner's heuristic says division after `)`; the parser knows
        // an expression starts here and requests a rescan.
        let program = p_clean("if (x) /abc/.test(y);");
        let Stmt::If(i) = stmt(&program, 0) else {
            panic!()
        };
        let Stmt::Expr(e) = &*i.consequent else {
            panic!("expected an expression statement consequent");
        };
        let Expr::Call(call) = &*e.expr else {
            panic!("expected a call");
        };
        let Expr::Member(m) = &*call.callee else {
            panic!("expected a member callee");
        };
        assert!(matches!(&*m.object, Expr::Regexp(r) if r.pattern == "abc"));
    }

    #[test]
    fn test_division_still_divides() {
        let program = p_clean("let r = a / b / c;");
        let Stmt::VarDecl(v) = stmt(&program, 0) else {
            panic!()
        };
        let Some(init) = &v.declarators[0].init else {
            panic!()
        };
        let Expr::Binary(outer) = &**init else {
            panic!("expected division, got {init:?}");
        };
        assert_eq!(outer.op, BinaryOp::Div);
        assert!(matches!(&*outer.left, Expr::Binary(inner) if inner.op == BinaryOp::Div));
    }

    // ── Arrow functions vs. parenthesized expressions ───────────────────────

    #[test]
    fn test_arrow_simple_head() {
        let program = p_clean("x => x + 1;");
        let Expr::Arrow(arrow) = expr_stmt(&program, 0) else {
            panic!("expected an arrow function");
        };
        assert_eq!(arrow.params.len(), 1);
        assert!(matches!(&arrow.body, ArrowBody::Expr(_)));
    }

    #[test]
    fn test_arrow_paren_head() {
        let program = p_clean("(a, b = 1, ...rest) => { return a; };");
        let Expr::Arrow(arrow) = expr_stmt(&program, 0) else {
            panic!("expected an arrow function");
        };
        assert_eq!(arrow.params.len(), 3);
        assert!(arrow.params[1].default.is_some());
        assert!(matches!(arrow.params[2].pat, Pat::Rest(_)));
        assert!(matches!(&arrow.body, ArrowBody::Block(_)));
    }

    #[test]
    fn test_paren_expression_is_not_an_arrow() {
        let program = p_clean("(a + b) * c;");
        let Expr::Binary(mul) = expr_stmt(&program, 0) else {
            panic!("expected a binary expression");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
        assert!(matches!(&*mul.left, Expr::Binary(add) if add.op == BinaryOp::Add));
    }

    #[test]
    fn test_async_arrow() {
        let program = p_clean("async (x) => await x;");
        let Expr::Arrow(arrow) = expr_stmt(&program, 0) else {
            panic!("expected an arrow function");
        };
        assert!(arrow.is_async);
    }

    #[test]
    fn test_async_as_plain_identifier() {
        let program = p_clean("async;");
        assert!(matches!(expr_stmt(&program, 0), Expr::Ident(id) if id.name == "async"));
    }

    #[test]
    fn test_lexical_error_survives_arrow_speculation() {
        // The unterminated string is scanned while the arrow head is being
        // attempted; abandoning the attempt must not lose the scanner's
        // diagnostic.
        let result = p("let x = (\"abc\ny);");
        assert!(result.was_recovered);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::UnterminatedString),
            "{:?}",
            result.diagnostics
        );
    }

    #[test]
    fn test_nested_arrow_inside_speculative_head() {
        let program = p_clean("(f = (y) => y) => f;");
        let Expr::Arrow(outer) = expr_stmt(&program, 0) else {
            panic!("expected an arrow function");
        };
        assert_eq!(outer.params.len(), 1);
        assert!(outer.params[0].default.is_some());
    }

    // ── Member / call chains ────────────────────────────────────────────────

    #[test]
    fn test_member_and_call_chain() {
        let program = p_clean("a.b[c](d).e;");
        let Expr::Member(outer) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(&*outer.object, Expr::Call(_)));
    }

    #[test]
    fn test_optional_chain() {
        let program = p_clean("a?.b?.[c]?.(d);");
        let Expr::OptionalCall(call) = expr_stmt(&program, 0) else {
            panic!("expected an optional call, got {:?}", expr_stmt(&program, 0));
        };
        assert!(matches!(&*call.callee, Expr::OptionalMember(m) if m.is_computed));
    }

    #[test]
    fn test_new_with_member_callee() {
        let program = p_clean("new ns.Thing(1, 2);");
        let Expr::New(n) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(&*n.callee, Expr::Member(_)));
        assert_eq!(n.arguments.len(), 2);
    }

    #[test]
    fn test_new_target_and_import_meta() {
        let program = p_clean("function f() { new.target; }");
        let Stmt::FnDecl(f) = stmt(&program, 0) else {
            panic!()
        };
        let Stmt::Expr(e) = &f.body.body[0] else {
            panic!()
        };
        assert!(matches!(&*e.expr, Expr::MetaProp(m) if m.property.name == "target"));

        let result = p_module("import.meta.url;");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_dynamic_import() {
        let program = p_clean("import(\"./mod\").then(go);");
        let Expr::Call(call) = expr_stmt(&program, 0) else {
            panic!()
        };
        let Expr::Member(m) = &*call.callee else {
            panic!()
        };
        assert!(matches!(&*m.object, Expr::Import(_)));
    }

    #[test]
    fn test_tagged_template() {
        let program = p_clean("tag`a${x}b`;");
        let Expr::TaggedTemplate(t) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(t.quasi.quasis.len(), 2);
        assert_eq!(t.quasi.expressions.len(), 1);
    }

    #[test]
    fn test_template_literal_quasis() {
        let program = p_clean("`a${x}b${y}c`;");
        let Expr::Template(t) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(t.quasis.len(), 3);
        assert_eq!(t.expressions.len(), 2);
        assert_eq!(t.quasis[0].raw, "a");
        assert!(t.quasis[2].tail);
    }

    // ── Destructuring ───────────────────────────────────────────────────────

    #[test]
    fn test_destructuring_declaration() {
        let program = p_clean("const { a, b: { c }, d = 1, ...rest } = obj;");
        let Stmt::VarDecl(v) = stmt(&program, 0) else {
            panic!()
        };
        let Pat::Object(o) = &v.declarators[0].id else {
            panic!("expected an object pattern");
        };
        assert_eq!(o.properties.len(), 4);
    }

    #[test]
    fn test_destructuring_assignment() {
        let program = p_clean("[a, , b = 2, ...rest] = list;");
        let Expr::Assign(assign) = expr_stmt(&program, 0) else {
            panic!()
        };
        let AssignTarget::Pat(Pat::Array(arr)) = &assign.left else {
            panic!("expected an array pattern target, got {:?}", assign.left);
        };
        assert_eq!(arr.elements.len(), 4);
        assert!(arr.elements[1].is_none());
        assert!(matches!(arr.elements[2], Some(Pat::Assign(_))));
        assert!(matches!(arr.elements[3], Some(Pat::Rest(_))));
    }

    #[test]
    fn test_invalid_assignment_target_is_diagnosed() {
        let result = p("a + b = c;");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::InvalidAssignmentTarget)
        );
        // Still one statement, still an assignment node.
        assert_eq!(result.program.body.len(), 1);
    }

    // ── Functions and classes ───────────────────────────────────────────────

    #[test]
    fn test_function_forms() {
        let program = p_clean(
            "function f(a, b) {}\nasync function g() {}\nfunction* h() { yield 1; }",
        );
        let Stmt::FnDecl(f) = stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(f.params.len(), 2);
        let Stmt::FnDecl(g) = stmt(&program, 1) else {
            panic!()
        };
        assert!(g.is_async);
        let Stmt::FnDecl(h) = stmt(&program, 2) else {
            panic!()
        };
        assert!(h.is_generator);
    }

    #[test]
    fn test_class_members() {
        let program = p_clean(
            "class A extends B {\n  constructor(x) { this.x = x; }\n  #count = 0;\n  static of() {}\n  get size() { return 1; }\n  static { init(); }\n}",
        );
        let Stmt::ClassDecl(c) = stmt(&program, 0) else {
            panic!()
        };
        assert!(c.super_class.is_some());
        assert_eq!(c.body.body.len(), 5);
        assert!(matches!(
            &c.body.body[0],
            ClassMember::Method(m) if m.kind == MethodKind::Constructor
        ));
        assert!(matches!(
            &c.body.body[1],
            ClassMember::Property(pd) if matches!(pd.key, PropKey::Private(_))
        ));
        assert!(matches!(
            &c.body.body[2],
            ClassMember::Method(m) if m.is_static
        ));
        assert!(matches!(
            &c.body.body[3],
            ClassMember::Method(m) if m.kind == MethodKind::Get
        ));
        assert!(matches!(&c.body.body[4], ClassMember::StaticBlock(_)));
    }

    #[test]
    fn test_object_literal_forms() {
        let program = p_clean(
            "let o = { a: 1, b, [k]: 2, m() {}, get g() { return 1; }, async n() {}, ...rest };",
        );
        let Stmt::VarDecl(v) = stmt(&program, 0) else {
            panic!()
        };
        let Some(init) = &v.declarators[0].init else {
            panic!()
        };
        let Expr::Object(o) = &**init else {
            panic!()
        };
        assert_eq!(o.properties.len(), 7);
    }

    // ── Modules ─────────────────────────────────────────────────────────────

    #[test]
    fn test_import_forms() {
        let result = p_module(
            "import \"./side\";\nimport d from \"./a\";\nimport * as ns from \"./b\";\nimport d2, { x, y as z } from \"./c\";",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.program.body.len(), 4);
        let ProgramItem::ModuleDecl(ModuleDecl::Import(i)) = &result.program.body[3] else {
            panic!()
        };
        assert_eq!(i.specifiers.len(), 3);
        assert_eq!(i.source.value, "./c");
    }

    #[test]
    fn test_export_forms() {
        let result = p_module(
            "export { a, b as c };\nexport * from \"./all\";\nexport * as ns from \"./ns\";\nexport default function () {}\nexport const k = 1;",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.program.body.len(), 5);
        assert!(matches!(
            &result.program.body[4],
            ProgramItem::ModuleDecl(ModuleDecl::ExportNamed(e)) if e.declaration.is_some()
        ));
    }

    #[test]
    fn test_module_item_in_script_is_diagnosed() {
        let result = p("import x from \"./y\";");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::ModuleItemInScript)
        );
        // The declaration still lands in the tree for navigation.
        assert!(matches!(
            &result.program.body[0],
            ProgramItem::ModuleDecl(ModuleDecl::Import(_))
        ));
    }

    // ── Expression fragments ────────────────────────────────────────────────

    #[test]
    fn test_fragment_entry_point() {
        let result = parse_fragment("user.name ?? \"anonymous\"", ParseOptions::default());
        assert!(result.diagnostics.is_empty());
        assert!(matches!(result.expr, Expr::Logical(_)));
    }

    #[test]
    fn test_fragment_trailing_tokens_diagnosed() {
        let result = parse_fragment("1 + 2 3", ParseOptions::default());
        assert!(result.was_recovered);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::TrailingTokens)
        );
    }

    // ── Strict entry points ─────────────────────────────────────────────────

    #[test]
    fn test_strict_accepts_clean_input() {
        assert!(parse_script_strict("let x = 1;").is_ok());
        assert!(parse_module_strict("export const a = 1;").is_ok());
    }

    #[test]
    fn test_strict_rejects_recovered_input() {
        let err = parse_script_strict("let x = ;").unwrap_err();
        assert!(err.to_string().contains("SyntaxError"));
    }

    // ── Type annotations ────────────────────────────────────────────────────

    fn typed_opts() -> ParseOptions {
        ParseOptions {
            source_type: SourceType::Script,
            lang: LangOpts {
                type_annotations: true,
                markup: false,
            },
        }
    }

    #[test]
    fn test_type_annotations_enabled() {
        let result = parse(
            "function f(a: number, b: ns.Map<string, T[]>): boolean { return true; }\nlet v: string = s;",
            typed_opts(),
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ProgramItem::Stmt(Stmt::FnDecl(f)) = &result.program.body[0] else {
            panic!()
        };
        assert!(f.params[0].ty.is_some());
        let ty = f.params[1].ty.as_ref().unwrap();
        assert_eq!(ty.name, "ns.Map");
        assert_eq!(ty.args.len(), 2);
        assert_eq!(ty.args[1].array_dims, 1);
        assert!(f.return_ty.is_some());
    }

    #[test]
    fn test_type_annotations_disabled_is_diagnosed() {
        let result = p("let v: string = s;");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::TypeAnnotationsDisabled)
        );
        // Recovery: the declaration still parses with its initializer.
        let Stmt::VarDecl(v) = stmt(&result.program, 0) else {
            panic!()
        };
        assert!(v.declarators[0].init.is_some());
        assert!(v.declarators[0].ty.is_none());
    }

    // ── Markup dialect ──────────────────────────────────────────────────────

    fn markup_opts() -> ParseOptions {
        ParseOptions {
            source_type: SourceType::Script,
            lang: LangOpts {
                type_annotations: false,
                markup: true,
            },
        }
    }

    #[test]
    fn test_markup_element() {
        let result = parse(
            "let el = <panel title=\"hi\" open compact={mode}>before {name} <spacer/> after</panel>;",
            markup_opts(),
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let ProgramItem::Stmt(Stmt::VarDecl(v)) = &result.program.body[0] else {
            panic!()
        };
        let Some(init) = &v.declarators[0].init else {
            panic!()
        };
        let Expr::Markup(el) = &**init else {
            panic!("expected a markup element, got {init:?}");
        };
        assert_eq!(el.name, "panel");
        assert_eq!(el.attributes.len(), 3);
        assert!(el.attributes[1].value.is_none());
        assert!(!el.self_closing);
        // "before ", {name}, " ", <spacer/>, " after".
        assert_eq!(el.children.len(), 5);
        assert!(matches!(
            &el.children[0],
            MarkupChild::Text(t) if t.value == "before "
        ));
        assert!(matches!(&el.children[1], MarkupChild::Expr(_)));
        assert!(matches!(
            &el.children[3],
            MarkupChild::Element(nested) if nested.self_closing
        ));
        assert!(matches!(
            &el.children[4],
            MarkupChild::Text(t) if t.value == " after"
        ));
    }

    #[test]
    fn test_markup_mismatched_closing_tag() {
        let result = parse("let el = <a>text</b>;", markup_opts());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::MismatchedMarkupTag)
        );
    }

    #[test]
    fn test_markup_disabled_is_diagnosed() {
        let result = p("let el = <panel/>;");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.code == DiagnosticCode::MarkupDisabled)
        );
    }

    #[test]
    fn test_markup_less_than_still_compares() {
        let result = parse("if (a < b) c();", markup_opts());
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    // ── Spans ───────────────────────────────────────────────────────────────

    #[test]
    fn test_program_span_covers_source() {
        let src = "let x = 1;\nlet y = 2;\n";
        let program = p_clean(src);
        assert_eq!(program.loc.start.offset, 0);
        assert_eq!(program.loc.end.offset, src.len());
    }

    #[test]
    fn test_binary_span_contains_children() {
        let program = p_clean("  a + b * c;");
        let expr = expr_stmt(&program, 0);
        let Expr::Binary(add) = expr else { panic!() };
        let parent = expr.loc();
        for child in [&add.left, &add.right] {
            let c = child.loc();
            assert!(parent.start.offset <= c.start.offset);
            assert!(c.end.offset <= parent.end.offset);
        }
        assert!(add.left.loc().end.offset <= add.right.loc().start.offset);
    }

    #[test]
    fn test_async_modifier_is_inside_the_node_span() {
        let src = "async function g() {}\nlet f = async (x) => x;";
        let program = p_clean(src);
        let Stmt::FnDecl(g) = stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(g.loc.start.offset, 0, "the declaration starts at 'async'");
        let Stmt::VarDecl(v) = stmt(&program, 1) else {
            panic!()
        };
        let Some(init) = &v.declarators[0].init else {
            panic!()
        };
        let Expr::Arrow(arrow) = &**init else {
            panic!()
        };
        assert!(arrow.is_async);
        assert_eq!(
            &src[arrow.loc.start.offset..arrow.loc.end.offset],
            "async (x) => x"
        );
    }

    #[test]
    fn test_statement_spans_are_ordered_and_disjoint() {
        let program = p_clean("a;\nb;\nc;");
        let mut prev_end = 0;
        for item in &program.body {
            let ProgramItem::Stmt(s) = item else { panic!() };
            assert!(s.loc().start.offset >= prev_end);
            prev_end = s.loc().end.offset;
        }
    }

    // ── Literals ────────────────────────────────────────────────────────────

    #[test]
    fn test_literal_kinds() {
        let program = p_clean("null; true; 42; \"s\"; 7n; /re/gi;");
        assert!(matches!(expr_stmt(&program, 0), Expr::Null(_)));
        assert!(matches!(expr_stmt(&program, 1), Expr::Bool(b) if b.value));
        assert!(matches!(expr_stmt(&program, 2), Expr::Num(n) if n.value == 42.0));
        assert!(matches!(expr_stmt(&program, 3), Expr::Str(s) if s.value == "s"));
        assert!(matches!(expr_stmt(&program, 4), Expr::BigInt(b) if b.value == "7"));
        assert!(
            matches!(expr_stmt(&program, 5), Expr::Regexp(r) if r.pattern == "re" && r.flags == "gi")
        );
    }

    #[test]
    fn test_string_escapes_are_cooked() {
        let program = p_clean(r#"let s = "a\n\tA\x42\u{1F600}";"#);
        let Stmt::VarDecl(v) = stmt(&program, 0) else {
            panic!()
        };
        let Some(init) = &v.declarators[0].init else {
            panic!()
        };
        let Expr::Str(s) = &**init else { panic!() };
        assert_eq!(s.value, "a\n\tAB\u{1F600}");
    }

    #[test]
    fn test_conditional_expression() {
        let program = p_clean("a ? b : c ? d : e;");
        let Expr::Conditional(outer) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert!(matches!(&*outer.alternate, Expr::Conditional(_)));
    }

    #[test]
    fn test_conditional_with_leading_dot_number() {
        // `x?.5:y` is a conditional around `.5`, not an optional chain.
        let program = p_clean("x?.5:y;");
        let Expr::Conditional(cond) = expr_stmt(&program, 0) else {
            panic!("expected a conditional, got {:?}", expr_stmt(&program, 0));
        };
        assert!(matches!(&*cond.consequent, Expr::Num(n) if n.value == 0.5));
    }

    #[test]
    fn test_sequence_expression() {
        let program = p_clean("a, b, c;");
        let Expr::Sequence(seq) = expr_stmt(&program, 0) else {
            panic!()
        };
        assert_eq!(seq.expressions.len(), 3);
    }
}
