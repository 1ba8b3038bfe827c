//! AST traversal with cooperative cancellation.
//!
//! [`visit`] walks a parsed [`Program`] in source order, giving a
//! [`Visitor`] a pre-order [`Visitor::enter`] call (which decides whether to
//! descend) and a post-order [`Visitor::exit`] call for every node it
//! entered.  The enter/exit pairing is balanced even when traversal is
//! cancelled mid-walk, so stateful visitors that maintain a scope stack (a
//! symbol-tree builder, an outline builder) never leak an unclosed scope.
//!
//! Cancellation is cooperative and per-node: the [`CancelToken`] is checked
//! before entering each node, and once it fires the walk unwinds — every
//! node already entered receives its exit call, and no further siblings or
//! descendants are visited.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::parser::ast::*;
use crate::parser::scanner::Span;

// ─────────────────────────────────────────────────────────────────────────────
// CancelToken
// ─────────────────────────────────────────────────────────────────────────────

/// A shareable cancellation flag for [`visit`].
///
/// Clones share the flag, so a UI thread can hand a clone to a worker and
/// cancel an in-flight traversal from outside.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.  Takes effect before the next node is entered.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `true` once [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NodeRef / Visitor
// ─────────────────────────────────────────────────────────────────────────────

/// A borrowed reference to any node the traversal reports.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// The program root.
    Program(&'a Program),
    /// A statement.
    Stmt(&'a Stmt),
    /// A module-level `import`/`export` declaration.
    ModuleDecl(&'a ModuleDecl),
    /// An expression.
    Expr(&'a Expr),
    /// A binding/assignment pattern.
    Pat(&'a Pat),
}

impl NodeRef<'_> {
    /// The source location of the referenced node.
    pub fn loc(&self) -> Span {
        match self {
            NodeRef::Program(p) => p.loc,
            NodeRef::Stmt(s) => s.loc(),
            NodeRef::ModuleDecl(d) => d.loc(),
            NodeRef::Expr(e) => e.loc(),
            NodeRef::Pat(p) => p.loc(),
        }
    }
}

/// Callbacks for [`visit`].
pub trait Visitor {
    /// Called before a node's children.  Return `false` to skip the
    /// children; [`Visitor::exit`] still fires for this node.
    fn enter(&mut self, node: NodeRef<'_>) -> bool;

    /// Called after a node's children (or immediately after `enter` when
    /// descent was declined or cancellation fired).
    fn exit(&mut self, node: NodeRef<'_>);
}

/// Walk `program` in source order.
///
/// Returns `false` when the traversal was cut short by `cancel`.
pub fn visit<V: Visitor + ?Sized>(program: &Program, visitor: &mut V, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let node = NodeRef::Program(program);
    let mut alive = true;
    if visitor.enter(node) {
        for item in &program.body {
            let ok = match item {
                ProgramItem::Stmt(s) => walk_stmt(s, visitor, cancel),
                ProgramItem::ModuleDecl(d) => walk_module_decl(d, visitor, cancel),
            };
            if !ok {
                alive = false;
                break;
            }
        }
    }
    visitor.exit(node);
    alive && !cancel.is_cancelled()
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk: statements
// ─────────────────────────────────────────────────────────────────────────────

fn walk_stmt<V: Visitor + ?Sized>(stmt: &Stmt, v: &mut V, c: &CancelToken) -> bool {
    if c.is_cancelled() {
        return false;
    }
    let node = NodeRef::Stmt(stmt);
    let mut alive = true;
    if v.enter(node) {
        alive = walk_stmt_children(stmt, v, c);
    }
    v.exit(node);
    alive && !c.is_cancelled()
}

fn walk_stmt_children<V: Visitor + ?Sized>(stmt: &Stmt, v: &mut V, c: &CancelToken) -> bool {
    match stmt {
        Stmt::Block(b) => walk_stmts(&b.body, v, c),
        Stmt::VarDecl(d) => walk_var_decl(d, v, c),
        Stmt::FnDecl(f) => walk_fn_parts(&f.params, &f.body, v, c),
        Stmt::ClassDecl(cl) => walk_class_parts(cl.super_class.as_deref(), &cl.body, v, c),
        Stmt::Expr(e) => walk_expr(&e.expr, v, c),
        Stmt::If(i) => {
            walk_expr(&i.test, v, c)
                && walk_stmt(&i.consequent, v, c)
                && i.alternate.as_deref().is_none_or(|alt| walk_stmt(alt, v, c))
        }
        Stmt::For(f) => {
            let init_ok = match &f.init {
                Some(ForInit::VarDecl(d)) => walk_var_decl(d, v, c),
                Some(ForInit::Expr(e)) => walk_expr(e, v, c),
                None => true,
            };
            init_ok
                && f.test.as_deref().is_none_or(|e| walk_expr(e, v, c))
                && f.update.as_deref().is_none_or(|e| walk_expr(e, v, c))
                && walk_stmt(&f.body, v, c)
        }
        Stmt::ForIn(f) => {
            walk_for_left(&f.left, v, c) && walk_expr(&f.right, v, c) && walk_stmt(&f.body, v, c)
        }
        Stmt::ForOf(f) => {
            walk_for_left(&f.left, v, c) && walk_expr(&f.right, v, c) && walk_stmt(&f.body, v, c)
        }
        Stmt::While(w) => walk_expr(&w.test, v, c) && walk_stmt(&w.body, v, c),
        Stmt::DoWhile(w) => walk_stmt(&w.body, v, c) && walk_expr(&w.test, v, c),
        Stmt::Switch(s) => {
            walk_expr(&s.discriminant, v, c)
                && s.cases.iter().all(|case| {
                    case.test.as_ref().is_none_or(|t| walk_expr(t, v, c))
                        && walk_stmts(&case.consequent, v, c)
                })
        }
        Stmt::Try(t) => {
            walk_stmts(&t.block.body, v, c)
                && t.handler.as_ref().is_none_or(|h| {
                    h.param.as_ref().is_none_or(|p| walk_pat(p, v, c))
                        && walk_stmts(&h.body.body, v, c)
                })
                && t.finalizer
                    .as_ref()
                    .is_none_or(|f| walk_stmts(&f.body, v, c))
        }
        Stmt::Return(r) => r.argument.as_deref().is_none_or(|e| walk_expr(e, v, c)),
        Stmt::Throw(t) => walk_expr(&t.argument, v, c),
        Stmt::Labeled(l) => walk_stmt(&l.body, v, c),
        Stmt::With(w) => walk_expr(&w.object, v, c) && walk_stmt(&w.body, v, c),
        Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Debugger(_)
        | Stmt::Empty(_)
        | Stmt::Error(_) => true,
    }
}

fn walk_stmts<V: Visitor + ?Sized>(stmts: &[Stmt], v: &mut V, c: &CancelToken) -> bool {
    stmts.iter().all(|s| walk_stmt(s, v, c))
}

fn walk_var_decl<V: Visitor + ?Sized>(decl: &VarDecl, v: &mut V, c: &CancelToken) -> bool {
    decl.declarators.iter().all(|d| {
        walk_pat(&d.id, v, c) && d.init.as_deref().is_none_or(|e| walk_expr(e, v, c))
    })
}

fn walk_for_left<V: Visitor + ?Sized>(left: &ForInOfLeft, v: &mut V, c: &CancelToken) -> bool {
    match left {
        ForInOfLeft::VarDecl(d) => walk_var_decl(d, v, c),
        ForInOfLeft::Pat(p) => walk_pat(p, v, c),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk: module declarations
// ─────────────────────────────────────────────────────────────────────────────

fn walk_module_decl<V: Visitor + ?Sized>(decl: &ModuleDecl, v: &mut V, c: &CancelToken) -> bool {
    if c.is_cancelled() {
        return false;
    }
    let node = NodeRef::ModuleDecl(decl);
    let mut alive = true;
    if v.enter(node) {
        alive = match decl {
            ModuleDecl::Import(_) | ModuleDecl::ExportAll(_) => true,
            ModuleDecl::ExportNamed(e) => e
                .declaration
                .as_deref()
                .is_none_or(|s| walk_stmt(s, v, c)),
            ModuleDecl::ExportDefault(e) => match &e.declaration {
                ExportDefaultExpr::Fn(f) => walk_fn_parts(&f.params, &f.body, v, c),
                ExportDefaultExpr::Class(cl) => {
                    walk_class_parts(cl.super_class.as_deref(), &cl.body, v, c)
                }
                ExportDefaultExpr::Expr(x) => walk_expr(x, v, c),
            },
        };
    }
    v.exit(node);
    alive && !c.is_cancelled()
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk: expressions
// ─────────────────────────────────────────────────────────────────────────────

fn walk_expr<V: Visitor + ?Sized>(expr: &Expr, v: &mut V, c: &CancelToken) -> bool {
    if c.is_cancelled() {
        return false;
    }
    let node = NodeRef::Expr(expr);
    let mut alive = true;
    if v.enter(node) {
        alive = walk_expr_children(expr, v, c);
    }
    v.exit(node);
    alive && !c.is_cancelled()
}

fn walk_expr_children<V: Visitor + ?Sized>(expr: &Expr, v: &mut V, c: &CancelToken) -> bool {
    match expr {
        Expr::Template(t) => t.expressions.iter().all(|e| walk_expr(e, v, c)),
        Expr::Array(a) => a
            .elements
            .iter()
            .flatten()
            .all(|e| walk_expr(e, v, c)),
        Expr::Object(o) => o.properties.iter().all(|p| walk_object_prop(p, v, c)),
        Expr::Fn(f) => walk_fn_parts(&f.params, &f.body, v, c),
        Expr::Arrow(a) => {
            walk_params(&a.params, v, c)
                && match &a.body {
                    ArrowBody::Block(b) => walk_stmts(&b.body, v, c),
                    ArrowBody::Expr(e) => walk_expr(e, v, c),
                }
        }
        Expr::Class(cl) => walk_class_parts(cl.super_class.as_deref(), &cl.body, v, c),
        Expr::Unary(u) => walk_expr(&u.argument, v, c),
        Expr::Update(u) => walk_expr(&u.argument, v, c),
        Expr::Binary(b) => walk_expr(&b.left, v, c) && walk_expr(&b.right, v, c),
        Expr::Logical(l) => walk_expr(&l.left, v, c) && walk_expr(&l.right, v, c),
        Expr::Conditional(t) => {
            walk_expr(&t.test, v, c)
                && walk_expr(&t.consequent, v, c)
                && walk_expr(&t.alternate, v, c)
        }
        Expr::Assign(a) => {
            let left_ok = match &a.left {
                AssignTarget::Expr(e) => walk_expr(e, v, c),
                AssignTarget::Pat(p) => walk_pat(p, v, c),
            };
            left_ok && walk_expr(&a.right, v, c)
        }
        Expr::Sequence(s) => s.expressions.iter().all(|e| walk_expr(e, v, c)),
        Expr::Member(m) => walk_expr(&m.object, v, c) && walk_member_prop(&m.property, v, c),
        Expr::OptionalMember(m) => {
            walk_expr(&m.object, v, c) && walk_member_prop(&m.property, v, c)
        }
        Expr::Call(call) => {
            walk_expr(&call.callee, v, c) && call.arguments.iter().all(|a| walk_expr(a, v, c))
        }
        Expr::OptionalCall(call) => {
            walk_expr(&call.callee, v, c) && call.arguments.iter().all(|a| walk_expr(a, v, c))
        }
        Expr::New(n) => {
            walk_expr(&n.callee, v, c) && n.arguments.iter().all(|a| walk_expr(a, v, c))
        }
        Expr::TaggedTemplate(t) => {
            walk_expr(&t.tag, v, c) && t.quasi.expressions.iter().all(|e| walk_expr(e, v, c))
        }
        Expr::Spread(s) => walk_expr(&s.argument, v, c),
        Expr::Yield(y) => y.argument.as_deref().is_none_or(|e| walk_expr(e, v, c)),
        Expr::Await(a) => walk_expr(&a.argument, v, c),
        Expr::Import(i) => {
            walk_expr(&i.source, v, c)
                && i.options.as_deref().is_none_or(|o| walk_expr(o, v, c))
        }
        Expr::Markup(m) => walk_markup(m, v, c),
        Expr::Null(_)
        | Expr::Bool(_)
        | Expr::Num(_)
        | Expr::Str(_)
        | Expr::BigInt(_)
        | Expr::Regexp(_)
        | Expr::Ident(_)
        | Expr::This(_)
        | Expr::MetaProp(_)
        | Expr::Error(_) => true,
    }
}

fn walk_object_prop<V: Visitor + ?Sized>(prop: &ObjectProp, v: &mut V, c: &CancelToken) -> bool {
    match prop {
        ObjectProp::Spread(s) => walk_expr(&s.argument, v, c),
        ObjectProp::Prop(p) => {
            walk_prop_key(&p.key, v, c)
                && match &p.value {
                    PropValue::Value(e) => walk_expr(e, v, c),
                    PropValue::Shorthand => true,
                    PropValue::Get(f) | PropValue::Set(f) | PropValue::Method(f) => {
                        walk_fn_parts(&f.params, &f.body, v, c)
                    }
                }
        }
    }
}

fn walk_prop_key<V: Visitor + ?Sized>(key: &PropKey, v: &mut V, c: &CancelToken) -> bool {
    match key {
        PropKey::Computed(e) => walk_expr(e, v, c),
        _ => true,
    }
}

fn walk_member_prop<V: Visitor + ?Sized>(prop: &MemberProp, v: &mut V, c: &CancelToken) -> bool {
    match prop {
        MemberProp::Computed(e) => walk_expr(e, v, c),
        _ => true,
    }
}

fn walk_markup<V: Visitor + ?Sized>(el: &MarkupElement, v: &mut V, c: &CancelToken) -> bool {
    el.attributes.iter().all(|attr| match &attr.value {
        Some(MarkupAttrValue::Expr(e)) => walk_expr(e, v, c),
        _ => true,
    }) && el.children.iter().all(|child| match child {
        MarkupChild::Element(nested) => walk_markup(nested, v, c),
        MarkupChild::Expr(e) => walk_expr(e, v, c),
        MarkupChild::Text(_) => true,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk: patterns
// ─────────────────────────────────────────────────────────────────────────────

fn walk_pat<V: Visitor + ?Sized>(pat: &Pat, v: &mut V, c: &CancelToken) -> bool {
    if c.is_cancelled() {
        return false;
    }
    let node = NodeRef::Pat(pat);
    let mut alive = true;
    if v.enter(node) {
        alive = match pat {
            Pat::Ident(_) => true,
            Pat::Array(a) => a.elements.iter().flatten().all(|p| walk_pat(p, v, c)),
            Pat::Object(o) => o.properties.iter().all(|p| match p {
                ObjectPatProp::KeyValue(kv) => {
                    walk_prop_key(&kv.key, v, c) && walk_pat(&kv.value, v, c)
                }
                ObjectPatProp::Assign(a) => {
                    a.value.as_deref().is_none_or(|e| walk_expr(e, v, c))
                }
                ObjectPatProp::Rest(r) => walk_pat(&r.argument, v, c),
            }),
            Pat::Rest(r) => walk_pat(&r.argument, v, c),
            Pat::Assign(a) => walk_pat(&a.left, v, c) && walk_expr(&a.right, v, c),
        };
    }
    v.exit(node);
    alive && !c.is_cancelled()
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk: shared function / class parts
// ─────────────────────────────────────────────────────────────────────────────

fn walk_params<V: Visitor + ?Sized>(params: &[Param], v: &mut V, c: &CancelToken) -> bool {
    params.iter().all(|p| {
        walk_pat(&p.pat, v, c) && p.default.as_ref().is_none_or(|d| walk_expr(d, v, c))
    })
}

fn walk_fn_parts<V: Visitor + ?Sized>(
    params: &[Param],
    body: &BlockStmt,
    v: &mut V,
    c: &CancelToken,
) -> bool {
    walk_params(params, v, c) && walk_stmts(&body.body, v, c)
}

fn walk_class_parts<V: Visitor + ?Sized>(
    super_class: Option<&Expr>,
    body: &ClassBody,
    v: &mut V,
    c: &CancelToken,
) -> bool {
    super_class.is_none_or(|e| walk_expr(e, v, c))
        && body.body.iter().all(|member| match member {
            ClassMember::Method(m) => {
                walk_prop_key(&m.key, v, c)
                    && walk_fn_parts(&m.value.params, &m.value.body, v, c)
            }
            ClassMember::Property(p) => {
                walk_prop_key(&p.key, v, c)
                    && p.value.as_deref().is_none_or(|e| walk_expr(e, v, c))
            }
            ClassMember::StaticBlock(b) => walk_stmts(&b.body, v, c),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
