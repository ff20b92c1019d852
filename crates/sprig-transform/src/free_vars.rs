//! Free-variable analysis over an inline-task callback.
//!
//! The finder walks the callback expression with a live scope chain and
//! emits every identifier occurrence that (1) sits in a value position,
//! (2) is not bound by the callback or any scope nested in it, and (3) is
//! visible from the enclosing function. The chain's root scope is seeded
//! with the enclosing-visible name set, so the test for all three is simply
//! "the name resolves to the root scope".
//!
//! Value-position classification is positional: the walker only records
//! identifiers from positions the language evaluates as references. It never
//! descends into member-access property names, object-literal keys
//! (shorthand properties included, since rewriting `{ name }` would change
//! the key), declaration names, labels, or any type-level syntax, so those
//! can never be captured no matter what they are called.
//!
//! Output preserves encounter order and keeps duplicates; the rewriter
//! de-duplicates for the capture list but rewrites every occurrence.

use crate::scope::{ScopeChain, ScopeId};
use std::collections::HashSet;
use swc_ecma_ast as ast;

/// One value-position occurrence of a capturable outer name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeVar {
    pub name: String,
    /// File-local byte offset of the identifier start
    pub start: u32,
    /// File-local byte offset of the identifier end
    pub end: u32,
}

/// Result of walking one callback.
#[derive(Debug, Default)]
pub struct FreeVars {
    /// Capturable occurrences in encounter order, duplicates included
    pub occurrences: Vec<FreeVar>,
    /// Occurrences refused because the name collides with a reserved
    /// identifier
    pub reserved: Vec<FreeVar>,
}

/// Walk `callable` (an arrow or function expression) and collect free
/// variables against the enclosing-visible name set.
pub fn find(callable: &ast::Expr, visible: &HashSet<String>, span_base: u32) -> FreeVars {
    let mut finder = Finder {
        chain: ScopeChain::with_root(visible.iter().cloned()),
        span_base,
        out: FreeVars::default(),
    };

    match callable {
        ast::Expr::Arrow(arrow) => finder.walk_arrow(arrow, ScopeChain::ROOT),
        ast::Expr::Fn(func) => finder.walk_fn_expr(func, ScopeChain::ROOT),
        // Not a function-like callable; the rewriter filters these out
        // before calling us.
        _ => {}
    }

    finder.out
}

struct Finder {
    chain: ScopeChain,
    span_base: u32,
    out: FreeVars,
}

impl Finder {
    fn record(&mut self, ident: &ast::Ident, scope: ScopeId) {
        let name = ident.sym.as_ref();
        if self.chain.resolve(name, scope) != Some(ScopeChain::ROOT) {
            // Bound locally (shadowed) or a global like `console`.
            return;
        }

        let var = FreeVar {
            name: name.to_string(),
            start: ident.span.lo.0.saturating_sub(self.span_base),
            end: ident.span.hi.0.saturating_sub(self.span_base),
        };
        if crate::is_reserved_name(name) {
            self.out.reserved.push(var);
        } else {
            self.out.occurrences.push(var);
        }
    }

    // --- function-like entries -------------------------------------------

    fn walk_arrow(&mut self, arrow: &ast::ArrowExpr, parent: ScopeId) {
        let scope = self.chain.push(parent);
        for pat in &arrow.params {
            self.chain.declare_pattern(scope, pat);
        }
        for pat in &arrow.params {
            self.walk_pattern_defaults(pat, scope);
        }
        match &*arrow.body {
            ast::BlockStmtOrExpr::BlockStmt(block) => self.walk_stmts(&block.stmts, scope),
            ast::BlockStmtOrExpr::Expr(expr) => self.walk_expr(expr, scope),
        }
    }

    fn walk_fn_expr(&mut self, func: &ast::FnExpr, parent: ScopeId) {
        let scope = self.chain.push(parent);
        // A function expression's own name is only visible inside itself.
        if let Some(ident) = &func.ident {
            self.chain.declare(scope, ident.sym.to_string());
        }
        self.walk_function(&func.function, scope);
    }

    fn walk_function(&mut self, function: &ast::Function, scope: ScopeId) {
        for param in &function.params {
            self.chain.declare_pattern(scope, &param.pat);
        }
        for param in &function.params {
            self.walk_pattern_defaults(&param.pat, scope);
        }
        if let Some(body) = &function.body {
            self.walk_stmts(&body.stmts, scope);
        }
    }

    /// Default-value expressions inside binding patterns are value
    /// positions evaluated in the function's own scope.
    fn walk_pattern_defaults(&mut self, pat: &ast::Pat, scope: ScopeId) {
        match pat {
            ast::Pat::Assign(assign) => {
                self.walk_expr(&assign.right, scope);
                self.walk_pattern_defaults(&assign.left, scope);
            }
            ast::Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_pattern_defaults(elem, scope);
                }
            }
            ast::Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ast::ObjectPatProp::KeyValue(kv) => {
                            self.walk_pattern_defaults(&kv.value, scope)
                        }
                        ast::ObjectPatProp::Assign(assign) => {
                            if let Some(value) = &assign.value {
                                self.walk_expr(value, scope);
                            }
                        }
                        ast::ObjectPatProp::Rest(rest) => {
                            self.walk_pattern_defaults(&rest.arg, scope)
                        }
                    }
                }
            }
            ast::Pat::Rest(rest) => self.walk_pattern_defaults(&rest.arg, scope),
            ast::Pat::Ident(_) | ast::Pat::Invalid(_) | ast::Pat::Expr(_) => {}
        }
    }

    // --- statements -------------------------------------------------------

    fn walk_stmts(&mut self, stmts: &[ast::Stmt], scope: ScopeId) {
        for stmt in stmts {
            self.walk_stmt(stmt, scope);
        }
    }

    fn walk_stmt(&mut self, stmt: &ast::Stmt, scope: ScopeId) {
        match stmt {
            ast::Stmt::Block(block) => {
                let inner = self.chain.push(scope);
                self.walk_stmts(&block.stmts, inner);
            }
            ast::Stmt::Expr(expr_stmt) => self.walk_expr(&expr_stmt.expr, scope),
            ast::Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.walk_expr(arg, scope);
                }
            }
            ast::Stmt::Decl(decl) => self.walk_decl(decl, scope),
            ast::Stmt::If(if_stmt) => {
                self.walk_expr(&if_stmt.test, scope);
                self.walk_stmt(&if_stmt.cons, scope);
                if let Some(alt) = &if_stmt.alt {
                    self.walk_stmt(alt, scope);
                }
            }
            ast::Stmt::For(for_stmt) => {
                let loop_scope = self.chain.push(scope);
                if let Some(init) = &for_stmt.init {
                    match init {
                        ast::VarDeclOrExpr::VarDecl(var) => {
                            // Only lexical loop variables bind in the loop
                            // scope; `var` hoists out of it.
                            if var.kind != ast::VarDeclKind::Var {
                                for declarator in &var.decls {
                                    self.chain.declare_pattern(loop_scope, &declarator.name);
                                }
                            }
                            for declarator in &var.decls {
                                if let Some(init) = &declarator.init {
                                    self.walk_expr(init, loop_scope);
                                }
                            }
                        }
                        ast::VarDeclOrExpr::Expr(expr) => self.walk_expr(expr, loop_scope),
                    }
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expr(test, loop_scope);
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expr(update, loop_scope);
                }
                self.walk_stmt(&for_stmt.body, loop_scope);
            }
            ast::Stmt::ForIn(for_in) => {
                self.walk_for_head(&for_in.left, &for_in.right, &for_in.body, scope)
            }
            ast::Stmt::ForOf(for_of) => {
                self.walk_for_head(&for_of.left, &for_of.right, &for_of.body, scope)
            }
            ast::Stmt::While(while_stmt) => {
                self.walk_expr(&while_stmt.test, scope);
                self.walk_stmt(&while_stmt.body, scope);
            }
            ast::Stmt::DoWhile(do_while) => {
                self.walk_stmt(&do_while.body, scope);
                self.walk_expr(&do_while.test, scope);
            }
            ast::Stmt::Try(try_stmt) => {
                let block_scope = self.chain.push(scope);
                self.walk_stmts(&try_stmt.block.stmts, block_scope);
                if let Some(handler) = &try_stmt.handler {
                    let catch_scope = self.chain.push(scope);
                    if let Some(param) = &handler.param {
                        self.chain.declare_pattern(catch_scope, param);
                    }
                    self.walk_stmts(&handler.body.stmts, catch_scope);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    let final_scope = self.chain.push(scope);
                    self.walk_stmts(&finalizer.stmts, final_scope);
                }
            }
            ast::Stmt::Switch(switch) => {
                self.walk_expr(&switch.discriminant, scope);
                let case_scope = self.chain.push(scope);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.walk_expr(test, case_scope);
                    }
                    self.walk_stmts(&case.cons, case_scope);
                }
            }
            // Label identifiers are not value references.
            ast::Stmt::Labeled(labeled) => self.walk_stmt(&labeled.body, scope),
            ast::Stmt::Throw(throw) => self.walk_expr(&throw.arg, scope),
            ast::Stmt::With(with) => {
                self.walk_expr(&with.obj, scope);
                self.walk_stmt(&with.body, scope);
            }
            ast::Stmt::Break(_)
            | ast::Stmt::Continue(_)
            | ast::Stmt::Empty(_)
            | ast::Stmt::Debugger(_) => {}
        }
    }

    fn walk_for_head(
        &mut self,
        left: &ast::ForHead,
        right: &ast::Expr,
        body: &ast::Stmt,
        scope: ScopeId,
    ) {
        let loop_scope = self.chain.push(scope);
        match left {
            ast::ForHead::VarDecl(var) => {
                if var.kind != ast::VarDeclKind::Var {
                    for declarator in &var.decls {
                        self.chain.declare_pattern(loop_scope, &declarator.name);
                    }
                }
            }
            // `for (x of xs)` assigns into an existing binding; the
            // identifiers in the pattern are value references.
            ast::ForHead::Pat(pat) => self.walk_assigned_pattern(pat, loop_scope),
            ast::ForHead::UsingDecl(using) => {
                for declarator in &using.decls {
                    self.chain.declare_pattern(loop_scope, &declarator.name);
                }
            }
        }
        self.walk_expr(right, loop_scope);
        self.walk_stmt(body, loop_scope);
    }

    fn walk_decl(&mut self, decl: &ast::Decl, scope: ScopeId) {
        match decl {
            ast::Decl::Var(var) => {
                for declarator in &var.decls {
                    self.chain.declare_pattern(scope, &declarator.name);
                    self.walk_pattern_defaults(&declarator.name, scope);
                    if let Some(init) = &declarator.init {
                        self.walk_expr(init, scope);
                    }
                }
            }
            ast::Decl::Fn(decl) => {
                // A named declaration is visible in the scope that hosts it.
                self.chain.declare(scope, decl.ident.sym.to_string());
                let fn_scope = self.chain.push(scope);
                self.walk_function(&decl.function, fn_scope);
            }
            ast::Decl::Class(decl) => {
                self.chain.declare(scope, decl.ident.sym.to_string());
                self.walk_class(&decl.class, scope);
            }
            ast::Decl::Using(using) => {
                for declarator in &using.decls {
                    self.chain.declare_pattern(scope, &declarator.name);
                    if let Some(init) = &declarator.init {
                        self.walk_expr(init, scope);
                    }
                }
            }
            ast::Decl::TsEnum(ts_enum) => {
                self.chain.declare(scope, ts_enum.id.sym.to_string());
                for member in &ts_enum.members {
                    if let Some(init) = &member.init {
                        self.walk_expr(init, scope);
                    }
                }
            }
            // Pure type-level declarations never contain value references.
            ast::Decl::TsInterface(_) | ast::Decl::TsTypeAlias(_) | ast::Decl::TsModule(_) => {}
        }
    }

    // --- expressions ------------------------------------------------------

    fn walk_expr(&mut self, expr: &ast::Expr, scope: ScopeId) {
        match expr {
            ast::Expr::Ident(ident) => self.record(ident, scope),
            ast::Expr::Member(member) => self.walk_member(member, scope),
            ast::Expr::SuperProp(super_prop) => {
                if let ast::SuperProp::Computed(computed) = &super_prop.prop {
                    self.walk_expr(&computed.expr, scope);
                }
            }
            ast::Expr::Call(call) => {
                if let ast::Callee::Expr(callee) = &call.callee {
                    self.walk_expr(callee, scope);
                }
                for arg in &call.args {
                    self.walk_expr(&arg.expr, scope);
                }
            }
            ast::Expr::New(new) => {
                self.walk_expr(&new.callee, scope);
                for arg in new.args.iter().flatten() {
                    self.walk_expr(&arg.expr, scope);
                }
            }
            ast::Expr::OptChain(opt) => match &*opt.base {
                ast::OptChainBase::Member(member) => self.walk_member(member, scope),
                ast::OptChainBase::Call(call) => {
                    self.walk_expr(&call.callee, scope);
                    for arg in &call.args {
                        self.walk_expr(&arg.expr, scope);
                    }
                }
            },
            ast::Expr::Assign(assign) => {
                self.walk_assign_target(&assign.left, scope);
                self.walk_expr(&assign.right, scope);
            }
            ast::Expr::Update(update) => self.walk_expr(&update.arg, scope),
            ast::Expr::Unary(unary) => self.walk_expr(&unary.arg, scope),
            ast::Expr::Bin(bin) => {
                self.walk_expr(&bin.left, scope);
                self.walk_expr(&bin.right, scope);
            }
            ast::Expr::Cond(cond) => {
                self.walk_expr(&cond.test, scope);
                self.walk_expr(&cond.cons, scope);
                self.walk_expr(&cond.alt, scope);
            }
            ast::Expr::Seq(seq) => {
                for expr in &seq.exprs {
                    self.walk_expr(expr, scope);
                }
            }
            ast::Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_expr(&elem.expr, scope);
                }
            }
            ast::Expr::Object(object) => self.walk_object(object, scope),
            ast::Expr::Arrow(arrow) => self.walk_arrow(arrow, scope),
            ast::Expr::Fn(func) => self.walk_fn_expr(func, scope),
            ast::Expr::Class(class_expr) => {
                let class_scope = self.chain.push(scope);
                if let Some(ident) = &class_expr.ident {
                    self.chain.declare(class_scope, ident.sym.to_string());
                }
                self.walk_class(&class_expr.class, class_scope);
            }
            ast::Expr::Tpl(tpl) => {
                for expr in &tpl.exprs {
                    self.walk_expr(expr, scope);
                }
            }
            ast::Expr::TaggedTpl(tagged) => {
                self.walk_expr(&tagged.tag, scope);
                for expr in &tagged.tpl.exprs {
                    self.walk_expr(expr, scope);
                }
            }
            ast::Expr::Paren(paren) => self.walk_expr(&paren.expr, scope),
            ast::Expr::Await(await_expr) => self.walk_expr(&await_expr.arg, scope),
            ast::Expr::Yield(yield_expr) => {
                if let Some(arg) = &yield_expr.arg {
                    self.walk_expr(arg, scope);
                }
            }
            // Type-level wrappers: walk the value side, skip the types.
            ast::Expr::TsAs(ts_as) => self.walk_expr(&ts_as.expr, scope),
            ast::Expr::TsSatisfies(sat) => self.walk_expr(&sat.expr, scope),
            ast::Expr::TsNonNull(non_null) => self.walk_expr(&non_null.expr, scope),
            ast::Expr::TsConstAssertion(assertion) => self.walk_expr(&assertion.expr, scope),
            ast::Expr::TsTypeAssertion(assertion) => self.walk_expr(&assertion.expr, scope),
            ast::Expr::TsInstantiation(inst) => self.walk_expr(&inst.expr, scope),
            ast::Expr::JSXElement(element) => self.walk_jsx_element(element, scope),
            ast::Expr::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.walk_jsx_child(child, scope);
                }
            }
            ast::Expr::This(_)
            | ast::Expr::Lit(_)
            | ast::Expr::MetaProp(_)
            | ast::Expr::PrivateName(_)
            | ast::Expr::JSXMember(_)
            | ast::Expr::JSXNamespacedName(_)
            | ast::Expr::JSXEmpty(_)
            | ast::Expr::Invalid(_) => {}
        }
    }

    fn walk_member(&mut self, member: &ast::MemberExpr, scope: ScopeId) {
        self.walk_expr(&member.obj, scope);
        // Non-computed property names are not value references.
        if let ast::MemberProp::Computed(computed) = &member.prop {
            self.walk_expr(&computed.expr, scope);
        }
    }

    fn walk_object(&mut self, object: &ast::ObjectLit, scope: ScopeId) {
        for prop in &object.props {
            match prop {
                ast::PropOrSpread::Spread(spread) => self.walk_expr(&spread.expr, scope),
                ast::PropOrSpread::Prop(prop) => match &**prop {
                    // A shorthand property is a property name; rewriting it
                    // would change the key, so it is never captured.
                    ast::Prop::Shorthand(_) => {}
                    ast::Prop::KeyValue(kv) => {
                        self.walk_prop_name(&kv.key, scope);
                        self.walk_expr(&kv.value, scope);
                    }
                    ast::Prop::Assign(assign) => self.walk_expr(&assign.value, scope),
                    ast::Prop::Getter(getter) => {
                        self.walk_prop_name(&getter.key, scope);
                        let fn_scope = self.chain.push(scope);
                        if let Some(body) = &getter.body {
                            self.walk_stmts(&body.stmts, fn_scope);
                        }
                    }
                    ast::Prop::Setter(setter) => {
                        self.walk_prop_name(&setter.key, scope);
                        let fn_scope = self.chain.push(scope);
                        self.chain.declare_pattern(fn_scope, &setter.param);
                        if let Some(body) = &setter.body {
                            self.walk_stmts(&body.stmts, fn_scope);
                        }
                    }
                    ast::Prop::Method(method) => {
                        self.walk_prop_name(&method.key, scope);
                        let fn_scope = self.chain.push(scope);
                        self.walk_function(&method.function, fn_scope);
                    }
                },
            }
        }
    }

    fn walk_prop_name(&mut self, key: &ast::PropName, scope: ScopeId) {
        // Only computed keys evaluate an expression.
        if let ast::PropName::Computed(computed) = key {
            self.walk_expr(&computed.expr, scope);
        }
    }

    fn walk_assign_target(&mut self, target: &ast::AssignTarget, scope: ScopeId) {
        match target {
            ast::AssignTarget::Simple(simple) => match simple {
                ast::SimpleAssignTarget::Ident(binding) => self.record(&binding.id, scope),
                ast::SimpleAssignTarget::Member(member) => self.walk_member(member, scope),
                ast::SimpleAssignTarget::Paren(paren) => self.walk_expr(&paren.expr, scope),
                ast::SimpleAssignTarget::OptChain(opt) => {
                    if let ast::OptChainBase::Member(member) = &*opt.base {
                        self.walk_member(member, scope);
                    }
                }
                _ => {}
            },
            ast::AssignTarget::Pat(pat) => match pat {
                ast::AssignTargetPat::Array(array) => {
                    for elem in array.elems.iter().flatten() {
                        self.walk_assigned_pattern(elem, scope);
                    }
                }
                ast::AssignTargetPat::Object(object) => {
                    for prop in &object.props {
                        match prop {
                            ast::ObjectPatProp::KeyValue(kv) => {
                                self.walk_assigned_pattern(&kv.value, scope)
                            }
                            ast::ObjectPatProp::Assign(assign) => {
                                self.record(&assign.key.id, scope);
                                if let Some(value) = &assign.value {
                                    self.walk_expr(value, scope);
                                }
                            }
                            ast::ObjectPatProp::Rest(rest) => {
                                self.walk_assigned_pattern(&rest.arg, scope)
                            }
                        }
                    }
                }
                ast::AssignTargetPat::Invalid(_) => {}
            },
        }
    }

    /// A pattern in assignment position: its leaf identifiers write into
    /// existing bindings, which makes them value references.
    fn walk_assigned_pattern(&mut self, pat: &ast::Pat, scope: ScopeId) {
        match pat {
            ast::Pat::Ident(binding) => self.record(&binding.id, scope),
            ast::Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_assigned_pattern(elem, scope);
                }
            }
            ast::Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ast::ObjectPatProp::KeyValue(kv) => {
                            self.walk_assigned_pattern(&kv.value, scope)
                        }
                        ast::ObjectPatProp::Assign(assign) => {
                            self.record(&assign.key.id, scope);
                            if let Some(value) = &assign.value {
                                self.walk_expr(value, scope);
                            }
                        }
                        ast::ObjectPatProp::Rest(rest) => {
                            self.walk_assigned_pattern(&rest.arg, scope)
                        }
                    }
                }
            }
            ast::Pat::Assign(assign) => {
                self.walk_assigned_pattern(&assign.left, scope);
                self.walk_expr(&assign.right, scope);
            }
            ast::Pat::Rest(rest) => self.walk_assigned_pattern(&rest.arg, scope),
            ast::Pat::Expr(expr) => self.walk_expr(expr, scope),
            ast::Pat::Invalid(_) => {}
        }
    }

    fn walk_class(&mut self, class: &ast::Class, scope: ScopeId) {
        if let Some(super_class) = &class.super_class {
            self.walk_expr(super_class, scope);
        }
        for member in &class.body {
            match member {
                ast::ClassMember::Method(method) => {
                    self.walk_prop_name(&method.key, scope);
                    let fn_scope = self.chain.push(scope);
                    self.walk_function(&method.function, fn_scope);
                }
                ast::ClassMember::PrivateMethod(method) => {
                    let fn_scope = self.chain.push(scope);
                    self.walk_function(&method.function, fn_scope);
                }
                ast::ClassMember::Constructor(ctor) => {
                    let fn_scope = self.chain.push(scope);
                    for param in &ctor.params {
                        match param {
                            ast::ParamOrTsParamProp::Param(param) => {
                                self.chain.declare_pattern(fn_scope, &param.pat);
                                self.walk_pattern_defaults(&param.pat, fn_scope);
                            }
                            ast::ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                                ast::TsParamPropParam::Ident(binding) => {
                                    self.chain.declare(fn_scope, binding.id.sym.to_string())
                                }
                                ast::TsParamPropParam::Assign(assign) => {
                                    self.chain.declare_pattern(fn_scope, &assign.left);
                                    self.walk_expr(&assign.right, fn_scope);
                                }
                            },
                        }
                    }
                    if let Some(body) = &ctor.body {
                        self.walk_stmts(&body.stmts, fn_scope);
                    }
                }
                ast::ClassMember::ClassProp(prop) => {
                    self.walk_prop_name(&prop.key, scope);
                    if let Some(value) = &prop.value {
                        self.walk_expr(value, scope);
                    }
                }
                ast::ClassMember::PrivateProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.walk_expr(value, scope);
                    }
                }
                ast::ClassMember::StaticBlock(block) => {
                    let block_scope = self.chain.push(scope);
                    self.walk_stmts(&block.body.stmts, block_scope);
                }
                ast::ClassMember::TsIndexSignature(_)
                | ast::ClassMember::AutoAccessor(_)
                | ast::ClassMember::Empty(_) => {}
            }
        }
    }

    fn walk_jsx_element(&mut self, element: &ast::JSXElement, scope: ScopeId) {
        self.walk_jsx_name(&element.opening.name, scope);
        for attr in &element.opening.attrs {
            match attr {
                ast::JSXAttrOrSpread::SpreadElement(spread) => {
                    self.walk_expr(&spread.expr, scope)
                }
                ast::JSXAttrOrSpread::JSXAttr(attr) => {
                    // Attribute names are never value references.
                    if let Some(value) = &attr.value {
                        self.walk_jsx_attr_value(value, scope);
                    }
                }
            }
        }
        for child in &element.children {
            self.walk_jsx_child(child, scope);
        }
    }

    fn walk_jsx_name(&mut self, name: &ast::JSXElementName, scope: ScopeId) {
        match name {
            ast::JSXElementName::Ident(ident) => self.record(ident, scope),
            ast::JSXElementName::JSXMemberExpr(member) => {
                let mut obj = &member.obj;
                loop {
                    match obj {
                        ast::JSXObject::Ident(ident) => {
                            self.record(ident, scope);
                            break;
                        }
                        ast::JSXObject::JSXMemberExpr(inner) => obj = &inner.obj,
                    }
                }
            }
            ast::JSXElementName::JSXNamespacedName(_) => {}
        }
    }

    fn walk_jsx_attr_value(&mut self, value: &ast::JSXAttrValue, scope: ScopeId) {
        match value {
            ast::JSXAttrValue::JSXExprContainer(container) => {
                if let ast::JSXExpr::Expr(expr) = &container.expr {
                    self.walk_expr(expr, scope);
                }
            }
            ast::JSXAttrValue::JSXElement(element) => self.walk_jsx_element(element, scope),
            ast::JSXAttrValue::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.walk_jsx_child(child, scope);
                }
            }
            ast::JSXAttrValue::Lit(_) => {}
        }
    }

    fn walk_jsx_child(&mut self, child: &ast::JSXElementChild, scope: ScopeId) {
        match child {
            ast::JSXElementChild::JSXExprContainer(container) => {
                if let ast::JSXExpr::Expr(expr) = &container.expr {
                    self.walk_expr(expr, scope);
                }
            }
            ast::JSXElementChild::JSXSpreadChild(spread) => self.walk_expr(&spread.expr, scope),
            ast::JSXElementChild::JSXElement(element) => self.walk_jsx_element(element, scope),
            ast::JSXElementChild::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.walk_jsx_child(child, scope);
                }
            }
            ast::JSXElementChild::JSXText(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_diagnostics::SourceCache;
    use sprig_parser::{parse_source, ScriptKind};

    /// Parse `source` as a module whose first statement is an expression
    /// statement holding the callback, then run the finder against
    /// `visible`.
    fn free_names(source: &str, visible: &[&str]) -> Vec<String> {
        let mut cache = SourceCache::new();
        let result = parse_source(source, "cb.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        let expr = match &result.module.body[0] {
            ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt)) => &stmt.expr,
            _ => panic!("expected expression statement"),
        };
        let visible: HashSet<String> = visible.iter().map(|s| s.to_string()).collect();
        find(expr, &visible, result.span_base)
            .occurrences
            .into_iter()
            .map(|v| v.name)
            .collect()
    }

    #[test]
    fn test_simple_capture() {
        let names = free_names("() => { console.log(x); };", &["x"]);
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_globals_are_not_captured() {
        let names = free_names("() => { console.log(x); };", &["x", "y"]);
        // `console` is not in the visible set, `y` is never referenced.
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_block_shadowing() {
        let names = free_names(
            "() => { { const x = 'inner'; use(x); } use(x); };",
            &["x"],
        );
        // Only the occurrence after the block refers to the outer binding.
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_loop_shadowing() {
        let names = free_names("() => { for (let i = 0; i < 10; i++) use(i); };", &["i"]);
        assert!(names.is_empty());
    }

    #[test]
    fn test_catch_binding_shadows() {
        let names = free_names("() => { try { go(); } catch (e) { use(e); } };", &["e"]);
        assert!(names.is_empty());
    }

    #[test]
    fn test_nested_function_parameters_shadow() {
        let names = free_names("() => { items.forEach((x) => use(x)); use(x); };", &["x", "items"]);
        assert_eq!(names, vec!["items", "x"]);
    }

    #[test]
    fn test_member_property_names_are_skipped() {
        let names = free_names("() => { use(obj.x); };", &["x", "obj"]);
        assert_eq!(names, vec!["obj"]);
    }

    #[test]
    fn test_shorthand_properties_are_skipped() {
        let names = free_names("() => { use({ x }); };", &["x"]);
        assert!(names.is_empty());
    }

    #[test]
    fn test_object_keys_are_skipped_values_walked() {
        let names = free_names("() => { use({ x: y }); };", &["x", "y"]);
        assert_eq!(names, vec!["y"]);
    }

    #[test]
    fn test_labels_are_skipped() {
        let names = free_names(
            "() => { x: for (;;) { break x; } use(x); };",
            &["x"],
        );
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_duplicates_preserved_in_encounter_order() {
        let names = free_names("() => { use(a, b, a); };", &["a", "b"]);
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_assignment_target_is_a_reference() {
        let names = free_names("() => { x = 1; };", &["x"]);
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_var_statement_binds_current_scope() {
        let names = free_names("() => { var x = 1; use(x); };", &["x"]);
        assert!(names.is_empty());
    }

    #[test]
    fn test_function_declaration_name_binds_outer() {
        let names = free_names("() => { function x() {} use(x); };", &["x"]);
        assert!(names.is_empty());
    }

    #[test]
    fn test_reserved_names_are_refused() {
        let mut cache = SourceCache::new();
        let source = "() => { use(__scope); };";
        let result = parse_source(source, "cb.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        let expr = match &result.module.body[0] {
            ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt)) => &stmt.expr,
            _ => unreachable!(),
        };
        let visible: HashSet<String> = ["__scope".to_string()].into_iter().collect();
        let found = find(expr, &visible, result.span_base);
        assert!(found.occurrences.is_empty());
        assert_eq!(found.reserved.len(), 1);
    }
}
