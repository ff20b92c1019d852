//! Call-site detection and rewriting.
//!
//! The rewriter walks a whole module looking for `useInlineTask` calls while
//! tracking the stack of enclosing functions. Each eligible call produces a
//! handful of localised edits: the scope parameter is written into the
//! callback's empty parameter list, every captured reference becomes a
//! property access on it, the capture object is appended as a second
//! argument, and expression-statement calls are bound to a fresh name that
//! is later spliced into every return expression of the enclosing function.
//!
//! Only function declarations, function expressions, and arrow functions
//! count as enclosing functions; class and object methods are transparent
//! and a call inside one attaches to the nearest qualifying ancestor.

use crate::collect::{visible_names, EnclosingFn};
use crate::edits::EditBuffer;
use crate::free_vars;
use crate::{HOOK_NAME, SCOPE_PARAM, TASK_PREFIX};
use sprig_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, FileId, Span};
use swc_common::Spanned;
use swc_ecma_ast as ast;

/// One detected hook call site.
#[derive(Debug, Clone)]
pub struct InlineTaskCall {
    /// File-local span of the whole call
    pub span: Span,
    /// Number of arguments at the call site
    pub arg_count: usize,
    /// Formal parameter count of the callable argument; `None` when the
    /// first argument is not a function-like expression
    pub param_count: Option<usize>,
    /// Whether the call's parent is an expression statement
    pub is_stmt: bool,
    /// Capture names attached to the call, first-occurrence order
    pub captures: Vec<String>,
}

struct Frame<'a> {
    func: EnclosingFn<'a>,
    /// Fresh binding names allocated for calls inside this function, in
    /// encounter order
    bindings: Vec<String>,
}

/// Module walker that accumulates edits and diagnostics.
pub struct Rewriter<'a> {
    source: &'a str,
    span_base: u32,
    file_id: FileId,
    pub edits: EditBuffer,
    pub diagnostics: Diagnostics,
    /// Every detected hook call, for reporting
    pub calls: Vec<InlineTaskCall>,
    next_binding: usize,
    frames: Vec<Frame<'a>>,
}

impl<'a> Rewriter<'a> {
    pub fn new(source: &'a str, span_base: u32, file_id: FileId) -> Self {
        Self {
            source,
            span_base,
            file_id,
            edits: EditBuffer::new(),
            diagnostics: Diagnostics::new(),
            calls: Vec::new(),
            next_binding: 0,
            frames: Vec::new(),
        }
    }

    fn local(&self, span: swc_common::Span) -> (u32, u32) {
        (
            span.lo.0.saturating_sub(self.span_base),
            span.hi.0.saturating_sub(self.span_base),
        )
    }

    fn local_span(&self, span: swc_common::Span) -> Span {
        let (lo, hi) = self.local(span);
        Span::new(self.file_id, lo, hi)
    }

    pub fn rewrite_module(&mut self, module: &'a ast::Module) {
        for item in &module.body {
            match item {
                ast::ModuleItem::Stmt(stmt) => self.visit_stmt(stmt),
                ast::ModuleItem::ModuleDecl(decl) => self.visit_module_decl(decl),
            }
        }
        debug_assert!(self.frames.is_empty(), "unbalanced function frames");
    }

    // --- frames -----------------------------------------------------------

    fn enter_frame(&mut self, func: EnclosingFn<'a>) {
        self.frames.push(Frame {
            func,
            bindings: Vec::new(),
        });
    }

    /// Pop the current frame and splice its fresh bindings into every
    /// return expression.
    fn exit_frame(&mut self) {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return,
        };
        if frame.bindings.is_empty() {
            return;
        }

        let refs: String = frame
            .bindings
            .iter()
            .map(|name| format!("{{{}}}", name))
            .collect();

        let mut returns: Vec<&'a ast::Expr> = Vec::new();
        if let Some(expr) = frame.func.expr_body() {
            returns.push(expr);
        }
        if let Some(stmts) = frame.func.body_stmts() {
            collect_returns(stmts, &mut returns);
        }

        for ret in returns {
            let expr = strip_parens(ret);
            match expr {
                ast::Expr::JSXFragment(fragment) => {
                    // Append the slots right before the closing `</>`.
                    let (close_lo, _) = self.local(fragment.closing.span);
                    self.edits.insert(close_lo, refs.clone());
                }
                _ => {
                    if matches!(expr, ast::Expr::Lit(_)) {
                        self.diagnostics.push(
                            Diagnostic::hint(
                                DiagnosticCode::NonElementReturn,
                                "return value wrapped in a fragment will render as text",
                            )
                            .with_span(self.local_span(expr.span()))
                            .build(),
                        );
                    }
                    let (lo, hi) = self.local(expr.span());
                    self.edits.insert(lo, "<>");
                    self.edits.insert(hi, format!("{}</>", refs));
                }
            }
        }
    }

    // --- call handling ----------------------------------------------------

    fn is_hook_call(&self, call: &ast::CallExpr) -> bool {
        match &call.callee {
            ast::Callee::Expr(callee) => {
                matches!(&**callee, ast::Expr::Ident(ident) if ident.sym.as_ref() == HOOK_NAME)
            }
            _ => false,
        }
    }

    fn visit_call(&mut self, call: &'a ast::CallExpr, is_stmt: bool) {
        if !self.is_hook_call(call) {
            if let ast::Callee::Expr(callee) = &call.callee {
                self.visit_expr(callee);
            }
            for arg in &call.args {
                self.visit_expr(&arg.expr);
            }
            return;
        }
        self.process_hook_call(call, is_stmt);
    }

    fn process_hook_call(&mut self, call: &'a ast::CallExpr, is_stmt: bool) {
        let (call_lo, call_hi) = self.local(call.span);
        let call_span = Span::new(self.file_id, call_lo, call_hi);

        let callable = match call.args.first() {
            Some(arg) if arg.spread.is_none() => &arg.expr,
            _ => {
                self.diagnostics.push(
                    Diagnostic::hint(
                        DiagnosticCode::IneligibleCall,
                        "inline task needs a function expression as its first argument",
                    )
                    .with_span(call_span)
                    .build(),
                );
                self.calls.push(InlineTaskCall {
                    span: call_span,
                    arg_count: call.args.len(),
                    param_count: None,
                    is_stmt,
                    captures: Vec::new(),
                });
                for arg in &call.args {
                    self.visit_expr(&arg.expr);
                }
                return;
            }
        };

        let param_count = match &**callable {
            ast::Expr::Arrow(arrow) => Some(arrow.params.len()),
            ast::Expr::Fn(func) => Some(func.function.params.len()),
            _ => None,
        };

        let mut record = InlineTaskCall {
            span: call_span,
            arg_count: call.args.len(),
            param_count,
            is_stmt,
            captures: Vec::new(),
        };

        let Some(param_count) = param_count else {
            // Not a match; leave the call alone but keep looking inside it.
            self.diagnostics.push(
                Diagnostic::hint(
                    DiagnosticCode::IneligibleCall,
                    "inline task callable is not an arrow or function expression",
                )
                .with_span(call_span)
                .build(),
            );
            self.calls.push(record);
            for arg in &call.args {
                self.visit_expr(&arg.expr);
            }
            return;
        };

        let auto_capture = call.args.len() == 1;

        if auto_capture && param_count > 0 {
            // Overwriting a non-empty parameter span would destroy user
            // parameters; the zero-parameter gate avoids that entirely.
            self.diagnostics.push(
                Diagnostic::hint(
                    DiagnosticCode::IneligibleCall,
                    "auto-capture requires a zero-parameter callback",
                )
                .with_span(call_span)
                .build(),
            );
            self.calls.push(record);
            for arg in &call.args {
                self.visit_expr(&arg.expr);
            }
            return;
        }

        if auto_capture {
            if let Some(frame) = self.frames.last() {
                let func = frame.func;
                let visible = visible_names(&func, call_lo, self.span_base);
                let found = free_vars::find(callable, &visible, self.span_base);

                let mut refused: Vec<&str> = Vec::new();
                for var in &found.reserved {
                    if !refused.contains(&var.name.as_str()) {
                        refused.push(&var.name);
                        self.diagnostics.push(
                            Diagnostic::hint(
                                DiagnosticCode::ReservedNameCapture,
                                format!("`{}` collides with a reserved identifier", var.name),
                            )
                            .with_span(Span::new(self.file_id, var.start, var.end))
                            .build(),
                        );
                    }
                }

                if !found.occurrences.is_empty() {
                    let mut captures: Vec<String> = Vec::new();
                    for occ in &found.occurrences {
                        if !captures.contains(&occ.name) {
                            captures.push(occ.name.clone());
                        }
                    }
                    debug_assert!(!captures.iter().any(|n| crate::is_reserved_name(n)));

                    // 1. Parameterise the callback with the scope object.
                    debug_assert_eq!(param_count, 0);
                    if let Some(at) = self.param_insert_pos(callable) {
                        self.edits.insert(at, SCOPE_PARAM);
                    }

                    // 2. Rewrite every captured reference.
                    for occ in &found.occurrences {
                        self.edits.replace(
                            occ.start,
                            occ.end,
                            format!("{}.{}", SCOPE_PARAM, occ.name),
                        );
                    }

                    // 3. Append the capture object, evaluated at the call
                    //    site in the enclosing scope.
                    let literal = format!(", {{ {} }}", captures.join(", "));
                    self.edits.insert(call_hi.saturating_sub(1), literal);

                    record.captures = captures;
                } else {
                    log::debug!("inline task at {}..{} captures nothing", call_lo, call_hi);
                }
            }
        }

        // Bind the produced element and queue it for return injection.
        if is_stmt {
            if self.frames.is_empty() {
                self.diagnostics.push(
                    Diagnostic::hint(
                        DiagnosticCode::NoEnclosingFunction,
                        "inline task outside any function is left as a statement",
                    )
                    .with_span(call_span)
                    .build(),
                );
            } else {
                let name = format!("{}{}", TASK_PREFIX, self.next_binding);
                self.next_binding += 1;
                self.edits.insert(call_lo, format!("const {} = ", name));
                if let Some(frame) = self.frames.last_mut() {
                    frame.bindings.push(name);
                }
            }
        }

        self.calls.push(record);

        // The callable enters its own frame here, so nested inline tasks
        // inside it are still discovered.
        for arg in &call.args {
            self.visit_expr(&arg.expr);
        }
    }

    /// Byte offset just after the `(` opening the callable's empty
    /// parameter list.
    fn param_insert_pos(&self, callable: &ast::Expr) -> Option<u32> {
        let (start, limit) = match callable {
            ast::Expr::Arrow(arrow) => {
                (self.local(arrow.span).0, self.local(arrow.body.span()).0)
            }
            ast::Expr::Fn(func) => {
                let end = match &func.function.body {
                    Some(body) => self.local(body.span).0,
                    None => self.local(func.function.span).1,
                };
                (self.local(func.function.span).0, end)
            }
            _ => return None,
        };

        let bytes = self.source.as_bytes();
        ((start as usize)..(limit as usize).min(bytes.len()))
            .find(|&i| bytes[i] == b'(')
            .map(|i| i as u32 + 1)
    }

    // --- traversal --------------------------------------------------------

    fn visit_module_decl(&mut self, decl: &'a ast::ModuleDecl) {
        match decl {
            ast::ModuleDecl::ExportDecl(export) => self.visit_decl(&export.decl),
            ast::ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                ast::DefaultDecl::Fn(func) => {
                    self.enter_frame(EnclosingFn::Expr(func));
                    self.visit_function(&func.function);
                    self.exit_frame();
                }
                ast::DefaultDecl::Class(class) => self.visit_class(&class.class),
                ast::DefaultDecl::TsInterfaceDecl(_) => {}
            },
            ast::ModuleDecl::ExportDefaultExpr(export) => self.visit_expr(&export.expr),
            _ => {}
        }
    }

    fn visit_decl(&mut self, decl: &'a ast::Decl) {
        match decl {
            ast::Decl::Fn(func) => {
                self.enter_frame(EnclosingFn::Decl(func));
                self.visit_function(&func.function);
                self.exit_frame();
            }
            ast::Decl::Var(var) => {
                for declarator in &var.decls {
                    self.visit_pattern(&declarator.name);
                    if let Some(init) = &declarator.init {
                        self.visit_expr(init);
                    }
                }
            }
            ast::Decl::Using(using) => {
                for declarator in &using.decls {
                    if let Some(init) = &declarator.init {
                        self.visit_expr(init);
                    }
                }
            }
            ast::Decl::Class(class) => self.visit_class(&class.class),
            ast::Decl::TsEnum(ts_enum) => {
                for member in &ts_enum.members {
                    if let Some(init) = &member.init {
                        self.visit_expr(init);
                    }
                }
            }
            ast::Decl::TsInterface(_) | ast::Decl::TsTypeAlias(_) | ast::Decl::TsModule(_) => {}
        }
    }

    fn visit_function(&mut self, function: &'a ast::Function) {
        for param in &function.params {
            self.visit_pattern(&param.pat);
        }
        if let Some(body) = &function.body {
            for stmt in &body.stmts {
                self.visit_stmt(stmt);
            }
        }
    }

    /// Default values inside binding patterns can carry call sites.
    fn visit_pattern(&mut self, pat: &'a ast::Pat) {
        match pat {
            ast::Pat::Assign(assign) => {
                self.visit_expr(&assign.right);
                self.visit_pattern(&assign.left);
            }
            ast::Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.visit_pattern(elem);
                }
            }
            ast::Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ast::ObjectPatProp::KeyValue(kv) => self.visit_pattern(&kv.value),
                        ast::ObjectPatProp::Assign(assign) => {
                            if let Some(value) = &assign.value {
                                self.visit_expr(value);
                            }
                        }
                        ast::ObjectPatProp::Rest(rest) => self.visit_pattern(&rest.arg),
                    }
                }
            }
            ast::Pat::Rest(rest) => self.visit_pattern(&rest.arg),
            ast::Pat::Expr(expr) => self.visit_expr(expr),
            ast::Pat::Ident(_) | ast::Pat::Invalid(_) => {}
        }
    }

    fn visit_stmt(&mut self, stmt: &'a ast::Stmt) {
        match stmt {
            ast::Stmt::Expr(expr_stmt) => {
                if let ast::Expr::Call(call) = &*expr_stmt.expr {
                    self.visit_call(call, true);
                } else {
                    self.visit_expr(&expr_stmt.expr);
                }
            }
            ast::Stmt::Decl(decl) => self.visit_decl(decl),
            ast::Stmt::Block(block) => {
                for stmt in &block.stmts {
                    self.visit_stmt(stmt);
                }
            }
            ast::Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.test);
                self.visit_stmt(&if_stmt.cons);
                if let Some(alt) = &if_stmt.alt {
                    self.visit_stmt(alt);
                }
            }
            ast::Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.visit_expr(arg);
                }
            }
            ast::Stmt::For(for_stmt) => {
                match &for_stmt.init {
                    Some(ast::VarDeclOrExpr::VarDecl(var)) => {
                        for declarator in &var.decls {
                            if let Some(init) = &declarator.init {
                                self.visit_expr(init);
                            }
                        }
                    }
                    Some(ast::VarDeclOrExpr::Expr(expr)) => self.visit_expr(expr),
                    None => {}
                }
                if let Some(test) = &for_stmt.test {
                    self.visit_expr(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.visit_expr(update);
                }
                self.visit_stmt(&for_stmt.body);
            }
            ast::Stmt::ForIn(for_in) => {
                self.visit_expr(&for_in.right);
                self.visit_stmt(&for_in.body);
            }
            ast::Stmt::ForOf(for_of) => {
                self.visit_expr(&for_of.right);
                self.visit_stmt(&for_of.body);
            }
            ast::Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.test);
                self.visit_stmt(&while_stmt.body);
            }
            ast::Stmt::DoWhile(do_while) => {
                self.visit_stmt(&do_while.body);
                self.visit_expr(&do_while.test);
            }
            ast::Stmt::Try(try_stmt) => {
                for stmt in &try_stmt.block.stmts {
                    self.visit_stmt(stmt);
                }
                if let Some(handler) = &try_stmt.handler {
                    for stmt in &handler.body.stmts {
                        self.visit_stmt(stmt);
                    }
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    for stmt in &finalizer.stmts {
                        self.visit_stmt(stmt);
                    }
                }
            }
            ast::Stmt::Switch(switch) => {
                self.visit_expr(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    for stmt in &case.cons {
                        self.visit_stmt(stmt);
                    }
                }
            }
            ast::Stmt::Labeled(labeled) => self.visit_stmt(&labeled.body),
            ast::Stmt::Throw(throw) => self.visit_expr(&throw.arg),
            ast::Stmt::With(with) => {
                self.visit_expr(&with.obj);
                self.visit_stmt(&with.body);
            }
            ast::Stmt::Break(_)
            | ast::Stmt::Continue(_)
            | ast::Stmt::Empty(_)
            | ast::Stmt::Debugger(_) => {}
        }
    }

    fn visit_expr(&mut self, expr: &'a ast::Expr) {
        match expr {
            ast::Expr::Call(call) => self.visit_call(call, false),
            ast::Expr::Arrow(arrow) => {
                self.enter_frame(EnclosingFn::Arrow(arrow));
                for pat in &arrow.params {
                    self.visit_pattern(pat);
                }
                match &*arrow.body {
                    ast::BlockStmtOrExpr::BlockStmt(block) => {
                        for stmt in &block.stmts {
                            self.visit_stmt(stmt);
                        }
                    }
                    ast::BlockStmtOrExpr::Expr(expr) => self.visit_expr(expr),
                }
                self.exit_frame();
            }
            ast::Expr::Fn(func) => {
                self.enter_frame(EnclosingFn::Expr(func));
                self.visit_function(&func.function);
                self.exit_frame();
            }
            ast::Expr::Class(class_expr) => self.visit_class(&class_expr.class),
            ast::Expr::Member(member) => self.visit_member(member),
            ast::Expr::SuperProp(super_prop) => {
                if let ast::SuperProp::Computed(computed) = &super_prop.prop {
                    self.visit_expr(&computed.expr);
                }
            }
            ast::Expr::New(new) => {
                self.visit_expr(&new.callee);
                for arg in new.args.iter().flatten() {
                    self.visit_expr(&arg.expr);
                }
            }
            ast::Expr::OptChain(opt) => match &*opt.base {
                ast::OptChainBase::Member(member) => self.visit_member(member),
                ast::OptChainBase::Call(call) => {
                    self.visit_expr(&call.callee);
                    for arg in &call.args {
                        self.visit_expr(&arg.expr);
                    }
                }
            },
            ast::Expr::Assign(assign) => {
                if let ast::AssignTarget::Simple(ast::SimpleAssignTarget::Member(member)) =
                    &assign.left
                {
                    self.visit_member(member);
                }
                self.visit_expr(&assign.right);
            }
            ast::Expr::Update(update) => self.visit_expr(&update.arg),
            ast::Expr::Unary(unary) => self.visit_expr(&unary.arg),
            ast::Expr::Bin(bin) => {
                self.visit_expr(&bin.left);
                self.visit_expr(&bin.right);
            }
            ast::Expr::Cond(cond) => {
                self.visit_expr(&cond.test);
                self.visit_expr(&cond.cons);
                self.visit_expr(&cond.alt);
            }
            ast::Expr::Seq(seq) => {
                for expr in &seq.exprs {
                    self.visit_expr(expr);
                }
            }
            ast::Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.visit_expr(&elem.expr);
                }
            }
            ast::Expr::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ast::PropOrSpread::Spread(spread) => self.visit_expr(&spread.expr),
                        ast::PropOrSpread::Prop(prop) => match &**prop {
                            ast::Prop::Shorthand(_) => {}
                            ast::Prop::KeyValue(kv) => {
                                self.visit_prop_name(&kv.key);
                                self.visit_expr(&kv.value);
                            }
                            ast::Prop::Assign(assign) => self.visit_expr(&assign.value),
                            ast::Prop::Getter(getter) => {
                                self.visit_prop_name(&getter.key);
                                if let Some(body) = &getter.body {
                                    for stmt in &body.stmts {
                                        self.visit_stmt(stmt);
                                    }
                                }
                            }
                            ast::Prop::Setter(setter) => {
                                self.visit_prop_name(&setter.key);
                                if let Some(body) = &setter.body {
                                    for stmt in &body.stmts {
                                        self.visit_stmt(stmt);
                                    }
                                }
                            }
                            ast::Prop::Method(method) => {
                                self.visit_prop_name(&method.key);
                                self.visit_function(&method.function);
                            }
                        },
                    }
                }
            }
            ast::Expr::Tpl(tpl) => {
                for expr in &tpl.exprs {
                    self.visit_expr(expr);
                }
            }
            ast::Expr::TaggedTpl(tagged) => {
                self.visit_expr(&tagged.tag);
                for expr in &tagged.tpl.exprs {
                    self.visit_expr(expr);
                }
            }
            ast::Expr::Paren(paren) => self.visit_expr(&paren.expr),
            ast::Expr::Await(await_expr) => self.visit_expr(&await_expr.arg),
            ast::Expr::Yield(yield_expr) => {
                if let Some(arg) = &yield_expr.arg {
                    self.visit_expr(arg);
                }
            }
            ast::Expr::TsAs(ts_as) => self.visit_expr(&ts_as.expr),
            ast::Expr::TsSatisfies(sat) => self.visit_expr(&sat.expr),
            ast::Expr::TsNonNull(non_null) => self.visit_expr(&non_null.expr),
            ast::Expr::TsConstAssertion(assertion) => self.visit_expr(&assertion.expr),
            ast::Expr::TsTypeAssertion(assertion) => self.visit_expr(&assertion.expr),
            ast::Expr::TsInstantiation(inst) => self.visit_expr(&inst.expr),
            ast::Expr::JSXElement(element) => self.visit_jsx_element(element),
            ast::Expr::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.visit_jsx_child(child);
                }
            }
            _ => {}
        }
    }

    fn visit_member(&mut self, member: &'a ast::MemberExpr) {
        self.visit_expr(&member.obj);
        if let ast::MemberProp::Computed(computed) = &member.prop {
            self.visit_expr(&computed.expr);
        }
    }

    fn visit_prop_name(&mut self, key: &'a ast::PropName) {
        if let ast::PropName::Computed(computed) = key {
            self.visit_expr(&computed.expr);
        }
    }

    fn visit_class(&mut self, class: &'a ast::Class) {
        if let Some(super_class) = &class.super_class {
            self.visit_expr(super_class);
        }
        for member in &class.body {
            match member {
                ast::ClassMember::Method(method) => {
                    self.visit_prop_name(&method.key);
                    self.visit_function(&method.function);
                }
                ast::ClassMember::PrivateMethod(method) => {
                    self.visit_function(&method.function);
                }
                ast::ClassMember::Constructor(ctor) => {
                    for param in &ctor.params {
                        if let ast::ParamOrTsParamProp::Param(param) = param {
                            self.visit_pattern(&param.pat);
                        }
                    }
                    if let Some(body) = &ctor.body {
                        for stmt in &body.stmts {
                            self.visit_stmt(stmt);
                        }
                    }
                }
                ast::ClassMember::ClassProp(prop) => {
                    self.visit_prop_name(&prop.key);
                    if let Some(value) = &prop.value {
                        self.visit_expr(value);
                    }
                }
                ast::ClassMember::PrivateProp(prop) => {
                    if let Some(value) = &prop.value {
                        self.visit_expr(value);
                    }
                }
                ast::ClassMember::StaticBlock(block) => {
                    for stmt in &block.body.stmts {
                        self.visit_stmt(stmt);
                    }
                }
                ast::ClassMember::TsIndexSignature(_)
                | ast::ClassMember::AutoAccessor(_)
                | ast::ClassMember::Empty(_) => {}
            }
        }
    }

    fn visit_jsx_element(&mut self, element: &'a ast::JSXElement) {
        for attr in &element.opening.attrs {
            match attr {
                ast::JSXAttrOrSpread::SpreadElement(spread) => self.visit_expr(&spread.expr),
                ast::JSXAttrOrSpread::JSXAttr(attr) => {
                    if let Some(value) = &attr.value {
                        match value {
                            ast::JSXAttrValue::JSXExprContainer(container) => {
                                if let ast::JSXExpr::Expr(expr) = &container.expr {
                                    self.visit_expr(expr);
                                }
                            }
                            ast::JSXAttrValue::JSXElement(element) => {
                                self.visit_jsx_element(element)
                            }
                            ast::JSXAttrValue::JSXFragment(fragment) => {
                                for child in &fragment.children {
                                    self.visit_jsx_child(child);
                                }
                            }
                            ast::JSXAttrValue::Lit(_) => {}
                        }
                    }
                }
            }
        }
        for child in &element.children {
            self.visit_jsx_child(child);
        }
    }

    fn visit_jsx_child(&mut self, child: &'a ast::JSXElementChild) {
        match child {
            ast::JSXElementChild::JSXExprContainer(container) => {
                if let ast::JSXExpr::Expr(expr) = &container.expr {
                    self.visit_expr(expr);
                }
            }
            ast::JSXElementChild::JSXSpreadChild(spread) => self.visit_expr(&spread.expr),
            ast::JSXElementChild::JSXElement(element) => self.visit_jsx_element(element),
            ast::JSXElementChild::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.visit_jsx_child(child);
                }
            }
            ast::JSXElementChild::JSXText(_) => {}
        }
    }
}

/// Collect the expression of every `return` statement reachable without
/// crossing a nested function boundary.
fn collect_returns<'a>(stmts: &'a [ast::Stmt], out: &mut Vec<&'a ast::Expr>) {
    for stmt in stmts {
        collect_returns_stmt(stmt, out);
    }
}

fn collect_returns_stmt<'a>(stmt: &'a ast::Stmt, out: &mut Vec<&'a ast::Expr>) {
    match stmt {
        // A bare `return;` has nothing to host child slots.
        ast::Stmt::Return(ret) => {
            if let Some(arg) = &ret.arg {
                out.push(arg);
            }
        }
        ast::Stmt::Block(block) => collect_returns(&block.stmts, out),
        ast::Stmt::If(if_stmt) => {
            collect_returns_stmt(&if_stmt.cons, out);
            if let Some(alt) = &if_stmt.alt {
                collect_returns_stmt(alt, out);
            }
        }
        ast::Stmt::For(for_stmt) => collect_returns_stmt(&for_stmt.body, out),
        ast::Stmt::ForIn(for_in) => collect_returns_stmt(&for_in.body, out),
        ast::Stmt::ForOf(for_of) => collect_returns_stmt(&for_of.body, out),
        ast::Stmt::While(while_stmt) => collect_returns_stmt(&while_stmt.body, out),
        ast::Stmt::DoWhile(do_while) => collect_returns_stmt(&do_while.body, out),
        ast::Stmt::Try(try_stmt) => {
            collect_returns(&try_stmt.block.stmts, out);
            if let Some(handler) = &try_stmt.handler {
                collect_returns(&handler.body.stmts, out);
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                collect_returns(&finalizer.stmts, out);
            }
        }
        ast::Stmt::Switch(switch) => {
            for case in &switch.cases {
                collect_returns(&case.cons, out);
            }
        }
        ast::Stmt::Labeled(labeled) => collect_returns_stmt(&labeled.body, out),
        // Declarations and plain expressions never contain reachable
        // returns of this function.
        _ => {}
    }
}

/// Peel parenthesisation to reach the underlying expression.
fn strip_parens(expr: &ast::Expr) -> &ast::Expr {
    let mut expr = expr;
    while let ast::Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}
