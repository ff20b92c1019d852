//! Enclosing-scope collection.
//!
//! For a hook call at position `P` inside function `F`, the names a callback
//! may capture are: every parameter of `F` (binding patterns flattened), plus
//! every name introduced by a top-level variable statement or function
//! declaration of `F`'s block body that starts before `P`. Declarations after
//! `P` are excluded even though hoisting would make some of them visible at
//! run time; capture is deliberately restricted to the textual prefix.
//! Nothing is collected transitively from outer functions.

use crate::scope::pattern_names;
use std::collections::HashSet;
use swc_common::Spanned;
use swc_ecma_ast as ast;

/// The nearest function-like ancestor of a call site. Only function
/// declarations, function expressions, and arrow functions qualify; class
/// methods are transparent.
#[derive(Debug, Clone, Copy)]
pub enum EnclosingFn<'a> {
    Decl(&'a ast::FnDecl),
    Expr(&'a ast::FnExpr),
    Arrow(&'a ast::ArrowExpr),
}

impl<'a> EnclosingFn<'a> {
    /// The function's parameter patterns.
    pub fn params(&self) -> Vec<&'a ast::Pat> {
        match self {
            Self::Decl(decl) => decl.function.params.iter().map(|p| &p.pat).collect(),
            Self::Expr(expr) => expr.function.params.iter().map(|p| &p.pat).collect(),
            Self::Arrow(arrow) => arrow.params.iter().collect(),
        }
    }

    /// Top-level statements of the body, when the body is a block. An arrow
    /// with an expression body has none.
    pub fn body_stmts(&self) -> Option<&'a [ast::Stmt]> {
        match self {
            Self::Decl(decl) => decl.function.body.as_ref().map(|b| b.stmts.as_slice()),
            Self::Expr(expr) => expr.function.body.as_ref().map(|b| b.stmts.as_slice()),
            Self::Arrow(arrow) => match &*arrow.body {
                ast::BlockStmtOrExpr::BlockStmt(block) => Some(block.stmts.as_slice()),
                ast::BlockStmtOrExpr::Expr(_) => None,
            },
        }
    }

    /// The body expression of an arrow without a block, if any. This is the
    /// function's single return expression.
    pub fn expr_body(&self) -> Option<&'a ast::Expr> {
        match self {
            Self::Arrow(arrow) => match &*arrow.body {
                ast::BlockStmtOrExpr::Expr(expr) => Some(expr),
                ast::BlockStmtOrExpr::BlockStmt(_) => None,
            },
            _ => None,
        }
    }
}

/// Names visible to a callback invoked at file-local position `call_pos`.
pub fn visible_names(func: &EnclosingFn<'_>, call_pos: u32, span_base: u32) -> HashSet<String> {
    let mut names = Vec::new();

    for pat in func.params() {
        pattern_names(pat, &mut names);
    }

    if let Some(stmts) = func.body_stmts() {
        for stmt in stmts {
            let start = stmt.span().lo.0.saturating_sub(span_base);
            if start >= call_pos {
                break;
            }
            match stmt {
                ast::Stmt::Decl(ast::Decl::Var(var)) => {
                    for declarator in &var.decls {
                        pattern_names(&declarator.name, &mut names);
                    }
                }
                ast::Stmt::Decl(ast::Decl::Fn(decl)) => {
                    names.push(decl.ident.sym.to_string());
                }
                _ => {}
            }
        }
    }

    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_diagnostics::SourceCache;
    use sprig_parser::{parse_source, ScriptKind};

    fn first_fn(module: &ast::Module) -> &ast::FnDecl {
        for item in &module.body {
            if let ast::ModuleItem::Stmt(ast::Stmt::Decl(ast::Decl::Fn(decl))) = item {
                return decl;
            }
        }
        panic!("no function declaration in test module");
    }

    #[test]
    fn test_prefix_declarations_only() {
        let source = "function C() { const a = 1; mark(); const b = 2; }";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "t.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        let func = EnclosingFn::Decl(first_fn(&result.module));

        let mark = source.find("mark").unwrap() as u32;
        let names = visible_names(&func, mark, result.span_base);

        assert!(names.contains("a"));
        assert!(!names.contains("b"));
    }

    #[test]
    fn test_parameters_are_flattened() {
        let source = "function C({ title, items: [first] }, count) { mark(); }";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "t.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        let func = EnclosingFn::Decl(first_fn(&result.module));

        let mark = source.find("mark").unwrap() as u32;
        let names = visible_names(&func, mark, result.span_base);

        assert!(names.contains("title"));
        assert!(names.contains("first"));
        assert!(names.contains("count"));
    }

    #[test]
    fn test_function_declarations_count() {
        let source = "function C() { function helper() {} mark(); }";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "t.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        let func = EnclosingFn::Decl(first_fn(&result.module));

        let mark = source.find("mark").unwrap() as u32;
        let names = visible_names(&func, mark, result.span_base);

        assert!(names.contains("helper"));
    }
}
