//! Lexical scope chain for capture analysis.
//!
//! Scopes form a parent-linked chain from innermost to outermost, each
//! holding a set of declared names. Lookup walks outward and answers at the
//! first scope containing the name, which is all the shadowing logic the
//! free-variable finder needs. The chain is arena-backed so scopes stay
//! cheap to create for every block, loop header, and catch clause.

use std::collections::HashSet;
use swc_ecma_ast as ast;

/// Index of a scope in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct ScopeData {
    parent: Option<ScopeId>,
    names: HashSet<String>,
}

/// Arena of nested lexical scopes.
#[derive(Debug)]
pub struct ScopeChain {
    scopes: Vec<ScopeData>,
}

impl ScopeChain {
    /// The outermost scope. The finder seeds it with the names visible from
    /// the enclosing function.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Create a chain whose root scope holds `names`.
    pub fn with_root(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            scopes: vec![ScopeData {
                parent: None,
                names: names.into_iter().collect(),
            }],
        }
    }

    /// Create a child of `parent`, returning its id.
    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            parent: Some(parent),
            names: HashSet::new(),
        });
        id
    }

    /// Declare a name in `scope`.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>) {
        self.scopes[scope.0].names.insert(name.into());
    }

    /// Declare every binding introduced by a pattern in `scope`.
    pub fn declare_pattern(&mut self, scope: ScopeId, pat: &ast::Pat) {
        let mut names = Vec::new();
        pattern_names(pat, &mut names);
        for name in names {
            self.declare(scope, name);
        }
    }

    /// Find the scope that binds `name`, searching from `from` outward.
    pub fn resolve(&self, name: &str, from: ScopeId) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if scope.names.contains(name) {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    /// Whether `name` is bound in `from` or any ancestor.
    pub fn has(&self, name: &str, from: ScopeId) -> bool {
        self.resolve(name, from).is_some()
    }
}

/// Collect every name bound by a binding pattern, flattening object and
/// array destructuring, defaults, and rest elements.
pub fn pattern_names(pat: &ast::Pat, out: &mut Vec<String>) {
    match pat {
        ast::Pat::Ident(binding) => out.push(binding.id.sym.to_string()),
        ast::Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pattern_names(elem, out);
            }
        }
        ast::Pat::Rest(rest) => pattern_names(&rest.arg, out),
        ast::Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ast::ObjectPatProp::KeyValue(kv) => pattern_names(&kv.value, out),
                    ast::ObjectPatProp::Assign(assign) => {
                        out.push(assign.key.id.sym.to_string())
                    }
                    ast::ObjectPatProp::Rest(rest) => pattern_names(&rest.arg, out),
                }
            }
        }
        ast::Pat::Assign(assign) => pattern_names(&assign.left, out),
        ast::Pat::Invalid(_) | ast::Pat::Expr(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut chain = ScopeChain::with_root(vec!["outer".to_string()]);
        let inner = chain.push(ScopeChain::ROOT);
        chain.declare(inner, "local");

        assert_eq!(chain.resolve("outer", inner), Some(ScopeChain::ROOT));
        assert_eq!(chain.resolve("local", inner), Some(inner));
        assert_eq!(chain.resolve("missing", inner), None);
    }

    #[test]
    fn test_shadowing_answers_at_innermost() {
        let mut chain = ScopeChain::with_root(vec!["x".to_string()]);
        let block = chain.push(ScopeChain::ROOT);
        chain.declare(block, "x");

        assert_eq!(chain.resolve("x", block), Some(block));
        assert_eq!(chain.resolve("x", ScopeChain::ROOT), Some(ScopeChain::ROOT));
    }

    #[test]
    fn test_sibling_scopes_do_not_leak() {
        let mut chain = ScopeChain::with_root(Vec::new());
        let a = chain.push(ScopeChain::ROOT);
        let b = chain.push(ScopeChain::ROOT);
        chain.declare(a, "only_in_a");

        assert!(chain.has("only_in_a", a));
        assert!(!chain.has("only_in_a", b));
    }
}
