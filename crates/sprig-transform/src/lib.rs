//! Capture transformer for inline-script hooks.
//!
//! Components call `useInlineTask(() => { ... })` with a zero-argument
//! callback that runs in the browser while the document is still parsing.
//! The callback is serialised to text at render time, so it cannot close
//! over server values the normal way; this crate rewrites each call at build
//! time so every referenced outer variable travels through an explicit,
//! serialisable capture object:
//!
//! ```text
//! function C() {
//!   const x = 1;
//!   useInlineTask(() => { console.log(x); });
//!   return <div />;
//! }
//! ```
//!
//! becomes
//!
//! ```text
//! function C() {
//!   const x = 1;
//!   const __task_0 = useInlineTask((__scope) => { console.log(__scope.x); }, { x });
//!   return <><div />{__task_0}</>;
//! }
//! ```
//!
//! The entry point is [`transform`], shaped like a bundler plugin hook: it
//! takes the module source and id, and returns rewritten code plus a source
//! map only when something changed. [`InlineTaskPlugin`] wraps it with the
//! plugin metadata a host expects.

mod collect;
mod edits;
mod free_vars;
mod rewrite;
mod scope;
mod srcmap;

pub use collect::EnclosingFn;
pub use edits::EditBuffer;
pub use free_vars::{FreeVar, FreeVars};
pub use rewrite::{InlineTaskCall, Rewriter};
pub use scope::{pattern_names, ScopeChain, ScopeId};
pub use srcmap::SourceMapBuilder;

use anyhow::Result;
use sprig_diagnostics::{Diagnostics, SourceCache};
use sprig_parser::{parse_source, ScriptKind};

/// The hook identifier the transformer looks for.
pub const HOOK_NAME: &str = "useInlineTask";

/// Name of the injected scope parameter.
pub const SCOPE_PARAM: &str = "__scope";

/// Prefix of fresh binding names; a per-file counter is appended.
pub const TASK_PREFIX: &str = "__task_";

/// Whether `name` collides with an identifier the rewriter reserves for
/// itself. Such names are refused for capture so the output stays valid
/// even against adversarial user code.
pub fn is_reserved_name(name: &str) -> bool {
    name == SCOPE_PARAM || name.starts_with(TASK_PREFIX)
}

/// Rewritten source plus its source map, both ready to hand to the bundler.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub code: String,
    /// Source map v3 JSON
    pub map: String,
}

/// When the plugin should run relative to other transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforce {
    /// Before other transforms touch the file
    Pre,
    Post,
}

/// Bundler-facing plugin object.
#[derive(Debug, Default)]
pub struct InlineTaskPlugin;

impl InlineTaskPlugin {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "sprig:inline-task"
    }

    /// The rewrite must see the original callback text, before JSX or TS
    /// lowering.
    pub fn enforce(&self) -> Enforce {
        Enforce::Pre
    }

    pub fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>> {
        transform(code, id)
    }
}

/// Everything one file produced: the optional output, collected
/// diagnostics, and the detected call sites. `scan` renders these; the
/// plugin path keeps only the output.
#[derive(Debug)]
pub struct FileReport {
    pub output: Option<TransformOutput>,
    pub diagnostics: Diagnostics,
    pub calls: Vec<InlineTaskCall>,
    pub cache: SourceCache,
}

/// Decide whether a module id is eligible, and with which syntax.
///
/// Rejects anything under a `node_modules` segment and any extension that
/// is not a script (`ts`, `js`) or script-with-markup (`tsx`, `jsx`) kind.
pub fn accepts(id: &str) -> Option<ScriptKind> {
    if id.split(['/', '\\']).any(|segment| segment == "node_modules") {
        return None;
    }
    // Bundler ids may carry query or fragment suffixes.
    let clean = id.split(['?', '#']).next().unwrap_or(id);
    let ext = std::path::Path::new(clean).extension()?.to_str()?;
    ScriptKind::from_extension(ext)
}

/// Transform one module, returning rewritten code and a source map when any
/// edit was produced and `None` otherwise, so downstream passes see the
/// original source. Parse failures are returned as errors for the host to
/// surface.
pub fn transform(code: &str, id: &str) -> Result<Option<TransformOutput>> {
    Ok(transform_file(code, id)?.output)
}

/// Like [`transform`], but keeps diagnostics and detected call sites.
pub fn transform_file(code: &str, id: &str) -> Result<FileReport> {
    let mut cache = SourceCache::new();

    let unchanged = |cache: SourceCache| FileReport {
        output: None,
        diagnostics: Diagnostics::new(),
        calls: Vec::new(),
        cache,
    };

    let Some(kind) = accepts(id) else {
        return Ok(unchanged(cache));
    };
    // Cheap rejection before any parsing happens.
    if !code.contains(HOOK_NAME) {
        return Ok(unchanged(cache));
    }

    let parsed = parse_source(code, id, kind, &mut cache)?;

    let mut rewriter = Rewriter::new(code, parsed.span_base, parsed.file_id);
    rewriter.rewrite_module(&parsed.module);

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(rewriter.diagnostics);

    let output = if rewriter.edits.is_empty() {
        None
    } else {
        let mut map = SourceMapBuilder::new();
        let rewritten = rewriter.edits.apply_with_map(code, &mut map);
        Some(TransformOutput {
            code: rewritten,
            map: map.build(id, code),
        })
    };

    log::debug!(
        "{}: {} inline task call(s), {} edit(s)",
        id,
        rewriter.calls.len(),
        rewriter.edits.len()
    );

    Ok(FileReport {
        output,
        diagnostics,
        calls: rewriter.calls,
        cache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(source: &str) -> String {
        transform(source, "page.tsx")
            .unwrap()
            .expect("expected edits")
            .code
    }

    #[test]
    fn test_basic_capture_and_injection() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(()=>{ console.log(x); }); return <div/>; }",
        );

        assert!(out.contains("__scope.x"));
        assert!(out.contains(", { x })"));
        assert!(out.contains("const __task_0 = useInlineTask((__scope)=>"));
        assert!(out.contains("return <><div/>{__task_0}</>;"));
        // Exactly one fresh binding.
        assert_eq!(out.matches(TASK_PREFIX).count(), 2); // declaration + slot
    }

    #[test]
    fn test_enclosing_parameter_capture() {
        let out = rewrite(
            "function C(props){ useInlineTask(()=>{ console.log(props.title); }); return <div/>; }",
        );

        assert!(out.contains("__scope.props.title"));
        assert!(out.contains(", { props })"));
    }

    #[test]
    fn test_block_shadowing_only_outer_rewritten() {
        let out = rewrite(
            "function C(){ const x='outer'; useInlineTask(()=>{ { const x='inner'; use(x);} use(x); }); return <div/>; }",
        );

        assert!(out.contains("{ const x='inner'; use(x);}"));
        assert!(out.contains("use(__scope.x);"));
        assert!(out.contains(", { x })"));
    }

    #[test]
    fn test_loop_shadowing_not_captured() {
        let out = rewrite(
            "function C(){ const i=99; useInlineTask(()=>{ for(let i=0;i<10;i++) use(i); }); return <div/>; }",
        );

        assert!(!out.contains("__scope.i"));
        // No captures means no scope parameter either.
        assert!(out.contains("useInlineTask(()=>"));
        // The call still becomes an element binding.
        assert!(out.contains("const __task_0 = "));
    }

    #[test]
    fn test_capture_order_is_first_occurrence() {
        let out = rewrite(
            "function C(){ const a=1; const b=2; useInlineTask(()=>{ use(b); use(a); use(b); }); return <div/>; }",
        );

        assert!(out.contains(", { b, a })"));
        assert_eq!(out.matches("__scope.b").count(), 2);
        assert_eq!(out.matches("__scope.a").count(), 1);
    }

    #[test]
    fn test_declarations_after_call_not_visible() {
        let out = rewrite(
            "function C(){ const a=1; useInlineTask(()=>{ use(a, z); }); const z=3; return <div/>; }",
        );

        assert!(out.contains("use(__scope.a, z)"));
        assert!(out.contains(", { a })"));
    }

    #[test]
    fn test_fragment_return_appends_slot() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(()=>{ use(x); }); return <><div/><span/></>; }",
        );

        assert!(out.contains("<span/>{__task_0}</>"));
        // The existing fragment is reused, not rewrapped.
        assert_eq!(out.matches("<>").count(), 1);
    }

    #[test]
    fn test_every_return_is_spliced() {
        let out = rewrite(
            "function C(f){ useInlineTask(()=>{ use(f); }); if (f) { return <a/>; } return <b/>; }",
        );

        assert!(out.contains("<><a/>{__task_0}</>"));
        assert!(out.contains("<><b/>{__task_0}</>"));
    }

    #[test]
    fn test_two_calls_inject_in_order() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(()=>{ use(x); }); useInlineTask(()=>{ use(x); }); return <div/>; }",
        );

        assert!(out.contains("const __task_0 = "));
        assert!(out.contains("const __task_1 = "));
        assert!(out.contains("{__task_0}{__task_1}</>"));
    }

    #[test]
    fn test_arrow_component_expression_body() {
        let out = rewrite(
            "const C = (msg) => { useInlineTask(()=>{ log(msg); }); return <div/>; };",
        );

        assert!(out.contains("__scope.msg"));
        assert!(out.contains(", { msg })"));
        assert!(out.contains("<><div/>{__task_0}</>"));
    }

    #[test]
    fn test_explicit_captures_left_alone_but_injected() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask((s)=>{ use(s.x); }, { x }); return <div/>; }",
        );

        // No auto-capture edits on a two-argument call.
        assert!(out.contains("useInlineTask((s)=>{ use(s.x); }, { x })"));
        assert!(!out.contains("__scope"));
        // Still bound and spliced.
        assert!(out.contains("const __task_0 = "));
        assert!(out.contains("{__task_0}</>"));
    }

    #[test]
    fn test_callable_with_params_is_skipped() {
        let source = "function C(){ useInlineTask((x)=>{ use(x); }); return <div/>; }";
        let report = transform_file(source, "page.tsx").unwrap();

        assert!(report.output.is_none());
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].param_count, Some(1));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == sprig_diagnostics::DiagnosticCode::IneligibleCall));
    }

    #[test]
    fn test_call_outside_function_left_intact() {
        let source = "const g = 1; useInlineTask(()=>{ use(g); });";
        let report = transform_file(source, "page.tsx").unwrap();

        assert!(report.output.is_none());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == sprig_diagnostics::DiagnosticCode::NoEnclosingFunction));
    }

    #[test]
    fn test_call_bound_by_user_gets_no_fresh_binding() {
        let out = rewrite(
            "function C(){ const x=1; const el = useInlineTask(()=>{ use(x); }); return <div>{el}</div>; }",
        );

        assert!(out.contains("const el = useInlineTask((__scope)=>"));
        assert!(!out.contains(TASK_PREFIX));
    }

    #[test]
    fn test_member_property_not_rewritten_even_when_name_matches() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(()=>{ use(obj.x, x); }); return <div/>; }",
        );

        assert!(out.contains("obj.x"));
        assert!(out.contains("__scope.x"));
        assert!(out.contains(", { x })"));
    }

    #[test]
    fn test_no_hook_substring_is_noop() {
        let result = transform("const a = 1;", "page.tsx").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_vendor_and_extension_filters() {
        let hook = "function C(){ useInlineTask(()=>{}); return <div/>; }";
        assert!(transform(hook, "app/node_modules/lib/page.tsx")
            .unwrap()
            .is_none());
        assert!(transform("useInlineTask", "styles.css").unwrap().is_none());
        assert!(accepts("src/page.tsx?raw").is_some());
        assert!(accepts("src/page.rs").is_none());
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        assert!(transform("function C( { useInlineTask(", "broken.tsx").is_err());
    }

    #[test]
    fn test_non_element_return_wrapped_with_hint() {
        let source = "function C(){ const x=1; useInlineTask(()=>{ use(x); }); return null; }";
        let report = transform_file(source, "page.tsx").unwrap();

        let out = report.output.expect("expected edits").code;
        assert!(out.contains("return <>null{__task_0}</>;"));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == sprig_diagnostics::DiagnosticCode::NonElementReturn));
    }

    #[test]
    fn test_parenthesised_return_is_unwrapped() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(()=>{ use(x); }); return (<div/>); }",
        );

        assert!(out.contains("(<><div/>{__task_0}</>)"));
    }

    #[test]
    fn test_ternary_return_wrapped_whole() {
        let out = rewrite(
            "function C(flag){ useInlineTask(()=>{ use(flag); }); return flag ? <a/> : <b/>; }",
        );

        assert!(out.contains("return <>flag ? <a/> : <b/>{__task_0}</>;"));
    }

    #[test]
    fn test_source_map_emitted() {
        let output = transform(
            "function C(){ const x=1; useInlineTask(()=>{ use(x); }); return <div/>; }",
            "page.tsx",
        )
        .unwrap()
        .expect("expected edits");

        let map: serde_json::Value = serde_json::from_str(&output.map).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"][0], "page.tsx");
        assert!(!map["mappings"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_plugin_surface() {
        let plugin = InlineTaskPlugin::new();
        assert_eq!(plugin.name(), "sprig:inline-task");
        assert_eq!(plugin.enforce(), Enforce::Pre);
        assert!(plugin.transform("const a = 1;", "a.tsx").unwrap().is_none());
    }

    #[test]
    fn test_function_expression_callback() {
        let out = rewrite(
            "function C(){ const x=1; useInlineTask(function(){ use(x); }); return <div/>; }",
        );

        assert!(out.contains("function(__scope){ use(__scope.x); }"));
        assert!(out.contains(", { x })"));
    }
}
