//! TypeScript/TSX parser wrapper using SWC
//!
//! This crate provides a high-level interface to parse TypeScript and TSX
//! source code into an AST using the SWC parser, with integrated diagnostic
//! support. The transformer edits raw source text, so every parse result
//! carries the byte-offset base needed to convert SWC's global positions
//! into file-local offsets.

use anyhow::Result;
use sprig_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, FileId, SourceCache, Span};
use swc_common::{input::StringInput, sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, Syntax, TsSyntax};

// Re-export AST types for consumers that need to inspect the AST
pub use swc_ecma_ast;

// Re-export Spanned trait for getting spans from AST nodes
pub use swc_common::Spanned;

/// The dialect a file is parsed as, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Plain TypeScript (`.ts`)
    Ts,
    /// TypeScript with JSX (`.tsx`)
    Tsx,
    /// Plain ECMAScript (`.js`)
    Js,
    /// ECMAScript with JSX (`.jsx`)
    Jsx,
}

impl ScriptKind {
    /// Map a file extension to a script kind. Returns `None` for extensions
    /// the transformer does not accept.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            "js" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            _ => None,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Self::Ts | Self::Tsx => Syntax::Typescript(TsSyntax {
                tsx: self == Self::Tsx,
                decorators: true,
                dts: false,
                no_early_errors: false,
                disallow_ambiguous_jsx_like: false,
            }),
            Self::Js | Self::Jsx => Syntax::Es(EsSyntax {
                jsx: self == Self::Jsx,
                ..Default::default()
            }),
        }
    }
}

/// Result of parsing a source file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed AST module
    pub module: Module,
    /// The file ID in the source cache
    pub file_id: FileId,
    /// SWC's global byte position of the first byte of this file. Subtract
    /// it from any AST span to get a file-local offset.
    pub span_base: u32,
    /// Any diagnostics (recoverable parse warnings)
    pub diagnostics: Diagnostics,
}

impl ParseResult {
    /// Convert an SWC span into a file-local [`Span`].
    pub fn local_span(&self, swc_span: swc_common::Span) -> Span {
        Span::new(
            self.file_id,
            swc_span.lo.0.saturating_sub(self.span_base),
            swc_span.hi.0.saturating_sub(self.span_base),
        )
    }
}

/// Parse source code into an AST Module with diagnostic support.
///
/// The file is added to the source cache so downstream diagnostics can
/// render snippets. Recoverable parse errors become warnings in the result;
/// an unrecoverable error aborts the parse.
pub fn parse_source(
    source: &str,
    filename: &str,
    kind: ScriptKind,
    cache: &mut SourceCache,
) -> Result<ParseResult> {
    let file_id = cache.add_file(filename, source.to_string());

    // SWC keeps its own source map for global byte positions; it is separate
    // from our cache and only lives as long as this parse.
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );
    let span_base = source_file.start_pos.0;

    let lexer = Lexer::new(
        kind.syntax(),
        swc_ecma_ast::EsVersion::Es2022,
        StringInput::from(&*source_file),
        None,
    );

    let mut parser = Parser::new_from(lexer);
    let mut diagnostics = Diagnostics::new();

    let module = parser.parse_module().map_err(|e| {
        let span = Span::new(
            file_id,
            e.span().lo.0.saturating_sub(span_base),
            e.span().hi.0.saturating_sub(span_base),
        );
        anyhow::anyhow!(
            "{}: parse error at {}..{}: {}",
            filename,
            span.start,
            span.end,
            e.kind().msg()
        )
    })?;

    // Recoverable errors do not block the transform; surface them as
    // warnings so `scan` can report them.
    for error in parser.take_errors() {
        let span = Span::new(
            file_id,
            error.span().lo.0.saturating_sub(span_base),
            error.span().hi.0.saturating_sub(span_base),
        );
        diagnostics.push(
            Diagnostic::warning(DiagnosticCode::ParseError, format!("{}", error.kind().msg()))
                .with_span(span)
                .build(),
        );
    }

    Ok(ParseResult {
        module,
        file_id,
        span_base,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_with_hook() {
        let source = r#"
            function Counter() {
                const count = 1;
                useInlineTask(() => {
                    console.log(count);
                });
                return <div />;
            }
        "#;

        let mut cache = SourceCache::new();
        let result = parse_source(source, "counter.tsx", ScriptKind::Tsx, &mut cache).unwrap();
        assert_eq!(result.module.body.len(), 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_local_span_round_trip() {
        let source = "const answer = 42;";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "a.ts", ScriptKind::Ts, &mut cache).unwrap();

        use swc_common::Spanned;
        let stmt_span = result.local_span(result.module.body[0].span());
        assert_eq!(stmt_span.start, 0);
        let text = cache.source_text(stmt_span).unwrap();
        assert!(text.starts_with("const answer = 42"));
    }

    #[test]
    fn test_plain_ts_rejects_jsx() {
        // In plain .ts, `<div />` parses as a type assertion chain and the
        // dangling close is an error.
        let source = "function C() { return <div />; }";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "c.ts", ScriptKind::Ts, &mut cache);
        assert!(result.is_err() || !result.unwrap().diagnostics.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let source = "const x = ;";
        let mut cache = SourceCache::new();
        let result = parse_source(source, "bad.ts", ScriptKind::Ts, &mut cache);
        assert!(result.is_err());
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ScriptKind::from_extension("tsx"), Some(ScriptKind::Tsx));
        assert_eq!(ScriptKind::from_extension("js"), Some(ScriptKind::Js));
        assert_eq!(ScriptKind::from_extension("css"), None);
    }
}
