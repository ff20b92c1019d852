//! Diagnostic infrastructure for the sprig inline-script transformer.
//!
//! This crate provides structured reporting with:
//! - Source location tracking (file, line, column)
//! - Diagnostic types with sprig-specific codes
//! - Terminal and JSON output formats
//!
//! # Example
//!
//! ```
//! use sprig_diagnostics::{
//!     Diagnostic, DiagnosticCode, DiagnosticEmitter, SourceCache, Span, TerminalEmitter,
//! };
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add_file("page.tsx", "useInlineTask(() => {});".to_string());
//!
//! let diag = Diagnostic::hint(DiagnosticCode::NoEnclosingFunction, "call at module scope")
//!     .with_span(Span::new(file_id, 0, 13))
//!     .with_help("move the call into a component function")
//!     .build();
//!
//! let stderr = std::io::stderr();
//! let mut emitter = TerminalEmitter::new(stderr.lock(), true);
//! emitter.emit(&diag, &cache).unwrap();
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod source_cache;
pub mod span;

// Re-export commonly used types
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Diagnostics, Severity};
pub use emitter::{DiagnosticEmitter, JsonEmitter, TerminalEmitter};
pub use source_cache::{SourceCache, SourceFile};
pub use span::{FileId, Label, Location, Span};
