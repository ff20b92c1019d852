//! Diagnostic emitters for different output formats.

use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::source_cache::SourceCache;
use std::io::Write;

/// Trait for emitting diagnostics in various formats.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()>;

    /// Emit multiple diagnostics.
    fn emit_all(&mut self, diagnostics: &Diagnostics, cache: &SourceCache) -> std::io::Result<()> {
        for diag in diagnostics.iter() {
            self.emit(diag, cache)?;
        }
        Ok(())
    }

    /// Emit a summary line.
    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()>;
}

/// Rich terminal output with colors and code snippets.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colored: bool,
}

impl<W: Write> TerminalEmitter<W> {
    /// Create a new terminal emitter.
    pub fn new(writer: W, colored: bool) -> Self {
        Self { writer, colored }
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        if !self.colored {
            return "";
        }
        match severity {
            Severity::Error => "\x1b[31m",   // Red
            Severity::Warning => "\x1b[33m", // Yellow
            Severity::Hint => "\x1b[34m",    // Blue
        }
    }

    fn reset(&self) -> &'static str {
        if self.colored {
            "\x1b[0m"
        } else {
            ""
        }
    }

    fn bold(&self) -> &'static str {
        if self.colored {
            "\x1b[1m"
        } else {
            ""
        }
    }

    fn cyan(&self) -> &'static str {
        if self.colored {
            "\x1b[36m"
        } else {
            ""
        }
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()> {
        let color = self.severity_color(diagnostic.severity);
        let reset = self.reset();
        let bold = self.bold();
        let cyan = self.cyan();

        // Header: hint[C002]: message
        writeln!(
            self.writer,
            "{}{}{}[{}]{}: {}",
            bold,
            color,
            diagnostic.severity.as_str(),
            diagnostic.code.as_str(),
            reset,
            diagnostic.message
        )?;

        // Location: --> file:line:column
        if let Some(loc) = cache.location(diagnostic.span) {
            writeln!(
                self.writer,
                "  {}-->{} {}:{}:{}",
                cyan, reset, loc.file, loc.line, loc.column
            )?;

            // Code snippet with an underline below the span
            if let Some(file) = cache.get_file(diagnostic.span.file_id) {
                let (line_num, start_col) = file.line_column(diagnostic.span.start);
                if let Some(line_text) = file.line_text(line_num) {
                    let line_str = format!("{}", line_num);
                    let padding = " ".repeat(line_str.len());

                    writeln!(self.writer, "{} {}|{}", padding, cyan, reset)?;
                    writeln!(
                        self.writer,
                        "{}{} |{} {}",
                        cyan, line_str, reset, line_text
                    )?;

                    let underline_padding = " ".repeat((start_col - 1) as usize);
                    let span_len = diagnostic.span.len().max(1) as usize;
                    let max_underline = line_text.len().saturating_sub((start_col - 1) as usize);
                    let underline = "^".repeat(span_len.min(max_underline).max(1));

                    writeln!(
                        self.writer,
                        "{} {}|{} {}{}{}{}",
                        padding, cyan, reset, underline_padding, color, underline, reset
                    )?;
                }
            }
        }

        for label in &diagnostic.labels {
            if let Some(loc) = cache.location(label.span) {
                writeln!(
                    self.writer,
                    "  {}note{}: {} ({}:{}:{})",
                    cyan, reset, label.message, loc.file, loc.line, loc.column
                )?;
            }
        }

        if let Some(ref help) = diagnostic.help {
            writeln!(self.writer, "  {}= help:{} {}", cyan, reset, help)?;
        }

        writeln!(self.writer)?;
        Ok(())
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let errors = diagnostics.error_count();
        let warnings = diagnostics.warning_count();
        let hints = diagnostics.hint_count();

        if errors == 0 && warnings == 0 && hints == 0 {
            return Ok(());
        }

        let color = if errors > 0 {
            self.severity_color(Severity::Error)
        } else if warnings > 0 {
            self.severity_color(Severity::Warning)
        } else {
            self.severity_color(Severity::Hint)
        };
        let reset = self.reset();

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} error{}", errors, plural(errors)));
        }
        if warnings > 0 {
            parts.push(format!("{} warning{}", warnings, plural(warnings)));
        }
        if hints > 0 {
            parts.push(format!("{} hint{}", hints, plural(hints)));
        }

        writeln!(self.writer, "{}{} emitted{}", color, parts.join(", "), reset)
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// JSON lines output for tooling integration.
pub struct JsonEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonEmitter<W> {
    /// Create a new JSON emitter.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticEmitter for JsonEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()> {
        let loc = cache.location(diagnostic.span);

        let json = serde_json::json!({
            "code": diagnostic.code.as_str(),
            "severity": diagnostic.severity.as_str(),
            "message": diagnostic.message,
            "location": loc,
            "span": if diagnostic.span.is_dummy() {
                serde_json::Value::Null
            } else {
                serde_json::json!({
                    "start": diagnostic.span.start,
                    "end": diagnostic.span.end,
                })
            },
            "help": diagnostic.help,
        });

        serde_json::to_writer(&mut self.writer, &json)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let json = serde_json::json!({
            "errors": diagnostics.error_count(),
            "warnings": diagnostics.warning_count(),
            "hints": diagnostics.hint_count(),
        });
        serde_json::to_writer(&mut self.writer, &json)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;
    use crate::span::Span;

    fn sample() -> (Diagnostics, SourceCache) {
        let mut cache = SourceCache::new();
        let id = cache.add_file("page.tsx", "useInlineTask(() => {});\n".to_string());

        let mut diags = Diagnostics::new();
        diags.push(
            Diagnostic::hint(DiagnosticCode::NoEnclosingFunction, "call at module scope")
                .with_span(Span::new(id, 0, 13))
                .build(),
        );
        (diags, cache)
    }

    #[test]
    fn test_terminal_output_plain() {
        let (diags, cache) = sample();
        let mut buf = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut buf, false);
        emitter.emit_all(&diags, &cache).unwrap();
        emitter.emit_summary(&diags).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("hint[C002]"));
        assert!(text.contains("page.tsx:1:1"));
        assert!(text.contains("^^^^^^^^^^^^^"));
        assert!(text.contains("1 hint emitted"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let (diags, cache) = sample();
        let mut buf = Vec::new();
        let mut emitter = JsonEmitter::new(&mut buf);
        emitter.emit_all(&diags, &cache).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(value["code"], "C002");
        assert_eq!(value["location"]["line"], 1);
    }
}
