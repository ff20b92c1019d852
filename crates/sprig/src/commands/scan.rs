//! Scan command - walk a tree and report every inline-task call site.

use anyhow::{Context, Result};
use clap::Args;
use sprig_diagnostics::{DiagnosticEmitter, Diagnostics, JsonEmitter, TerminalEmitter};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Input file or directory
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Show files without any inline-task call too
    #[arg(long)]
    pub all: bool,
}

/// Collect candidate source files, skipping vendored dependencies.
fn collect_files(path: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.clone());
        return Ok(files);
    }

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.components().any(|c| c.as_os_str() == "node_modules") {
            continue;
        }

        if path.is_file() && sprig_transform::accepts(&path.to_string_lossy()).is_some() {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

pub fn run(args: ScanArgs, format: OutputFormat, use_color: bool, quiet: bool) -> Result<()> {
    let files = collect_files(&args.input)?;

    let mut total_calls = 0usize;
    let mut changed_files = 0usize;
    let mut all_diagnostics = Diagnostics::new();
    let mut file_rows = Vec::new();

    for file in &files {
        let code = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let id = file.to_string_lossy();

        let report = match sprig_transform::transform_file(&code, &id) {
            Ok(report) => report,
            Err(error) => {
                // Parse failures are reported but do not stop the scan.
                log::warn!("{}: {}", file.display(), error);
                if !quiet {
                    eprintln!("error: {}", error);
                }
                continue;
            }
        };

        if report.calls.is_empty() && !args.all {
            continue;
        }

        total_calls += report.calls.len();
        if report.output.is_some() {
            changed_files += 1;
        }

        if !report.diagnostics.is_empty() && !quiet {
            let stderr = std::io::stderr();
            match format {
                OutputFormat::Text => {
                    let mut emitter = TerminalEmitter::new(stderr.lock(), use_color);
                    emitter.emit_all(&report.diagnostics, &report.cache)?;
                }
                OutputFormat::Json => {
                    let mut emitter = JsonEmitter::new(stderr.lock());
                    emitter.emit_all(&report.diagnostics, &report.cache)?;
                }
            }
        }
        all_diagnostics.extend(report.diagnostics);

        file_rows.push(serde_json::json!({
            "file": file.display().to_string(),
            "calls": report.calls.iter().map(|call| serde_json::json!({
                "span": { "start": call.span.start, "end": call.span.end },
                "args": call.arg_count,
                "autoCapture": call.arg_count == 1 && call.param_count == Some(0),
                "captures": call.captures,
                "statement": call.is_stmt,
            })).collect::<Vec<_>>(),
            "changed": report.output.is_some(),
        }));

        if !quiet {
            if let OutputFormat::Text = format {
                let captures: Vec<String> = report
                    .calls
                    .iter()
                    .flat_map(|call| call.captures.iter().cloned())
                    .collect();
                println!(
                    "{}: {} call(s){}",
                    file.display(),
                    report.calls.len(),
                    if captures.is_empty() {
                        String::new()
                    } else {
                        format!(", captures [{}]", captures.join(", "))
                    }
                );
            }
        }
    }

    match format {
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "{} file(s) scanned, {} inline task call(s), {} file(s) would change",
                    files.len(),
                    total_calls,
                    changed_files
                );
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "scanned": files.len(),
                    "calls": total_calls,
                    "changed": changed_files,
                    "errors": all_diagnostics.error_count(),
                    "warnings": all_diagnostics.warning_count(),
                    "hints": all_diagnostics.hint_count(),
                    "files": file_rows,
                })
            );
        }
    }

    Ok(())
}
