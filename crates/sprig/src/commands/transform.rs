//! Transform command - rewrite one file and emit its source map.

use anyhow::{Context, Result};
use clap::Args;
use sprig_diagnostics::{DiagnosticEmitter, JsonEmitter, TerminalEmitter};
use std::fs;
use std::path::PathBuf;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Input source file (.ts, .tsx, .js, .jsx)
    pub input: PathBuf,

    /// Write the rewritten source here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the source map here (defaults to `<output>.map` when --output
    /// is given)
    #[arg(long)]
    pub map: Option<PathBuf>,
}

pub fn run(args: TransformArgs, format: OutputFormat, use_color: bool, quiet: bool) -> Result<()> {
    let code = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let id = args.input.to_string_lossy();

    let report = sprig_transform::transform_file(&code, &id)?;

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

    let changed = report.output.is_some();
    let (rewritten, map) = match report.output {
        Some(output) => (output.code, Some(output.map)),
        // No edits: downstream sees the original source.
        None => (code, None),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rewritten)
                .with_context(|| format!("failed to write {}", path.display()))?;

            if let Some(map_json) = &map {
                let map_path = args
                    .map
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(format!("{}.map", path.display())));
                fs::write(&map_path, map_json)
                    .with_context(|| format!("failed to write {}", map_path.display()))?;
            }

            if !quiet {
                match format {
                    OutputFormat::Text => {
                        println!(
                            "{} -> {} ({} inline task call(s){})",
                            args.input.display(),
                            path.display(),
                            report.calls.len(),
                            if changed { "" } else { ", unchanged" },
                        );
                    }
                    OutputFormat::Json => {
                        println!(
                            "{}",
                            serde_json::json!({
                                "input": args.input.display().to_string(),
                                "output": path.display().to_string(),
                                "changed": changed,
                                "calls": report.calls.len(),
                            })
                        );
                    }
                }
            }
        }
        None => {
            print!("{}", rewritten);
            if let (Some(map_path), Some(map_json)) = (&args.map, &map) {
                fs::write(map_path, map_json)
                    .with_context(|| format!("failed to write {}", map_path.display()))?;
            }
        }
    }

    Ok(())
}
