// Batch command: many files through the pool at once

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::ValueEnum;
use futures::future::join_all;
use neatify_dispatcher::{Operation, TaskHandle, WorkerPool};
use serde::Serialize;

use super::{read_input, FormatArgs, MinifyArgs};
use crate::output::OutputFormat;
use crate::preset::Preset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchOperation {
    Format,
    Minify,
}

impl BatchOperation {
    fn operation(
        self,
        preset: &Preset,
        format: &FormatArgs,
        minify: &MinifyArgs,
        path: &Path,
    ) -> Operation {
        match self {
            Self::Format => Operation::Format(format.apply(&preset.format, Some(path))),
            Self::Minify => Operation::Minify(minify.apply(preset.minify)),
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    file: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    written: bool,
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    pool: &WorkerPool,
    preset: &Preset,
    output: OutputFormat,
    quiet: bool,
    operation: BatchOperation,
    files: Vec<PathBuf>,
    write: bool,
    format: FormatArgs,
    minify: MinifyArgs,
) -> Result<()> {
    // Everything is submitted before anything is awaited
    let submissions: Vec<(PathBuf, Result<TaskHandle>)> = files
        .into_iter()
        .map(|path| {
            let handle = read_input(Some(&path)).map(|code| {
                pool.submit(operation.operation(preset, &format, &minify, &path), code)
            });
            (path, handle)
        })
        .collect();

    tracing::debug!(files = submissions.len(), queued = pool.queued(), "Submitted batch");

    let (paths, handles): (Vec<_>, Vec<_>) = submissions.into_iter().unzip();
    let results = join_all(handles.into_iter().map(|handle| async move {
        match handle {
            Ok(handle) => handle.await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        }
    }))
    .await;

    let mut entries = Vec::with_capacity(paths.len());
    for (path, result) in paths.into_iter().zip(results) {
        entries.push(finish(&path, result, write));
    }

    let failed = entries.iter().filter(|e| !e.ok).count();
    if output.is_text() {
        print_text(&entries, quiet);
    } else {
        output.print_value(&entries)?;
    }

    if failed > 0 {
        bail!("{} of {} files failed", failed, entries.len());
    }
    Ok(())
}

fn finish(path: &Path, result: Result<String>, write: bool) -> BatchEntry {
    let file = path.display().to_string();
    let result = result.and_then(|out| {
        if write {
            std::fs::write(path, &out)?;
            Ok(None)
        } else {
            Ok(Some(out))
        }
    });

    match result {
        Ok(output) => BatchEntry {
            file,
            ok: true,
            written: output.is_none(),
            output,
            error: None,
        },
        Err(e) => BatchEntry {
            file,
            ok: false,
            output: None,
            error: Some(format!("{:#}", e)),
            written: false,
        },
    }
}

fn print_text(entries: &[BatchEntry], quiet: bool) {
    for entry in entries {
        match (&entry.output, &entry.error) {
            (_, Some(error)) => eprintln!("{}: {}", entry.file, error),
            (Some(output), None) => {
                println!("==> {} <==", entry.file);
                println!("{}", output.trim_end_matches('\n'));
            }
            (None, None) if !quiet => eprintln!("Wrote {}", entry.file),
            (None, None) => {}
        }
    }
}
