// Minify command

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use neatify_dispatcher::{Operation, WorkerPool};
use neatify_formatter::looks_like_html;
use serde::Serialize;

use super::{elapsed_ms, read_input, MinifyArgs};
use crate::output::{format_kb, OutputFormat};
use crate::preset::Preset;

/// Size change produced by a minify run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyStats {
    pub before: usize,
    pub after: usize,
    /// Rounded percentage saved; negative when the output grew
    pub saved_percent: i64,
    pub elapsed_ms: u64,
}

impl MinifyStats {
    pub fn new(before: usize, after: usize, elapsed_ms: u64) -> Self {
        let saved_percent = if before == 0 {
            0
        } else {
            ((before as f64 - after as f64) / before as f64 * 100.0).round() as i64
        };

        Self {
            before,
            after,
            saved_percent,
            elapsed_ms,
        }
    }
}

impl fmt::Display for MinifyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratio = match self.saved_percent {
            p if p > 0 => format!("-{p}"),
            p if p < 0 => format!("+{}", -p),
            _ => "0".to_string(),
        };
        write!(
            f,
            "Minified: {} -> {} ({}%) in {}ms",
            format_kb(self.before),
            format_kb(self.after),
            ratio,
            self.elapsed_ms
        )
    }
}

#[derive(Debug, Serialize)]
struct MinifyReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    stats: MinifyStats,
    output: String,
}

pub async fn run(
    pool: &WorkerPool,
    preset: &Preset,
    output: OutputFormat,
    quiet: bool,
    file: Option<PathBuf>,
    args: MinifyArgs,
) -> Result<()> {
    let code = read_input(file.as_deref())?;
    if !looks_like_html(&code) {
        tracing::warn!("Input does not look like HTML");
    }

    let before = code.len();
    let start = Instant::now();
    let minified = pool
        .run(Operation::Minify(args.apply(preset.minify)), code)
        .await
        .with_context(|| match &file {
            Some(path) => format!("Failed to minify {}", path.display()),
            None => "Failed to minify stdin".to_string(),
        })?;
    let stats = MinifyStats::new(before, minified.len(), elapsed_ms(start.elapsed()));

    if output.is_text() {
        println!("{}", minified);
        if !quiet {
            eprintln!("{}", stats);
        }
        return Ok(());
    }

    output.print_value(&MinifyReport {
        file: file.map(|p| p.display().to_string()),
        stats,
        output: minified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_line() {
        let stats = MinifyStats::new(2048, 1536, 3);
        assert_eq!(stats.saved_percent, 25);
        assert_eq!(stats.to_string(), "Minified: 2.00KB -> 1.50KB (-25%) in 3ms");
    }

    #[test]
    fn test_stats_without_savings() {
        let stats = MinifyStats::new(0, 0, 1);
        assert_eq!(stats.to_string(), "Minified: 0.00KB -> 0.00KB (0%) in 1ms");

        let grown = MinifyStats::new(100, 110, 1);
        assert_eq!(grown.saved_percent, -10);
        assert!(grown.to_string().contains("(+10%)"));
    }
}
