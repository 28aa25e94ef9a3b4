// Warm-up command

use std::time::Instant;

use anyhow::{bail, Result};
use neatify_dispatcher::WorkerPool;
use serde::Serialize;

use super::elapsed_ms;
use crate::output::{print_field, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WarmUpReport {
    pool: String,
    workers: usize,
    warmed: bool,
    elapsed_ms: u64,
}

pub async fn run(pool: &WorkerPool, output: OutputFormat) -> Result<()> {
    let start = Instant::now();
    let warmed = pool.warm_up().await;

    let report = WarmUpReport {
        pool: pool.config().name.clone(),
        workers: pool.worker_count(),
        warmed,
        elapsed_ms: elapsed_ms(start.elapsed()),
    };

    if output.is_text() {
        print_field("Pool", &report.pool);
        print_field("Workers", &report.workers.to_string());
        print_field("Warmed", if report.warmed { "yes" } else { "no" });
        print_field("Elapsed", &format!("{}ms", report.elapsed_ms));
    } else {
        output.print_value(&report)?;
    }

    if !warmed {
        bail!("Worker pool failed to warm up");
    }
    Ok(())
}
