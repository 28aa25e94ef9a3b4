//! Worker pool for formatting tasks
//!
//! This module provides:
//! - [`WorkerPool`] - Fixed-size pool with per-task futures
//! - [`Scheduler`] - FIFO queue with round-robin assignment to idle workers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WorkerPool                            │
//! │  submit() ──► pending: id → responder                       │
//! │         │                                                    │
//! │         ▼                                                    │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                   Scheduler                          │    │
//! │  │  queue [t4 t5 t6]   slots [t1] [t2] [  ]  cursor ──► │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │         │ post                          ▲ (worker, response) │
//! │         ▼                               │                    │
//! │  [Worker 0] [Worker 1] ... [Worker N-1] ──► response pump    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use neatify_dispatcher::worker::{PoolConfig, WorkerPool};
//!
//! let pool = WorkerPool::new(PoolConfig::new(4).with_name("batch"));
//!
//! let handles: Vec<_> = files
//!     .iter()
//!     .map(|code| pool.submit(Operation::Minify(MinifyOptions::default()), code.clone()))
//!     .collect();
//!
//! for result in futures::future::join_all(handles).await {
//!     println!("{}", result?);
//! }
//!
//! pool.dispose();
//! ```

mod pool;
mod scheduler;
mod unit;

pub use pool::{DispatchError, PoolConfig, PoolSnapshot, TaskHandle, WorkerPool};
pub use scheduler::{Assignment, Drained, Scheduler};
