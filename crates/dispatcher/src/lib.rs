//! # Neatify Dispatcher
//!
//! Runs formatting jobs on a fixed-size pool of background workers so the
//! caller never blocks on a slow parse.
//!
//! ## Features
//!
//! - **FIFO scheduling**: tasks are assigned in submission order, at most one per worker
//! - **Per-task futures**: every submission resolves or rejects exactly once
//! - **Correlation ids**: workers echo ids, so responses may arrive in any order
//! - **Lifecycle**: lazy start, warm-up pings, immediate disposal
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WorkerPool                            │
//! │  (queue, round-robin assignment, id → responder map)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ WorkerRequest
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Worker tasks (N)                         │
//! │  (decode operation, run TaskHandler, echo id)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FormatterHandler                          │
//! │  (neatify-formatter: format, minify, ping)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use neatify_dispatcher::prelude::*;
//!
//! let pool = WorkerPool::from_env();
//!
//! let pretty = pool
//!     .run(Operation::Format(FormatOptions::default()), "<div>  <b>x</b></div>")
//!     .await?;
//! assert_eq!(pretty, "<div><b>x</b></div>\n");
//!
//! let err = pool.run_raw("frobnicate", "", serde_json::Value::Null).await;
//! assert_eq!(err.unwrap_err().to_string(), "frobnicate: unknown operation");
//! ```

pub mod handler;
pub mod protocol;
pub mod task;
pub mod worker;

/// Prelude for common imports
pub mod prelude {
    pub use crate::handler::{FormatterHandler, TaskHandler, TaskResult};
    pub use crate::task::{Operation, TaskId};
    pub use crate::worker::{DispatchError, PoolConfig, TaskHandle, WorkerPool};
    pub use neatify_formatter::{FormatOptions, MinifyOptions, Parser, WhitespaceSensitivity};
}

// Re-export key types at crate root
pub use handler::{FormatterHandler, TaskHandler, TaskResult, PONG};
pub use protocol::{WorkerRequest, WorkerResponse};
pub use task::{DecodeError, Operation, TaskId};
pub use worker::{DispatchError, PoolConfig, PoolSnapshot, TaskHandle, WorkerPool};
