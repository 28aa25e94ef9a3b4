//! Worker pool for formatting tasks
//!
//! Owns a fixed number of workers, queues submissions FIFO and resolves each
//! caller's [`TaskHandle`] when the worker holding its task answers.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::scheduler::Scheduler;
use super::unit::{TaggedResponse, WorkerUnit};
use crate::handler::{FormatterHandler, TaskHandler};
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::task::{DecodeError, Operation, TaskId};

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Name used in log events
    pub name: String,

    /// Number of workers, fixed for the life of the pool
    pub size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "neatify".to_string(),
            size: 2,
        }
    }
}

impl PoolConfig {
    /// Create a pool configuration with `size` workers
    pub fn new(size: usize) -> Self {
        Self::default().with_size(size)
    }

    /// Create configuration from environment variables
    ///
    /// - `NEATIFY_WORKERS`: number of workers (default: 2)
    pub fn from_env() -> Self {
        let size = std::env::var("NEATIFY_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        Self::default().with_size(size)
    }

    /// Set the number of workers (at least one)
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.max(1);
        self
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Why a task's future was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The worker reported a failure, including unknown operations
    #[error("{kind}: {message}")]
    Operation { kind: String, message: String },

    /// Options for a known operation did not decode
    #[error("{kind}: invalid options: {reason}")]
    InvalidOptions { kind: String, reason: String },

    /// The pool was disposed while the task was queued or running
    #[error("worker pool disposed before the task completed")]
    Disposed,
}

/// Point-in-time view of the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub name: String,
    pub workers: usize,
    pub running: bool,
    pub warmed: bool,
    pub in_flight: usize,
    pub queued: usize,
}

type Outcome = Result<String, DispatchError>;

/// Future for one submitted task
///
/// Resolves with the operation's result or the reason it was rejected.
/// Dropping the handle does not withdraw the task.
#[must_use = "a task handle does nothing unless awaited"]
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    outcome: oneshot::Receiver<Outcome>,
}

impl TaskHandle {
    /// Correlation id of the task
    pub fn id(&self) -> TaskId {
        self.id
    }

    fn rejected(id: TaskId, error: DispatchError) -> Self {
        let (tx, outcome) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self { id, outcome }
    }
}

impl Future for TaskHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the pool went away with the task outstanding
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::Disposed)))
    }
}

struct Pending {
    kind: String,
    responder: oneshot::Sender<Outcome>,
}

/// One set of workers, from lazy start to disposal
struct Generation {
    number: u64,
    workers: Vec<WorkerUnit>,
    scheduler: Scheduler<WorkerRequest>,
    pump: JoinHandle<()>,
}

#[derive(Default)]
struct PoolState {
    generation: Option<Generation>,
    generations_started: u64,
    pending: HashMap<TaskId, Pending>,
}

impl PoolState {
    /// Assign queued tasks to idle workers until nothing more can move
    fn dispatch(&mut self) {
        let Some(generation) = self.generation.as_mut() else {
            return;
        };

        loop {
            let assignments = generation.scheduler.schedule();
            if assignments.is_empty() {
                return;
            }

            let mut lost_worker = false;
            for assignment in assignments {
                debug!(worker = assignment.worker, task_id = %assignment.id, "Assigned task");

                if generation.workers[assignment.worker].post(assignment.task) {
                    continue;
                }

                warn!(worker = assignment.worker, task_id = %assignment.id, "Worker is gone");
                generation
                    .scheduler
                    .complete(assignment.worker, assignment.id);
                if let Some(pending) = self.pending.remove(&assignment.id) {
                    let _ = pending.responder.send(Err(DispatchError::Operation {
                        kind: pending.kind,
                        message: "worker unavailable".to_string(),
                    }));
                }
                lost_worker = true;
            }

            if !lost_worker {
                return;
            }
        }
    }

    /// Apply a worker's response
    fn on_response(&mut self, generation: u64, worker: usize, response: WorkerResponse) {
        let Some(current) = self
            .generation
            .as_mut()
            .filter(|current| current.number == generation)
        else {
            debug!(task_id = %response.id, "Dropping response from a disposed worker set");
            return;
        };

        if !current.scheduler.complete(worker, response.id) {
            debug!(worker, task_id = %response.id, "Ignoring stale response");
            return;
        }

        if let Some(pending) = self.pending.remove(&response.id) {
            debug!(worker, task_id = %response.id, ok = response.ok, "Task completed");
            let outcome = response
                .into_result()
                .map_err(|message| DispatchError::Operation {
                    kind: pending.kind,
                    message,
                });
            // The caller may have dropped its handle
            let _ = pending.responder.send(outcome);
        }

        self.dispatch();
    }
}

/// Fixed-size pool of background workers
///
/// Workers start lazily on the first submission (or [`warm_up`]) and are
/// torn down by [`dispose`]; a submission after disposal starts a fresh set.
/// Tasks are assigned in submission order, at most one per worker, and may
/// complete in any order. There is no timeout: a handler that never
/// finishes stalls its caller until the pool is disposed.
///
/// [`warm_up`]: WorkerPool::warm_up
/// [`dispose`]: WorkerPool::dispose
///
/// # Example
///
/// ```ignore
/// use neatify_dispatcher::prelude::*;
///
/// let pool = WorkerPool::new(PoolConfig::new(2));
/// pool.warm_up().await;
///
/// let pretty = pool
///     .run(Operation::Format(FormatOptions::default()), "<div>  <b>x</b></div>")
///     .await?;
///
/// pool.dispose();
/// ```
pub struct WorkerPool {
    config: PoolConfig,
    handler: Arc<dyn TaskHandler>,
    state: Arc<Mutex<PoolState>>,
    warmed: AtomicBool,
}

impl WorkerPool {
    /// Create a pool running the formatter crate
    pub fn new(config: PoolConfig) -> Self {
        Self::with_handler(config, FormatterHandler)
    }

    /// Create a pool whose workers run `handler`
    pub fn with_handler(config: PoolConfig, handler: impl TaskHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            state: Arc::new(Mutex::new(PoolState::default())),
            warmed: AtomicBool::new(false),
        }
    }

    /// Create a pool configured from the environment
    pub fn from_env() -> Self {
        Self::new(PoolConfig::from_env())
    }

    /// Enqueue a typed operation
    ///
    /// The task is queued before this returns, so submission order is
    /// assignment order.
    ///
    /// # Panics
    ///
    /// Starting workers requires a tokio runtime.
    pub fn submit(&self, operation: Operation, code: impl Into<String>) -> TaskHandle {
        let id = TaskId::new();
        if let Err(DecodeError::InvalidOptions { kind, reason }) = operation.validate() {
            return TaskHandle::rejected(id, DispatchError::InvalidOptions { kind, reason });
        }
        match WorkerRequest::new(id, &operation, code) {
            Ok(request) => self.enqueue(request),
            Err(e) => TaskHandle::rejected(
                id,
                DispatchError::InvalidOptions {
                    kind: operation.kind().to_string(),
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Enqueue an operation by name with a free-form option map
    ///
    /// Options of known operations are checked here; unknown kinds are
    /// forwarded and rejected by the worker.
    pub fn submit_raw(
        &self,
        kind: &str,
        code: impl Into<String>,
        options: serde_json::Value,
    ) -> TaskHandle {
        let id = TaskId::new();
        let options = (!options.is_null()).then_some(options);

        if let Err(DecodeError::InvalidOptions { kind, reason }) =
            Operation::decode(kind, options.as_ref())
        {
            return TaskHandle::rejected(id, DispatchError::InvalidOptions { kind, reason });
        }

        self.enqueue(WorkerRequest::raw(id, kind, code, options))
    }

    /// Run a typed operation to completion
    pub async fn run(
        &self,
        operation: Operation,
        code: impl Into<String>,
    ) -> Result<String, DispatchError> {
        self.submit(operation, code).await
    }

    /// Run an operation by name to completion
    pub async fn run_raw(
        &self,
        kind: &str,
        code: impl Into<String>,
        options: serde_json::Value,
    ) -> Result<String, DispatchError> {
        self.submit_raw(kind, code, options).await
    }

    /// Start the workers if needed and ping each of them once
    ///
    /// Returns `true` only if every ping succeeded. Never resolves if a
    /// worker never answers.
    #[instrument(skip(self), fields(pool = %self.config.name))]
    pub async fn warm_up(&self) -> bool {
        let pings: Vec<TaskHandle> = (0..self.config.size)
            .map(|_| self.submit(Operation::Ping, ""))
            .collect();

        let warmed = join_all(pings).await.iter().all(Result::is_ok);
        self.warmed.store(warmed, Ordering::Relaxed);

        if warmed {
            info!(workers = self.config.size, "Worker pool warmed up");
        } else {
            warn!(workers = self.config.size, "Worker pool warm-up failed");
        }
        warmed
    }

    /// Outcome of the last warm-up
    pub fn is_warmed(&self) -> bool {
        self.warmed.load(Ordering::Relaxed)
    }

    /// Terminate all workers immediately
    ///
    /// Queued and in-flight tasks are abandoned and their handles resolve
    /// with [`DispatchError::Disposed`]. Calling this again is a no-op.
    #[instrument(skip(self), fields(pool = %self.config.name))]
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        let Some(mut generation) = state.generation.take() else {
            return;
        };

        for worker in &generation.workers {
            worker.terminate();
        }
        generation.pump.abort();

        let drained = generation.scheduler.drain();
        for (_, pending) in state.pending.drain() {
            let _ = pending.responder.send(Err(DispatchError::Disposed));
        }

        info!(
            in_flight = drained.in_flight.len(),
            queued = drained.queued.len(),
            "Worker pool disposed"
        );
    }

    /// Configured number of workers
    pub fn worker_count(&self) -> usize {
        self.config.size
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Whether workers are currently started
    pub fn is_running(&self) -> bool {
        self.state.lock().generation.is_some()
    }

    /// Number of tasks currently held by workers
    pub fn in_flight(&self) -> usize {
        self.state
            .lock()
            .generation
            .as_ref()
            .map(|g| g.scheduler.in_flight())
            .unwrap_or(0)
    }

    /// Number of tasks waiting for a worker
    pub fn queued(&self) -> usize {
        self.state
            .lock()
            .generation
            .as_ref()
            .map(|g| g.scheduler.queued())
            .unwrap_or(0)
    }

    /// Current counters
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        let (in_flight, queued) = state
            .generation
            .as_ref()
            .map(|g| (g.scheduler.in_flight(), g.scheduler.queued()))
            .unwrap_or((0, 0));

        PoolSnapshot {
            name: self.config.name.clone(),
            workers: self.config.size,
            running: state.generation.is_some(),
            warmed: self.is_warmed(),
            in_flight,
            queued,
        }
    }

    fn enqueue(&self, request: WorkerRequest) -> TaskHandle {
        let id = request.id;
        let (responder, outcome) = oneshot::channel();

        let mut state = self.state.lock();
        self.ensure_workers(&mut state);

        debug!(pool = %self.config.name, task_id = %id, kind = %request.kind, "Enqueued task");
        state.pending.insert(
            id,
            Pending {
                kind: request.kind.clone(),
                responder,
            },
        );
        if let Some(generation) = state.generation.as_mut() {
            generation.scheduler.enqueue(id, request);
        }
        state.dispatch();

        TaskHandle { id, outcome }
    }

    fn ensure_workers(&self, state: &mut PoolState) {
        if state.generation.is_some() {
            return;
        }

        state.generations_started += 1;
        let number = state.generations_started;
        let (responses, inbox) = mpsc::unbounded_channel();

        let workers = (0..self.config.size)
            .map(|index| WorkerUnit::spawn(index, Arc::clone(&self.handler), responses.clone()))
            .collect();
        let pump = tokio::spawn(pump_responses(Arc::downgrade(&self.state), number, inbox));

        info!(
            pool = %self.config.name,
            workers = self.config.size,
            generation = number,
            "Starting worker pool"
        );

        state.generation = Some(Generation {
            number,
            workers,
            scheduler: Scheduler::new(self.config.size),
            pump,
        });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Feed worker responses into the pool state
async fn pump_responses(
    state: Weak<Mutex<PoolState>>,
    generation: u64,
    mut inbox: mpsc::UnboundedReceiver<TaggedResponse>,
) {
    while let Some((worker, response)) = inbox.recv().await {
        let Some(state) = state.upgrade() else {
            break;
        };
        state.lock().on_response(generation, worker, response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.name, "neatify");
        assert_eq!(config.size, 2);
    }

    #[test]
    fn test_config_builder() {
        let config = PoolConfig::new(0).with_name("html");
        assert_eq!(config.size, 1);
        assert_eq!(config.name, "html");

        assert_eq!(PoolConfig::new(4).size, 4);
    }

    #[test]
    fn test_dispatch_error_messages() {
        let err = DispatchError::Operation {
            kind: "format".into(),
            message: "syntax error on line 1: unclosed element <div>".into(),
        };
        assert_eq!(
            err.to_string(),
            "format: syntax error on line 1: unclosed element <div>"
        );

        let err = DispatchError::InvalidOptions {
            kind: "minify".into(),
            reason: "expected a boolean".into(),
        };
        assert_eq!(err.to_string(), "minify: invalid options: expected a boolean");
    }

    #[tokio::test]
    async fn test_rejected_handle_resolves_immediately() {
        let handle = TaskHandle::rejected(TaskId::new(), DispatchError::Disposed);
        assert_eq!(handle.await, Err(DispatchError::Disposed));
    }

    #[tokio::test]
    async fn test_pool_starts_lazily() {
        let pool = WorkerPool::new(PoolConfig::new(2));
        assert!(!pool.is_running());
        assert!(!pool.is_warmed());

        let result = pool.run(Operation::Ping, "").await;
        assert_eq!(result, Ok("pong".to_string()));
        assert!(pool.is_running());

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.workers, 2);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.queued, 0);
    }

    #[tokio::test]
    async fn test_stale_generation_responses_are_dropped() {
        let pool = WorkerPool::new(PoolConfig::new(1));
        let handle = pool.submit(Operation::Ping, "");
        let id = handle.id();

        {
            let mut state = pool.state.lock();
            let number = state.generation.as_ref().map(|g| g.number).unwrap();
            // Unknown generation: ignored, task stays in flight
            state.on_response(number + 1, 0, WorkerResponse::success(id, "forged"));
            assert_eq!(
                state.generation.as_ref().unwrap().scheduler.current(0),
                Some(id)
            );
            // Wrong id on the right generation: ignored too
            state.on_response(number, 0, WorkerResponse::success(TaskId::new(), "forged"));
            assert!(state.pending.contains_key(&id));
        }

        assert_eq!(handle.await, Ok("pong".to_string()));
    }
}
