//! A single background worker
//!
//! Each worker is a tokio task with its own request channel. It processes
//! one request at a time and reports every answer, tagged with its index,
//! on the pool's shared response channel.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::handler::TaskHandler;
use crate::protocol::{WorkerRequest, WorkerResponse};

/// Response tagged with the index of the worker that produced it
pub(crate) type TaggedResponse = (usize, WorkerResponse);

/// Handle to a running worker task
pub(crate) struct WorkerUnit {
    index: usize,
    requests: mpsc::UnboundedSender<WorkerRequest>,
    task: JoinHandle<()>,
}

impl WorkerUnit {
    /// Start worker `index`
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        index: usize,
        handler: Arc<dyn TaskHandler>,
        responses: mpsc::UnboundedSender<TaggedResponse>,
    ) -> Self {
        let (requests, inbox) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(index, handler, inbox, responses));

        Self {
            index,
            requests,
            task,
        }
    }

    /// Hand a request to the worker; `false` if the worker is gone
    pub(crate) fn post(&self, request: WorkerRequest) -> bool {
        trace!(worker = self.index, task_id = %request.id, kind = %request.kind, "Posting request");
        self.requests.send(request).is_ok()
    }

    /// Stop the worker immediately, abandoning its current request
    pub(crate) fn terminate(&self) {
        self.task.abort();
    }
}

async fn run(
    index: usize,
    handler: Arc<dyn TaskHandler>,
    mut inbox: mpsc::UnboundedReceiver<WorkerRequest>,
    responses: mpsc::UnboundedSender<TaggedResponse>,
) {
    debug!(worker = index, "Worker started");

    while let Some(request) = inbox.recv().await {
        let response = execute(handler.as_ref(), request).await;
        if responses.send((index, response)).is_err() {
            break;
        }
    }

    debug!(worker = index, "Worker exited");
}

/// Decode and run one request, always producing a response for its id
pub(crate) async fn execute(handler: &dyn TaskHandler, request: WorkerRequest) -> WorkerResponse {
    let operation = match request.operation() {
        Ok(operation) => operation,
        Err(e) => return WorkerResponse::failure(request.id, e.to_string()),
    };

    let WorkerRequest { id, code, .. } = request;
    match AssertUnwindSafe(handler.handle(operation, code))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => WorkerResponse::success(id, result),
        Ok(Err(error)) => WorkerResponse::failure(id, error),
        Err(_) => {
            warn!(task_id = %id, "Task handler panicked");
            WorkerResponse::failure(id, "worker panicked")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FormatterHandler, TaskResult};
    use crate::task::{Operation, TaskId};
    use serde_json::json;

    #[tokio::test]
    async fn test_execute_echoes_id() {
        let request = WorkerRequest::new(TaskId::new(), &Operation::Ping, "").unwrap();
        let id = request.id;

        let response = execute(&FormatterHandler, request).await;
        assert_eq!(response, WorkerResponse::success(id, "pong"));
    }

    #[tokio::test]
    async fn test_execute_unknown_operation() {
        let request = WorkerRequest::raw(TaskId::new(), "shout", "hi", None);
        let id = request.id;

        let response = execute(&FormatterHandler, request).await;
        assert_eq!(response, WorkerResponse::failure(id, "unknown operation"));
    }

    #[tokio::test]
    async fn test_execute_invalid_options() {
        let request = WorkerRequest::raw(
            TaskId::new(),
            "minify",
            "",
            Some(json!({ "removeComments": "yes" })),
        );

        let response = execute(&FormatterHandler, request).await;
        assert!(!response.ok);
        assert!(response.error.unwrap().starts_with("invalid options"));
    }

    #[tokio::test]
    async fn test_execute_catches_panics() {
        let handler = |_: Operation, _: String| async move {
            if true {
                panic!("handler bug");
            }
            TaskResult::Ok(String::new())
        };
        let request = WorkerRequest::new(TaskId::new(), &Operation::Ping, "").unwrap();
        let id = request.id;

        let response = execute(&handler, request).await;
        assert_eq!(response, WorkerResponse::failure(id, "worker panicked"));
    }

    #[tokio::test]
    async fn test_worker_processes_requests_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = WorkerUnit::spawn(3, Arc::new(FormatterHandler), tx);

        let first = WorkerRequest::new(TaskId::new(), &Operation::Ping, "").unwrap();
        let second = WorkerRequest::raw(TaskId::new(), "nope", "", None);
        let (first_id, second_id) = (first.id, second.id);
        assert!(worker.post(first));
        assert!(worker.post(second));

        let (index, response) = rx.recv().await.unwrap();
        assert_eq!(index, 3);
        assert_eq!(response.id, first_id);
        assert!(response.ok);

        let (_, response) = rx.recv().await.unwrap();
        assert_eq!(response.id, second_id);
        assert!(!response.ok);

        worker.terminate();
    }

    #[tokio::test]
    async fn test_terminated_worker_rejects_posts() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let worker = WorkerUnit::spawn(0, Arc::new(FormatterHandler), tx);
        worker.terminate();

        // Abort is observed once the runtime polls the cancelled task
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let request = WorkerRequest::new(TaskId::new(), &Operation::Ping, "").unwrap();
        assert!(!worker.post(request));
    }
}
