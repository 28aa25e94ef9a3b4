//! Worker-side operation handlers
//!
//! A [`TaskHandler`] is what a worker runs for each decoded request. The
//! default [`FormatterHandler`] runs the formatter crate on tokio's blocking
//! pool; tests and embedders can plug in any handler, including a plain
//! async closure.

use std::future::Future;

use async_trait::async_trait;
use neatify_formatter::{format, minify_html};

use crate::task::Operation;

/// Acknowledgement returned by `ping`
pub const PONG: &str = "pong";

/// Handler outcome: the result string or an error message
pub type TaskResult = Result<String, String>;

/// Executes decoded operations inside a worker
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Run one operation on `code`
    async fn handle(&self, operation: Operation, code: String) -> TaskResult;
}

#[async_trait]
impl<F, Fut> TaskHandler for F
where
    F: Fn(Operation, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn handle(&self, operation: Operation, code: String) -> TaskResult {
        (self)(operation, code).await
    }
}

/// Runs `format` and `minify` with the formatter crate
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatterHandler;

#[async_trait]
impl TaskHandler for FormatterHandler {
    async fn handle(&self, operation: Operation, code: String) -> TaskResult {
        match operation {
            Operation::Ping => Ok(PONG.to_string()),
            Operation::Format(options) => {
                tokio::task::spawn_blocking(move || {
                    format(&code, &options).map_err(|e| e.to_string())
                })
                .await
                .map_err(|e| e.to_string())?
            }
            Operation::Minify(options) => {
                tokio::task::spawn_blocking(move || minify_html(&code, &options))
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatify_formatter::{FormatOptions, MinifyOptions, Parser};

    #[tokio::test]
    async fn test_ping() {
        let result = FormatterHandler.handle(Operation::Ping, String::new()).await;
        assert_eq!(result, Ok("pong".to_string()));
    }

    #[tokio::test]
    async fn test_format_html() {
        let result = FormatterHandler
            .handle(
                Operation::Format(FormatOptions::default()),
                "<div>  <b>x</b></div>".to_string(),
            )
            .await;
        assert_eq!(result, Ok("<div><b>x</b></div>\n".to_string()));
    }

    #[tokio::test]
    async fn test_format_error_is_message() {
        let result = FormatterHandler
            .handle(
                Operation::Format(FormatOptions::default().with_parser(Parser::Json)),
                "{".to_string(),
            )
            .await;
        assert!(result.unwrap_err().starts_with("invalid JSON"));
    }

    #[tokio::test]
    async fn test_minify() {
        let result = FormatterHandler
            .handle(
                Operation::Minify(MinifyOptions::default()),
                "<!-- c --><div>  a  </div>".to_string(),
            )
            .await;
        assert_eq!(result, Ok("<div> a </div>".to_string()));
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let handler = |operation: Operation, code: String| async move {
            Ok::<_, String>(format!("{}:{}", operation.kind(), code))
        };
        let result = handler.handle(Operation::Ping, "x".to_string()).await;
        assert_eq!(result, Ok("ping:x".to_string()));
    }
}
