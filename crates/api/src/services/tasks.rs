//! Centralized fire-and-forget dispatch for best-effort side effects.

use std::future::Future;

use tracing::warn;

/// Spawn a side effect whose failure must never fail the caller.
///
/// The error is logged under the given task label and otherwise dropped;
/// the returned handle is intentionally discarded.
pub fn spawn_best_effort<T, E, F>(task: &'static str, fut: F)
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            warn!(task, error = %e, "Best-effort side effect failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_successful_task_runs_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        spawn_best_effort("test task", async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<(), String>(())
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failing_task_does_not_propagate() {
        spawn_best_effort("failing task", async move {
            Err::<(), String>("expected failure".to_string())
        });

        // Nothing to assert beyond "the caller survives".
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
