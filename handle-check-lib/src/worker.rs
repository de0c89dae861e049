//! Worker task that checks one partition of candidates.

use crate::checker::HandleChecker;
use crate::concurrent::{CancelFlag, WorkerMessage};
use crate::protocols::AvailabilityOracle;
use crate::types::{HandleResult, Partition};
use crate::utils::sort_longest_first;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Check every name of `partition` in turn and send one message per name.
///
/// Designed to be spawned as a Tokio task. For each candidate the worker
/// waits for the oracle, then waits until the collector accepts the result,
/// then sleeps the configured delay before moving on. No delay follows the
/// final candidate.
///
/// The worker stops early when:
/// - the cancellation flag is raised (checked between candidates and
///   during the delay),
/// - the collector has gone away (send fails),
/// - a lookup fails under `ErrorPolicy::Abort`; the error is forwarded to
///   the collector first.
pub async fn run_worker<O: AvailabilityOracle>(
    checker: Arc<HandleChecker<O>>,
    partition: Partition,
    results: mpsc::Sender<WorkerMessage>,
    cancel: CancelFlag,
) {
    let Partition {
        worker_id,
        mut names,
    } = partition;
    let delay = checker.config().delay;

    if checker.config().sort_by_length {
        sort_longest_first(&mut names);
    }

    tracing::trace!("Worker {worker_id} started with {} names", names.len());

    let last = names.len().saturating_sub(1);
    for (index, name) in names.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::debug!("Worker {worker_id} cancelled before '{name}'");
            break;
        }

        let message = checker
            .check_name(&name)
            .await
            .map(|available| HandleResult {
                name,
                available,
                worker_id,
            });

        let fatal = match &message {
            Ok(result) => {
                tracing::debug!(
                    worker = worker_id,
                    handle = %result.name,
                    available = result.available,
                    "checked name"
                );
                false
            }
            Err(e) => {
                tracing::error!("Worker {worker_id} stopping: {e}");
                true
            }
        };

        if results.send(message).await.is_err() {
            tracing::debug!("Worker {worker_id}: collector closed the channel");
            break;
        }

        if fatal {
            break;
        }

        if index < last && !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => break,
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandleCheckError;
    use crate::protocols::LookupOutcome;
    use crate::types::CheckConfig;
    use std::time::Duration;

    struct EvenLengthOracle;

    impl AvailabilityOracle for EvenLengthOracle {
        async fn lookup(&self, name: &str) -> Result<LookupOutcome, HandleCheckError> {
            if name.len() % 2 == 0 {
                Ok(LookupOutcome::NotFound)
            } else {
                Ok(LookupOutcome::Exists { status: 200 })
            }
        }
    }

    struct BrokenOracle;

    impl AvailabilityOracle for BrokenOracle {
        async fn lookup(&self, name: &str) -> Result<LookupOutcome, HandleCheckError> {
            Err(HandleCheckError::network(name, "connection refused"))
        }
    }

    fn partition(names: &[&str]) -> Partition {
        Partition {
            worker_id: 3,
            names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn checker<O: AvailabilityOracle>(oracle: O, sort: bool) -> Arc<HandleChecker<O>> {
        let config = CheckConfig::default()
            .with_delay(Duration::ZERO)
            .with_sort_by_length(sort);
        Arc::new(HandleChecker::with_oracle(config, oracle))
    }

    async fn drain(mut rx: mpsc::Receiver<WorkerMessage>) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_emits_one_labeled_result_per_name_longest_first() {
        let (tx, rx) = mpsc::channel(1);
        let worker = tokio::spawn(run_worker(
            checker(EvenLengthOracle, true),
            partition(&["abcd", "ab", "abcde", "abcdef"]),
            tx,
            CancelFlag::new(),
        ));

        let messages = drain(rx).await;
        worker.await.unwrap();

        let results: Vec<HandleResult> = messages.into_iter().map(Result::unwrap).collect();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["abcdef", "abcde", "abcd", "ab"]);
        assert!(results.iter().all(|r| r.worker_id == 3));
        assert_eq!(
            results.iter().map(|r| r.available).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
    }

    #[tokio::test]
    async fn test_keeps_generation_order_without_sort() {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_worker(
            checker(EvenLengthOracle, false),
            partition(&["ab", "abcde", "abcd"]),
            tx,
            CancelFlag::new(),
        ));

        let names: Vec<String> = drain(rx)
            .await
            .into_iter()
            .map(|m| m.unwrap().name)
            .collect();
        assert_eq!(names, vec!["ab", "abcde", "abcd"]);
    }

    #[tokio::test]
    async fn test_forwards_fatal_error_and_stops() {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_worker(
            checker(BrokenOracle, true),
            partition(&["abcd", "efgh", "ijkl"]),
            tx,
            CancelFlag::new(),
        ));

        let messages = drain(rx).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].as_ref().unwrap_err().is_oracle_failure());
    }

    #[tokio::test]
    async fn test_cancelled_worker_sends_nothing() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_worker(
            checker(EvenLengthOracle, true),
            partition(&["abcd", "efgh"]),
            tx,
            cancel,
        ));

        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_candidates_only() {
        let config = CheckConfig::default()
            .with_delay(Duration::from_millis(500))
            .with_sort_by_length(false);
        let checker = Arc::new(HandleChecker::with_oracle(config, EvenLengthOracle));

        let (tx, rx) = mpsc::channel(1);
        let start = tokio::time::Instant::now();
        tokio::spawn(run_worker(
            checker,
            partition(&["a", "b", "c"]),
            tx,
            CancelFlag::new(),
        ));

        assert_eq!(drain(rx).await.len(), 3);
        // Two gaps for three names, applied to short names too
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_stops_worker() {
        let config = CheckConfig::default()
            .with_delay(Duration::from_secs(10))
            .with_sort_by_length(false);
        let checker = Arc::new(HandleChecker::with_oracle(config, EvenLengthOracle));
        let cancel = CancelFlag::new();

        let (tx, mut rx) = mpsc::channel(1);
        let start = tokio::time::Instant::now();
        let worker = tokio::spawn(run_worker(
            checker,
            partition(&["a", "b", "c"]),
            tx,
            cancel.clone(),
        ));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.name, "a");

        cancel.cancel();
        worker.await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(drain(rx).await.is_empty());
    }
}
