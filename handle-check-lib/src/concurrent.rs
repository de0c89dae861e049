//! Concurrent processing of a candidate list.
//!
//! The candidate list is split into one partition per worker, each worker
//! runs as its own Tokio task, and all of them feed a single capacity-1
//! channel drained by the collector.

use crate::checker::HandleChecker;
use crate::collector::{collect_results, ResultSink};
use crate::error::HandleCheckError;
use crate::partition::split_into_partitions;
use crate::protocols::{AvailabilityOracle, HttpOracle};
use crate::types::{CheckConfig, HandleResult, RunSummary};
use crate::worker::run_worker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinSet;

/// Message carried from a worker to the collector.
pub type WorkerMessage = Result<HandleResult, HandleCheckError>;

/// Capacity of the result channel. A send completes only once the previous
/// result has been taken by the collector.
const CONDUIT_CAPACITY: usize = 1;

/// Shared cancellation signal.
///
/// Raised by the caller (e.g. on Ctrl-C) through
/// [`ConcurrentProcessor::cancel_flag`]. Each run works on a child of that
/// flag, which the orchestrator raises on a fatal error without touching the
/// caller's flag. Workers poll it between candidates, the collector between
/// receives.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<CancelInner>,
    parent: Option<Arc<CancelInner>>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelInner {
    fn is_set(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent cancel() is not missed
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that is raised whenever this one is, but whose own
    /// `cancel()` leaves this one untouched. Links one level only.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(CancelInner::default()),
            parent: Some(Arc::clone(&self.inner)),
        }
    }

    /// Raise the flag and wake everyone waiting on it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_set() || self.parent.as_ref().is_some_and(|p| p.is_set())
    }

    /// Resolve once the flag (or its parent) is raised.
    pub async fn cancelled(&self) {
        match &self.parent {
            Some(parent) => {
                tokio::select! {
                    _ = self.inner.wait() => {}
                    _ = parent.wait() => {}
                }
            }
            None => self.inner.wait().await,
        }
    }
}

/// Fan-out/fan-in orchestrator over a fixed pool of workers.
///
/// # Example
///
/// ```rust,no_run
/// use handle_check_lib::{
///     generate_powerset, CheckConfig, ConcurrentProcessor, LineReporter, OutputFormat,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = CheckConfig::default().with_workers(4);
///     let processor = ConcurrentProcessor::new(config)?;
///     let candidates = generate_powerset("rustacean")?;
///     let mut reporter = LineReporter::stdout(false, OutputFormat::Text);
///     let summary = processor.run(&candidates, &mut reporter).await?;
///     eprintln!("{} of {} available", summary.available, summary.checked);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ConcurrentProcessor<O = HttpOracle> {
    checker: Arc<HandleChecker<O>>,
    cancel: CancelFlag,
}

impl ConcurrentProcessor<HttpOracle> {
    /// Create a processor backed by the HTTP profile oracle.
    pub fn new(config: CheckConfig) -> Result<Self, HandleCheckError> {
        Ok(Self::with_checker(HandleChecker::with_config(config)?))
    }
}

impl<O: AvailabilityOracle> ConcurrentProcessor<O> {
    /// Create a processor around an existing checker.
    pub fn with_checker(checker: HandleChecker<O>) -> Self {
        Self {
            checker: Arc::new(checker),
            cancel: CancelFlag::new(),
        }
    }

    /// Handle that cancels the run when raised.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CheckConfig {
        self.checker.config()
    }

    pub fn checker(&self) -> &HandleChecker<O> {
        &self.checker
    }

    /// Check every candidate and stream the results into `sink`.
    ///
    /// Spawns one worker per partition (empty partitions included) and
    /// returns once the collector has received one result per candidate.
    ///
    /// # Errors
    ///
    /// On any collector error (fatal oracle failure, cancellation, sink
    /// I/O) every worker still running is stopped and aborted, and the
    /// error is returned. Results reported before the failure stay
    /// reported. The processor stays usable for later runs unless the
    /// caller raised [`Self::cancel_flag`].
    pub async fn run<S: ResultSink + ?Sized>(
        &self,
        candidates: &[String],
        sink: &mut S,
    ) -> Result<RunSummary, HandleCheckError> {
        let workers = self.checker.config().workers;
        let partitions = split_into_partitions(candidates, workers);

        tracing::debug!(
            candidates = candidates.len(),
            workers = partitions.len(),
            "starting workers"
        );

        // Stops this run's workers without cancelling the processor
        let run_cancel = self.cancel.child();

        let (tx, mut rx) = mpsc::channel(CONDUIT_CAPACITY);
        let mut tasks = JoinSet::new();
        for partition in partitions {
            tasks.spawn(run_worker(
                Arc::clone(&self.checker),
                partition,
                tx.clone(),
                run_cancel.clone(),
            ));
        }
        // Only workers hold senders now, so the channel closes when they all exit
        drop(tx);

        match collect_results(&mut rx, candidates.len(), sink, &run_cancel).await {
            Ok(summary) => {
                // Every worker has sent its final result; dropping the set
                // reaps whatever is left of them.
                tracing::debug!(
                    checked = summary.checked,
                    available = summary.available,
                    "run complete"
                );
                Ok(summary)
            }
            Err(e) => {
                run_cancel.cancel();
                tasks.abort_all();
                drop(rx);
                while tasks.join_next().await.is_some() {}
                tracing::debug!("all workers stopped after: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::LineReporter;
    use crate::protocols::LookupOutcome;
    use crate::types::{ErrorPolicy, OutputFormat};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Oracle that records every lookup and answers from a predicate.
    struct RecordingOracle {
        lookups: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingOracle {
        fn new() -> Self {
            Self {
                lookups: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(name: &str) -> Self {
            Self {
                lookups: Mutex::new(Vec::new()),
                fail_on: Some(name.to_string()),
            }
        }
    }

    impl AvailabilityOracle for RecordingOracle {
        async fn lookup(&self, name: &str) -> Result<LookupOutcome, HandleCheckError> {
            self.lookups.lock().unwrap().push(name.to_string());
            if self.fail_on.as_deref() == Some(name) {
                return Err(HandleCheckError::network(name, "connection reset"));
            }
            if name.contains('z') {
                Ok(LookupOutcome::Exists { status: 200 })
            } else {
                Ok(LookupOutcome::NotFound)
            }
        }
    }

    /// Sink that keeps every result it is given.
    #[derive(Default)]
    struct Recorder(Vec<HandleResult>);

    impl ResultSink for Recorder {
        fn report(&mut self, result: &HandleResult) -> std::io::Result<()> {
            self.0.push(result.clone());
            Ok(())
        }
    }

    fn processor(workers: usize, oracle: RecordingOracle) -> ConcurrentProcessor<RecordingOracle> {
        let config = CheckConfig::default()
            .with_workers(workers)
            .with_delay(Duration::ZERO);
        ConcurrentProcessor::with_checker(HandleChecker::with_oracle(config, oracle))
    }

    fn candidates(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("name{i:02}")).collect()
    }

    #[tokio::test]
    async fn test_every_candidate_reported_once() {
        let input = candidates(9);
        for workers in 1..=input.len() + 5 {
            let processor = processor(workers, RecordingOracle::new());
            let mut recorder = Recorder::default();
            let summary = processor.run(&input, &mut recorder).await.unwrap();

            assert_eq!(summary.checked, input.len(), "workers={workers}");
            let mut names: Vec<String> = recorder.0.iter().map(|r| r.name.clone()).collect();
            names.sort();
            assert_eq!(names, input, "workers={workers}");
            assert!(recorder.0.iter().all(|r| r.worker_id < workers));
        }
    }

    #[tokio::test]
    async fn test_each_candidate_owned_by_its_partition_worker() {
        let input = candidates(10);
        let processor = processor(4, RecordingOracle::new());
        let mut recorder = Recorder::default();
        processor.run(&input, &mut recorder).await.unwrap();

        let expected: HashMap<String, usize> = split_into_partitions(&input, 4)
            .into_iter()
            .flat_map(|p| {
                let id = p.worker_id;
                p.names.into_iter().map(move |n| (n, id))
            })
            .collect();

        for result in &recorder.0 {
            assert_eq!(expected[&result.name], result.worker_id);
        }
        assert_eq!(processor.checker().oracle().lookups.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_per_worker_order_preserved() {
        let input: Vec<String> = ["aaaaaa", "bbbbb", "cccc", "dddddd", "eeeee", "ffff"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let processor = processor(2, RecordingOracle::new());
        let mut recorder = Recorder::default();
        processor.run(&input, &mut recorder).await.unwrap();

        let worker_names = |id: usize| -> Vec<String> {
            recorder
                .0
                .iter()
                .filter(|r| r.worker_id == id)
                .map(|r| r.name.clone())
                .collect()
        };
        assert_eq!(worker_names(0), vec!["aaaaaa", "bbbbb", "cccc"]);
        assert_eq!(worker_names(1), vec!["dddddd", "eeeee", "ffff"]);
    }

    #[tokio::test]
    async fn test_fatal_failure_aborts_run() {
        let input = candidates(12);
        let processor = processor(3, RecordingOracle::failing_on("name05"));
        let mut recorder = Recorder::default();

        let err = processor.run(&input, &mut recorder).await.unwrap_err();
        assert!(err.is_oracle_failure());
        assert!(err.to_string().contains("name05"));
        assert!(!processor.cancel_flag().is_cancelled());
        assert!(recorder.0.len() < input.len());
    }

    /// Fails the first lookup only.
    #[derive(Default)]
    struct FailsOnceOracle {
        failed: AtomicBool,
    }

    impl AvailabilityOracle for FailsOnceOracle {
        async fn lookup(&self, name: &str) -> Result<LookupOutcome, HandleCheckError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(HandleCheckError::network(name, "connection reset"));
            }
            Ok(LookupOutcome::NotFound)
        }
    }

    #[tokio::test]
    async fn test_processor_reusable_after_failed_run() {
        let config = CheckConfig::default()
            .with_workers(1)
            .with_delay(Duration::ZERO);
        let processor = ConcurrentProcessor::with_checker(HandleChecker::with_oracle(
            config,
            FailsOnceOracle::default(),
        ));
        let input = vec!["abcd".to_string(), "efgh".to_string()];

        let mut recorder = Recorder::default();
        let err = processor.run(&input, &mut recorder).await.unwrap_err();
        assert!(matches!(err, HandleCheckError::NetworkError { ref name, .. } if name == "abcd"));

        let mut recorder = Recorder::default();
        let summary = processor.run(&input, &mut recorder).await.unwrap();
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.available, 2);
    }

    #[test]
    fn test_child_flag_follows_parent_only() {
        let parent = CancelFlag::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_cancelled_resolves_on_parent_cancel() {
        let parent = CancelFlag::new();
        let waiter = {
            let child = parent.child();
            tokio::spawn(async move { child.cancelled().await })
        };
        tokio::task::yield_now().await;
        parent.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("child should observe parent cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_keep_going_reports_failure_as_unavailable() {
        let input = candidates(6);
        let config = CheckConfig::default()
            .with_workers(2)
            .with_delay(Duration::ZERO)
            .with_error_policy(ErrorPolicy::TreatAsTaken);
        let processor = ConcurrentProcessor::with_checker(HandleChecker::with_oracle(
            config,
            RecordingOracle::failing_on("name02"),
        ));

        let mut recorder = Recorder::default();
        let summary = processor.run(&input, &mut recorder).await.unwrap();
        assert_eq!(summary.checked, 6);
        assert_eq!(summary.unavailable, 1);
        let failed = recorder.0.iter().find(|r| r.name == "name02").unwrap();
        assert!(!failed.available);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let processor = processor(2, RecordingOracle::new());
        processor.cancel_flag().cancel();

        let mut reporter = LineReporter::new(Vec::new(), false, OutputFormat::Text);
        let err = processor
            .run(&candidates(4), &mut reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, HandleCheckError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let processor = processor(3, RecordingOracle::new());
        let mut recorder = Recorder::default();
        let summary = processor.run(&[], &mut recorder).await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let flag = CancelFlag::new();
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.cancelled().await })
        };
        tokio::task::yield_now().await;
        flag.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }
}
