//! Parallel dispatch of test cases
//!
//! Cases are queued in suite order and picked up by a fixed number of worker
//! threads, each running one engine process at a time. A failing case never
//! stops the others: every case runs exactly once and the [`Report`] holds one
//! outcome per case.

use crate::invoker::{ExecutionError, Invoker};
use crossbeam_channel::{Receiver, Sender};
use genemu_suite::TestCase;
use std::{
    num::NonZeroUsize,
    thread,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Dispatching,
    Awaiting,
    AllCompleted,
    /// At least one case failed.
    Aborted,
}

enum Event {
    Started(usize),
    Finished(usize, Result<(), ExecutionError>),
}

#[derive(Debug)]
pub struct CaseOutcome {
    elapsed: Duration,
    error: Option<ExecutionError>,
    name: String,
    state: CaseState,
}

impl CaseOutcome {
    #[must_use]
    #[inline]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    #[inline]
    pub const fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    #[inline]
    pub const fn state(&self) -> CaseState {
        self.state
    }
}

/// Result of running a whole suite, outcomes in suite order.
#[derive(Debug)]
pub struct Report {
    elapsed: Duration,
    outcomes: Vec<CaseOutcome>,
    state: PoolState,
}

impl Report {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state == CaseState::Completed)
            .count()
    }

    #[must_use]
    #[inline]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionError> {
        self.outcomes.iter().filter_map(CaseOutcome::error)
    }

    #[must_use]
    #[inline]
    pub fn is_success(&self) -> bool {
        self.state == PoolState::AllCompleted
    }

    #[must_use]
    #[inline]
    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    #[must_use]
    #[inline]
    pub const fn state(&self) -> PoolState {
        self.state
    }

    /// Turns a report with failures into an error listing all of them.
    pub fn into_result(self) -> Result<(), RunError> {
        let total = self.outcomes.len();
        let failures: Vec<_> = self
            .outcomes
            .into_iter()
            .filter_map(|outcome| outcome.error)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RunError { failures, total })
        }
    }
}

/// One or more cases of a run failed.
#[derive(Debug)]
pub struct RunError {
    failures: Vec<ExecutionError>,
    total: usize,
}

impl RunError {
    /// Failures in suite order.
    #[must_use]
    #[inline]
    pub fn failures(&self) -> &[ExecutionError] {
        &self.failures
    }

    #[must_use]
    #[inline]
    pub fn first(&self) -> Option<&ExecutionError> {
        self.failures.first()
    }
}

impl std::error::Error for RunError {}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} cases failed", self.failures.len(), self.total)?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

/// Fixed-size pool of worker threads.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionPool {
    workers: NonZeroUsize,
}

impl Default for ExecutionPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

impl ExecutionPool {
    #[must_use]
    #[inline]
    pub const fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    /// One worker per hardware thread.
    #[must_use]
    pub fn with_available_parallelism() -> Self {
        let workers = thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self::new(workers)
    }

    #[must_use]
    #[inline]
    pub const fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Runs every case through `invoker` and blocks until all have finished.
    pub fn run_all<I>(&self, cases: &[TestCase], invoker: &I) -> Report
    where
        I: Invoker + ?Sized,
    {
        let start = Instant::now();
        let mut states = vec![CaseState::Pending; cases.len()];
        let mut started = vec![start; cases.len()];
        let mut outcomes: Vec<Option<(Duration, Option<ExecutionError>)>> =
            (0..cases.len()).map(|_| None).collect();

        tracing::info!(
            state = ?PoolState::Dispatching,
            cases = cases.len(),
            workers = self.workers(),
            "dispatching suite"
        );

        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        for index in 0..cases.len() {
            // The receiver is alive until the end of this function.
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let workers = self.workers().min(cases.len());

        thread::scope(|scope| {
            let mut spawned = 0;
            for id in 0..workers {
                let jobs = job_rx.clone();
                let events = event_tx.clone();
                let builder = thread::Builder::new().name(format!("genemu-worker-{id}"));

                match builder.spawn_scoped(scope, move || work(cases, invoker, &jobs, &events)) {
                    Ok(_) => spawned += 1,
                    Err(err) => tracing::warn!("failed to spawn worker {id}: {err}"),
                }
            }

            if spawned == 0 && !cases.is_empty() {
                tracing::warn!("no worker threads available, running cases inline");
                work(cases, invoker, &job_rx, &event_tx);
            }
            drop(event_tx);

            tracing::debug!(state = ?PoolState::Awaiting, workers = spawned, "awaiting cases");

            for event in &event_rx {
                match event {
                    Event::Started(index) => {
                        states[index] = CaseState::Running;
                        started[index] = Instant::now();
                        tracing::info!(case = cases[index].name(), "running");
                    }
                    Event::Finished(index, result) => {
                        let elapsed = started[index].elapsed();
                        match &result {
                            Ok(()) => {
                                states[index] = CaseState::Completed;
                                tracing::info!(
                                    case = cases[index].name(),
                                    elapsed_ms = elapsed.as_millis(),
                                    "completed"
                                );
                            }
                            Err(err) => {
                                states[index] = CaseState::Failed;
                                tracing::error!(elapsed_ms = elapsed.as_millis(), "{err}");
                            }
                        }
                        outcomes[index] = Some((elapsed, result.err()));
                    }
                }
            }
        });

        let outcomes: Vec<_> = cases
            .iter()
            .zip(states)
            .zip(outcomes)
            .map(|((case, state), outcome)| {
                let (elapsed, error) = outcome.unwrap_or_default();
                debug_assert!(matches!(state, CaseState::Completed | CaseState::Failed));
                CaseOutcome {
                    elapsed,
                    error,
                    name: case.name().into(),
                    state,
                }
            })
            .collect();

        let state = if outcomes
            .iter()
            .all(|outcome| outcome.state == CaseState::Completed)
        {
            PoolState::AllCompleted
        } else {
            PoolState::Aborted
        };

        let elapsed = start.elapsed();
        tracing::info!(?state, elapsed_ms = elapsed.as_millis(), "suite finished");

        Report {
            elapsed,
            outcomes,
            state,
        }
    }
}

fn work<I>(cases: &[TestCase], invoker: &I, jobs: &Receiver<usize>, events: &Sender<Event>)
where
    I: Invoker + ?Sized,
{
    for index in jobs {
        if events.send(Event::Started(index)).is_err() {
            return;
        }

        let result = invoker.run(&cases[index]);

        if events.send(Event::Finished(index, result)).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::Failure;
    use genemu_suite::Mode;
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    struct Recorder {
        calls: Mutex<HashMap<String, usize>>,
        fail: Vec<&'static str>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Recorder {
        fn new(fail: &[&'static str]) -> Self {
            Self {
                calls: Mutex::new(HashMap::new()),
                fail: fail.to_vec(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl Invoker for Recorder {
        fn run(&self, case: &TestCase) -> Result<(), ExecutionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            thread::sleep(Duration::from_millis(5));
            *self
                .calls
                .lock()
                .unwrap()
                .entry(case.name().into())
                .or_default() += 1;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.iter().any(|&name| name == case.name()) {
                Err(ExecutionError::new(case, Failure::TimedOut(Duration::ZERO)))
            } else {
                Ok(())
            }
        }
    }

    fn cases(count: usize) -> Vec<TestCase> {
        (0..count)
            .map(|i| TestCase::new(format!("case{i}"), format!("rom{i}.bin"), Mode::Pal, vec![1]))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn pool(workers: usize) -> ExecutionPool {
        ExecutionPool::new(NonZeroUsize::new(workers).unwrap())
    }

    #[test]
    fn every_case_runs_exactly_once() {
        let cases = cases(17);
        let recorder = Recorder::new(&[]);

        let report = pool(4).run_all(&cases, &recorder);

        assert!(report.is_success());
        assert_eq!(report.completed(), 17);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 17);
        assert!(calls.values().all(|&count| count == 1));
    }

    #[test]
    fn outcomes_keep_suite_order() {
        let cases = cases(8);
        let report = pool(3).run_all(&cases, &Recorder::new(&[]));

        let names: Vec<_> = report.outcomes().iter().map(CaseOutcome::name).collect();
        let expected: Vec<_> = cases.iter().map(TestCase::name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn concurrency_is_bounded_by_worker_count() {
        let cases = cases(12);
        let recorder = Recorder::new(&[]);

        pool(2).run_all(&cases, &recorder);

        assert!(recorder.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn failure_does_not_stop_siblings() {
        let cases = cases(6);
        let recorder = Recorder::new(&["case1", "case4"]);

        let report = pool(2).run_all(&cases, &recorder);

        assert_eq!(report.state(), PoolState::Aborted);
        assert_eq!(report.completed(), 4);
        assert_eq!(recorder.calls.lock().unwrap().len(), 6);
        assert_eq!(report.outcomes()[1].state(), CaseState::Failed);

        let err = report.into_result().unwrap_err();
        let failed: Vec<_> = err.failures().iter().map(ExecutionError::case).collect();
        assert_eq!(failed, ["case1", "case4"]);
        assert_eq!(err.first().map(ExecutionError::case), Some("case1"));
        assert!(err.to_string().starts_with("2 of 6 cases failed"));
    }

    #[test]
    fn more_workers_than_cases() {
        let cases = cases(1);
        let report = pool(64).run_all(&cases, &Recorder::new(&[]));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn empty_case_list_completes() {
        let report = pool(2).run_all(&[], &Recorder::new(&[]));
        assert!(report.is_success());
        assert!(report.outcomes().is_empty());
    }
}
