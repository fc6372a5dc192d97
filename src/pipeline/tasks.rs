use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use crate::models::{AnalyzerKind, AnalyzerRun, RunStatus};
use super::events::RunEvent;
use tracing::{debug, error, warn};

/// Runs independent jobs concurrently and waits for all of them.
///
/// Jobs report their results through shared state, never through the group.
/// A job that panics, overruns the deadline or is cancelled is recorded in
/// its [`AnalyzerRun`] and never stops its siblings.
pub struct TaskGroup {
    tasks: JoinSet<AnalyzerRun>,
    cancel_token: CancellationToken,
    deadline: Option<Duration>,
    event_tx: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl TaskGroup {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel_token,
            deadline: None,
            event_tx: None,
        }
    }

    /// Drop any job still running after `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_event_channel(mut self, tx: Option<mpsc::UnboundedSender<RunEvent>>) -> Self {
        self.event_tx = tx;
        self
    }

    pub fn spawn<F>(&mut self, kind: AnalyzerKind, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = self.cancel_token.clone();
        let deadline = self.deadline;
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            emit(&event_tx, RunEvent::AnalyzerStarted { kind });
            debug!(kind = %kind, "Task started");
            let start = Instant::now();

            let guarded = AssertUnwindSafe(job).catch_unwind();
            let status = tokio::select! {
                _ = cancel_token.cancelled() => {
                    warn!(kind = %kind, "Task cancelled");
                    RunStatus::Cancelled
                }
                outcome = with_deadline(guarded, deadline) => match outcome {
                    Some(Ok(())) => RunStatus::Completed,
                    Some(Err(payload)) => {
                        error!(kind = %kind, panic = %panic_message(payload.as_ref()), "Task panicked");
                        RunStatus::Panicked
                    }
                    None => {
                        warn!(
                            kind = %kind,
                            deadline_secs = deadline.map(|d| d.as_secs()).unwrap_or_default(),
                            "Task exceeded its deadline, result discarded"
                        );
                        RunStatus::TimedOut
                    }
                },
            };

            let duration_ms = start.elapsed().as_millis() as u64;
            debug!(kind = %kind, status = %status, duration_ms, "Task finished");
            emit(&event_tx, RunEvent::AnalyzerFinished { kind, status, duration_ms });
            AnalyzerRun { kind, status, duration_ms }
        });
    }

    /// Join-all barrier: returns once every spawned job has finished.
    pub async fn join_all(mut self) -> Vec<AnalyzerRun> {
        let mut runs = Vec::with_capacity(self.tasks.len());
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(run) => runs.push(run),
                Err(e) => error!(error = %e, "Task failed to join"),
            }
        }
        runs.sort_by_key(|run| run.kind);
        runs
    }
}

/// Process `items` on a fixed-size pool of workers draining a shared queue.
///
/// No ordering is guaranteed between items. A panicking job is logged and the
/// worker moves on to the next item. Returns the number of jobs that finished.
pub async fn for_each_bounded<T, F, Fut>(items: Vec<T>, workers: usize, job: F) -> usize
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if items.is_empty() {
        return 0;
    }
    let workers = workers.clamp(1, items.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let job = Arc::new(job);

    let mut pool = JoinSet::new();
    for worker in 0..workers {
        let queue = queue.clone();
        let job = job.clone();
        pool.spawn(async move {
            let mut finished = 0usize;
            loop {
                let next = queue.lock().await.pop_front();
                let Some(item) = next else { break };
                match AssertUnwindSafe(job(item)).catch_unwind().await {
                    Ok(()) => finished += 1,
                    Err(payload) => {
                        error!(worker, panic = %panic_message(payload.as_ref()), "Job panicked");
                    }
                }
            }
            finished
        });
    }

    let mut finished = 0;
    while let Some(result) = pool.join_next().await {
        match result {
            Ok(count) => finished += count,
            Err(e) => error!(error = %e, "Worker failed to join"),
        }
    }
    finished
}

async fn with_deadline<F: Future>(fut: F, deadline: Option<Duration>) -> Option<F::Output> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

fn emit(tx: &Option<mpsc::UnboundedSender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_join_all_waits_for_every_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut group = TaskGroup::new(CancellationToken::new());
        for kind in [AnalyzerKind::Complexity, AnalyzerKind::DeadCode, AnalyzerKind::Spelling] {
            let counter = counter.clone();
            group.spawn(kind, async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let runs = group.join_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.status == RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_abort_group() {
        let mut group = TaskGroup::new(CancellationToken::new());
        group.spawn(AnalyzerKind::Duplicates, async { panic!("analyzer blew up") });
        group.spawn(AnalyzerKind::DeadCode, async {});

        let runs = group.join_all().await;
        let status_of = |kind| runs.iter().find(|r| r.kind == kind).map(|r| r.status);
        assert_eq!(status_of(AnalyzerKind::Duplicates), Some(RunStatus::Panicked));
        assert_eq!(status_of(AnalyzerKind::DeadCode), Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_deadline_marks_hung_job() {
        let mut group = TaskGroup::new(CancellationToken::new())
            .with_deadline(Some(Duration::from_millis(50)));
        group.spawn(AnalyzerKind::Spelling, futures::future::pending::<()>());
        group.spawn(AnalyzerKind::StaticScan, async {});

        let runs = group.join_all().await;
        assert_eq!(runs[0].kind, AnalyzerKind::StaticScan);
        assert_eq!(runs[0].status, RunStatus::Completed);
        assert_eq!(runs[1].kind, AnalyzerKind::Spelling);
        assert_eq!(runs[1].status, RunStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_cancellation_stops_pending_jobs() {
        let token = CancellationToken::new();
        let mut group = TaskGroup::new(token.clone());
        group.spawn(AnalyzerKind::UnitTest, futures::future::pending::<()>());
        token.cancel();

        let runs = group.join_all().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut group = TaskGroup::new(CancellationToken::new()).with_event_channel(Some(tx));
        group.spawn(AnalyzerKind::Complexity, async {});
        group.join_all().await;

        let mut started = 0;
        let mut finished = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                RunEvent::AnalyzerStarted { .. } => started += 1,
                RunEvent::AnalyzerFinished { status, .. } => {
                    assert_eq!(status, RunStatus::Completed);
                    finished += 1;
                }
                _ => {}
            }
        }
        assert_eq!((started, finished), (1, 1));
    }

    #[tokio::test]
    async fn test_bounded_pool_processes_every_item() {
        let seen = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..40).collect();
        let finished = {
            let (seen, active, peak) = (seen.clone(), active.clone(), peak.clone());
            for_each_bounded(items, 4, move |_| {
                let (seen, active, peak) = (seen.clone(), active.clone(), peak.clone());
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await
        };

        assert_eq!(finished, 40);
        assert_eq!(seen.load(Ordering::SeqCst), 40);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_bounded_pool_survives_panicking_item() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let finished = for_each_bounded(vec![1, 2, 3, 4], 1, move |n| {
            let counter = counter.clone();
            async move {
                if n == 2 {
                    panic!("bad package");
                }
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(finished, 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bounded_pool_empty_input() {
        let finished = for_each_bounded(Vec::<u8>::new(), 8, |_| async {}).await;
        assert_eq!(finished, 0);
    }
}
