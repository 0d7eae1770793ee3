//! Periodic ingest and sync cycles.
//!
//! The scheduler runs one cycle at start, then one per `sync_interval` plus
//! jitter. Only a cycle that failed as a whole counts towards backoff; a
//! cycle whose summary holds per-item failures is still a completed cycle.
//! After `max_consecutive_failures` failed cycles, timed cycles stop until a
//! manual [`SchedulerHandle::sync_now`] succeeds.

use std::collections::hash_map::RandomState;
use std::future::Future;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::SyncResult;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between cycles.
    pub sync_interval: Duration,
    /// Jitter added to each interval, as a fraction of it (0.0 to 1.0).
    pub jitter_fraction: f64,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Failed cycles in a row after which timed cycles stop.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(3600),
            jitter_fraction: 0.05,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(1800),
            backoff_multiplier: 2.0,
            max_consecutive_failures: 8,
        }
    }
}

impl SchedulerConfig {
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            sync_interval,
            ..Default::default()
        }
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Interval until the next timed cycle, jittered within
    /// `[interval, interval * (1 + jitter_fraction)]`.
    pub fn next_interval(&self) -> Duration {
        let base = self.sync_interval.as_secs_f64();
        Duration::from_secs_f64(base + base * self.jitter_fraction * unit_random())
    }

    /// Delay after `failures` failed cycles in a row.
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(failures - 1).unwrap_or(i32::MAX);
        let delay = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_backoff.as_secs_f64()))
    }
}

/// A value in `[0, 1)` from the per-process random hasher keys.
fn unit_random() -> f64 {
    let nanos = Utc::now().timestamp_subsec_nanos();
    let bits = RandomState::new().hash_one(nanos);
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

/// What a cycle reports back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every operation succeeded.
    Clean,
    /// The cycle ran, but some operations failed.
    Partial { failures: usize },
    /// Nothing could be done.
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Run a cycle now, even when paused or after too many failures.
    SyncNow,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub paused: bool,
    /// Cycles run so far, skipped ones excluded.
    pub cycles: u64,
    pub consecutive_failures: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    /// End of the last cycle that did not fail as a whole.
    pub last_completed: Option<DateTime<Utc>>,
    /// Per-item failures in the last completed cycle.
    pub last_partial_failures: usize,
    pub last_error: Option<String>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &CycleOutcome) {
        let now = Utc::now();
        self.cycles += 1;
        self.last_attempt = Some(now);
        match outcome {
            CycleOutcome::Clean | CycleOutcome::Partial { .. } => {
                self.consecutive_failures = 0;
                self.last_completed = Some(now);
                self.last_error = None;
                self.last_partial_failures = match outcome {
                    CycleOutcome::Partial { failures } => *failures,
                    _ => 0,
                };
            }
            CycleOutcome::Failed(reason) => {
                self.consecutive_failures += 1;
                self.last_error = Some(reason.clone());
            }
        }
    }
}

pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(SchedulerState::new())),
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs cycles until a [`SchedulerCommand::Stop`] arrives or every
    /// handle is dropped.
    pub async fn run<F, Fut>(self, cycle: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CycleOutcome> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only handles keep the channel open from here on.
        drop(command_tx);

        info!(interval_secs = config.sync_interval.as_secs(), "Scheduler started");
        run_cycle(&state, &cycle).await;

        loop {
            let delay = next_delay(&config, &state).await;
            debug!(delay_secs = delay.as_secs(), "Next cycle scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let current = state.read().await;
                    if current.paused {
                        debug!("Paused, skipping cycle");
                        continue;
                    }
                    if current.consecutive_failures >= config.max_consecutive_failures {
                        error!(
                            failures = current.consecutive_failures,
                            "Too many failed cycles, waiting for a manual sync"
                        );
                        continue;
                    }
                    drop(current);
                    run_cycle(&state, &cycle).await;
                }
                command = command_rx.recv() => match command {
                    Some(SchedulerCommand::SyncNow) => {
                        debug!("Manual sync requested");
                        run_cycle(&state, &cycle).await;
                    }
                    Some(SchedulerCommand::Pause) => {
                        info!("Scheduler paused");
                        state.write().await.paused = true;
                    }
                    Some(SchedulerCommand::Resume) => {
                        info!("Scheduler resumed");
                        state.write().await.paused = false;
                    }
                    Some(SchedulerCommand::Stop) | None => {
                        info!("Scheduler stopping");
                        break;
                    }
                },
            }
        }
    }
}

async fn next_delay(config: &SchedulerConfig, state: &SharedSchedulerState) -> Duration {
    let failures = state.read().await.consecutive_failures;
    if failures == 0 || failures >= config.max_consecutive_failures {
        return config.next_interval();
    }
    let backoff = config.backoff_delay(failures);
    debug!(failures, backoff_secs = backoff.as_secs(), "Backing off");
    backoff
}

async fn run_cycle<F, Fut>(state: &SharedSchedulerState, cycle: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = CycleOutcome>,
{
    debug!("Cycle starting");
    let outcome = cycle().await;
    match &outcome {
        CycleOutcome::Clean => info!("Cycle completed"),
        CycleOutcome::Partial { failures } => {
            warn!(failures, "Cycle completed with failures")
        }
        CycleOutcome::Failed(reason) => warn!(error = %reason, "Cycle failed"),
    }
    state.write().await.record(&outcome);
}

/// Handle for controlling a running [`Scheduler`].
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    pub async fn sync_now(&self) -> SyncResult<()> {
        Ok(self.command_tx.send(SchedulerCommand::SyncNow).await?)
    }

    pub async fn pause(&self) -> SyncResult<()> {
        Ok(self.command_tx.send(SchedulerCommand::Pause).await?)
    }

    pub async fn resume(&self) -> SyncResult<()> {
        Ok(self.command_tx.send(SchedulerCommand::Resume).await?)
    }

    pub async fn stop(&self) -> SyncResult<()> {
        Ok(self.command_tx.send(SchedulerCommand::Stop).await?)
    }

    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(interval_secs: u64) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(interval_secs))
            .with_jitter(0.0)
            .with_backoff(Duration::from_secs(10), Duration::from_secs(100), 2.0)
    }

    /// Spawns a scheduler whose cycle maps the call number to an outcome.
    fn spawn(
        config: SchedulerConfig,
        outcome: impl Fn(u32) -> CycleOutcome + Send + Sync + 'static,
    ) -> (SchedulerHandle, Arc<AtomicU32>, tokio::task::JoinHandle<()>) {
        let scheduler = Scheduler::new(config);
        let handle = scheduler.handle();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let task = tokio::spawn(scheduler.run(move || {
            let result = outcome(counter.fetch_add(1, Ordering::SeqCst));
            async move { result }
        }));
        (handle, calls, task)
    }

    mod config {
        use super::*;

        #[test]
        fn backoff_grows_and_caps() {
            let config = config(60);
            assert_eq!(config.backoff_delay(0), Duration::ZERO);
            assert_eq!(config.backoff_delay(1), Duration::from_secs(10));
            assert_eq!(config.backoff_delay(2), Duration::from_secs(20));
            assert_eq!(config.backoff_delay(3), Duration::from_secs(40));
            assert_eq!(config.backoff_delay(30), Duration::from_secs(100));
        }

        #[test]
        fn jitter_stays_in_range() {
            let config = SchedulerConfig::new(Duration::from_secs(100)).with_jitter(0.2);
            for _ in 0..50 {
                let delay = config.next_interval().as_secs_f64();
                assert!((100.0..=120.0).contains(&delay), "{delay}");
            }
        }

        #[test]
        fn jitter_is_clamped() {
            assert_eq!(SchedulerConfig::default().with_jitter(3.0).jitter_fraction, 1.0);
            assert_eq!(SchedulerConfig::default().with_jitter(-1.0).jitter_fraction, 0.0);
        }
    }

    mod state {
        use super::*;

        #[test]
        fn failure_then_recovery() {
            let mut state = SchedulerState::new();
            state.record(&CycleOutcome::Failed("calendar down".into()));
            state.record(&CycleOutcome::Failed("calendar down".into()));
            assert_eq!(state.consecutive_failures, 2);
            assert!(state.last_completed.is_none());

            state.record(&CycleOutcome::Partial { failures: 3 });
            assert_eq!(state.consecutive_failures, 0);
            assert_eq!(state.last_partial_failures, 3);
            assert!(state.last_error.is_none());
            assert_eq!(state.cycles, 3);
        }
    }

    mod run {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn runs_at_start_and_every_interval() {
            let (handle, calls, task) = spawn(config(60), |_| CycleOutcome::Clean);

            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);

            tokio::time::sleep(Duration::from_secs(60)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);

            handle.stop().await.unwrap();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn backs_off_after_failed_cycles() {
            let (handle, calls, task) = spawn(config(3600), |n| {
                if n < 3 {
                    CycleOutcome::Failed(format!("failure {n}"))
                } else {
                    CycleOutcome::Clean
                }
            });

            // Failures at 0s, 10s and 30s; the next attempt waits 40s.
            tokio::time::sleep(Duration::from_secs(31)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(handle.state().await.consecutive_failures, 3);

            tokio::time::sleep(Duration::from_secs(40)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 4);
            let state = handle.state().await;
            assert_eq!(state.consecutive_failures, 0);
            assert!(state.last_completed.is_some());

            handle.stop().await.unwrap();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn partial_failures_do_not_back_off() {
            let (handle, calls, task) = spawn(config(60), |_| CycleOutcome::Partial { failures: 2 });

            tokio::time::sleep(Duration::from_secs(30)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            let state = handle.state().await;
            assert_eq!(state.consecutive_failures, 0);
            assert_eq!(state.last_partial_failures, 2);

            handle.stop().await.unwrap();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn gives_up_until_manual_sync() {
            let (handle, calls, task) = spawn(config(60).with_max_consecutive_failures(2), |n| {
                if n < 2 {
                    CycleOutcome::Failed("down".into())
                } else {
                    CycleOutcome::Clean
                }
            });

            tokio::time::sleep(Duration::from_secs(600)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);

            handle.sync_now().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(handle.state().await.consecutive_failures, 0);

            handle.stop().await.unwrap();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn pause_skips_timed_cycles_only() {
            let (handle, calls, task) = spawn(config(60), |_| CycleOutcome::Clean);

            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.pause().await.unwrap();
            tokio::time::sleep(Duration::from_secs(200)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(handle.state().await.paused);

            handle.sync_now().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);

            handle.resume().await.unwrap();
            tokio::time::sleep(Duration::from_secs(61)).await;
            assert!(!handle.state().await.paused);
            assert_eq!(calls.load(Ordering::SeqCst), 3);

            handle.stop().await.unwrap();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn handle_errors_once_stopped() {
            let (handle, _calls, task) = spawn(config(60), |_| CycleOutcome::Clean);
            handle.stop().await.unwrap();
            task.await.unwrap();

            assert!(matches!(handle.sync_now().await, Err(SyncError::SchedulerStopped)));
        }
    }
}
