/*!
 * Policy Watcher Task
 *
 * Background task that polls one policy on a fixed interval and publishes
 * the result. Lifecycle is `NotStarted -> Polling -> Stopped`; Stopped is
 * terminal.
 *
 * # Graceful-with-Fallback Shutdown
 *
 * 1. **Preferred:** `stop().await` / `shutdown().await` sends a shutdown
 *    command and awaits the task. Commands are only observed while the loop
 *    is suspended, so an in-flight poll always completes and nothing is
 *    polled afterwards.
 * 2. **Fallback:** dropping a running watcher aborts the task and logs a
 *    warning.
 *
 * # Example Usage
 *
 * ```no_run
 * # use std::sync::Arc;
 * # use std::time::Duration;
 * # use policy_watch::policy::{PolicyPath, StaticPolicyProvider, UserIdentity};
 * # use policy_watch::watcher::PolicyWatcher;
 * # async fn example() -> Result<(), policy_watch::WatcherError> {
 * let provider = Arc::new(StaticPolicyProvider::new().with_policy(
 *     "student",
 *     PolicyPath::new("Education", "AllowGraphingCalculator"),
 *     true,
 * ));
 * let mut watcher = PolicyWatcher::new(provider);
 * watcher.subscribe(|snap| println!("{} ({})", snap.state, snap.refreshed_count));
 * watcher.start(
 *     UserIdentity::new("student"),
 *     "Education",
 *     "AllowGraphingCalculator",
 *     Duration::from_millis(500),
 * )?;
 *
 * // ... page is alive ...
 *
 * watcher.shutdown().await
 * # }
 * ```
 */

use super::config::WatcherConfig;
use super::poller::{Poller, WatcherStats, WatcherStatsSnapshot};
use super::state::{PublishedState, SubscriptionId, WatchSnapshot};
use crate::core::errors::{WatcherError, WatcherResult};
use crate::monitoring::generate_trace_id;
use crate::policy::{PolicyPath, PolicyProvider, UserIdentity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Control messages for the watcher task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherCommand {
    /// Skip the remaining delay and poll immediately
    PollNow,
    /// Change the delay used from the next suspension on
    SetInterval(Duration),
    /// Stop polling after the current iteration
    Shutdown,
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    NotStarted,
    Polling,
    Stopped,
}

/// Cloneable cancellation signal for a running watcher
#[derive(Debug, Clone)]
pub struct StopHandle {
    command_tx: mpsc::UnboundedSender<WatcherCommand>,
}

impl StopHandle {
    /// Request a stop; returns false if the task has already exited
    pub fn stop(&self) -> bool {
        self.command_tx.send(WatcherCommand::Shutdown).is_ok()
    }
}

/// Polls a policy and publishes `(RefreshedCount, GraphingModeState)`
///
/// **Shutdown Pattern: Graceful-with-Fallback**
/// - Preferred: call `shutdown().await` (or `stop().await`)
/// - Fallback: Drop aborts the task if shutdown wasn't called
pub struct PolicyWatcher {
    id: String,
    provider: Arc<dyn PolicyProvider>,
    published: Arc<PublishedState>,
    stats: Arc<WatcherStats>,
    phase: WatcherPhase,
    command_tx: Option<mpsc::UnboundedSender<WatcherCommand>>,
    handle: Option<JoinHandle<()>>,
    /// Tracks whether graceful shutdown was initiated
    shutdown_initiated: Arc<AtomicBool>,
}

impl PolicyWatcher {
    pub fn new(provider: Arc<dyn PolicyProvider>) -> Self {
        Self {
            id: generate_trace_id(),
            provider,
            published: Arc::new(PublishedState::new()),
            stats: Arc::new(WatcherStats::default()),
            phase: WatcherPhase::NotStarted,
            command_tx: None,
            handle: None,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current phase; a watcher stopped through a [`StopHandle`] reports Stopped
    pub fn phase(&self) -> WatcherPhase {
        match (&self.phase, &self.handle) {
            (WatcherPhase::Polling, Some(handle)) if handle.is_finished() => WatcherPhase::Stopped,
            (phase, _) => *phase,
        }
    }

    /// Latest published pair
    pub fn snapshot(&self) -> WatchSnapshot {
        self.published.get()
    }

    pub fn published(&self) -> &Arc<PublishedState> {
        &self.published
    }

    pub fn stats(&self) -> WatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn subscribe<F>(&self, on_change: F) -> SubscriptionId
    where
        F: Fn(&WatchSnapshot) + Send + Sync + 'static,
    {
        self.published.subscribe(on_change)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.published.unsubscribe(id)
    }

    pub fn receiver(&self) -> watch::Receiver<WatchSnapshot> {
        self.published.receiver()
    }

    pub fn updates(&self) -> WatchStream<WatchSnapshot> {
        self.published.updates()
    }

    /// Begin polling `area/name` for `user` every `interval`
    ///
    /// The first poll runs as soon as the task is scheduled. Must be called
    /// from within a tokio runtime.
    pub fn start(
        &mut self,
        user: UserIdentity,
        area: &str,
        name: &str,
        interval: Duration,
    ) -> WatcherResult<()> {
        match self.phase() {
            WatcherPhase::NotStarted => {}
            WatcherPhase::Polling => return Err(WatcherError::AlreadyStarted),
            WatcherPhase::Stopped => return Err(WatcherError::Stopped),
        }
        validate_interval(interval)?;

        let policy = PolicyPath::new(area, name);
        let poller = Poller::new(
            self.id.clone(),
            user,
            policy,
            Arc::clone(&self.provider),
            Arc::clone(&self.published),
            Arc::clone(&self.stats),
        );

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_watch_loop(poller, interval, command_rx));

        info!(
            watcher_id = %self.id,
            interval_ms = interval.as_millis() as u64,
            "Policy watcher task spawned"
        );

        self.command_tx = Some(command_tx);
        self.handle = Some(handle);
        self.phase = WatcherPhase::Polling;
        Ok(())
    }

    /// Begin polling the target described by `config`
    pub fn start_with(&mut self, config: &WatcherConfig) -> WatcherResult<()> {
        self.start(
            config.user.clone(),
            &config.policy.area,
            &config.policy.name,
            config.interval,
        )
    }

    /// Trigger an immediate poll
    pub fn poll_now(&self) -> WatcherResult<()> {
        self.send(WatcherCommand::PollNow)
    }

    /// Change the poll interval (takes effect from the next suspension)
    pub fn set_interval(&self, interval: Duration) -> WatcherResult<()> {
        validate_interval(interval)?;
        self.send(WatcherCommand::SetInterval(interval))
    }

    /// Cancellation signal that can be moved to another task
    pub fn stop_handle(&self) -> WatcherResult<StopHandle> {
        match (self.phase(), &self.command_tx) {
            (WatcherPhase::Polling, Some(tx)) => Ok(StopHandle {
                command_tx: tx.clone(),
            }),
            (WatcherPhase::NotStarted, _) => Err(WatcherError::NotStarted),
            _ => Err(WatcherError::Stopped),
        }
    }

    /// Stop polling and wait for the task to exit
    ///
    /// Idempotent. A watcher that was never started moves straight to Stopped.
    pub async fn stop(&mut self) -> WatcherResult<()> {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        self.phase = WatcherPhase::Stopped;

        if let Some(tx) = self.command_tx.take() {
            // The task may already be gone (stop handle); that's fine
            let _ = tx.send(WatcherCommand::Shutdown);
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(watcher_id = %self.id, error = %e, "Policy watcher shutdown error");
                return Err(WatcherError::TaskFailed(e.to_string()));
            }
            info!(watcher_id = %self.id, "Policy watcher shutdown complete");
        }
        Ok(())
    }

    /// Stop polling and consume the watcher
    pub async fn shutdown(mut self) -> WatcherResult<()> {
        self.stop().await
    }

    fn send(&self, command: WatcherCommand) -> WatcherResult<()> {
        match self.phase() {
            WatcherPhase::Polling => {}
            WatcherPhase::Stopped => return Err(WatcherError::Stopped),
            WatcherPhase::NotStarted => return Err(WatcherError::NotStarted),
        }
        self.command_tx
            .as_ref()
            .ok_or(WatcherError::Stopped)?
            .send(command)
            .map_err(|_| WatcherError::Stopped)
    }
}

fn validate_interval(interval: Duration) -> WatcherResult<()> {
    if interval.is_zero() {
        return Err(WatcherError::InvalidInterval(
            "interval must be non-zero".into(),
        ));
    }
    Ok(())
}

/// Poll, publish, then wait for the interval or a command
async fn run_watch_loop(
    poller: Poller,
    mut interval: Duration,
    mut command_rx: mpsc::UnboundedReceiver<WatcherCommand>,
) {
    info!(
        user = %poller.user(),
        policy = %poller.policy(),
        interval_ms = interval.as_millis() as u64,
        "Policy watch loop started"
    );

    loop {
        poller.poll_once();

        let delay = tokio::time::sleep(interval);
        tokio::pin!(delay);

        'wait: loop {
            tokio::select! {
                biased;

                cmd = command_rx.recv() => match cmd {
                    Some(WatcherCommand::Shutdown) | None => {
                        info!("Policy watch loop shutting down");
                        return;
                    }
                    Some(WatcherCommand::PollNow) => {
                        debug!("Manual poll trigger");
                        break 'wait;
                    }
                    Some(WatcherCommand::SetInterval(new_interval)) => {
                        info!(interval_ms = new_interval.as_millis() as u64, "Poll interval updated");
                        interval = new_interval;
                    }
                },

                _ = &mut delay => break 'wait,
            }
        }
    }
}

impl Drop for PolicyWatcher {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.handle.take() {
            // Already exited through a StopHandle
            if handle.is_finished() {
                return;
            }
            warn!(
                watcher_id = %self.id,
                "PolicyWatcher dropped without calling shutdown() - aborting task immediately. \
                 Use `watcher.shutdown().await` for graceful cleanup."
            );
            handle.abort();
        }
    }
}
