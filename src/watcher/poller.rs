/*!
 * Poll Iteration
 *
 * One iteration of the watch loop: look the policy up, then publish the
 * result or record the failure. Failures leave the published pair untouched.
 */

use super::state::{PublishedState, WatchSnapshot};
use crate::core::errors::PolicyError;
use crate::monitoring::span_poll;
use crate::policy::{PolicyPath, PolicyProvider, UserIdentity};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Lookup succeeded and the pair was published
    Published(WatchSnapshot),
    /// Lookup failed; nothing was published
    Failed(PolicyError),
}

impl PollOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PollOutcome::Published(_))
    }
}

/// Diagnostic counters, kept apart from the published pair
#[derive(Debug, Default)]
pub struct WatcherStats {
    polls_attempted: AtomicU64,
    polls_failed: AtomicU64,
    last_error: RwLock<Option<PolicyError>>,
}

/// Point-in-time copy of [`WatcherStats`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatcherStatsSnapshot {
    pub polls_attempted: u64,
    pub polls_failed: u64,
    pub last_error: Option<PolicyError>,
}

impl WatcherStats {
    pub fn snapshot(&self) -> WatcherStatsSnapshot {
        WatcherStatsSnapshot {
            polls_attempted: self.polls_attempted.load(Ordering::Acquire),
            polls_failed: self.polls_failed.load(Ordering::Acquire),
            last_error: self.last_error.read().clone(),
        }
    }

    fn record_attempt(&self) -> u64 {
        self.polls_attempted.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn record_failure(&self, err: &PolicyError) {
        self.polls_failed.fetch_add(1, Ordering::AcqRel);
        *self.last_error.write() = Some(err.clone());
    }
}

/// Everything one iteration needs
pub struct Poller {
    watcher_id: String,
    user: UserIdentity,
    policy: PolicyPath,
    provider: Arc<dyn PolicyProvider>,
    published: Arc<PublishedState>,
    stats: Arc<WatcherStats>,
}

impl Poller {
    pub fn new(
        watcher_id: impl Into<String>,
        user: UserIdentity,
        policy: PolicyPath,
        provider: Arc<dyn PolicyProvider>,
        published: Arc<PublishedState>,
        stats: Arc<WatcherStats>,
    ) -> Self {
        Self {
            watcher_id: watcher_id.into(),
            user,
            policy,
            provider,
            published,
            stats,
        }
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn policy(&self) -> &PolicyPath {
        &self.policy
    }

    /// Run one iteration
    pub fn poll_once(&self) -> PollOutcome {
        let iteration = self.stats.record_attempt();
        let span = span_poll(&self.watcher_id, iteration);
        let _entered = span.enter();

        match self.provider.get_policy(&self.user, &self.policy) {
            Ok(enabled) => {
                span.record_result(true);
                let snapshot = self.published.publish_poll(enabled);
                debug!(
                    policy = %self.policy,
                    state = %snapshot.state,
                    refreshed_count = snapshot.refreshed_count,
                    "policy state published"
                );
                PollOutcome::Published(snapshot)
            }
            Err(err) => {
                span.record_result(false);
                self.stats.record_failure(&err);
                warn!(
                    policy = %self.policy,
                    user = %self.user,
                    error = %err,
                    "policy lookup failed, keeping previous state"
                );
                PollOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::LookupFailure;
    use crate::policy::StaticPolicyProvider;
    use crate::watcher::state::GraphingModeState;
    use pretty_assertions::assert_eq;

    fn calculator() -> PolicyPath {
        PolicyPath::new("Education", "AllowGraphingCalculator")
    }

    fn poller_for(provider: Arc<StaticPolicyProvider>) -> (Poller, Arc<PublishedState>, Arc<WatcherStats>) {
        let published = Arc::new(PublishedState::new());
        let stats = Arc::new(WatcherStats::default());
        let poller = Poller::new(
            "test",
            UserIdentity::new("student"),
            calculator(),
            provider,
            Arc::clone(&published),
            Arc::clone(&stats),
        );
        (poller, published, stats)
    }

    #[test]
    fn test_success_publishes() {
        let provider = Arc::new(StaticPolicyProvider::new().with_policy("student", calculator(), true));
        let (poller, published, stats) = poller_for(provider);

        let outcome = poller.poll_once();
        assert_eq!(
            outcome,
            PollOutcome::Published(WatchSnapshot {
                refreshed_count: 1,
                state: GraphingModeState::Enabled
            })
        );
        assert_eq!(published.get().refreshed_count, 1);
        assert_eq!(stats.snapshot().polls_attempted, 1);
        assert_eq!(stats.snapshot().polls_failed, 0);
    }

    #[test]
    fn test_failure_keeps_state() {
        let provider = Arc::new(StaticPolicyProvider::new().with_policy("student", calculator(), false));
        let (poller, published, stats) = poller_for(Arc::clone(&provider));

        assert!(poller.poll_once().is_published());
        provider.clear(&UserIdentity::new("student"), &calculator());

        let outcome = poller.poll_once();
        assert!(matches!(
            outcome,
            PollOutcome::Failed(ref e) if e.reason() == &LookupFailure::NotFound
        ));
        assert_eq!(
            published.get(),
            WatchSnapshot {
                refreshed_count: 1,
                state: GraphingModeState::Disabled
            }
        );

        let stats = stats.snapshot();
        assert_eq!(stats.polls_attempted, 2);
        assert_eq!(stats.polls_failed, 1);
        assert!(stats.last_error.is_some());
    }
}
