/*!
 * Published Watch State
 *
 * The refresh counter and graphing mode are published together as one
 * [`WatchSnapshot`], so observers never see a count without its matching
 * state. Observers can:
 * - read the latest value (`get`)
 * - register a change callback (`subscribe` / `unsubscribe`)
 * - await changes on a `watch` receiver or a stream (`receiver` / `updates`)
 *
 * The poll loop is the only writer.
 */

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

/// Whether the watched policy currently permits graphing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphingModeState {
    /// No successful poll yet
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

impl GraphingModeState {
    #[inline]
    pub fn from_policy(enabled: bool) -> Self {
        if enabled {
            GraphingModeState::Enabled
        } else {
            GraphingModeState::Disabled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphingModeState::Unknown => "Unknown",
            GraphingModeState::Enabled => "Enabled",
            GraphingModeState::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for GraphingModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphingModeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(GraphingModeState::Unknown),
            "Enabled" => Ok(GraphingModeState::Enabled),
            "Disabled" => Ok(GraphingModeState::Disabled),
            other => Err(format!("unknown graphing mode state: {}", other)),
        }
    }
}

/// The published pair, updated once per successful poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatchSnapshot {
    pub refreshed_count: u64,
    pub state: GraphingModeState,
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeCallback = Arc<dyn Fn(&WatchSnapshot) + Send + Sync>;

/// Observable store for the published pair
pub struct PublishedState {
    tx: watch::Sender<WatchSnapshot>,
    callbacks: RwLock<Vec<(SubscriptionId, ChangeCallback)>>,
    next_id: AtomicU64,
}

impl PublishedState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WatchSnapshot::default());
        Self {
            tx,
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Latest published snapshot
    #[inline]
    pub fn get(&self) -> WatchSnapshot {
        *self.tx.borrow()
    }

    /// Register a callback invoked after every publish
    pub fn subscribe<F>(&self, on_change: F) -> SubscriptionId
    where
        F: Fn(&WatchSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((id, Arc::new(on_change)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Receiver that is marked changed on every publish
    pub fn receiver(&self) -> watch::Receiver<WatchSnapshot> {
        self.tx.subscribe()
    }

    /// Stream of snapshots, starting with the current one
    pub fn updates(&self) -> WatchStream<WatchSnapshot> {
        WatchStream::new(self.tx.subscribe())
    }

    /// Record a successful poll: set the state and bump the counter in one publish
    pub(crate) fn publish_poll(&self, enabled: bool) -> WatchSnapshot {
        self.tx.send_modify(|snapshot| {
            snapshot.state = GraphingModeState::from_policy(enabled);
            snapshot.refreshed_count += 1;
        });
        let snapshot = self.get();

        // Clone out so callbacks may subscribe/unsubscribe without deadlocking
        let callbacks: Vec<(SubscriptionId, ChangeCallback)> = self
            .callbacks
            .read()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        // A panicking subscriber must not take the poll loop down with it
        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&snapshot))).is_err() {
                warn!(
                    subscription = ?id,
                    refreshed_count = snapshot.refreshed_count,
                    "subscriber panicked, removing it"
                );
                self.unsubscribe(id);
            }
        }

        snapshot
    }
}

impl Default for PublishedState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PublishedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedState")
            .field("snapshot", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
