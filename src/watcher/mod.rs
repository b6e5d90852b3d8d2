/*!
 * Policy Watcher
 *
 * Repeatedly resolves one named boolean policy for a user and publishes the
 * latest value together with a refresh counter.
 *
 * # Architecture
 *
 * - `task`: lifecycle (`start` / `stop`) and the cancellable poll loop
 * - `poller`: a single iteration (lookup, publish or record failure)
 * - `state`: the observable `(RefreshedCount, GraphingModeState)` pair
 * - `config`: watch target and interval, with environment overrides
 *
 * Iterations are strictly sequential, with one suspension point per
 * iteration (the inter-poll delay). Lookup failures are logged and counted.
 * They never end the loop and never touch the published pair.
 */

pub mod config;
mod poller;
pub mod state;
mod task;

pub use config::WatcherConfig;
pub use poller::{PollOutcome, Poller, WatcherStats, WatcherStatsSnapshot};
pub use state::{GraphingModeState, PublishedState, SubscriptionId, WatchSnapshot};
pub use task::{PolicyWatcher, StopHandle, WatcherCommand, WatcherPhase};
