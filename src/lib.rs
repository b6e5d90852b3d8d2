/*!
 * Policy Watch Library
 * Polls a named user policy and publishes its state for display
 */

pub mod core;
pub mod display;
pub mod monitoring;
pub mod policy;
pub mod watcher;

// Re-exports
pub use crate::core::errors::*;
pub use display::{StatusColor, StatusLine};
pub use monitoring::init_tracing;
pub use policy::{FilePolicyProvider, PolicyPath, PolicyProvider, StaticPolicyProvider, UserIdentity};
pub use watcher::{
    GraphingModeState, PolicyWatcher, StopHandle, WatchSnapshot, WatcherConfig, WatcherPhase,
};
