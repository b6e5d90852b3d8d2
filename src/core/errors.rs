/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a policy could not be resolved
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupFailure {
    #[error("policy not found")]
    NotFound,

    #[error("invalid user identity")]
    InvalidIdentity,

    #[error("policy store inaccessible: {0}")]
    Inaccessible(String),

    #[error("policy value is not a boolean: {0}")]
    NotBoolean(String),
}

/// Policy provider errors with serialization support
///
/// Providers surface a single error kind; the reason distinguishes the cause.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Policy lookup failed for {user}: {area}/{name}: {reason}")]
    #[diagnostic(
        code(policy::lookup_failed),
        help("Check that the policy exists for this user and that the policy store is readable.")
    )]
    LookupFailed {
        user: String,
        area: String,
        name: String,
        reason: LookupFailure,
    },
}

impl PolicyError {
    pub fn lookup_failed(user: &str, area: &str, name: &str, reason: LookupFailure) -> Self {
        PolicyError::LookupFailed {
            user: user.to_string(),
            area: area.to_string(),
            name: name.to_string(),
            reason,
        }
    }

    /// Underlying failure reason
    pub fn reason(&self) -> &LookupFailure {
        match self {
            PolicyError::LookupFailed { reason, .. } => reason,
        }
    }
}

/// Watcher lifecycle errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum WatcherError {
    #[error("Watcher already started")]
    #[diagnostic(
        code(watcher::already_started),
        help("A watcher polls a single policy; create another watcher for a second target.")
    )]
    AlreadyStarted,

    #[error("Watcher not started")]
    #[diagnostic(
        code(watcher::not_started),
        help("Call start() before sending commands to the watcher.")
    )]
    NotStarted,

    #[error("Watcher has been stopped")]
    #[diagnostic(
        code(watcher::stopped),
        help("Stopped is terminal. Create a new watcher to resume polling.")
    )]
    Stopped,

    #[error("Invalid poll interval: {0}")]
    #[diagnostic(
        code(watcher::invalid_interval),
        help("The poll interval must be greater than zero.")
    )]
    InvalidInterval(String),

    #[error("Watcher task failed: {0}")]
    #[diagnostic(
        code(watcher::task_failed),
        help("The polling task panicked or was cancelled. View logs for details.")
    )]
    TaskFailed(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid interval: {0}")]
    #[diagnostic(
        code(config::invalid_interval),
        help("POLICY_WATCH_INTERVAL_MS must be a positive integer number of milliseconds.")
    )]
    InvalidInterval(String),

    #[error("Empty configuration field: {0}")]
    #[diagnostic(
        code(config::empty_field),
        help("User, area and policy name must be non-empty.")
    )]
    EmptyField(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
pub type WatcherResult<T> = Result<T, WatcherError>;
