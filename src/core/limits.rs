/*!
 * Limits and Defaults
 *
 * Centralized location for the watch target defaults and timing constants.
 */

use std::time::Duration;

// =============================================================================
// POLL TIMING
// =============================================================================

/// Delay between successive policy lookups (500ms, two polls per second)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lookups slower than this are logged as slow (the provider is expected to be a local call)
pub const SLOW_POLL_THRESHOLD: Duration = Duration::from_millis(50);

// =============================================================================
// WATCH TARGET
// =============================================================================

/// Policy area queried when none is configured
pub const DEFAULT_POLICY_AREA: &str = "Education";

/// Policy name queried when none is configured
pub const DEFAULT_POLICY_NAME: &str = "AllowGraphingCalculator";

/// User identity used when neither POLICY_WATCH_USER nor USER is set
pub const FALLBACK_USER: &str = "default";

// =============================================================================
// POLICY STORE
// =============================================================================

/// Upper bound on a policy document read from disk (1MB)
pub const MAX_POLICY_DOCUMENT_BYTES: u64 = 1024 * 1024;
