/*!
 * Policy Provider Traits
 */

use super::types::{PolicyPath, UserIdentity};
use crate::core::errors::PolicyResult;

/// Source of named boolean policies scoped to a user
///
/// Lookups are synchronous and expected to be fast local calls; the watcher
/// invokes them directly from its polling task.
pub trait PolicyProvider: Send + Sync {
    /// Resolve `area/name` for `user`
    fn get_policy_boolean(&self, user: &UserIdentity, area: &str, name: &str) -> PolicyResult<bool>;

    /// Resolve a policy by path
    fn get_policy(&self, user: &UserIdentity, path: &PolicyPath) -> PolicyResult<bool> {
        self.get_policy_boolean(user, &path.area, &path.name)
    }
}
