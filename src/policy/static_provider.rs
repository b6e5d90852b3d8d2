/*!
 * Static Policy Provider
 * In-memory policy table that can be changed at runtime
 */

use super::traits::PolicyProvider;
use super::types::{PolicyPath, UserIdentity};
use crate::core::errors::{LookupFailure, PolicyError, PolicyResult};
use parking_lot::RwLock;
use std::collections::HashMap;

type PolicyKey = (UserIdentity, PolicyPath);

/// In-memory provider keyed by `(user, area, name)`
#[derive(Debug, Default)]
pub struct StaticPolicyProvider {
    values: RwLock<HashMap<PolicyKey, bool>>,
}

impl StaticPolicyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_policy(self, user: impl Into<UserIdentity>, path: PolicyPath, value: bool) -> Self {
        self.set(user, path, value);
        self
    }

    /// Set (or overwrite) a policy value
    pub fn set(&self, user: impl Into<UserIdentity>, path: PolicyPath, value: bool) {
        self.values.write().insert((user.into(), path), value);
    }

    /// Remove a policy; later lookups fail with NotFound
    pub fn clear(&self, user: &UserIdentity, path: &PolicyPath) -> Option<bool> {
        self.values.write().remove(&(user.clone(), path.clone()))
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PolicyProvider for StaticPolicyProvider {
    fn get_policy_boolean(&self, user: &UserIdentity, area: &str, name: &str) -> PolicyResult<bool> {
        if !user.is_valid() {
            return Err(PolicyError::lookup_failed(
                user.as_str(),
                area,
                name,
                LookupFailure::InvalidIdentity,
            ));
        }

        let key = (user.clone(), PolicyPath::new(area, name));
        self.values.read().get(&key).copied().ok_or_else(|| {
            PolicyError::lookup_failed(user.as_str(), area, name, LookupFailure::NotFound)
        })
    }
}
