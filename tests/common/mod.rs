/*!
 * Shared test providers
 */

#![allow(dead_code)]

use parking_lot::Mutex;
use policy_watch::{LookupFailure, PolicyError, PolicyProvider, PolicyResult, UserIdentity};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const AREA: &str = "Education";
pub const NAME: &str = "AllowGraphingCalculator";

/// Replays a fixed script of lookup results; `None` entries fail.
/// Once the script is exhausted every lookup fails with NotFound.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Option<bool>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(values.into_iter().map(Some))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PolicyProvider for ScriptedProvider {
    fn get_policy_boolean(&self, user: &UserIdentity, area: &str, name: &str) -> PolicyResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(PolicyError::lookup_failed(
                user.as_str(),
                area,
                name,
                LookupFailure::Inaccessible("scripted failure".into()),
            )),
            None => Err(PolicyError::lookup_failed(
                user.as_str(),
                area,
                name,
                LookupFailure::NotFound,
            )),
        }
    }
}
