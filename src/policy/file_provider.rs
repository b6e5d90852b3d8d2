/*!
 * File Policy Provider
 *
 * Resolves policies from a JSON document on disk. The document is re-read on
 * every lookup so edits made by an administrator show up on the next poll.
 *
 * ```json
 * { "users": { "student": { "Education": { "AllowGraphingCalculator": true } } } }
 * ```
 *
 * Values may be JSON booleans or the integers 0 / 1.
 */

use super::traits::PolicyProvider;
use super::types::UserIdentity;
use crate::core::errors::{LookupFailure, PolicyError, PolicyResult};
use crate::core::limits::MAX_POLICY_DOCUMENT_BYTES;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::trace;

/// users -> area -> name -> value
#[derive(Debug, Default, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    users: HashMap<String, HashMap<String, HashMap<String, Value>>>,
}

/// JSON-file backed provider
#[derive(Debug, Clone)]
pub struct FilePolicyProvider {
    path: PathBuf,
}

impl FilePolicyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PolicyDocument, LookupFailure> {
        let inaccessible = |e: &dyn fmt::Display| {
            LookupFailure::Inaccessible(format!("{}: {}", self.path.display(), e))
        };

        // Bound the read itself; the file may grow between open and read
        let file = File::open(&self.path).map_err(|e| inaccessible(&e))?;
        let mut raw = Vec::new();
        file.take(MAX_POLICY_DOCUMENT_BYTES + 1)
            .read_to_end(&mut raw)
            .map_err(|e| inaccessible(&e))?;
        if raw.len() as u64 > MAX_POLICY_DOCUMENT_BYTES {
            return Err(inaccessible(&format!(
                "document exceeds {} bytes",
                MAX_POLICY_DOCUMENT_BYTES
            )));
        }

        serde_json::from_slice(&raw).map_err(|e| inaccessible(&e))
    }
}

/// Interpret a stored policy value as a boolean
fn as_policy_bool(value: &Value) -> Result<bool, LookupFailure> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(LookupFailure::NotBoolean(n.to_string())),
        },
        other => Err(LookupFailure::NotBoolean(other.to_string())),
    }
}

impl PolicyProvider for FilePolicyProvider {
    fn get_policy_boolean(&self, user: &UserIdentity, area: &str, name: &str) -> PolicyResult<bool> {
        let fail = |reason| PolicyError::lookup_failed(user.as_str(), area, name, reason);

        if !user.is_valid() {
            return Err(fail(LookupFailure::InvalidIdentity));
        }

        let document = self.load().map_err(fail)?;
        let value = document
            .users
            .get(user.as_str())
            .and_then(|areas| areas.get(area))
            .and_then(|policies| policies.get(name))
            .ok_or_else(|| fail(LookupFailure::NotFound))?;

        let enabled = as_policy_bool(value).map_err(fail)?;
        trace!(user = %user, area, name, enabled, "policy resolved from file");
        Ok(enabled)
    }
}
