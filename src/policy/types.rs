/*!
 * Policy Types
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the user a policy is resolved for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An identity must name someone: blank identities are rejected by providers
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for UserIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Fully qualified policy location: area plus policy name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyPath {
    pub area: String,
    pub name: String,
}

impl PolicyPath {
    pub fn new(area: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PolicyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.area, self.name)
    }
}
