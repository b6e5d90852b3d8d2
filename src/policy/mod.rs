/*!
 * Policy Providers
 *
 * Read-only sources of named boolean policies scoped to a user identity.
 * The watcher only depends on the [`PolicyProvider`] trait; the in-memory
 * and JSON-file providers here are the built-in implementations.
 */

mod file_provider;
mod static_provider;
pub mod traits;
pub mod types;

pub use file_provider::FilePolicyProvider;
pub use static_provider::StaticPolicyProvider;
pub use traits::PolicyProvider;
pub use types::{PolicyPath, UserIdentity};
