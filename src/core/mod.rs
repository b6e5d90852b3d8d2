/*!
 * Core Module
 * Error types and shared constants
 */

pub mod errors;
pub mod limits;

// Re-export for convenience
pub use errors::*;
