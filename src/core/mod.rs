/*!
 * Core Module
 * Fundamental types, limits and error handling
 */

pub mod errors;
pub mod inline_string;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use inline_string::InlineString;
pub use types::*;
