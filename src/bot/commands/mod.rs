//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Administrator commands
pub mod admin;

/// Balance, history, borrow list and statistics commands
pub mod credits;

/// General utility commands
pub mod general;

/// Borrow and return commands
pub mod lending;

// Export commands
pub use admin::*;
pub use credits::*;
pub use general::*;
pub use lending::*;
