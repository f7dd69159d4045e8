//! Core types shared by every selfup module.
//!
//! At the moment this is the error system: the [`UpgradeError`] taxonomy and the
//! [`ErrorContext`] used to present errors to users.

pub mod error;

pub use error::{ErrorContext, UpgradeError, user_friendly_error};

/// Result alias used across the upgrade workflow.
pub type Result<T, E = UpgradeError> = std::result::Result<T, E>;
