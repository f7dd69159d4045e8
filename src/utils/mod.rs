//! Cross-platform helpers used by the upgrade workflow.
//!
//! - [`platform`]: home directory lookup and OS/architecture identification
//! - [`progress`]: download progress bars

pub mod platform;
pub mod progress;

pub use platform::{Platform, get_home_dir};
