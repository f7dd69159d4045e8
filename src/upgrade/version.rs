//! Semantic version parsing and comparison.
//!
//! A thin layer over [`semver`]: parsing trims surrounding whitespace (version files
//! usually end with a newline) and maps failures into
//! [`UpgradeError::InvalidVersionFormat`]. Comparisons use semver precedence, so
//! `1.2.3-rc.1 < 1.2.3 < 1.2.4` and build metadata (`1.2.3+linux`) is ignored.

pub use semver::Version;

use std::cmp::Ordering;

use crate::core::{Result, UpgradeError};

/// Parse a semantic version string.
///
/// Leading and trailing whitespace is ignored. A `v` prefix is not accepted.
///
/// # Errors
///
/// Returns [`UpgradeError::InvalidVersionFormat`] when the string is not a valid
/// semantic version.
///
/// # Examples
///
/// ```rust
/// use selfup::upgrade::version::parse;
///
/// let version = parse("1.2.3\n").unwrap();
/// assert_eq!(version.to_string(), "1.2.3");
/// assert!(parse("v1.2.3").is_err());
/// ```
pub fn parse(version: &str) -> Result<Version> {
    Version::parse(version.trim()).map_err(|source| UpgradeError::InvalidVersionFormat {
        version: version.to_string(),
        source,
    })
}

/// Compare by semver precedence.
///
/// Unlike `Ord for Version`, build metadata does not participate.
#[must_use]
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// `true` when `available` takes precedence over `current`.
#[must_use]
pub fn is_newer(current: &Version, available: &Version) -> bool {
    cmp_precedence(available, current) == Ordering::Greater
}

/// `true` when `current` is the same as or newer than `available`.
#[must_use]
pub fn is_up_to_date(current: &Version, available: &Version) -> bool {
    cmp_precedence(current, available) != Ordering::Less
}
