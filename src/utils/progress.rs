//! Download progress reporting.
//!
//! Thin layer over [`indicatif`] so every byte counter in selfup looks the same.
//! Progress is drawn to stderr and is hidden entirely when disabled, when the
//! total size is unknown, or when `SELFUP_NO_PROGRESS` is set.

use indicatif::{ProgressBar, ProgressStyle};

/// Environment variable that suppresses progress output regardless of configuration.
pub const NO_PROGRESS_VAR: &str = "SELFUP_NO_PROGRESS";

/// Create a byte-counting bar for a download of `total` bytes.
///
/// Returns a hidden bar when `enabled` is false, `total` is `None`, or
/// [`NO_PROGRESS_VAR`] is set.
pub fn download_bar(total: Option<u64>, enabled: bool, prefix: &str) -> ProgressBar {
    let suppressed = std::env::var_os(NO_PROGRESS_VAR).is_some();

    match total {
        Some(len) if enabled && !suppressed => {
            let bar = ProgressBar::new(len);
            bar.set_style(download_style());
            bar.set_prefix(prefix.to_string());
            bar
        }
        _ => ProgressBar::hidden(),
    }
}

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}
