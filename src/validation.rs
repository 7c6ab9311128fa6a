//! Validation for user-supplied inputs: the backend URL, the refresh
//! interval, and log file paths. Everything here is checked before any
//! network or filesystem access happens.

use crate::error::{ConnwatchError, Result};
use std::path::Path;

/// Maximum allowed length for endpoint URLs
const MAX_URL_LEN: usize = 2048;

/// Maximum allowed length for file paths
const MAX_PATH_LEN: usize = 4096;

/// Maximum allowed refresh interval in milliseconds
const MAX_REFRESH_INTERVAL: u64 = 60_000; // 1 minute

/// Minimum allowed refresh interval in milliseconds
const MIN_REFRESH_INTERVAL: u64 = 100; // 0.1 seconds

/// Validates a backend base URL before the poller or block sink touch it.
///
/// # Examples
/// ```
/// use connwatch::validation::validate_endpoint_url;
///
/// assert!(validate_endpoint_url("http://localhost:4000").is_ok());
/// assert!(validate_endpoint_url("ftp://example.com").is_err());
/// ```
pub fn validate_endpoint_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ConnwatchError::Validation(
            "Endpoint URL cannot be empty".to_string(),
        ));
    }

    if url.len() > MAX_URL_LEN {
        return Err(ConnwatchError::Validation(format!(
            "Endpoint URL too long (max {MAX_URL_LEN} characters)"
        )));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConnwatchError::Validation(
            "Endpoint URL must start with http:// or https://".to_string(),
        ));
    }

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConnwatchError::Validation(
            "Whitespace and control characters not allowed in endpoint URL".to_string(),
        ));
    }

    // The scheme alone is not a usable URL
    let rest = url.trim_start_matches("http://").trim_start_matches("https://");
    if rest.is_empty() {
        return Err(ConnwatchError::Validation(
            "Endpoint URL has no host".to_string(),
        ));
    }

    Ok(())
}

/// Validates the polling cadence. The floor keeps the dashboard from
/// hammering the backend; the ceiling keeps the view from being useless.
pub fn validate_refresh_interval(interval_ms: u64) -> Result<()> {
    if interval_ms < MIN_REFRESH_INTERVAL {
        return Err(ConnwatchError::Validation(format!(
            "Refresh interval too small (minimum {MIN_REFRESH_INTERVAL}ms)"
        )));
    }

    if interval_ms > MAX_REFRESH_INTERVAL {
        return Err(ConnwatchError::Validation(format!(
            "Refresh interval too large (maximum {MAX_REFRESH_INTERVAL}ms)"
        )));
    }

    Ok(())
}

/// Validates log file paths: length, traversal, control characters, and
/// a block on writing into kernel pseudo-filesystems.
pub fn validate_file_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConnwatchError::Validation(
            "File path cannot be empty".to_string(),
        ));
    }

    if path.len() > MAX_PATH_LEN {
        return Err(ConnwatchError::Validation(format!(
            "File path too long (max {MAX_PATH_LEN} characters)"
        )));
    }

    if path.contains('\0') || path.chars().any(|c| c.is_control()) {
        return Err(ConnwatchError::Validation(
            "Control characters not allowed in file path".to_string(),
        ));
    }

    if path.contains("..") {
        return Err(ConnwatchError::Validation(
            "Path traversal not allowed in file path".to_string(),
        ));
    }

    let normalized = Path::new(path);
    for prefix in ["/proc", "/sys", "/dev"] {
        if normalized.starts_with(prefix) {
            return Err(ConnwatchError::Validation(format!(
                "Refusing to write log under {prefix}"
            )));
        }
    }

    Ok(())
}
