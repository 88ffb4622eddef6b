// Validation module for command-line inputs
// Everything here runs before any network traffic or filesystem write

use anyhow::{ensure, Context, Result};
use std::path::Path;
use url::Url;

/// Maximum URL length accepted for the login page
const MAX_URL_LENGTH: usize = 2048;

/// Validates the phpMyAdmin login page URL
///
/// Uses the `url` crate for robust URL parsing instead of manual validation.
/// This validates:
/// - URL format (syntax, encoding, etc.)
/// - Protocol must be http or https
/// - Must have a valid hostname
/// - Length limit
pub fn validate_login_url(url_str: &str) -> Result<()> {
    let trimmed = url_str.trim();

    ensure!(!trimmed.is_empty(), "URL cannot be empty");
    ensure!(
        url_str.len() <= MAX_URL_LENGTH,
        "URL is too long ({} characters, max {})",
        url_str.len(),
        MAX_URL_LENGTH
    );
    ensure!(
        !url_str.contains('\0'),
        "URL contains null byte - security risk"
    );

    let url = Url::parse(url_str).context("Invalid URL format")?;

    let scheme = url.scheme();
    ensure!(
        scheme == "http" || scheme == "https",
        "URL must use http or https protocol, got: {}",
        scheme
    );

    ensure!(url.host_str().is_some(), "URL has no hostname");

    Ok(())
}

/// Validates the output directory path
/// Checks for:
/// - Empty paths
/// - Path pointing to a file instead of a directory
pub fn validate_output_directory(path: &str) -> Result<()> {
    let trimmed = path.trim();
    ensure!(
        !trimmed.is_empty(),
        "Output directory cannot be empty or whitespace-only"
    );
    ensure!(
        !path.contains('\0'),
        "Output directory contains null byte - security risk"
    );

    let path_buf = Path::new(path);
    if path_buf.exists() {
        ensure!(
            path_buf.is_dir(),
            "Output path points to a file, not a directory: {}",
            path
        );
    }

    Ok(())
}

/// Validates HTTP basic-auth credentials given as "username:password"
pub fn parse_http_auth(credentials: &str) -> Result<(String, String)> {
    let (user, pass) = credentials
        .split_once(':')
        .context("HTTP auth credentials must use the format \"username:password\"")?;
    ensure!(!user.is_empty(), "HTTP auth username cannot be empty");

    Ok((user.to_string(), pass.to_string()))
}
