// Crate-level tests for export options and input validation

use pmadump::core::validation;
use pmadump::{Compression, ExportOptions, DEFAULT_PREFIX_FORMAT};
use std::path::PathBuf;

#[test]
fn test_export_options_defaults() {
    let options = ExportOptions::new("http://example.com/pma/", "root", "s3cret");

    assert_eq!(options.compression, Compression::None);
    assert_eq!(options.prefix_format, DEFAULT_PREFIX_FORMAT);
    assert_eq!(options.output_directory, PathBuf::from("."));
    assert_eq!(options.timeout, 60);
    assert!(!options.prepend_date);
    assert!(!options.overwrite_existing);
    assert!(!options.dry_run);
    assert!(options.server_name.is_none());
    assert!(options.basename.is_none());
    assert!(options.http_auth.is_none());
    assert!(options.exclude_dbs.is_empty());
}

#[test]
fn test_compression_round_trip() {
    for method in ["none", "zip", "gzip"] {
        let compression: Compression = method.parse().unwrap();
        assert_eq!(compression.as_str(), method);
    }
}

#[test]
fn test_login_url_validation() {
    assert!(validation::validate_login_url("https://example.com/phpmyadmin/").is_ok());
    assert!(validation::validate_login_url("ftp://example.com").is_err());
    assert!(validation::validate_login_url("").is_err());
}

#[test]
fn test_http_auth_parsing() {
    let (user, pass) = validation::parse_http_auth("admin:s3cret").unwrap();
    assert_eq!(user, "admin");
    assert_eq!(pass, "s3cret");

    assert!(validation::parse_http_auth("missing-separator").is_err());
}
