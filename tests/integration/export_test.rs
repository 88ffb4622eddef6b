// End-to-end export tests against a mock phpMyAdmin panel

use pmadump::core::browser::Browser;
use pmadump::{Compression, ExportError, ExportOptions, Exporter};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
<form name="login_form" action="index.php" method="post">
    <input type="hidden" name="token" value="d3adb33f" />
    <input type="text" name="pma_username" />
    <input type="password" name="pma_password" />
    <input type="submit" value="Log in" />
</form>
</body></html>"#;

const MAIN_PAGE: &str = r#"<html><body>
<div id="serverinfo">Server version: 10.4.32-MariaDB</div>
<ul><li><a href="server_export.php?server=1">Export</a></li></ul>
</body></html>"#;

const EXPORT_PAGE: &str = r#"<html><body>
<form name="dump" action="export.php" method="post">
    <input type="hidden" name="token" value="d3adb33f" />
    <input type="hidden" name="export_type" value="server" />
    <input type="radio" name="compression" value="none" checked />
    <input type="radio" name="compression" value="zip" />
    <input type="radio" name="compression" value="gzip" />
</form>
</body></html>"#;

const DUMP_BODY: &[u8] = b"-- MySQL dump\nCREATE TABLE t (id INT);\n";

/// Mounts the login page, the post-login status page and the export page.
/// The export submission itself is mounted per test.
async fn mount_panel(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MAIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/server_export.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXPORT_PAGE))
        .mount(server)
        .await;
}

fn dump_response(filename: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header(
            "content-disposition",
            format!("attachment; filename=\"{}\"", filename).as_str(),
        )
        .set_body_bytes(DUMP_BODY)
}

/// The exporter is fully synchronous; run it off the async test runtime.
async fn run_export(options: ExportOptions) -> Result<PathBuf, ExportError> {
    tokio::task::spawn_blocking(move || Exporter::new(options)?.run())
        .await
        .expect("export thread panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn export_saves_dump_with_server_suggested_name() {
    let server = MockServer::start().await;
    mount_panel(&server).await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .and(body_string_contains("compression=gzip"))
        .and(body_string_contains("token=d3adb33f"))
        .respond_with(dump_response("dump.sql.gz"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.compression = Compression::Gzip;
    options.output_directory = dir.path().to_path_buf();

    let path = run_export(options).await.unwrap();

    assert_eq!(path, dir.path().join("dump.sql.gz"));
    assert_eq!(fs::read(&path).unwrap(), DUMP_BODY);
}

#[tokio::test(flavor = "multi_thread")]
async fn login_submits_credentials_and_hidden_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    // The login POST must carry the filled credentials, the server name and
    // the hidden token collected from the form
    Mock::given(method("POST"))
        .and(path("/index.php"))
        .and(body_string_contains("pma_username=root"))
        .and(body_string_contains("pma_password=s3cret"))
        .and(body_string_contains("pma_servername=db1"))
        .and(body_string_contains("token=d3adb33f"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MAIN_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/server_export.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXPORT_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .respond_with(dump_response("dump.sql"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.server_name = Some("db1".to_string());
    options.output_directory = dir.path().to_path_buf();

    run_export(options).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn basename_override_keeps_server_extension() {
    let server = MockServer::start().await;
    mount_panel(&server).await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .respond_with(dump_response("localhost.sql"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.basename = Some("backup".to_string());
    options.output_directory = dir.path().to_path_buf();

    let path = run_export(options).await.unwrap();
    assert_eq!(path, dir.path().join("backup.sql"));
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_file_gets_numeric_suffix() {
    let server = MockServer::start().await;
    mount_panel(&server).await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .respond_with(dump_response("dump.sql"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dump.sql"), b"old dump").unwrap();

    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.output_directory = dir.path().to_path_buf();

    let path = run_export(options).await.unwrap();

    assert_eq!(path, dir.path().join("dump_(1).sql"));
    assert_eq!(fs::read(&path).unwrap(), DUMP_BODY);
    // The original dump is left alone
    assert_eq!(fs::read(dir.path().join("dump.sql")).unwrap(), b"old dump");
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_reports_path_without_writing() {
    let server = MockServer::start().await;
    mount_panel(&server).await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .respond_with(dump_response("dump.sql"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.dry_run = true;
    options.output_directory = dir.path().to_path_buf();

    let path = run_export(options).await.unwrap();

    assert_eq!(path, dir.path().join("dump.sql"));
    assert!(!path.exists(), "dry run must not create the file");
}

#[tokio::test(flavor = "multi_thread")]
async fn login_without_marker_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Access denied</body></html>"),
        )
        .mount(&server)
        .await;

    let options = ExportOptions::new(&server.uri(), "root", "wrong");
    let err = run_export(options).await.unwrap_err();
    assert!(matches!(err, ExportError::Auth(_)), "got: {}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_export_link_is_a_navigation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body>Server version: 10.4.32-MariaDB</body></html>",
        ))
        .mount(&server)
        .await;

    let options = ExportOptions::new(&server.uri(), "root", "s3cret");
    let err = run_export(options).await.unwrap_err();
    assert!(matches!(err, ExportError::Navigation(_)), "got: {}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_content_disposition_writes_nothing() {
    let server = MockServer::start().await;
    mount_panel(&server).await;

    Mock::given(method("POST"))
        .and(path("/export.php"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(DUMP_BODY))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut options = ExportOptions::new(&server.uri(), "root", "s3cret");
    options.output_directory = dir.path().to_path_buf();

    let err = run_export(options).await.unwrap_err();

    assert!(matches!(err, ExportError::ResponseFormat(_)), "got: {}", err);
    assert_eq!(
        fs::read_dir(dir.path()).unwrap().count(),
        0,
        "no file may be written on a malformed export response"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn browser_applies_basic_auth_to_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        let browser = Browser::new(
            Duration::from_secs(5),
            Some(("admin".to_string(), "s3cret".to_string())),
        )
        .unwrap();
        browser.open(&uri).unwrap();
    })
    .await
    .unwrap();
}
