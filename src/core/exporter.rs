// Exporter - Drives one login -> export -> save run against a phpMyAdmin panel

use chrono::{DateTime, Local};
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::browser::{Browser, Form, Page, Response};
use crate::error::{ExportError, Result};

/// Default strftime pattern for `prepend_date`, e.g. `20250406_153000_`.
pub const DEFAULT_PREFIX_FORMAT: &str = "%Y%m%d_%H%M%S_";

/// Body marker present on the post-login status page.
const LOGIN_MARKER: &str = "Server version";
const EXPORT_LINK_TEXT: &str = "Export";
const LOGIN_FORM: &str = "login_form";
const EXPORT_FORM: &str = "dump";

static CONTENT_DISPOSITION_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename="([^"]+)""#).expect("static regex"));

/// Compression method for the export, selected on the panel's export form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zip,
    Gzip,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zip => "zip",
            Compression::Gzip => "gzip",
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Compression::None),
            "zip" => Ok(Compression::Zip),
            "gzip" => Ok(Compression::Gzip),
            other => Err(ExportError::invalid_input(format!(
                "unknown compression method '{}' (expected none, zip or gzip)",
                other
            ))),
        }
    }
}

/// Immutable configuration for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub url: String,
    pub username: String,
    pub password: String,
    pub server_name: Option<String>,
    pub compression: Compression,
    /// Database names excluded from the dump. Accepted for CLI
    /// compatibility; the export form is submitted with the panel's
    /// defaults, which do not include a per-database selection.
    pub exclude_dbs: Vec<String>,
    pub output_directory: PathBuf,
    pub basename: Option<String>,
    pub prepend_date: bool,
    pub prefix_format: String,
    pub overwrite_existing: bool,
    pub dry_run: bool,
    pub timeout: u64,
    pub http_auth: Option<(String, String)>,
}

impl ExportOptions {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            server_name: None,
            compression: Compression::None,
            exclude_dbs: Vec::new(),
            output_directory: PathBuf::from("."),
            basename: None,
            prepend_date: false,
            prefix_format: DEFAULT_PREFIX_FORMAT.to_string(),
            overwrite_existing: false,
            dry_run: false,
            timeout: 60,
            http_auth: None,
        }
    }
}

/// Owns the web session for one export run: logs in, navigates to the export
/// form, submits it and saves the dump under the configured naming policy.
pub struct Exporter {
    browser: Browser,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Result<Self> {
        let browser = Browser::new(
            Duration::from_secs(options.timeout),
            options.http_auth.clone(),
        )?;

        Ok(Self { browser, options })
    }

    /// Run the whole export procedure. Returns the path the dump was saved
    /// to (or would have been saved to, under `dry_run`).
    pub fn run(&self) -> Result<PathBuf> {
        let page = self.authenticate()?;
        let form = self.open_export_form(&page)?;
        let response = self.submit_export(form)?;

        let content_filename = filename_from_disposition(response.header("content-disposition"))?;
        let filename = build_filename(
            &content_filename,
            self.options.basename.as_deref(),
            self.options.prepend_date,
            &self.options.prefix_format,
            Local::now(),
        )?;
        let path = resolve_output_path(
            &self.options.output_directory,
            &filename,
            self.options.overwrite_existing,
        );

        self.save(response.body(), &path)
    }

    /// Load the login page, fill and submit the login form. The run is
    /// authenticated once the server status page comes back.
    fn authenticate(&self) -> Result<Page> {
        let page = self.browser.open(&self.options.url)?;

        let mut form = page.form(LOGIN_FORM)?;
        form.set("pma_username", &self.options.username);
        form.set("pma_password", &self.options.password);
        if let Some(server) = &self.options.server_name {
            form.set("pma_servername", server);
        }

        let page = self.browser.submit(&form)?.into_page();
        if !page.contains(LOGIN_MARKER) {
            return Err(ExportError::auth(format!(
                "'{}' marker not found after login, check the credentials",
                LOGIN_MARKER
            )));
        }

        Ok(page)
    }

    /// Follow the Export link off the post-login page and locate the dump
    /// form on it.
    fn open_export_form(&self, page: &Page) -> Result<Form> {
        let link = page.link_by_text(EXPORT_LINK_TEXT)?;
        let export_page = self.browser.open(link.as_str())?;
        export_page.form(EXPORT_FORM)
    }

    fn submit_export(&self, mut form: Form) -> Result<Response> {
        if self.options.compression != Compression::None {
            form.select("compression", self.options.compression.as_str())?;
        }
        self.browser.submit(&form)
    }

    fn save(&self, body: &[u8], path: &Path) -> Result<PathBuf> {
        if self.options.dry_run {
            log::debug!("dry run, skipping write of {} bytes", body.len());
            return Ok(path.to_path_buf());
        }

        fs::write(path, body)?;
        Ok(path.to_path_buf())
    }
}

/// Extract the server-suggested filename from the Content-Disposition
/// response header. This is the only explicit validation of the export
/// response; anything unexpected here means no dump was returned.
pub fn filename_from_disposition(header: Option<&str>) -> Result<String> {
    let header = header.ok_or_else(|| {
        ExportError::response_format("response carries no Content-Disposition header")
    })?;

    CONTENT_DISPOSITION_FILENAME_RE
        .captures(header)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| {
            ExportError::response_format(format!(
                "could not determine SQL backup filename from '{}'",
                header
            ))
        })
}

/// Derive the on-disk filename from the server-suggested one: an optional
/// basename override keeps the last extension segment, an optional strftime
/// prefix is prepended.
pub fn build_filename(
    content_filename: &str,
    basename: Option<&str>,
    prepend_date: bool,
    prefix_format: &str,
    now: DateTime<Local>,
) -> Result<String> {
    let mut filename = match basename {
        Some(base) => match content_filename.rfind('.') {
            Some(dot) => format!("{}{}", base, &content_filename[dot..]),
            None => base.to_string(),
        },
        None => content_filename.to_string(),
    };

    if prepend_date {
        let mut prefix = String::new();
        // format() surfaces bad specifiers as fmt::Error on write
        if write!(prefix, "{}", now.format(prefix_format)).is_err() {
            return Err(ExportError::invalid_input(format!(
                "invalid prefix format '{}'",
                prefix_format
            )));
        }
        filename = format!("{}{}", prefix, filename);
    }

    Ok(filename)
}

/// Join directory and filename, stepping around existing files unless
/// overwriting was requested: `dump.sql` becomes `dump_(1).sql`,
/// `dump_(2).sql`, ... until a free path is found.
pub fn resolve_output_path(directory: &Path, filename: &str, overwrite_existing: bool) -> PathBuf {
    let path = directory.join(filename);
    if overwrite_existing || !path.is_file() {
        return path;
    }

    eprintln!(
        "{}",
        format!(
            "File {} already exists, to overwrite it use --overwrite-existing",
            path.display()
        )
        .yellow()
    );

    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1u32;
    loop {
        let candidate = parent.join(format!("{}_({}){}", stem, n, ext));
        if !candidate.is_file() {
            return candidate;
        }
        n += 1;
    }
}
