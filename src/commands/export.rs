use anyhow::{Context, Result};
use colored::Colorize;
use std::env;
use std::path::PathBuf;

use crate::core::exporter::{Compression, ExportOptions, Exporter, DEFAULT_PREFIX_FORMAT};
use crate::core::validation;

/// Execute the export: build options from CLI matches, run the exporter and
/// report the saved path.
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let options = build_options(matches)?;
    let quiet = matches.get_flag("quiet");
    let dry_run = options.dry_run;

    let exporter = Exporter::new(options)?;
    let path = exporter.run()?;

    if !quiet {
        let verb = if dry_run {
            "Would have".yellow()
        } else {
            "Successfully".green()
        };
        println!("{} saved SQL dump to: {}", verb, path.display());
    }

    Ok(())
}

/// Translate the argument surface into exporter options, validating inputs
/// before any network traffic.
fn build_options(matches: &clap::ArgMatches) -> Result<ExportOptions> {
    let url = matches.get_one::<String>("url").context("URL is required")?;
    let username = matches
        .get_one::<String>("username")
        .context("Username is required")?;
    let password = matches
        .get_one::<String>("password")
        .context("Password is required")?;

    validation::validate_login_url(url)
        .with_context(|| format!("Invalid login URL: {}", url))?;

    let mut options = ExportOptions::new(url, username, password);

    options.server_name = matches.get_one::<String>("server-name").cloned();
    options.compression = matches
        .get_one::<String>("compression")
        .map(String::as_str)
        .unwrap_or("none")
        .parse::<Compression>()?;
    options.basename = matches.get_one::<String>("basename").cloned();
    options.prepend_date = matches.get_flag("prepend-date");
    options.overwrite_existing = matches.get_flag("overwrite-existing");
    options.dry_run = matches.get_flag("dry-run");
    options.timeout = *matches.get_one::<u64>("timeout").unwrap_or(&60);

    if let Some(format) = matches.get_one::<String>("prefix-format") {
        options.prefix_format = format.clone();
    } else {
        options.prefix_format = DEFAULT_PREFIX_FORMAT.to_string();
    }

    if let Some(exclude) = matches.get_one::<String>("exclude-dbs") {
        options.exclude_dbs = exclude
            .split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
    }

    options.output_directory = match matches.get_one::<String>("output-directory") {
        Some(dir) => {
            validation::validate_output_directory(dir)?;
            PathBuf::from(dir)
        }
        None => env::current_dir().context("Could not determine the current directory")?,
    };

    if let Some(credentials) = matches.get_one::<String>("http-auth") {
        options.http_auth = Some(validation::parse_http_auth(credentials)?);
    }

    Ok(options)
}
