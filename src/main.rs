use clap::{Arg, Command};
use colored::Colorize;
use std::process;

use pmadump::commands;

fn main() {
    pmadump::init_logging();

    let matches = Command::new("pmadump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Automates the download of SQL dump backups via a phpMyAdmin web interface")
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("phpMyAdmin login page url")
                .required(true)
                .index(1)
        )
        .arg(
            Arg::new("username")
                .value_name("USERNAME")
                .help("phpMyAdmin login username")
                .required(true)
                .index(2)
        )
        .arg(
            Arg::new("password")
                .value_name("PASSWORD")
                .help("phpMyAdmin login password")
                .required(true)
                .index(3)
        )
        .arg(
            Arg::new("output-directory")
                .short('o')
                .long("output-directory")
                .value_name("DIR")
                .help("Output directory for the SQL dump file (default: the current working directory)")
        )
        .arg(
            Arg::new("prepend-date")
                .short('p')
                .long("prepend-date")
                .help("Prepend the current date & time to the filename; see the --prefix-format option for custom formatting")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("exclude-dbs")
                .short('e')
                .long("exclude-dbs")
                .value_name("DB,DB,...")
                .help("Comma-separated list of database names to exclude from the dump")
        )
        .arg(
            Arg::new("server-name")
                .short('s')
                .long("server-name")
                .value_name("HOST")
                .help("MySQL server hostname to supply if enabled as field on the login page")
        )
        .arg(
            Arg::new("compression")
                .short('c')
                .long("compression")
                .value_name("METHOD")
                .value_parser(["none", "zip", "gzip"])
                .default_value("none")
                .help("Compression method for the output file - must be supported by the server")
        )
        .arg(
            Arg::new("basename")
                .long("basename")
                .value_name("NAME")
                .help("The desired basename (without extension) of the SQL dump file; you can also set an empty basename \"\" in combination with --prepend-date and --prefix-format")
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not print any output")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .default_value("60")
                .help("Timeout in seconds for the requests")
        )
        .arg(
            Arg::new("overwrite-existing")
                .long("overwrite-existing")
                .help("Overwrite existing SQL dump files (instead of appending a number to the name)")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("prefix-format")
                .long("prefix-format")
                .value_name("FORMAT")
                .requires("prepend-date")
                .help("The prefix format for --prepend-date (default: \"%Y%m%d_%H%M%S_\"), in strftime notation; must be used with --prepend-date to be in effect")
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Dry run, do not actually download any file")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("http-auth")
                .long("http-auth")
                .value_name("USER:PASS")
                .help("Basic HTTP authentication, using format \"username:password\"")
        )
        .get_matches();

    if let Err(e) = commands::export(&matches) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        process::exit(1);
    }
}
