//! Command-line client for Pleasant Password Server.
//!
//! Resolves a slash-delimited path to a credential entry and prints one
//! of its attributes or downloads its attachments. Connection parameters
//! come from flags, `PLEASANT_*` environment variables, the config file,
//! or an interactive prompt, in that order.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser};
use zeroize::Zeroizing;

use pleasant_client::{ApiClient, ApiConfig, Database, Entry, Error};

mod config;

#[derive(Parser, Debug)]
#[command(name = "pleasant", version, about = "Read-only Pleasant Password Server client")]
struct Cli {
    #[command(flatten)]
    select: Select,

    /// Attachments are downloaded to this directory
    #[arg(long, value_name = "DIR", env = "PLEASANT_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Base URL of the Pleasant server API
    #[arg(long, value_name = "URL", env = "PLEASANT_SERVER_URL")]
    server_url: Option<String>,

    /// User for the server API
    #[arg(long, value_name = "USER", env = "PLEASANT_API_USER")]
    api_user: Option<String>,

    /// Password for the server API (prompted when absent)
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "PLEASANT_API_PASSWORD",
        hide_env_values = true
    )]
    api_password: Option<String>,

    /// Disable HTTPS certificate verification
    #[arg(long, env = "PLEASANT_DISABLE_CERT_CHECK")]
    disable_cert_check: bool,

    /// Info-level diagnostics on stderr
    #[arg(long)]
    verbose: bool,

    /// Debug-level diagnostics on stderr
    #[arg(long, env = "PLEASANT_DEBUG")]
    debug: bool,

    /// Config file (default: ~/.config/pleasant/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the credential entry, e.g. /Development/git
    #[arg(value_name = "PATH")]
    path: String,
}

/// Which attribute of the resolved entry to print or download.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Select {
    /// Print the username
    #[arg(long)]
    username: bool,

    /// Print the password
    #[arg(long)]
    password: bool,

    /// Print the URL
    #[arg(long)]
    url: bool,

    /// Print the given custom field
    #[arg(long, value_name = "NAME")]
    custom_field: Option<String>,

    /// Download the given attachment(s); with no name, download all
    #[arg(long, value_name = "FILE", num_args = 0..)]
    attachments: Option<Vec<String>>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_config = config::load(cli.config.clone());

    let server_url = match cli.server_url.or(file_config.server_url) {
        Some(url) => url,
        None => prompt_line("Pleasant server URL")?,
    };
    let username = match cli.api_user.or(file_config.api_user) {
        Some(user) => user,
        None => prompt_line("Pleasant user")?,
    };
    let password = match cli.api_password {
        Some(password) => Zeroizing::new(password),
        None => Zeroizing::new(
            rpassword::prompt_password("Password: ").context("reading password from terminal")?,
        ),
    };

    let api = ApiClient::new(ApiConfig {
        server_url,
        username,
        password,
        danger_accept_invalid_certs: cli.disable_cert_check || file_config.disable_cert_check,
    })?;

    let database = Database::fetch(Arc::new(api))?;
    let entry = database.lookup_entry(&cli.path)?;

    if cli.select.username {
        println!("{}", entry.username());
    } else if cli.select.password {
        println!("{}", entry.password()?.as_str());
    } else if cli.select.url {
        println!("{}", entry.url());
    } else if let Some(name) = &cli.select.custom_field {
        let value = entry.custom_fields().get(name).ok_or_else(|| {
            Error::ElementNotFound {
                path: cli.path.clone(),
                element: name.clone(),
            }
        })?;
        println!("{value}");
    } else if let Some(names) = &cli.select.attachments {
        let dir = cli
            .download_dir
            .or(file_config.download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        download_attachments(entry, names, &dir, &cli.path)?;
    }

    Ok(())
}

/// Download the named attachments (all of them when `names` is empty)
/// into `dir`, printing one `<path>: <file> -> <target>` line each.
fn download_attachments(entry: &Entry, names: &[String], dir: &Path, path: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating download directory {}", dir.display()))?;

    let names: Vec<&String> = if names.is_empty() {
        entry.attachments().keys().collect()
    } else {
        names.iter().collect()
    };

    for name in names {
        let attachment = entry.attachments().get(name).ok_or_else(|| {
            Error::ElementNotFound {
                path: path.to_string(),
                element: name.clone(),
            }
        })?;
        let target = dir.join(attachment.name());
        println!("{path}: {name} -> {}", target.display());
        attachment.download(&target)?;
    }
    Ok(())
}

/// Visible-text prompt on stderr, read from stdin.
fn prompt_line(label: &str) -> Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("{label} must not be empty");
    }
    Ok(value)
}
