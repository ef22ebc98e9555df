//! Defines the configuration settings for the whatsmyname-probe application.

use crate::classifier::OutputMode;
use crate::error::{AppError, Result};
use clap::{Parser, ValueEnum};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";
const RANDOM_USERNAME_LEN: usize = 10;

/// How the filtered results are rendered.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Command line arguments for whatsmyname-probe
#[derive(Parser, Debug)]
#[command(author, version, about = "Check which WhatsMyName sites have an account for a username", long_about = None)]
pub(crate) struct AppArgs {
    /// Usernames to check (repeat the flag or separate with commas)
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub usernames: Vec<String>,

    /// Path to the WhatsMyName sites JSON file
    #[arg(short, long, env = "WHATSMYNAME_INPUT_FILE")]
    pub input_file: Option<String>,

    /// Only probe sites in this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only probe the named sites
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub sites: Vec<String>,

    /// Show every result, whatever its status
    #[arg(short, long, conflicts_with = "not_found")]
    pub all: bool,

    /// Show only results that matched the site's missing code
    #[arg(short, long)]
    pub not_found: bool,

    /// Keep and print the raw response body
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Connect and read timeout per request, in seconds
    #[arg(long, env = "WHATSMYNAME_TIMEOUT")]
    pub timeout: Option<u64>,

    /// User agent string sent with every probe
    #[arg(long, env = "WHATSMYNAME_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Follow HTTP redirects
    #[arg(long)]
    pub follow_redirects: bool,

    /// Check each site against its own known usernames instead of --usernames
    #[arg(long)]
    pub validate_knowns: bool,

    /// Write a file for every not-found result under <capture-dir>/whatsmyname
    #[arg(long)]
    pub capture_errors: bool,

    /// Base directory for captured error files (defaults to the temp dir)
    #[arg(long, env = "WHATSMYNAME_CAPTURE_DIR")]
    pub capture_dir: Option<PathBuf>,

    /// Also check a randomly generated username, to spot false positives
    #[arg(long)]
    pub random_username: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Path to configuration file (TOML format)
    #[arg(long, env = "WHATSMYNAME_CONFIG")]
    pub config_file: Option<String>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    corpus: Option<CorpusConfig>,
    output: Option<OutputConfig>,
    capture: Option<CaptureConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    timeout: Option<u64>,
    user_agent: Option<String>,
    follow_redirects: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct CorpusConfig {
    input_file: Option<String>,
    category: Option<String>,
    sites: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
struct OutputConfig {
    mode: Option<OutputMode>,
    format: Option<OutputFormat>,
    output_file: Option<PathBuf>,
    verbose: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct CaptureConfig {
    capture_errors: Option<bool>,
    capture_dir: Option<PathBuf>,
}

/// Settings for one run. Built once in `main` and passed down explicitly.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Path to the WhatsMyName corpus file.
    pub input_file: String,
    /// Usernames to probe every selected site with.
    pub usernames: Vec<String>,
    /// Case-insensitive category filter.
    pub category: Option<String>,
    /// Case-insensitive site-name allow-list. Empty means no allow-list.
    pub sites: Vec<String>,
    /// User agent string assigned to every site.
    pub user_agent: String,
    /// Applied separately to the connect phase and to each read.
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub output_mode: OutputMode,
    pub format: OutputFormat,
    /// Report destination; stdout when `None`.
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
    /// Probe each site with its own `known` usernames.
    pub validate_knowns: bool,
    pub capture_errors: bool,
    /// Root under which `whatsmyname/<username>/<site>.json` is written.
    pub capture_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_file: "web_accounts_list.json".to_string(),
            usernames: Vec::new(),
            category: None,
            sites: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            follow_redirects: false,
            output_mode: OutputMode::Found,
            format: OutputFormat::Table,
            output_file: None,
            verbose: false,
            validate_knowns: false,
            capture_errors: false,
            capture_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    /// Whether probes must read and keep the response body.
    pub(crate) fn capture_body(&self) -> bool {
        self.verbose || self.capture_errors
    }
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&content)?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(follow) = network.follow_redirects {
            config.follow_redirects = follow;
        }
    }

    if let Some(corpus) = &file_config.corpus {
        if let Some(input) = &corpus.input_file {
            config.input_file = input.clone();
        }
        if let Some(category) = &corpus.category {
            config.category = Some(category.clone());
        }
        if let Some(sites) = &corpus.sites {
            config.sites = sites.clone();
        }
    }

    if let Some(output) = &file_config.output {
        if let Some(mode) = output.mode {
            config.output_mode = mode;
        }
        if let Some(format) = output.format {
            config.format = format;
        }
        if let Some(file) = &output.output_file {
            config.output_file = Some(file.clone());
        }
        if let Some(verbose) = output.verbose {
            config.verbose = verbose;
        }
    }

    if let Some(capture) = &file_config.capture {
        if let Some(enabled) = capture.capture_errors {
            config.capture_errors = enabled;
        }
        if let Some(dir) = &capture.capture_dir {
            config.capture_dir = dir.clone();
        }
    }
}

/// Apply command line arguments to the Config instance.
/// Boolean flags can only switch a setting on; the file decides otherwise.
fn apply_cli_args(config: &mut Config, args: &AppArgs) {
    config.usernames = args.usernames.clone();

    if let Some(ref input) = args.input_file {
        config.input_file = input.clone();
    }
    if let Some(ref category) = args.category {
        config.category = Some(category.clone());
    }
    if !args.sites.is_empty() {
        config.sites = args.sites.clone();
    }

    if args.all {
        config.output_mode = OutputMode::All;
    } else if args.not_found {
        config.output_mode = OutputMode::NotFound;
    }

    if let Some(timeout) = args.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }
    if let Some(ref dir) = args.capture_dir {
        config.capture_dir = dir.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(ref file) = args.output_file {
        config.output_file = Some(file.clone());
    }

    config.follow_redirects |= args.follow_redirects;
    config.verbose |= args.verbose;
    config.validate_knowns |= args.validate_knowns;
    config.capture_errors |= args.capture_errors;

    if args.random_username {
        let username = generate_random_username();
        tracing::info!("Adding random username {} to the target list", username);
        config.usernames.push(username);
    }
}

fn validate_config(config: &mut Config) -> Result<()> {
    config.usernames.retain(|u| !u.is_empty());

    if config.usernames.is_empty() && !config.validate_knowns {
        return Err(AppError::Config(
            "No usernames supplied; pass --usernames, --random-username or --validate-knowns"
                .to_string(),
        ));
    }

    if config.timeout.is_zero() {
        config.timeout = Duration::from_secs(1);
        tracing::warn!("Timeout was set to 0. Setting to 1 second.");
    }

    if config.user_agent.trim().is_empty() {
        config.user_agent = DEFAULT_USER_AGENT.to_string();
        tracing::warn!("User agent was empty. Using the default user agent.");
    }

    Ok(())
}

/// Builds the run configuration: defaults, then the config file, then the command line.
pub(crate) fn build_config(args: &AppArgs) -> Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./whatsmyname.toml", "./config.toml"] {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config)?;

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}

pub(crate) fn generate_random_username() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_USERNAME_LEN)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
