//! Defines the custom error types for the whatsmyname-probe application.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for a probe run.
///
/// Only configuration and I/O problems are represented here. Failures of an
/// individual probe are data (a sentinel status code), never an `AppError`.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// An explicit site allow-list matched nothing in the corpus.
    #[error("No sites with id(s) {} used input file {input_file}", .sites.join(" "))]
    NoSitesMatched {
        /// The site names that were requested.
        sites: Vec<String>,
        /// The corpus file the names were looked up in.
        input_file: String,
    },

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a TOML configuration file.
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error building the shared HTTP client.
    #[error("HTTP Client Error: {0}")]
    Request(#[from] reqwest::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sites_matched_message_lists_requested_sites() {
        let err = AppError::NoSitesMatched {
            sites: vec!["GitHub".to_string(), "Nope".to_string()],
            input_file: "web_accounts_list.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No sites with id(s) GitHub Nope used input file web_accounts_list.json"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = AppError::Config("No usernames supplied".to_string());
        assert_eq!(err.to_string(), "Configuration Error: No usernames supplied");
    }
}
