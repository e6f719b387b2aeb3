//! doc-walker: a linear "next page" walker for paginated documentation
//!
//! This crate follows "next page" links from a starting documentation URL,
//! records the pages in reading order, and converts each of them to Markdown.

pub mod config;
pub mod convert;
pub mod crawler;
pub mod oracle;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for doc-walker operations
#[derive(Debug, Error)]
pub enum WalkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, Driver};
pub use oracle::NextLinkOracle;
pub use state::{CrawlState, StopReason};
pub use url::{normalize, NormalizeOptions, VisitedSet};
