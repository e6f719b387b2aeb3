//! Configuration module for doc-walker
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so the file itself is optional.
//!
//! # Example
//!
//! ```no_run
//! use doc_walker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("doc-walker.toml")).unwrap();
//! println!("Walker will record at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, NormalizeConfig, OracleConfig, OracleKind, OutputConfig,
    ReasoningEffort, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
