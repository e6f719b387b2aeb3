//! Crawler module: page fetching and the traversal driver
//!
//! This module contains the walking logic, including:
//! - HTTP fetching with a single attempt per page
//! - The step-by-step traversal state machine
//! - Assembly of a driver from configuration

mod driver;
mod fetcher;

pub use driver::{CrawlOutcome, Driver, DriverSettings};
pub use fetcher::{
    build_http_client, is_html, FetchFailure, HttpFetcher, PageContent, PageFetcher,
};

use crate::config::Config;
use crate::oracle::build_oracle;
use crate::url::NormalizeOptions;
use crate::WalkerError;
use url::Url;

/// Builds a driver for `start_url` from configuration
///
/// The oracle is built first so missing credentials are reported before
/// any network activity.
pub fn build_driver(config: &Config, start_url: &Url) -> Result<Driver, WalkerError> {
    let (settings, fetcher, oracle) = components(config)?;
    Ok(Driver::new(start_url, settings, fetcher, oracle)?)
}

/// Builds a driver continuing from a previous URL list
///
/// Returns `Ok(None)` when the list is empty.
pub fn build_resumed_driver(
    config: &Config,
    previous: &[Url],
) -> Result<Option<Driver>, WalkerError> {
    let (settings, fetcher, oracle) = components(config)?;
    Ok(Driver::resume(previous, settings, fetcher, oracle))
}

type Components = (
    DriverSettings,
    Box<dyn PageFetcher>,
    Box<dyn crate::oracle::NextLinkOracle>,
);

fn components(config: &Config) -> Result<Components, WalkerError> {
    let normalize = NormalizeOptions::from(&config.normalize);
    let oracle = build_oracle(&config.oracle, normalize)?;
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;

    Ok((DriverSettings::from(config), Box::new(fetcher), oracle))
}
