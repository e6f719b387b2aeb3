//! Next-link oracles
//!
//! An oracle looks at exactly one page and answers with the href of the link
//! that continues the documentation's reading order, or `None` when the page
//! offers no clear forward link. It keeps no memory between calls; loop
//! protection lives in the driver.
//!
//! Two implementations ship with the crate:
//! - [`HeuristicOracle`]: `rel="next"` markup and anchor-text rules
//! - [`LlmOracle`]: delegates the decision to a chat-completions model

mod heuristic;
mod llm;

pub use heuristic::HeuristicOracle;
pub use llm::{truncate_html, LlmError, LlmOracle};

use crate::config::{OracleConfig, OracleKind};
use crate::url::{normalize, NormalizeOptions};
use crate::ConfigError;
use async_trait::async_trait;
use url::Url;

/// Decides which link on a page leads to the next page
#[async_trait]
pub trait NextLinkOracle: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns the raw href of the next-page link, as written in the page
    async fn extract_next_link(&self, html: &str, current_url: &Url) -> Option<String>;
}

/// A next-link answer on its way to becoming an absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub raw_link: Option<String>,
    pub resolved_url: Option<Url>,
}

impl LinkCandidate {
    pub fn new(raw_link: Option<String>) -> Self {
        Self {
            raw_link,
            resolved_url: None,
        }
    }

    /// Resolves the raw link against `base`
    ///
    /// `resolved_url` stays empty if there is no raw link or it does not
    /// normalize to an HTTP(S) URL.
    pub fn resolve(mut self, base: &Url, options: &NormalizeOptions) -> Self {
        if let Some(raw) = &self.raw_link {
            match normalize(raw, base, options) {
                Ok(url) => self.resolved_url = Some(url),
                Err(e) => tracing::debug!("Could not resolve candidate {:?}: {}", raw, e),
            }
        }
        self
    }
}

/// Builds the oracle selected by configuration
///
/// Fails before any network activity when the LLM oracle lacks its API key.
pub fn build_oracle(
    config: &OracleConfig,
    normalize_options: NormalizeOptions,
) -> Result<Box<dyn NextLinkOracle>, ConfigError> {
    match config.kind {
        OracleKind::Heuristic => Ok(Box::new(HeuristicOracle::new(normalize_options))),
        OracleKind::Llm => Ok(Box::new(LlmOracle::from_config(config)?)),
    }
}
