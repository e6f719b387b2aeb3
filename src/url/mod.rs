//! URL handling module for doc-walker
//!
//! This module resolves candidate links into canonical absolute URLs and
//! tracks which canonical URLs the walk has already recorded.

mod normalize;

use crate::config::NormalizeConfig;
use std::collections::HashSet;
use url::Url;

pub use normalize::normalize;

/// Policy knobs for URL normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Keep `#fragment` as part of page identity
    pub keep_fragments: bool,
    /// Collapse consecutive duplicate path segments
    pub collapse_repeated_segments: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            keep_fragments: false,
            collapse_repeated_segments: true,
        }
    }
}

impl From<&NormalizeConfig> for NormalizeOptions {
    fn from(config: &NormalizeConfig) -> Self {
        Self {
            keep_fragments: config.keep_fragments,
            collapse_repeated_segments: config.collapse_repeated_segments,
        }
    }
}

/// Set of visited pages, compared by normalized form
///
/// Inputs are normalized on the way in, so two spellings of the same page
/// collapse to one entry even if the caller forgot to normalize.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    options: NormalizeOptions,
    seen: HashSet<String>,
}

impl VisitedSet {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            options,
            seen: HashSet::new(),
        }
    }

    /// Returns true if the normalized form of `url` has been marked
    pub fn is_visited(&self, url: &Url) -> bool {
        self.seen.contains(&self.key(url))
    }

    /// Marks `url` as visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        let key = self.key(url);
        self.seen.insert(key)
    }

    /// Returns true if `a` and `b` normalize to the same page
    pub fn same_page(&self, a: &Url, b: &Url) -> bool {
        self.key(a) == self.key(b)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn key(&self, url: &Url) -> String {
        match normalize(url.as_str(), url, &self.options) {
            Ok(normalized) => normalized.into(),
            Err(_) => url.as_str().to_string(),
        }
    }
}
