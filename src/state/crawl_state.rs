//! Walk state owned by the traversal driver

use crate::state::{StopReason, WalkState};
use crate::url::{normalize, NormalizeOptions, VisitedSet};
use url::Url;

/// Everything the driver knows about the walk so far
///
/// Invariants maintained by the mutators:
/// - every URL in `ordered_result` is unique and in `visited`
/// - `pages_fetched` never exceeds the number of recorded pages
#[derive(Debug, Clone)]
pub struct CrawlState {
    visited: VisitedSet,
    ordered_result: Vec<Url>,
    current_url: Url,
    pages_fetched: u32,
    status: WalkState,
}

impl CrawlState {
    /// Fresh state positioned on `start_url`
    pub fn new(start_url: Url, options: NormalizeOptions) -> Self {
        Self {
            visited: VisitedSet::new(options),
            ordered_result: Vec::new(),
            current_url: start_url,
            pages_fetched: 0,
            status: WalkState::Running,
        }
    }

    /// Rebuilds state from a previously persisted URL list
    ///
    /// URLs are normalized first; entries that do not normalize are skipped.
    /// All URLs but the last are restored as recorded pages; the last one
    /// becomes the cursor so its page is fetched again to find its next link.
    /// Returns `None` when no usable URL remains.
    pub fn restore(previous: &[Url], options: NormalizeOptions) -> Option<Self> {
        let normalized: Vec<Url> = previous
            .iter()
            .filter_map(|url| match normalize(url.as_str(), url, &options) {
                Ok(normalized) => Some(normalized),
                Err(e) => {
                    tracing::warn!("Skipping unusable URL {} from previous walk: {}", url, e);
                    None
                }
            })
            .collect();

        let (last, done) = normalized.split_last()?;
        let mut state = Self::new(last.clone(), options);

        for url in done {
            if state.visited.mark_visited(url) {
                state.ordered_result.push(url.clone());
                state.pages_fetched += 1;
            }
        }

        Some(state)
    }

    /// Marks the cursor visited and appends it to the result
    ///
    /// Returns false (and records nothing) if the cursor was already visited.
    pub fn record_current(&mut self) -> bool {
        if !self.visited.mark_visited(&self.current_url) {
            return false;
        }
        self.ordered_result.push(self.current_url.clone());
        true
    }

    /// Marks the final URL of a redirected fetch of the cursor as visited
    ///
    /// Returns false if the target is a different page that was already
    /// visited, i.e. the redirect leads back into the walk.
    pub fn mark_redirect_target(&mut self, target: &Url) -> bool {
        if self.visited.same_page(target, &self.current_url) {
            return true;
        }
        self.visited.mark_visited(target)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.is_visited(url)
    }

    /// Moves the cursor to the next page and counts the current one
    pub fn advance(&mut self, next: Url) {
        self.current_url = next;
        self.pages_fetched += 1;
    }

    pub fn stop(&mut self, reason: StopReason) {
        self.status = WalkState::Stopped(reason);
    }

    pub fn status(&self) -> WalkState {
        self.status
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn ordered_result(&self) -> &[Url] {
        &self.ordered_result
    }

    /// Consumes the state, yielding the ordered URL list
    pub fn into_result(self) -> Vec<Url> {
        self.ordered_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());
        assert!(state.status().is_running());
        assert_eq!(state.pages_fetched(), 0);
        assert!(state.ordered_result().is_empty());
        assert_eq!(state.current_url().as_str(), "https://docs.example.com/a");
    }

    #[test]
    fn test_record_and_advance() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());

        assert!(state.record_current());
        assert!(state.is_visited(&url("https://docs.example.com/a/")));

        state.advance(url("https://docs.example.com/b"));
        assert_eq!(state.pages_fetched(), 1);
        assert_eq!(state.current_url().as_str(), "https://docs.example.com/b");
        assert_eq!(state.ordered_result().len(), 1);
    }

    #[test]
    fn test_record_current_twice_is_rejected() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());
        assert!(state.record_current());
        assert!(!state.record_current());
        assert_eq!(state.ordered_result().len(), 1);
    }

    #[test]
    fn test_restore() {
        let previous = vec![
            url("https://docs.example.com/a"),
            url("https://docs.example.com/b"),
            url("https://docs.example.com/c"),
        ];
        let state = CrawlState::restore(&previous, NormalizeOptions::default()).unwrap();

        assert_eq!(state.ordered_result(), &previous[..2]);
        assert_eq!(state.pages_fetched(), 2);
        assert_eq!(state.current_url().as_str(), "https://docs.example.com/c");
        assert!(state.is_visited(&previous[0]));
        assert!(!state.is_visited(&previous[2]));
    }

    #[test]
    fn test_restore_skips_duplicates() {
        let previous = vec![
            url("https://docs.example.com/a"),
            url("https://docs.example.com/a/"),
            url("https://docs.example.com/b"),
        ];
        let state = CrawlState::restore(&previous, NormalizeOptions::default()).unwrap();
        assert_eq!(state.ordered_result().len(), 1);
        assert_eq!(state.pages_fetched(), 1);
    }

    #[test]
    fn test_restore_normalizes_entries() {
        let previous = vec![
            url("https://Docs.Example.com/a/#intro"),
            url("ftp://docs.example.com/skipped"),
            url("https://docs.example.com/guide/guide/b/?utm_source=x"),
        ];
        let state = CrawlState::restore(&previous, NormalizeOptions::default()).unwrap();

        assert_eq!(state.ordered_result()[0].as_str(), "https://docs.example.com/a");
        assert_eq!(state.ordered_result().len(), 1);
        assert_eq!(state.current_url().as_str(), "https://docs.example.com/guide/b");
    }

    #[test]
    fn test_redirect_target_is_visited() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/"), NormalizeOptions::default());
        assert!(state.record_current());

        assert!(state.mark_redirect_target(&url("https://docs.example.com/en/latest/")));
        assert!(state.is_visited(&url("https://docs.example.com/en/latest")));
        assert_eq!(state.ordered_result().len(), 1);
    }

    #[test]
    fn test_redirect_to_same_page_is_not_a_loop() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());
        assert!(state.record_current());
        assert!(state.mark_redirect_target(&url("https://docs.example.com/a/")));
    }

    #[test]
    fn test_redirect_into_visited_page() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());
        assert!(state.record_current());
        state.advance(url("https://docs.example.com/b"));
        assert!(state.record_current());

        assert!(!state.mark_redirect_target(&url("https://docs.example.com/a")));
    }

    #[test]
    fn test_restore_empty() {
        assert!(CrawlState::restore(&[], NormalizeOptions::default()).is_none());
    }

    #[test]
    fn test_stop() {
        let mut state =
            CrawlState::new(url("https://docs.example.com/a"), NormalizeOptions::default());
        state.stop(StopReason::NoNext);
        assert_eq!(state.status().stop_reason(), Some(StopReason::NoNext));
    }
}
