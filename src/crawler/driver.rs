//! Traversal driver - the walk's state machine
//!
//! One step of the walk:
//! 1. stop with [`StopReason::Budget`] once `max_pages` pages were followed
//! 2. record the current page (visited set, result list, sink)
//! 3. fetch it; a failure stops with [`StopReason::FetchFailed`], a redirect
//!    marks its target visited and stops with [`StopReason::LoopDetected`]
//!    when that target was seen before
//! 4. ask the oracle for the next link; none stops with [`StopReason::NoNext`]
//! 5. normalize the link against the fetched page's final URL; an
//!    unusable link is [`StopReason::NoNext`], a visited one is
//!    [`StopReason::LoopDetected`]
//! 6. wait the inter-page delay and move the cursor
//!
//! The cancellation token is checked before every step and raced against
//! the fetch, the oracle call and the delay.

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::oracle::{LinkCandidate, NextLinkOracle};
use crate::output::UrlSink;
use crate::state::{CrawlState, StopReason};
use crate::url::{normalize, NormalizeOptions};
use crate::UrlError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Limits and policies for one walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    pub max_pages: u32,
    pub delay: Duration,
    pub normalize: NormalizeOptions,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            max_pages: 500,
            delay: Duration::from_secs(2),
            normalize: NormalizeOptions::default(),
        }
    }
}

impl From<&Config> for DriverSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_pages: config.crawler.max_pages,
            delay: config.crawler.delay(),
            normalize: NormalizeOptions::from(&config.normalize),
        }
    }
}

/// How a walk ended and what it found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub stop_reason: StopReason,
    /// Unique page URLs in discovery order
    pub urls: Vec<Url>,
    /// Number of next links followed
    pub pages_fetched: u32,
}

/// Follows next-page links from a start URL until a terminal state
pub struct Driver {
    settings: DriverSettings,
    fetcher: Box<dyn PageFetcher>,
    oracle: Box<dyn NextLinkOracle>,
    sink: Option<Box<dyn UrlSink>>,
    cancel: CancellationToken,
    state: CrawlState,
}

impl Driver {
    /// Creates a driver positioned on the normalized `start_url`
    pub fn new(
        start_url: &Url,
        settings: DriverSettings,
        fetcher: Box<dyn PageFetcher>,
        oracle: Box<dyn NextLinkOracle>,
    ) -> Result<Self, UrlError> {
        let start = normalize(start_url.as_str(), start_url, &settings.normalize)?;

        Ok(Self {
            settings,
            fetcher,
            oracle,
            sink: None,
            cancel: CancellationToken::new(),
            state: CrawlState::new(start, settings.normalize),
        })
    }

    /// Continues a walk from a previously written URL list
    ///
    /// The last URL is fetched again to find its next link. Returns `None`
    /// when `previous` is empty.
    pub fn resume(
        previous: &[Url],
        settings: DriverSettings,
        fetcher: Box<dyn PageFetcher>,
        oracle: Box<dyn NextLinkOracle>,
    ) -> Option<Self> {
        let state = CrawlState::restore(previous, settings.normalize)?;

        tracing::info!(
            "Resuming walk: {} pages already recorded, continuing at {}",
            state.ordered_result().len(),
            state.current_url()
        );

        Some(Self {
            settings,
            fetcher,
            oracle,
            sink: None,
            cancel: CancellationToken::new(),
            state,
        })
    }

    /// Streams every recorded URL to `sink` as it is discovered
    pub fn with_sink(mut self, sink: Box<dyn UrlSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the walk to a terminal state
    pub async fn run(mut self) -> CrawlOutcome {
        tracing::info!(
            "Walking from {} with oracle '{}' (max {} pages, {:?} between pages)",
            self.state.current_url(),
            self.oracle.name(),
            self.settings.max_pages,
            self.settings.delay
        );

        let reason = loop {
            if let Some(reason) = self.step().await {
                break reason;
            }
        };

        let pages = self.state.ordered_result().len();
        if reason.is_failure() {
            tracing::warn!("Walk stopped ({}): {} pages recorded", reason.describe(), pages);
        } else {
            tracing::info!("Walk stopped ({}): {} pages recorded", reason.describe(), pages);
        }
        tracing::debug!("Final state: {}", self.state.status());

        let pages_fetched = self.state.pages_fetched();
        CrawlOutcome {
            stop_reason: reason,
            urls: self.state.into_result(),
            pages_fetched,
        }
    }

    /// Performs one step, returning the stop reason once terminal
    ///
    /// A stopped walk stays stopped: later calls return the same reason
    /// without touching the network.
    pub async fn step(&mut self) -> Option<StopReason> {
        if let Some(reason) = self.state.status().stop_reason() {
            return Some(reason);
        }

        let reason = self.advance_walk().await?;
        self.state.stop(reason);
        Some(reason)
    }

    async fn advance_walk(&mut self) -> Option<StopReason> {
        let cancel = self.cancel.clone();
        if cancel.is_cancelled() {
            return Some(StopReason::Interrupted);
        }

        if self.state.pages_fetched() >= self.settings.max_pages {
            return Some(StopReason::Budget);
        }

        let current = self.state.current_url().clone();
        if !self.state.record_current() {
            tracing::warn!("{} was already recorded", current);
            return Some(StopReason::LoopDetected);
        }
        self.emit(&current);

        tracing::info!("[{}] {}", self.state.ordered_result().len(), current);

        let page = tokio::select! {
            _ = cancel.cancelled() => return Some(StopReason::Interrupted),
            page = self.fetcher.fetch(&current) => page,
        };

        let Some(html) = page.html.as_deref() else {
            match &page.failure {
                Some(failure) => tracing::warn!("Failed to fetch {}: {}", page.url, failure),
                None => tracing::warn!("Failed to fetch {}", page.url),
            }
            return Some(StopReason::FetchFailed);
        };

        if page.url != current {
            tracing::debug!("{} redirected to {}", current, page.url);
            if !self.state.mark_redirect_target(&page.url) {
                tracing::info!("{} redirected to already visited {}", current, page.url);
                return Some(StopReason::LoopDetected);
            }
        }

        let raw_link = tokio::select! {
            _ = cancel.cancelled() => return Some(StopReason::Interrupted),
            link = self.oracle.extract_next_link(html, &page.url) => link,
        };

        let candidate = LinkCandidate::new(raw_link).resolve(&page.url, &self.settings.normalize);
        let next = match (&candidate.raw_link, candidate.resolved_url) {
            (None, _) => {
                tracing::info!("No next link found on {}", page.url);
                return Some(StopReason::NoNext);
            }
            (Some(raw), None) => {
                tracing::info!("Next link {:?} on {} is not a usable URL", raw, page.url);
                return Some(StopReason::NoNext);
            }
            (Some(raw), Some(next)) => {
                tracing::debug!("Next link {:?} resolved to {}", raw, next);
                next
            }
        };

        if self.state.is_visited(&next) {
            tracing::info!("Next link {} was already visited", next);
            return Some(StopReason::LoopDetected);
        }

        if !self.settings.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Some(StopReason::Interrupted),
                _ = tokio::time::sleep(self.settings.delay) => {}
            }
        }

        self.state.advance(next);
        None
    }

    /// Forwards a recorded URL to the sink; a failing sink is dropped
    fn emit(&mut self, url: &Url) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.record(url) {
                tracing::error!("Failed to persist {}: {}; continuing without sink", url, e);
                self.sink = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchFailure, PageContent};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    const HOST: &str = "https://docs.example.com";

    fn url(path: &str) -> Url {
        Url::parse(&format!("{}{}", HOST, path)).unwrap()
    }

    /// Serves pages from memory; a page body `next:<href>` names its next link
    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        redirects: HashMap<String, String>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedFetcher {
        /// Requests for `from` end up on `to`
        fn redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }

        fn page(mut self, path: &str, next: Option<&str>) -> Self {
            let body = next.map(|href| format!("next:{}", href)).unwrap_or_default();
            self.pages.insert(path.to_string(), body);
            self
        }

        /// A chain `/p1 -> /p2 -> ... -> /p<n>` ending without a next link
        fn chain(n: usize) -> Self {
            (1..=n).fold(Self::default(), |fetcher, i| {
                let next = format!("/p{}", i + 1);
                fetcher.page(&format!("/p{}", i), (i < n).then_some(next.as_str()))
            })
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> PageContent {
            self.requests.lock().unwrap().push(url.path().to_string());
            let final_url = match self.redirects.get(url.path()) {
                Some(to) => url.join(to).unwrap(),
                None => url.clone(),
            };
            match self.pages.get(final_url.path()) {
                Some(body) => PageContent::success(final_url, body.clone()),
                None => PageContent::failed(final_url, FetchFailure::Status(404)),
            }
        }
    }

    struct ScriptedOracle;

    #[async_trait]
    impl NextLinkOracle for ScriptedOracle {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn extract_next_link(&self, html: &str, _current_url: &Url) -> Option<String> {
            html.strip_prefix("next:").map(|href| href.to_string())
        }
    }

    /// Generates an endless chain: `/n/<i>` links to `/n/<i+1>`
    struct EndlessFetcher;

    #[async_trait]
    impl PageFetcher for EndlessFetcher {
        async fn fetch(&self, url: &Url) -> PageContent {
            let index: u32 = url
                .path()
                .rsplit('/')
                .next()
                .and_then(|segment| segment.parse().ok())
                .unwrap_or(0);
            PageContent::success(url.clone(), format!("next:/n/{}", index + 1))
        }
    }

    #[derive(Clone, Default)]
    struct CollectingSink {
        urls: Arc<Mutex<Vec<Url>>>,
    }

    impl UrlSink for CollectingSink {
        fn record(&mut self, url: &Url) -> io::Result<()> {
            self.urls.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    impl UrlSink for BrokenSink {
        fn record(&mut self, _url: &Url) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    fn settings() -> DriverSettings {
        DriverSettings {
            delay: Duration::ZERO,
            ..DriverSettings::default()
        }
    }

    fn driver(start: &str, fetcher: impl PageFetcher + 'static) -> Driver {
        Driver::new(&url(start), settings(), Box::new(fetcher), Box::new(ScriptedOracle)).unwrap()
    }

    fn paths(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(|u| u.path()).collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = DriverSettings::default();
        assert_eq!(settings.max_pages, 500);
        assert_eq!(settings.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.crawler.max_pages = 7;
        config.crawler.delay_between_pages = 0.5;
        config.normalize.keep_fragments = true;

        let settings = DriverSettings::from(&config);
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.delay, Duration::from_millis(500));
        assert!(settings.normalize.keep_fragments);
    }

    #[tokio::test]
    async fn test_follows_chain_to_the_end() {
        let outcome = driver("/p1", ScriptedFetcher::chain(5)).run().await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(paths(&outcome.urls), vec!["/p1", "/p2", "/p3", "/p4", "/p5"]);
        assert_eq!(outcome.pages_fetched, 4);
    }

    #[tokio::test]
    async fn test_loop_back_to_start() {
        let fetcher = ScriptedFetcher::default()
            .page("/a", Some("/b"))
            .page("/b", Some("/a"));
        let outcome = driver("/a", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::LoopDetected);
        assert_eq!(paths(&outcome.urls), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_trailing_slash_variant_is_a_loop() {
        let fetcher = ScriptedFetcher::default().page("/a", Some("/a/"));
        let outcome = driver("/a", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::LoopDetected);
        assert_eq!(paths(&outcome.urls), vec!["/a"]);
    }

    #[tokio::test]
    async fn test_link_back_to_redirect_target_is_a_loop() {
        let fetcher = ScriptedFetcher::default()
            .redirect("/", "/en/latest")
            .page("/en/latest", Some("/en/latest/b"))
            .page("/en/latest/b", Some("/en/latest"));
        let outcome = driver("/", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::LoopDetected);
        assert_eq!(paths(&outcome.urls), vec!["/", "/en/latest/b"]);
    }

    #[tokio::test]
    async fn test_redirect_into_visited_page_is_a_loop() {
        let fetcher = ScriptedFetcher::default()
            .page("/a", Some("/old"))
            .redirect("/old", "/a");
        let requests = fetcher.requests.clone();
        let outcome = driver("/a", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::LoopDetected);
        assert_eq!(paths(&outcome.urls), vec!["/a", "/old"]);
        assert_eq!(*requests.lock().unwrap(), vec!["/a", "/old"]);
    }

    #[tokio::test]
    async fn test_slash_redirect_is_not_a_loop() {
        let fetcher = ScriptedFetcher::default()
            .redirect("/a", "/a/")
            .page("/a/", Some("/b"))
            .page("/b", None);
        let outcome = driver("/a", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(paths(&outcome.urls), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_step_after_stop_is_a_no_op() {
        let fetcher = ScriptedFetcher::default().page("/a", None);
        let requests = fetcher.requests.clone();
        let mut driver = driver("/a", fetcher);

        assert_eq!(driver.step().await, Some(StopReason::NoNext));
        assert_eq!(driver.state().status().stop_reason(), Some(StopReason::NoNext));

        assert_eq!(driver.step().await, Some(StopReason::NoNext));
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert_eq!(driver.state().ordered_result().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_page_in_result() {
        let fetcher = ScriptedFetcher::chain(5);
        let mut pages = fetcher.pages.clone();
        pages.remove("/p3");
        let fetcher = ScriptedFetcher { pages, ..fetcher };

        let outcome = driver("/p1", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::FetchFailed);
        assert_eq!(paths(&outcome.urls), vec!["/p1", "/p2", "/p3"]);
    }

    #[tokio::test]
    async fn test_no_next_on_first_page() {
        let fetcher = ScriptedFetcher::default().page("/start", None);
        let requests = fetcher.requests.clone();
        let outcome = driver("/start", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(paths(&outcome.urls), vec!["/start"]);
        assert_eq!(outcome.pages_fetched, 0);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_link_is_no_next() {
        let fetcher = ScriptedFetcher::default().page("/a", Some("mailto:docs@example.com"));
        let outcome = driver("/a", fetcher).run().await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(outcome.urls.len(), 1);
    }

    #[tokio::test]
    async fn test_budget_limits_pages() {
        let settings = DriverSettings {
            max_pages: 3,
            ..settings()
        };
        let outcome = Driver::new(&url("/n/0"), settings, Box::new(EndlessFetcher), Box::new(ScriptedOracle))
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.stop_reason, StopReason::Budget);
        assert_eq!(paths(&outcome.urls), vec!["/n/0", "/n/1", "/n/2"]);
        assert_eq!(outcome.pages_fetched, 3);
    }

    #[tokio::test]
    async fn test_relative_links_resolve_against_page() {
        let fetcher = ScriptedFetcher::default()
            .page("/guide/intro", Some("install"))
            .page("/guide/install", Some("../reference/api"))
            .page("/reference/api", None);
        let outcome = driver("/guide/intro", fetcher).run().await;

        assert_eq!(
            paths(&outcome.urls),
            vec!["/guide/intro", "/guide/install", "/reference/api"]
        );
    }

    #[tokio::test]
    async fn test_start_url_is_normalized() {
        let fetcher = ScriptedFetcher::default().page("/a", None);
        let start = Url::parse("https://DOCS.example.com/a/#top").unwrap();
        let outcome = Driver::new(&start, settings(), Box::new(fetcher), Box::new(ScriptedOracle))
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.urls[0].as_str(), "https://docs.example.com/a");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = driver("/p1", ScriptedFetcher::chain(3))
            .with_cancellation(cancel)
            .run()
            .await;

        assert_eq!(outcome.stop_reason, StopReason::Interrupted);
        assert!(outcome.urls.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_delay() {
        let cancel = CancellationToken::new();
        let settings = DriverSettings {
            delay: Duration::from_secs(3600),
            ..settings()
        };
        let driver = Driver::new(
            &url("/p1"),
            settings,
            Box::new(ScriptedFetcher::chain(3)),
            Box::new(ScriptedOracle),
        )
        .unwrap()
        .with_cancellation(cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = driver.run().await;
        assert_eq!(outcome.stop_reason, StopReason::Interrupted);
        assert_eq!(paths(&outcome.urls), vec!["/p1"]);
        assert_eq!(outcome.pages_fetched, 0);
    }

    #[tokio::test]
    async fn test_resume_refetches_last_page() {
        let fetcher = ScriptedFetcher::chain(4);
        let requests = fetcher.requests.clone();
        let previous = vec![url("/p1"), url("/p2"), url("/p3")];

        let outcome = Driver::resume(&previous, settings(), Box::new(fetcher), Box::new(ScriptedOracle))
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(paths(&outcome.urls), vec!["/p1", "/p2", "/p3", "/p4"]);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(*requests.lock().unwrap(), vec!["/p3", "/p4"]);
    }

    #[tokio::test]
    async fn test_resume_detects_loop_into_restored_pages() {
        let fetcher = ScriptedFetcher::default().page("/b", Some("/a"));
        let previous = vec![url("/a"), url("/b")];

        let outcome = Driver::resume(&previous, settings(), Box::new(fetcher), Box::new(ScriptedOracle))
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.stop_reason, StopReason::LoopDetected);
        assert_eq!(paths(&outcome.urls), vec!["/a", "/b"]);
    }

    #[test]
    fn test_resume_empty_list() {
        let driver = Driver::resume(
            &[],
            settings(),
            Box::new(ScriptedFetcher::default()),
            Box::new(ScriptedOracle),
        );
        assert!(driver.is_none());
    }

    #[tokio::test]
    async fn test_sink_receives_urls_in_order() {
        let sink = CollectingSink::default();
        let collected = sink.urls.clone();

        let outcome = driver("/p1", ScriptedFetcher::chain(3))
            .with_sink(Box::new(sink))
            .run()
            .await;

        assert_eq!(*collected.lock().unwrap(), outcome.urls);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_walk() {
        let outcome = driver("/p1", ScriptedFetcher::chain(3))
            .with_sink(Box::new(BrokenSink))
            .run()
            .await;

        assert_eq!(outcome.stop_reason, StopReason::NoNext);
        assert_eq!(outcome.urls.len(), 3);
    }
}
