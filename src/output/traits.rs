//! Sink trait for streaming discovered URLs

use url::Url;

/// Receives each URL as soon as the walk records it
///
/// Implementations should make the URL durable before returning, so an
/// interrupted walk leaves a usable partial list behind.
pub trait UrlSink: Send {
    fn record(&mut self, url: &Url) -> std::io::Result<()>;
}
