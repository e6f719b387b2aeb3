//! Markdown conversion of walked pages
//!
//! Conversion runs after the walk, over the URL list it produced. Every URL
//! is converted independently; one failure never aborts the batch.

mod batch;
mod filename;
mod html;

pub use batch::{convert_all, convert_all_with_cancel, ConversionRecord, ConversionReport};
pub use filename::{sanitize_filename, FilenameAllocator};
pub use html::HtmlConverter;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors from converting one URL
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Unsupported content type: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A converted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: Option<String>,
    pub markdown: String,
}

/// Turns the content behind a URL into Markdown
#[async_trait]
pub trait MarkdownConverter: Send + Sync {
    async fn convert(&self, url: &Url) -> Result<Document, ConvertError>;
}
