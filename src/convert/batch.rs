//! Batch conversion of a URL list into a directory of Markdown files

use crate::convert::{ConvertError, FilenameAllocator, MarkdownConverter};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome for one URL of the batch
#[derive(Debug)]
pub struct ConversionRecord {
    pub url: Url,
    pub result: Result<PathBuf, ConvertError>,
}

/// Per-URL results of a batch, in input order
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub records: Vec<ConversionRecord>,
    /// Set when the batch was cancelled before every URL was tried
    pub interrupted: bool,
}

impl ConversionReport {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Url, &ConvertError)> {
        self.records
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (&r.url, e)))
    }
}

/// Converts every URL and writes one Markdown file per page
///
/// Fails only when `output_dir` cannot be created.
pub async fn convert_all(
    converter: &dyn MarkdownConverter,
    urls: &[Url],
    output_dir: &Path,
) -> Result<ConversionReport, ConvertError> {
    convert_all_with_cancel(converter, urls, output_dir, &CancellationToken::new()).await
}

/// Like [`convert_all`], stopping between pages once `cancel` fires
pub async fn convert_all_with_cancel(
    converter: &dyn MarkdownConverter,
    urls: &[Url],
    output_dir: &Path,
    cancel: &CancellationToken,
) -> Result<ConversionReport, ConvertError> {
    tokio::fs::create_dir_all(output_dir).await?;

    let mut names = FilenameAllocator::new();
    let mut report = ConversionReport::default();
    let total = urls.len();

    for (index, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!("Conversion interrupted after {} of {} pages", index, total);
            report.interrupted = true;
            break;
        }

        tracing::info!("[{}/{}] Converting {}", index + 1, total, url);

        let target = output_dir.join(names.allocate(url));
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                report.interrupted = true;
                break;
            }
            result = convert_one(converter, url, &target) => result,
        };

        match &result {
            Ok(path) => tracing::debug!("Saved {}", path.display()),
            Err(e) => tracing::warn!("Failed to convert {}: {}", url, e),
        }

        report.records.push(ConversionRecord {
            url: url.clone(),
            result,
        });
    }

    tracing::info!(
        "Conversion finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );

    Ok(report)
}

async fn convert_one(
    converter: &dyn MarkdownConverter,
    url: &Url,
    target: &Path,
) -> Result<PathBuf, ConvertError> {
    let document = converter.convert(url).await?;

    if let Some(title) = &document.title {
        tracing::debug!("Title: {}", title);
    }

    tokio::fs::write(target, document.markdown.as_bytes()).await?;
    Ok(target.to_path_buf())
}
