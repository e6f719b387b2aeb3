//! Plain-text URL list: one absolute URL per line, in discovery order

use crate::output::UrlSink;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Append-only URL list file, flushed after every line
#[derive(Debug)]
pub struct UrlListWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl UrlListWriter {
    /// Creates (or truncates) the list at `path`
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::create_with(path, &[])
    }

    /// Creates the list at `path` pre-filled with `existing`
    ///
    /// Used when resuming: the restored URLs are written first so the file
    /// keeps the whole walk in order.
    pub fn create_with(path: impl AsRef<Path>, existing: &[Url]) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = Self {
            path,
            file,
            written: 0,
        };
        for url in existing {
            writer.append(url)?;
        }

        Ok(writer)
    }

    pub fn append(&mut self, url: &Url) -> io::Result<()> {
        writeln!(self.file, "{}", url)?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl UrlSink for UrlListWriter {
    fn record(&mut self, url: &Url) -> io::Result<()> {
        self.append(url)
    }
}

/// Reads a URL list, skipping blank and unparsable lines
pub fn read_url_list(path: impl AsRef<Path>) -> io::Result<Vec<Url>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut urls = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Url::parse(line) {
            Ok(url) => urls.push(url),
            Err(e) => tracing::warn!(
                "Skipping invalid URL on line {} of {}: {}",
                index + 1,
                path.display(),
                e
            ),
        }
    }

    Ok(urls)
}

/// Writes the complete list, replacing any previous content
pub fn write_url_list(path: impl AsRef<Path>, urls: &[Url]) -> io::Result<()> {
    UrlListWriter::create_with(path, urls).map(|_| ())
}
