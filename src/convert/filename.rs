//! File names for converted pages

use std::collections::HashSet;
use url::Url;

/// Derives a Markdown file name from a page URL
///
/// `https://example.com/docs/getting-started` becomes
/// `docs_getting-started.md`; a root URL falls back to the host
/// (`example_com.md`). The query string is ignored.
pub fn sanitize_filename(url: &Url) -> String {
    let path = url.path().trim_matches('/');

    let stem = if path.is_empty() {
        let host = url.host_str().unwrap_or("index").replace('.', "_");
        match url.port() {
            Some(port) => sanitize(&format!("{}_{}", host, port)),
            None => sanitize(&host),
        }
    } else {
        sanitize(path)
    };

    format!("{}.md", stem)
}

/// Replaces unsafe characters with `_` and collapses runs of `_`
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars() {
        let c = if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '_'
        };

        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    out
}

/// Hands out unique file names within one batch
///
/// The second page mapping to `a.md` gets `a-2.md`, the third `a-3.md`.
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, url: &Url) -> String {
        let name = sanitize_filename(url);
        if self.used.insert(name.clone()) {
            return name;
        }

        let stem = name.trim_end_matches(".md");
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}.md", stem, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
