use crate::url::NormalizeOptions;
use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Resolves a link against a base URL and rewrites it into canonical form
///
/// # Normalization Steps
///
/// 1. Resolve the (trimmed) link against `base`; absolute, path-relative,
///    protocol-relative and fragment-only links are all accepted
/// 2. Reject anything that is not HTTP(S) or has no host
/// 3. Lowercase the host (scheme case and default ports are canonicalized
///    by the `url` crate while parsing)
/// 4. Normalize path:
///    - Remove empty and `.` segments, resolve `..`
///    - Optionally collapse consecutive duplicate segments
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment, unless fragments are kept by policy
/// 6. Remove tracking query parameters and an empty query string
///
/// # Arguments
///
/// * `link` - The raw href, as written in the page
/// * `base` - The URL of the page the link was found on
/// * `options` - Normalization policy
///
/// # Returns
///
/// * `Ok(Url)` - Normalized absolute URL
/// * `Err(UrlError)` - Failed to resolve or normalize the link
///
/// # Examples
///
/// ```
/// use doc_walker::url::{normalize, NormalizeOptions};
/// use url::Url;
///
/// let base = Url::parse("https://Docs.Example.com:443/guide/intro/").unwrap();
/// let url = normalize("../setup/#install", &base, &NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide/setup");
/// ```
pub fn normalize(link: &str, base: &Url, options: &NormalizeOptions) -> Result<Url, UrlError> {
    let link = link.trim();

    // Step 1: Resolve
    let mut url = base
        .join(link)
        .map_err(|e| UrlError::Parse(format!("{}: {}", link, e)))?;

    // Step 2: Validate scheme and host
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Lowercase the host
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    let lowered = host.to_lowercase();
    if lowered != host {
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    // Step 4: Normalize path
    let normalized_path = normalize_path(url.path(), options.collapse_repeated_segments);
    url.set_path(&normalized_path);

    // Step 5: Fragment policy
    if !options.keep_fragments {
        url.set_fragment(None);
    }

    // Step 6: Query cleanup
    strip_tracking_params(&mut url);

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str, collapse_repeated: bool) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ if collapse_repeated && segments.last() == Some(&segment) => continue,
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Removes tracking parameters; the query is only rebuilt when one was found
fn strip_tracking_params(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };

    if query.is_empty() {
        url.set_query(None);
        return;
    }

    let has_tracking = url.query_pairs().any(|(key, _)| is_tracking_param(&key));
    if !has_tracking {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
