//! Rule-based next-link detection
//!
//! Candidates are scored:
//!
//! | Score | Cue |
//! |-------|-----|
//! | 3 | `rel="next"` on `<link>` or `<a>` |
//! | 2 | label is exactly a forward phrase ("Next", "Next page", "→"), or a `*next*` class |
//! | 1 | label mentions a forward word or ends in a forward arrow |
//!
//! Only the best-scoring group counts. If it points at more than one distinct
//! page the answer is `None`: guessing wrong could derail the walk, stopping
//! cannot.

use crate::oracle::NextLinkOracle;
use crate::url::{normalize, NormalizeOptions};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const FORWARD_WORDS: &[&str] = &["next", "continue"];
const BACKWARD_WORDS: &[&str] = &["prev", "previous", "back", "older"];
const FORWARD_PHRASES: &[&str] = &[
    "next",
    "next page",
    "next section",
    "next chapter",
    "next topic",
    "continue",
];
const FORWARD_ARROWS: &[char] = &['→', '»', '›', '⟶', '⇒'];
const BACKWARD_ARROWS: &[char] = &['←', '«', '‹', '⟵', '⇐'];

/// Deterministic next-link oracle based on markup conventions
#[derive(Debug, Clone, Default)]
pub struct HeuristicOracle {
    options: NormalizeOptions,
}

impl HeuristicOracle {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Synchronous core of the oracle
    pub fn find_next_link(&self, html: &str, current_url: &Url) -> Option<String> {
        let document = Html::parse_document(html);
        let current = normalize(current_url.as_str(), current_url, &self.options).ok();

        let mut best_score = 0;
        let mut best: Vec<(String, Url)> = Vec::new();

        for (element, href) in navigation_elements(&document) {
            let score = score_element(&element);
            if score == 0 || score < best_score {
                continue;
            }

            let Some(target) = self.resolve_candidate(href, current_url) else {
                continue;
            };
            if current.as_ref() == Some(&target) {
                continue;
            }

            if score > best_score {
                best_score = score;
                best.clear();
            }
            if !best.iter().any(|(_, url)| url == &target) {
                best.push((href.trim().to_string(), target));
            }
        }

        match best.len() {
            0 => None,
            1 => best.pop().map(|(href, _)| href),
            n => {
                tracing::debug!(
                    "{} distinct next-link candidates with score {} on {}, treating as ambiguous",
                    n,
                    best_score,
                    current_url
                );
                None
            }
        }
    }

    /// Resolves an href and filters links that can never be a next page
    ///
    /// Excluded: `javascript:`, `mailto:`, `tel:`, `data:` links,
    /// fragment-only links and anything that is not HTTP(S) after resolution.
    fn resolve_candidate(&self, href: &str, base_url: &Url) -> Option<Url> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let lowered = href.to_ascii_lowercase();
        if ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
        {
            return None;
        }

        normalize(href, base_url, &self.options).ok()
    }
}

#[async_trait]
impl NextLinkOracle for HeuristicOracle {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn extract_next_link(&self, html: &str, current_url: &Url) -> Option<String> {
        self.find_next_link(html, current_url)
    }
}

/// All `<a href>` and `<link href>` elements in document order
fn navigation_elements(document: &Html) -> Vec<(ElementRef<'_>, &str)> {
    let Ok(selector) = Selector::parse("a[href], link[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href").map(|href| (element, href)))
        .collect()
}

fn score_element(element: &ElementRef<'_>) -> u8 {
    let value = element.value();

    if has_token(value.attr("rel"), |token| token == "next") {
        return 3;
    }
    if has_token(value.attr("rel"), |token| token == "prev" || token == "previous") {
        return 0;
    }

    // <link> elements only count through rel
    if value.name() != "a" {
        return 0;
    }

    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    let labels: Vec<String> = [
        Some(text),
        value.attr("aria-label").map(collapse_whitespace),
        value.attr("title").map(collapse_whitespace),
    ]
    .into_iter()
    .flatten()
    .filter(|label| !label.is_empty())
    .collect();

    if labels.iter().any(|label| is_backward_label(label))
        || has_token(value.attr("class"), is_backward_class)
    {
        return 0;
    }

    if labels.iter().any(|label| is_exact_forward_label(label))
        || has_token(value.attr("class"), is_forward_class)
    {
        return 2;
    }

    if labels.iter().any(|label| is_partial_forward_label(label)) {
        return 1;
    }

    0
}

fn has_token(attr: Option<&str>, predicate: impl Fn(&str) -> bool) -> bool {
    attr.map(|value| {
        value
            .split_whitespace()
            .any(|token| predicate(&token.to_ascii_lowercase()))
    })
    .unwrap_or(false)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn words(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

fn is_backward_label(label: &str) -> bool {
    label.contains(BACKWARD_ARROWS) || words(label).any(|word| BACKWARD_WORDS.contains(&word))
}

fn is_exact_forward_label(label: &str) -> bool {
    let stripped = label
        .trim_matches(|c: char| FORWARD_ARROWS.contains(&c) || c.is_whitespace() || c == ':')
        .trim();

    if stripped.is_empty() {
        // Arrow-only link
        return label.contains(FORWARD_ARROWS);
    }

    FORWARD_PHRASES.contains(&stripped)
}

fn is_partial_forward_label(label: &str) -> bool {
    label.trim_end().ends_with(FORWARD_ARROWS)
        || words(label).any(|word| FORWARD_WORDS.contains(&word))
}

/// Class tokens like `next`, `next-page`, `md-footer__link--next`
fn is_forward_class(token: &str) -> bool {
    class_mentions(token, "next")
}

fn is_backward_class(token: &str) -> bool {
    class_mentions(token, "prev") || class_mentions(token, "previous")
}

fn class_mentions(token: &str, word: &str) -> bool {
    token
        .split(|c: char| c == '-' || c == '_')
        .any(|part| part == word)
}
