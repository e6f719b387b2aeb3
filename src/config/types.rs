use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for doc-walker
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub oracle: OracleConfig,
    pub normalize: NormalizeConfig,
    pub output: OutputConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages to record before stopping
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pause between two page fetches (seconds)
    #[serde(rename = "delay-between-pages")]
    pub delay_between_pages: f64,

    /// Total timeout for one page request (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            delay_between_pages: 2.0,
            request_timeout: 30,
            connect_timeout: 10,
        }
    }
}

impl CrawlerConfig {
    /// The inter-page delay as a `Duration`
    ///
    /// Callers are expected to have validated the value; anything negative
    /// or non-finite maps to zero.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_between_pages).unwrap_or(Duration::ZERO)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "doc-walker".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Which next-link oracle drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// rel="next" and anchor-text rules, no external service
    #[default]
    Heuristic,
    /// Delegate the decision to a chat-completions model
    Llm,
}

/// Thoroughness tier passed through to the reasoning model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    #[default]
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Next-link oracle configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub kind: OracleKind,

    /// Chat model used by the LLM oracle
    pub model: String,

    #[serde(rename = "reasoning-effort")]
    pub reasoning_effort: ReasoningEffort,

    /// Base URL of the OpenAI-compatible API
    #[serde(rename = "api-base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// HTML longer than this is truncated to its head and tail
    #[serde(rename = "max-html-chars")]
    pub max_html_chars: usize,

    /// Attempts per page when the API answers 429
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base backoff between rate-limited attempts (seconds)
    #[serde(rename = "retry-delay")]
    pub retry_delay: f64,

    /// Timeout for one completion request (seconds); reasoning models are slow
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::Heuristic,
            model: "gpt-5.1".to_string(),
            reasoning_effort: ReasoningEffort::High,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_html_chars: 30_000,
            max_attempts: 3,
            retry_delay: 3.0,
            request_timeout: 300,
        }
    }
}

/// URL normalization policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Treat `page#a` and `page#b` as different pages
    #[serde(rename = "keep-fragments")]
    pub keep_fragments: bool,

    /// Collapse `/guides/guides/x` into `/guides/x`
    #[serde(rename = "collapse-repeated-segments")]
    pub collapse_repeated_segments: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            keep_fragments: false,
            collapse_repeated_segments: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the discovered-URL list, one URL per line
    #[serde(rename = "urls-file")]
    pub urls_file: String,

    /// Directory receiving the converted Markdown files
    #[serde(rename = "markdown-dir")]
    pub markdown_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            urls_file: "documentation_urls.txt".to_string(),
            markdown_dir: "markdown_output".to_string(),
        }
    }
}
