//! Next-link detection delegated to a chat-completions model
//!
//! The model sees the (possibly truncated) HTML of one page and its URL, and
//! answers with the href of the forward link copied verbatim, or with the
//! token `NO_NEXT_LINK`. Any service failure is answered as "no next link",
//! which ends the walk cleanly.

use crate::config::{OracleConfig, ReasoningEffort};
use crate::oracle::NextLinkOracle;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const NO_NEXT_LINK: &str = "NO_NEXT_LINK";
const TRUNCATION_MARKER: &str = "\n\n[... middle content truncated ...]\n\n";

const SYSTEM_PROMPT: &str = r#"You are an expert at analyzing documentation HTML to find navigation links.

TASK: Find the link to the NEXT page in a sequential documentation.

RULES:
1. Look for links that navigate FORWARD in the documentation (not backward/previous)
2. Common patterns: arrows (→), "Next", page titles that indicate progression
3. Return the href value EXACTLY as written in the HTML, character by character
4. Do NOT interpret, modify, fix, or normalize the href
5. If no next link exists, return exactly: NO_NEXT_LINK

WHERE TO LOOK:
- Navigation bars (top/bottom of page)
- Sidebar navigation
- Inline "next page" links
- Links with arrows pointing right (→)
- Links labeled "Next", "Continue", or showing the next topic name

OUTPUT FORMAT:
Return ONLY the href value, nothing else.

EXAMPLES:
<a href="/main/guides/the-interface-class">The Interface Class →</a>
→ Output: /main/guides/the-interface-class

<a href="../more-examples/">More Examples</a>
→ Output: ../more-examples/

<a href="https://example.com/docs/next">Next</a>
→ Output: https://example.com/docs/next

No next link present
→ Output: NO_NEXT_LINK"#;

/// Errors from one completion request
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by the API")]
    RateLimited,

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response contained no message content")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    reasoning_effort: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    reasoning_effort: ReasoningEffort,
    max_html_chars: usize,
    max_attempts: u32,
    retry_delay: Duration,
}

impl LlmOracle {
    /// Builds the oracle, reading the API key from the configured variable
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::MissingCredential)` - the variable is unset or empty
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                var: config.api_key_env.clone(),
            })?;

        Self::with_api_key(config, api_key)
    }

    /// Builds the oracle with an explicit API key
    pub fn with_api_key(
        config: &OracleConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| ConfigError::Validation(format!("Failed to build API client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            reasoning_effort: config.reasoning_effort,
            max_html_chars: config.max_html_chars,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::try_from_secs_f64(config.retry_delay).unwrap_or(Duration::ZERO),
        })
    }

    /// Sends one completion request and returns the raw answer text
    async fn complete(&self, user_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            reasoning_effort: self.reasoning_effort.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl NextLinkOracle for LlmOracle {
    fn name(&self) -> &str {
        "llm"
    }

    async fn extract_next_link(&self, html: &str, current_url: &Url) -> Option<String> {
        let prompt = build_user_prompt(&truncate_html(html, self.max_html_chars), current_url);

        tracing::debug!("Asking {} to find the next link", self.model);

        for attempt in 1..=self.max_attempts {
            match self.complete(&prompt).await {
                Ok(answer) => {
                    tracing::debug!("Model response: {}", answer.trim());
                    return parse_answer(&answer);
                }
                Err(LlmError::RateLimited) if attempt < self.max_attempts => {
                    let wait = self.retry_delay * attempt;
                    tracing::warn!(
                        "Rate limit hit, waiting {:?} before attempt {}/{}",
                        wait,
                        attempt + 1,
                        self.max_attempts
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(LlmError::RateLimited) => {
                    tracing::warn!("Rate limit exceeded after {} attempts", self.max_attempts);
                    return None;
                }
                Err(e) => {
                    tracing::warn!("Error calling model: {}", e);
                    return None;
                }
            }
        }

        None
    }
}

fn build_user_prompt(html: &str, current_url: &Url) -> String {
    format!(
        "Here is the HTML from the current documentation page ({}):\n\n{}\n\n\
         What is the href of the NEXT page link? Return only the URL path or \"{}\".",
        current_url, html, NO_NEXT_LINK
    )
}

/// Interprets the model's answer
fn parse_answer(answer: &str) -> Option<String> {
    if answer.to_uppercase().contains(NO_NEXT_LINK) {
        return None;
    }

    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Keeps the head and tail of long pages, where navigation usually lives
///
/// Cuts fall on `char` boundaries; the result holds at most `max_chars`
/// characters of the page plus a truncation marker.
pub fn truncate_html(html: &str, max_chars: usize) -> Cow<'_, str> {
    let total = html.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(html);
    }

    let half = max_chars / 2;
    let head_end = byte_offset(html, half);
    let tail_start = byte_offset(html, total - half);

    Cow::Owned(format!(
        "{}{}{}",
        &html[..head_end],
        TRUNCATION_MARKER,
        &html[tail_start..]
    ))
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
