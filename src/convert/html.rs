//! HTML to Markdown converter

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::convert::{ConvertError, Document, MarkdownConverter};
use crate::crawler::{build_http_client, is_html};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// Line width for wrapped Markdown text
const TEXT_WIDTH: usize = 100;

/// Content types written out unchanged
const PASSTHROUGH_TYPES: &[&str] = &["text/plain", "text/markdown", "text/x-markdown"];

/// Downloads a page and renders it as Markdown text
#[derive(Debug, Clone)]
pub struct HtmlConverter {
    client: Client,
}

impl HtmlConverter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Uses the same client settings as the walk
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }

    /// Converts an HTML document already in memory
    pub fn render(html: &str) -> Document {
        Document {
            title: extract_title(html),
            markdown: html2text::from_read(html.as_bytes(), TEXT_WIDTH),
        }
    }
}

#[async_trait]
impl MarkdownConverter for HtmlConverter {
    async fn convert(&self, url: &Url) -> Result<Document, ConvertError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        match content_type {
            None => Ok(Self::render(&response.text().await?)),
            Some(ct) if is_html(&ct) => Ok(Self::render(&response.text().await?)),
            Some(ct) if is_passthrough(&ct) => Ok(Document {
                title: None,
                markdown: response.text().await?,
            }),
            Some(ct) => Err(ConvertError::Unsupported(ct)),
        }
    }
}

fn is_passthrough(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    PASSTHROUGH_TYPES.contains(&mime.as_str())
}

fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn converter() -> HtmlConverter {
        HtmlConverter::from_config(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap()
    }

    #[test]
    fn test_render_html() {
        let document = HtmlConverter::render(
            "<html><head><title> Quickstart </title></head>\
             <body><h1>Quickstart</h1><p>Install the package.</p></body></html>",
        );
        assert_eq!(document.title.as_deref(), Some("Quickstart"));
        assert!(document.markdown.contains("Install the package."));
    }

    #[test]
    fn test_render_without_title() {
        let document = HtmlConverter::render("<p>Body only</p>");
        assert!(document.title.is_none());
        assert!(document.markdown.contains("Body only"));
    }

    #[tokio::test]
    async fn test_convert_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guide"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Guide</title></head><body><p>Hello docs</p></body></html>",
                "text/html; charset=utf-8",
            ))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/guide", server.uri())).unwrap();
        let document = converter().convert(&url).await.unwrap();
        assert_eq!(document.title.as_deref(), Some("Guide"));
        assert!(document.markdown.contains("Hello docs"));
    }

    #[tokio::test]
    async fn test_convert_plain_text_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes.md"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("# Notes\n", "text/markdown"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/notes.md", server.uri())).unwrap();
        let document = converter().convert(&url).await.unwrap();
        assert_eq!(document.markdown, "# Notes\n");
    }

    #[tokio::test]
    async fn test_convert_rejects_binary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "application/pdf"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/manual.pdf", server.uri())).unwrap();
        let result = converter().convert(&url).await;
        assert!(matches!(result, Err(ConvertError::Unsupported(ct)) if ct == "application/pdf"));
    }

    #[tokio::test]
    async fn test_convert_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = converter().convert(&url).await;
        assert!(matches!(result, Err(ConvertError::Status(404))));
    }
}
