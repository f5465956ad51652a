//! Fetches a company website and reduces it to plain text for the crawl prompt.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::llm_client::http_client;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Page text beyond this many characters is dropped before prompting.
pub const MAX_PAGE_CHARS: usize = 12_000;
const USER_AGENT: &str = concat!("classifier-api/", env!("CARGO_PKG_VERSION"));

/// Adds `https://` when no scheme is given and rejects anything but http(s).
pub fn normalize_website(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("website is required".to_string());
    }
    let url = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(|| format!("'{trimmed}' is not an http(s) URL"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(format!("'{trimmed}' has no valid host"));
    }
    Ok(url)
}

struct Cleaners {
    blocks: Regex,
    tags: Regex,
    whitespace: Regex,
}

fn cleaners() -> &'static Cleaners {
    static CLEANERS: OnceLock<Cleaners> = OnceLock::new();
    CLEANERS.get_or_init(|| Cleaners {
        blocks: Regex::new(r"(?is)<(script|style|noscript|svg|head)\b.*?</(script|style|noscript|svg|head)>")
            .expect("valid regex"),
        tags: Regex::new(r"(?s)<[^>]*>").expect("valid regex"),
        whitespace: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Strips markup and collapses whitespace, keeping at most `MAX_PAGE_CHARS`.
pub fn html_to_text(html: &str) -> String {
    let c = cleaners();
    let without_blocks = c.blocks.replace_all(html, " ");
    let without_tags = c.tags.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);
    let text = c.whitespace.replace_all(&decoded, " ");
    text.trim().chars().take(MAX_PAGE_CHARS).collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[derive(Clone)]
pub struct WebsiteCrawler {
    client: Client,
}

impl Default for WebsiteCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl WebsiteCrawler {
    pub fn new() -> Self {
        Self {
            client: http_client(FETCH_TIMEOUT),
        }
    }

    /// Returns the page text, or `None` when the site cannot be fetched.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not fetch {url}: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Fetching {url} returned {}", response.status());
            return None;
        }

        match response.text().await {
            Ok(body) => {
                let text = html_to_text(&body);
                debug!("Fetched {} characters of text from {url}", text.len());
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                warn!("Could not read body of {url}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        assert_eq!(normalize_website("alec.ae").unwrap(), "https://alec.ae");
        assert_eq!(
            normalize_website("  http://example.com/about ").unwrap(),
            "http://example.com/about"
        );
    }

    #[test]
    fn test_normalize_rejects_other_schemes() {
        assert!(normalize_website("ftp://example.com").is_err());
        assert!(normalize_website("").is_err());
        assert!(normalize_website("https://").is_err());
        assert!(normalize_website("exa mple.com").is_err());
    }

    #[test]
    fn test_html_to_text_strips_markup() {
        let html = r#"<html><head><title>x</title><style>body{color:red}</style></head>
            <body><script>var a = "<b>";</script><h1>ALEC</h1>
            <p>Construction &amp; engineering</p></body></html>"#;
        assert_eq!(html_to_text(html), "ALEC Construction & engineering");
    }

    #[test]
    fn test_html_to_text_truncates() {
        let html = format!("<p>{}</p>", "a".repeat(MAX_PAGE_CHARS + 50));
        assert_eq!(html_to_text(&html).chars().count(), MAX_PAGE_CHARS);
    }
}
