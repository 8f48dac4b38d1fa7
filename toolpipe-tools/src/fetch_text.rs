//! Fetches a web page and returns its readable text.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{FetchErrorKind, ToolError};
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::require_text;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;
const MAX_TIMEOUT_MS: u64 = 120_000;
const TEXT_WIDTH: usize = 100;
const USER_AGENT: &str = concat!("toolpipe-fetch-text/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTextInput {
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTextOutput {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    pub bytes: usize,
    pub truncated: bool,
}

/// Classifies a transport error from its rendered source chain.
pub fn classify_message(message: &str) -> FetchErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") || lower.contains("deadline") {
        FetchErrorKind::Timeout
    } else if lower.contains("dns")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
    {
        FetchErrorKind::Dns
    } else if lower.contains("connection refused") || lower.contains("os error 111") {
        FetchErrorKind::ConnectionRefused
    } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
        FetchErrorKind::Tls
    } else {
        FetchErrorKind::Other
    }
}

fn describe(kind: FetchErrorKind, url: &str, detail: &str) -> String {
    match kind {
        FetchErrorKind::Dns => format!("DNS resolution failed for {url}: {detail}"),
        FetchErrorKind::ConnectionRefused => format!("Connection refused by {url}"),
        FetchErrorKind::Tls => format!("TLS/certificate error for {url}: {detail}"),
        FetchErrorKind::Timeout => format!("Request to {url} timed out"),
        FetchErrorKind::Status => format!("{url} responded with {detail}"),
        FetchErrorKind::Other => format!("Request to {url} failed: {detail}"),
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> ToolError {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        classify_message(&chain)
    };
    warn!(url, kind = %kind, error = %chain, "fetch failed");
    ToolError::fetch(kind, describe(kind, url, &chain))
}

/// Extracts and whitespace-normalises the first `<title>` element.
pub fn extract_title(html: &str) -> Option<String> {
    // ASCII-only lowering keeps byte offsets valid for `html`.
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let content_start = open + lower[open..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find("</title")?;
    let title = html
        .get(content_start..content_end)?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

fn looks_like_html(content_type: &str, body: &[u8]) -> bool {
    if content_type.to_lowercase().contains("html") {
        return true;
    }
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body.get(start) == Some(&b'<')
}

pub async fn fetch_text(input: FetchTextInput) -> Result<FetchTextOutput, ToolError> {
    let url = require_text("url", &input.url)?.to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ToolError::invalid("url must start with http:// or https://"));
    }
    if input.timeout_ms == 0 || input.timeout_ms > MAX_TIMEOUT_MS {
        return Err(ToolError::invalid(format!(
            "timeoutMs must be between 1 and {MAX_TIMEOUT_MS}"
        )));
    }
    if input.max_bytes == 0 {
        return Err(ToolError::invalid("maxBytes must be at least 1"));
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_millis(input.timeout_ms))
        .build()
        .map_err(|e| ToolError::fetch(FetchErrorKind::Other, format!("failed to build http client: {e}")))?;

    debug!(url = %url, timeout_ms = input.timeout_ms, "fetching");
    let mut response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| transport_error(&url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::fetch(
            FetchErrorKind::Status,
            describe(FetchErrorKind::Status, &url, &status.to_string()),
        ));
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let mut body: Vec<u8> = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(&url, &e))?
    {
        let room = input.max_bytes - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        body.extend_from_slice(&chunk);
    }

    let (title, text) = if looks_like_html(&content_type, &body) {
        let html = String::from_utf8_lossy(&body);
        let text = html2text::from_read(&body[..], TEXT_WIDTH).map_err(|e| {
            ToolError::fetch(FetchErrorKind::Other, format!("failed to convert html: {e}"))
        })?;
        (extract_title(&html), text)
    } else {
        (None, String::from_utf8_lossy(&body).into_owned())
    };

    debug!(url = %url, bytes = body.len(), truncated, "fetched");
    Ok(FetchTextOutput {
        url,
        final_url,
        status: status.as_u16(),
        content_type,
        title,
        text: text.trim().to_string(),
        bytes: body.len(),
        truncated,
    })
}

pub struct FetchText;

#[async_trait]
impl ToolPackage for FetchText {
    fn name(&self) -> &'static str {
        "@toolpipe/fetch-text"
    }

    fn export_name(&self) -> &'static str {
        "fetchText"
    }

    fn description(&self) -> &'static str {
        "Fetch an http(s) URL and return its readable text, converting HTML to plain text and extracting the page title."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("url", "string", "http or https URL to fetch"),
            ParameterSpec::optional(
                "timeoutMs",
                "number",
                "Request timeout in milliseconds",
                Some(json!(DEFAULT_TIMEOUT_MS)),
            ),
            ParameterSpec::optional(
                "maxBytes",
                "number",
                "Maximum body bytes to read",
                Some(json!(DEFAULT_MAX_BYTES)),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Final URL, status, content type, title and text",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&fetch_text(parse_input(input)?).await?)
    }
}
