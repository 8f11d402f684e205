//! Application-process extraction.
//!
//! Fetches a listing's application page, pulls out its readable text and
//! asks a hosted text-generation model for an ordered list of steps.

use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{redirect, Client};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::ExtractorSettings;

const MIN_TEXT_CHARS: usize = 30;
const MAX_STEPS: usize = 50;
const FALLBACK_EXCERPT_CHARS: usize = 500;
const FALLBACK_CANDIDATES: usize = 6;

/// Errors that can occur while extracting application steps
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Inference API key is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0} returned status {1}")]
    Status(String, u16),

    #[error("Failed to extract readable content from page (may require JS rendering)")]
    Unreadable,

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One application step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub step: u32,
    pub text: String,
}

/// Steps extracted from a page together with the raw model output
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedProcess {
    pub steps: Vec<ProcessStep>,
    pub source: String,
    pub raw: String,
}

/// Readable text of an HTML page, whitespace-collapsed and capped at `max_chars`
///
/// Prefers `<article>`, then `<main>`, then the six longest block elements.
pub fn extract_main_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let text_of = |selector: &str| -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        let mut matches = document.select(&selector).peekable();
        matches.peek()?;
        Some(matches.flat_map(|el| el.text()).collect())
    };

    let text = text_of("article")
        .or_else(|| text_of("main"))
        .unwrap_or_else(|| {
            let Ok(blocks) = Selector::parse("body div, body section, body p, body h1, body h2, body h3, body li")
            else {
                return String::new();
            };

            let mut candidates: Vec<String> = document
                .select(&blocks)
                .map(|el| el.text().collect::<String>())
                .collect();
            candidates.sort_by_key(|t| std::cmp::Reverse(t.trim().chars().count()));
            candidates.truncate(FALLBACK_CANDIDATES);
            candidates.join("\n")
        });

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

pub fn build_prompt(title: &str, url: &str, text: &str) -> String {
    [
        "You are a helpful assistant. Extract a clear ordered list of application steps from the following scholarship webpage content.".to_string(),
        format!("Title: {}", title),
        format!("URL: {}", url),
        "Content:".to_string(),
        text.to_string(),
        String::new(),
        format!(
            r#"Return a JSON object only like: {{"steps":[{{"step":1,"text":"..."}},{{"step":2,"text":"..."}}],"source":"{}"}}"#,
            url
        ),
    ]
    .join("\n")
}

/// Text generated by the inference API, whatever shape the response takes
fn generated_text(response: Value) -> String {
    match response {
        Value::String(s) => s,
        Value::Array(items) if !items.is_empty() => {
            let first = &items[0];
            first
                .get("generated_text")
                .or_else(|| first.get("summary_text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| first.to_string())
        }
        Value::Object(map) => {
            let text = map.get("generated_text").and_then(Value::as_str).map(str::to_string);
            text.unwrap_or_else(|| Value::Object(map).to_string())
        }
        other => other.to_string(),
    }
}

fn step_from_value(index: usize, item: &Value) -> Option<ProcessStep> {
    let fallback = index as u32 + 1;
    match item {
        Value::String(text) => Some(ProcessStep {
            step: fallback,
            text: text.clone(),
        }),
        Value::Object(map) => {
            let text = map.get("text").and_then(Value::as_str)?;
            let step = map
                .get("step")
                .and_then(Value::as_u64)
                .map_or(fallback, |n| n as u32);
            Some(ProcessStep {
                step,
                text: text.to_string(),
            })
        }
        _ => None,
    }
}

/// Fetches pages and calls the inference API
pub struct ProcessExtractor {
    client: Client,
    api_key: Option<String>,
    model_url: String,
    page_timeout: Duration,
    model_timeout: Duration,
    max_text_chars: usize,
    json_block: Regex,
    list_marker: Regex,
}

impl ProcessExtractor {
    pub fn from_settings(settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.hf_api_key.clone().filter(|k| !k.is_empty()),
            model_url: format!(
                "{}/models/{}",
                settings.hf_base_url.trim_end_matches('/'),
                settings.hf_model
            ),
            page_timeout: Duration::from_secs(settings.page_timeout_secs),
            model_timeout: Duration::from_secs(settings.model_timeout_secs),
            max_text_chars: settings.max_text_chars,
            json_block: Regex::new(r"(?s)\{.*\}")?,
            list_marker: Regex::new(r"^(?:\d+[).:-]?\s*)?[-–—\s]*")?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .header(USER_AGENT, "ScholarMatch/1.0")
            .header(ACCEPT, "text/html")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status(url.to_string(), response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn call_model(&self, prompt: &str) -> Result<String, ExtractError> {
        let api_key = self.api_key.as_deref().ok_or(ExtractError::NotConfigured)?;

        let response = self
            .client
            .post(&self.model_url)
            .timeout(self.model_timeout)
            .bearer_auth(api_key)
            .header(ACCEPT, "application/json")
            .json(&json!({ "inputs": prompt }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Status(
                "inference API".to_string(),
                response.status().as_u16(),
            ));
        }

        let body: Value = response.json().await?;
        Ok(generated_text(body))
    }

    /// Steps from model output
    ///
    /// An embedded `{"steps": [...]}` object wins; otherwise each line longer
    /// than ten characters becomes a step with list numbering stripped; if
    /// nothing qualifies the start of the output is returned as one step.
    pub fn parse_steps(&self, output: &str) -> Vec<ProcessStep> {
        if let Some(block) = self.json_block.find(output) {
            if let Ok(parsed) = serde_json::from_str::<Value>(block.as_str()) {
                if let Some(items) = parsed.get("steps").and_then(Value::as_array) {
                    let steps: Vec<ProcessStep> = items
                        .iter()
                        .enumerate()
                        .filter_map(|(i, item)| step_from_value(i, item))
                        .collect();
                    if !steps.is_empty() {
                        return steps;
                    }
                }
            }
        }

        let mut steps = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let text = self.list_marker.replace(line, "");
            let text = text.trim();
            if text.chars().count() > 10 {
                steps.push(ProcessStep {
                    step: steps.len() as u32 + 1,
                    text: text.to_string(),
                });
            }
            if steps.len() == MAX_STEPS {
                break;
            }
        }

        if steps.is_empty() {
            steps.push(ProcessStep {
                step: 1,
                text: output.chars().take(FALLBACK_EXCERPT_CHARS).collect(),
            });
        }

        steps
    }

    /// Fetch a page and extract its application steps
    pub async fn extract(&self, url: &str, title: &str) -> Result<ExtractedProcess, ExtractError> {
        if !self.is_configured() {
            return Err(ExtractError::NotConfigured);
        }

        let html = self.fetch_page(url).await?;
        let text = extract_main_text(&html, self.max_text_chars);
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(ExtractError::Unreadable);
        }

        tracing::debug!("Extracted {} chars from {}", text.len(), url);

        let raw = self.call_model(&build_prompt(title, url, &text)).await?;
        let steps = self.parse_steps(&raw);

        Ok(ExtractedProcess {
            steps,
            source: url.to_string(),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str, api_key: Option<&str>) -> ExtractorSettings {
        ExtractorSettings {
            hf_api_key: api_key.map(str::to_string),
            hf_base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    fn extractor() -> ProcessExtractor {
        ProcessExtractor::from_settings(&settings("http://127.0.0.1:1", Some("key"))).unwrap()
    }

    #[test]
    fn test_article_preferred() {
        let html = r#"<html><body><div>Navigation links</div>
            <article><h1>Apply</h1>   <p>Fill in the   form.</p></article></body></html>"#;
        assert_eq!(extract_main_text(html, 18_000), "Apply Fill in the form.");
    }

    #[test]
    fn test_longest_blocks_fallback() {
        let html = "<html><body><p>short</p><p>a much longer paragraph of text</p></body></html>";
        let text = extract_main_text(html, 18_000);
        assert!(text.starts_with("a much longer paragraph of text"));
    }

    #[test]
    fn test_text_is_capped() {
        let html = format!("<main>{}</main>", "word ".repeat(100));
        assert_eq!(extract_main_text(&html, 20).chars().count(), 20);
    }

    #[test]
    fn test_parse_steps_prefers_json() {
        let output = r#"Sure! {"steps":[{"step":1,"text":"Register online"},{"step":2,"text":"Upload marksheets"}],"source":"x"}"#;
        let steps = extractor().parse_steps(output);

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], ProcessStep { step: 2, text: "Upload marksheets".to_string() });
    }

    #[test]
    fn test_parse_steps_numbered_lines() {
        let output = "1. Create an account on the portal\n2) Upload your income certificate\n3 - ok\n- Submit before the deadline";
        let steps = extractor().parse_steps(output);

        let texts: Vec<&str> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Create an account on the portal",
                "Upload your income certificate",
                "Submit before the deadline"
            ]
        );
        assert_eq!(steps[2].step, 3);
    }

    #[test]
    fn test_parse_steps_fallback_excerpt() {
        let steps = extractor().parse_steps("n/a");
        assert_eq!(steps, vec![ProcessStep { step: 1, text: "n/a".to_string() }]);
    }

    #[test]
    fn test_generated_text_shapes() {
        assert_eq!(generated_text(json!([{"generated_text": "a"}])), "a");
        assert_eq!(generated_text(json!([{"summary_text": "b"}])), "b");
        assert_eq!(generated_text(json!({"generated_text": "c"})), "c");
        assert_eq!(generated_text(json!("d")), "d");
    }

    #[tokio::test]
    async fn test_extract_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/apply")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><main>Step one: register on the national scholarship portal. Step two: submit documents.</main></body></html>")
            .create_async()
            .await;
        let model = server
            .mock("POST", "/models/google/flan-t5-small")
            .match_header("authorization", "Bearer key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text":"1. Register on the national portal\n2. Submit your documents"}]"#)
            .create_async()
            .await;

        let extractor = ProcessExtractor::from_settings(&settings(&server.url(), Some("key"))).unwrap();
        let url = format!("{}/apply", server.url());
        let extracted = extractor.extract(&url, "National Merit").await.unwrap();

        assert_eq!(extracted.steps.len(), 2);
        assert_eq!(extracted.steps[0].text, "Register on the national portal");
        assert_eq!(extracted.source, url);
        page.assert_async().await;
        model.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreadable_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("<html><body><div>Loading…</div></body></html>")
            .create_async()
            .await;

        let extractor = ProcessExtractor::from_settings(&settings(&server.url(), Some("key"))).unwrap();
        let result = extractor.extract(&format!("{}/empty", server.url()), "").await;
        assert!(matches!(result, Err(ExtractError::Unreadable)));
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let extractor = ProcessExtractor::from_settings(&settings("http://127.0.0.1:1", None)).unwrap();
        let result = extractor.extract("http://127.0.0.1:1/page", "").await;
        assert!(matches!(result, Err(ExtractError::NotConfigured)));
    }
}
