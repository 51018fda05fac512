// Gemini generateContent implementation of the remote scorer.
//
// The model is asked for a structured JSON reply ({score, reason}) via a
// response schema, so the answer can be parsed without scraping prose.
// Errors are returned as-is; the gate decides what a failure means.
//
// API docs: https://ai.google.dev/api/generate-content

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::credentials::CredentialProvider;
use super::traits::{ScanScore, ToxicityScorer};
use crate::output::truncate_chars;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ANALYZER_MODEL: &str = "gemini-3-flash-preview";

const DEFAULT_REASON: &str = "No issues detected.";

/// Remote toxicity scorer backed by a Gemini model.
pub struct GeminiScorer {
    client: Client,
    base_url: String,
    model: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GeminiScorer {
    /// `request_timeout` bounds each HTTP call end to end. It should be
    /// longer than the gate's scan timeout, so a scan the gate has already
    /// given up on still ends instead of holding its socket open.
    pub fn new(
        base_url: &str,
        model: &str,
        credentials: Arc<dyn CredentialProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent("gigglechat/0.1 (moderation)")
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ToxicityScorer for GeminiScorer {
    async fn score_text(&self, text: &str) -> Result<ScanScore> {
        let api_key = self
            .credentials
            .api_key()
            .context("No scorer API key configured (set GEMINI_API_KEY)")?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&build_request(text))
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API returned {}: {}", status, body);
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let score = parse_reply(&reply)?;

        debug!(
            score = score.score,
            text_preview = %truncate_chars(text, 50),
            "Scored text"
        );

        Ok(score)
    }
}

/// The moderation prompt sent to the model.
pub fn moderation_prompt(text: &str) -> String {
    format!(
        "Act as a strict content moderator. Analyze the following text for any sign of \
         toxicity, harassment, insults, or profanity. Rate it 0-100 where 0 is perfectly \
         safe and 100 is extremely harmful. Even mild insults or \"edgy\" language should \
         receive a score above 40. Text: {text:?}"
    )
}

fn build_request(text: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: Some(moderation_prompt(text)),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: json!({
                "type": "OBJECT",
                "properties": {
                    "score": {
                        "type": "NUMBER",
                        "description": "The toxicity score from 0 to 100."
                    },
                    "reason": {
                        "type": "STRING",
                        "description": "Brief reason for the assigned score."
                    }
                },
                "required": ["score", "reason"]
            }),
        },
    }
}

/// Pull the verdict JSON out of the first candidate's text parts.
fn parse_reply(reply: &GenerateContentResponse) -> Result<ScanScore> {
    let text: String = reply
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Ok(ScanScore {
            score: 0.0,
            reason: Some(DEFAULT_REASON.to_string()),
        });
    }

    parse_verdict(&text)
}

/// Parse the model's `{score, reason}` JSON.
///
/// A missing score counts as 0 and a missing reason gets a stock message;
/// a score that isn't a finite number is an error.
pub fn parse_verdict(text: &str) -> Result<ScanScore> {
    let verdict: VerdictJson =
        serde_json::from_str(text.trim()).context("Scorer reply is not valid verdict JSON")?;

    let score = verdict.score.unwrap_or(0.0);
    if !score.is_finite() {
        anyhow::bail!("Scorer returned a non-finite score");
    }

    Ok(ScanScore {
        score,
        reason: Some(
            verdict
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REASON.to_string()),
        ),
    })
}

// --- Gemini API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct VerdictJson {
    score: Option<f64>,
    reason: Option<String>,
}
