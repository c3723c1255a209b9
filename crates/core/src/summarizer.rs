use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fluent_tutor_types::{LogMessage, Role, SessionMode, SessionSummary};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

/// Transcripts shorter than this carry too little signal to summarize.
pub const MIN_TRANSCRIPT_TURNS: usize = 3;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Prompt used when no template override is configured. `{mode}` and
/// `{transcript}` are substituted before sending.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Analyze this English learning session and provide a structured summary in JSON format.
Session Mode: {mode}
Transcript:
{transcript}";

/// The three lists the model is asked to fill in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFields {
    pub key_takeaways: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub notable_corrections: Vec<String>,
}

/// Everything needed to summarize one closed session segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub mode: SessionMode,
    pub messages: Vec<LogMessage>,
    pub duration_minutes: u32,
    pub teacher_name: String,
}

impl SummaryRequest {
    pub fn transcript(&self) -> String {
        format_transcript(&self.messages)
    }

    pub fn has_enough_turns(&self) -> bool {
        self.messages.len() >= MIN_TRANSCRIPT_TURNS
    }
}

/// Result of one summarization attempt. Failures are values, not errors: the
/// caller only has to release its busy flag and move on.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Completed(SessionSummary),
    Skipped { turns: usize },
    Failed(String),
}

/// Renders transcript turns as `Speaker: text` lines in arrival order.
pub fn format_transcript(messages: &[LogMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let speaker = match m.role() {
                Role::User => "Student",
                Role::Model | Role::System => "Teacher",
            };
            format!("{speaker}: {}", m.text())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_prompt(template: &str, mode: SessionMode, transcript: &str) -> String {
    template
        .replace("{mode}", mode.as_str())
        .replace("{transcript}", transcript)
}

/// Parses the model's JSON body into [`SummaryFields`]. All three lists are
/// required.
pub fn parse_summary_fields(body: &str) -> Result<SummaryFields> {
    serde_json::from_str(body.trim())
        .with_context(|| format!("Failed to parse summary JSON from model output: {body}"))
}

/// Anything that can turn a rendered transcript into summary fields. Behind a
/// trait so the session logic can be exercised without network calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, mode: SessionMode, transcript: &str) -> Result<SummaryFields>;
}

/// Runs one summarization attempt and assembles the stored record.
///
/// Never returns an error: short transcripts are skipped and failures are
/// logged and reported as [`SummaryOutcome::Failed`].
pub async fn run_summary<S: Summarizer + ?Sized>(
    summarizer: &S,
    request: SummaryRequest,
    now: DateTime<Utc>,
) -> SummaryOutcome {
    if !request.has_enough_turns() {
        tracing::debug!(
            "skipping summary for {} session: only {} turns",
            request.mode,
            request.messages.len()
        );
        return SummaryOutcome::Skipped {
            turns: request.messages.len(),
        };
    }

    match summarizer.summarize(request.mode, &request.transcript()).await {
        Ok(fields) => {
            let summary = SessionSummary::new(
                Uuid::new_v4(),
                request.mode,
                now,
                request.duration_minutes,
                request.teacher_name,
                fields.key_takeaways,
                fields.improvement_areas,
                fields.notable_corrections,
            );
            tracing::info!(
                "summarized {} session ({} min, {} takeaways)",
                summary.mode(),
                summary.duration_minutes(),
                summary.key_takeaways().len()
            );
            SummaryOutcome::Completed(summary)
        }
        Err(e) => {
            tracing::error!("Failed to summarize session: {:?}", e);
            SummaryOutcome::Failed(format!("{e:#}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// Pulls the text of the first candidate out of a `generateContent` response.
fn extract_candidate_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(anyhow::anyhow!("Gemini API blocked the request: {reason}"));
    }
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("No candidate text in Gemini response"));
    }
    Ok(text)
}

/// Structured-output schema with the three required string arrays.
fn response_schema() -> serde_json::Value {
    let string_array = serde_json::json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "keyTakeaways": string_array,
            "improvementAreas": string_array,
            "notableCorrections": string_array,
        },
        "required": ["keyTakeaways", "improvementAreas", "notableCorrections"],
    })
}

/// Summarizer backed by the Gemini `generateContent` endpoint.
pub struct GeminiSummarizer {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    prompt_template: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_prompt_template(mut self, template: &str) -> Self {
        self.prompt_template = template.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, mode: SessionMode, transcript: &str) -> serde_json::Value {
        let prompt = render_prompt(&self.prompt_template, mode, transcript);
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, mode: SessionMode, transcript: &str) -> Result<SummaryFields> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.request_body(mode, transcript);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Failed to reach the summarization endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API request failed with status {status}: {error_text}"
            ));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to decode generateContent response")?;
        let text = extract_candidate_text(response)?;
        parse_summary_fields(&text)
    }
}
