use crate::summarizer::{Summarizer, SummaryFields, parse_summary_fields};
use anyhow::Result;
use async_trait::async_trait;
use fluent_tutor_types::SessionMode;

/// A simulated `Summarizer`.
///
/// Makes no API calls. Answers every transcript with a plausible, hard-coded
/// summary so the rest of the session pipeline can run offline, for example
/// when replaying a recorded event log without an API key.
pub struct CannedSummarizer;

#[async_trait]
impl Summarizer for CannedSummarizer {
    async fn summarize(&self, mode: SessionMode, transcript: &str) -> Result<SummaryFields> {
        let turns = transcript.lines().filter(|l| l.starts_with("Student:")).count();
        // Shaped like a model reply so it goes through the same parser.
        let body = format!(
            r#"{{"keyTakeaways": ["Completed a {mode} session", "Spoke {turns} times"],
                "improvementAreas": ["Keep practicing {mode} regularly"],
                "notableCorrections": []}}"#
        );
        parse_summary_fields(&body)
    }
}
