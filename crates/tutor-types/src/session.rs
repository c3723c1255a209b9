use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The kind of practice a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Conversation,
    Pronunciation,
    Writing,
    Roleplay,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Conversation => "conversation",
            SessionMode::Pronunciation => "pronunciation",
            SessionMode::Writing => "writing",
            SessionMode::Roleplay => "roleplay",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conversation" => Ok(SessionMode::Conversation),
            "pronunciation" => Ok(SessionMode::Pronunciation),
            "writing" => Ok(SessionMode::Writing),
            "roleplay" => Ok(SessionMode::Roleplay),
            other => Err(format!("unknown session mode: {other}")),
        }
    }
}

/// Connection state reported by the live transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Structured recap of one finished session segment.
///
/// Built once by the summarizer and never mutated afterwards; the fields are
/// private and only readable through accessors.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    id: Uuid,
    mode: SessionMode,
    timestamp: DateTime<Utc>,
    duration_minutes: u32,
    teacher_name: String,
    key_takeaways: Vec<String>,
    improvement_areas: Vec<String>,
    notable_corrections: Vec<String>,
}

impl SessionSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        mode: SessionMode,
        timestamp: DateTime<Utc>,
        duration_minutes: u32,
        teacher_name: impl Into<String>,
        key_takeaways: Vec<String>,
        improvement_areas: Vec<String>,
        notable_corrections: Vec<String>,
    ) -> Self {
        Self {
            id,
            mode,
            timestamp,
            duration_minutes,
            teacher_name: teacher_name.into(),
            key_takeaways,
            improvement_areas,
            notable_corrections,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn teacher_name(&self) -> &str {
        &self.teacher_name
    }

    pub fn key_takeaways(&self) -> &[String] {
        &self.key_takeaways
    }

    pub fn improvement_areas(&self) -> &[String] {
        &self.improvement_areas
    }

    pub fn notable_corrections(&self) -> &[String] {
        &self.notable_corrections
    }
}
