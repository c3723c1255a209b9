use chrono::{DateTime, Utc};

/// The speaker of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// Selects which structured detail field of a [`LogMessage`] is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Correction,
    Pronunciation,
    Pace,
    Image,
    Vocabulary,
    Writing,
    Exercise,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceSuggestion {
    Fast,
    Slow,
    Steady,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaceDetail {
    pub suggestion: PaceSuggestion,
    pub advice: String,
}

/// A single turn of the live transcript, as emitted by the transport.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    id: String,
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_final: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<MessageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vocab_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vocab_definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pronunciation_detail: Option<PronunciationDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace_detail: Option<PaceDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grammar_rule: Option<String>,
}

impl LogMessage {
    pub fn builder(role: Role, text: &str) -> LogMessageBuilder {
        LogMessageBuilder::new(role, text)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Partial transcriptions are sent with `is_final = false`; a missing flag
    /// counts as final.
    pub fn is_final(&self) -> bool {
        self.is_final.unwrap_or(true)
    }

    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn vocab_term(&self) -> Option<&str> {
        self.vocab_term.as_deref()
    }

    pub fn vocab_definition(&self) -> Option<&str> {
        self.vocab_definition.as_deref()
    }

    pub fn pronunciation_detail(&self) -> Option<&PronunciationDetail> {
        self.pronunciation_detail.as_ref()
    }

    pub fn pace_detail(&self) -> Option<&PaceDetail> {
        self.pace_detail.as_ref()
    }

    pub fn grammar_rule(&self) -> Option<&str> {
        self.grammar_rule.as_deref()
    }
}

pub struct LogMessageBuilder {
    message: LogMessage,
}

impl LogMessageBuilder {
    pub fn new(role: Role, text: &str) -> Self {
        Self {
            message: LogMessage {
                id: uuid::Uuid::new_v4().to_string(),
                role,
                text: text.to_string(),
                timestamp: Utc::now(),
                is_final: None,
                kind: None,
                image: None,
                vocab_term: None,
                vocab_definition: None,
                pronunciation_detail: None,
                pace_detail: None,
                grammar_rule: None,
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.message.id = id.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.message.timestamp = timestamp;
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.message.is_final = Some(is_final);
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.message.kind = Some(kind);
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.message.kind = Some(MessageKind::Image);
        self.message.image = Some(image.to_string());
        self
    }

    pub fn with_vocabulary(mut self, term: &str, definition: &str) -> Self {
        self.message.kind = Some(MessageKind::Vocabulary);
        self.message.vocab_term = Some(term.to_string());
        self.message.vocab_definition = Some(definition.to_string());
        self
    }

    pub fn with_pronunciation(mut self, detail: PronunciationDetail) -> Self {
        self.message.kind = Some(MessageKind::Pronunciation);
        self.message.pronunciation_detail = Some(detail);
        self
    }

    pub fn with_pace(mut self, suggestion: PaceSuggestion, advice: &str) -> Self {
        self.message.kind = Some(MessageKind::Pace);
        self.message.pace_detail = Some(PaceDetail {
            suggestion,
            advice: advice.to_string(),
        });
        self
    }

    pub fn with_grammar_rule(mut self, rule: &str) -> Self {
        self.message.kind = Some(MessageKind::Correction);
        self.message.grammar_rule = Some(rule.to_string());
        self
    }

    pub fn build(self) -> LogMessage {
        self.message
    }
}

/// A vocabulary entry the student kept from a session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedVocabulary {
    pub id: String,
    pub term: String,
    pub definition: String,
    pub timestamp: DateTime<Utc>,
}

impl SavedVocabulary {
    /// Returns `None` unless the message carries both a term and a definition.
    pub fn from_message(message: &LogMessage) -> Option<Self> {
        Some(Self {
            id: message.id.clone(),
            term: message.vocab_term.clone()?,
            definition: message.vocab_definition.clone()?,
            timestamp: message.timestamp,
        })
    }
}
