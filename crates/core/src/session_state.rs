use crate::summarizer::SummaryRequest;
use chrono::{DateTime, Utc};
use fluent_tutor_types::{ConnectionState, LogMessage, SessionMode};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Whole minutes between `start` and `end`, rounded half-up. Zero when no
/// start was recorded or the clock went backwards.
pub fn elapsed_minutes(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> u32 {
    let Some(start) = start else {
        return 0;
    };
    let millis = (end - start).num_milliseconds().max(0);
    u32::try_from((millis + MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE).unwrap_or(u32::MAX)
}

/// A frozen copy of one finished session segment.
///
/// Messages arriving after the snapshot was taken belong to the next segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub mode: SessionMode,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub messages: Vec<LogMessage>,
}

impl SessionSnapshot {
    pub fn duration_minutes(&self) -> u32 {
        elapsed_minutes(self.started_at, self.ended_at)
    }

    pub fn into_request(self, teacher_name: &str) -> SummaryRequest {
        let duration_minutes = self.duration_minutes();
        SummaryRequest {
            mode: self.mode,
            messages: self.messages,
            duration_minutes,
            teacher_name: teacher_name.to_string(),
        }
    }
}

/// Tracks the start and end of tutoring sessions from the transport's
/// connection-state transitions and buffers the transcript of the open one.
///
/// The controller never talks to the network. Closing a segment hands back a
/// [`SessionSnapshot`]; turning that into a summarization is gated by
/// [`SessionController::try_begin_summary`], which admits one request at a
/// time.
#[derive(Debug, Default)]
pub struct SessionController {
    connection: ConnectionState,
    mode: SessionMode,
    session_start: Option<DateTime<Utc>>,
    buffer: Vec<LogMessage>,
    summarizing: bool,
}

impl SessionController {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    pub fn is_session_open(&self) -> bool {
        self.session_start.is_some()
    }

    pub fn buffered(&self) -> &[LogMessage] {
        &self.buffer
    }

    pub fn is_summarizing(&self) -> bool {
        self.summarizing
    }

    /// Applies a connection-state transition reported by the transport.
    ///
    /// Returns the closed segment when a disconnect ends a session that
    /// buffered at least one message.
    pub fn on_connection_state(
        &mut self,
        state: ConnectionState,
        now: DateTime<Utc>,
    ) -> Option<SessionSnapshot> {
        let previous = std::mem::replace(&mut self.connection, state);
        if previous != state {
            tracing::debug!("connection state {:?} -> {:?}", previous, state);
        }

        match state {
            ConnectionState::Connected => {
                if self.session_start.is_none() {
                    tracing::info!("{} session started", self.mode);
                    self.session_start = Some(now);
                    self.buffer.clear();
                }
                None
            }
            ConnectionState::Disconnected => {
                if self.session_start.is_none() {
                    return None;
                }
                if self.buffer.is_empty() {
                    tracing::info!("{} session ended before any message arrived", self.mode);
                    self.session_start = None;
                    return None;
                }
                let snapshot = self.close_segment(now);
                tracing::info!(
                    "{} session ended after {} messages ({} min)",
                    snapshot.mode,
                    snapshot.messages.len(),
                    snapshot.duration_minutes()
                );
                Some(snapshot)
            }
            ConnectionState::Connecting | ConnectionState::Error => None,
        }
    }

    /// Appends a transcript message to the open session, in arrival order.
    pub fn on_message(&mut self, message: LogMessage) {
        if self.session_start.is_none() {
            tracing::debug!("dropping message {} received outside a session", message.id());
            return;
        }
        self.buffer.push(message);
    }

    /// Switches the session mode.
    ///
    /// An open session is always closed under the old mode, so no message
    /// from one mode is summarized under another. While connected a fresh
    /// segment starts at `now`; otherwise the next `Connected` opens it.
    pub fn switch_mode(&mut self, mode: SessionMode, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        if mode == self.mode {
            return None;
        }
        let snapshot = if self.session_start.is_some() {
            let snapshot = self.close_segment(now);
            if self.connection == ConnectionState::Connected {
                self.session_start = Some(now);
            }
            Some(snapshot)
        } else {
            None
        };
        tracing::info!("session mode {} -> {}", self.mode, mode);
        self.mode = mode;
        // An empty outgoing segment has nothing to summarize.
        snapshot.filter(|s| !s.messages.is_empty())
    }

    /// Claims the summarization slot for `snapshot`.
    ///
    /// Returns `None`, dropping the snapshot, while another summarization is
    /// still in flight. Nothing is queued or retried.
    pub fn try_begin_summary(
        &mut self,
        snapshot: SessionSnapshot,
        teacher_name: &str,
    ) -> Option<SummaryRequest> {
        if self.summarizing {
            tracing::warn!(
                "summary already in flight, dropping {} segment with {} messages",
                snapshot.mode,
                snapshot.messages.len()
            );
            return None;
        }
        self.summarizing = true;
        Some(snapshot.into_request(teacher_name))
    }

    /// Releases the summarization slot.
    pub fn finish_summary(&mut self) {
        self.summarizing = false;
    }

    fn close_segment(&mut self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            started_at: self.session_start.take(),
            ended_at: now,
            messages: std::mem::take(&mut self.buffer),
        }
    }
}
