use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fluent_tutor_core::realtime_api::LiveTransport;
use fluent_tutor_core::types::{ConnectionState, SessionMode};
use fluent_tutor_core::TransportEvent;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// One line of a recorded session log.
///
/// `at` is the wall-clock time the event was observed; replays use it as the
/// session clock so durations come out as recorded.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordedEvent {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    pub event: TransportEvent,
}

/// Parses a JSON-lines recording. Blank lines and lines starting with `#`
/// are skipped.
pub fn parse_recording(raw: &str) -> Result<Vec<RecordedEvent>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid event on line {}: {}", i + 1, line))
        })
        .collect()
}

/// A `LiveTransport` that plays back a recorded event log instead of talking
/// to a live model.
///
/// Commands sent to it are logged and kept for inspection. The recorded events
/// are emitted once, in order, on whichever receiver is taken first.
pub struct ReplayTransport {
    recording: Vec<RecordedEvent>,
    delay: Duration,
    taken: bool,
    status: watch::Receiver<(ConnectionState, f32)>,
    status_tx: Option<watch::Sender<(ConnectionState, f32)>>,
    sent: Vec<String>,
    mic_on: bool,
    cam_on: bool,
}

impl ReplayTransport {
    pub fn new(recording: Vec<RecordedEvent>) -> Self {
        let (status_tx, status) = watch::channel((ConnectionState::Disconnected, 0.0));
        Self {
            recording,
            delay: Duration::ZERO,
            taken: false,
            status,
            status_tx: Some(status_tx),
            sent: Vec::new(),
            mic_on: true,
            cam_on: false,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event log: {}", path.display()))?;
        let recording = parse_recording(&raw)?;
        tracing::info!("Loaded {} recorded events from {}", recording.len(), path.display());
        Ok(Self::new(recording))
    }

    /// Pause between emitted events.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Text commands the application sent, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Takes the recording with its timestamps. Like [`LiveTransport::events`],
    /// this can only happen once.
    pub fn take_recording(&mut self) -> Result<mpsc::Receiver<RecordedEvent>> {
        if self.taken {
            return Err(anyhow::anyhow!("replay channel has already been taken"));
        }
        self.taken = true;
        let status_tx = self
            .status_tx
            .take()
            .context("replay status channel missing")?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let recording = std::mem::take(&mut self.recording);
        let delay = self.delay;

        tokio::spawn(async move {
            for record in recording {
                status_tx.send_modify(|(state, volume)| match &record.event {
                    TransportEvent::StateChanged(s) => *state = *s,
                    TransportEvent::Volume(v) => *volume = *v,
                    TransportEvent::Message(_) => {}
                });
                if tx.send(record).await.is_err() {
                    tracing::warn!("Replay receiver dropped, stopping playback.");
                    return;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            tracing::info!("Replay finished.");
        });

        Ok(rx)
    }
}

#[async_trait]
impl LiveTransport for ReplayTransport {
    async fn connect(&mut self, mode: SessionMode, initial_text: Option<String>) -> Result<()> {
        tracing::info!("replay: connect requested in {} mode", mode);
        if let Some(text) = initial_text {
            self.sent.push(text);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        tracing::info!("replay: disconnect requested");
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<()> {
        tracing::debug!("replay: send_text {}", text);
        self.sent.push(text);
        Ok(())
    }

    async fn change_mode(&mut self, mode: SessionMode) -> Result<()> {
        tracing::info!("replay: mode change to {}", mode);
        Ok(())
    }

    async fn toggle_mic(&mut self) -> Result<()> {
        self.mic_on = !self.mic_on;
        Ok(())
    }

    async fn toggle_cam(&mut self) -> Result<()> {
        self.cam_on = !self.cam_on;
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        self.status.borrow().0
    }

    fn volume(&self) -> f32 {
        self.status.borrow().1
    }

    fn is_mic_on(&self) -> bool {
        self.mic_on
    }

    fn is_cam_on(&self) -> bool {
        self.cam_on
    }

    fn events(&mut self) -> Result<mpsc::Receiver<TransportEvent>> {
        let mut recorded = self.take_recording()?;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(record) = recorded.recv().await {
                if tx.send(record.event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
