use crate::generic_types::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use fluent_tutor_types::{ConnectionState, SessionMode};
#[cfg(test)]
use mockall::automock;

/// The live audio/video link to the hosted tutor model.
///
/// Capture, streaming and voice synthesis all happen behind this trait; the
/// application only drives it and listens to the events it emits.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LiveTransport: Send {
    /// Opens a connection in `mode`, optionally sending `initial_text` once
    /// connected.
    async fn connect(&mut self, mode: SessionMode, initial_text: Option<String>) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Re-instructs the model for `mode` without dropping the connection.
    async fn change_mode(&mut self, mode: SessionMode) -> Result<()>;

    async fn toggle_mic(&mut self) -> Result<()>;

    async fn toggle_cam(&mut self) -> Result<()>;

    fn connection_state(&self) -> ConnectionState;

    fn volume(&self) -> f32;

    fn is_mic_on(&self) -> bool;

    fn is_cam_on(&self) -> bool;

    /// Returns a channel receiver for listening to transport events. May only
    /// be taken once.
    fn events(&mut self) -> Result<tokio::sync::mpsc::Receiver<TransportEvent>>;
}
