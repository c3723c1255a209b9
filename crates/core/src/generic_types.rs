use fluent_tutor_types::{ConnectionState, LogMessage};

/// Events any live transport emits back to the application.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    Message(LogMessage),
    /// Output level in `0.0..=1.0`, for the visualizer.
    Volume(f32),
}
