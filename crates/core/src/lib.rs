//! Session logic of the tutor: the application state, session segmentation,
//! post-session summarization, profile persistence and progress stats.
//!
//! The live voice model sits behind [`realtime_api::LiveTransport`] and the
//! summary model behind [`summarizer::Summarizer`], so everything here runs
//! without a network in tests.

pub mod app;
pub mod canned_summarizer;
pub mod catalog;
pub mod generic_types;
pub mod profile_store;
pub mod realtime_api;
pub mod session_state;
pub mod stats;
pub mod summarizer;

pub use app::{AppError, ProfileUpdate, TutorApp};
pub use fluent_tutor_types as types;
pub use generic_types::TransportEvent;
pub use summarizer::{GeminiSummarizer, SummaryOutcome};
