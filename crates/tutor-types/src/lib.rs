//! Serializable data model shared by the tutoring core and its runtimes.
//!
//! Field names follow the camelCase layout of the stored profile records so a
//! profile written by one front end can be read back by another.
pub mod level;
pub mod message;
pub mod session;
pub mod teacher;
pub mod user;

//re-export types for easier access
pub use level::EnglishLevel;
pub use message::{
    LogMessage, LogMessageBuilder, MessageKind, PaceDetail, PaceSuggestion, PronunciationDetail,
    Role, SavedVocabulary,
};
pub use session::{ConnectionState, SessionMode, SessionSummary};
pub use teacher::{TeacherId, TeacherProfile};
pub use user::{DailyGoals, ModeXp, User, UserStats};
