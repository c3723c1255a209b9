use crate::catalog::{self, PhonemeCatalog, RoleplayScenario};
use crate::generic_types::TransportEvent;
use crate::profile_store::{KeyValueStore, ProfileStore, StoreError};
use crate::realtime_api::LiveTransport;
use crate::session_state::{SessionController, SessionSnapshot};
use crate::stats;
use crate::summarizer::{MIN_TRANSCRIPT_TURNS, Summarizer, SummaryOutcome, run_summary};
use chrono::{DateTime, Local, Utc};
use fluent_tutor_types::{
    ConnectionState, DailyGoals, EnglishLevel, LogMessage, PaceDetail, SavedVocabulary,
    SessionMode, SessionSummary, TeacherId, TeacherProfile, User, UserStats,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the channel carrying finished summarizations back to the app.
const OUTCOME_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Text must not be empty")]
    EmptyText,
    #[error("No known practice sounds selected")]
    NoPhonemesSelected,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Profile fields a user may change after sign-up. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub proficiency_level: Option<EnglishLevel>,
    pub preferred_teacher_id: Option<TeacherId>,
    pub reminder_enabled: Option<bool>,
    pub reminder_time: Option<String>,
    pub daily_goals: Option<DailyGoals>,
}

pub fn learn_more_command(correction: &str) -> String {
    format!(
        "The student wants to learn more about this correction: \"{correction}\". Please explain the grammar rule in detail."
    )
}

pub fn writing_feedback_command(text: &str) -> String {
    format!(
        "The student has submitted the following text for your critique and feedback: \"{text}\". Please provide \"Written Feedback:\" and a \"Grammar Insight:\" correction."
    )
}

pub fn phoneme_practice_command(commands: &[&str]) -> String {
    format!(
        "I want to practice these specific sounds: {}",
        commands.join(", ")
    )
}

/// The application state of one tutoring front end.
///
/// Owns the signed-in user and the session controller, and is the only place
/// that touches the profile store. Summarizations run on spawned tasks and
/// report back through the receiver returned by [`TutorApp::new`]; feed each
/// outcome to [`TutorApp::apply_outcome`].
pub struct TutorApp<T: LiveTransport, S: KeyValueStore> {
    transport: T,
    store: ProfileStore<S>,
    summarizer: Arc<dyn Summarizer>,
    outcome_tx: mpsc::Sender<SummaryOutcome>,
    controller: SessionController,
    user: Option<User>,
    teacher: TeacherId,
    messages: Vec<LogMessage>,
    last_pace: Option<PaceDetail>,
    volume: f32,
    phonemes: PhonemeCatalog,
}

impl<T: LiveTransport, S: KeyValueStore> TutorApp<T, S> {
    pub fn new(
        transport: T,
        store: ProfileStore<S>,
        summarizer: Arc<dyn Summarizer>,
    ) -> (Self, mpsc::Receiver<SummaryOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        let user = store.load();
        let teacher = user.as_ref().map(User::teacher).unwrap_or_default();
        if let Some(user) = &user {
            tracing::info!("restored profile for {}", user.name);
        }
        let app = Self {
            transport,
            store,
            summarizer,
            outcome_tx,
            controller: SessionController::new(SessionMode::Conversation),
            user,
            teacher,
            messages: Vec::new(),
            last_pace: None,
            volume: 0.0,
            phonemes: PhonemeCatalog::default(),
        };
        (app, outcome_rx)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn mode(&self) -> SessionMode {
        self.controller.mode()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.controller.connection_state()
    }

    pub fn is_summarizing(&self) -> bool {
        self.controller.is_summarizing()
    }

    pub fn teacher(&self) -> TeacherProfile {
        catalog::teacher(self.teacher)
    }

    /// Every message seen since start-up, for display.
    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    pub fn last_pace(&self) -> Option<&PaceDetail> {
        self.last_pace.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Vocabulary the tutor introduced, in the order it came up.
    pub fn vocabulary(&self) -> Vec<SavedVocabulary> {
        self.messages
            .iter()
            .filter_map(SavedVocabulary::from_message)
            .collect()
    }

    pub fn take_events(&mut self) -> anyhow::Result<mpsc::Receiver<TransportEvent>> {
        self.transport.events()
    }

    pub fn sign_up(
        &mut self,
        name: &str,
        level: EnglishLevel,
        teacher: TeacherId,
    ) -> Result<&User, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }
        let user = User::new(name, level, teacher, Utc::now());
        self.store.save(&user)?;
        tracing::info!("signed up {} at level {}", user.name, user.proficiency_level);
        self.teacher = teacher;
        Ok(&*self.user.insert(user))
    }

    pub fn sign_out(&mut self) -> Result<(), AppError> {
        self.store.sign_out()?;
        self.user = None;
        Ok(())
    }

    pub fn select_teacher(&mut self, teacher: TeacherId) {
        self.teacher = teacher;
    }

    /// Read-modify-write of the profile, then save.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<(), AppError> {
        let mut user = self.user.clone().ok_or(AppError::NotSignedIn)?;
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::EmptyName);
            }
            user.name = name.to_string();
        }
        if let Some(level) = update.proficiency_level {
            user.proficiency_level = level;
        }
        if let Some(teacher) = update.preferred_teacher_id {
            user.preferred_teacher_id = Some(teacher);
            self.teacher = teacher;
        }
        if let Some(enabled) = update.reminder_enabled {
            user.reminder_enabled = Some(enabled);
        }
        if let Some(time) = update.reminder_time {
            user.reminder_time = Some(time);
        }
        if let Some(goals) = update.daily_goals {
            user.daily_goals = goals;
        }
        self.commit(user)
    }

    /// Read-modify-write of the stats, then save.
    pub fn update_stats<F: FnOnce(&mut UserStats)>(&mut self, f: F) -> Result<(), AppError> {
        let mut user = self.user.clone().ok_or(AppError::NotSignedIn)?;
        f(&mut user.stats);
        self.commit(user)
    }

    pub async fn connect(&mut self) -> Result<(), AppError> {
        self.transport.connect(self.mode(), None).await?;
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), AppError> {
        self.transport.disconnect().await?;
        Ok(())
    }

    pub async fn toggle_mic(&mut self) -> Result<(), AppError> {
        self.transport.toggle_mic().await?;
        Ok(())
    }

    pub async fn toggle_cam(&mut self) -> Result<(), AppError> {
        self.transport.toggle_cam().await?;
        Ok(())
    }

    /// Applies one transport event.
    ///
    /// Summaries of closed sessions are spawned on the current Tokio runtime.
    /// Called outside a runtime, a closed session is logged and dropped.
    pub fn handle_event(&mut self, event: TransportEvent) {
        self.handle_event_at(event, Utc::now());
    }

    pub fn handle_event_at(&mut self, event: TransportEvent, now: DateTime<Utc>) {
        match event {
            TransportEvent::StateChanged(state) => {
                if state == ConnectionState::Error {
                    tracing::warn!("transport reported a connection error");
                }
                if let Some(snapshot) = self.controller.on_connection_state(state, now) {
                    self.dispatch_summary(snapshot);
                }
            }
            TransportEvent::Message(message) => {
                if let Some(pace) = message.pace_detail() {
                    self.last_pace = Some(pace.clone());
                }
                self.messages.push(message.clone());
                self.controller.on_message(message);
            }
            TransportEvent::Volume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
            }
        }
    }

    pub async fn change_mode(&mut self, mode: SessionMode) -> Result<(), AppError> {
        self.change_mode_at(mode, Utc::now()).await
    }

    /// While connected, closes the current segment and re-instructs the live
    /// model; otherwise connects in the new mode.
    pub async fn change_mode_at(
        &mut self,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let connected = self.connection_state() == ConnectionState::Connected;
        if let Some(snapshot) = self.controller.switch_mode(mode, now) {
            self.dispatch_summary(snapshot);
        }
        if connected {
            self.transport.change_mode(mode).await?;
        } else {
            self.transport.connect(mode, None).await?;
        }
        Ok(())
    }

    pub async fn learn_more(&mut self, correction: &str) -> Result<(), AppError> {
        let mode = self.mode();
        self.send_or_connect(mode, learn_more_command(correction))
            .await
    }

    pub async fn submit_writing(&mut self, text: &str) -> Result<(), AppError> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyText);
        }
        let command = writing_feedback_command(text);
        if self.connection_state() == ConnectionState::Connected {
            self.transport.send_text(command).await?;
            Ok(())
        } else {
            self.send_or_connect(SessionMode::Writing, command).await
        }
    }

    /// Starts a pronunciation drill on the sounds with the given labels.
    ///
    /// Labels are resolved exactly, then fuzzily; unknown ones are skipped.
    /// The drill lists the sounds in catalog order.
    pub async fn start_phoneme_session(&mut self, labels: &[&str]) -> Result<(), AppError> {
        let mut selected = Vec::new();
        for label in labels {
            match self.phonemes.resolve(label) {
                Some(item) => selected.push(item.label),
                None => tracing::warn!("ignoring unknown practice sound '{}'", label),
            }
        }
        let commands: Vec<&str> = self
            .phonemes
            .items
            .iter()
            .filter(|item| selected.contains(&item.label))
            .map(|item| item.command)
            .collect();
        if commands.is_empty() {
            return Err(AppError::NoPhonemesSelected);
        }
        self.send_or_connect(SessionMode::Pronunciation, phoneme_practice_command(&commands))
            .await
    }

    pub async fn start_roleplay(&mut self, scenario: &RoleplayScenario) -> Result<(), AppError> {
        self.send_or_connect(SessionMode::Roleplay, scenario.command.to_string())
            .await
    }

    /// Consumes one summarization result: releases the busy flag and, on
    /// success, merges the summary into the user's stats.
    pub fn apply_outcome(
        &mut self,
        outcome: SummaryOutcome,
    ) -> Result<Option<SessionSummary>, AppError> {
        self.controller.finish_summary();
        match outcome {
            SummaryOutcome::Completed(summary) if self.user.is_none() => {
                tracing::warn!("signed out before the {} summary arrived", summary.mode());
                Ok(None)
            }
            SummaryOutcome::Completed(summary) => {
                let today = summary.timestamp().with_timezone(&Local).date_naive();
                let stored = summary.clone();
                self.update_stats(|s| stats::record_session(s, summary, today))?;
                Ok(Some(stored))
            }
            SummaryOutcome::Skipped { turns } => {
                tracing::debug!("summary skipped ({} turns)", turns);
                Ok(None)
            }
            SummaryOutcome::Failed(reason) => {
                tracing::warn!("session summary lost: {}", reason);
                Ok(None)
            }
        }
    }

    /// Switches to `mode` if needed, then sends `command`, connecting first
    /// when there is no live session.
    async fn send_or_connect(&mut self, mode: SessionMode, command: String) -> Result<(), AppError> {
        if self.connection_state() == ConnectionState::Connected {
            if mode != self.mode() {
                self.change_mode(mode).await?;
            }
            self.transport.send_text(command).await?;
        } else {
            if let Some(snapshot) = self.controller.switch_mode(mode, Utc::now()) {
                self.dispatch_summary(snapshot);
            }
            self.transport.connect(mode, Some(command)).await?;
        }
        Ok(())
    }

    fn commit(&mut self, user: User) -> Result<(), AppError> {
        self.store.save(&user)?;
        self.user = Some(user);
        Ok(())
    }

    fn dispatch_summary(&mut self, snapshot: SessionSnapshot) {
        if self.user.is_none() {
            tracing::warn!("no signed-in user, discarding {} session", snapshot.mode);
            return;
        }
        if snapshot.messages.len() < MIN_TRANSCRIPT_TURNS {
            tracing::info!(
                "{} session too short to summarize ({} turns)",
                snapshot.mode,
                snapshot.messages.len()
            );
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                "no async runtime to summarize the {} session on, dropping it",
                snapshot.mode
            );
            return;
        };
        let teacher_name = self.teacher().name;
        let Some(request) = self.controller.try_begin_summary(snapshot, &teacher_name) else {
            return;
        };

        let summarizer = Arc::clone(&self.summarizer);
        let outcome_tx = self.outcome_tx.clone();
        let task = runtime.spawn(async move {
            run_summary(summarizer.as_ref(), request, Utc::now()).await
        });
        // Report back even if the summarizer panicked, so the busy flag is
        // released.
        runtime.spawn(async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Summary task failed: {}", e);
                    SummaryOutcome::Failed(format!("summary task failed: {e}"))
                }
            };
            if outcome_tx.send(outcome).await.is_err() {
                tracing::warn!("summary receiver dropped, outcome discarded");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_store::MemoryStore;
    use crate::realtime_api::MockLiveTransport;
    use crate::summarizer::{MockSummarizer, SummaryFields};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use fluent_tutor_types::{PaceSuggestion, Role};
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn greeting_summarizer(calls: usize) -> MockSummarizer {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .returning(|_, _| {
                Ok(SummaryFields {
                    key_takeaways: vec!["greeting".to_string()],
                    improvement_areas: vec!["none".to_string()],
                    notable_corrections: vec![],
                })
            })
            .times(calls);
        mock
    }

    fn signed_in_app(
        transport: MockLiveTransport,
        summarizer: Arc<dyn Summarizer>,
    ) -> (
        TutorApp<MockLiveTransport, MemoryStore>,
        mpsc::Receiver<SummaryOutcome>,
    ) {
        let (mut app, rx) = TutorApp::new(
            transport,
            ProfileStore::new(MemoryStore::new()),
            summarizer,
        );
        app.sign_up("Ana", EnglishLevel::B1, TeacherId::Sophia).unwrap();
        (app, rx)
    }

    fn say(app: &mut TutorApp<MockLiveTransport, MemoryStore>, role: Role, text: &str, t: i64) {
        let message = LogMessage::builder(role, text).with_timestamp(at(t)).build();
        app.handle_event_at(TransportEvent::Message(message), at(t));
    }

    fn greeting_session(app: &mut TutorApp<MockLiveTransport, MemoryStore>) {
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(0));
        say(app, Role::User, "hi", 1);
        say(app, Role::Model, "hello", 2);
        say(app, Role::User, "how are you", 3);
    }

    #[tokio::test]
    async fn disconnect_summarizes_and_stores_the_session() {
        let (mut app, mut rx) = signed_in_app(
            MockLiveTransport::new(),
            Arc::new(greeting_summarizer(1)),
        );

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(5));
        assert!(app.is_summarizing());

        let outcome = rx.recv().await.unwrap();
        let stored = app.apply_outcome(outcome).unwrap().unwrap();
        assert!(!app.is_summarizing());

        let user = app.user().unwrap();
        assert_eq!(user.stats.session_history.len(), 1);
        let summary = &user.stats.session_history[0];
        assert_eq!(summary, &stored);
        assert_eq!(summary.key_takeaways(), ["greeting".to_string()]);
        assert_eq!(summary.duration_minutes(), 5);
        assert_eq!(summary.teacher_name(), "Sophia Victoria");
        assert_eq!(summary.mode(), SessionMode::Conversation);
        assert_eq!(user.stats.total_minutes, 5);
        assert_eq!(user.stats.streak, 1);

        // The merged stats were persisted.
        let reloaded = app.store.load().unwrap();
        assert_eq!(reloaded.stats.session_history.len(), 1);
    }

    #[tokio::test]
    async fn short_sessions_are_never_sent_to_the_model() {
        let (mut app, mut rx) = signed_in_app(
            MockLiveTransport::new(),
            Arc::new(greeting_summarizer(0)),
        );

        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(0));
        say(&mut app, Role::User, "hi", 1);
        say(&mut app, Role::Model, "hello", 2);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(3));

        assert!(!app.is_summarizing());
        assert!(rx.try_recv().is_err());
        assert!(app.user().unwrap().stats.session_history.is_empty());
        // The next session starts from an empty buffer.
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(4));
        assert!(app.controller.buffered().is_empty());
    }

    #[tokio::test]
    async fn failed_summaries_are_dropped_and_free_the_next_session() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .returning(|_, _| Err(anyhow::anyhow!("malformed JSON")))
            .times(2);
        let (mut app, mut rx) = signed_in_app(MockLiveTransport::new(), Arc::new(mock));

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(5));
        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
        assert_eq!(app.apply_outcome(outcome).unwrap(), None);
        assert!(app.user().unwrap().stats.session_history.is_empty());

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(6));
        assert!(app.is_summarizing());
        let outcome = rx.recv().await.unwrap();
        app.apply_outcome(outcome).unwrap();
    }

    #[tokio::test]
    async fn mode_switch_summarizes_the_outgoing_mode_first() {
        let mut transport = MockLiveTransport::new();
        transport
            .expect_change_mode()
            .with(eq(SessionMode::Roleplay))
            .returning(|_| Ok(()))
            .once();
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|mode, transcript| {
                *mode == SessionMode::Conversation && !transcript.contains("table for two")
            })
            .returning(|_, _| Ok(SummaryFields::default()))
            .once();
        let (mut app, mut rx) = signed_in_app(transport, Arc::new(summarizer));

        greeting_session(&mut app);
        app.change_mode_at(SessionMode::Roleplay, at(4)).await.unwrap();
        say(&mut app, Role::User, "a table for two, please", 5);

        let outcome = rx.recv().await.unwrap();
        let summary = app.apply_outcome(outcome).unwrap().unwrap();
        assert_eq!(summary.mode(), SessionMode::Conversation);
        assert_eq!(summary.duration_minutes(), 4);

        assert_eq!(app.mode(), SessionMode::Roleplay);
        assert_eq!(app.controller.buffered().len(), 1);
        assert_eq!(app.user().unwrap().stats.mode_xp.conversation, 4);
    }

    /// Counts calls and parks each one until released.
    struct GatedSummarizer {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl Summarizer for GatedSummarizer {
        async fn summarize(
            &self,
            _mode: SessionMode,
            _transcript: &str,
        ) -> anyhow::Result<SummaryFields> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(SummaryFields::default())
        }
    }

    #[tokio::test]
    async fn overlapping_disconnects_make_at_most_one_call() {
        let summarizer = Arc::new(GatedSummarizer {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let (mut app, mut rx) = signed_in_app(MockLiveTransport::new(), summarizer.clone());

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(5));
        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(9));
        assert!(app.controller.buffered().is_empty());

        // Let the spawned task reach the model call.
        while summarizer.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        summarizer.gate.notify_one();
        let outcome = rx.recv().await.unwrap();
        app.apply_outcome(outcome).unwrap();

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.user().unwrap().stats.session_history.len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn commands_connect_in_the_right_mode_when_offline() {
        let mut transport = MockLiveTransport::new();
        transport
            .expect_connect()
            .withf(|mode, text| {
                *mode == SessionMode::Writing
                    && text
                        .as_deref()
                        .is_some_and(|t| t.contains("\"  I goed home \"") && t.contains("Grammar Insight:"))
            })
            .returning(|_, _| Ok(()))
            .once();
        transport
            .expect_connect()
            .withf(|mode, text| {
                *mode == SessionMode::Pronunciation
                    && text.as_deref()
                        == Some("I want to practice these specific sounds: distinction between /r/ and /l/, velar nasal /ŋ/ sound")
            })
            .returning(|_, _| Ok(()))
            .once();
        let (mut app, _rx) = signed_in_app(transport, Arc::new(MockSummarizer::new()));

        app.submit_writing("  I goed home ").await.unwrap();
        assert_eq!(app.mode(), SessionMode::Writing);
        app.start_phoneme_session(&["NG Sound", "R vs L"]).await.unwrap();
        assert_eq!(app.mode(), SessionMode::Pronunciation);

        assert!(matches!(app.submit_writing("   ").await, Err(AppError::EmptyText)));
        assert!(matches!(
            app.start_phoneme_session(&["Klingon clicks"]).await,
            Err(AppError::NoPhonemesSelected)
        ));
    }

    #[tokio::test]
    async fn roleplay_while_connected_switches_mode_then_sends() {
        let mut transport = MockLiveTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_change_mode()
            .with(eq(SessionMode::Roleplay))
            .returning(|_| Ok(()))
            .once()
            .in_sequence(&mut seq);
        transport
            .expect_send_text()
            .withf(|text| text.contains("You are the doctor"))
            .returning(|_| Ok(()))
            .once()
            .in_sequence(&mut seq);
        let (mut app, _rx) = signed_in_app(transport, Arc::new(MockSummarizer::new()));

        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(0));
        let scenario = catalog::roleplay_scenario("Doctor Visit").unwrap();
        app.start_roleplay(scenario).await.unwrap();
        assert_eq!(app.mode(), SessionMode::Roleplay);
    }

    #[tokio::test]
    async fn phoneme_labels_resolve_fuzzily_and_skip_unknowns() {
        let mut transport = MockLiveTransport::new();
        transport
            .expect_connect()
            .with(
                eq(SessionMode::Pronunciation),
                eq(Some(phoneme_practice_command(&[
                    "unvoiced \"th\" /θ/",
                    "long /i:/ and short /ɪ/ vowel sounds",
                ]))),
            )
            .returning(|_, _| Ok(()))
            .once();
        let (mut app, _rx) = signed_in_app(transport, Arc::new(MockSummarizer::new()));

        app.start_phoneme_session(&["sheep ship", "Klingon clicks", "th (unvoiced)"])
            .await
            .unwrap();
        assert!(matches!(
            app.start_phoneme_session(&[]).await,
            Err(AppError::NoPhonemesSelected)
        ));
    }

    #[tokio::test]
    async fn mode_change_after_a_connection_error_keeps_modes_apart() {
        let mut transport = MockLiveTransport::new();
        transport
            .expect_connect()
            .with(eq(SessionMode::Roleplay), eq(None))
            .returning(|_, _| Ok(()))
            .once();
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|mode, transcript| {
                *mode == SessionMode::Conversation
                    && transcript.lines().count() == 3
                    && !transcript.contains("boarding pass")
            })
            .returning(|_, _| Ok(SummaryFields::default()))
            .once();
        let (mut app, mut rx) = signed_in_app(transport, Arc::new(summarizer));

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Error), at(4));
        app.change_mode_at(SessionMode::Roleplay, at(5)).await.unwrap();
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(6));
        say(&mut app, Role::User, "here is my boarding pass", 7);

        let outcome = rx.recv().await.unwrap();
        let summary = app.apply_outcome(outcome).unwrap().unwrap();
        assert_eq!(summary.mode(), SessionMode::Conversation);
        assert_eq!(summary.duration_minutes(), 5);
        assert_eq!(app.controller.buffered().len(), 1);
        assert_eq!(app.user().unwrap().stats.mode_xp.roleplay, 0);
    }

    struct PanickingSummarizer;

    #[async_trait]
    impl Summarizer for PanickingSummarizer {
        async fn summarize(
            &self,
            _mode: SessionMode,
            _transcript: &str,
        ) -> anyhow::Result<SummaryFields> {
            panic!("summarizer blew up")
        }
    }

    #[tokio::test]
    async fn panicking_summarizer_still_releases_the_busy_flag() {
        let (mut app, mut rx) = signed_in_app(MockLiveTransport::new(), Arc::new(PanickingSummarizer));

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(5));
        assert!(app.is_summarizing());

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(&outcome, SummaryOutcome::Failed(reason) if reason.contains("panic")));
        assert_eq!(app.apply_outcome(outcome).unwrap(), None);
        assert!(!app.is_summarizing());

        // The next session is summarized again.
        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(9));
        assert!(app.is_summarizing());
        assert!(matches!(rx.recv().await.unwrap(), SummaryOutcome::Failed(_)));
    }

    #[test]
    fn closed_sessions_outside_a_runtime_are_dropped_without_panicking() {
        let (mut app, _rx) = signed_in_app(MockLiveTransport::new(), Arc::new(MockSummarizer::new()));

        greeting_session(&mut app);
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Disconnected), at(5));

        assert!(!app.is_summarizing());
        assert!(app.controller.buffered().is_empty());
    }

    #[tokio::test]
    async fn learn_more_stays_in_the_current_mode() {
        let mut transport = MockLiveTransport::new();
        transport
            .expect_send_text()
            .with(eq(learn_more_command("I goed -> I went")))
            .returning(|_| Ok(()))
            .once();
        transport.expect_change_mode().never();
        transport
            .expect_disconnect()
            .returning(|| Ok(()))
            .once();
        let (mut app, _rx) = signed_in_app(transport, Arc::new(MockSummarizer::new()));

        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(0));
        app.learn_more("I goed -> I went").await.unwrap();
        app.disconnect().await.unwrap();
        assert_eq!(app.mode(), SessionMode::Conversation);
    }

    #[tokio::test]
    async fn profile_updates_are_saved_and_restored() {
        let (mut app, _rx) = signed_in_app(MockLiveTransport::new(), Arc::new(MockSummarizer::new()));
        app.update_profile(ProfileUpdate {
            proficiency_level: Some(EnglishLevel::C1),
            preferred_teacher_id: Some(TeacherId::Sebas),
            daily_goals: Some(DailyGoals { minutes: 30, vocab: 10 }),
            ..Default::default()
        })
        .unwrap();
        app.update_stats(|s| stats::award_phoneme_xp(s, "R vs L", 3))
            .unwrap();
        assert_eq!(app.teacher().name, "Super Sebas");

        let store = std::mem::replace(&mut app.store, ProfileStore::new(MemoryStore::new()));
        let (restored, _rx) = TutorApp::new(
            MockLiveTransport::new(),
            store,
            Arc::new(MockSummarizer::new()),
        );
        let user = restored.user().unwrap();
        assert_eq!(user.proficiency_level, EnglishLevel::C1);
        assert_eq!(user.daily_goals.minutes, 30);
        assert_eq!(user.stats.phoneme_mastery["R vs L"], 3);
        assert_eq!(restored.teacher().id, TeacherId::Sebas);
    }

    #[tokio::test]
    async fn signed_out_app_rejects_profile_changes() {
        let (mut app, _rx) = TutorApp::new(
            MockLiveTransport::new(),
            ProfileStore::new(MemoryStore::new()),
            Arc::new(MockSummarizer::new()),
        );
        assert!(app.user().is_none());
        assert!(matches!(
            app.update_profile(ProfileUpdate::default()),
            Err(AppError::NotSignedIn)
        ));
        assert!(matches!(
            app.sign_up("   ", EnglishLevel::A1, TeacherId::Sophia),
            Err(AppError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn messages_feed_pace_and_vocabulary_views() {
        let (mut app, _rx) = signed_in_app(MockLiveTransport::new(), Arc::new(MockSummarizer::new()));
        app.handle_event_at(TransportEvent::StateChanged(ConnectionState::Connected), at(0));
        let pace = LogMessage::builder(Role::Model, "Slow down a bit.")
            .with_pace(PaceSuggestion::Fast, "Take a breath between ideas.")
            .build();
        let vocab = LogMessage::builder(Role::Model, "New word")
            .with_vocabulary("ubiquitous", "found everywhere")
            .build();
        app.handle_event_at(TransportEvent::Message(pace), at(1));
        app.handle_event_at(TransportEvent::Message(vocab), at(2));
        app.handle_event_at(TransportEvent::Volume(1.7), at(2));

        assert_eq!(app.last_pace().unwrap().suggestion, PaceSuggestion::Fast);
        let words = app.vocabulary();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].term, "ubiquitous");
        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.volume(), 1.0);
    }
}
