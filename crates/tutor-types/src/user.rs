use crate::level::EnglishLevel;
use crate::session::{SessionMode, SessionSummary};
use crate::teacher::TeacherId;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Personalized daily practice targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DailyGoals {
    pub minutes: u32,
    pub vocab: u32,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            minutes: 15,
            vocab: 5,
        }
    }
}

/// Experience counters, one per session mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModeXp {
    pub conversation: u32,
    pub pronunciation: u32,
    pub writing: u32,
    pub roleplay: u32,
}

impl ModeXp {
    pub fn get(&self, mode: SessionMode) -> u32 {
        match mode {
            SessionMode::Conversation => self.conversation,
            SessionMode::Pronunciation => self.pronunciation,
            SessionMode::Writing => self.writing,
            SessionMode::Roleplay => self.roleplay,
        }
    }

    pub fn add(&mut self, mode: SessionMode, xp: u32) {
        let counter = match mode {
            SessionMode::Conversation => &mut self.conversation,
            SessionMode::Pronunciation => &mut self.pronunciation,
            SessionMode::Writing => &mut self.writing,
            SessionMode::Roleplay => &mut self.roleplay,
        };
        *counter = counter.saturating_add(xp);
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub streak: u32,
    /// Stored as an ISO date; an empty string means the user was never active.
    #[serde(default, with = "iso_date_or_empty")]
    pub last_active_date: Option<NaiveDate>,
    pub total_minutes: u32,
    #[serde(default)]
    pub daily_minutes: u32,
    #[serde(rename = "modeXP", default)]
    pub mode_xp: ModeXp,
    /// Phoneme label -> accumulated XP.
    #[serde(default)]
    pub phoneme_mastery: BTreeMap<String, u32>,
    /// Most recent first.
    #[serde(default)]
    pub session_history: Vec<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub stats: UserStats,
    pub proficiency_level: EnglishLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_teacher_id: Option<TeacherId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_enabled: Option<bool>,
    /// `HH:mm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub daily_goals: DailyGoals,
}

impl User {
    /// A fresh profile with default stats and goals.
    pub fn new(
        name: &str,
        level: EnglishLevel,
        teacher: TeacherId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            avatar: format!("{AVATAR_BASE_URL}?seed={name}"),
            created_at,
            stats: UserStats::default(),
            proficiency_level: level,
            preferred_teacher_id: Some(teacher),
            reminder_enabled: None,
            reminder_time: None,
            daily_goals: DailyGoals::default(),
        }
    }

    pub fn teacher(&self) -> TeacherId {
        self.preferred_teacher_id.unwrap_or_default()
    }
}

mod iso_date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        // Full ISO timestamps are accepted too; only the date part is kept.
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_gets_default_goals_and_empty_stats() {
        let user = User::new("Ana", EnglishLevel::A2, TeacherId::Sebas, Utc::now());
        assert_eq!(user.daily_goals, DailyGoals { minutes: 15, vocab: 5 });
        assert_eq!(user.stats, UserStats::default());
        assert_eq!(user.teacher(), TeacherId::Sebas);
        assert!(user.avatar.ends_with("seed=Ana"));
    }

    #[test]
    fn empty_last_active_date_round_trips_as_empty_string() {
        let stats = UserStats::default();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["lastActiveDate"], "");
        assert!(value.get("modeXP").is_some());

        let back: UserStats = serde_json::from_value(value).unwrap();
        assert_eq!(back.last_active_date, None);
    }

    #[test]
    fn last_active_date_accepts_full_timestamps() {
        let json = r#"{
            "streak": 3,
            "lastActiveDate": "2025-02-27T08:15:00.000Z",
            "totalMinutes": 40,
            "modeXP": { "conversation": 1, "pronunciation": 2, "writing": 3, "roleplay": 4 }
        }"#;
        let stats: UserStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.last_active_date, NaiveDate::from_ymd_opt(2025, 2, 27));
        assert_eq!(stats.mode_xp.get(SessionMode::Writing), 3);
        assert!(stats.session_history.is_empty());
    }

    #[test]
    fn mode_xp_add_saturates() {
        let mut xp = ModeXp::default();
        xp.add(SessionMode::Roleplay, u32::MAX);
        xp.add(SessionMode::Roleplay, 5);
        assert_eq!(xp.roleplay, u32::MAX);
        assert_eq!(xp.conversation, 0);
    }
}
