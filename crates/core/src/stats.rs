use chrono::NaiveDate;
use fluent_tutor_types::{SessionSummary, User, UserStats};

/// Number of session summaries kept per user.
pub const SESSION_HISTORY_LIMIT: usize = 50;

/// Prepends `summary` to the history and drops the oldest entries past the
/// limit.
pub fn push_summary(stats: &mut UserStats, summary: SessionSummary) {
    stats.session_history.insert(0, summary);
    stats.session_history.truncate(SESSION_HISTORY_LIMIT);
}

/// Merges a finished session into the stats.
///
/// Minutes and the mode's XP grow by the session duration. The streak counts
/// consecutive active days: same day keeps it, the next day extends it, any
/// gap restarts it at one. Daily minutes restart on a new day.
pub fn record_session(stats: &mut UserStats, summary: SessionSummary, today: NaiveDate) {
    let minutes = summary.duration_minutes();
    let mode = summary.mode();

    match stats.last_active_date {
        Some(last) if last == today => {
            stats.daily_minutes = stats.daily_minutes.saturating_add(minutes);
        }
        Some(last) if last.succ_opt() == Some(today) => {
            stats.streak = stats.streak.saturating_add(1);
            stats.daily_minutes = minutes;
        }
        _ => {
            stats.streak = 1;
            stats.daily_minutes = minutes;
        }
    }
    stats.last_active_date = Some(today);
    stats.total_minutes = stats.total_minutes.saturating_add(minutes);
    stats.mode_xp.add(mode, minutes);
    push_summary(stats, summary);
}

/// Adds practice XP to a phoneme label, e.g. "TH (Voiced)".
pub fn award_phoneme_xp(stats: &mut UserStats, label: &str, xp: u32) {
    let entry = stats.phoneme_mastery.entry(label.to_string()).or_insert(0);
    *entry = entry.saturating_add(xp);
}

/// Today's practice against the user's daily minutes goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub minutes: u32,
    pub goal: u32,
}

impl GoalProgress {
    pub fn is_met(&self) -> bool {
        self.minutes >= self.goal
    }

    /// Percentage of the goal reached, capped at 100.
    pub fn percent(&self) -> u32 {
        if self.goal == 0 {
            return 100;
        }
        (self.minutes.saturating_mul(100) / self.goal).min(100)
    }
}

pub fn daily_goal_progress(user: &User, today: NaiveDate) -> GoalProgress {
    let minutes = if user.stats.last_active_date == Some(today) {
        user.stats.daily_minutes
    } else {
        0
    };
    GoalProgress {
        minutes,
        goal: user.daily_goals.minutes,
    }
}
