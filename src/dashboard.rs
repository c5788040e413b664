//! Dashboard summaries and review reports
//!
//! Pulls each panel's slice of data, runs the streak calculator over it,
//! and assembles the whole-life overview the CLI, the report, and the
//! HTTP API all render from.

use crate::config::Config;
use crate::db::{Contact, Database, DbError, Habit, MilestoneEvent};
use crate::streak::{self, StreakError, StreakState, WindowStats};
use chrono::NaiveDate;
use std::fmt::Write;

/// One habit's derived state for display
#[derive(Debug, Clone, serde::Serialize)]
pub struct HabitSummary {
    pub habit: Habit,
    pub streaks: StreakState,
    pub windows: Vec<WindowStats>,
    pub logged_today: bool,
}

/// A contact whose last touch is older than their cadence
#[derive(Debug, Clone, serde::Serialize)]
pub struct DueContact {
    pub contact: Contact,
    pub last_interaction: Option<NaiveDate>,
    /// Days past the cadence; 0 for never-contacted
    pub days_overdue: i64,
}

/// The whole-life overview
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardSummary {
    pub generated_on: NaiveDate,
    pub habits: Vec<HabitSummary>,
    pub due_contacts: Vec<DueContact>,
    pub recent_milestones: Vec<MilestoneEvent>,
    pub pending_captures: usize,
}

/// Error type for dashboard assembly
#[derive(Debug)]
pub enum DashboardError {
    Db(DbError),
    Streak(StreakError),
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::Db(e) => write!(f, "{}", e),
            DashboardError::Streak(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<DbError> for DashboardError {
    fn from(e: DbError) -> Self {
        DashboardError::Db(e)
    }
}

impl From<StreakError> for DashboardError {
    fn from(e: StreakError) -> Self {
        DashboardError::Streak(e)
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Whether a contact is due, and by how many days.
///
/// Never-contacted counts as due immediately. Otherwise the contact is
/// due once `today - last` exceeds the cadence.
pub fn contact_overdue(
    last: Option<NaiveDate>,
    cadence_days: u32,
    today: NaiveDate,
) -> Option<i64> {
    match last {
        None => Some(0),
        Some(last) => {
            let days_since = (today - last).num_days();
            let overdue = days_since - i64::from(cadence_days);
            (overdue > 0).then_some(overdue)
        }
    }
}

/// Compute one habit's streaks and windowed completion rates.
pub fn habit_summary(
    db: &Database,
    habit: &Habit,
    today: NaiveDate,
    windows: &[u32],
) -> Result<HabitSummary> {
    let entries = db.load_day_entries(habit.id)?;
    let rule = habit.rule();

    let streaks = streak::compute_streaks(streak::qualifying_dates(&entries, &rule), today)?;
    let window_stats = windows
        .iter()
        .map(|&w| streak::completion_window(&entries, &rule, today, w))
        .collect();

    Ok(HabitSummary {
        habit: habit.clone(),
        streaks,
        windows: window_stats,
        logged_today: entries.iter().any(|e| e.date == today),
    })
}

/// Assemble the full dashboard.
pub fn build_dashboard(db: &Database, config: &Config, today: NaiveDate) -> Result<DashboardSummary> {
    let mut summaries = Vec::new();
    for habit in db.get_all_habits(false)? {
        summaries.push(habit_summary(db, &habit, today, &config.dashboard.windows)?);
    }

    let mut due = Vec::new();
    for contact in db.get_all_contacts()? {
        let cadence = contact
            .cadence_days
            .map(|d| d.max(0) as u32)
            .unwrap_or(config.contacts.default_cadence_days);
        let last = db.last_interaction(contact.id)?;
        if let Some(days_overdue) = contact_overdue(last, cadence, today) {
            due.push(DueContact {
                contact,
                last_interaction: last,
                days_overdue,
            });
        }
    }
    due.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));

    Ok(DashboardSummary {
        generated_on: today,
        habits: summaries,
        due_contacts: due,
        recent_milestones: db.recent_milestones(10)?,
        pending_captures: db.get_captures(true)?.len(),
    })
}

/// Percentage for display, rounded to whole percent.
pub fn percent(rate: f64) -> u32 {
    (rate * 100.0).round() as u32
}

/// Generate a markdown review report from the dashboard.
pub fn generate_report(summary: &DashboardSummary) -> String {
    let mut out = String::new();

    writeln!(out, "# Evergreen Review — {}", summary.generated_on).unwrap();
    writeln!(out).unwrap();

    writeln!(out, "## Habits").unwrap();
    writeln!(out).unwrap();
    if summary.habits.is_empty() {
        writeln!(out, "No habits yet. `evergreen habit add <name>` to start.").unwrap();
    }
    for s in &summary.habits {
        let mut line = format!(
            "- **{}** — streak {} (best {})",
            s.habit.name, s.streaks.current_streak, s.streaks.longest_streak
        );
        for w in &s.windows {
            write!(
                line,
                ", {}d {}% ({}/{} logged)",
                w.window_days,
                percent(w.completion_rate),
                w.qualifying_days,
                w.logged_days
            )
            .unwrap();
        }
        if !s.logged_today {
            line.push_str(" — not logged today");
        }
        writeln!(out, "{}", line).unwrap();
    }
    writeln!(out).unwrap();

    if !summary.recent_milestones.is_empty() {
        writeln!(out, "## Milestones").unwrap();
        writeln!(out).unwrap();
        for m in &summary.recent_milestones {
            let name = summary
                .habits
                .iter()
                .find(|s| s.habit.id == m.habit_id)
                .map(|s| s.habit.name.as_str())
                .unwrap_or("(archived habit)");
            writeln!(out, "- {}-day streak on {} ({})", m.threshold, name, m.reached_on).unwrap();
        }
        writeln!(out).unwrap();
    }

    writeln!(out, "## People").unwrap();
    writeln!(out).unwrap();
    if summary.due_contacts.is_empty() {
        writeln!(out, "All caught up.").unwrap();
    }
    for d in &summary.due_contacts {
        match d.last_interaction {
            Some(last) => writeln!(
                out,
                "- {} — {} days past cadence (last touch {})",
                d.contact.name, d.days_overdue, last
            )
            .unwrap(),
            None => writeln!(out, "- {} — never contacted", d.contact.name).unwrap(),
        }
    }
    writeln!(out).unwrap();

    writeln!(out, "## Inbox").unwrap();
    writeln!(out).unwrap();
    match summary.pending_captures {
        0 => writeln!(out, "Inbox zero.").unwrap(),
        n => writeln!(out, "{} capture(s) awaiting classification.", n).unwrap(),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::CompletionRule;
    use chrono::Duration;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open_at(dir.path().join("test.db")).expect("open db");
        (dir, db)
    }

    // === contact_overdue ===

    #[test]
    fn test_never_contacted_is_due() {
        assert_eq!(contact_overdue(None, 30, d("2025-06-15")), Some(0));
    }

    #[test]
    fn test_within_cadence_not_due() {
        let today = d("2025-06-15");
        assert_eq!(contact_overdue(Some(today - Duration::days(30)), 30, today), None);
        assert_eq!(contact_overdue(Some(today), 30, today), None);
    }

    #[test]
    fn test_past_cadence_is_due() {
        let today = d("2025-06-15");
        assert_eq!(contact_overdue(Some(today - Duration::days(42)), 30, today), Some(12));
    }

    // === habit_summary / build_dashboard ===

    #[test]
    fn test_habit_summary_computes_streaks() {
        let (_dir, db) = test_db();
        let today = d("2025-06-15");
        let id = db
            .create_habit("read", None, &CompletionRule::Exists, 0, None)
            .unwrap();
        for offset in [0, 1, 2, 5] {
            db.upsert_entry(id, today - Duration::days(offset), 1, None)
                .unwrap();
        }

        let habit = db.find_habit("read").unwrap();
        let summary = habit_summary(&db, &habit, today, &[7]).unwrap();

        assert_eq!(summary.streaks.current_streak, 3);
        assert_eq!(summary.streaks.longest_streak, 3);
        assert!(summary.logged_today);
        assert_eq!(summary.windows.len(), 1);
        assert_eq!(summary.windows[0].logged_days, 4);
        assert_eq!(summary.windows[0].qualifying_days, 4);
    }

    #[test]
    fn test_summary_respects_predicate() {
        let (_dir, db) = test_db();
        let today = d("2025-06-15");
        let id = db
            .create_habit(
                "actions",
                None,
                &CompletionRule::MinCount { required: 5 },
                8,
                None,
            )
            .unwrap();
        db.upsert_entry(id, today, 6, None).unwrap();
        db.upsert_entry(id, today - Duration::days(1), 2, None).unwrap();

        let habit = db.find_habit("actions").unwrap();
        let summary = habit_summary(&db, &habit, today, &[7]).unwrap();

        // Yesterday's 2/8 does not qualify, so the streak is just today
        assert_eq!(summary.streaks.current_streak, 1);
        assert_eq!(summary.windows[0].logged_days, 2);
        assert_eq!(summary.windows[0].qualifying_days, 1);
    }

    #[test]
    fn test_build_dashboard_collects_panels() {
        let (_dir, db) = test_db();
        let today = d("2025-06-15");
        let config = Config::default();

        let habit = db
            .create_habit("read", None, &CompletionRule::Exists, 0, None)
            .unwrap();
        db.upsert_entry(habit, today, 1, None).unwrap();
        db.record_milestone(habit, 3, today).unwrap();

        db.create_contact("Ada", None, Some(7), None).unwrap();
        db.create_capture("call mom", "hash-1").unwrap();

        let dash = build_dashboard(&db, &config, today).unwrap();
        assert_eq!(dash.habits.len(), 1);
        assert_eq!(dash.due_contacts.len(), 1); // never contacted
        assert_eq!(dash.recent_milestones.len(), 1);
        assert_eq!(dash.pending_captures, 1);
    }

    #[test]
    fn test_report_sections() {
        let (_dir, db) = test_db();
        let today = d("2025-06-15");
        let config = Config::default();

        let habit = db
            .create_habit("read", None, &CompletionRule::Exists, 0, None)
            .unwrap();
        db.upsert_entry(habit, today, 1, None).unwrap();

        let dash = build_dashboard(&db, &config, today).unwrap();
        let report = generate_report(&dash);

        assert!(report.contains("# Evergreen Review — 2025-06-15"));
        assert!(report.contains("## Habits"));
        assert!(report.contains("**read**"));
        assert!(report.contains("## People"));
        assert!(report.contains("## Inbox"));
        assert!(report.contains("Inbox zero."));
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(2.0 / 3.0), 67);
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(1.0), 100);
    }
}
