//! Streak computation over sparse daily records
//!
//! The one piece of real domain logic in evergreen: given the set of days
//! on which a habit qualified, compute the current and longest
//! consecutive-day streaks, roll completion into windowed rates, and
//! detect milestone crossings. Everything here is a pure function of its
//! inputs; callers resolve "today" once and pass it down.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Streak lengths that trigger a one-time celebration when first crossed.
pub const MILESTONES: [u32; 7] = [3, 7, 14, 21, 30, 60, 90];

/// Derived streak state. Never persisted; recomputed on each load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// One day's logged activity for one habit, already fetched from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub completed_count: u32,
    pub note: Option<String>,
}

/// Windowed completion statistics.
///
/// `completion_rate` divides by days that have an entry at all, not by
/// calendar days in the window. Both counts are exposed so displays can
/// pick either denominator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub window_days: u32,
    pub logged_days: u32,
    pub qualifying_days: u32,
    pub completion_rate: f64,
}

/// Error type for streak computation
#[derive(Debug, PartialEq, Eq)]
pub enum StreakError {
    /// An entry is dated after the reference "today" (clock skew or bad
    /// input). The caller must validate before asking for a streak.
    FutureDate { date: NaiveDate, today: NaiveDate },
}

impl std::fmt::Display for StreakError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreakError::FutureDate { date, today } => {
                write!(f, "Entry dated {} is after today ({})", date, today)
            }
        }
    }
}

impl std::error::Error for StreakError {}

pub type Result<T> = std::result::Result<T, StreakError>;

// ============================================================================
// Day-Completion Predicate
// ============================================================================

/// Per-habit rule deciding whether a day's entry counts as completed.
///
/// Each habit carries its own rule; there is no shared threshold across
/// habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionRule {
    /// Any entry at all qualifies.
    Exists,
    /// A non-empty note qualifies.
    AnyNote,
    /// At least `required` per-day checkmarks done.
    MinCount { required: u32 },
}

impl CompletionRule {
    pub fn qualifies(&self, entry: &DayEntry) -> bool {
        match self {
            CompletionRule::Exists => true,
            CompletionRule::AnyNote => entry
                .note
                .as_deref()
                .map(|n| !n.trim().is_empty())
                .unwrap_or(false),
            CompletionRule::MinCount { required } => entry.completed_count >= *required,
        }
    }

    /// Storage name for the rule variant.
    pub fn name(&self) -> &'static str {
        match self {
            CompletionRule::Exists => "exists",
            CompletionRule::AnyNote => "any_note",
            CompletionRule::MinCount { .. } => "min_count",
        }
    }

    /// Reconstruct a rule from its storage name plus the habit's
    /// `required_count` column. Unknown names fall back to `Exists`.
    pub fn from_parts(name: &str, required: u32) -> Self {
        match name {
            "any_note" => CompletionRule::AnyNote,
            "min_count" => CompletionRule::MinCount { required },
            _ => CompletionRule::Exists,
        }
    }
}

// ============================================================================
// Streak Calculator
// ============================================================================

/// Compute current and longest streaks from qualifying dates.
///
/// `current_streak` walks backward from `today`, tolerating one missing
/// day at the start: a day not yet logged does not break the streak
/// until two consecutive days are missing. `longest_streak` is the
/// longest run anywhere in the set, independent of `today`.
///
/// Duplicate dates are silently collapsed. A date after `today` is a
/// precondition violation and fails fast.
pub fn compute_streaks<I>(dates: I, today: NaiveDate) -> Result<StreakState>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let set: BTreeSet<NaiveDate> = dates.into_iter().collect();

    if let Some(&latest) = set.iter().next_back() {
        if latest > today {
            return Err(StreakError::FutureDate {
                date: latest,
                today,
            });
        }
    }

    Ok(StreakState {
        current_streak: current_run(&set, today),
        longest_streak: longest_run(&set),
    })
}

fn current_run(set: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let latest = match set.iter().next_back() {
        Some(d) => *d,
        None => return 0,
    };

    // Grace period: the walk may begin on today or yesterday, nothing older.
    if (today - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 0u32;
    let mut expected = latest;
    for date in set.iter().rev() {
        if *date != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }
    streak
}

fn longest_run(set: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for date in set {
        run = match prev {
            Some(p) if (*date - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*date);
    }
    longest
}

// ============================================================================
// Aggregator
// ============================================================================

/// Dates on which the rule qualifies, for feeding into [`compute_streaks`].
pub fn qualifying_dates(entries: &[DayEntry], rule: &CompletionRule) -> Vec<NaiveDate> {
    entries
        .iter()
        .filter(|e| rule.qualifies(e))
        .map(|e| e.date)
        .collect()
}

/// Roll per-day completion into a rate over the trailing window ending
/// at `today` (inclusive). Days outside the window are ignored.
pub fn completion_window(
    entries: &[DayEntry],
    rule: &CompletionRule,
    today: NaiveDate,
    window_days: u32,
) -> WindowStats {
    let start = today - Duration::days(i64::from(window_days) - 1);

    let mut seen: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut qualifying = 0u32;
    for entry in entries {
        if entry.date < start || entry.date > today {
            continue;
        }
        if seen.insert(entry.date) && rule.qualifies(entry) {
            qualifying += 1;
        }
    }

    let logged = seen.len() as u32;
    let completion_rate = if logged == 0 {
        0.0
    } else {
        f64::from(qualifying) / f64::from(logged)
    };

    WindowStats {
        window_days,
        logged_days: logged,
        qualifying_days: qualifying,
        completion_rate,
    }
}

// ============================================================================
// Milestones
// ============================================================================

/// Thresholds newly crossed on the transition from `previous` to
/// `current`. Crossing means `previous < t <= current`, so a milestone
/// fires exactly once, at the moment of crossing, and never again on
/// later days above it.
pub fn crossed_milestones(previous: u32, current: u32) -> Vec<u32> {
    MILESTONES
        .iter()
        .copied()
        .filter(|&t| previous < t && t <= current)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn days_back(today: NaiveDate, offsets: &[i64]) -> Vec<NaiveDate> {
        offsets.iter().map(|o| today - Duration::days(*o)).collect()
    }

    // === Streak Calculator ===

    #[test]
    fn test_empty_set_is_zero() {
        let state = compute_streaks(vec![], d("2025-06-15")).unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 0);
    }

    #[test]
    fn test_three_day_run_with_gap() {
        // {D, D-1, D-2, D-5, D-6} -> current 3, longest 3
        let today = d("2025-06-15");
        let dates = days_back(today, &[0, 1, 2, 5, 6]);
        let state = compute_streaks(dates, today).unwrap();
        assert_eq!(state.current_streak, 3);
        assert_eq!(state.longest_streak, 3);
    }

    #[test]
    fn test_grace_period_covers_unlogged_today() {
        // {D-1} -> current 1 even though today has no entry yet
        let today = d("2025-06-15");
        let state = compute_streaks(days_back(today, &[1]), today).unwrap();
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
    }

    #[test]
    fn test_grace_period_is_one_day_only() {
        // {D-2, D-3, D-4} -> current 0: two consecutive missing days break it
        let today = d("2025-06-15");
        let state = compute_streaks(days_back(today, &[2, 3, 4]), today).unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 3);
    }

    #[test]
    fn test_single_date_today() {
        let today = d("2025-06-15");
        let state = compute_streaks(vec![today], today).unwrap();
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
    }

    #[test]
    fn test_single_old_date() {
        let today = d("2025-06-15");
        let state = compute_streaks(vec![d("2025-06-01")], today).unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 1);
    }

    #[test]
    fn test_longest_elsewhere_beats_current() {
        let today = d("2025-06-15");
        // current run of 2, older run of 5
        let dates = days_back(today, &[0, 1, 4, 5, 6, 7, 8]);
        let state = compute_streaks(dates, today).unwrap();
        assert_eq!(state.current_streak, 2);
        assert_eq!(state.longest_streak, 5);
    }

    #[test]
    fn test_duplicates_collapse() {
        let today = d("2025-06-15");
        let dates = vec![today, today, today - Duration::days(1)];
        let state = compute_streaks(dates, today).unwrap();
        assert_eq!(state.current_streak, 2);
        assert_eq!(state.longest_streak, 2);
    }

    #[test]
    fn test_future_date_fails_fast() {
        let today = d("2025-06-15");
        let err = compute_streaks(vec![d("2025-06-16")], today).unwrap_err();
        assert_eq!(
            err,
            StreakError::FutureDate {
                date: d("2025-06-16"),
                today,
            }
        );
    }

    #[test]
    fn test_non_contiguous_runs_do_not_merge() {
        let today = d("2025-06-15");
        let dates = days_back(today, &[0, 2, 4, 6]);
        let state = compute_streaks(dates, today).unwrap();
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
    }

    // === Day-Completion Predicate ===

    fn entry(date: NaiveDate, count: u32, note: Option<&str>) -> DayEntry {
        DayEntry {
            date,
            completed_count: count,
            note: note.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_exists_rule() {
        let e = entry(d("2025-06-15"), 0, None);
        assert!(CompletionRule::Exists.qualifies(&e));
    }

    #[test]
    fn test_any_note_rule() {
        let rule = CompletionRule::AnyNote;
        assert!(rule.qualifies(&entry(d("2025-06-15"), 0, Some("ran 5k"))));
        assert!(!rule.qualifies(&entry(d("2025-06-15"), 0, Some("   "))));
        assert!(!rule.qualifies(&entry(d("2025-06-15"), 0, None)));
    }

    #[test]
    fn test_min_count_rule() {
        let rule = CompletionRule::MinCount { required: 5 };
        assert!(rule.qualifies(&entry(d("2025-06-15"), 5, None)));
        assert!(rule.qualifies(&entry(d("2025-06-15"), 8, None)));
        assert!(!rule.qualifies(&entry(d("2025-06-15"), 4, None)));
    }

    #[test]
    fn test_rule_storage_round_trip() {
        assert_eq!(
            CompletionRule::from_parts("min_count", 5),
            CompletionRule::MinCount { required: 5 }
        );
        assert_eq!(CompletionRule::from_parts("any_note", 0), CompletionRule::AnyNote);
        assert_eq!(CompletionRule::from_parts("exists", 0), CompletionRule::Exists);
        // Unknown names degrade to the loosest rule rather than erroring
        assert_eq!(CompletionRule::from_parts("bogus", 3), CompletionRule::Exists);
    }

    // === Aggregator ===

    #[test]
    fn test_window_divides_by_logged_days() {
        let today = d("2025-06-15");
        let rule = CompletionRule::MinCount { required: 5 };
        // 3 logged days in window, 2 qualifying
        let entries = vec![
            entry(today, 8, None),
            entry(today - Duration::days(1), 5, None),
            entry(today - Duration::days(3), 2, None),
        ];
        let stats = completion_window(&entries, &rule, today, 7);
        assert_eq!(stats.logged_days, 3);
        assert_eq!(stats.qualifying_days, 2);
        assert!((stats.completion_rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_window_excludes_out_of_range_days() {
        let today = d("2025-06-15");
        let entries = vec![
            entry(today, 1, None),
            entry(today - Duration::days(7), 1, None),  // outside a 7-day window
            entry(today + Duration::days(1), 1, None),  // future, ignored
        ];
        let stats = completion_window(&entries, &CompletionRule::Exists, today, 7);
        assert_eq!(stats.logged_days, 1);
        assert_eq!(stats.qualifying_days, 1);
    }

    #[test]
    fn test_window_with_no_entries() {
        let today = d("2025-06-15");
        let stats = completion_window(&[], &CompletionRule::Exists, today, 30);
        assert_eq!(stats.logged_days, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_qualifying_dates_filters() {
        let today = d("2025-06-15");
        let rule = CompletionRule::MinCount { required: 3 };
        let entries = vec![
            entry(today, 4, None),
            entry(today - Duration::days(1), 1, None),
        ];
        assert_eq!(qualifying_dates(&entries, &rule), vec![today]);
    }

    // === Milestones ===

    #[test]
    fn test_milestone_fires_once_at_crossing() {
        // streak sequence [2, 3, 4]: the 3-day milestone fires at 2->3 only
        assert_eq!(crossed_milestones(2, 3), vec![3]);
        assert_eq!(crossed_milestones(3, 4), Vec::<u32>::new());
    }

    #[test]
    fn test_milestone_backfill_can_cross_several() {
        assert_eq!(crossed_milestones(2, 7), vec![3, 7]);
    }

    #[test]
    fn test_milestone_no_change_no_fire() {
        assert_eq!(crossed_milestones(7, 7), Vec::<u32>::new());
        assert_eq!(crossed_milestones(7, 0), Vec::<u32>::new());
    }
}
