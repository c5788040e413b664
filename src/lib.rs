//! Evergreen - Local-first life operating system
//!
//! Track habits and streaks, capture everything, keep up with people.
//! One SQLite database, one binary, your year queryable.
//!
//! # Overview
//!
//! Evergreen keeps a per-directory database (like git keeps `.git`) of
//! daily habit entries, free-form captures, contacts, and yearly
//! challenge goals. Streaks are never stored - they are recomputed from
//! the entry dates on every load, with a one-day grace period for "not
//! logged yet today".
//!
//! # Pieces
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `streak` | Pure streak/milestone/completion-rate computation |
//! | `db` | SQLite storage for habits, entries, goals, contacts, captures |
//! | `classify` | Rule-based capture classification |
//! | `dashboard` | Whole-life summaries and review reports |
//! | `serve` | Local HTTP dashboard |
//! | `config` | `.evergreen/config.toml` |
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use evergreen::db::Database;
//! use evergreen::streak::{compute_streaks, qualifying_dates, CompletionRule};
//!
//! let db = Database::new("evergreen.db").unwrap();
//!
//! // Add a habit and log today
//! let habit = db.create_habit("read", None, &CompletionRule::Exists, 0, None).unwrap();
//! let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
//! db.upsert_entry(habit, today, 1, Some("chapter 3")).unwrap();
//!
//! // Streaks are derived, never stored
//! let entries = db.load_day_entries(habit).unwrap();
//! let state = compute_streaks(
//!     qualifying_dates(&entries, &CompletionRule::Exists),
//!     today,
//! ).unwrap();
//! println!("current streak: {}", state.current_streak);
//! ```

pub mod classify;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod init;
pub mod schema;
pub mod serve;
pub mod streak;

pub use config::Config;
pub use dashboard::{DashboardSummary, DueContact, HabitSummary};
pub use db::{
    Capture, Contact, Database, DbError, Goal, Habit, HabitEntry, Interaction, LifeSchema,
    MilestoneEvent, CURRENT_SCHEMA,
};
pub use streak::{
    compute_streaks, completion_window, crossed_milestones, qualifying_dates, CompletionRule,
    DayEntry, StreakState, WindowStats, MILESTONES,
};
