//! SQLite database with Diesel ORM
//!
//! Stores habits, daily entries, goals, contacts, captures, and milestone
//! events. Schema is created on open with raw SQL.

use crate::schema::*;
use crate::streak::{CompletionRule, DayEntry};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use uuid::Uuid;

/// This is the standard way of converting a calendar date to a column
/// value in evergreen.
pub fn date_to_column(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored `YYYY-MM-DD` column value back into a date.
pub fn column_to_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DbError::Validation(format!("Malformed date in database: '{}'", value)))
}

/// Walk up directory tree to find .evergreen folder (like git finds .git)
/// Can be overridden with EVERGREEN_DB_PATH env var
fn get_db_path() -> std::path::PathBuf {
    // Check env var first - always takes priority
    if let Ok(path) = std::env::var("EVERGREEN_DB_PATH") {
        return std::path::PathBuf::from(path);
    }

    // Walk up directory tree to find .evergreen folder
    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let evergreen_dir = dir.join(".evergreen");
            if evergreen_dir.exists() && evergreen_dir.is_dir() {
                return evergreen_dir.join("evergreen.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break, // Reached filesystem root
            }
        }
    }

    // No .evergreen found - default to current directory
    // (evergreen init will create it here)
    std::path::PathBuf::from(".evergreen/evergreen.db")
}

/// Current schema version for evergreen
pub const CURRENT_SCHEMA: LifeSchema = LifeSchema {
    major: 1,
    minor: 0,
    patch: 0,
    name: "life-log",
    features: &[
        "habits",
        "habit_entries",
        "goals",
        "contacts",
        "interactions",
        "captures",
        "milestone_events",
    ],
};

/// Describes the version and capabilities of the schema
#[derive(Debug, Clone)]
pub struct LifeSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl LifeSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    pub fn is_compatible_with(&self, other: &LifeSchema) -> bool {
        self.major == other.major
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&feature)
    }
}

impl std::fmt::Display for LifeSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable schema version
#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
pub struct NewSchemaVersion<'a> {
    pub version: &'a str,
    pub name: &'a str,
    pub features: &'a str,
    pub introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schema_versions)]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

/// Insertable habit
#[derive(Insertable)]
#[diesel(table_name = habits)]
pub struct NewHabit<'a> {
    pub change_id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub predicate: &'a str,
    pub required_count: i32,
    pub target_count: i32,
    pub goal_id: Option<i32>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
    pub archived_at: Option<&'a str>,
}

/// Queryable habit
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = habits)]
pub struct Habit {
    pub id: i32,
    pub change_id: String,
    pub name: String,
    pub description: Option<String>,
    pub predicate: String,
    pub required_count: i32,
    pub target_count: i32,
    pub goal_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub archived_at: Option<String>,
}

impl Habit {
    /// The habit's day-completion rule, reconstructed from its columns.
    pub fn rule(&self) -> CompletionRule {
        CompletionRule::from_parts(&self.predicate, self.required_count.max(0) as u32)
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Insertable daily entry
#[derive(Insertable)]
#[diesel(table_name = habit_entries)]
pub struct NewHabitEntry<'a> {
    pub habit_id: i32,
    pub entry_date: &'a str,
    pub completed_count: i32,
    pub note: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Queryable daily entry
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = habit_entries)]
pub struct HabitEntry {
    pub id: i32,
    pub habit_id: i32,
    pub entry_date: String,
    pub completed_count: i32,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl HabitEntry {
    /// Convert the stored row into the in-memory form the streak
    /// calculator consumes. Fails on a malformed stored date.
    pub fn to_day_entry(&self) -> Result<DayEntry> {
        Ok(DayEntry {
            date: column_to_date(&self.entry_date)?,
            completed_count: self.completed_count.max(0) as u32,
            note: self.note.clone(),
        })
    }
}

/// Insertable goal
#[derive(Insertable)]
#[diesel(table_name = goals)]
pub struct NewGoal<'a> {
    pub change_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub year: i32,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Queryable goal
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = goals)]
pub struct Goal {
    pub id: i32,
    pub change_id: String,
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Insertable contact
#[derive(Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact<'a> {
    pub change_id: &'a str,
    pub name: &'a str,
    pub circle: Option<&'a str>,
    pub cadence_days: Option<i32>,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Queryable contact
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = contacts)]
pub struct Contact {
    pub id: i32,
    pub change_id: String,
    pub name: String,
    pub circle: Option<String>,
    pub cadence_days: Option<i32>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insertable interaction
#[derive(Insertable)]
#[diesel(table_name = interactions)]
pub struct NewInteraction<'a> {
    pub contact_id: i32,
    pub occurred_on: &'a str,
    pub channel: Option<&'a str>,
    pub note: Option<&'a str>,
    pub created_at: &'a str,
}

/// Queryable interaction
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = interactions)]
pub struct Interaction {
    pub id: i32,
    pub contact_id: i32,
    pub occurred_on: String,
    pub channel: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

/// Insertable capture
#[derive(Insertable)]
#[diesel(table_name = captures)]
pub struct NewCapture<'a> {
    pub change_id: &'a str,
    pub content: &'a str,
    pub content_hash: &'a str,
    pub category: Option<&'a str>,
    pub classified_at: Option<&'a str>,
    pub captured_at: &'a str,
}

/// Queryable capture
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = captures)]
pub struct Capture {
    pub id: i32,
    pub change_id: String,
    pub content: String,
    pub content_hash: String,
    pub category: Option<String>,
    pub classified_at: Option<String>,
    pub captured_at: String,
}

/// Insertable milestone event
#[derive(Insertable)]
#[diesel(table_name = milestone_events)]
pub struct NewMilestoneEvent<'a> {
    pub habit_id: i32,
    pub threshold: i32,
    pub reached_on: &'a str,
    pub created_at: &'a str,
}

/// Queryable milestone event
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = milestone_events)]
pub struct MilestoneEvent {
    pub id: i32,
    pub habit_id: i32,
    pub threshold: i32,
    pub reached_on: String,
    pub created_at: String,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug)]
pub enum DbError {
    Connection(String),
    Query(diesel::result::Error),
    Pool(diesel::r2d2::Error),
    Validation(String),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Connection(msg) => write!(f, "Connection error: {}", msg),
            DbError::Query(e) => write!(f, "Query error: {}", e),
            DbError::Pool(e) => write!(f, "Pool error: {}", e),
            DbError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DbError {}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        DbError::Query(e)
    }
}

impl From<diesel::r2d2::Error> for DbError {
    fn from(e: diesel::r2d2::Error) -> Self {
        DbError::Pool(e)
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl Database {
    /// Get the database path that will be used
    pub fn db_path() -> std::path::PathBuf {
        get_db_path()
    }

    /// Create a new database at a custom path
    pub fn new(path: &str) -> Result<Self> {
        Self::open_at(path)
    }

    /// Open database at default path (respects EVERGREEN_DB_PATH env var)
    pub fn open() -> Result<Self> {
        let path = get_db_path();
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        Self::open_at(&path)
    }

    /// Open database at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        // Run raw SQL to create tables if they don't exist
        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                change_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                year INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS habits (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                change_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                predicate TEXT NOT NULL DEFAULT 'exists',
                required_count INTEGER NOT NULL DEFAULT 0,
                target_count INTEGER NOT NULL DEFAULT 0,
                goal_id INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                archived_at TEXT,
                FOREIGN KEY (goal_id) REFERENCES goals(id)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS habit_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                habit_id INTEGER NOT NULL,
                entry_date TEXT NOT NULL,
                completed_count INTEGER NOT NULL DEFAULT 0,
                note TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (habit_id) REFERENCES habits(id),
                UNIQUE(habit_id, entry_date)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                change_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                circle TEXT,
                cadence_days INTEGER,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                contact_id INTEGER NOT NULL,
                occurred_on TEXT NOT NULL,
                channel TEXT,
                note TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (contact_id) REFERENCES contacts(id)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS captures (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                change_id TEXT NOT NULL UNIQUE,
                content TEXT NOT NULL,
                content_hash TEXT NOT NULL UNIQUE,
                category TEXT,
                classified_at TEXT,
                captured_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS milestone_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                habit_id INTEGER NOT NULL,
                threshold INTEGER NOT NULL,
                reached_on TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (habit_id) REFERENCES habits(id),
                UNIQUE(habit_id, threshold, reached_on)
            )
        "#).execute(&mut conn)?;

        // Create indexes
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_entries_habit ON habit_entries(habit_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_entries_date ON habit_entries(entry_date)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_interactions_contact ON interactions(contact_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_interactions_date ON interactions(occurred_on)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_captures_category ON captures(category)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_milestones_habit ON milestone_events(habit_id)").execute(&mut conn)?;

        // Register current schema
        self.register_schema(&CURRENT_SCHEMA)?;
        Ok(())
    }

    fn register_schema(&self, schema: &LifeSchema) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let features_json = serde_json::to_string(&schema.features).unwrap_or_default();

        let new_schema = NewSchemaVersion {
            version: &schema.version_string(),
            name: schema.name,
            features: &features_json,
            introduced_at: &now,
        };

        diesel::insert_or_ignore_into(schema_versions::table)
            .values(&new_schema)
            .execute(&mut conn)?;

        Ok(())
    }

    fn last_insert_id(conn: &mut DbConn) -> Result<i32> {
        let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
            "last_insert_rowid()",
        ))
        .first(conn)?;
        Ok(id)
    }

    // ========================================================================
    // Habit Operations
    // ========================================================================

    /// Create a new habit with its day-completion rule
    pub fn create_habit(
        &self,
        name: &str,
        description: Option<&str>,
        rule: &CompletionRule,
        target_count: u32,
        goal_id: Option<i32>,
    ) -> Result<i32> {
        if name.trim().is_empty() {
            return Err(DbError::Validation("Habit name cannot be empty".to_string()));
        }
        if let Some(gid) = goal_id {
            // FK is not enforced without a pragma, validate explicitly
            self.get_goal(gid)?;
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let change_id = Uuid::new_v4().to_string();
        let required = match rule {
            CompletionRule::MinCount { required } => *required as i32,
            _ => 0,
        };

        let new_habit = NewHabit {
            change_id: &change_id,
            name,
            description,
            predicate: rule.name(),
            required_count: required,
            target_count: target_count as i32,
            goal_id,
            created_at: &now,
            updated_at: &now,
            archived_at: None,
        };

        diesel::insert_into(habits::table)
            .values(&new_habit)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => DbError::Validation(format!("Habit '{}' already exists", name)),
                other => DbError::Query(other),
            })?;

        Self::last_insert_id(&mut conn)
    }

    /// Look up a habit by numeric id or by name.
    pub fn find_habit(&self, selector: &str) -> Result<Habit> {
        let mut conn = self.get_conn()?;

        let habit = if let Ok(id) = selector.parse::<i32>() {
            habits::table
                .filter(habits::id.eq(id))
                .first::<Habit>(&mut conn)
                .optional()?
        } else {
            habits::table
                .filter(habits::name.eq(selector))
                .first::<Habit>(&mut conn)
                .optional()?
        };

        habit.ok_or_else(|| {
            DbError::Validation(format!(
                "Habit '{}' not found. Run 'evergreen habit list' to see habits.",
                selector
            ))
        })
    }

    /// Get all habits, active first
    pub fn get_all_habits(&self, include_archived: bool) -> Result<Vec<Habit>> {
        let mut conn = self.get_conn()?;
        let mut query = habits::table.order(habits::created_at.asc()).into_boxed();
        if !include_archived {
            query = query.filter(habits::archived_at.is_null());
        }
        Ok(query.load::<Habit>(&mut conn)?)
    }

    /// Archive a habit (entries are kept)
    pub fn archive_habit(&self, habit_id: i32) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let updated = diesel::update(habits::table.filter(habits::id.eq(habit_id)))
            .set((
                habits::archived_at.eq(Some(&now)),
                habits::updated_at.eq(&now),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DbError::Validation(format!("Habit {} not found", habit_id)));
        }
        Ok(())
    }

    // ========================================================================
    // Daily Entry Operations
    // ========================================================================

    /// Save a day's entry for a habit. Creates the row on the first save
    /// of the day and updates it in place on later saves - at most one
    /// entry per (habit, date).
    ///
    /// Returns the entry id and whether it was newly created.
    pub fn upsert_entry(
        &self,
        habit_id: i32,
        date: NaiveDate,
        completed_count: u32,
        note: Option<&str>,
    ) -> Result<(i32, bool)> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let date_col = date_to_column(date);

        let existing = habit_entries::table
            .filter(habit_entries::habit_id.eq(habit_id))
            .filter(habit_entries::entry_date.eq(&date_col))
            .first::<HabitEntry>(&mut conn)
            .optional()?;

        if let Some(entry) = existing {
            diesel::update(habit_entries::table.filter(habit_entries::id.eq(entry.id)))
                .set((
                    habit_entries::completed_count.eq(completed_count as i32),
                    habit_entries::note.eq(note),
                    habit_entries::updated_at.eq(&now),
                ))
                .execute(&mut conn)?;
            return Ok((entry.id, false));
        }

        let new_entry = NewHabitEntry {
            habit_id,
            entry_date: &date_col,
            completed_count: completed_count as i32,
            note,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(habit_entries::table)
            .values(&new_entry)
            .execute(&mut conn)?;

        Ok((Self::last_insert_id(&mut conn)?, true))
    }

    /// Delete a day's entry. Entries are only ever removed by explicit
    /// user action.
    pub fn delete_entry(&self, habit_id: i32, date: NaiveDate) -> Result<bool> {
        let mut conn = self.get_conn()?;
        let deleted = diesel::delete(
            habit_entries::table
                .filter(habit_entries::habit_id.eq(habit_id))
                .filter(habit_entries::entry_date.eq(date_to_column(date))),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    /// All entries for a habit, oldest first
    pub fn get_entries(&self, habit_id: i32) -> Result<Vec<HabitEntry>> {
        let mut conn = self.get_conn()?;
        Ok(habit_entries::table
            .filter(habit_entries::habit_id.eq(habit_id))
            .order(habit_entries::entry_date.asc())
            .load::<HabitEntry>(&mut conn)?)
    }

    /// Entries for a habit converted into the form the streak calculator
    /// consumes. Fails fast on a malformed stored date.
    pub fn load_day_entries(&self, habit_id: i32) -> Result<Vec<DayEntry>> {
        self.get_entries(habit_id)?
            .iter()
            .map(HabitEntry::to_day_entry)
            .collect()
    }

    // ========================================================================
    // Goal Operations
    // ========================================================================

    /// Create a yearly challenge goal
    pub fn create_goal(&self, title: &str, description: Option<&str>, year: i32) -> Result<i32> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let change_id = Uuid::new_v4().to_string();

        let new_goal = NewGoal {
            change_id: &change_id,
            title,
            description,
            year,
            status: "active",
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(goals::table)
            .values(&new_goal)
            .execute(&mut conn)?;

        Self::last_insert_id(&mut conn)
    }

    pub fn get_goal(&self, goal_id: i32) -> Result<Goal> {
        let mut conn = self.get_conn()?;
        goals::table
            .filter(goals::id.eq(goal_id))
            .first::<Goal>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::Validation(format!("Goal {} not found", goal_id)))
    }

    pub fn get_all_goals(&self) -> Result<Vec<Goal>> {
        let mut conn = self.get_conn()?;
        Ok(goals::table
            .order((goals::year.desc(), goals::created_at.asc()))
            .load::<Goal>(&mut conn)?)
    }

    /// Update goal status (active / completed / abandoned)
    pub fn update_goal_status(&self, goal_id: i32, status: &str) -> Result<()> {
        const VALID: [&str; 3] = ["active", "completed", "abandoned"];
        if !VALID.contains(&status) {
            return Err(DbError::Validation(format!(
                "Invalid goal status '{}'. Expected one of: {}",
                status,
                VALID.join(", ")
            )));
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let updated = diesel::update(goals::table.filter(goals::id.eq(goal_id)))
            .set((goals::status.eq(status), goals::updated_at.eq(&now)))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DbError::Validation(format!("Goal {} not found", goal_id)));
        }
        Ok(())
    }

    // ========================================================================
    // Contact Operations
    // ========================================================================

    /// Create a contact
    pub fn create_contact(
        &self,
        name: &str,
        circle: Option<&str>,
        cadence_days: Option<u32>,
        notes: Option<&str>,
    ) -> Result<i32> {
        if name.trim().is_empty() {
            return Err(DbError::Validation("Contact name cannot be empty".to_string()));
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let change_id = Uuid::new_v4().to_string();

        let new_contact = NewContact {
            change_id: &change_id,
            name,
            circle,
            cadence_days: cadence_days.map(|d| d as i32),
            notes,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(contacts::table)
            .values(&new_contact)
            .execute(&mut conn)?;

        Self::last_insert_id(&mut conn)
    }

    /// Look up a contact by numeric id or by name.
    pub fn find_contact(&self, selector: &str) -> Result<Contact> {
        let mut conn = self.get_conn()?;

        let contact = if let Ok(id) = selector.parse::<i32>() {
            contacts::table
                .filter(contacts::id.eq(id))
                .first::<Contact>(&mut conn)
                .optional()?
        } else {
            contacts::table
                .filter(contacts::name.eq(selector))
                .first::<Contact>(&mut conn)
                .optional()?
        };

        contact.ok_or_else(|| {
            DbError::Validation(format!(
                "Contact '{}' not found. Run 'evergreen contact list' to see contacts.",
                selector
            ))
        })
    }

    pub fn get_all_contacts(&self) -> Result<Vec<Contact>> {
        let mut conn = self.get_conn()?;
        Ok(contacts::table
            .order(contacts::name.asc())
            .load::<Contact>(&mut conn)?)
    }

    /// Record an interaction with a contact
    pub fn log_interaction(
        &self,
        contact_id: i32,
        occurred_on: NaiveDate,
        channel: Option<&str>,
        note: Option<&str>,
    ) -> Result<i32> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let new_interaction = NewInteraction {
            contact_id,
            occurred_on: &date_to_column(occurred_on),
            channel,
            note,
            created_at: &now,
        };

        diesel::insert_into(interactions::table)
            .values(&new_interaction)
            .execute(&mut conn)?;

        Self::last_insert_id(&mut conn)
    }

    /// Most recent interaction date per contact, if any
    pub fn last_interaction(&self, contact_id: i32) -> Result<Option<NaiveDate>> {
        let mut conn = self.get_conn()?;
        let latest: Option<String> = interactions::table
            .filter(interactions::contact_id.eq(contact_id))
            .select(diesel::dsl::max(interactions::occurred_on))
            .first(&mut conn)?;

        latest.map(|s| column_to_date(&s)).transpose()
    }

    /// Recent interactions for a contact, newest first
    pub fn get_interactions(&self, contact_id: i32, limit: i64) -> Result<Vec<Interaction>> {
        let mut conn = self.get_conn()?;
        Ok(interactions::table
            .filter(interactions::contact_id.eq(contact_id))
            .order(interactions::occurred_on.desc())
            .limit(limit)
            .load::<Interaction>(&mut conn)?)
    }

    // ========================================================================
    // Capture Operations
    // ========================================================================

    /// Capture a free-form note into the inbox. The content hash dedups
    /// repeated captures of the same text.
    pub fn create_capture(&self, content: &str, content_hash: &str) -> Result<i32> {
        if content.trim().is_empty() {
            return Err(DbError::Validation("Nothing to capture".to_string()));
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let change_id = Uuid::new_v4().to_string();

        let new_capture = NewCapture {
            change_id: &change_id,
            content,
            content_hash,
            category: None,
            classified_at: None,
            captured_at: &now,
        };

        diesel::insert_into(captures::table)
            .values(&new_capture)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => DbError::Validation("Already captured (identical content)".to_string()),
                other => DbError::Query(other),
            })?;

        Self::last_insert_id(&mut conn)
    }

    /// All captures, newest first; optionally only unclassified ones
    pub fn get_captures(&self, pending_only: bool) -> Result<Vec<Capture>> {
        let mut conn = self.get_conn()?;
        let mut query = captures::table
            .order(captures::captured_at.desc())
            .into_boxed();
        if pending_only {
            query = query.filter(captures::category.is_null());
        }
        Ok(query.load::<Capture>(&mut conn)?)
    }

    /// Attach a classification result to a capture
    pub fn classify_capture(&self, capture_id: i32, category: &str) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let updated = diesel::update(captures::table.filter(captures::id.eq(capture_id)))
            .set((
                captures::category.eq(Some(category)),
                captures::classified_at.eq(Some(&now)),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DbError::Validation(format!("Capture {} not found", capture_id)));
        }
        Ok(())
    }

    // ========================================================================
    // Milestone Operations
    // ========================================================================

    /// Record a milestone crossing in the history ledger. Re-recording
    /// the same (habit, threshold, day) is a no-op.
    pub fn record_milestone(&self, habit_id: i32, threshold: u32, reached_on: NaiveDate) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let new_event = NewMilestoneEvent {
            habit_id,
            threshold: threshold as i32,
            reached_on: &date_to_column(reached_on),
            created_at: &now,
        };

        diesel::insert_or_ignore_into(milestone_events::table)
            .values(&new_event)
            .execute(&mut conn)?;

        Ok(())
    }

    /// Recent milestone events across all habits, newest first
    pub fn recent_milestones(&self, limit: i64) -> Result<Vec<MilestoneEvent>> {
        let mut conn = self.get_conn()?;
        Ok(milestone_events::table
            .order(milestone_events::reached_on.desc())
            .limit(limit)
            .load::<MilestoneEvent>(&mut conn)?)
    }
}
