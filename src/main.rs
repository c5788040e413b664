use chrono::{Datelike, Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use evergreen::classify::{self, Classifier};
use evergreen::config::Config;
use evergreen::dashboard::{self, DashboardSummary};
use evergreen::db::Database;
use evergreen::streak::{crossed_milestones, CompletionRule};
use evergreen::{init, serve};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "evergreen")]
#[command(author, version, about = "Local-first life operating system: habits, streaks, captures, people")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set up .evergreen in the current directory
    Init,

    /// Manage habits
    Habit {
        #[command(subcommand)]
        action: HabitAction,
    },

    /// Log a day's entry for a habit (upserts: one entry per day)
    Log {
        /// Habit name or id
        habit: String,

        /// Day to log, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// How many of the habit's daily actions were done
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Free-form note for the day
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Remove a day's entry
    Unlog {
        /// Habit name or id
        habit: String,

        /// Day to remove, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show streaks and completion rates for one habit
    Streak {
        /// Habit name or id
        habit: String,
    },

    /// Whole-life overview: habits, milestones, people, inbox
    Dashboard,

    /// Generate a markdown review report
    Report {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture inbox
    Capture {
        #[command(subcommand)]
        action: CaptureAction,
    },

    /// People to keep up with
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Yearly challenge goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Start the local dashboard server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3111")]
        port: u16,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum HabitAction {
    /// Add a habit
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Rule deciding whether a day counts as completed
        #[arg(short, long, value_enum, default_value_t = PredicateArg::Exists)]
        predicate: PredicateArg,

        /// Checkmarks required per day (min-count rule)
        #[arg(short, long, default_value_t = 1)]
        required: u32,

        /// Checkmarks available per day
        #[arg(short, long, default_value_t = 0)]
        target: u32,

        /// Attach to a goal by id
        #[arg(short, long)]
        goal: Option<i32>,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(short, long)]
        all: bool,
    },
    /// Archive a habit (entries are kept)
    Archive { id: i32 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PredicateArg {
    /// Any entry counts
    Exists,
    /// A non-empty note counts
    AnyNote,
    /// At least --required checkmarks count
    MinCount,
}

#[derive(Subcommand)]
enum CaptureAction {
    /// Capture a thought into the inbox
    Add { text: String },
    /// List captures
    List {
        /// Only unclassified captures
        #[arg(short, long)]
        pending: bool,
    },
    /// Classify pending captures with the rule table
    Classify,
}

#[derive(Subcommand)]
enum ContactAction {
    /// Add a contact
    Add {
        name: String,

        /// Grouping (family, friends, work, ...)
        #[arg(long)]
        circle: Option<String>,

        /// Desired days between touches
        #[arg(long)]
        cadence: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// List contacts with their last touch
    List,
    /// Record an interaction
    Log {
        /// Contact name or id
        contact: String,

        /// Day it happened, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// call, text, lunch, ...
        #[arg(long)]
        channel: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },
    /// Contacts past their cadence
    Due,
}

#[derive(Subcommand)]
enum GoalAction {
    /// Add a yearly challenge goal
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Target year (default: this year)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List goals
    List,
    /// Update goal status (active / completed / abandoned)
    Status { id: i32, status: String },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // "today" is resolved once here and passed down; nothing below main
    // reads the clock
    let today = Local::now().date_naive();

    match cli.command {
        Command::Init => {
            init::run_init(&std::env::current_dir()?)?;
        }

        Command::Habit { action } => run_habit(action)?,

        Command::Log {
            habit,
            date,
            count,
            note,
        } => run_log(&habit, date.unwrap_or(today), count, note.as_deref(), today)?,

        Command::Unlog { habit, date } => {
            let db = Database::open()?;
            let habit = db.find_habit(&habit)?;
            let date = date.unwrap_or(today);
            if db.delete_entry(habit.id, date)? {
                println!("Removed entry for {} on {}", habit.name.bold(), date);
            } else {
                println!("No entry for {} on {}", habit.name.bold(), date);
            }
        }

        Command::Streak { habit } => run_streak(&habit, today)?,

        Command::Dashboard => {
            let db = Database::open()?;
            let summary = dashboard::build_dashboard(&db, &Config::load(), today)?;
            print_dashboard(&summary);
        }

        Command::Report { output } => {
            let db = Database::open()?;
            let summary = dashboard::build_dashboard(&db, &Config::load(), today)?;
            let report = dashboard::generate_report(&summary);
            match output {
                Some(path) => {
                    std::fs::write(&path, report)?;
                    eprintln!("{} {}", "Report saved:".green(), path.display());
                }
                None => print!("{}", report),
            }
        }

        Command::Capture { action } => run_capture(action)?,

        Command::Contact { action } => run_contact(action, today)?,

        Command::Goal { action } => run_goal(action, today)?,

        Command::Serve { port } => serve::start_dashboard_server(port)?,

        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "evergreen", &mut io::stdout());
        }
    }

    Ok(())
}

fn run_habit(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HabitAction::Add {
            name,
            description,
            predicate,
            required,
            target,
            goal,
        } => {
            let rule = match predicate {
                PredicateArg::Exists => CompletionRule::Exists,
                PredicateArg::AnyNote => CompletionRule::AnyNote,
                PredicateArg::MinCount => CompletionRule::MinCount { required },
            };
            let id = db.create_habit(&name, description.as_deref(), &rule, target, goal)?;
            println!("Created habit {}: {}", id, name.bold());
        }

        HabitAction::List { all } => {
            let habits = db.get_all_habits(all)?;
            if habits.is_empty() {
                println!("No habits yet. 'evergreen habit add <name>' to start.");
                return Ok(());
            }
            for h in habits {
                let rule = match h.rule() {
                    CompletionRule::Exists => "exists".to_string(),
                    CompletionRule::AnyNote => "any note".to_string(),
                    CompletionRule::MinCount { required } => {
                        format!("{} of {}", required, h.target_count)
                    }
                };
                let marker = if h.is_archived() {
                    " (archived)".dimmed().to_string()
                } else {
                    String::new()
                };
                println!(
                    "[{}] {} {} {}{}",
                    h.id,
                    h.name.bold(),
                    format!("({})", rule).dimmed(),
                    h.description.as_deref().unwrap_or(""),
                    marker
                );
            }
        }

        HabitAction::Archive { id } => {
            db.archive_habit(id)?;
            println!("Archived habit {}", id);
        }
    }
    Ok(())
}

fn run_log(
    selector: &str,
    date: NaiveDate,
    count: u32,
    note: Option<&str>,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let habit = db.find_habit(selector)?;
    if habit.is_archived() {
        return Err(format!("Habit '{}' is archived", habit.name).into());
    }
    if date > today {
        return Err(format!("Cannot log the future ({})", date).into());
    }

    let rule = habit.rule();

    // Streak before the save, for milestone crossing detection
    let before = evergreen::streak::compute_streaks(
        evergreen::streak::qualifying_dates(&db.load_day_entries(habit.id)?, &rule),
        today,
    )?;

    let (_, created) = db.upsert_entry(habit.id, date, count, note)?;

    let after = evergreen::streak::compute_streaks(
        evergreen::streak::qualifying_dates(&db.load_day_entries(habit.id)?, &rule),
        today,
    )?;

    let verb = if created { "Logged" } else { "Updated" };
    println!(
        "{} {} for {} (streak {})",
        verb,
        habit.name.bold(),
        date,
        after.current_streak.to_string().green()
    );

    for threshold in crossed_milestones(before.current_streak, after.current_streak) {
        db.record_milestone(habit.id, threshold, today)?;
        println!(
            "{} {}",
            "🎉".green(),
            format!("{}-day streak on {}!", threshold, habit.name).green().bold()
        );
    }

    Ok(())
}

fn run_streak(selector: &str, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load();
    let habit = db.find_habit(selector)?;
    let summary = dashboard::habit_summary(&db, &habit, today, &config.dashboard.windows)?;

    println!("{}", habit.name.bold());
    println!(
        "  current streak: {}",
        summary.streaks.current_streak.to_string().green().bold()
    );
    println!("  longest streak: {}", summary.streaks.longest_streak);
    for w in &summary.windows {
        println!(
            "  last {:>3} days: {:>3}% ({}/{} logged days qualified)",
            w.window_days,
            dashboard::percent(w.completion_rate),
            w.qualifying_days,
            w.logged_days
        );
    }
    if !summary.logged_today {
        println!("  {}", "not logged today".yellow());
    }
    Ok(())
}

fn run_capture(action: CaptureAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        CaptureAction::Add { text } => {
            let id = db.create_capture(&text, &classify::compute_hash(&text))?;
            println!("Captured {}", id);
        }

        CaptureAction::List { pending } => {
            let captures = db.get_captures(pending)?;
            if captures.is_empty() {
                println!("Inbox zero.");
                return Ok(());
            }
            for c in captures {
                let category = c
                    .category
                    .as_deref()
                    .map(|cat| format!("[{}]", cat).cyan().to_string())
                    .unwrap_or_else(|| "[pending]".yellow().to_string());
                println!("[{}] {} {}", c.id, category, c.content);
            }
        }

        CaptureAction::Classify => {
            let config = Config::load();
            let classifier = Classifier::new(&config.capture.rules)?;
            let pending = db.get_captures(true)?;
            if pending.is_empty() {
                println!("Nothing to classify.");
                return Ok(());
            }
            for c in pending {
                let result = classifier.classify(&c.content);
                db.classify_capture(c.id, &result.category)?;
                println!(
                    "[{}] {} {}",
                    c.id,
                    format!("-> {}", result.category).cyan(),
                    c.content
                );
            }
        }
    }
    Ok(())
}

fn run_contact(action: ContactAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ContactAction::Add {
            name,
            circle,
            cadence,
            notes,
        } => {
            let id = db.create_contact(&name, circle.as_deref(), cadence, notes.as_deref())?;
            println!("Created contact {}: {}", id, name.bold());
        }

        ContactAction::List => {
            let contacts = db.get_all_contacts()?;
            if contacts.is_empty() {
                println!("No contacts yet.");
                return Ok(());
            }
            for c in contacts {
                let last = match db.last_interaction(c.id)? {
                    Some(date) => format!("last touch {}", date),
                    None => "never contacted".to_string(),
                };
                let circle = c
                    .circle
                    .as_deref()
                    .map(|s| format!("({}) ", s))
                    .unwrap_or_default();
                println!("[{}] {} {}{}", c.id, c.name.bold(), circle.dimmed(), last.dimmed());
            }
        }

        ContactAction::Log {
            contact,
            date,
            channel,
            note,
        } => {
            let c = db.find_contact(&contact)?;
            let date = date.unwrap_or(today);
            db.log_interaction(c.id, date, channel.as_deref(), note.as_deref())?;
            println!("Logged interaction with {} on {}", c.name.bold(), date);
        }

        ContactAction::Due => {
            let summary = dashboard::build_dashboard(&db, &Config::load(), today)?;
            if summary.due_contacts.is_empty() {
                println!("All caught up.");
                return Ok(());
            }
            for d in summary.due_contacts {
                match d.last_interaction {
                    Some(last) => println!(
                        "{} — {} days past cadence (last touch {})",
                        d.contact.name.bold(),
                        d.days_overdue.to_string().yellow(),
                        last
                    ),
                    None => println!("{} — {}", d.contact.name.bold(), "never contacted".yellow()),
                }
            }
        }
    }
    Ok(())
}

fn run_goal(action: GoalAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        GoalAction::Add {
            title,
            description,
            year,
        } => {
            let year = year.unwrap_or_else(|| today.year());
            let id = db.create_goal(&title, description.as_deref(), year)?;
            println!("Created goal {}: {} ({})", id, title.bold(), year);
        }

        GoalAction::List => {
            let goals = db.get_all_goals()?;
            if goals.is_empty() {
                println!("No goals yet.");
                return Ok(());
            }
            for g in goals {
                let status = match g.status.as_str() {
                    "completed" => g.status.green(),
                    "abandoned" => g.status.red(),
                    _ => g.status.normal(),
                };
                println!("[{}] {} {} [{}]", g.id, g.year, g.title.bold(), status);
            }
        }

        GoalAction::Status { id, status } => {
            db.update_goal_status(id, &status)?;
            println!("Goal {} -> {}", id, status);
        }
    }
    Ok(())
}

fn print_dashboard(summary: &DashboardSummary) {
    println!(
        "{} {}",
        "🌲 Evergreen".green().bold(),
        format!("— {}", summary.generated_on).dimmed()
    );
    println!();

    println!("{}", "Habits".bold());
    if summary.habits.is_empty() {
        println!("  none yet");
    }
    for s in &summary.habits {
        let streak = if s.streaks.current_streak > 0 {
            format!("{}🔥", s.streaks.current_streak).green().to_string()
        } else {
            "0".dimmed().to_string()
        };
        let mut windows = String::new();
        for w in &s.windows {
            windows.push_str(&format!(
                "  {}d {:>3}%",
                w.window_days,
                dashboard::percent(w.completion_rate)
            ));
        }
        let todo = if s.logged_today {
            String::new()
        } else {
            format!("  {}", "· not logged today".yellow())
        };
        println!(
            "  {:<20} {}  best {}{}{}",
            s.habit.name, streak, s.streaks.longest_streak, windows, todo
        );
    }
    println!();

    if !summary.recent_milestones.is_empty() {
        println!("{}", "Milestones".bold());
        for m in &summary.recent_milestones {
            let name = summary
                .habits
                .iter()
                .find(|s| s.habit.id == m.habit_id)
                .map(|s| s.habit.name.as_str())
                .unwrap_or("(archived habit)");
            println!("  {} {}-day streak on {}", m.reached_on.dimmed(), m.threshold, name);
        }
        println!();
    }

    println!("{}", "People".bold());
    if summary.due_contacts.is_empty() {
        println!("  all caught up");
    }
    for d in &summary.due_contacts {
        match d.last_interaction {
            Some(last) => println!(
                "  {} — {} days past cadence (last {})",
                d.contact.name,
                d.days_overdue.to_string().yellow(),
                last
            ),
            None => println!("  {} — {}", d.contact.name, "never contacted".yellow()),
        }
    }
    println!();

    match summary.pending_captures {
        0 => println!("{} inbox zero", "Inbox".bold()),
        n => println!("{} {} pending capture(s)", "Inbox".bold(), n),
    }
}
