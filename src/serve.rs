//! HTTP server for the life dashboard
//!
//! `evergreen serve` → starts server, shows habits, streaks, inbox, people

use crate::config::Config;
use crate::dashboard::{self, DashboardSummary, DueContact, HabitSummary};
use crate::db::{Capture, Database};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

// Embedded dashboard page
const DASHBOARD_HTML: &str = include_str!("viewer.html");

/// Start the dashboard server
pub fn start_dashboard_server(port: u16) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n\x1b[1;32m🌲 Evergreen\x1b[0m");
    eprintln!("   Dashboard: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn json_response<T: Serialize>(request: Request, data: T) -> std::io::Result<()> {
    let json = serde_json::to_string(&ApiResponse::success(data))?;
    let response = Response::from_string(json).with_header(
        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
    );
    request.respond(response)
}

fn handle_request(request: Request) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let query = url.splitn(2, '?').nth(1).unwrap_or("").to_string();
    let method = request.method().clone();

    match (&method, path) {
        // Serve dashboard UI
        (&Method::Get, "/") | (&Method::Get, "/dashboard") => {
            let response = Response::from_string(DASHBOARD_HTML)
                .with_header(Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap());
            request.respond(response)
        }

        // API: full dashboard summary
        (&Method::Get, "/api/dashboard") => json_response(request, get_dashboard()),

        // API: habit list with streak state
        (&Method::Get, "/api/habits") => json_response(request, get_habit_summaries(None)),

        // API: streaks over a chosen window (?days=N)
        (&Method::Get, "/api/habits/streaks") => {
            let window: WindowQuery = serde_urlencoded::from_str(&query).unwrap_or_default();
            json_response(request, get_habit_summaries(window.days))
        }

        // API: capture inbox
        (&Method::Get, "/api/captures") => json_response(request, get_captures()),

        // API: overdue contacts
        (&Method::Get, "/api/contacts/due") => json_response(request, get_due_contacts()),

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

#[derive(serde::Deserialize, Default)]
struct WindowQuery {
    days: Option<u32>,
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn get_dashboard() -> Option<DashboardSummary> {
    let db = Database::open().ok()?;
    dashboard::build_dashboard(&db, &Config::load(), today()).ok()
}

fn get_habit_summaries(window: Option<u32>) -> Vec<HabitSummary> {
    let config = Config::load();
    let windows = match window {
        Some(days) => vec![days],
        None => config.dashboard.windows.clone(),
    };

    let db = match Database::open() {
        Ok(db) => db,
        Err(_) => return vec![],
    };
    let habits = db.get_all_habits(false).unwrap_or_default();
    habits
        .iter()
        .filter_map(|h| dashboard::habit_summary(&db, h, today(), &windows).ok())
        .collect()
}

fn get_captures() -> Vec<Capture> {
    match Database::open() {
        Ok(db) => db.get_captures(false).unwrap_or_default(),
        Err(_) => vec![],
    }
}

fn get_due_contacts() -> Vec<DueContact> {
    match Database::open() {
        Ok(db) => dashboard::build_dashboard(&db, &Config::load(), today())
            .map(|d| d.due_contacts)
            .unwrap_or_default(),
        Err(_) => vec![],
    }
}
