//! Bokning Terminal - Shared Resource Booking
//!
//! Line-oriented terminal front end over the booking workflow engine.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bokning_terminal::{
    api::{BookingApi, HttpApiClient, InMemoryApiClient},
    config::AppConfig,
    input::{InputEvent, TagScanner},
    services::Workflow,
    store::{FileModeStore, InteractionMode},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bokning_terminal={}", config.logging.level).into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Bokning Terminal v{}", env!("CARGO_PKG_VERSION"));

    // The API client is an explicit dependency of the workflow; nothing
    // below this point knows which backend it is talking to.
    let api: Arc<dyn BookingApi> = if config.backend.use_in_memory {
        tracing::info!("Using in-memory backend");
        Arc::new(InMemoryApiClient::new())
    } else {
        tracing::info!(base_url = %config.backend.base_url, "Using HTTP backend");
        Arc::new(HttpApiClient::new(&config.backend)?)
    };

    // One-shot reachability log, mirrors nothing into the workflow.
    match api.health().await {
        Ok(()) => tracing::info!("Backend health ok"),
        Err(error) => tracing::warn!(%error, "Backend health check failed"),
    }

    let mode_store = Arc::new(FileModeStore::new(&config.terminal.mode_store_path));
    let mode_override = std::env::args()
        .nth(1)
        .and_then(|arg| InteractionMode::parse(&arg));
    let demo_tag = config.terminal.demo_tag_uid.clone();
    let workflow = Workflow::new(api, mode_store, config.terminal, mode_override);

    tracing::info!(mode = workflow.mode().as_str(), "Terminal ready");

    let mut scanner = TagScanner::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt(&workflow);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        match (command, parts.collect::<Vec<_>>().as_slice()) {
            ("quit", _) => break,
            ("mode", [value]) => match InteractionMode::parse(value) {
                Some(mode) => workflow.set_mode(mode),
                None => println!("modes: front-desk, self-service"),
            },
            ("tag", rest) => {
                let uid = rest.first().map(|s| s.to_string()).unwrap_or_else(|| demo_tag.clone());
                let _ = workflow.login_with_tag(&uid).await;
            }
            ("login", [subject, secret]) => {
                workflow.set_subject_input(subject);
                workflow.set_secret_input(secret);
                let _ = workflow.login_with_credentials().await;
            }
            ("login", [subject]) => {
                workflow.set_subject_input(subject);
                workflow.set_secret_input("");
                let _ = workflow.login_with_credentials().await;
            }
            ("secret", [value]) => {
                workflow.set_new_secret_input(value);
                if workflow.change_secret().await.is_ok() {
                    println!("secret updated");
                }
            }
            ("resources", _) => {
                for resource in workflow.resources() {
                    println!(
                        "  [{}] {} ({:?}, {} days ahead, {} units)",
                        resource.id,
                        resource.name,
                        resource.booking_type,
                        resource.max_advance_days,
                        resource.price_units
                    );
                }
            }
            ("select", [id]) => {
                if let Ok(id) = id.parse() {
                    let _ = workflow.select_resource(id).await;
                }
            }
            ("slots", [date]) => {
                if let Ok(date) = date.parse() {
                    for slot in workflow.availability().slots_for(date) {
                        let flag = if slot.is_past {
                            "past"
                        } else if slot.is_booked {
                            "booked"
                        } else {
                            "free"
                        };
                        println!("  {} {}", slot.id, flag);
                    }
                }
            }
            ("days", _) => {
                for date in workflow.visible_days() {
                    println!("  {}", date);
                }
            }
            ("next", _) => {
                let _ = workflow.navigate_viewport(1).await;
            }
            ("prev", _) => {
                let _ = workflow.navigate_viewport(-1).await;
            }
            ("book", [date]) => {
                if let Ok(date) = date.parse() {
                    stage(&workflow, date, None);
                }
            }
            ("book", [date, slot]) => {
                if let Ok(date) = date.parse() {
                    stage(&workflow, date, Some(*slot));
                }
            }
            ("cancel", [id]) => {
                if let Ok(id) = id.parse() {
                    let _ = workflow.stage_cancel(id);
                    print_confirm(&workflow);
                }
            }
            ("confirm", _) => {
                let _ = workflow.commit().await;
            }
            ("dismiss", _) => workflow.dismiss_confirm(),
            ("bookings", _) => {
                for booking in workflow.bookings() {
                    println!(
                        "  [{}] {} {} {}",
                        booking.id,
                        booking.resource_name,
                        booking.date,
                        booking.slot_label.as_deref().unwrap_or("(full day)")
                    );
                }
            }
            ("back", _) => workflow.back_to_setup(),
            ("logout", _) => workflow.logout(),
            _ if workflow.scanning_active() && !line.is_empty() => {
                // On a front-desk terminal any raw line is a scanner burst.
                for c in line.chars() {
                    scanner.feed(InputEvent::Key(c), "");
                }
                if let Some(uid) = scanner.feed(InputEvent::Submit, "") {
                    let _ = workflow.login_with_tag(&uid).await;
                }
            }
            _ => println!(
                "commands: mode tag login secret resources select slots days next prev book cancel confirm dismiss bookings back logout quit"
            ),
        }
        if let Some(notice) = workflow.notices().current() {
            println!("! {}", notice);
        }
        print_prompt(&workflow);
    }

    Ok(())
}

fn stage(workflow: &Workflow, date: chrono::NaiveDate, slot: Option<&str>) {
    match workflow.stage_booking(date, slot) {
        Ok(()) => print_confirm(workflow),
        Err(error) => println!("! {}", error),
    }
}

fn print_confirm(workflow: &Workflow) {
    if let Some(pending) = workflow.confirm() {
        println!(
            "confirm {:?} for {} ({} units)? [confirm/dismiss]",
            pending.kind, pending.resource_name, pending.price_units
        );
    }
}

fn print_prompt(workflow: &Workflow) {
    match workflow.subject_id() {
        Some(subject) => println!("({}) >", subject),
        None => println!("(anonymous) >"),
    }
}
