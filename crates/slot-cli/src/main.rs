//! `slots` CLI — find free meeting slots and book meetings against recorded free/busy data.
//!
//! ## Usage
//!
//! ```sh
//! # Open 30 minute slots for the primary calendar plus two attendees
//! slots find --busy freebusy.json --time-min 2026-03-16T09:00:00Z \
//!     --time-max 2026-03-16T17:00:00Z --duration 30 --attendees alice@example.com,bob@example.com
//!
//! # Raw free/busy for some calendars
//! slots busy --busy freebusy.json --time-min 2026-03-16T09:00:00Z --time-max 2026-03-16T17:00:00Z
//!
//! # Book the first slot that fits
//! slots schedule --busy freebusy.json --summary "Design review" --duration 45 \
//!     --time-min 2026-03-16T09:00:00Z --time-max 2026-03-16T17:00:00Z
//!
//! # Manage booked events; --save writes the change back into the fixture
//! slots events --busy freebusy.json --time-min 2026-03-16T00:00:00Z --time-max 2026-03-17T00:00:00Z
//! slots update --busy freebusy.json --id <event-id> --start 2026-03-16T15:00:00Z \
//!     --end 2026-03-16T15:45:00Z --save
//! slots delete --busy freebusy.json --id <event-id> --save
//!
//! # Override buffers and horizon from a config file
//! slots --config slots.toml find ...
//! ```
//!
//! Results are printed to stdout as JSON. Logs go to stderr; set `RUST_LOG` or pass
//! `--verbose` to see them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slot_engine::event::EventTime;
use slot_engine::http::{split_ids, AvailabilityResponse, EventsParams, TimezoneResponse};
use slot_engine::{
    parse_timestamp, schedule_first_available, AvailabilityResolver, Buffers, CalendarProvider,
    EventPatch, InMemoryProvider, MeetingRequest, ScheduleOptions, SchedulingDefaults, SlotQuery,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "slots", version, about = "Free/busy slot finder and meeting scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with scheduling defaults (buffers, horizon, time zone)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List open slots long enough for a meeting
    Find {
        /// Free/busy JSON file backing the calendars
        #[arg(long)]
        busy: PathBuf,
        /// Window start (RFC 3339)
        #[arg(long)]
        time_min: String,
        /// Window end (RFC 3339)
        #[arg(long)]
        time_max: String,
        /// Meeting length in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// Comma-separated attendee calendar ids
        #[arg(long)]
        attendees: Option<String>,
        /// Minutes of padding before each busy block
        #[arg(long, allow_negative_numbers = true)]
        buffer_before: Option<i64>,
        /// Minutes of padding after each busy block
        #[arg(long, allow_negative_numbers = true)]
        buffer_after: Option<i64>,
    },
    /// Print raw free/busy data
    Busy {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        time_min: String,
        #[arg(long)]
        time_max: String,
        /// Comma-separated calendar ids (defaults to the primary calendar)
        #[arg(long)]
        calendars: Option<String>,
    },
    /// Book a meeting in the first open slot
    Schedule {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        summary: String,
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        #[arg(long)]
        attendees: Option<String>,
        /// Window start (defaults to now)
        #[arg(long)]
        time_min: Option<String>,
        /// Window end (defaults to now plus the configured horizon)
        #[arg(long)]
        time_max: Option<String>,
        /// IANA time zone recorded on the event
        #[arg(long)]
        time_zone: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Write the booked event back into the fixture file
        #[arg(long)]
        save: bool,
    },
    /// List events on the primary calendar
    Events {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        time_min: String,
        #[arg(long)]
        time_max: String,
        /// Maximum number of events to print (default 50)
        #[arg(long)]
        max_results: Option<String>,
        /// `startTime` or `updated`
        #[arg(long)]
        order_by: Option<String>,
    },
    /// Print one event
    Event {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Change an event's details or move it
    Update {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// New start (RFC 3339)
        #[arg(long)]
        start: Option<String>,
        /// New end (RFC 3339)
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        save: bool,
    },
    /// Cancel an event, freeing its time
    Delete {
        #[arg(long)]
        busy: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        save: bool,
    },
    /// Print the primary calendar's time zone
    Timezone {
        #[arg(long)]
        busy: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let defaults = match &cli.config {
        Some(path) => SchedulingDefaults::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SchedulingDefaults::default(),
    };

    match cli.command {
        Commands::Find {
            busy,
            time_min,
            time_max,
            duration,
            attendees,
            buffer_before,
            buffer_after,
        } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let buffers = Buffers::from_minutes(
                buffer_before.unwrap_or(defaults.buffer_before_minutes),
                buffer_after.unwrap_or(defaults.buffer_after_minutes),
            )?;
            let query = SlotQuery::new(
                parse_timestamp(&time_min)?,
                parse_timestamp(&time_max)?,
                duration,
            )?
            .with_buffers(buffers)
            .with_attendees(split_ids(attendees.as_deref()));

            let slots = resolver
                .find_available_slots(&query)
                .await
                .context("Failed to find available time slots")?;
            print_json(&AvailabilityResponse::from(slots))?;
        }
        Commands::Busy {
            busy,
            time_min,
            time_max,
            calendars,
        } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let response = resolver
                .free_busy(
                    parse_timestamp(&time_min)?,
                    parse_timestamp(&time_max)?,
                    &split_ids(calendars.as_deref()),
                )
                .await
                .context("Failed to check calendar availability")?;
            print_json(&response)?;
        }
        Commands::Schedule {
            busy,
            summary,
            duration,
            attendees,
            time_min,
            time_max,
            time_zone,
            description,
            location,
            save,
        } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let options = ScheduleOptions {
                time_min: time_min.as_deref().map(parse_timestamp).transpose()?,
                time_max: time_max.as_deref().map(parse_timestamp).transpose()?,
                time_zone,
                description,
                location,
                buffer_before_minutes: None,
                buffer_after_minutes: None,
            };
            let request = MeetingRequest::new(summary, duration)
                .with_attendees(split_ids(attendees.as_deref()))
                .with_options(options);

            let event = schedule_first_available(&resolver, &request, &defaults)
                .await
                .context("Failed to schedule meeting")?;
            if save {
                save_fixture(&busy, resolver.provider()).await?;
            }
            print_json(&event)?;
        }
        Commands::Events {
            busy,
            time_min,
            time_max,
            max_results,
            order_by,
        } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let params = EventsParams {
                time_min: Some(time_min),
                time_max: Some(time_max),
                max_results,
                order_by,
            };
            let (time_min, time_max, options) = params.parse()?;
            let events = resolver
                .provider()
                .list_events(time_min, time_max, &options)
                .await
                .context("Failed to fetch calendar events")?;
            print_json(&events)?;
        }
        Commands::Event { busy, id } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let Some(event) = resolver
                .provider()
                .get_event(&id)
                .await
                .context("Failed to get calendar event")?
            else {
                bail!("Event '{}' not found", id);
            };
            print_json(&event)?;
        }
        Commands::Update {
            busy,
            id,
            summary,
            description,
            location,
            start,
            end,
            save,
        } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let provider = resolver.provider();
            let Some(current) = provider
                .get_event(&id)
                .await
                .context("Failed to get calendar event")?
            else {
                bail!("Event '{}' not found", id);
            };

            let patch = EventPatch {
                summary,
                description,
                location,
                start: start
                    .as_deref()
                    .map(|raw| event_time(raw, &current.start))
                    .transpose()?,
                end: end
                    .as_deref()
                    .map(|raw| event_time(raw, &current.end))
                    .transpose()?,
                ..EventPatch::default()
            };
            let event = provider
                .update_event(&id, patch)
                .await
                .context("Failed to update calendar event")?;
            if save {
                save_fixture(&busy, provider).await?;
            }
            print_json(&event)?;
        }
        Commands::Delete { busy, id, save } => {
            let resolver = load_resolver(&busy, &defaults)?;
            resolver
                .provider()
                .delete_event(&id)
                .await
                .context("Failed to delete calendar event")?;
            if save {
                save_fixture(&busy, resolver.provider()).await?;
            }
            tracing::info!(event_id = %id, "deleted event");
        }
        Commands::Timezone { busy } => {
            let resolver = load_resolver(&busy, &defaults)?;
            let timezone = resolver
                .provider()
                .calendar_time_zone()
                .await
                .context("Failed to get calendar timezone")?;
            print_json(&TimezoneResponse { timezone })?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("slots={level},slot_engine={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_resolver(
    path: &Path,
    defaults: &SchedulingDefaults,
) -> Result<AvailabilityResolver<InMemoryProvider>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let provider = InMemoryProvider::from_json(&json)
        .with_context(|| format!("Failed to parse free/busy data: {}", path.display()))?
        .with_primary_calendar(defaults.primary_calendar_id.clone());
    tracing::debug!(path = %path.display(), "loaded free/busy fixture");
    Ok(AvailabilityResolver::new(provider).with_primary_calendar(defaults.primary_calendar_id.clone()))
}

/// Keep the event's own time zone when only the instant changes.
fn event_time(raw: &str, current: &EventTime) -> Result<EventTime> {
    Ok(EventTime {
        date_time: parse_timestamp(raw)?,
        time_zone: current.time_zone.clone(),
    })
}

async fn save_fixture(path: &Path, provider: &InMemoryProvider) -> Result<()> {
    let json = provider.to_fixture_json().await?;
    std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "saved fixture");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
}
