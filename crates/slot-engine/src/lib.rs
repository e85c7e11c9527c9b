//! # slot-engine
//!
//! Free/busy availability resolution for meeting scheduling.
//!
//! Given busy intervals from one or more calendars, the engine finds every open interval
//! in a window that can host a meeting of a requested duration, padding each busy interval
//! with optional buffers. A thin scheduler books the first such slot through the same
//! calendar provider, which also manages those events afterwards.
//!
//! ## Modules
//!
//! - [`interval`] — `TimeInterval` and timestamp parsing
//! - [`query`] — validated `SlotQuery` and `Buffers`
//! - [`freebusy`] — provider free/busy shapes and the slot sweep
//! - [`provider`] — `CalendarProvider` trait and the in-memory fixture provider
//! - [`availability`] — `AvailabilityResolver`, one provider read plus the sweep
//! - [`event`] — calendar event shapes, patches and listing options
//! - [`scheduler`] — book the first available slot
//! - [`http`] — caller-facing parameter parsing and response shapes
//! - [`config`] — scheduling defaults (buffers, horizon, time zone)
//! - [`error`] — Error types

pub mod availability;
pub mod config;
pub mod error;
pub mod event;
pub mod freebusy;
pub mod http;
pub mod interval;
pub mod provider;
pub mod query;
pub mod scheduler;

pub use availability::AvailabilityResolver;
pub use config::SchedulingDefaults;
pub use error::SlotError;
pub use event::{CalendarEvent, EventListOptions, EventOrder, EventPatch};
pub use freebusy::{find_open_slots, BusyIndex, FreeBusyResponse};
pub use interval::{parse_timestamp, TimeInterval};
pub use provider::{CalendarProvider, InMemoryProvider, PRIMARY_CALENDAR};
pub use query::{Buffers, SlotQuery};
pub use scheduler::{schedule_first_available, MeetingRequest, ScheduleOptions};
