//! Shared library for the boring calendar service.
//!
//! Holds configuration, the data model, persistence and the calendar domain
//! service used by the HTTP server.

pub mod bootstrap;
pub mod config;
pub mod day;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{Calendar, Event, PushOutcome};
pub use service::CalendarService;
