//! Persistence layer: the fixed statements and the batched event insert.
//!
//! Every function takes a connection so the same code runs against a pooled
//! connection or inside an open transaction. sqlx prepares and caches the
//! fixed statements per connection.

use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::models::Event;
use crate::{Error, Result};

const CREATE_CALENDAR: &str = "INSERT INTO calendar (uuid, user_token, date) VALUES (?, ?, ?)";
const USER_EXISTS: &str = "SELECT COUNT(*) FROM user WHERE token = ?";
const CREATE_USER: &str = "INSERT INTO user (token) VALUES (?)";
const CALENDAR_ENTRY_EXISTS: &str =
    "SELECT uuid FROM calendar WHERE user_token = ? AND date = ? LIMIT 1";
const DELETE_EVENTS: &str = "DELETE FROM events WHERE calendar_uuid = ?";
const LIST_EVENTS: &str = "SELECT uuid, calendar_uuid, title, start_time, end_time \
     FROM events WHERE calendar_uuid = ? ORDER BY start_time, end_time, title";

const INSERT_EVENTS: &str = "INSERT INTO events (uuid, calendar_uuid, title, start_time, end_time) ";

/// Bound parameters per event row.
const EVENT_COLUMNS: usize = 5;

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`.
const SQLITE_BIND_LIMIT: usize = 32766;

/// Largest number of events written by a single `INSERT`.
pub const MAX_EVENTS_PER_STATEMENT: usize = SQLITE_BIND_LIMIT / EVENT_COLUMNS;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS user (token TEXT PRIMARY KEY)",
    "CREATE TABLE IF NOT EXISTS calendar (uuid TEXT PRIMARY KEY, user_token TEXT, date INTEGER)",
    "CREATE TABLE IF NOT EXISTS events (uuid TEXT PRIMARY KEY, calendar_uuid TEXT, title TEXT, start_time INTEGER, end_time INTEGER)",
];

/// Create the `user`, `calendar` and `events` tables if they do not exist.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn user_exists(conn: &mut SqliteConnection, token: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(USER_EXISTS)
        .bind(token)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}

pub async fn insert_user(conn: &mut SqliteConnection, token: &str) -> Result<()> {
    sqlx::query(CREATE_USER).bind(token).execute(&mut *conn).await?;
    Ok(())
}

/// Look up the calendar uuid for a user and day.
///
/// A matching row without a uuid is reported as corrupt.
pub async fn find_calendar(
    conn: &mut SqliteConnection,
    user_token: &str,
    date: i64,
) -> Result<Option<String>> {
    let row: Option<Option<String>> = sqlx::query_scalar(CALENDAR_ENTRY_EXISTS)
        .bind(user_token)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        None => Ok(None),
        Some(Some(uuid)) if !uuid.is_empty() => Ok(Some(uuid)),
        Some(_) => Err(Error::Corrupt(format!(
            "calendar for {} on {} has no uuid",
            user_token, date
        ))),
    }
}

pub async fn insert_calendar(
    conn: &mut SqliteConnection,
    uuid: &str,
    user_token: &str,
    date: i64,
) -> Result<()> {
    sqlx::query(CREATE_CALENDAR)
        .bind(uuid)
        .bind(user_token)
        .bind(date)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Delete every event of a calendar, returning how many were removed.
pub async fn delete_events(conn: &mut SqliteConnection, calendar_uuid: &str) -> Result<u64> {
    let result = sqlx::query(DELETE_EVENTS)
        .bind(calendar_uuid)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Build one `INSERT` with a placeholder tuple per event.
///
/// Each event gets a fresh uuid and is attached to `calendar_uuid`; the uuid
/// and calendar uuid carried by the event itself are ignored.
pub fn build_insert_events<'a>(calendar_uuid: &str, events: &[Event]) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(INSERT_EVENTS);
    builder.push_values(events, |mut row, event| {
        row.push_bind(Uuid::new_v4().to_string())
            .push_bind(calendar_uuid.to_string())
            .push_bind(event.title.clone())
            .push_bind(event.start_time)
            .push_bind(event.end_time);
    });
    builder
}

/// Insert events for a calendar. Lists larger than
/// [`MAX_EVENTS_PER_STATEMENT`] are split across several statements.
pub async fn insert_events(
    conn: &mut SqliteConnection,
    calendar_uuid: &str,
    events: &[Event],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in events.chunks(MAX_EVENTS_PER_STATEMENT) {
        let result = build_insert_events(calendar_uuid, chunk)
            .build()
            .execute(&mut *conn)
            .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

pub async fn list_events(conn: &mut SqliteConnection, calendar_uuid: &str) -> Result<Vec<Event>> {
    let rows: Vec<(String, String, String, i64, i64)> = sqlx::query_as(LIST_EVENTS)
        .bind(calendar_uuid)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(uuid, calendar_uuid, title, start_time, end_time)| Event {
            uuid,
            calendar_uuid,
            title,
            start_time,
            end_time,
        })
        .collect())
}
