//! Calendar domain service.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::day::{day_floor, format_day, today};
use crate::models::{Calendar, Event, PushOutcome};
use crate::{db, store, Config, Error, Result};

/// Business rules for calendar upserts, on top of a shared connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct CalendarService {
    pool: SqlitePool,
}

impl CalendarService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured database and make sure its tables exist.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        let service = Self::new(pool);
        service.ensure_schema().await?;
        info!(path = %config.database_path, "database ready");
        Ok(service)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection. Pending acquires fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        store::ensure_schema(&mut conn).await
    }

    pub async fn user_exists(&self, token: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        store::user_exists(&mut conn, token).await
    }

    /// Calendar uuid for a user and day, or an empty string if there is none.
    pub async fn calendar_entry_exists(&self, user_token: &str, date: i64) -> Result<String> {
        let mut conn = self.pool.acquire().await?;
        let uuid = store::find_calendar(&mut conn, user_token, date).await?;
        Ok(uuid.unwrap_or_default())
    }

    /// Remove every event of a calendar. Removing nothing is not an error.
    pub async fn delete_events(&self, calendar_uuid: &str) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        store::delete_events(&mut conn, calendar_uuid).await
    }

    /// Insert `events` under `calendar_uuid` with freshly generated uuids.
    pub async fn create_events(
        &self,
        events: &[Event],
        calendar_uuid: &str,
        user_token: &str,
    ) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if calendar_uuid.is_empty() {
            return Err(Error::Corrupt(format!(
                "refusing to store {} events for {} without a calendar uuid",
                events.len(),
                user_token
            )));
        }

        let mut conn = self.pool.acquire().await?;
        let inserted = store::insert_events(&mut conn, calendar_uuid, events).await?;
        debug!(calendar_uuid, user_token, inserted, "inserted events");
        Ok(())
    }

    pub async fn list_events(&self, calendar_uuid: &str) -> Result<Vec<Event>> {
        let mut conn = self.pool.acquire().await?;
        store::list_events(&mut conn, calendar_uuid).await
    }

    /// Register a user token. Fails with [`Error::Conflict`] if it exists.
    pub async fn create_user(&self, token: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if store::user_exists(&mut conn, token).await? {
            return Err(Error::Conflict("user already exists".to_string()));
        }

        match store::insert_user(&mut conn, token).await {
            Err(Error::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(Error::Conflict("user already exists".to_string()))
            }
            result => result,
        }
    }

    /// Replace a user's events for one day.
    ///
    /// The date is floored to its UTC day and must not be before the day of
    /// `now`. The calendar row is created on first use. Lookup, deletion and
    /// insertion share one transaction, so any failure leaves the previously
    /// stored events untouched. The transaction takes the write lock when it
    /// begins, so concurrent pushes queue on the busy timeout instead of
    /// failing on lock upgrade.
    pub async fn push(&self, calendar: Calendar, now: DateTime<Utc>) -> Result<PushOutcome> {
        let date = day_floor(calendar.date);
        if date < today(now) {
            return Err(Error::Validation("day is before current day".to_string()));
        }
        calendar.validate()?;

        let token = calendar.user_token.as_str();
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        if !store::user_exists(&mut *tx, token).await? {
            return Err(Error::Validation("invalid user token".to_string()));
        }

        let (calendar_uuid, created) = match store::find_calendar(&mut *tx, token, date).await? {
            None => {
                let uuid = Uuid::new_v4().to_string();
                store::insert_calendar(&mut *tx, &uuid, token, date)
                    .await
                    .map_err(|e| {
                        Error::CalendarWrite(format!("failed to create calendar entry: {}", e))
                    })?;
                (uuid, true)
            }
            Some(uuid) => {
                let removed = store::delete_events(&mut *tx, &uuid)
                    .await
                    .map_err(|e| Error::CalendarWrite(e.to_string()))?;
                debug!(calendar_uuid = %uuid, removed, "cleared events");
                (uuid, false)
            }
        };

        store::insert_events(&mut *tx, &calendar_uuid, &calendar.events).await?;
        tx.commit().await?;

        info!(
            user = %redact_token(token),
            date = %format_day(date),
            created,
            events = calendar.events.len(),
            "created or updated calendar entries"
        );

        Ok(PushOutcome {
            calendar_uuid,
            created,
            date,
            event_count: calendar.events.len(),
        })
    }
}

/// Leading characters of a token, safe to log.
fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    if prefix.len() == token.len() {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("abcdef123456"), "abcd****");
        assert_eq!(redact_token("abcd"), "****");
        assert_eq!(redact_token(""), "****");
        assert!(!redact_token("secret-token").contains("secret-token"));
    }
}
