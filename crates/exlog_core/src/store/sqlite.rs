//! SQLite-backed store.
//!
//! # Invariants
//! - Dates are stored as epoch milliseconds in `exercise_entries.date_ms`.
//! - Read paths re-run entity validation and reject rows that fail it.

use super::{EntryRangeFilter, Store, StoreError, StoreResult};
use crate::model::date::EntryDate;
use crate::model::entry::{EntryId, ExerciseEntry};
use crate::model::user::{User, UserId};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    description,
    duration_minutes,
    date_ms
FROM exercise_entries";

/// Store over one borrowed, migrated SQLite connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the connection was never migrated.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for table in ["users", "exercise_entries"] {
            if !table_exists(conn, table)? {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl Store for SqliteStore<'_> {
    fn insert_user(&self, user: &User) -> StoreResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (id, username) VALUES (?1, ?2);",
            params![user.id.to_string(), user.username.as_str()],
        )?;
        Ok(user.id)
    }

    fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username FROM users WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username FROM users ORDER BY seq ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn insert_entry(&self, entry: &ExerciseEntry) -> StoreResult<EntryId> {
        self.conn.execute(
            "INSERT INTO exercise_entries (
                id,
                user_id,
                description,
                duration_minutes,
                date_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id.to_string(),
                entry.user_id.to_string(),
                entry.description.as_str(),
                entry.duration_minutes,
                entry.date.epoch_ms(),
            ],
        )?;
        Ok(entry.id)
    }

    fn find_entry(&self, id: EntryId) -> StoreResult<Option<ExerciseEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn find_entries(&self, filter: &EntryRangeFilter) -> StoreResult<Vec<ExerciseEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values = vec![Value::Text(filter.user_id.to_string())];

        if let Some(gt) = filter.gt {
            sql.push_str(" AND date_ms > ?");
            bind_values.push(Value::Integer(gt.epoch_ms()));
        }
        if let Some(lt) = filter.lt {
            sql.push_str(" AND date_ms < ?");
            bind_values.push(Value::Integer(lt.epoch_ms()));
        }

        sql.push_str(" ORDER BY date_ms ASC, seq ASC");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        debug!(
            "event=store_query module=store status=start table=exercise_entries bounded_below={} bounded_above={} limit={}",
            filter.gt.is_some(),
            filter.lt.is_some(),
            filter.limit.map_or_else(|| "none".to_string(), |limit| limit.to_string())
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_user_row(row: &Row<'_>) -> StoreResult<User> {
    let id = parse_uuid(row.get("id")?, "users.id")?;
    let username: String = row.get("username")?;
    User::with_id(id, username)
        .map_err(|err| StoreError::InvalidData(format!("user {id}: {err}")))
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<ExerciseEntry> {
    let id = parse_uuid(row.get("id")?, "exercise_entries.id")?;
    let user_id = parse_uuid(row.get("user_id")?, "exercise_entries.user_id")?;

    let duration_raw: i64 = row.get("duration_minutes")?;
    let duration_minutes = u32::try_from(duration_raw)
        .ok()
        .filter(|minutes| *minutes > 0)
        .ok_or_else(|| {
            StoreError::InvalidData(format!(
                "invalid duration `{duration_raw}` in exercise_entries.duration_minutes"
            ))
        })?;

    let date_ms: i64 = row.get("date_ms")?;
    let date = EntryDate::from_epoch_ms(date_ms).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid date `{date_ms}` in exercise_entries.date_ms"
        ))
    })?;

    let description: String = row.get("description")?;
    if description.trim().is_empty() {
        return Err(StoreError::InvalidData(format!(
            "entry {id} has an empty description"
        )));
    }

    Ok(ExerciseEntry {
        id,
        user_id,
        description,
        duration_minutes,
        date,
    })
}

fn parse_uuid(value: String, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
