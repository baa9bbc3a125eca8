//! Approved absences. An absence inside an approved window is not a strike.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::timestamp::{from_millis, to_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl Window {
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.stop
    }

    pub fn overlaps(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> bool {
        self.start <= stop && start <= self.stop
    }
}

/// Absence windows of a committee, keyed by nickname.
#[derive(Debug, Clone, Default)]
pub struct Absences(HashMap<String, Vec<Window>>);

impl Absences {
    pub fn insert(&mut self, nickname: impl Into<String>, window: Window) {
        self.0.entry(nickname.into()).or_default().push(window);
    }

    /// Whether `nickname` was excused for some part of [start, stop].
    pub fn excused_from(&self, nickname: &str, start: DateTime<Utc>, stop: DateTime<Utc>) -> bool {
        self.0
            .get(nickname)
            .is_some_and(|windows| windows.iter().any(|w| w.overlaps(start, stop)))
    }
}

pub async fn excuse(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
) -> Result<i64, AppError> {
    if start > stop {
        return Err(AppError::BadRequest("absence ends before it starts".into()));
    }

    let result = sqlx::query(
        "INSERT INTO absences (nickname, committee_id, start_time, stop_time) VALUES (?, ?, ?, ?)",
    )
    .bind(nickname)
    .bind(committee_id)
    .bind(to_millis(start))
    .bind(to_millis(stop))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn is_excused(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
    at: DateTime<Utc>,
) -> Result<bool, AppError> {
    let at = to_millis(at);
    let (n,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM absences \
         WHERE nickname = ? AND committee_id = ? AND start_time <= ? AND stop_time >= ?",
    )
    .bind(nickname)
    .bind(committee_id)
    .bind(at)
    .bind(at)
    .fetch_one(pool)
    .await?;
    Ok(n > 0)
}

pub(crate) async fn for_committee(
    conn: &mut SqliteConnection,
    committee_id: i64,
) -> Result<Absences, AppError> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        "SELECT nickname, start_time, stop_time FROM absences WHERE committee_id = ?",
    )
    .bind(committee_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut absences = Absences::default();
    for (nickname, start, stop) in rows {
        absences.insert(
            nickname,
            Window {
                start: from_millis(start),
                stop: from_millis(stop),
            },
        );
    }
    Ok(absences)
}
