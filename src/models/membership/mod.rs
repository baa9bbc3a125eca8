//! Append-only membership status history per (user, committee).

pub mod history;
pub mod queries;
pub mod types;

pub use history::{Histories, History};
pub use types::{HistoryEntry, MemberStatus, Role};

use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::errors::AppError;

/// Status of `nickname` in the committee at `when`.
pub async fn status_at(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
    when: DateTime<Utc>,
) -> Result<MemberStatus, AppError> {
    let mut conn = pool.acquire().await?;
    queries::status_at(&mut conn, nickname, committee_id, when).await
}

/// Current status of `nickname`, `NoMember` when nothing was recorded.
pub async fn live_status(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
) -> Result<MemberStatus, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(queries::latest_status(&mut conn, nickname, committee_id)
        .await?
        .unwrap_or(MemberStatus::NoMember))
}

/// Record a status from `since` on. Repeating the latest status is a no-op.
pub async fn record_status(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
    status: MemberStatus,
    since: DateTime<Utc>,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;
    let written = queries::record_status(&mut tx, nickname, committee_id, status, since).await?;
    tx.commit().await?;
    Ok(written)
}

pub async fn history(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
) -> Result<History, AppError> {
    let mut conn = pool.acquire().await?;
    queries::load_history(&mut conn, nickname, committee_id).await
}
