use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::models::timestamp::{from_millis, to_millis};

use super::history::{Histories, History};
use super::types::{HistoryEntry, MemberStatus};

#[derive(sqlx::FromRow)]
struct EntryRow {
    nickname: String,
    status: i64,
    since: i64,
}

fn decode_status(code: i64) -> Result<MemberStatus, AppError> {
    MemberStatus::from_code(code).ok_or_else(|| {
        AppError::Db(sqlx::Error::Decode(
            format!("invalid member status code {code}").into(),
        ))
    })
}

/// Most recently recorded status, `None` when the user never had one.
pub async fn latest_status(
    conn: &mut SqliteConnection,
    nickname: &str,
    committee_id: i64,
) -> Result<Option<MemberStatus>, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT status FROM member_history \
         WHERE nickname = ? AND committee_id = ? \
         ORDER BY since DESC, id DESC LIMIT 1",
    )
    .bind(nickname)
    .bind(committee_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(code,)| decode_status(code)).transpose()
}

/// Status in effect at `when`.
pub async fn status_at(
    conn: &mut SqliteConnection,
    nickname: &str,
    committee_id: i64,
    when: DateTime<Utc>,
) -> Result<MemberStatus, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT status FROM member_history \
         WHERE nickname = ? AND committee_id = ? AND since <= ? \
         ORDER BY since DESC, id DESC LIMIT 1",
    )
    .bind(nickname)
    .bind(committee_id)
    .bind(to_millis(when))
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some((code,)) => decode_status(code),
        None => Ok(MemberStatus::NoMember),
    }
}

/// Append `status` unless it equals the latest recorded status.
/// Returns whether an entry was written.
pub async fn record_status(
    conn: &mut SqliteConnection,
    nickname: &str,
    committee_id: i64,
    status: MemberStatus,
    since: DateTime<Utc>,
) -> Result<bool, AppError> {
    if latest_status(conn, nickname, committee_id).await? == Some(status) {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO member_history (nickname, committee_id, status, since) VALUES (?, ?, ?, ?)",
    )
    .bind(nickname)
    .bind(committee_id)
    .bind(status.code())
    .bind(to_millis(since))
    .execute(&mut *conn)
    .await?;

    Ok(true)
}

/// Write several status changes at the same instant. Returns the number written.
pub async fn record_statuses(
    conn: &mut SqliteConnection,
    committee_id: i64,
    changes: &[(String, MemberStatus)],
    since: DateTime<Utc>,
) -> Result<usize, AppError> {
    let mut written = 0;
    for (nickname, status) in changes {
        if record_status(conn, nickname, committee_id, *status, since).await? {
            written += 1;
        }
    }
    Ok(written)
}

pub async fn load_history(
    conn: &mut SqliteConnection,
    nickname: &str,
    committee_id: i64,
) -> Result<History, AppError> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT nickname, status, since FROM member_history \
         WHERE nickname = ? AND committee_id = ? ORDER BY since, id",
    )
    .bind(nickname)
    .bind(committee_id)
    .fetch_all(&mut *conn)
    .await?;

    let entries = rows
        .into_iter()
        .map(|r| {
            Ok(HistoryEntry {
                since: from_millis(r.since),
                status: decode_status(r.status)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(History::new(entries))
}

/// Histories of every user that ever had a status in the committee.
pub async fn load_histories(
    conn: &mut SqliteConnection,
    committee_id: i64,
) -> Result<Histories, AppError> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT nickname, status, since FROM member_history \
         WHERE committee_id = ? ORDER BY nickname, since, id",
    )
    .bind(committee_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: std::collections::HashMap<String, Vec<HistoryEntry>> =
        std::collections::HashMap::new();
    for r in rows {
        let entry = HistoryEntry {
            since: from_millis(r.since),
            status: decode_status(r.status)?,
        };
        grouped.entry(r.nickname).or_default().push(entry);
    }

    Ok(grouped
        .into_iter()
        .map(|(nickname, entries)| (nickname, History::new(entries)))
        .collect())
}
