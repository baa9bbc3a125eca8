use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::models::timestamp::to_millis;

use super::filter::MeetingFilter;
use super::types::*;

pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Meeting>, AppError> {
    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?");
    let row = sqlx::query_as::<_, MeetingRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Meeting::try_from).transpose()?)
}

/// Meeting `id` if it belongs to the committee.
pub async fn find_in_committee(
    conn: &mut SqliteConnection,
    id: i64,
    committee_id: i64,
) -> Result<Option<Meeting>, AppError> {
    Ok(find(conn, id)
        .await?
        .filter(|m| m.committee_id == committee_id))
}

/// Meetings matching `filter`, newest first. `limit` of `None` returns all.
pub async fn find_filtered(
    conn: &mut SqliteConnection,
    filter: &MeetingFilter,
    limit: Option<i64>,
) -> Result<Vec<Meeting>, AppError> {
    let (clause, params) = filter.where_clause();
    let mut sql = format!(
        "SELECT {MEETING_COLUMNS} FROM meetings WHERE {clause} ORDER BY start_time DESC, id DESC"
    );
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query_as::<_, MeetingRow>(&sql);
    for p in params {
        query = query.bind(p);
    }
    if let Some(limit) = limit {
        query = query.bind(limit);
    }

    let rows = query.fetch_all(&mut *conn).await?;
    Ok(rows
        .into_iter()
        .map(Meeting::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn exists(conn: &mut SqliteConnection, filter: &MeetingFilter) -> Result<bool, AppError> {
    let (clause, params) = filter.where_clause();
    let sql = format!("SELECT EXISTS (SELECT 1 FROM meetings WHERE {clause})");
    let mut query = sqlx::query_as::<_, (bool,)>(&sql);
    for p in params {
        query = query.bind(p);
    }
    let (found,) = query.fetch_one(&mut *conn).await?;
    Ok(found)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    committee_id: i64,
    meeting: &NewMeeting,
) -> Result<i64, AppError> {
    let result = sqlx::query(
        "INSERT INTO meetings (committee_id, gathering, status, start_time, stop_time, description) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(committee_id)
    .bind(meeting.gathering)
    .bind(MeetingStatus::OnHold.code())
    .bind(to_millis(meeting.start_time))
    .bind(to_millis(meeting.stop_time))
    .bind(&meeting.description)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Reschedule a meeting. Concluded meetings are left untouched (returns false).
pub async fn update_unless_concluded(
    conn: &mut SqliteConnection,
    id: i64,
    meeting: &NewMeeting,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE meetings SET gathering = ?, start_time = ?, stop_time = ?, description = ? \
         WHERE id = ? AND status <> ?",
    )
    .bind(meeting.gathering)
    .bind(to_millis(meeting.start_time))
    .bind(to_millis(meeting.stop_time))
    .bind(&meeting.description)
    .bind(id)
    .bind(MeetingStatus::Concluded.code())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete_unless_concluded(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM meetings WHERE id = ? AND status <> ?")
        .bind(id)
        .bind(MeetingStatus::Concluded.code())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn has_running(conn: &mut SqliteConnection, committee_id: i64) -> Result<bool, AppError> {
    exists(
        conn,
        &MeetingFilter::Committee(committee_id).and(MeetingFilter::Running),
    )
    .await
}

/// Whether a meeting of the committee starting after `meeting` is already concluded.
pub async fn has_newer_concluded(
    conn: &mut SqliteConnection,
    meeting: &Meeting,
) -> Result<bool, AppError> {
    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM meetings \
         WHERE committee_id = ? AND status = ? AND start_time > ? AND id <> ?)",
    )
    .bind(meeting.committee_id)
    .bind(MeetingStatus::Concluded.code())
    .bind(to_millis(meeting.start_time))
    .bind(meeting.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(found)
}

/// The latest concluded, non-gathering meeting of the committee starting before `meeting`.
pub async fn previous_concluded(
    conn: &mut SqliteConnection,
    meeting: &Meeting,
) -> Result<Option<Meeting>, AppError> {
    let sql = format!(
        "SELECT {MEETING_COLUMNS} FROM meetings \
         WHERE committee_id = ? AND status = ? AND NOT gathering AND start_time < ? AND id <> ? \
         ORDER BY start_time DESC, id DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, MeetingRow>(&sql)
        .bind(meeting.committee_id)
        .bind(MeetingStatus::Concluded.code())
        .bind(to_millis(meeting.start_time))
        .bind(meeting.id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Meeting::try_from).transpose()?)
}

/// Conditional status write: never moves a concluded meeting.
/// Returns whether the row was changed.
pub async fn set_status_unless_concluded(
    conn: &mut SqliteConnection,
    id: i64,
    status: MeetingStatus,
    concluded_at: Option<DateTime<Utc>>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE meetings SET status = ?, concluded_at = ? WHERE id = ? AND status <> ?",
    )
    .bind(status.code())
    .bind(concluded_at.map(to_millis))
    .bind(id)
    .bind(MeetingStatus::Concluded.code())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
