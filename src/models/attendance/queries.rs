use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::models::meeting::types::{MEETING_COLUMNS, Meeting, MeetingRow};
use crate::models::timestamp::from_millis;

use super::Attendees;

pub async fn attendees(conn: &mut SqliteConnection, meeting_id: i64) -> Result<Attendees, AppError> {
    let rows: Vec<(String, bool)> =
        sqlx::query_as("SELECT nickname, voting_allowed FROM attendees WHERE meeting_id = ?")
            .bind(meeting_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Last time the attendee record was inserted, updated or deleted.
pub async fn changed_at(
    conn: &mut SqliteConnection,
    meeting_id: i64,
    nickname: &str,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT changed_at FROM attendee_changes WHERE meeting_id = ? AND nickname = ?",
    )
    .bind(meeting_id)
    .bind(nickname)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|(ms,)| from_millis(ms)))
}

pub async fn upsert(
    conn: &mut SqliteConnection,
    meeting_id: i64,
    nickname: &str,
    voting: bool,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO attendees (meeting_id, nickname, voting_allowed) VALUES (?, ?, ?) \
         ON CONFLICT (meeting_id, nickname) DO UPDATE SET voting_allowed = excluded.voting_allowed",
    )
    .bind(meeting_id)
    .bind(nickname)
    .bind(voting)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn remove(
    conn: &mut SqliteConnection,
    meeting_id: i64,
    nickname: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM attendees WHERE meeting_id = ? AND nickname = ?")
        .bind(meeting_id)
        .bind(nickname)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Meetings the user attended, newest first.
pub async fn attended_meetings(
    conn: &mut SqliteConnection,
    nickname: &str,
) -> Result<Vec<Meeting>, AppError> {
    let columns = MEETING_COLUMNS
        .split(", ")
        .map(|c| format!("m.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {columns} FROM meetings m \
         JOIN attendees a ON a.meeting_id = m.id \
         WHERE a.nickname = ? ORDER BY m.start_time DESC, m.id DESC"
    );
    let rows = sqlx::query_as::<_, MeetingRow>(&sql)
        .bind(nickname)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(Meeting::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}
