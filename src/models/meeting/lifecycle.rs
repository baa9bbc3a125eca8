use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbPool;
use crate::errors::AppError;

use super::promotion::{self, StatusPlan};
use super::queries;
use super::types::MeetingStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StatusChange {
    /// The meeting was already concluded; nothing was written.
    Unchanged,
    Applied(StatusPlan),
}

/// Move a meeting to `new_status`.
///
/// Guard, conditional write and the promotion engine share one transaction.
/// A meeting concluded concurrently yields `Unchanged`, so the engine runs at
/// most once per meeting.
pub async fn change_status(
    pool: &DbPool,
    meeting_id: i64,
    committee_id: i64,
    new_status: MeetingStatus,
    effective_time: DateTime<Utc>,
) -> Result<StatusChange, AppError> {
    let mut tx = pool.begin().await?;

    let meeting = queries::find_in_committee(&mut tx, meeting_id, committee_id)
        .await?
        .ok_or(AppError::NotFound)?;

    match new_status {
        MeetingStatus::Running => {
            if queries::has_running(&mut tx, committee_id).await? {
                return Err(AppError::AlreadyRunning);
            }
        }
        MeetingStatus::Concluded => {
            if queries::has_newer_concluded(&mut tx, &meeting).await? {
                return Err(AppError::NewerConcluded);
            }
        }
        MeetingStatus::OnHold => {}
    }

    let concluded_at = (new_status == MeetingStatus::Concluded).then_some(effective_time);
    if !queries::set_status_unless_concluded(&mut tx, meeting_id, new_status, concluded_at).await? {
        return Ok(StatusChange::Unchanged);
    }

    let plan = if new_status == MeetingStatus::Concluded && !meeting.gathering {
        promotion::on_conclusion(&mut tx, &meeting, effective_time).await?
    } else {
        StatusPlan::default()
    };

    tx.commit().await?;
    log::info!("meeting {meeting_id} of committee {committee_id} is now {new_status}");
    Ok(StatusChange::Applied(plan))
}
