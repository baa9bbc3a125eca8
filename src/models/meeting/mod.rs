pub mod filter;
pub mod lifecycle;
pub mod promotion;
pub mod queries;
pub mod types;

pub use filter::MeetingFilter;
pub use lifecycle::{StatusChange, change_status};
pub use types::*;

use crate::db::DbPool;
use crate::errors::AppError;

fn check_range(meeting: &NewMeeting) -> Result<(), AppError> {
    if meeting.start_time > meeting.stop_time {
        return Err(AppError::BadRequest("meeting ends before it starts".into()));
    }
    Ok(())
}

/// Schedule a meeting (status `OnHold`). Rejects overlapping time ranges.
pub async fn create(pool: &DbPool, committee_id: i64, meeting: &NewMeeting) -> Result<i64, AppError> {
    check_range(meeting)?;
    let mut tx = pool.begin().await?;

    let collides = MeetingFilter::Committee(committee_id).and(MeetingFilter::Overlap {
        start: meeting.start_time,
        stop: meeting.stop_time,
        except: Vec::new(),
    });
    if queries::exists(&mut tx, &collides).await? {
        return Err(AppError::Overlap);
    }

    let id = queries::insert(&mut tx, committee_id, meeting).await?;
    tx.commit().await?;
    Ok(id)
}

/// Reschedule a meeting that is not concluded yet.
pub async fn update(
    pool: &DbPool,
    meeting_id: i64,
    committee_id: i64,
    meeting: &NewMeeting,
) -> Result<(), AppError> {
    check_range(meeting)?;
    let mut tx = pool.begin().await?;

    let existing = queries::find_in_committee(&mut tx, meeting_id, committee_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.is_concluded() {
        return Err(AppError::MeetingConcluded);
    }

    let collides = MeetingFilter::Committee(committee_id).and(MeetingFilter::Overlap {
        start: meeting.start_time,
        stop: meeting.stop_time,
        except: vec![meeting_id],
    });
    if queries::exists(&mut tx, &collides).await? {
        return Err(AppError::Overlap);
    }

    if !queries::update_unless_concluded(&mut tx, meeting_id, meeting).await? {
        return Err(AppError::MeetingConcluded);
    }
    tx.commit().await?;
    Ok(())
}

/// Delete the given meetings of a committee, skipping concluded ones.
/// Returns the number deleted.
pub async fn delete(pool: &DbPool, committee_id: i64, meeting_ids: &[i64]) -> Result<usize, AppError> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;
    for &id in meeting_ids {
        if queries::find_in_committee(&mut tx, id, committee_id)
            .await?
            .is_none()
        {
            continue;
        }
        if queries::delete_unless_concluded(&mut tx, id).await? {
            deleted += 1;
        }
    }
    tx.commit().await?;
    Ok(deleted)
}

pub async fn find(pool: &DbPool, meeting_id: i64, committee_id: i64) -> Result<Meeting, AppError> {
    let mut conn = pool.acquire().await?;
    queries::find_in_committee(&mut conn, meeting_id, committee_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Meetings matching `filter`, newest first.
pub async fn list(
    pool: &DbPool,
    filter: &MeetingFilter,
    limit: Option<i64>,
) -> Result<Vec<Meeting>, AppError> {
    let mut conn = pool.acquire().await?;
    queries::find_filtered(&mut conn, filter, limit).await
}
