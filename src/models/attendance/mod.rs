//! Who attended which meeting, with the voting flag snapshotted at marking time.

pub mod queries;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::meeting::{self, Meeting, MeetingStatus};
use crate::models::membership::Role;
use crate::models::user;

/// Attendees of one meeting: nickname -> voting allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attendees(HashMap<String, bool>);

impl Attendees {
    /// `None` when absent, else whether the attendance counted as a vote.
    pub fn voting(&self, nickname: &str) -> Option<bool> {
        self.0.get(nickname).copied()
    }

    pub fn attended(&self, nickname: &str) -> bool {
        self.0.contains_key(nickname)
    }

    pub fn insert(&mut self, nickname: impl Into<String>, voting: bool) {
        self.0.insert(nickname.into(), voting);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nicknames(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, bool)> for Attendees {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Attendees(iter.into_iter().collect())
    }
}

/// Result of an attendance write. Callers treat both as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceOutcome {
    Applied,
    /// The record changed after `accept_time`; the write was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RollCallOutcome {
    pub applied: usize,
    pub superseded: usize,
}

async fn running_meeting(conn: &mut SqliteConnection, meeting_id: i64) -> Result<Meeting, AppError> {
    let meeting = meeting::queries::find(conn, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if meeting.status != MeetingStatus::Running {
        return Err(AppError::MeetingNotRunning);
    }
    Ok(meeting)
}

async fn apply(
    conn: &mut SqliteConnection,
    meeting_id: i64,
    nickname: &str,
    attending: bool,
    voting: bool,
    accept_time: DateTime<Utc>,
) -> Result<AttendanceOutcome, AppError> {
    if let Some(changed) = queries::changed_at(conn, meeting_id, nickname).await? {
        if changed > accept_time {
            log::debug!("race in attendance detected: meeting {meeting_id}, nickname {nickname}");
            return Ok(AttendanceOutcome::Superseded);
        }
    }

    if attending {
        queries::upsert(conn, meeting_id, nickname, voting).await?;
    } else {
        queries::remove(conn, meeting_id, nickname).await?;
    }
    Ok(AttendanceOutcome::Applied)
}

/// Mark `nickname` as attending (or not) a running meeting.
///
/// The voting flag is derived from the member's live status. A record changed
/// after `accept_time` is left alone and reported as `Superseded`.
pub async fn set_attendance(
    pool: &DbPool,
    meeting_id: i64,
    nickname: &str,
    attending: bool,
    accept_time: DateTime<Utc>,
) -> Result<AttendanceOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let meeting = running_meeting(&mut tx, meeting_id).await?;
    let member = user::queries::find_committee_member(&mut tx, meeting.committee_id, nickname)
        .await?
        .filter(|m| m.has_role(Role::Member))
        .ok_or_else(|| AppError::NotCommitteeMember(nickname.to_string()))?;

    let outcome = apply(
        &mut tx,
        meeting_id,
        nickname,
        attending,
        member.may_vote(),
        accept_time,
    )
    .await?;

    tx.commit().await?;
    Ok(outcome)
}

/// Apply a whole roll call in one transaction. Nicknames that are not
/// members of the committee are ignored.
pub async fn record_roll_call(
    pool: &DbPool,
    meeting_id: i64,
    attend: &[String],
    unattend: &[String],
    accept_time: DateTime<Utc>,
) -> Result<RollCallOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let meeting = running_meeting(&mut tx, meeting_id).await?;
    let roster: HashMap<String, bool> =
        user::queries::committee_roster(&mut tx, meeting.committee_id)
            .await?
            .into_iter()
            .filter(|m| m.has_role(Role::Member))
            .map(|m| {
                let voting = m.may_vote();
                (m.nickname, voting)
            })
            .collect();

    let marks = attend
        .iter()
        .map(|n| (n, true))
        .chain(unattend.iter().map(|n| (n, false)));

    let mut outcome = RollCallOutcome::default();
    for (nickname, attending) in marks {
        let Some(&voting) = roster.get(nickname) else {
            continue;
        };
        match apply(&mut tx, meeting_id, nickname, attending, voting, accept_time).await? {
            AttendanceOutcome::Applied => outcome.applied += 1,
            AttendanceOutcome::Superseded => outcome.superseded += 1,
        }
    }

    tx.commit().await?;
    Ok(outcome)
}

pub async fn attendees(pool: &DbPool, meeting_id: i64) -> Result<Attendees, AppError> {
    let mut conn = pool.acquire().await?;
    queries::attendees(&mut conn, meeting_id).await
}

pub async fn attended_meetings(pool: &DbPool, nickname: &str) -> Result<Vec<Meeting>, AppError> {
    let mut conn = pool.acquire().await?;
    queries::attended_meetings(&mut conn, nickname).await
}
