//! Quorum of a meeting, derived from attendance and the status history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::attendance::{self, Attendees};
use crate::models::meeting::{self, Meeting, MeetingFilter};
use crate::models::membership::{self, Histories, MemberStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Quorum {
    /// Users with any status other than `NoMember`.
    pub total: usize,
    pub voting: usize,
    pub attending_voting: usize,
    pub non_voting: usize,
    pub member: usize,
}

impl Quorum {
    /// Count statuses in effect at `at`.
    pub fn tally(histories: &Histories, attendees: &Attendees, at: DateTime<Utc>) -> Self {
        let mut q = Quorum::default();
        for (nickname, history) in histories {
            match history.status_at(at) {
                MemberStatus::Voting => {
                    q.voting += 1;
                    if attendees.attended(nickname) {
                        q.attending_voting += 1;
                    }
                }
                MemberStatus::NonVoting => q.non_voting += 1,
                MemberStatus::Member => q.member += 1,
                MemberStatus::NoMember => continue,
            }
            q.total += 1;
        }
        q
    }

    /// Minimum number of attending voters.
    pub fn number(&self) -> usize {
        self.voting / 2 + 1
    }

    pub fn reached(&self) -> bool {
        self.attending_voting >= self.number()
    }

    pub fn report(self) -> QuorumReport {
        QuorumReport {
            number: self.number(),
            reached: self.reached(),
            quorum: self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuorumReport {
    #[serde(flatten)]
    pub quorum: Quorum,
    pub number: usize,
    pub reached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingOverview {
    pub meeting: Meeting,
    pub attendees: Vec<String>,
    /// `None` for gatherings.
    pub quorum: Option<QuorumReport>,
}

async fn quorum_of(
    conn: &mut SqliteConnection,
    meeting: &Meeting,
    histories: &Histories,
    now: DateTime<Utc>,
) -> Result<(Attendees, Option<QuorumReport>), AppError> {
    let attendees = attendance::queries::attendees(conn, meeting.id).await?;
    if meeting.gathering {
        return Ok((attendees, None));
    }
    let report = Quorum::tally(histories, &attendees, meeting.quorum_time(now)).report();
    Ok((attendees, Some(report)))
}

/// Quorum of a meeting as of its effective end. Gatherings have none.
pub async fn compute(
    pool: &DbPool,
    meeting_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<QuorumReport>, AppError> {
    let mut conn = pool.acquire().await?;
    let meeting = meeting::queries::find(&mut conn, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if meeting.gathering {
        return Ok(None);
    }
    let histories = membership::queries::load_histories(&mut conn, meeting.committee_id).await?;
    let (_, report) = quorum_of(&mut conn, &meeting, &histories, now).await?;
    Ok(report)
}

/// Attendees and quorum of the last `limit` meetings of a committee.
pub async fn overview(
    pool: &DbPool,
    committee_id: i64,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<MeetingOverview>, AppError> {
    let mut conn = pool.acquire().await?;
    let meetings =
        meeting::queries::find_filtered(&mut conn, &MeetingFilter::Committee(committee_id), Some(limit))
            .await?;
    let histories = membership::queries::load_histories(&mut conn, committee_id).await?;

    let mut out = Vec::with_capacity(meetings.len());
    for meeting in meetings {
        let (attendees, quorum) = quorum_of(&mut conn, &meeting, &histories, now).await?;
        let mut names: Vec<String> = attendees.nicknames().map(String::from).collect();
        names.sort();
        out.push(MeetingOverview {
            meeting,
            attendees: names,
            quorum,
        });
    }
    Ok(out)
}
