//! Voting status changes applied when a regular meeting concludes.
//!
//! Two consecutive absences of a voting member demote them to a plain member.
//! Two consecutive attendances of a plain member promote them to a voter.
//! `NonVoting` members are exempt, and excused absences are not strikes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::models::absence::{self, Absences};
use crate::models::attendance::{self, Attendees};
use crate::models::membership::{self, Histories, MemberStatus, Role};
use crate::models::user::{self, CommitteeMember};

use super::queries;
use super::types::Meeting;

/// The concluded meeting preceding the one being concluded.
pub struct PreviousMeeting<'a> {
    pub meeting: &'a Meeting,
    pub attendees: &'a Attendees,
}

/// Everything the planner looks at, loaded once per conclusion.
pub struct ConclusionInput<'a> {
    pub meeting: &'a Meeting,
    pub attendees: &'a Attendees,
    pub previous: Option<PreviousMeeting<'a>>,
    pub roster: &'a [CommitteeMember],
    pub histories: &'a Histories,
    pub absences: &'a Absences,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusPlan {
    /// Member -> Voting
    pub promotions: Vec<String>,
    /// Voting -> Member
    pub demotions: Vec<String>,
}

impl StatusPlan {
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty() && self.demotions.is_empty()
    }
}

fn status_at_end(histories: &Histories, nickname: &str, meeting: &Meeting) -> MemberStatus {
    histories
        .get(nickname)
        .map_or(MemberStatus::NoMember, |h| h.status_at(meeting.stop_time))
}

/// Decide promotions and demotions without touching storage.
pub fn plan(input: &ConclusionInput<'_>) -> StatusPlan {
    let mut plan = StatusPlan::default();

    // Two meetings are needed for any change.
    let Some(prev) = &input.previous else {
        return plan;
    };

    for member in input.roster {
        if !member.has_role(Role::Member) {
            continue;
        }
        let nickname = member.nickname.as_str();

        match member.status {
            MemberStatus::Voting => {
                if input.attendees.attended(nickname) || prev.attendees.attended(nickname) {
                    continue;
                }
                if status_at_end(input.histories, nickname, prev.meeting) != MemberStatus::Voting {
                    continue;
                }
                let excused = |m: &Meeting| {
                    input
                        .absences
                        .excused_from(nickname, m.start_time, m.stop_time)
                };
                if excused(input.meeting) || excused(prev.meeting) {
                    continue;
                }
                plan.demotions.push(member.nickname.clone());
            }
            MemberStatus::Member => {
                if input.attendees.voting(nickname) != Some(false)
                    || prev.attendees.voting(nickname) != Some(false)
                {
                    continue;
                }
                if status_at_end(input.histories, nickname, prev.meeting) != MemberStatus::Member {
                    continue;
                }
                plan.promotions.push(member.nickname.clone());
            }
            MemberStatus::NonVoting | MemberStatus::NoMember => {}
        }
    }

    plan
}

/// Load the inputs for `meeting`, plan, and write the changes at `effective_time`.
///
/// Runs inside the caller's transaction.
pub async fn on_conclusion(
    conn: &mut SqliteConnection,
    meeting: &Meeting,
    effective_time: DateTime<Utc>,
) -> Result<StatusPlan, AppError> {
    let Some(previous) = queries::previous_concluded(conn, meeting).await? else {
        return Ok(StatusPlan::default());
    };

    let attendees = attendance::queries::attendees(conn, meeting.id).await?;
    let prev_attendees = attendance::queries::attendees(conn, previous.id).await?;
    let roster = user::queries::committee_roster(conn, meeting.committee_id).await?;
    let histories = membership::queries::load_histories(conn, meeting.committee_id).await?;
    let absences = absence::for_committee(conn, meeting.committee_id).await?;

    let plan = plan(&ConclusionInput {
        meeting,
        attendees: &attendees,
        previous: Some(PreviousMeeting {
            meeting: &previous,
            attendees: &prev_attendees,
        }),
        roster: &roster,
        histories: &histories,
        absences: &absences,
    });

    let changes: Vec<(String, MemberStatus)> = plan
        .demotions
        .iter()
        .map(|n| (n.clone(), MemberStatus::Member))
        .chain(plan.promotions.iter().map(|n| (n.clone(), MemberStatus::Voting)))
        .collect();

    membership::queries::record_statuses(conn, meeting.committee_id, &changes, effective_time)
        .await?;

    for nickname in &plan.demotions {
        log::info!("meeting {}: {nickname} demoted to member", meeting.id);
    }
    for nickname in &plan.promotions {
        log::info!("meeting {}: {nickname} promoted to voting", meeting.id);
    }

    Ok(plan)
}
