use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp::from_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    OnHold,
    Running,
    Concluded,
}

impl MeetingStatus {
    pub fn code(self) -> i64 {
        match self {
            MeetingStatus::OnHold => 0,
            MeetingStatus::Running => 1,
            MeetingStatus::Concluded => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MeetingStatus::OnHold),
            1 => Some(MeetingStatus::Running),
            2 => Some(MeetingStatus::Concluded),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeetingStatus::OnHold => "on_hold",
            MeetingStatus::Running => "running",
            MeetingStatus::Concluded => "concluded",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onhold" | "on_hold" | "on-hold" => Ok(MeetingStatus::OnHold),
            "running" => Ok(MeetingStatus::Running),
            "concluded" => Ok(MeetingStatus::Concluded),
            other => Err(format!("invalid meeting status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meeting {
    pub id: i64,
    pub committee_id: i64,
    /// Gatherings never touch voting status and carry no quorum.
    pub gathering: bool,
    pub status: MeetingStatus,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub description: Option<String>,
    /// Effective conclusion time, set when the meeting concludes.
    pub concluded_at: Option<DateTime<Utc>>,
}

impl Meeting {
    /// `now` while strictly inside the scheduled window, the scheduled stop otherwise.
    pub fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.start_time < now && now < self.stop_time {
            now
        } else {
            self.stop_time
        }
    }

    /// Instant the quorum of this meeting is evaluated at.
    pub fn quorum_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.concluded_at.unwrap_or_else(|| self.effective_end(now))
    }

    pub fn is_concluded(&self) -> bool {
        self.status == MeetingStatus::Concluded
    }
}

/// Data for scheduling or rescheduling a meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMeeting {
    #[serde(default)]
    pub gathering: bool,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct MeetingRow {
    pub id: i64,
    pub committee_id: i64,
    pub gathering: bool,
    pub status: i64,
    pub start_time: i64,
    pub stop_time: i64,
    pub description: Option<String>,
    pub concluded_at: Option<i64>,
}

pub(crate) const MEETING_COLUMNS: &str =
    "id, committee_id, gathering, status, start_time, stop_time, description, concluded_at";

impl TryFrom<MeetingRow> for Meeting {
    type Error = sqlx::Error;

    fn try_from(row: MeetingRow) -> Result<Self, Self::Error> {
        let status = MeetingStatus::from_code(row.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid meeting status code {}", row.status).into())
        })?;
        Ok(Meeting {
            id: row.id,
            committee_id: row.committee_id,
            gathering: row.gathering,
            status,
            start_time: from_millis(row.start_time),
            stop_time: from_millis(row.stop_time),
            description: row.description,
            concluded_at: row.concluded_at.map(from_millis),
        })
    }
}
