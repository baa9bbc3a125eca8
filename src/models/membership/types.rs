use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Voting status of a user in a committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Member without a vote.
    Member,
    Voting,
    /// Persistent non-voter, exempt from strikes.
    NonVoting,
    /// Not (or no longer) a member.
    NoMember,
}

impl MemberStatus {
    pub fn code(self) -> i64 {
        match self {
            MemberStatus::Member => 0,
            MemberStatus::Voting => 1,
            MemberStatus::NonVoting => 2,
            MemberStatus::NoMember => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MemberStatus::Member),
            1 => Some(MemberStatus::Voting),
            2 => Some(MemberStatus::NonVoting),
            3 => Some(MemberStatus::NoMember),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Member => "member",
            MemberStatus::Voting => "voting",
            MemberStatus::NonVoting => "non_voting",
            MemberStatus::NoMember => "no_member",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "member" => Ok(MemberStatus::Member),
            "voting" => Ok(MemberStatus::Voting),
            "non_voting" | "nonvoting" | "non-voting" => Ok(MemberStatus::NonVoting),
            "no_member" | "nomember" => Ok(MemberStatus::NoMember),
            other => Err(format!("invalid member status {other:?}")),
        }
    }
}

/// Role of a user in a committee. Roles gate permissions, not quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Chair,
    Secretary,
}

impl Role {
    pub fn code(self) -> i64 {
        match self {
            Role::Member => 0,
            Role::Chair => 1,
            Role::Secretary => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Role::Member),
            1 => Some(Role::Chair),
            2 => Some(Role::Secretary),
            _ => None,
        }
    }

    /// Parse the comma separated role codes produced by `GROUP_CONCAT`.
    pub fn parse_codes(csv: &str) -> Vec<Role> {
        let mut roles: Vec<Role> = csv
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .filter_map(Role::from_code)
            .collect();
        roles.sort_by_key(|r| r.code());
        roles.dedup();
        roles
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "chair" => Ok(Role::Chair),
            "secretary" => Ok(Role::Secretary),
            other => Err(format!("invalid role {other:?}")),
        }
    }
}

/// A point in time from which on `status` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub since: DateTime<Utc>,
    pub status: MemberStatus,
}
