use serde::Serialize;

use crate::models::membership::{MemberStatus, Role};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub nickname: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub is_admin: bool,
}

/// New user data for creation. `password_hash` is already hashed.
pub struct NewUser {
    pub nickname: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub is_admin: bool,
    pub password_hash: Option<String>,
}

/// Roles and live status of a user in one committee.
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub committee_id: i64,
    pub committee_name: String,
    pub roles: Vec<Role>,
    pub status: MemberStatus,
}

/// The acting user together with all committee memberships.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: User,
    pub memberships: Vec<Membership>,
}

impl CurrentUser {
    pub fn membership(&self, committee_id: i64) -> Option<&Membership> {
        self.memberships
            .iter()
            .find(|m| m.committee_id == committee_id)
    }

    pub fn has_role(&self, committee_id: i64, role: Role) -> bool {
        self.membership(committee_id)
            .is_some_and(|m| m.roles.contains(&role))
    }

    /// Admins, chairs and secretaries may schedule meetings and take the roll.
    pub fn may_manage(&self, committee_id: i64) -> bool {
        self.user.is_admin
            || self.has_role(committee_id, Role::Chair)
            || self.has_role(committee_id, Role::Secretary)
    }

    pub fn is_member(&self, committee_id: i64) -> bool {
        self.has_role(committee_id, Role::Member)
    }
}

/// One entry of a committee roster: roles and live status.
#[derive(Debug, Clone, Serialize)]
pub struct CommitteeMember {
    pub nickname: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub roles: Vec<Role>,
    pub status: MemberStatus,
}

impl CommitteeMember {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether an attendance taken now counts as a vote.
    pub fn may_vote(&self) -> bool {
        self.has_role(Role::Member) && self.status == MemberStatus::Voting
    }
}
