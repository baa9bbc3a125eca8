pub mod queries;
pub mod types;

pub use types::*;

use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::membership::{self, MemberStatus, Role};

pub async fn create(pool: &DbPool, user: &NewUser) -> Result<bool, AppError> {
    let mut conn = pool.acquire().await?;
    queries::create(&mut conn, user).await
}

pub async fn find(pool: &DbPool, nickname: &str) -> Result<Option<User>, AppError> {
    let mut conn = pool.acquire().await?;
    queries::find(&mut conn, nickname).await
}

/// Load the acting user with roles and live status per committee.
pub async fn find_with_memberships(
    pool: &DbPool,
    nickname: &str,
) -> Result<Option<CurrentUser>, AppError> {
    let mut conn = pool.acquire().await?;
    let Some(user) = queries::find(&mut conn, nickname).await? else {
        return Ok(None);
    };
    let memberships = queries::memberships(&mut conn, nickname).await?;
    Ok(Some(CurrentUser { user, memberships }))
}

pub async fn committee_roster(
    pool: &DbPool,
    committee_id: i64,
) -> Result<Vec<CommitteeMember>, AppError> {
    let mut conn = pool.acquire().await?;
    queries::committee_roster(&mut conn, committee_id).await
}

/// Replace the user's roles in a committee and record their status.
///
/// Holding the `Member` role records `status`; losing it records `NoMember`.
pub async fn set_membership(
    pool: &DbPool,
    nickname: &str,
    committee_id: i64,
    roles: &[Role],
    status: MemberStatus,
    since: DateTime<Utc>,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    if queries::find(&mut tx, nickname).await?.is_none() {
        return Err(AppError::NotFound);
    }

    queries::replace_roles(&mut tx, nickname, committee_id, roles).await?;

    if roles.contains(&Role::Member) {
        membership::queries::record_status(&mut tx, nickname, committee_id, status, since)
            .await?;
    } else if membership::queries::latest_status(&mut tx, nickname, committee_id)
        .await?
        .is_some()
    {
        membership::queries::record_status(
            &mut tx,
            nickname,
            committee_id,
            MemberStatus::NoMember,
            since,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
