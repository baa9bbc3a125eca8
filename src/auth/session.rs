use actix_session::Session;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::{self, CurrentUser};

pub const NICKNAME_KEY: &str = "nickname";

pub fn get_nickname(session: &Session) -> Result<String, AppError> {
    match session.get::<String>(NICKNAME_KEY) {
        Ok(Some(nickname)) => Ok(nickname),
        Ok(None) => Err(AppError::Session("No nickname in session".to_string())),
        Err(e) => Err(AppError::Session(format!("Session error: {e}"))),
    }
}

/// The acting user with memberships. A session for a deleted user is purged.
pub async fn current_user(pool: &DbPool, session: &Session) -> Result<CurrentUser, AppError> {
    let nickname = get_nickname(session)?;
    match user::find_with_memberships(pool, &nickname).await? {
        Some(current) => Ok(current),
        None => {
            session.purge();
            Err(AppError::Session(format!("Unknown user {nickname}")))
        }
    }
}

/// Require chair, secretary or admin rights on the committee.
pub fn require_manager(current: &CurrentUser, committee_id: i64) -> Result<(), AppError> {
    if current.may_manage(committee_id) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "managing committee {committee_id}"
        )))
    }
}
