use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::auth::session::{current_user, require_manager};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::membership::{self, MemberStatus, Role};
use crate::models::user;

use super::require_access;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub nickname: String,
    pub committee_id: i64,
    pub at: DateTime<Utc>,
    pub status: MemberStatus,
}

/// GET /committees/{cid}/members/{nickname}/status?at=
pub async fn status_at(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, String)>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, nickname) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_access(&current, committee_id)?;

    let at = query.at.unwrap_or_else(Utc::now);
    let status = membership::status_at(&pool, &nickname, committee_id, at).await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        nickname,
        committee_id,
        at,
        status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub roles: Vec<Role>,
    pub status: MemberStatus,
    pub since: Option<DateTime<Utc>>,
}

/// PUT /committees/{cid}/members/{nickname}
pub async fn set_membership(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, String)>,
    body: web::Json<MembershipRequest>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, nickname) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    let since = body.since.unwrap_or_else(Utc::now);
    user::set_membership(&pool, &nickname, committee_id, &body.roles, body.status, since).await?;
    let roster = user::committee_roster(&pool, committee_id).await?;
    match roster.into_iter().find(|m| m.nickname == nickname) {
        Some(entry) => Ok(HttpResponse::Ok().json(entry)),
        // no roles left in the committee
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    pub nickname: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub password: String,
}

/// POST /users (admin only)
pub async fn create_user(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<NewUserRequest>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&pool, &session).await?;
    if !current.user.is_admin {
        return Err(AppError::PermissionDenied("creating users".into()));
    }
    let nickname = body.nickname.trim();
    if nickname.is_empty() {
        return Err(AppError::BadRequest("nickname must not be empty".into()));
    }

    let new_user = user::NewUser {
        nickname: nickname.to_string(),
        firstname: body.firstname.clone(),
        lastname: body.lastname.clone(),
        is_admin: body.is_admin,
        password_hash: Some(password::hash_password(&body.password)?),
    };
    if !user::create(&pool, &new_user).await? {
        return Err(AppError::BadRequest(format!("nickname {nickname:?} is taken")));
    }
    Ok(HttpResponse::Created().json(serde_json::json!({ "nickname": nickname })))
}
