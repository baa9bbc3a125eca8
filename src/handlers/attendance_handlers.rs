use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::session::{current_user, require_manager};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::attendance;
use crate::models::meeting;

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    /// Defaults to the acting user.
    pub nickname: Option<String>,
    pub attending: bool,
    /// When the client rendered the state it is changing.
    pub accept_time: DateTime<Utc>,
}

/// POST /committees/{cid}/meetings/{mid}/attendance
///
/// Members mark themselves; managers may mark anyone.
pub async fn set(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
    body: web::Json<AttendanceRequest>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;

    let nickname = body
        .nickname
        .clone()
        .unwrap_or_else(|| current.user.nickname.clone());
    if nickname != current.user.nickname {
        require_manager(&current, committee_id)?;
    }

    meeting::find(&pool, meeting_id, committee_id).await?;
    let outcome = attendance::set_attendance(
        &pool,
        meeting_id,
        &nickname,
        body.attending,
        body.accept_time,
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "outcome": outcome })))
}

#[derive(Debug, Deserialize)]
pub struct RollCallRequest {
    #[serde(default)]
    pub attend: Vec<String>,
    #[serde(default)]
    pub unattend: Vec<String>,
    pub accept_time: DateTime<Utc>,
}

/// POST /committees/{cid}/meetings/{mid}/roll-call
pub async fn roll_call(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
    body: web::Json<RollCallRequest>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    meeting::find(&pool, meeting_id, committee_id).await?;
    let outcome = attendance::record_roll_call(
        &pool,
        meeting_id,
        &body.attend,
        &body.unattend,
        body.accept_time,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
