use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::session::{current_user, require_manager};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::meeting::{self, MeetingFilter, MeetingStatus, NewMeeting};
use crate::models::quorum;

use super::require_access;

/// GET /committees/{cid}/meetings
pub async fn list(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let committee_id = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_access(&current, committee_id)?;

    let meetings = meeting::list(&pool, &MeetingFilter::Committee(committee_id), None).await?;
    Ok(HttpResponse::Ok().json(meetings))
}

/// POST /committees/{cid}/meetings
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<NewMeeting>,
) -> Result<HttpResponse, AppError> {
    let committee_id = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    let id = meeting::create(&pool, committee_id, &body).await?;
    let created = meeting::find(&pool, id, committee_id).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /committees/{cid}/meetings/{mid}
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
    body: web::Json<NewMeeting>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    meeting::update(&pool, meeting_id, committee_id, &body).await?;
    let updated = meeting::find(&pool, meeting_id, committee_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /committees/{cid}/meetings/{mid}
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    let existing = meeting::find(&pool, meeting_id, committee_id).await?;
    if existing.is_concluded() {
        return Err(AppError::MeetingConcluded);
    }
    meeting::delete(&pool, committee_id, &[meeting_id]).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MeetingStatus,
}

/// POST /committees/{cid}/meetings/{mid}/status
pub async fn change_status(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    let existing = meeting::find(&pool, meeting_id, committee_id).await?;
    let effective_time = existing.effective_end(Utc::now());

    let change =
        meeting::change_status(&pool, meeting_id, committee_id, body.status, effective_time)
            .await?;
    Ok(HttpResponse::Ok().json(change))
}

/// GET /committees/{cid}/meetings/{mid}/quorum
pub async fn quorum(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (committee_id, meeting_id) = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_access(&current, committee_id)?;

    // Confirms the meeting belongs to the committee.
    meeting::find(&pool, meeting_id, committee_id).await?;
    let report = quorum::compute(&pool, meeting_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "quorum": report })))
}
