use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::session::{current_user, require_manager};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::{absence, committee, quorum};

use super::require_access;

const DEFAULT_OVERVIEW_LIMIT: i64 = 10;
const MAX_OVERVIEW_LIMIT: i64 = 100;

/// GET /committees: the committees visible to the user.
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    let current = current_user(&pool, &session).await?;
    let committees: Vec<_> = committee::find_all(&pool)
        .await?
        .into_iter()
        .filter(|c| current.user.is_admin || current.membership(c.id).is_some())
        .collect();
    Ok(HttpResponse::Ok().json(committees))
}

#[derive(Debug, Deserialize)]
pub struct NewCommitteeRequest {
    pub name: String,
    pub description: Option<String>,
}

/// POST /committees (admin only)
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<NewCommitteeRequest>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&pool, &session).await?;
    if !current.user.is_admin {
        return Err(AppError::PermissionDenied("creating committees".into()));
    }
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("committee name must not be empty".into()));
    }

    match committee::create(&pool, name, body.description.as_deref()).await? {
        Some(id) => Ok(HttpResponse::Created().json(serde_json::json!({ "id": id }))),
        None => Err(AppError::BadRequest(format!("committee {name:?} already exists"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub limit: Option<i64>,
}

/// GET /committees/{cid}/overview?limit=
pub async fn overview(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<OverviewQuery>,
) -> Result<HttpResponse, AppError> {
    let committee_id = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_access(&current, committee_id)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_OVERVIEW_LIMIT)
        .clamp(1, MAX_OVERVIEW_LIMIT);
    let overview = quorum::overview(&pool, committee_id, limit, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

#[derive(Debug, Deserialize)]
pub struct AbsenceRequest {
    pub nickname: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
}

/// POST /committees/{cid}/absences
pub async fn excuse(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<AbsenceRequest>,
) -> Result<HttpResponse, AppError> {
    let committee_id = path.into_inner();
    let current = current_user(&pool, &session).await?;
    require_manager(&current, committee_id)?;

    let id = absence::excuse(
        &pool,
        &body.nickname,
        committee_id,
        body.start_time,
        body.stop_time,
    )
    .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}
