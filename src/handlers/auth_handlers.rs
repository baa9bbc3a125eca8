use std::net::{IpAddr, Ipv4Addr};

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::auth::password;
use crate::auth::session::{NICKNAME_KEY, current_user};
use crate::auth::throttle::LoginThrottle;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub nickname: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    session: Session,
    throttle: web::Data<LoginThrottle>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if throttle.is_blocked(ip) {
        return Ok(HttpResponse::TooManyRequests().json(serde_json::json!({
            "error": "Too many failed login attempts. Please try again later."
        })));
    }

    let hash = {
        let mut conn = pool.acquire().await?;
        user::queries::password_hash(&mut conn, &body.nickname).await?
    };

    let verified = password::verify_login(&body.password, hash.as_deref());
    if !verified {
        throttle.record_failure(ip);
        return Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Invalid nickname or password" })));
    }

    throttle.clear(ip);
    session.renew();
    session
        .insert(NICKNAME_KEY, &body.nickname)
        .map_err(|e| AppError::Session(e.to_string()))?;

    let current = current_user(&pool, &session).await?;
    Ok(HttpResponse::Ok().json(current))
}

/// POST /logout
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// GET /me
pub async fn me(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    let current = current_user(&pool, &session).await?;
    Ok(HttpResponse::Ok().json(current))
}
