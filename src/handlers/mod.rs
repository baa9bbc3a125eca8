pub mod attendance_handlers;
pub mod auth_handlers;
pub mod committee_handlers;
pub mod meeting_handlers;
pub mod member_handlers;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};

use crate::errors::AppError;
use crate::models::user::CurrentUser;

/// Rejects mutations that are not sent as JSON.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Members of a committee and its managers may read its data.
pub(crate) fn require_access(current: &CurrentUser, committee_id: i64) -> Result<(), AppError> {
    if current.may_manage(committee_id) || current.membership(committee_id).is_some() {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "reading committee {committee_id}"
        )))
    }
}

/// Routes that need a logged-in user. Wrap with `require_auth`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(auth_handlers::me));
    cfg.service(
        web::scope("/users")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::post().to(member_handlers::create_user)),
    );
    cfg.service(
        web::scope("/committees")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(committee_handlers::list))
            .route("", web::post().to(committee_handlers::create))
            .route("/{cid}/overview", web::get().to(committee_handlers::overview))
            .route("/{cid}/absences", web::post().to(committee_handlers::excuse))
            .route("/{cid}/meetings", web::get().to(meeting_handlers::list))
            .route("/{cid}/meetings", web::post().to(meeting_handlers::create))
            .route("/{cid}/meetings/{mid}", web::put().to(meeting_handlers::update))
            .route("/{cid}/meetings/{mid}", web::delete().to(meeting_handlers::delete))
            .route("/{cid}/meetings/{mid}/status", web::post().to(meeting_handlers::change_status))
            .route("/{cid}/meetings/{mid}/quorum", web::get().to(meeting_handlers::quorum))
            .route("/{cid}/meetings/{mid}/attendance", web::post().to(attendance_handlers::set))
            .route("/{cid}/meetings/{mid}/roll-call", web::post().to(attendance_handlers::roll_call))
            .route("/{cid}/members/{nickname}", web::put().to(member_handlers::set_membership))
            .route("/{cid}/members/{nickname}/status", web::get().to(member_handlers::status_at)),
    );
}
