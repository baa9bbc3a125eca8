use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    Hash(String),
    Session(String),
    NotFound,
    PermissionDenied(String),
    BadRequest(String),
    /// The committee already has a running meeting.
    AlreadyRunning,
    /// A later meeting of the committee is already concluded.
    NewerConcluded,
    MeetingConcluded,
    MeetingNotRunning,
    NotCommitteeMember(String),
    Overlap,
}

impl AppError {
    /// Expected, recoverable refusals that go back to the caller as a message.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyRunning
                | AppError::NewerConcluded
                | AppError::MeetingConcluded
                | AppError::MeetingNotRunning
                | AppError::NotCommitteeMember(_)
                | AppError::Overlap
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Migrate(e) => write!(f, "Migration error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::BadRequest(e) => write!(f, "Bad request: {e}"),
            AppError::AlreadyRunning => {
                write!(f, "Already have a running meeting in this committee.")
            }
            AppError::NewerConcluded => {
                write!(f, "A newer meeting of this committee is already concluded.")
            }
            AppError::MeetingConcluded => write!(f, "Concluded meetings cannot be changed."),
            AppError::MeetingNotRunning => write!(f, "The meeting is not running."),
            AppError::NotCommitteeMember(nickname) => {
                write!(f, "{nickname} is not a member of this committee.")
            }
            AppError::Overlap => {
                write!(f, "Time range collides with another meeting in this committee.")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            e if e.is_precondition() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{self}");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal Server Error" }));
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.to_string() }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Migrate(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconditions_map_to_conflict() {
        assert_eq!(AppError::AlreadyRunning.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NewerConcluded.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::NotCommitteeMember("bob".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn storage_errors_are_opaque() {
        let err = AppError::Db(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_precondition());
    }

    #[test]
    fn access_errors_keep_their_codes() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::PermissionDenied("meeting.status".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Session("no nickname".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
