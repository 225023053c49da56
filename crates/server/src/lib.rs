use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use engine::EngineError;
use serde::Serialize;

pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod cron;
mod server;

pub enum ServerError {
    Unauthorized,
    Job(EngineError),
}

#[derive(Serialize)]
struct AuthError {
    error: String,
}

#[derive(Serialize)]
struct JobFailure {
    success: bool,
    error: String,
    timestamp: chrono::DateTime<Utc>,
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(AuthError {
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response(),
            // Per-transaction failures never reach here; an error means the
            // run itself (candidate selection) fell over.
            ServerError::Job(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JobFailure {
                    success: false,
                    error: message_for_engine_error(err),
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Job(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn job_error_maps_to_500() {
        let res = ServerError::from(EngineError::Gateway("boom".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_details_are_not_leaked() {
        let err = EngineError::Database(sea_orm_db_err());
        assert_eq!(message_for_engine_error(err), "internal server error");
    }

    fn sea_orm_db_err() -> sea_orm::DbErr {
        sea_orm::DbErr::Custom("secret connection string".to_string())
    }
}
