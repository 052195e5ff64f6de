use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please include request body")]
    MissingBody,

    /// Schema failure. The body is the bare message, not an object.
    #[error("{message}")]
    Rejected { message: String, status: StatusCode },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// The store failed. Only `message` reaches the client.
    #[error("{message}")]
    DataAccess { message: &'static str, cause: anyhow::Error },

    /// Anything that reaches the terminal handler, with the status it declared.
    #[error("{source}")]
    Unhandled { status: StatusCode, source: anyhow::Error },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            MissingBody => StatusCode::BAD_REQUEST,
            Rejected { status, .. } => *status,
            NotFound(_) => StatusCode::NOT_FOUND,
            Forbidden(_) => StatusCode::FORBIDDEN,
            DataAccess { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Unhandled { status, .. } => *status,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Rejected { message, .. } => (status, Json(message)).into_response(),
            AppError::DataAccess { message, cause } => {
                error!(error = ?cause, "{message}");
                (status, message_body(message)).into_response()
            }
            AppError::Unhandled { source, .. } => {
                if status.is_server_error() {
                    error!(error = ?source, "unhandled error");
                } else {
                    warn!(error = %source, %status, "request refused");
                }
                (status, message_body(source.to_string())).into_response()
            }
            other => (status, message_body(other.to_string())).into_response(),
        }
    }
}

/// `{ "message": ... }`, the shape of every non-schema error body.
pub fn message_body<M: Serialize>(message: M) -> Json<Value> {
    Json(json!({ "message": message }))
}

pub trait OrRespond<T> {
    fn or_respond(self, message: &'static str) -> AppResult<T>;
}

impl<T, E> OrRespond<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_respond(self, message: &'static str) -> AppResult<T> {
        self.map_err(|err| AppError::DataAccess { message, cause: err.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn data_access_hides_the_cause() {
        let err: AppResult<()> = Err(sqlx::Error::RowNotFound).or_respond("Error adding the hub");
        let (status, body) = body_of(err.unwrap_err()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Error adding the hub" }));
    }

    #[tokio::test]
    async fn rejected_is_a_bare_string() {
        let (status, body) = body_of(AppError::Rejected {
            message: "name has to be 3 chars long".to_owned(),
            status: StatusCode::OK,
        }).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("name has to be 3 chars long"));
    }

    #[tokio::test]
    async fn unhandled_keeps_its_message() {
        let (status, body) = body_of(AppError::Unhandled {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            source: anyhow::anyhow!("boom"),
        }).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "boom" }));

        let (status, body) = body_of(AppError::Unhandled {
            status: StatusCode::BAD_REQUEST,
            source: anyhow::anyhow!("EOF while parsing"),
        }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "EOF while parsing" }));
    }

    #[test]
    fn statuses() {
        assert_eq!(AppError::MissingBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Unhandled { status: StatusCode::PAYLOAD_TOO_LARGE, source: anyhow::anyhow!("x") }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
