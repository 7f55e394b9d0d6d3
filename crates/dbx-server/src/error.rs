//! Mapping of explorer errors onto HTTP responses

use crate::types::ErrorResponse;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub struct AppError(dbx_core::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        use dbx_core::Error;
        match &self.0 {
            Error::UnknownTable(_) | Error::UnknownColumn { .. } => StatusCode::NOT_FOUND,
            Error::ForbiddenQuery(_) | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text; engine messages go out untouched
    pub fn message(&self) -> String {
        match &self.0 {
            dbx_core::Error::Execution(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<dbx_core::Error> for AppError {
    fn from(err: dbx_core::Error) -> Self {
        AppError(err)
    }
}

/// Malformed query strings share the `{"error"}` body of every other 400
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(dbx_core::Error::InvalidArgument(rejection.body_text()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(dbx_core::Error::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbx_core::{Error, QueryRejection as Rejection};

    fn status_of(err: Error) -> StatusCode {
        AppError::from(err).status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(Error::UnknownTable("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(Error::UnknownColumn {
                table: "faq".into(),
                column: "x".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::ForbiddenQuery(Rejection::NotSelect)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::InvalidArgument("limit".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::Connection("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(Error::Execution("syntax error".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::Other(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_execution_message_is_verbatim() {
        let err = AppError::from(Error::Execution("near \"SELEC\": syntax error".into()));
        assert_eq!(err.message(), "near \"SELEC\": syntax error");

        let err = AppError::from(Error::ForbiddenQuery(Rejection::ForbiddenKeyword("drop")));
        assert!(err.message().contains("'drop'"));
    }
}
