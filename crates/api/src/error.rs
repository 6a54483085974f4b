//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use ledgerflow_core::engine::{Disposition, EngineError};
use ledgerflow_shared::AppError;

/// An error rendered as `{"error", "message"}` with an HTTP status.
///
/// Engine errors also carry their disposition so clients can tell a retryable
/// failure from one that needs a rule or account fixed first.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    disposition: Option<Disposition>,
}

impl ApiError {
    /// Returns the HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error code of the response.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self {
            status: status_from(err.http_status_code()),
            code: err.error_code(),
            message: err.to_string(),
            disposition: Some(err.disposition()),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let disposition = err.is_retryable().then_some(Disposition::RetrySafe);
        Self {
            status: status_from(err.status_code()),
            code: err.error_code(),
            message: err.to_string(),
            disposition,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "Request failed");
        } else {
            warn!(code = self.code, message = %self.message, "Request rejected");
        }

        let mut body = json!({
            "error": self.code,
            "message": self.message,
        });
        if let Some(disposition) = self.disposition {
            body["disposition"] = json!(disposition.as_str());
            body["retryable"] = json!(disposition == Disposition::RetrySafe);
        }

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::engine::StoreError;
    use ledgerflow_core::workflow::WorkflowError;
    use ledgerflow_shared::types::JournalEntryId;

    #[test]
    fn test_store_conflict_is_retryable() {
        let err = ApiError::from(EngineError::Store(StoreError::Conflict("deadlock".into())));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.disposition, Some(Disposition::RetrySafe));
    }

    #[test]
    fn test_already_reversed_is_rejected() {
        let err = ApiError::from(EngineError::Workflow(WorkflowError::AlreadyReversed {
            entry_id: JournalEntryId::new(),
            reversed_by: Some(JournalEntryId::new()),
        }));
        assert_eq!(err.disposition, Some(Disposition::Rejected));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_app_validation_maps_to_bad_request() {
        let err = ApiError::from(AppError::Validation("bad date".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.disposition, None);
    }
}
