use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;
use crate::utils::response::error as error_response;
use crate::validation::ScanError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Please capture or upload a QR image first.")]
    MissingScanInput,

    #[error("Please enter Conductor / Inspector ID.")]
    MissingOperatorId,

    #[error("No QR code detected. Please try again.")]
    NoCodeDetected,

    #[error("QR code format not recognized.")]
    UnrecognizedPayload,

    #[error("Storage error")]
    StorageError(#[from] StoreError),
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::MissingScanInput => AppError::MissingScanInput,
            ScanError::MissingOperatorId => AppError::MissingOperatorId,
            ScanError::NoCodeDetected => AppError::NoCodeDetected,
            ScanError::UnrecognizedPayload => AppError::UnrecognizedPayload,
            ScanError::Storage(e) => AppError::StorageError(e),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingScanInput
            | AppError::MissingOperatorId => StatusCode::BAD_REQUEST,
            AppError::NoCodeDetected | AppError::UnrecognizedPayload => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MissingScanInput => "MISSING_SCAN_INPUT",
            AppError::MissingOperatorId => "MISSING_OPERATOR_ID",
            AppError::NoCodeDetected => "NO_CODE_DETECTED",
            AppError::UnrecognizedPayload => "UNRECOGNIZED_PAYLOAD",
            AppError::StorageError(_) => "STORAGE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::StorageError(e) => {
                error!(error = ?e, "Storage error");
            }
            _ => {
                warn!(code = self.code(), "Scan refused");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Internal details stay in the logs
        let public_message = match &self {
            AppError::StorageError(_) => {
                "The scan could not be recorded. Please try again.".to_string()
            }
            other => other.to_string(),
        };

        error_response(code, public_message, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_errors_map_to_client_errors() {
        let cases = [
            (ScanError::MissingScanInput, StatusCode::BAD_REQUEST, "MISSING_SCAN_INPUT"),
            (ScanError::MissingOperatorId, StatusCode::BAD_REQUEST, "MISSING_OPERATOR_ID"),
            (ScanError::NoCodeDetected, StatusCode::UNPROCESSABLE_ENTITY, "NO_CODE_DETECTED"),
            (
                ScanError::UnrecognizedPayload,
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNRECOGNIZED_PAYLOAD",
            ),
        ];

        for (scan_error, status, code) in cases {
            let app_error = AppError::from(scan_error);
            assert_eq!(app_error.status_code(), status);
            assert_eq!(app_error.code(), code);
        }
    }

    #[test]
    fn test_storage_failure_is_server_error() {
        let err = AppError::from(ScanError::Storage(StoreError::DuplicateScanId("T1-1".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "STORAGE_ERROR");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
