use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

pub const GENERIC_FAILURE: &str = "An error occurred during analysis";

/// Why an analysis request ended without a result.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("{0}")]
    NoImage(&'static str),
    #[error("Invalid image format")]
    InvalidImage(String),
    #[error("No skin detected in the image")]
    NoSkinDetected { skin_ratio: f64 },
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl AnalysisError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::NoImage(_)
                | AnalysisError::InvalidImage(_)
                | AnalysisError::NoSkinDetected { .. }
        )
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE.to_string()
        }
    }
}

impl ResponseError for AnalysisError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
        })
    }
}

/// Errors raised while receiving a request, before or around the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Image exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Analysis(e) => e.status_code(),
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Analysis(e) => e.error_response(),
            ApiError::PayloadTooLarge { .. } => {
                HttpResponse::build(self.status_code()).json(ErrorResponse {
                    error: self.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request_with_their_message() {
        let err = AnalysisError::NoSkinDetected { skin_ratio: 0.0 };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No skin detected in the image");

        let err = AnalysisError::InvalidImage("bad magic".into());
        assert_eq!(err.public_message(), "Invalid image format");

        let err = AnalysisError::NoImage("No file selected");
        assert_eq!(err.public_message(), "No file selected");
    }

    #[test]
    fn server_errors_hide_their_detail() {
        for err in [
            AnalysisError::ModelUnavailable("/srv/model.onnx: missing".into()),
            AnalysisError::InferenceFailed("shape mismatch".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), GENERIC_FAILURE);
        }
    }

    #[test]
    fn oversized_upload_is_413() {
        let err = ApiError::PayloadTooLarge { limit: 10 };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
