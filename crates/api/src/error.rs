//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::TripError;
use runtime::AskError;
use serde::Serialize;

/// API-level error that maps to an HTTP response.
///
/// Domain rejections carry a stable machine-readable code; transport
/// failures (timeout, terminated instance) mean the outcome is unknown
/// and surface as 503 rather than any domain status.
#[derive(Debug)]
pub struct ApiError(AskError);

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self.0 {
            AskError::Domain(error) => (domain_status(&error), error.code(), error.to_string()),
            transport @ (AskError::Timeout | AskError::Terminated) => {
                tracing::error!(error = %transport, "command outcome unknown");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    transport.to_string(),
                )
            }
        };

        (status, axum::Json(ErrorBody { code, message })).into_response()
    }
}

fn domain_status(error: &TripError) -> StatusCode {
    match error {
        TripError::BadRequest(_) => StatusCode::BAD_REQUEST,
        TripError::NotFound(_) => StatusCode::NOT_FOUND,
        TripError::SoldOut | TripError::NotEnoughCapacity => StatusCode::FORBIDDEN,
        TripError::Conflict(_) => StatusCode::CONFLICT,
    }
}

impl From<AskError> for ApiError {
    fn from(error: AskError) -> Self {
        ApiError(error)
    }
}
