//! Conversion of a finished dispatch response into an axum response.

use axum::response::IntoResponse;

use crate::dispatch::Response;

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let (status, headers, body) = self.into_parts();
        (status, headers, body).into_response()
    }
}
