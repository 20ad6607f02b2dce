//! Response construction for dispatch outcomes.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Redirect to `location` with the given status (301 or 302).
pub fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            bad_gateway("Invalid redirect target")
        }
    }
}

/// No rule and nowhere to pass the request.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Upstream missing or failed.
pub fn bad_gateway(message: &'static str) -> Response {
    (StatusCode::BAD_GATEWAY, message).into_response()
}
