//! JSON responses and error mapping for the HTTP surface
//!
//! This is the only place manager errors become status codes.

use crate::ManagerError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// JSON body sent with `application/json; charset=utf-8`
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, &self.0)
    }
}

/// `{"message": ...}` with status 200
pub fn info(message: impl Into<String>) -> ApiJson<serde_json::Value> {
    ApiJson(serde_json::json!({ "message": message.into() }))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            let body = serde_json::json!({ "msg": e.to_string() }).to_string();
            let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
            response
        }
    }
}

/// A manager error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ManagerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ManagerError::NotFound(_) => StatusCode::NOT_FOUND,
            ManagerError::InvalidWorker(_) | ManagerError::Malformed(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::warn!(kind = self.0.kind(), error = %message, "Request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %message, "Request rejected");
        }

        json_response(status, &serde_json::json!({ "msg": message }))
    }
}
