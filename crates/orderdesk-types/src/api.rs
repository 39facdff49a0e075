//! API types for the orderdesk HTTP entry point.
//!
//! Every reply has the same envelope: a `status` of `success` or `error`, plus
//! either the success payload or a human-readable `message`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome marker carried in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
	Success,
	Error,
}

/// Reply returned to the web front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
	pub status: ResponseStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl ApiResponse {
	/// Success reply for a created checkout session.
	pub fn checkout_created(session_id: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			status: ResponseStatus::Success,
			message: None,
			session_id: Some(session_id.into()),
			url: Some(url.into()),
		}
	}

	/// Success reply for a recorded order.
	pub fn recorded() -> Self {
		Self {
			status: ResponseStatus::Success,
			message: Some("Order recorded successfully".to_string()),
			session_id: None,
			url: None,
		}
	}

	/// Error reply carrying `message`.
	pub fn error(message: impl Into<String>) -> Self {
		Self {
			status: ResponseStatus::Error,
			message: Some(message.into()),
			session_id: None,
			url: None,
		}
	}

	pub fn is_success(&self) -> bool {
		self.status == ResponseStatus::Success
	}
}

/// Structured API error type with HTTP status mapping.
///
/// The body is always an [`ApiResponse`] with `status: "error"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum APIError {
	/// Malformed or incomplete request (400)
	BadRequest { message: String },
	/// Upstream provider rejected or failed the call (502)
	BadGateway { message: String },
	/// Misconfiguration or local failure (500)
	InternalServerError { message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::BadGateway { .. } => 502,
			APIError::InternalServerError { .. } => 500,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			APIError::BadRequest { message }
			| APIError::BadGateway { message }
			| APIError::InternalServerError { message } => message,
		}
	}

	/// Convert to the reply envelope.
	pub fn to_response(&self) -> ApiResponse {
		ApiResponse::error(self.message())
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message } => write!(f, "Bad Request: {}", message),
			APIError::BadGateway { message } => write!(f, "Bad Gateway: {}", message),
			APIError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_response())).into_response()
	}
}
