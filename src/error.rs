use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{mail, storage};

/// The body of every failed response.
///
/// The HTTP status is repeated in `status`. Client errors carry a `message`,
/// server errors carry an `error`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
	pub status: u16,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<Cow<'static, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl ErrorBody {
	fn respond(self) -> Response<Body> {
		let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		(status, Json(self)).into_response()
	}
}

/// Describes how a route-specific error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	/// The message sent to the client. Defaults to the [`std::fmt::Display`] output,
	/// so variants should not contain sensitive information.
	fn message(&self) -> Cow<'static, str> {
		self.to_string().into()
	}
}

/// Errors shared by every route.
///
/// The Display output of server-side variants is passed through to the client
/// in the `error` field.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid request body")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("{0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("token error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("password hashing error: {0}")]
	Hash(#[from] argon2::Error),
	#[error("upload error: {0}")]
	Upload(#[from] storage::Error),
	#[error("mail error: {0}")]
	Mail(#[from] mail::Error),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) => StatusCode::BAD_REQUEST,
			Self::Database(..)
			| Self::Token(..)
			| Self::Hash(..)
			| Self::Upload(..)
			| Self::Mail(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		let body = match self {
			Self::Validation(errors) => ErrorBody {
				status: status.as_u16(),
				message: Some(
					errors
						.field_errors()
						.into_iter()
						.flat_map(|(field, errors)| {
							errors.iter().map(move |error| format!("{field}: {error}"))
						})
						.collect::<Vec<_>>()
						.join(", ")
						.into(),
				),
				error: None,
			},
			error if status.is_client_error() => ErrorBody {
				status: status.as_u16(),
				message: Some(error.to_string().into()),
				error: None,
			},
			error => {
				tracing::error!(%error, "request failed");

				ErrorBody {
					status: status.as_u16(),
					message: None,
					error: Some(error.to_string()),
				}
			}
		};

		body.respond()
	}
}

/// The error returned by handlers: either one of the route's own errors,
/// or an [`AppError`].
#[derive(Debug)]
pub enum RouteError<T> {
	Route(T),
	App(AppError),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! from_app_error {
	($($ty:ty),* $(,)?) => {
		$(
			impl<T> From<$ty> for RouteError<T> {
				fn from(error: $ty) -> Self {
					Self::App(error.into())
				}
			}
		)*
	};
}

from_app_error!(
	sqlx::Error,
	jsonwebtoken::errors::Error,
	argon2::Error,
	storage::Error,
	mail::Error,
);

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "request failed");
				}

				ErrorBody {
					status: status.as_u16(),
					message: Some(error.message()),
					error: None,
				}
				.respond()
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = ErrorBody;
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use super::{AppError, ErrorShape, RouteError};

	#[derive(Debug, thiserror::Error)]
	enum Sample {
		#[error("thing not found")]
		Missing,
	}

	impl ErrorShape for Sample {
		fn status(&self) -> StatusCode {
			StatusCode::NOT_FOUND
		}
	}

	#[test]
	fn test_route_error_status() {
		use axum::response::IntoResponse;

		let response = RouteError::from(Sample::Missing).into_response();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);

		let response = RouteError::<Sample>::from(sqlx::Error::RowNotFound).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_validation_is_client_error() {
		let error = AppError::Validation(validator::ValidationErrors::new());

		assert_eq!(error.status(), StatusCode::BAD_REQUEST);
	}
}
