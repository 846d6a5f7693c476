use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unauthorized: No token provided")]
	NoToken,
	#[error("Unauthorized: Invalid token")]
	InvalidToken,
	#[error("Unauthorized: Unknown account")]
	UnknownPrincipal,
	#[error("Only users can access this.")]
	NotUser,
	#[error("Only admin can access this.")]
	NotAdmin,
	#[error("User not found or Invalid email")]
	UnknownEmail,
	#[error("Invalid email or password")]
	InvalidCredentials,
	#[error("Username already taken")]
	UsernameTaken,
	#[error("User with the provided email already exists")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/signup", post_with(signup, signup_docs))
		.api_route("/login", post_with(login, login_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NoToken
			| Self::InvalidToken
			| Self::UnknownPrincipal
			| Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
			Self::NotUser | Self::NotAdmin => StatusCode::FORBIDDEN,
			Self::UnknownEmail => StatusCode::NOT_FOUND,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::BAD_REQUEST,
		}
	}
}

/// Maps a violated `<table>_username_key` or `<table>_email_key` constraint to
/// the matching error, passing every other database error through.
pub fn map_taken<E: error::ErrorShape>(
	error: sqlx::Error,
	username_taken: E,
	email_taken: E,
) -> error::RouteError<E> {
	let constraint = match &error {
		sqlx::Error::Database(database) => database.constraint().map(str::to_owned),
		_ => None,
	};

	match constraint.as_deref() {
		Some(name) if name.ends_with("_email_key") => email_taken.into(),
		Some(name) if name.ends_with("_username_key") => username_taken.into(),
		_ => error.into(),
	}
}
