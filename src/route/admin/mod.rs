use aide::axum::{
	routing::{delete_with, get_with, post_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Admin user not found")]
	UnknownAdmin,
	#[error("Invalid password")]
	InvalidPassword,
	#[error("Invalid or expired OTP")]
	InvalidOtp,
	#[error("Forbidden: Only Super Admins can create admin users")]
	NotSuperAdmin,
	#[error("Admin with the provided email already exists")]
	EmailTaken,
	#[error("Username or email already exists")]
	Taken,
	#[error("Current password is incorrect")]
	WrongCurrentPassword,
	#[error("User not found")]
	UnknownUser(Uuid),
	#[error("Post not found")]
	UnknownPost(Uuid),
	#[error("Service not found")]
	UnknownService(Uuid),
	#[error("Invalid verification status")]
	InvalidVerification,
	#[error("Invalid status value")]
	InvalidServiceStatus,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/admin/superAdmin",
			post_with(create_super_admin, create_super_admin_docs),
		)
		.api_route(
			"/admin/adminUser",
			post_with(create_admin, create_admin_docs),
		)
		.api_route("/admin/login/otp", post_with(send_otp, send_otp_docs))
		.api_route("/admin/login", post_with(login, login_docs))
		.api_route(
			"/admin/update-password",
			put_with(update_password, update_password_docs),
		)
		.api_route("/admin/users", get_with(get_users, get_users_docs))
		.api_route("/admin/user-id", get_with(get_user, get_user_docs))
		.api_route(
			"/admin/user-status",
			put_with(update_user_status, update_user_status_docs),
		)
		.api_route(
			"/admin/user-delete",
			delete_with(delete_user, delete_user_docs),
		)
		.api_route("/admin/posts", get_with(get_posts, get_posts_docs))
		.api_route(
			"/admin/post-delete",
			delete_with(delete_post, delete_post_docs),
		)
		.api_route("/admin/services", get_with(get_services, get_services_docs))
		.api_route(
			"/admin/service-status",
			put_with(update_service_status, update_service_status_docs),
		)
		.api_route(
			"/admin/service-delete",
			delete_with(delete_service, delete_service_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownAdmin
			| Self::UnknownUser(..)
			| Self::UnknownPost(..)
			| Self::UnknownService(..) => StatusCode::NOT_FOUND,
			Self::InvalidPassword | Self::InvalidOtp => StatusCode::UNAUTHORIZED,
			Self::NotSuperAdmin => StatusCode::FORBIDDEN,
			Self::EmailTaken
			| Self::Taken
			| Self::WrongCurrentPassword
			| Self::InvalidVerification
			| Self::InvalidServiceStatus => StatusCode::BAD_REQUEST,
		}
	}
}
