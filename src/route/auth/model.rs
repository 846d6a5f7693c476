use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::user::model::User;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SignupInput {
	/// The username that is displayed to the public.
	#[validate(length(min = 1, max = 64))]
	pub username: String,
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

/// A bearer token and the account it was issued for.
#[derive(Serialize, JsonSchema)]
pub struct Authenticated<T> {
	pub token: String,
	pub user: T,
}

pub type UserAuthenticated = Authenticated<User>;
