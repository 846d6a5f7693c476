use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Error;
use crate::route::{
	auth::model::Authenticated,
	service::model::ServiceStatus,
	user::model::{User, UserInfo},
};

/// How long a one-time login code stays valid, in seconds.
pub const OTP_LIFETIME_SECS: i64 = 5 * 60;

/// An administrator. Administrators are a separate credential space from users.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub username: String,
	pub email: String,
	#[serde(skip)]
	pub password: Vec<u8>,
	/// Only super admins can create other admins.
	pub is_super_admin: bool,
	#[serde(skip)]
	pub otp: Option<String>,
	#[serde(skip)]
	pub otp_expires: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

pub type AdminAuthenticated = Authenticated<Admin>;

/// Generates a 6-digit one-time code.
pub fn generate_otp() -> String {
	rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

impl Admin {
	/// Stores a new one-time code, replacing any previous one, and returns its expiry.
	pub fn issue_otp(&mut self, code: String, now: DateTime<Utc>) -> DateTime<Utc> {
		let expires = now + Duration::seconds(OTP_LIFETIME_SECS);

		self.otp = Some(code);
		self.otp_expires = Some(expires);

		expires
	}

	/// Fails with [`Error::InvalidOtp`] unless `code` is the stored code and it
	/// has not expired. A code is still valid at the exact instant it expires.
	pub fn check_otp(&self, code: &str, now: DateTime<Utc>) -> Result<(), Error> {
		match (&self.otp, self.otp_expires) {
			(Some(otp), Some(expires)) if otp == code && now <= expires => Ok(()),
			_ => Err(Error::InvalidOtp),
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct OtpLoginInput {
	#[validate(email)]
	pub email: String,
	pub otp: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

/// The response to a one-time code request. The code itself is only sent by email.
#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
	pub status: u16,
	pub message: Cow<'static, str>,
	pub otp_expires: DateTime<Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordInput {
	pub current_password: String,
	#[validate(length(min = 1, max = 128))]
	pub new_password: String,
}

/// A user together with `followersCount`: how many other users list this
/// user as an active follower in their follow status.
#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithFollowers {
	#[serde(flatten)]
	pub user: User,
	pub followers_count: usize,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
	pub user_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatusInput {
	/// One of `not verified`, `verify request` or `verified`.
	pub is_verified: String,
}

#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
	pub post_id: Uuid,
	pub user_info: Option<UserInfo>,
	pub description: String,
	pub image: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub total_comments: usize,
	pub total_likes: usize,
	pub total_shares: usize,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostIdQuery {
	pub post_id: Uuid,
}

/// A service request joined with its owner's contact details.
#[derive(Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
	pub service_id: Uuid,
	pub user_id: Uuid,
	pub username: Option<String>,
	pub email: Option<String>,
	/// The owner's phone number.
	pub phone_number: Option<String>,
	pub title: String,
	pub pick_location: String,
	pub drop_location: String,
	pub date: String,
	pub time: String,
	pub description: Option<String>,
	pub status: ServiceStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusInput {
	pub service_id: Uuid,
	/// One of `pending`, `accepted`, `canceled` or `completed`.
	pub status: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIdQuery {
	pub service_id: Uuid,
}
