use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use super::Error;

/// Where a user is in the verification process.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[sqlx(type_name = "verification_status")]
pub enum Verification {
	#[default]
	#[serde(rename = "not verified")]
	#[sqlx(rename = "not verified")]
	NotVerified,
	#[serde(rename = "verify request")]
	#[sqlx(rename = "verify request")]
	Requested,
	#[serde(rename = "verified")]
	#[sqlx(rename = "verified")]
	Verified,
}

impl FromStr for Verification {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"not verified" => Ok(Self::NotVerified),
			"verify request" => Ok(Self::Requested),
			"verified" => Ok(Self::Verified),
			_ => Err(Error::InvalidVerification(s.to_owned())),
		}
	}
}

/// One follower of a user, as stored and as presented to clients.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowEntry {
	pub user_id: Uuid,
	pub followed: bool,
}

/// The followers a user has ever had, keyed by follower id.
///
/// Entries are toggled, never removed, so there is at most one entry per follower.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FollowEntry>", into = "Vec<FollowEntry>")]
pub struct FollowStatus(BTreeMap<Uuid, bool>);

impl From<Vec<FollowEntry>> for FollowStatus {
	fn from(entries: Vec<FollowEntry>) -> Self {
		Self(
			entries
				.into_iter()
				.map(|entry| (entry.user_id, entry.followed))
				.collect(),
		)
	}
}

impl From<FollowStatus> for Vec<FollowEntry> {
	fn from(status: FollowStatus) -> Self {
		status
			.0
			.into_iter()
			.map(|(user_id, followed)| FollowEntry { user_id, followed })
			.collect()
	}
}

impl FollowStatus {
	/// Flips the follower's entry, creating it as followed if it does not exist.
	/// Returns whether the follower now follows.
	pub fn toggle(&mut self, follower: Uuid) -> bool {
		let followed = self.0.entry(follower).or_insert(false);

		*followed = !*followed;
		*followed
	}

	pub fn is_followed_by(&self, follower: Uuid) -> bool {
		self.0.get(&follower).copied().unwrap_or(false)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}

fn no_followers() -> Json<FollowStatus> {
	Json(FollowStatus::default())
}

/// A single user.
#[model(update)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier of the user.
	#[serde(rename = "_id", skip_deserializing)]
	pub id: Uuid,
	/// The username that is displayed to the public.
	#[serde(skip_deserializing)]
	pub username: String,
	#[serde(skip_deserializing)]
	pub email: String,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The profile image URL. When updating, a base64 encoded image.
	pub profile_image: Option<String>,
	#[validate(length(max = 1000))]
	pub bio: Option<String>,
	#[validate(length(max = 32))]
	pub phone_number: Option<String>,
	pub date_of_birth: Option<String>,
	pub city: Option<String>,
	pub disability: Option<String>,
	/// The users following (or having once followed) this user.
	#[serde(skip_deserializing, default = "no_followers")]
	#[schemars(with = "Vec<FollowEntry>")]
	pub follow_status: Json<FollowStatus>,
	#[serde(skip_deserializing)]
	pub is_verified: Verification,
	/// The URL of the submitted verification document.
	#[serde(skip_deserializing)]
	pub verification_file: Option<String>,
	#[serde(skip_deserializing)]
	pub verification_description: Option<String>,
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

impl User {
	/// Toggles whether `actor` follows this user, returning the new state.
	pub fn toggle_follower(&mut self, actor: Uuid) -> Result<bool, Error> {
		if actor == self.id {
			return Err(Error::SelfFollow);
		}

		Ok(self.follow_status.toggle(actor))
	}

	pub fn is_followed_by(&self, viewer: Uuid) -> bool {
		self.follow_status.is_followed_by(viewer)
	}

	/// Overwrites every profile field that is present and non-empty in `update`.
	///
	/// `profile_image` is expected to already be the uploaded URL.
	pub fn apply(&mut self, update: UpdateUser) {
		fn provided(value: Option<String>) -> Option<String> {
			value.filter(|value| !value.is_empty())
		}

		let fields = [
			(&mut self.profile_image, update.profile_image),
			(&mut self.bio, update.bio),
			(&mut self.phone_number, update.phone_number),
			(&mut self.date_of_birth, update.date_of_birth),
			(&mut self.city, update.city),
			(&mut self.disability, update.disability),
		];

		for (field, value) in fields {
			if let Some(value) = provided(value) {
				*field = Some(value);
			}
		}
	}
}

/// Counts the other users whose follow status contains `user_id` as an active follower.
pub fn followers_count(users: &[User], user_id: Uuid) -> usize {
	users
		.iter()
		.filter(|user| user.id != user_id && user.is_followed_by(user_id))
		.count()
}

/// The public subset of a user embedded in other records.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub username: String,
	pub profile_image: Option<String>,
}

/// A user as seen by another user.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub username: String,
	pub email: String,
	pub profile_image: Option<String>,
	pub bio: Option<String>,
	pub phone_number: Option<String>,
	pub date_of_birth: Option<String>,
	pub city: Option<String>,
	pub disability: Option<String>,
	pub is_verified: Verification,
	/// Whether the requesting user follows this user.
	pub is_following: bool,
}

impl Profile {
	pub fn new(user: User, viewer: Uuid) -> Self {
		let is_following = user.is_followed_by(viewer);

		Self {
			id: user.id,
			username: user.username,
			email: user.email,
			profile_image: user.profile_image,
			bio: user.bio,
			phone_number: user.phone_number,
			date_of_birth: user.date_of_birth,
			city: user.city,
			disability: user.disability,
			is_verified: user.is_verified,
			is_following,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
	pub user_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowInput {
	/// The user to follow or unfollow.
	pub user_id: Uuid,
}

#[derive(Serialize, JsonSchema)]
pub struct FollowResult {
	pub followed: bool,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SearchQuery {
	pub username: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInput {
	pub description: Option<String>,
	/// The supporting document, base64 encoded.
	pub base64_medical_report: Option<String>,
}

/// Escapes `LIKE` wildcards so the search term matches literally as a substring.
pub fn like_pattern(term: &str) -> String {
	let mut pattern = String::with_capacity(term.len() + 2);

	pattern.push('%');
	for c in term.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}
		pattern.push(c);
	}
	pattern.push('%');

	pattern
}

#[cfg(test)]
pub(crate) mod test {
	use uuid::Uuid;

	use super::{followers_count, like_pattern, FollowStatus, UpdateUser, User, Verification};
	use crate::route::user::Error;

	pub fn user(username: &str) -> User {
		User {
			id: Uuid::new_v4(),
			username: username.into(),
			email: format!("{username}@x.com"),
			password: Vec::new(),
			profile_image: None,
			bio: None,
			phone_number: None,
			date_of_birth: None,
			city: None,
			disability: None,
			follow_status: sqlx::types::Json(FollowStatus::default()),
			is_verified: Verification::NotVerified,
			verification_file: None,
			verification_description: None,
			created_at: chrono::Utc::now(),
			updated_at: chrono::Utc::now(),
		}
	}

	#[test]
	fn test_follow_toggle() {
		let alice = user("alice");
		let mut bob = user("bob");

		assert!(bob.toggle_follower(alice.id).unwrap());
		assert!(bob.is_followed_by(alice.id));

		assert!(!bob.toggle_follower(alice.id).unwrap());
		assert!(!bob.is_followed_by(alice.id));

		// toggling never adds a second entry
		assert_eq!(bob.follow_status.len(), 1);

		assert!(bob.toggle_follower(alice.id).unwrap());
		assert_eq!(bob.follow_status.len(), 1);
	}

	#[test]
	fn test_cannot_follow_self() {
		let mut alice = user("alice");
		let id = alice.id;

		assert!(matches!(alice.toggle_follower(id), Err(Error::SelfFollow)));
		assert_eq!(alice.follow_status.len(), 0);
	}

	#[test]
	fn test_follow_status_serialization() {
		let follower = Uuid::new_v4();
		let mut status = FollowStatus::default();
		status.toggle(follower);

		let value = serde_json::to_value(&status).unwrap();
		assert_eq!(
			value,
			serde_json::json!([{ "userId": follower, "followed": true }])
		);

		let status = serde_json::from_value::<FollowStatus>(value).unwrap();
		assert!(status.is_followed_by(follower));
	}

	#[test]
	fn test_followers_count() {
		let alice = user("alice");
		let mut bob = user("bob");
		let mut carol = user("carol");

		bob.toggle_follower(alice.id).unwrap();
		carol.toggle_follower(alice.id).unwrap();
		carol.toggle_follower(alice.id).unwrap();

		let users = vec![alice.clone(), bob, carol];

		assert_eq!(followers_count(&users, alice.id), 1);
	}

	#[test]
	fn test_apply_update_ignores_empty_fields() {
		let mut alice = user("alice");
		alice.bio = Some("old bio".into());
		alice.city = Some("Lisbon".into());

		alice.apply(UpdateUser {
			profile_image: None,
			bio: Some(String::new()),
			phone_number: Some("555-0100".into()),
			date_of_birth: None,
			city: Some("Porto".into()),
			disability: None,
		});

		assert_eq!(alice.bio.as_deref(), Some("old bio"));
		assert_eq!(alice.city.as_deref(), Some("Porto"));
		assert_eq!(alice.phone_number.as_deref(), Some("555-0100"));
		assert!(alice.profile_image.is_none());
	}

	#[test]
	fn test_verification_from_str() {
		assert_eq!(
			"verify request".parse::<Verification>().unwrap(),
			Verification::Requested
		);
		assert!("approved".parse::<Verification>().is_err());
	}

	#[test]
	fn test_like_pattern() {
		assert_eq!(like_pattern("ali"), "%ali%");
		assert_eq!(like_pattern("a_b%"), "%a\\_b\\%%");
	}
}
