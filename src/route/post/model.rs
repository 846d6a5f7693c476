use std::collections::HashMap;

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use super::Error;
use crate::route::user::model::UserInfo;

/// A comment left on a post.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	pub user_id: Uuid,
	pub text: String,
	pub created_at: DateTime<Utc>,
}

fn no_comments() -> Json<Vec<Comment>> {
	Json(Vec::new())
}

/// A single post, created by a user.
#[model(create)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(rename = "_id", skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	#[validate(length(min = 1, message = "Description are required"))]
	pub description: String,
	/// The image URL. When creating, a base64 encoded image.
	pub image: Option<String>,
	/// Users that liked the post, in order.
	#[serde(skip_deserializing)]
	pub likes: Vec<Uuid>,
	/// Users that shared the post, in order.
	#[serde(skip_deserializing)]
	pub shares: Vec<Uuid>,
	#[serde(skip_deserializing, default = "no_comments")]
	#[schemars(with = "Vec<Comment>")]
	pub comments: Json<Vec<Comment>>,
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

impl Post {
	pub fn like(&mut self, user_id: Uuid) -> Result<(), Error> {
		if self.likes.contains(&user_id) {
			return Err(Error::AlreadyLiked);
		}

		self.likes.push(user_id);
		Ok(())
	}

	pub fn share(&mut self, user_id: Uuid) -> Result<(), Error> {
		if self.shares.contains(&user_id) {
			return Err(Error::AlreadyShared);
		}

		self.shares.push(user_id);
		Ok(())
	}

	pub fn comment(&mut self, user_id: Uuid, text: String, now: DateTime<Utc>) {
		self.comments.push(Comment {
			user_id,
			text,
			created_at: now,
		});
	}

	/// Every user referenced by the post: the owner, likers, sharers and commenters.
	pub fn referenced_users(&self) -> impl Iterator<Item = Uuid> + '_ {
		std::iter::once(self.user_id)
			.chain(self.likes.iter().copied())
			.chain(self.shares.iter().copied())
			.chain(self.comments.iter().map(|comment| comment.user_id))
	}
}

/// A like or share, expanded with the acting user.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
	pub user_info: Option<UserInfo>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
	pub text: String,
	pub user_info: Option<UserInfo>,
	pub created_at: DateTime<Utc>,
}

/// Whether the post appears in a user's listing because they shared it.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sharing {
	pub shared_by_user: bool,
	/// The author of the post, if it was shared by the user.
	pub shared_post_owner: Option<UserInfo>,
}

/// A post as presented to a viewer, with related users expanded and
/// interaction counts computed.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub description: String,
	pub image: Option<String>,
	pub user_info: Option<UserInfo>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub likes_count: usize,
	pub shares_count: usize,
	pub comments_count: usize,
	/// Whether the viewer has liked the post.
	pub post_liked: bool,
	#[serde(flatten)]
	pub sharing: Option<Sharing>,
	pub likes: Vec<Interaction>,
	pub shares: Vec<Interaction>,
	pub comments: Vec<CommentView>,
}

impl PostView {
	/// Builds the view of `post` for `viewer`, resolving users through `users`.
	/// Users missing from the map are presented as `null`.
	pub fn new(post: Post, viewer: Uuid, users: &HashMap<Uuid, UserInfo>) -> Self {
		let info = |id: &Uuid| users.get(id).cloned();
		let interactions = |ids: &[Uuid]| {
			ids.iter()
				.map(|id| Interaction { user_info: info(id) })
				.collect::<Vec<_>>()
		};

		Self {
			id: post.id,
			user_info: info(&post.user_id),
			likes_count: post.likes.len(),
			shares_count: post.shares.len(),
			comments_count: post.comments.len(),
			post_liked: post.likes.contains(&viewer),
			sharing: None,
			likes: interactions(&post.likes),
			shares: interactions(&post.shares),
			comments: post
				.comments
				.0
				.into_iter()
				.map(|comment| CommentView {
					user_info: info(&comment.user_id),
					text: comment.text,
					created_at: comment.created_at,
				})
				.collect(),
			description: post.description,
			image: post.image,
			created_at: post.created_at,
			updated_at: post.updated_at,
		}
	}

	/// Marks whether the post is listed because the listed user shared it.
	#[must_use]
	pub fn shared(mut self, shared_by_user: bool) -> Self {
		self.sharing = Some(Sharing {
			shared_by_user,
			shared_post_owner: if shared_by_user {
				self.user_info.clone()
			} else {
				None
			},
		});
		self
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostIdQuery {
	pub post_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
	pub user_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostIdInput {
	pub post_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
	pub post_id: Uuid,
	pub text: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePost {
	/// The post to update.
	pub id: Uuid,
	pub description: Option<String>,
	/// A base64 encoded image replacing the current one.
	pub image: Option<String>,
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use chrono::Utc;
	use sqlx::types::Json;
	use uuid::Uuid;

	use super::{Post, PostView};
	use crate::route::{post::Error, user::model::UserInfo};

	fn post(user_id: Uuid) -> Post {
		Post {
			id: Uuid::new_v4(),
			user_id,
			description: "hello".into(),
			image: None,
			likes: Vec::new(),
			shares: Vec::new(),
			comments: Json(Vec::new()),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	fn info(id: Uuid, username: &str) -> UserInfo {
		UserInfo {
			id,
			username: username.into(),
			profile_image: None,
		}
	}

	#[test]
	fn test_like_once() {
		let bob = Uuid::new_v4();
		let mut post = post(Uuid::new_v4());

		post.like(bob).unwrap();
		assert!(matches!(post.like(bob), Err(Error::AlreadyLiked)));
		assert_eq!(post.likes, vec![bob]);
	}

	#[test]
	fn test_share_is_independent_of_like() {
		let bob = Uuid::new_v4();
		let mut post = post(Uuid::new_v4());

		post.like(bob).unwrap();
		post.share(bob).unwrap();
		assert!(matches!(post.share(bob), Err(Error::AlreadyShared)));
		assert_eq!(post.shares.len(), 1);
	}

	#[test]
	fn test_view_counts() {
		let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
		let users = HashMap::from([
			(alice, info(alice, "alice")),
			(bob, info(bob, "bob")),
		]);

		let mut post = post(alice);
		post.like(bob).unwrap();
		post.comment(bob, "nice".into(), Utc::now());
		post.comment(carol, "also nice".into(), Utc::now());

		let view = PostView::new(post.clone(), bob, &users);
		assert_eq!(view.likes_count, 1);
		assert_eq!(view.comments_count, 2);
		assert!(view.post_liked);
		assert_eq!(view.user_info.unwrap().username, "alice");
		// carol is unknown to the map
		assert!(view.comments[1].user_info.is_none());

		let view = PostView::new(post, carol, &users);
		assert!(!view.post_liked);
	}

	#[test]
	fn test_shared_by() {
		let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
		let users = HashMap::from([(alice, info(alice, "alice"))]);

		let mut post = post(alice);
		post.share(bob).unwrap();

		let view = PostView::new(post.clone(), bob, &users).shared(post.shares.contains(&bob));
		let value = serde_json::to_value(&view).unwrap();

		assert_eq!(value["sharedByUser"], true);
		assert_eq!(value["sharedPostOwner"]["username"], "alice");

		let view = PostView::new(post, bob, &users).shared(false);
		let value = serde_json::to_value(&view).unwrap();

		assert_eq!(value["sharedByUser"], false);
		assert!(value["sharedPostOwner"].is_null());
	}

	#[test]
	fn test_referenced_users() {
		let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
		let mut post = post(alice);
		post.like(bob).unwrap();
		post.comment(bob, "hi".into(), Utc::now());

		assert_eq!(post.referenced_users().collect::<Vec<_>>(), vec![alice, bob, bob]);
	}
}
