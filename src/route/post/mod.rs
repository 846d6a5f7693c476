use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, route::user, AppState, Database};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Post not found")]
	UnknownPost(Uuid),
	#[error("Posts not found")]
	NoPosts,
	#[error("You have already liked this post")]
	AlreadyLiked,
	#[error("You have already shared this post")]
	AlreadyShared,
	#[error("You can only update your own posts")]
	NotOwner,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/posts", get_with(get_posts, get_posts_docs))
		.api_route(
			"/posts/followed-user-posts",
			get_with(get_followed_posts, get_followed_posts_docs),
		)
		.api_route(
			"/posts/by-userId",
			get_with(get_user_posts, get_user_posts_docs),
		)
		.api_route(
			"/post",
			get_with(get_post, get_post_docs)
				.post_with(create_post, create_post_docs)
				.put_with(update_post, update_post_docs),
		)
		.api_route("/post/like", post_with(like_post, like_post_docs))
		.api_route("/post/share", post_with(share_post, share_post_docs))
		.api_route(
			"/post/comment",
			post_with(comment_on_post, comment_on_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::NoPosts => StatusCode::NOT_FOUND,
			Self::AlreadyLiked | Self::AlreadyShared => StatusCode::BAD_REQUEST,
			Self::NotOwner => StatusCode::FORBIDDEN,
		}
	}
}

/// Builds the views of `posts` for `viewer`, resolving every referenced user
/// with a single query.
pub async fn views(
	database: &Database,
	posts: Vec<model::Post>,
	viewer: Uuid,
) -> Result<Vec<model::PostView>, sqlx::Error> {
	let users = user::user_info(
		database,
		posts.iter().flat_map(|post| post.referenced_users()),
	)
	.await?;

	Ok(posts
		.into_iter()
		.map(|post| model::PostView::new(post, viewer, &users))
		.collect())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn create_post(app: &TestServer, token: &str, description: &str) -> String {
		let response = app
			.post("/post")
			.add_header(header::AUTHORIZATION, bearer(token))
			.json(&json!({ "description": description }))
			.await;

		assert_eq!(response.status_code(), 200);
		response.json::<Value>()["data"]["_id"]
			.as_str()
			.unwrap()
			.to_owned()
	}

	#[sqlx::test]
	async fn test_like_flow(pool: Database) {
		let app = app(pool);

		let (alice, _) = signup(&app, "alice").await;
		let (bob, _) = signup(&app, "bob").await;
		let (carol, _) = signup(&app, "carol").await;

		let post_id = create_post(&app, &alice, "hello").await;

		let like = || {
			app.post("/post/like")
				.add_header(header::AUTHORIZATION, bearer(&bob))
				.json(&json!({ "postId": post_id }))
		};

		let response = like().await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["message"], "Post liked successfully");

		let response = like().await;
		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"You have already liked this post"
		);

		for (token, liked) in [(&bob, true), (&carol, false)] {
			let response = app
				.get("/posts")
				.add_header(header::AUTHORIZATION, bearer(token))
				.await;

			let body = response.json::<Value>();
			let post = &body["data"][0];

			assert_eq!(post["likesCount"], 1);
			assert_eq!(post["postLiked"], liked);
			assert_eq!(post["userInfo"]["username"], "alice");
			assert_eq!(post["likes"][0]["userInfo"]["username"], "bob");
		}
	}

	#[sqlx::test]
	async fn test_user_without_posts(pool: Database) {
		let app = app(pool);

		let (alice, alice_id) = signup(&app, "alice").await;

		let response = app
			.get("/posts/by-userId")
			.add_query_param("userId", alice_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(
			response.json::<Value>(),
			json!({ "status": 404, "message": "Posts not found" })
		);
	}

	#[sqlx::test]
	async fn test_followed_and_shared_posts(pool: Database) {
		let app = app(pool);

		let (alice, alice_id) = signup(&app, "alice").await;
		let (bob, bob_id) = signup(&app, "bob").await;
		let (carol, _) = signup(&app, "carol").await;

		let post_id = create_post(&app, &alice, "from alice").await;
		create_post(&app, &carol, "from carol").await;
		create_post(&app, &bob, "from bob").await;

		app.post("/user/followUnfollow")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "userId": alice_id }))
			.await;

		let response = app
			.get("/posts/followed-user-posts")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.await;

		let body = response.json::<Value>();
		let mut descriptions = body["data"]
			.as_array()
			.unwrap()
			.iter()
			.map(|post| post["description"].as_str().unwrap().to_owned())
			.collect::<Vec<_>>();
		descriptions.sort();

		assert_eq!(descriptions, ["from alice", "from bob"]);

		let response = app
			.post("/post/share")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "postId": post_id }))
			.await;
		assert_eq!(response.status_code(), 200);

		let response = app
			.get("/posts/by-userId")
			.add_query_param("userId", &bob_id)
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.await;

		let body = response.json::<Value>();
		let shared = body["data"]
			.as_array()
			.unwrap()
			.iter()
			.find(|post| post["_id"] == post_id.as_str())
			.unwrap();

		assert_eq!(shared["sharedByUser"], true);
		assert_eq!(shared["sharedPostOwner"]["username"], "alice");
		assert_eq!(body["data"].as_array().unwrap().len(), 2);
	}

	#[sqlx::test]
	async fn test_update_and_comment(pool: Database) {
		let app = app(pool);

		let (alice, _) = signup(&app, "alice").await;
		let (bob, _) = signup(&app, "bob").await;

		let post_id = create_post(&app, &alice, "hello").await;

		let response = app
			.put("/post")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "id": post_id, "description": "hijacked" }))
			.await;
		assert_eq!(response.status_code(), 403);

		let response = app
			.put("/post")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "id": post_id, "description": "edited" }))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"]["description"], "edited");

		let response = app
			.post("/post/comment")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "postId": post_id, "text": "nice" }))
			.await;
		assert_eq!(response.json::<Value>()["message"], "Comment added successfully");

		let response = app
			.get("/post")
			.add_query_param("postId", &post_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;

		let body = response.json::<Value>();
		assert_eq!(body["data"]["commentsCount"], 1);
		assert_eq!(body["data"]["comments"][0]["userInfo"]["username"], "bob");

		let response = app
			.post("/post/like")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "postId": uuid::Uuid::new_v4() }))
			.await;
		assert_eq!(response.status_code(), 404);
	}
}
