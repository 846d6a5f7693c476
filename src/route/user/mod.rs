use std::collections::{BTreeSet, HashMap};

use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState, Database};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("User not found")]
	UnknownUser(Uuid),
	#[error("You cannot follow/unfollow yourself")]
	SelfFollow,
	#[error("Username query parameter is required")]
	MissingUsername,
	#[error("Description and medical report are required.")]
	MissingVerification,
	#[error("Invalid verification status {0:?}")]
	InvalidVerification(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/users", get_with(get_users, get_users_docs))
		.api_route("/usersMe", get_with(get_me, get_me_docs))
		.api_route(
			"/user",
			get_with(get_user, get_user_docs).put_with(update_me, update_me_docs),
		)
		.api_route(
			"/user/followUnfollow",
			post_with(follow_unfollow, follow_unfollow_docs),
		)
		.api_route(
			"/user/searchByUsername",
			get_with(search_by_username, search_by_username_docs),
		)
		.api_route(
			"/user/verification",
			post_with(request_verification, request_verification_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::SelfFollow
			| Self::MissingUsername
			| Self::MissingVerification
			| Self::InvalidVerification(..) => StatusCode::BAD_REQUEST,
		}
	}
}

/// Loads the public info of every given user, keyed by id.
///
/// Ids of users that no longer exist are absent from the map.
pub async fn user_info(
	database: &Database,
	ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, model::UserInfo>, sqlx::Error> {
	let ids = ids
		.into_iter()
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect::<Vec<_>>();

	if ids.is_empty() {
		return Ok(HashMap::new());
	}

	let users = sqlx::query_as::<_, model::UserInfo>(
		r#"SELECT id, username, profile_image FROM "user" WHERE id = ANY($1)"#,
	)
	.bind(&ids)
	.fetch_all(database)
	.await?;

	Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_follow_toggle_flow(pool: Database) {
		let app = app(pool);

		let (alice, _) = signup(&app, "alice").await;
		let (bob, bob_id) = signup(&app, "bob").await;

		let follow = || {
			app.post("/user/followUnfollow")
				.add_header(header::AUTHORIZATION, bearer(&alice))
				.json(&json!({ "userId": bob_id }))
		};

		let response = follow().await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["message"], "User followed successfully");

		let response = app
			.get("/user")
			.add_query_param("userId", &bob_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;
		assert_eq!(response.json::<Value>()["data"]["isFollowing"], true);

		let response = follow().await;
		assert_eq!(response.json::<Value>()["message"], "User unfollowed successfully");
		assert_eq!(response.json::<Value>()["data"]["followed"], false);

		let response = app
			.get("/usersMe")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.await;
		let follow_status = &response.json::<Value>()["data"]["followStatus"];
		assert_eq!(follow_status.as_array().unwrap().len(), 1);

		let response = app
			.post("/user/followUnfollow")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "userId": bob_id }))
			.await;
		assert_eq!(response.status_code(), 400);

		let response = app
			.post("/user/followUnfollow")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "userId": uuid::Uuid::new_v4() }))
			.await;
		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["message"], "User not found");
	}

	#[sqlx::test]
	async fn test_search_by_username(pool: Database) {
		let app = app(pool);

		let (token, _) = signup(&app, "alice").await;
		signup(&app, "malice").await;
		signup(&app, "bob").await;

		let response = app
			.get("/user/searchByUsername")
			.add_query_param("username", "ALI")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 2);

		let response = app
			.get("/user/searchByUsername")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_search_wildcards_are_literal(pool: Database) {
		let app = app(pool);

		let (token, _) = signup(&app, "ab").await;
		signup(&app, "a_b").await;
		signup(&app, "c%d").await;

		let search = |term: &'static str| {
			app.get("/user/searchByUsername")
				.add_query_param("username", term)
				.add_header(header::AUTHORIZATION, bearer(&token))
		};

		let body = search("a_").await.json::<Value>();
		let names = body["data"]
			.as_array()
			.unwrap()
			.iter()
			.map(|user| user["username"].as_str().unwrap())
			.collect::<Vec<_>>();
		assert_eq!(names, vec!["a_b"]);

		let body = search("%").await.json::<Value>();
		assert_eq!(body["data"].as_array().unwrap().len(), 1);
		assert_eq!(body["data"][0]["username"], "c%d");

		let body = search("x_").await.json::<Value>();
		assert_eq!(body["data"].as_array().unwrap().len(), 0);
		assert_eq!(body["message"], "No users found");
	}
}
