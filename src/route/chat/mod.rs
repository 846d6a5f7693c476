use aide::axum::{
	routing::{delete_with, get_with, post_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, route::user, AppState, Database};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Chat room not found")]
	UnknownRoom(Uuid),
	#[error("One or more participants do not exist")]
	BadParticipant,
	#[error("A direct chat needs at least one other participant")]
	NoOtherParticipant,
	#[error("Only the group admin can modify the group")]
	NotGroupAdmin,
	#[error("Cannot delete a direct chat")]
	NotGroup,
	#[error("No groups found for this user")]
	NoGroups,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/chatrooms", get_with(get_chat_rooms, get_chat_rooms_docs))
		.api_route(
			"/chatroom-messages",
			get_with(get_chat_room, get_chat_room_docs),
		)
		.api_route(
			"/create-chatroom",
			post_with(create_chat_room, create_chat_room_docs),
		)
		.api_route("/send-message", post_with(send_message, send_message_docs))
		.api_route(
			"/group/chatroom-create",
			post_with(create_group, create_group_docs),
		)
		.api_route("/group/chatrooms", get_with(get_groups, get_groups_docs))
		.api_route(
			"/group/chatroom-update",
			put_with(update_group, update_group_docs),
		)
		.api_route(
			"/group/chatroom-delete",
			delete_with(delete_group, delete_group_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownRoom(..) | Self::NoGroups => StatusCode::NOT_FOUND,
			Self::BadParticipant | Self::NoOtherParticipant | Self::NotGroup => {
				StatusCode::BAD_REQUEST
			}
			Self::NotGroupAdmin => StatusCode::FORBIDDEN,
		}
	}
}

/// Fails with [`Error::BadParticipant`] unless every id is an existing user.
pub async fn ensure_users_exist(database: &Database, ids: &[Uuid]) -> Result<(), RouteError> {
	let mut ids = ids.to_vec();
	ids.sort_unstable();
	ids.dedup();

	let (found,): (i64,) = sqlx::query_as(r#"SELECT count(*) FROM "user" WHERE id = ANY($1)"#)
		.bind(&ids)
		.fetch_one(database)
		.await?;

	if usize::try_from(found).ok() == Some(ids.len()) {
		Ok(())
	} else {
		Err(Error::BadParticipant.into())
	}
}

/// Expands the users referenced by every room with a single query.
pub async fn views(
	database: &Database,
	rooms: Vec<model::ChatRoom>,
) -> Result<Vec<model::ChatRoomView>, sqlx::Error> {
	let users = user::user_info(
		database,
		rooms.iter().flat_map(|room| room.referenced_users()),
	)
	.await?;

	Ok(rooms
		.into_iter()
		.map(|room| model::ChatRoomView::new(room, &users))
		.collect())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_direct_room_is_reused(pool: Database) {
		let app = app(pool);

		let (alice, alice_id) = signup(&app, "alice").await;
		let (bob, bob_id) = signup(&app, "bob").await;

		let response = app
			.post("/create-chatroom")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "participants": [bob_id] }))
			.await;
		assert_eq!(response.status_code(), 200);
		let first = response.json::<Value>()["data"]["_id"].clone();

		let response = app
			.post("/create-chatroom")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "participants": [alice_id] }))
			.await;
		let body = response.json::<Value>();
		assert_eq!(body["data"]["_id"], first);
		assert_eq!(
			body["message"],
			"Chat room with these participants already exists"
		);

		let response = app
			.post("/send-message")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "chatRoomId": first, "content": "hi alice" }))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"]["messages"][0]["sender"], json!(bob_id));

		let response = app
			.get("/chatroom-messages")
			.add_query_param("chatroomId", first.as_str().unwrap())
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;
		let body = response.json::<Value>();
		assert_eq!(body["data"]["messages"][0]["sender"]["username"], "bob");
		assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 2);

		let response = app
			.post("/create-chatroom")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "participants": [uuid::Uuid::new_v4()] }))
			.await;
		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_direct_room_rejections(pool: Database) {
		let app = app(pool);

		let (alice, alice_id) = signup(&app, "alice").await;
		let (_, bob_id) = signup(&app, "bob").await;

		let response = app
			.post("/create-chatroom")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "participants": [alice_id, alice_id] }))
			.await;
		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"A direct chat needs at least one other participant"
		);

		let response = app
			.post("/send-message")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "chatRoomId": uuid::Uuid::new_v4(), "content": "anyone?" }))
			.await;
		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["message"], "Chat room not found");

		let response = app
			.post("/create-chatroom")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "participants": [bob_id] }))
			.await;
		let room_id = response.json::<Value>()["data"]["_id"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.delete("/group/chatroom-delete")
			.add_query_param("chatRoomId", &room_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;
		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "Cannot delete a direct chat");
	}

	#[sqlx::test]
	async fn test_group_lifecycle(pool: Database) {
		let app = app(pool);

		let (alice, alice_id) = signup(&app, "alice").await;
		let (bob, bob_id) = signup(&app, "bob").await;
		let (_, carol_id) = signup(&app, "carol").await;

		let response = app
			.post("/group/chatroom-create")
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({
				"groupName": "hikers",
				"groupDescription": "weekend trips",
				"participants": [bob_id],
			}))
			.await;
		assert_eq!(response.status_code(), 200);
		let body = response.json::<Value>();
		let room_id = body["data"]["_id"].as_str().unwrap().to_owned();
		assert_eq!(body["data"]["groupAdmin"], json!(alice_id));
		assert_eq!(body["data"]["participants"].as_array().unwrap().len(), 2);

		let response = app
			.put("/group/chatroom-update")
			.add_query_param("chatRoomId", &room_id)
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.json(&json!({ "groupName": "mine" }))
			.await;
		assert_eq!(response.status_code(), 403);

		let response = app
			.put("/group/chatroom-update")
			.add_query_param("chatRoomId", &room_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.json(&json!({ "participants": [bob_id, carol_id] }))
			.await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["data"]["participants"]
				.as_array()
				.unwrap()
				.len(),
			3
		);

		let response = app
			.get("/group/chatrooms")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.await;
		assert_eq!(response.json::<Value>()["data"][0]["groupName"], "hikers");

		let response = app
			.delete("/group/chatroom-delete")
			.add_query_param("chatRoomId", &room_id)
			.add_header(header::AUTHORIZATION, bearer(&alice))
			.await;
		assert_eq!(response.status_code(), 200);

		let response = app
			.get("/group/chatrooms")
			.add_header(header::AUTHORIZATION, bearer(&bob))
			.await;
		assert_eq!(response.status_code(), 404);
	}
}
