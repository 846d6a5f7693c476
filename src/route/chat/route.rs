use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Query, Session},
	openapi::tag,
	route::Envelope,
	Database,
};

use super::{ensure_users_exist, model, views, Error, RouteError};

async fn find_room(database: &Database, id: uuid::Uuid) -> Result<model::ChatRoom, RouteError> {
	let room = sqlx::query_as::<_, model::ChatRoom>("SELECT * FROM chat_room WHERE id = $1")
		.bind(id)
		.fetch_optional(database)
		.await?;

	Ok(room.ok_or(Error::UnknownRoom(id))?)
}

/// Get direct chat rooms
/// Returns the direct chat rooms you participate in.
#[route(tag = tag::CHAT)]
pub async fn get_chat_rooms(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Envelope<Vec<model::ChatRoomView>>>, RouteError> {
	let rooms = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			SELECT * FROM chat_room
			WHERE $1 = ANY(participants) AND NOT is_group_chat
			ORDER BY updated_at DESC
		"#,
	)
	.bind(session.user.id)
	.fetch_all(&database)
	.await?;

	Ok(Json(Envelope::data(views(&database, rooms).await?)))
}

/// Get chat room messages
/// Returns a chat room with its participants and messages.
#[route(tag = tag::CHAT)]
pub async fn get_chat_room(
	State(database): State<Database>,
	_session: Session,
	Query(query): Query<model::ChatRoomQuery>,
) -> Result<Json<Envelope<model::ChatRoomView>>, RouteError> {
	let room = find_room(&database, query.chatroom_id).await?;
	let view = views(&database, vec![room])
		.await?
		.pop()
		.ok_or(Error::UnknownRoom(query.chatroom_id))?;

	Ok(Json(Envelope::data(view)))
}

/// Create direct chat room
/// Returns the direct chat room with exactly these participants and you,
/// creating it if it does not exist yet.
#[route(tag = tag::CHAT)]
pub async fn create_chat_room(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateChatRoom>,
) -> Result<Json<Envelope<model::ChatRoom>>, RouteError> {
	let participants = model::direct_participants(session.user.id, &input.participants)?;

	ensure_users_exist(&database, &participants).await?;

	let existing = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			SELECT * FROM chat_room
			WHERE NOT is_group_chat AND participants @> $1 AND participants <@ $1
			LIMIT 1
		"#,
	)
	.bind(&participants)
	.fetch_optional(&database)
	.await?;

	if let Some(room) = existing {
		return Ok(Json(
			Envelope::data(room).with_message("Chat room with these participants already exists"),
		));
	}

	let room = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			INSERT INTO chat_room (is_group_chat, participants)
			VALUES (false, $1)
			RETURNING *
		"#,
	)
	.bind(&participants)
	.fetch_one(&database)
	.await?;

	tracing::info!(room = %room.id, "direct chat room created");

	Ok(Json(Envelope::data(room)))
}

/// Send message
/// Appends a message from you to a chat room.
#[route(tag = tag::CHAT)]
pub async fn send_message(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::SendMessage>,
) -> Result<Json<Envelope<model::ChatRoom>>, RouteError> {
	let message = model::Message {
		sender: session.user.id,
		content: input.content,
		created_at: chrono::Utc::now(),
	};

	let room = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			UPDATE chat_room
			SET messages = messages || jsonb_build_array($2::jsonb), updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(input.chat_room_id)
	.bind(sqlx::types::Json(&message))
	.fetch_optional(&database)
	.await?
	.ok_or(Error::UnknownRoom(input.chat_room_id))?;

	Ok(Json(Envelope::data(room)))
}

/// Create group chat
/// Creates a group chat administered by you. You are always a participant.
#[route(tag = tag::CHAT)]
pub async fn create_group(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateGroup>,
) -> Result<Json<Envelope<model::ChatRoom>>, RouteError> {
	ensure_users_exist(&database, &input.participants).await?;

	let participants = model::participants(session.user.id, &input.participants);

	let room = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			INSERT INTO chat_room
				(is_group_chat, group_name, group_description, group_admin, participants)
			VALUES (true, $1, $2, $3, $4)
			RETURNING *
		"#,
	)
	.bind(&input.group_name)
	.bind(&input.group_description)
	.bind(session.user.id)
	.bind(&participants)
	.fetch_one(&database)
	.await?;

	tracing::info!(room = %room.id, admin = %session.user.id, "group chat created");

	Ok(Json(Envelope::data(room)))
}

/// Get group chats
/// Returns the group chats you participate in or administer.
#[route(tag = tag::CHAT)]
pub async fn get_groups(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Envelope<Vec<model::ChatRoomView>>>, RouteError> {
	let rooms = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			SELECT * FROM chat_room
			WHERE is_group_chat AND ($1 = ANY(participants) OR group_admin = $1)
			ORDER BY updated_at DESC
		"#,
	)
	.bind(session.user.id)
	.fetch_all(&database)
	.await?;

	if rooms.is_empty() {
		return Err(Error::NoGroups.into());
	}

	Ok(Json(Envelope::data(views(&database, rooms).await?)))
}

/// Update group chat
/// Renames a group and adds participants. Only the group admin can do this.
#[route(tag = tag::CHAT)]
pub async fn update_group(
	State(database): State<Database>,
	session: Session,
	Query(query): Query<model::GroupQuery>,
	Json(input): Json<model::UpdateGroup>,
) -> Result<Json<Envelope<model::ChatRoom>>, RouteError> {
	let mut room = find_room(&database, query.chat_room_id).await?;

	room.update_group(session.user.id, input.group_name, &[])?;

	if !input.participants.is_empty() {
		ensure_users_exist(&database, &input.participants).await?;
		room.update_group(session.user.id, None, &input.participants)?;
	}

	let room = sqlx::query_as::<_, model::ChatRoom>(
		r#"
			UPDATE chat_room SET group_name = $2, participants = $3, updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(room.id)
	.bind(&room.group_name)
	.bind(&room.participants)
	.fetch_one(&database)
	.await?;

	Ok(Json(Envelope::data(room)))
}

/// Delete group chat
/// Deletes a group chat. Only the group admin can do this.
#[route(tag = tag::CHAT)]
pub async fn delete_group(
	State(database): State<Database>,
	session: Session,
	Query(query): Query<model::GroupQuery>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let room = find_room(&database, query.chat_room_id).await?;

	room.ensure_deletable_by(session.user.id)?;

	sqlx::query("DELETE FROM chat_room WHERE id = $1")
		.bind(room.id)
		.execute(&database)
		.await?;

	tracing::info!(room = %room.id, "group chat deleted");

	Ok(Json(Envelope::message("Group chat deleted successfully")))
}
