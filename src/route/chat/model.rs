use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use super::Error;
use crate::route::user::model::UserInfo;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	pub sender: Uuid,
	pub content: String,
	pub created_at: DateTime<Utc>,
}

/// A direct or group conversation.
///
/// Group rooms always have a name, a description and an admin, and the admin
/// is always a participant.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub is_group_chat: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_admin: Option<Uuid>,
	pub participants: Vec<Uuid>,
	#[schemars(with = "Vec<Message>")]
	pub messages: Json<Vec<Message>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Merges `added` into `existing`, keeping the first occurrence of every id.
pub fn union(existing: &[Uuid], added: &[Uuid]) -> Vec<Uuid> {
	let mut participants = Vec::with_capacity(existing.len() + added.len());

	for id in existing.iter().chain(added) {
		if !participants.contains(id) {
			participants.push(*id);
		}
	}

	participants
}

/// The participant set of a new room: the named users plus the caller.
pub fn participants(caller: Uuid, named: &[Uuid]) -> Vec<Uuid> {
	union(named, &[caller])
}

/// The participant set of a new direct room. Fails with
/// [`Error::NoOtherParticipant`] if it would only contain the caller.
pub fn direct_participants(caller: Uuid, named: &[Uuid]) -> Result<Vec<Uuid>, Error> {
	let participants = participants(caller, named);

	if participants.len() < 2 {
		return Err(Error::NoOtherParticipant);
	}

	Ok(participants)
}

impl ChatRoom {
	fn ensure_admin(&self, caller: Uuid) -> Result<(), Error> {
		if self.group_admin == Some(caller) {
			Ok(())
		} else {
			Err(Error::NotGroupAdmin)
		}
	}

	/// Renames the group and adds participants. Only the group admin may do so.
	pub fn update_group(
		&mut self,
		caller: Uuid,
		name: Option<String>,
		added: &[Uuid],
	) -> Result<(), Error> {
		self.ensure_admin(caller)?;

		if let Some(name) = name.filter(|name| !name.is_empty()) {
			self.group_name = Some(name);
		}

		self.participants = union(&self.participants, added);
		Ok(())
	}

	/// Fails unless this is a group room administered by `caller`.
	pub fn ensure_deletable_by(&self, caller: Uuid) -> Result<(), Error> {
		if !self.is_group_chat {
			return Err(Error::NotGroup);
		}

		self.ensure_admin(caller)
	}

	pub fn referenced_users(&self) -> impl Iterator<Item = Uuid> + '_ {
		self.participants
			.iter()
			.copied()
			.chain(self.group_admin)
			.chain(self.messages.iter().map(|message| message.sender))
	}
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
	pub sender: Option<UserInfo>,
	pub content: String,
	pub created_at: DateTime<Utc>,
}

/// A room with its participants, admin and message senders expanded.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomView {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub is_group_chat: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_admin: Option<UserInfo>,
	/// Participants that still exist.
	pub participants: Vec<UserInfo>,
	pub messages: Vec<MessageView>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl ChatRoomView {
	pub fn new(room: ChatRoom, users: &HashMap<Uuid, UserInfo>) -> Self {
		Self {
			id: room.id,
			is_group_chat: room.is_group_chat,
			group_name: room.group_name,
			group_description: room.group_description,
			group_admin: room.group_admin.and_then(|id| users.get(&id).cloned()),
			participants: room
				.participants
				.iter()
				.filter_map(|id| users.get(id).cloned())
				.collect(),
			messages: room
				.messages
				.0
				.into_iter()
				.map(|message| MessageView {
					sender: users.get(&message.sender).cloned(),
					content: message.content,
					created_at: message.created_at,
				})
				.collect(),
			created_at: room.created_at,
			updated_at: room.updated_at,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomQuery {
	pub chatroom_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuery {
	pub chat_room_id: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CreateChatRoom {
	/// The other participants. You are always included.
	#[validate(length(min = 1))]
	pub participants: Vec<Uuid>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
	pub chat_room_id: Uuid,
	#[validate(length(min = 1))]
	pub content: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
	#[validate(length(min = 1, max = 128))]
	pub group_name: String,
	#[validate(length(min = 1, max = 1000))]
	pub group_description: String,
	#[serde(default)]
	pub participants: Vec<Uuid>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
	pub group_name: Option<String>,
	/// Users to add to the group.
	#[serde(default)]
	pub participants: Vec<Uuid>,
}
