use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Query, Session},
	openapi::tag,
	route::{model::is_blank, Envelope},
	AppState, Database,
};

use super::{model, Error, RouteError};

/// List users
/// Returns every registered user.
#[route(tag = tag::USER)]
pub async fn get_users(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<Envelope<Vec<model::User>>>, RouteError> {
	let users = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" ORDER BY created_at"#)
		.fetch_all(&database)
		.await?;

	Ok(Json(Envelope::data(users)))
}

/// Get own profile
#[route(tag = tag::USER)]
pub async fn get_me(session: Session) -> Result<Json<Envelope<model::User>>, RouteError> {
	Ok(Json(Envelope::data(session.user).with_message("User found")))
}

/// Get user profile
/// Returns another user's profile, including whether you follow them.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(database): State<Database>,
	session: Session,
	Query(query): Query<model::UserIdQuery>,
) -> Result<Json<Envelope<model::Profile>>, RouteError> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE id = $1"#)
		.bind(query.user_id)
		.fetch_optional(&database)
		.await?
		.ok_or(Error::UnknownUser(query.user_id))?;

	Ok(Json(Envelope::data(model::Profile::new(
		user,
		session.user.id,
	))))
}

/// Update own profile
/// Updates the fields that are present and non-empty. A `profileImage` is
/// uploaded and replaced by its URL.
#[route(tag = tag::USER)]
pub async fn update_me(
	State(state): State<AppState>,
	session: Session,
	Json(mut update): Json<model::UpdateUser>,
) -> Result<Json<Envelope<model::User>>, RouteError> {
	let mut user = session.user;

	update.profile_image = match update.profile_image.filter(|image| !image.is_empty()) {
		Some(image) => Some(state.storage.upload(&image, None).await?),
		None => None,
	};

	user.apply(update);

	let user = sqlx::query_as::<_, model::User>(
		r#"
			UPDATE "user"
			SET profile_image = $2, bio = $3, phone_number = $4, date_of_birth = $5,
				city = $6, disability = $7, updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(user.id)
	.bind(&user.profile_image)
	.bind(&user.bio)
	.bind(&user.phone_number)
	.bind(&user.date_of_birth)
	.bind(&user.city)
	.bind(&user.disability)
	.fetch_one(&state.database)
	.await?;

	Ok(Json(
		Envelope::data(user).with_message("Data Update Successfully"),
	))
}

/// Follow or unfollow
/// Toggles whether you follow the given user.
#[route(tag = tag::USER)]
pub async fn follow_unfollow(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::FollowInput>,
) -> Result<Json<Envelope<model::FollowResult>>, RouteError> {
	if input.user_id == session.user.id {
		return Err(Error::SelfFollow.into());
	}

	let mut target = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE id = $1"#)
		.bind(input.user_id)
		.fetch_optional(&database)
		.await?
		.ok_or(Error::UnknownUser(input.user_id))?;

	let followed = target.toggle_follower(session.user.id)?;

	sqlx::query(r#"UPDATE "user" SET follow_status = $2, updated_at = now() WHERE id = $1"#)
		.bind(target.id)
		.bind(&target.follow_status)
		.execute(&database)
		.await?;

	tracing::debug!(follower = %session.user.id, user = %target.id, followed, "toggled follow");

	let message = if followed {
		"User followed successfully"
	} else {
		"User unfollowed successfully"
	};

	Ok(Json(
		Envelope::data(model::FollowResult { followed }).with_message(message),
	))
}

/// Search users
/// Returns the users whose username contains the term, ignoring case.
#[route(tag = tag::USER)]
pub async fn search_by_username(
	State(database): State<Database>,
	_session: Session,
	Query(query): Query<model::SearchQuery>,
) -> Result<Json<Envelope<Vec<model::User>>>, RouteError> {
	let term = match query.username {
		Some(term) if !term.trim().is_empty() => term,
		_ => return Err(Error::MissingUsername.into()),
	};

	let users = sqlx::query_as::<_, model::User>(
		r#"SELECT * FROM "user" WHERE username ILIKE $1 ORDER BY username"#,
	)
	.bind(model::like_pattern(term.trim()))
	.fetch_all(&database)
	.await?;

	let envelope = if users.is_empty() {
		Envelope::data(users).with_message("No users found")
	} else {
		Envelope::data(users)
	};

	Ok(Json(envelope))
}

/// Request verification
/// Uploads a medical report and marks your account as awaiting verification.
#[route(tag = tag::USER)]
pub async fn request_verification(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::VerificationInput>,
) -> Result<Json<Envelope<model::User>>, RouteError> {
	let provided = |value: Option<String>| value.filter(|value| !is_blank(Some(value)));

	let (Some(description), Some(report)) = (
		provided(input.description),
		provided(input.base64_medical_report),
	) else {
		return Err(Error::MissingVerification.into());
	};

	let file = state.storage.upload(&report, Some("medical_reports")).await?;

	let user = sqlx::query_as::<_, model::User>(
		r#"
			UPDATE "user"
			SET verification_description = $2, verification_file = $3,
				is_verified = $4, updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(session.user.id)
	.bind(&description)
	.bind(&file)
	.bind(model::Verification::Requested)
	.fetch_one(&state.database)
	.await?;

	tracing::info!(user = %user.id, "verification requested");

	Ok(Json(
		Envelope::data(user).with_message("Verification request submitted"),
	))
}
