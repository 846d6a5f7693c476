use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::Json,
	openapi::tag,
	password,
	route::{user::model::User, Envelope},
	token::Principal,
	AppState,
};

use super::{map_taken, model, Error, RouteError};

/// Sign up
/// Registers a new user account, returning a bearer token for it.
#[route(tag = tag::AUTH)]
pub async fn signup(
	State(state): State<AppState>,
	Json(input): Json<model::SignupInput>,
) -> Result<Json<Envelope<model::UserAuthenticated>>, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = password::hash(&state.hasher, &input.password, &user_id)?;

	let user = sqlx::query_as::<_, User>(
		r#"
			INSERT INTO "user" (id, username, email, password)
			VALUES ($1, $2, $3, $4)
			RETURNING *
		"#,
	)
	.bind(user_id)
	.bind(&input.username)
	.bind(&input.email)
	.bind(&hashed[..])
	.fetch_one(&state.database)
	.await
	.map_err(|e| map_taken(e, Error::UsernameTaken, Error::EmailTaken))?;

	let token = state.tokens.issue(user.id, Principal::User)?;

	tracing::info!(user = %user.id, "user signed up");

	Ok(Json(Envelope::data(model::Authenticated { token, user })))
}

/// Log in
/// Logs in with an email and password, returning a bearer token.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<Envelope<model::UserAuthenticated>>, RouteError> {
	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
		.bind(&input.email)
		.fetch_optional(&state.database)
		.await?
		.ok_or(Error::UnknownEmail)?;

	if !password::verify(&state.hasher, &input.password, &user.id, &user.password)? {
		return Err(Error::InvalidCredentials.into());
	}

	let token = state.tokens.issue(user.id, Principal::User)?;

	Ok(Json(Envelope::data(model::Authenticated { token, user })))
}
