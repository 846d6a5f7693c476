use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{AdminSession, Json, Query},
	mail,
	openapi::tag,
	password,
	route::{
		auth::{
			map_taken,
			model::{Authenticated, LoginInput, SignupInput},
		},
		post::model::Post,
		service::model::ServiceStatus,
		user::{self, model::User},
		Envelope,
	},
	token::Principal,
	AppState, Database,
};

use super::{model, Error, RouteError};

async fn find_admin(database: &Database, email: &str) -> Result<model::Admin, RouteError> {
	let admin = sqlx::query_as::<_, model::Admin>("SELECT * FROM admin WHERE email = $1")
		.bind(email)
		.fetch_optional(database)
		.await?;

	Ok(admin.ok_or(Error::UnknownAdmin)?)
}

/// Inserts an admin, mapping a taken username or email to `taken()`.
async fn insert_admin(
	state: &AppState,
	input: &SignupInput,
	is_super_admin: bool,
	taken: fn() -> Error,
) -> Result<model::Admin, RouteError> {
	let admin_id = Uuid::new_v4();
	let hashed = password::hash(&state.hasher, &input.password, &admin_id)?;

	sqlx::query_as::<_, model::Admin>(
		r#"
			INSERT INTO admin (id, username, email, password, is_super_admin)
			VALUES ($1, $2, $3, $4, $5)
			RETURNING *
		"#,
	)
	.bind(admin_id)
	.bind(&input.username)
	.bind(&input.email)
	.bind(&hashed[..])
	.bind(is_super_admin)
	.fetch_one(&state.database)
	.await
	.map_err(|e| map_taken(e, taken(), taken()))
}

/// Create super admin
/// Creates a super admin, returning a bearer token for it.
#[route(tag = tag::ADMIN)]
pub async fn create_super_admin(
	State(state): State<AppState>,
	Json(input): Json<SignupInput>,
) -> Result<Json<Envelope<model::AdminAuthenticated>>, RouteError> {
	let admin = insert_admin(&state, &input, true, || Error::EmailTaken).await?;

	let token = state.tokens.issue(admin.id, Principal::Admin)?;

	tracing::info!(admin = %admin.id, "super admin created");

	Ok(Json(Envelope::data(Authenticated { token, user: admin })))
}

/// Create admin
/// Creates a regular admin. Only super admins can do this.
#[route(tag = tag::ADMIN)]
pub async fn create_admin(
	State(state): State<AppState>,
	session: AdminSession,
	Json(input): Json<SignupInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	if !session.admin.is_super_admin {
		return Err(Error::NotSuperAdmin.into());
	}

	let admin = insert_admin(&state, &input, false, || Error::Taken).await?;

	tracing::info!(admin = %admin.id, by = %session.admin.id, "admin created");

	Ok(Json(Envelope::message("New admin created successfully")))
}

/// Request login code
/// Checks your password and emails you a one-time code valid for 5 minutes.
#[route(tag = tag::ADMIN)]
pub async fn send_otp(
	State(state): State<AppState>,
	Json(input): Json<LoginInput>,
) -> Result<Json<model::OtpSent>, RouteError> {
	let mut admin = find_admin(&state.database, &input.email).await?;

	if !password::verify(&state.hasher, &input.password, &admin.id, &admin.password)? {
		return Err(Error::InvalidPassword.into());
	}

	let code = model::generate_otp();
	let otp_expires = admin.issue_otp(code.clone(), chrono::Utc::now());

	sqlx::query("UPDATE admin SET otp = $2, otp_expires = $3, updated_at = now() WHERE id = $1")
		.bind(admin.id)
		.bind(&admin.otp)
		.bind(admin.otp_expires)
		.execute(&state.database)
		.await?;

	state
		.mailer
		.send(&admin.email, "Your OTP Code", &mail::otp_body(&code))
		.await?;

	tracing::info!(monotonic_counter.otp_issued = 1_u64, admin = %admin.id, "issued login code");

	Ok(Json(model::OtpSent {
		status: 200,
		message: "OTP sent to your email".into(),
		otp_expires,
	}))
}

/// Log in
/// Logs in with a one-time code and your password, returning a bearer token.
/// The code can only be used once.
#[route(tag = tag::ADMIN)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::OtpLoginInput>,
) -> Result<Json<Envelope<model::AdminAuthenticated>>, RouteError> {
	let admin = find_admin(&state.database, &input.email).await?;

	admin.check_otp(&input.otp, chrono::Utc::now())?;

	if !password::verify(&state.hasher, &input.password, &admin.id, &admin.password)? {
		return Err(Error::InvalidPassword.into());
	}

	let admin = sqlx::query_as::<_, model::Admin>(
		r#"
			UPDATE admin SET otp = NULL, otp_expires = NULL, updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(admin.id)
	.fetch_one(&state.database)
	.await?;

	let token = state.tokens.issue(admin.id, Principal::Admin)?;

	tracing::info!(admin = %admin.id, "admin logged in");

	Ok(Json(Envelope::data(Authenticated { token, user: admin })))
}

/// Update password
#[route(tag = tag::ADMIN)]
pub async fn update_password(
	State(state): State<AppState>,
	session: AdminSession,
	Json(input): Json<model::UpdatePasswordInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let admin = session.admin;

	if !password::verify(&state.hasher, &input.current_password, &admin.id, &admin.password)? {
		return Err(Error::WrongCurrentPassword.into());
	}

	let hashed = password::hash(&state.hasher, &input.new_password, &admin.id)?;

	sqlx::query("UPDATE admin SET password = $2, updated_at = now() WHERE id = $1")
		.bind(admin.id)
		.bind(&hashed[..])
		.execute(&state.database)
		.await?;

	Ok(Json(Envelope::message("Password updated successfully")))
}

/// List users
/// Returns every user with the number of users they follow.
#[route(tag = tag::ADMIN)]
pub async fn get_users(
	State(database): State<Database>,
	_session: AdminSession,
) -> Result<Json<Envelope<Vec<model::UserWithFollowers>>>, RouteError> {
	let users = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY created_at"#)
		.fetch_all(&database)
		.await?;

	let counts = users
		.iter()
		.map(|user| user::model::followers_count(&users, user.id))
		.collect::<Vec<_>>();

	let users = users
		.into_iter()
		.zip(counts)
		.map(|(user, followers_count)| model::UserWithFollowers {
			user,
			followers_count,
		})
		.collect();

	Ok(Json(Envelope::data(users)))
}

/// Get user
#[route(tag = tag::ADMIN)]
pub async fn get_user(
	State(database): State<Database>,
	_session: AdminSession,
	Query(query): Query<model::UserIdQuery>,
) -> Result<Json<Envelope<User>>, RouteError> {
	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
		.bind(query.user_id)
		.fetch_optional(&database)
		.await?
		.ok_or(Error::UnknownUser(query.user_id))?;

	Ok(Json(Envelope::data(user)))
}

/// Set verification status
/// Sets a user's verification status.
#[route(tag = tag::ADMIN)]
pub async fn update_user_status(
	State(database): State<Database>,
	_session: AdminSession,
	Query(query): Query<model::UserIdQuery>,
	Json(input): Json<model::VerificationStatusInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let status = input
		.is_verified
		.parse::<user::model::Verification>()
		.map_err(|_| Error::InvalidVerification)?;

	let updated = sqlx::query(
		r#"UPDATE "user" SET is_verified = $2, updated_at = now() WHERE id = $1"#,
	)
	.bind(query.user_id)
	.bind(status)
	.execute(&database)
	.await?;

	if updated.rows_affected() == 0 {
		return Err(Error::UnknownUser(query.user_id).into());
	}

	Ok(Json(Envelope::message(
		"User verification status updated successfully",
	)))
}

/// Delete user
/// Deletes a user. Their posts, services and chat rooms are kept.
#[route(tag = tag::ADMIN)]
pub async fn delete_user(
	State(database): State<Database>,
	session: AdminSession,
	Query(query): Query<model::UserIdQuery>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let deleted = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
		.bind(query.user_id)
		.execute(&database)
		.await?;

	if deleted.rows_affected() == 0 {
		return Err(Error::UnknownUser(query.user_id).into());
	}

	tracing::info!(user = %query.user_id, by = %session.admin.id, "user deleted");

	Ok(Json(Envelope::message("User deleted successfully")))
}

/// List posts
/// Returns every post with its author and interaction totals.
#[route(tag = tag::ADMIN)]
pub async fn get_posts(
	State(database): State<Database>,
	_session: AdminSession,
) -> Result<Json<Envelope<Vec<model::PostSummary>>>, RouteError> {
	let posts = sqlx::query_as::<_, Post>("SELECT * FROM post ORDER BY created_at DESC")
		.fetch_all(&database)
		.await?;

	let users = user::user_info(&database, posts.iter().map(|post| post.user_id)).await?;

	let posts = posts
		.into_iter()
		.map(|post| model::PostSummary {
			post_id: post.id,
			user_info: users.get(&post.user_id).cloned(),
			total_comments: post.comments.len(),
			total_likes: post.likes.len(),
			total_shares: post.shares.len(),
			description: post.description,
			image: post.image,
			created_at: post.created_at,
			updated_at: post.updated_at,
		})
		.collect();

	Ok(Json(Envelope::data(posts)))
}

/// Delete post
#[route(tag = tag::ADMIN)]
pub async fn delete_post(
	State(database): State<Database>,
	session: AdminSession,
	Query(query): Query<model::PostIdQuery>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let deleted = sqlx::query("DELETE FROM post WHERE id = $1")
		.bind(query.post_id)
		.execute(&database)
		.await?;

	if deleted.rows_affected() == 0 {
		return Err(Error::UnknownPost(query.post_id).into());
	}

	tracing::info!(post = %query.post_id, by = %session.admin.id, "post deleted");

	Ok(Json(Envelope::message("Post deleted successfully")))
}

/// List services
/// Returns every service request with its owner's contact details.
#[route(tag = tag::ADMIN)]
pub async fn get_services(
	State(database): State<Database>,
	_session: AdminSession,
) -> Result<Json<Envelope<Vec<model::ServiceSummary>>>, RouteError> {
	let services = sqlx::query_as::<_, model::ServiceSummary>(
		r#"
			SELECT
				s.id AS service_id, s.user_id, u.username, u.email, u.phone_number,
				s.title, s.pick_location, s.drop_location, s.date, s.time,
				s.description, s.status, s.created_at, s.updated_at
			FROM service s
			LEFT JOIN "user" u ON u.id = s.user_id
			ORDER BY s.created_at DESC
		"#,
	)
	.fetch_all(&database)
	.await?;

	Ok(Json(Envelope::data(services)))
}

/// Set service status
#[route(tag = tag::ADMIN)]
pub async fn update_service_status(
	State(database): State<Database>,
	_session: AdminSession,
	Json(input): Json<model::ServiceStatusInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let status = input
		.status
		.parse::<ServiceStatus>()
		.map_err(|_| Error::InvalidServiceStatus)?;

	let updated = sqlx::query("UPDATE service SET status = $2, updated_at = now() WHERE id = $1")
		.bind(input.service_id)
		.bind(status)
		.execute(&database)
		.await?;

	if updated.rows_affected() == 0 {
		return Err(Error::UnknownService(input.service_id).into());
	}

	Ok(Json(Envelope::message("Status updated")))
}

/// Delete service
#[route(tag = tag::ADMIN)]
pub async fn delete_service(
	State(database): State<Database>,
	session: AdminSession,
	Query(query): Query<model::ServiceIdQuery>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let deleted = sqlx::query("DELETE FROM service WHERE id = $1")
		.bind(query.service_id)
		.execute(&database)
		.await?;

	if deleted.rows_affected() == 0 {
		return Err(Error::UnknownService(query.service_id).into());
	}

	tracing::info!(service = %query.service_id, by = %session.admin.id, "service deleted");

	Ok(Json(Envelope::message("Service deleted successfully")))
}
