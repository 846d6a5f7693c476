use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Query, Session},
	openapi::tag,
	route::Envelope,
	AppState, Database,
};

use super::{model, views, Error, RouteError};

async fn find_post(database: &Database, post_id: Uuid) -> Result<model::Post, RouteError> {
	let post = sqlx::query_as::<_, model::Post>("SELECT * FROM post WHERE id = $1")
		.bind(post_id)
		.fetch_optional(database)
		.await?;

	Ok(post.ok_or(Error::UnknownPost(post_id))?)
}

/// Get all posts
/// Returns every post, newest first, as seen by you.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Envelope<Vec<model::PostView>>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>("SELECT * FROM post ORDER BY created_at DESC")
		.fetch_all(&database)
		.await?;

	Ok(Json(Envelope::data(
		views(&database, posts, session.user.id).await?,
	)))
}

/// Get followed posts
/// Returns your posts and the posts of every user you follow, newest first.
#[route(tag = tag::POST)]
pub async fn get_followed_posts(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Envelope<Vec<model::PostView>>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(
		r#"
			SELECT * FROM post
			WHERE user_id = $1 OR user_id IN (
				SELECT id FROM "user"
				WHERE follow_status @> jsonb_build_array(
					jsonb_build_object('userId', $1::uuid, 'followed', true)
				)
			)
			ORDER BY created_at DESC
		"#,
	)
	.bind(session.user.id)
	.fetch_all(&database)
	.await?;

	Ok(Json(Envelope::data(
		views(&database, posts, session.user.id).await?,
	)))
}

/// Get posts by user
/// Returns the posts a user authored or shared.
#[route(tag = tag::POST)]
pub async fn get_user_posts(
	State(database): State<Database>,
	session: Session,
	Query(query): Query<model::UserIdQuery>,
) -> Result<Json<Envelope<Vec<model::PostView>>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(
		r#"
			SELECT * FROM post
			WHERE user_id = $1 OR $1 = ANY(shares)
			ORDER BY created_at DESC
		"#,
	)
	.bind(query.user_id)
	.fetch_all(&database)
	.await?;

	if posts.is_empty() {
		return Err(Error::NoPosts.into());
	}

	let shared = posts
		.iter()
		.map(|post| post.shares.contains(&query.user_id))
		.collect::<Vec<_>>();

	let posts = views(&database, posts, session.user.id)
		.await?
		.into_iter()
		.zip(shared)
		.map(|(view, shared_by_user)| view.shared(shared_by_user))
		.collect();

	Ok(Json(Envelope::data(posts)))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	session: Session,
	Query(query): Query<model::PostIdQuery>,
) -> Result<Json<Envelope<model::PostView>>, RouteError> {
	let post = find_post(&database, query.post_id).await?;
	let view = views(&database, vec![post], session.user.id)
		.await?
		.pop()
		.ok_or(Error::UnknownPost(query.post_id))?;

	Ok(Json(Envelope::data(view)))
}

/// Create post
/// Creates a post. An `image` is uploaded and replaced by its URL.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Json(post): Json<model::CreatePost>,
) -> Result<Json<Envelope<model::Post>>, RouteError> {
	let image = match post.image.filter(|image| !image.is_empty()) {
		Some(image) => Some(state.storage.upload(&image, None).await?),
		None => None,
	};

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			INSERT INTO post (user_id, description, image)
			VALUES ($1, $2, $3)
			RETURNING *
		"#,
	)
	.bind(session.user.id)
	.bind(&post.description)
	.bind(&image)
	.fetch_one(&state.database)
	.await?;

	tracing::info!(post = %post.id, user = %post.user_id, "post created");

	Ok(Json(
		Envelope::data(post).with_message("Post Upload Successfully"),
	))
}

/// Update post
/// Updates the description and image of one of your posts.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(state): State<AppState>,
	session: Session,
	Json(update): Json<model::UpdatePost>,
) -> Result<Json<Envelope<model::Post>>, RouteError> {
	let mut post = find_post(&state.database, update.id).await?;

	if post.user_id != session.user.id {
		return Err(Error::NotOwner.into());
	}

	if let Some(description) = update.description.filter(|d| !d.is_empty()) {
		post.description = description;
	}

	if let Some(image) = update.image.filter(|image| !image.is_empty()) {
		post.image = Some(state.storage.upload(&image, None).await?);
	}

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			UPDATE post SET description = $2, image = $3, updated_at = now()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(post.id)
	.bind(&post.description)
	.bind(&post.image)
	.fetch_one(&state.database)
	.await?;

	Ok(Json(Envelope::data(post)))
}

/// Like post
/// Likes a post. A post can only be liked once per user.
#[route(tag = tag::POST)]
pub async fn like_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::PostIdInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let mut post = find_post(&database, input.post_id).await?;

	post.like(session.user.id)?;

	sqlx::query("UPDATE post SET likes = $2, updated_at = now() WHERE id = $1")
		.bind(post.id)
		.bind(&post.likes)
		.execute(&database)
		.await?;

	Ok(Json(Envelope::message("Post liked successfully")))
}

/// Share post
/// Shares a post. A post can only be shared once per user.
#[route(tag = tag::POST)]
pub async fn share_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::PostIdInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let mut post = find_post(&database, input.post_id).await?;

	post.share(session.user.id)?;

	sqlx::query("UPDATE post SET shares = $2, updated_at = now() WHERE id = $1")
		.bind(post.id)
		.bind(&post.shares)
		.execute(&database)
		.await?;

	Ok(Json(Envelope::message("Post shared successfully")))
}

/// Comment on post
#[route(tag = tag::POST)]
pub async fn comment_on_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CommentInput>,
) -> Result<Json<Envelope<()>>, RouteError> {
	let mut post = find_post(&database, input.post_id).await?;

	post.comment(session.user.id, input.text, chrono::Utc::now());

	sqlx::query("UPDATE post SET comments = $2, updated_at = now() WHERE id = $1")
		.bind(post.id)
		.bind(&post.comments)
		.execute(&database)
		.await?;

	Ok(Json(Envelope::message("Comment added successfully")))
}
