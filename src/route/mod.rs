use aide::axum::{routing::get_with, ApiRouter};

use crate::{extract::Json, AppState};

pub mod admin;
pub mod auth;
pub mod chat;
pub mod docs;
pub mod model;
pub mod post;
pub mod service;
pub mod user;

pub use model::Envelope;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/test",
			get_with(health, |op| op.summary("Health check")),
		)
		.merge(auth::routes())
		.merge(user::routes())
		.merge(post::routes())
		.merge(chat::routes())
		.merge(service::routes())
		.merge(admin::routes())
}

async fn health() -> Json<&'static str> {
	Json("Backend is working!!")
}
