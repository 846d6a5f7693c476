#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod mail;
mod openapi;
mod password;
mod route;
mod storage;
mod token;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This contains every dependency shared by handlers: the connection pool,
/// the password hasher, token keys and the external file and mail services.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub tokens: token::Keys,
	pub storage: Arc<dyn storage::ObjectStorage>,
	pub mailer: Arc<dyn mail::Mailer>,
}

/// Builds the application router, including the API documentation.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.merge(route::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive())
				.layer(Extension(Arc::new(api))),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = config::Config::from_env()?;
	let _guard = trace::init();

	let database = Database::connect(&config.database_url).await?;
	sqlx::migrate!().run(&database).await?;

	let storage: Arc<dyn storage::ObjectStorage> = match config.cloudinary {
		Some(cloudinary) => Arc::new(storage::Cloudinary::new(cloudinary)),
		None => {
			tracing::warn!("cloudinary is not configured, uploads will fail");
			Arc::new(storage::Disabled)
		}
	};

	let mailer: Arc<dyn mail::Mailer> = match config.mail {
		Some(mail) => Arc::new(mail::HttpMailer::new(mail)),
		None => {
			tracing::warn!("mail is not configured, login codes will not be delivered");
			Arc::new(mail::LogMailer)
		}
	};

	let state = State {
		database,
		hasher: Argon2::default(),
		tokens: token::Keys::new(config.jwt_secret.as_bytes(), config.token_ttl),
		storage,
		mailer,
	};

	let address = SocketAddr::new(config.host, config.port);
	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!(%address, "listening");

	axum::serve(listener, app(state)).await?;

	Ok(())
}
