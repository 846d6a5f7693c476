use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("All required fields must be provided")]
	MissingFields,
	#[error("No services found for this user")]
	NoServices,
	#[error("Invalid status value")]
	InvalidStatus(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/service", post_with(create_service, create_service_docs))
		.api_route("/services/user", get_with(get_services, get_services_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::MissingFields | Self::InvalidStatus(..) => StatusCode::BAD_REQUEST,
			Self::NoServices => StatusCode::NOT_FOUND,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_submit_and_list(pool: Database) {
		let app = app(pool);

		let (token, user_id) = signup(&app, "alice").await;

		let response = app
			.get("/services/user")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;
		assert_eq!(response.status_code(), 404);

		let response = app
			.post("/service")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "title": "Ride to clinic" }))
			.await;
		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"All required fields must be provided"
		);

		let response = app
			.post("/service")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({
				"title": "Ride to clinic",
				"pickLocation": "Home",
				"dropLocation": "Clinic",
				"date": "2024-05-01",
				"time": "09:00",
				"phoneNumber": "555-0100",
			}))
			.await;
		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();
		assert_eq!(body["message"], "Service request created successfully");
		assert_eq!(body["data"]["status"], "pending");
		assert_eq!(body["data"]["userId"], json!(user_id));

		let response = app
			.get("/services/user")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;
		assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 1);
	}
}
