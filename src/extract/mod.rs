mod session;

pub use session::{AdminSession, Session};

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// Runs the input's `validator` rules. Failures render as a 400 listing every
/// offending field.
fn validated<T: Validate>(input: T) -> Result<T, AppError> {
	input.validate().map_err(|errors| {
		tracing::debug!(fields = ?errors.field_errors().keys(), "rejected input");
		AppError::Validation(errors)
	})?;

	Ok(input)
}

/// A JSON request body checked against its schema and validation rules, or a
/// JSON response body.
///
/// ```rust
/// async fn route(Json(input): Json<SendMessage>) -> Json<Envelope<ChatRoom>> {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> IntoResponse for Json<T> {
	fn into_response(self) -> Response<Body> {
		axum::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum_jsonschema::Json(input) =
			axum_jsonschema::Json::<T>::from_request(req, state).await?;

		validated(input).map(Self)
	}
}

/// Query parameters such as `?postId=...`, checked against validation rules.
#[derive(OperationIo)]
#[aide(input_with = "axum::extract::Query<T>", json_schema)]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: DeserializeOwned + Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Query(input) =
			axum::extract::Query::<T>::from_request_parts(parts, state).await?;

		validated(input).map(Self)
	}
}

#[cfg(test)]
mod test {
	use axum::{routing::post, Router};
	use axum_test::TestServer;
	use schemars::JsonSchema;
	use serde::Deserialize;
	use serde_json::{json, Value};
	use validator::Validate;

	use super::{Json, Query};

	#[derive(Deserialize, Validate, JsonSchema)]
	struct Note {
		#[validate(length(min = 1))]
		text: String,
	}

	#[derive(Deserialize, Validate)]
	#[serde(rename_all = "camelCase")]
	struct Target {
		post_id: uuid::Uuid,
	}

	async fn echo(Query(target): Query<Target>, Json(note): Json<Note>) -> Json<Value> {
		Json(json!({ "postId": target.post_id, "text": note.text }))
	}

	fn server() -> TestServer {
		TestServer::new(Router::new().route("/notes", post(echo))).unwrap()
	}

	#[tokio::test]
	async fn test_valid_input() {
		let id = uuid::Uuid::new_v4();
		let response = server()
			.post("/notes")
			.add_query_param("postId", id)
			.json(&json!({ "text": "hi" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), json!({ "postId": id, "text": "hi" }));
	}

	#[tokio::test]
	async fn test_rejections_use_error_envelope() {
		let server = server();

		let response = server
			.post("/notes")
			.add_query_param("postId", uuid::Uuid::new_v4())
			.json(&json!({ "text": "" }))
			.await;
		let body = response.json::<Value>();

		assert_eq!(response.status_code(), 400);
		assert_eq!(body["status"], 400);
		assert!(body["message"].as_str().unwrap().starts_with("text: "));

		let response = server
			.post("/notes")
			.json(&json!({ "text": "hi" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["status"], 400);

		let response = server
			.post("/notes")
			.add_query_param("postId", uuid::Uuid::new_v4())
			.json(&json!({ "body": "hi" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "invalid request body");
	}
}
