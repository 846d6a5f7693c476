use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	route::Envelope,
	Database,
};

use super::{model, Error, RouteError};

/// Request a service
/// Submits a service request. It starts out pending.
#[route(tag = tag::SERVICE)]
pub async fn create_service(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::ServiceInput>,
) -> Result<Json<Envelope<model::Service>>, RouteError> {
	let service = model::NewService::try_from(input)?;

	let service = sqlx::query_as::<_, model::Service>(
		r#"
			INSERT INTO service
				(user_id, title, pick_location, drop_location, date, time, phone_number,
				description)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
			RETURNING *
		"#,
	)
	.bind(session.user.id)
	.bind(&service.title)
	.bind(&service.pick_location)
	.bind(&service.drop_location)
	.bind(&service.date)
	.bind(&service.time)
	.bind(&service.phone_number)
	.bind(&service.description)
	.fetch_one(&database)
	.await?;

	tracing::info!(service = %service.id, user = %service.user_id, "service requested");

	Ok(Json(
		Envelope::data(service).with_message("Service request created successfully"),
	))
}

/// Get own services
/// Returns every service you requested, newest first.
#[route(tag = tag::SERVICE)]
pub async fn get_services(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Envelope<Vec<model::Service>>>, RouteError> {
	let services = sqlx::query_as::<_, model::Service>(
		"SELECT * FROM service WHERE user_id = $1 ORDER BY created_at DESC",
	)
	.bind(session.user.id)
	.fetch_all(&database)
	.await?;

	if services.is_empty() {
		return Err(Error::NoServices.into());
	}

	Ok(Json(
		Envelope::data(services).with_message("Services retrieved successfully"),
	))
}
