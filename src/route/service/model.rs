use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Error;

/// The lifecycle of a service request. Every request starts out pending.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "service_status", rename_all = "lowercase")]
pub enum ServiceStatus {
	#[default]
	Pending,
	Accepted,
	Canceled,
	Completed,
}

impl FromStr for ServiceStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"accepted" => Ok(Self::Accepted),
			"canceled" => Ok(Self::Canceled),
			"completed" => Ok(Self::Completed),
			_ => Err(Error::InvalidStatus(s.to_owned())),
		}
	}
}

/// A task a user asked to be done, such as a pick-up and drop-off.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub pick_location: String,
	pub drop_location: String,
	pub date: String,
	pub time: String,
	pub phone_number: String,
	pub description: Option<String>,
	pub status: ServiceStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// The body of a service request. Everything except the description is required.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
	pub title: Option<String>,
	pub pick_location: Option<String>,
	pub drop_location: Option<String>,
	pub date: Option<String>,
	pub time: Option<String>,
	pub phone_number: Option<String>,
	#[validate(length(max = 1000))]
	pub description: Option<String>,
}

/// A service request with every required field present.
#[derive(Debug)]
pub struct NewService {
	pub title: String,
	pub pick_location: String,
	pub drop_location: String,
	pub date: String,
	pub time: String,
	pub phone_number: String,
	pub description: Option<String>,
}

impl TryFrom<ServiceInput> for NewService {
	type Error = Error;

	fn try_from(input: ServiceInput) -> Result<Self, Self::Error> {
		fn required(value: Option<String>) -> Result<String, Error> {
			value
				.filter(|value| !value.trim().is_empty())
				.ok_or(Error::MissingFields)
		}

		Ok(Self {
			title: required(input.title)?,
			pick_location: required(input.pick_location)?,
			drop_location: required(input.drop_location)?,
			date: required(input.date)?,
			time: required(input.time)?,
			phone_number: required(input.phone_number)?,
			description: input.description,
		})
	}
}

#[cfg(test)]
mod test {
	use super::{NewService, ServiceInput, ServiceStatus};
	use crate::route::service::Error;

	fn input() -> ServiceInput {
		ServiceInput {
			title: Some("Ride to clinic".into()),
			pick_location: Some("Home".into()),
			drop_location: Some("Clinic".into()),
			date: Some("2024-05-01".into()),
			time: Some("09:00".into()),
			phone_number: Some("555-0100".into()),
			description: None,
		}
	}

	#[test]
	fn test_all_required_fields() {
		assert!(NewService::try_from(input()).is_ok());

		let mut missing = input();
		missing.time = None;
		assert!(matches!(
			NewService::try_from(missing),
			Err(Error::MissingFields)
		));

		let mut blank = input();
		blank.pick_location = Some("  ".into());
		assert!(NewService::try_from(blank).is_err());
	}

	#[test]
	fn test_status_from_str() {
		assert_eq!(
			"canceled".parse::<ServiceStatus>().unwrap(),
			ServiceStatus::Canceled
		);
		assert!(matches!(
			"done".parse::<ServiceStatus>(),
			Err(Error::InvalidStatus(..))
		));
		assert_eq!(
			serde_json::to_value(ServiceStatus::Pending).unwrap(),
			"pending"
		);
	}
}
