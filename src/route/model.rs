use std::borrow::Cow;

use schemars::JsonSchema;
use serde::Serialize;

/// The body of every successful response.
///
/// The HTTP status is repeated in `status`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Envelope<T> {
	pub status: u16,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<Cow<'static, str>>,
}

impl<T> Envelope<T> {
	pub fn data(data: T) -> Self {
		Self {
			status: 200,
			data: Some(data),
			message: None,
		}
	}

	#[must_use]
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl Envelope<()> {
	/// An envelope with only a message.
	pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			status: 200,
			data: None,
			message: Some(message.into()),
		}
	}
}

/// Returns `true` if the optional string is missing or blank.
pub fn is_blank(value: Option<&str>) -> bool {
	value.map_or(true, |value| value.trim().is_empty())
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::{is_blank, Envelope};

	#[test]
	fn test_envelope_shape() {
		let value = serde_json::to_value(Envelope::data(1).with_message("ok")).unwrap();
		assert_eq!(value, json!({ "status": 200, "data": 1, "message": "ok" }));

		let value = serde_json::to_value(Envelope::message("done")).unwrap();
		assert_eq!(value, json!({ "status": 200, "message": "done" }));
	}

	#[test]
	fn test_is_blank() {
		assert!(is_blank(None));
		assert!(is_blank(Some("  ")));
		assert!(!is_blank(Some("x")));
	}
}
