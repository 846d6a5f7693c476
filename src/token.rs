//! Stateless bearer tokens.
//!
//! A token binds a principal id and its credential space ([`Principal`]) to a
//! request. Nothing is persisted, so tokens cannot be revoked; they only expire
//! when a lifetime is configured.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The credential space a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Principal {
	User,
	Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	pub sub: Uuid,
	pub kind: Principal,
	pub iat: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
}

#[derive(Clone)]
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: Option<chrono::Duration>,
}

impl Keys {
	pub fn new(secret: &[u8], ttl: Option<chrono::Duration>) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);

		validation.required_spec_claims.clear();
		validation.validate_exp = ttl.is_some();
		validation.leeway = 0;

		if ttl.is_some() {
			validation.required_spec_claims.insert("exp".into());
		}

		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation,
			ttl,
		}
	}

	pub fn issue(&self, id: Uuid, kind: Principal) -> Result<String, jsonwebtoken::errors::Error> {
		let now = chrono::Utc::now();
		let claims = Claims {
			sub: id,
			kind,
			iat: now.timestamp(),
			exp: self.ttl.map(|ttl| (now + ttl).timestamp()),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
	}

	/// Verifies the signature (and expiry, if configured) and returns the claims.
	pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map(|data| data.claims)
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::{Claims, Keys, Principal};

	#[test]
	fn test_issue_then_verify() {
		let keys = Keys::new(b"secret", None);
		let id = Uuid::new_v4();

		let token = keys.issue(id, Principal::Admin).unwrap();
		let claims = keys.verify(&token).unwrap();

		assert_eq!(claims.sub, id);
		assert_eq!(claims.kind, Principal::Admin);
		assert!(claims.exp.is_none());
	}

	#[test]
	fn test_wrong_secret_is_rejected() {
		let token = Keys::new(b"secret", None)
			.issue(Uuid::new_v4(), Principal::User)
			.unwrap();

		assert!(Keys::new(b"other", None).verify(&token).is_err());
	}

	#[test]
	fn test_tampered_token_is_rejected() {
		let keys = Keys::new(b"secret", None);
		let mut token = keys.issue(Uuid::new_v4(), Principal::User).unwrap();

		token.push('x');

		assert!(keys.verify(&token).is_err());
		assert!(keys.verify("not a token").is_err());
	}

	#[test]
	fn test_expired_token_is_rejected() {
		let keys = Keys::new(b"secret", Some(chrono::Duration::minutes(5)));

		let fresh = keys.issue(Uuid::new_v4(), Principal::User).unwrap();
		assert!(keys.verify(&fresh).unwrap().exp.is_some());

		let now = chrono::Utc::now().timestamp();
		let stale = jsonwebtoken::encode(
			&jsonwebtoken::Header::default(),
			&Claims {
				sub: Uuid::new_v4(),
				kind: Principal::User,
				iat: now - 600,
				exp: Some(now - 300),
			},
			&keys.encoding,
		)
		.unwrap();

		assert!(keys.verify(&stale).is_err());
	}
}
