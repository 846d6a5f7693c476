use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	error::RouteError,
	openapi::SECURITY_SCHEME_BEARER,
	route::{admin, auth, user},
	token::{self, Claims, Principal},
	Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Reads and verifies the bearer token of a request.
///
/// A missing header is [`auth::Error::NoToken`], anything that fails to verify
/// is [`auth::Error::InvalidToken`].
fn verify_bearer(parts: &request::Parts, keys: &token::Keys) -> Result<Claims, auth::Error> {
	let value = parts
		.headers
		.get(header::AUTHORIZATION)
		.ok_or(auth::Error::NoToken)?
		.to_str()
		.map_err(|_| auth::Error::InvalidToken)?;

	let token = value
		.strip_prefix(AUTHORIZATION_PREFIX)
		.ok_or(auth::Error::InvalidToken)?;

	keys.verify(token.trim()).map_err(|error| {
		tracing::debug!(%error, "rejected bearer token");
		auth::Error::InvalidToken
	})
}

/// Extracts the authenticated user from the bearer token.
///
/// Tokens issued to administrators are rejected with [`auth::Error::NotUser`].
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: user::model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	token::Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let claims = verify_bearer(parts, &token::Keys::from_ref(state))?;

		if claims.kind != Principal::User {
			return Err(auth::Error::NotUser.into());
		}

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, user::model::User>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(claims.sub)
			.fetch_optional(&database)
			.await?;

		let user = user.ok_or(auth::Error::UnknownPrincipal)?;

		Ok(Self { user })
	}
}

/// Extracts the authenticated administrator from the bearer token.
///
/// Users and administrators are separate credential spaces, so a valid user
/// token is rejected with [`auth::Error::NotAdmin`].
#[derive(Debug)]
pub struct AdminSession {
	pub admin: admin::model::Admin,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
	Database: FromRef<S>,
	token::Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let claims = verify_bearer(parts, &token::Keys::from_ref(state))?;

		if claims.kind != Principal::Admin {
			return Err(auth::Error::NotAdmin.into());
		}

		let database = Database::from_ref(state);
		let admin = sqlx::query_as::<_, admin::model::Admin>("SELECT * FROM admin WHERE id = $1")
			.bind(claims.sub)
			.fetch_optional(&database)
			.await?;

		let admin = admin.ok_or(auth::Error::NotAdmin)?;

		Ok(Self { admin })
	}
}

fn bearer_requirement(operation: &mut aide::openapi::Operation) {
	operation.security.push(
		[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
			.into_iter()
			.collect(),
	);
}

impl OperationInput for Session {
	/// Adds a bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		bearer_requirement(operation);
	}
}

impl OperationInput for AdminSession {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		bearer_requirement(operation);
	}
}

#[cfg(test)]
mod test {
	use axum::http::{header, Request};
	use uuid::Uuid;

	use super::verify_bearer;
	use crate::{
		route::auth,
		token::{Keys, Principal},
	};

	fn parts(authorization: Option<&str>) -> axum::http::request::Parts {
		let mut builder = Request::builder().uri("/usersMe");

		if let Some(value) = authorization {
			builder = builder.header(header::AUTHORIZATION, value);
		}

		builder.body(()).unwrap().into_parts().0
	}

	#[test]
	fn test_missing_token() {
		let keys = Keys::new(b"secret", None);

		assert!(matches!(
			verify_bearer(&parts(None), &keys),
			Err(auth::Error::NoToken)
		));
	}

	#[test]
	fn test_malformed_token() {
		let keys = Keys::new(b"secret", None);
		let token = keys.issue(Uuid::new_v4(), Principal::User).unwrap();

		assert!(matches!(
			verify_bearer(&parts(Some(&token)), &keys),
			Err(auth::Error::InvalidToken)
		));
		assert!(matches!(
			verify_bearer(&parts(Some("Bearer abc.def.ghi")), &keys),
			Err(auth::Error::InvalidToken)
		));
	}

	#[test]
	fn test_valid_token() {
		let keys = Keys::new(b"secret", None);
		let id = Uuid::new_v4();
		let token = keys.issue(id, Principal::User).unwrap();

		let claims = verify_bearer(&parts(Some(&format!("Bearer {token}"))), &keys).unwrap();

		assert_eq!(claims.sub, id);
	}
}
