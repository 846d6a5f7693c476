use std::{env, net::IpAddr};

use crate::{mail::HttpMailerConfig, storage::CloudinaryConfig};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{0} is not valid: {1}")]
	Invalid(&'static str, String),
}

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug)]
pub struct Config {
	pub database_url: String,
	pub host: IpAddr,
	pub port: u16,
	pub jwt_secret: String,
	/// Lifetime of issued tokens. Tokens never expire when unset.
	pub token_ttl: Option<chrono::Duration>,
	pub cloudinary: Option<CloudinaryConfig>,
	pub mail: Option<HttpMailerConfig>,
}

fn required(key: &'static str) -> Result<String, Error> {
	env::var(key).map_err(|_| Error::Missing(key))
}

fn optional(key: &str) -> Option<String> {
	env::var(key).ok().filter(|value| !value.is_empty())
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, Error>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	match optional(key) {
		Some(value) => value
			.parse()
			.map_err(|e: T::Err| Error::Invalid(key, e.to_string())),
		None => Ok(default),
	}
}

/// Parses a token lifetime in seconds. Absent means tokens never expire.
fn token_ttl(secs: Option<String>) -> Result<Option<chrono::Duration>, Error> {
	secs.map(|secs| {
		secs.parse::<i64>()
			.map_err(|e| Error::Invalid("TOKEN_TTL_SECS", e.to_string()))
	})
	.transpose()
	.map(|secs| secs.map(chrono::Duration::seconds))
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		let token_ttl = token_ttl(optional("TOKEN_TTL_SECS"))?;

		let cloudinary = match (
			optional("CLOUDINARY_CLOUD_NAME"),
			optional("CLOUDINARY_API_KEY"),
			optional("CLOUDINARY_API_SECRET"),
		) {
			(Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
				cloud_name,
				api_key,
				api_secret,
			}),
			_ => None,
		};

		let mail = match (
			optional("MAIL_API_URL"),
			optional("MAIL_API_KEY"),
			optional("MAIL_FROM"),
		) {
			(Some(url), Some(api_key), Some(from)) => Some(HttpMailerConfig { url, api_key, from }),
			_ => None,
		};

		Ok(Self {
			database_url: required("DATABASE_URL")?,
			host: parsed("HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parsed("PORT", 3000)?,
			jwt_secret: required("JWT_SECRET")?,
			token_ttl,
			cloudinary,
			mail,
		})
	}
}

#[cfg(test)]
mod test {
	use super::{token_ttl, Error};

	#[test]
	fn test_token_ttl() {
		assert_eq!(token_ttl(None).unwrap(), None);
		assert_eq!(
			token_ttl(Some("3600".into())).unwrap(),
			Some(chrono::Duration::hours(1))
		);
		assert!(matches!(
			token_ttl(Some("an hour".into())),
			Err(Error::Invalid("TOKEN_TTL_SECS", _))
		));
	}
}
