//! Outgoing email, used to deliver admin one-time codes.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),
}

#[axum::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct HttpMailerConfig {
	pub url: String,
	pub api_key: String,
	pub from: String,
}

/// Sends mail through a JSON HTTP API (`POST {from, to, subject, html}` with a
/// bearer API key).
pub struct HttpMailer {
	client: reqwest::Client,
	config: HttpMailerConfig,
}

#[derive(Serialize)]
struct Outgoing<'a> {
	from: &'a str,
	to: [&'a str; 1],
	subject: &'a str,
	html: &'a str,
}

impl HttpMailer {
	pub fn new(config: HttpMailerConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			config,
		}
	}
}

#[axum::async_trait]
impl Mailer for HttpMailer {
	async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), Error> {
		self.client
			.post(&self.config.url)
			.bearer_auth(&self.config.api_key)
			.json(&Outgoing {
				from: &self.config.from,
				to: [to],
				subject,
				html,
			})
			.send()
			.await?
			.error_for_status()?;

		tracing::info!(to, subject, "sent mail");

		Ok(())
	}
}

/// Drops mail, logging only its recipient and subject. The body may carry a
/// login code, so it is never written out.
pub struct LogMailer;

#[axum::async_trait]
impl Mailer for LogMailer {
	async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), Error> {
		tracing::warn!(
			to,
			subject,
			bytes = html.len(),
			"no mail provider configured, dropping mail"
		);

		Ok(())
	}
}

/// The body of the one-time code email.
pub fn otp_body(code: &str) -> String {
	format!("Your OTP code is <b>{code}</b>. It will expire in 5 minutes.")
}
