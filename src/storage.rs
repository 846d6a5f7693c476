//! Object storage for user-supplied files.
//!
//! Files arrive base64-encoded (optionally as a `data:` URI) and are handed to
//! the storage provider, which returns the public URL stored on the record.

use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("object storage is not configured")]
	NotConfigured,
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("provider rejected the upload: {0}")]
	Rejected(String),
}

/// Stores a base64 payload and returns its public URL.
#[axum::async_trait]
pub trait ObjectStorage: Send + Sync {
	async fn upload(&self, data: &str, folder: Option<&str>) -> Result<String, Error>;
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
	pub cloud_name: String,
	pub api_key: String,
	pub api_secret: String,
}

/// Uploads through Cloudinary's signed upload API.
pub struct Cloudinary {
	client: reqwest::Client,
	config: CloudinaryConfig,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
	secure_url: Option<String>,
	url: Option<String>,
	error: Option<UploadError>,
}

#[derive(serde::Deserialize)]
struct UploadError {
	message: String,
}

impl Cloudinary {
	pub fn new(config: CloudinaryConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			config,
		}
	}

	fn endpoint(&self) -> String {
		format!(
			"https://api.cloudinary.com/v1_1/{}/auto/upload",
			self.config.cloud_name
		)
	}
}

/// Signs the upload parameters: sorted `key=value` pairs joined with `&`,
/// followed by the API secret.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
	let mut params = params.to_vec();
	params.sort_unstable_by_key(|(key, _)| *key);

	let joined = params
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	let mut hasher = Sha256::new();
	hasher.update(joined.as_bytes());
	hasher.update(secret.as_bytes());

	format!("{:x}", hasher.finalize())
}

/// Accepts either a bare base64 string or a `data:` URI.
fn as_data_uri(data: &str) -> String {
	if data.starts_with("data:") {
		data.to_owned()
	} else {
		format!("data:application/octet-stream;base64,{data}")
	}
}

#[axum::async_trait]
impl ObjectStorage for Cloudinary {
	async fn upload(&self, data: &str, folder: Option<&str>) -> Result<String, Error> {
		let timestamp = chrono::Utc::now().timestamp().to_string();

		let mut signed = vec![("timestamp", timestamp.as_str())];
		if let Some(folder) = folder {
			signed.push(("folder", folder));
		}

		let signature = sign(&signed, &self.config.api_secret);
		let file = as_data_uri(data);

		let mut form = vec![
			("file", file.as_str()),
			("api_key", self.config.api_key.as_str()),
			("signature", signature.as_str()),
			("signature_algorithm", "sha256"),
		];
		form.extend(signed);

		let response = self
			.client
			.post(self.endpoint())
			.form(&form)
			.send()
			.await?
			.json::<UploadResponse>()
			.await?;

		if let Some(error) = response.error {
			return Err(Error::Rejected(error.message));
		}

		let url = response
			.secure_url
			.or(response.url)
			.ok_or_else(|| Error::Rejected("response did not contain a url".into()))?;

		tracing::info!(
			histogram.upload_bytes = data.len() as u64,
			folder = folder.unwrap_or_default(),
			%url,
			"uploaded file"
		);

		Ok(url)
	}
}

/// Used when no provider is configured, so the server still starts.
pub struct Disabled;

#[axum::async_trait]
impl ObjectStorage for Disabled {
	async fn upload(&self, _data: &str, _folder: Option<&str>) -> Result<String, Error> {
		Err(Error::NotConfigured)
	}
}
