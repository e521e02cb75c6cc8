use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AuthSource, LoginResponse};
use crate::error::SourceError;
use crate::images::ImageStore;
use crate::record::{slot_field, Celebrity};
use crate::source::{DataSource, Mutation};
use crate::viewer::Viewer;

/// Talks to the API over HTTP. Clones share the bearer token, so setting
/// it after login is seen by every clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
	http: reqwest::Client,
	base_url: String,
	token: Arc<ArcSwapOption<String>>,
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(alias = "message")]
	error: String,
}

#[derive(Deserialize)]
struct UploadResponse {
	#[serde(rename = "imagePath")]
	image_path: String,
}

impl HttpClient {
	/// `base_url` includes the version prefix, e.g. `http://localhost:4000/v1`.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self::with_client(reqwest::Client::new(), base_url)
	}

	pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into().trim_end_matches('/').to_owned(),
			token: Arc::new(ArcSwapOption::empty()),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn set_token(&self, token: Option<String>) {
		self.token.store(token.map(Arc::new));
	}

	pub fn token(&self) -> Option<Arc<String>> {
		self.token.load_full()
	}

	fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base_url)
	}

	fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
		match self.token.load_full() {
			Some(token) => builder.bearer_auth(token.as_str()),
			None => builder,
		}
	}

	async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
		let status = response.status();
		let bytes = response.bytes().await?;

		if !status.is_success() {
			let message = serde_json::from_slice::<ErrorBody>(&bytes)
				.map(|body| body.error)
				.unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());

			return Err(SourceError::Status {
				status: status.as_u16(),
				message,
			});
		}

		serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode(err.to_string()))
	}

	/// Text parts in the shape the celebrities endpoint reads. Empty values
	/// are left out, except `owner`.
	fn mutation_form(mutation: Mutation) -> Form {
		let mut form = Form::new();
		if let Some(action) = mutation.action() {
			form = form.text("action", action);
		}

		let record = match mutation {
			Mutation::Delete { id } => return form.text("id", id.to_string()),
			Mutation::Upsert(record) | Mutation::Duplicate(record) => record,
		};

		if let Some(id) = record.id {
			form = form.text("id", id.to_string());
		}

		for (key, value) in [
			("geo", record.geo),
			("name", record.name),
			("category", record.category),
			("subject", record.subject),
			("about", record.about),
		] {
			if !value.is_empty() {
				form = form.text(key, value);
			}
		}

		form = form.text("owner", record.owner.unwrap_or_default());

		for (slot, name) in record.images.iter() {
			form = form.text(slot_field(slot), name.to_owned());
		}

		form
	}
}

#[async_trait]
impl DataSource for HttpClient {
	async fn fetch_all(&self) -> Result<Vec<Celebrity>, SourceError> {
		let response = self.authorized(self.http.get(self.url("/celebrities"))).send().await?;
		Self::decode(response).await
	}

	async fn submit(&self, mutation: Mutation) -> Result<Celebrity, SourceError> {
		if self.token.load().is_none() {
			return Err(SourceError::Unauthenticated);
		}

		let response = self
			.authorized(self.http.post(self.url("/celebrities")))
			.multipart(Self::mutation_form(mutation))
			.send()
			.await?;

		Self::decode(response).await
	}
}

#[async_trait]
impl AuthSource for HttpClient {
	async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, SourceError> {
		let response = self
			.http
			.post(self.url("/auth/login"))
			.json(&json!({ "email": email, "password": password }))
			.send()
			.await?;

		let login: LoginResponse = Self::decode(response).await?;
		self.set_token(login.token.clone());

		Ok(login)
	}

	async fn whoami(&self, token: &str) -> Result<Viewer, SourceError> {
		let response = self.http.get(self.url("/auth/me")).bearer_auth(token).send().await?;
		let viewer = Self::decode(response).await?;
		self.set_token(Some(token.to_owned()));

		Ok(viewer)
	}

	fn forget(&self) {
		self.set_token(None);
	}
}

#[async_trait]
impl ImageStore for HttpClient {
	async fn upload(&self, id: i64, image_name: &str, image_data: &str) -> Result<String, SourceError> {
		let response = self
			.authorized(self.http.post(self.url("/images")))
			.json(&json!({ "id": id, "imageName": image_name, "imageData": image_data }))
			.send()
			.await?;

		let uploaded: UploadResponse = Self::decode(response).await?;
		Ok(uploaded.image_path)
	}

	async fn delete(&self, id: i64, image_name: &str) -> Result<(), SourceError> {
		let response = self
			.authorized(self.http.delete(self.url("/images")))
			.json(&json!({ "id": id, "imageName": image_name }))
			.send()
			.await?;

		Self::decode::<serde_json::Value>(response).await?;
		Ok(())
	}
}
