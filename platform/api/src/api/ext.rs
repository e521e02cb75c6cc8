use bytes::Bytes;
use common::http::ext::{OptionExt, ResultExt};
use common::http::router::ext::RequestExt;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::de::DeserializeOwned;

use super::error::{ApiError, Result};
use super::request_context::RequestContext;

pub trait RequestContextExt {
	fn context(&self) -> Result<RequestContext>;
}

impl<B> RequestContextExt for Request<B> {
	fn context(&self) -> Result<RequestContext> {
		self.data::<RequestContext>()
			.cloned()
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "missing request context"))
	}
}

/// Reads the whole body, failing once it grows past `limit` bytes.
pub async fn read_body(req: Request<Incoming>, limit: usize) -> Result<Bytes> {
	let collected = Limited::new(req.into_body(), limit).collect().await.map_err(|err| {
		common::http::RouteError::<ApiError>::from((StatusCode::PAYLOAD_TOO_LARGE, "request body too large or unreadable"))
			.with_source(Some(ApiError::ReadBody(err)))
	})?;

	Ok(collected.to_bytes())
}

pub async fn read_json<T: DeserializeOwned>(req: Request<Incoming>, limit: usize) -> Result<T> {
	let body = read_body(req, limit).await?;

	serde_json::from_slice(&body).map_err_route((StatusCode::BAD_REQUEST, "invalid json body"))
}
