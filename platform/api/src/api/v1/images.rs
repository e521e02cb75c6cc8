use std::sync::Arc;

use common::http::ext::{OptionExt, RequestGlobalExt, ResultExt};
use common::http::router::builder::RouterBuilder;
use common::http::router::ext::RequestExt;
use common::http::router::Router;
use common::http::RouteError;
use common::make_response;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::{ApiError, Result};
use crate::api::ext::{read_json, RequestContextExt};
use crate::api::Body;
use crate::config::{ApiConfig, ImagesConfig};
use crate::global::ApiGlobal;
use crate::image_store::{content_type, decode_image_data, ImageStoreError};

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, Body, RouteError<ApiError>> {
	Router::builder()
		.post("/", upload::<G>)
		.delete("/", delete::<G>)
		.get("/:id/:name", serve::<G>)
}

fn store_error(err: ImageStoreError) -> RouteError<ApiError> {
	let (status, message) = match &err {
		ImageStoreError::InvalidName => (StatusCode::BAD_REQUEST, "Invalid image name"),
		ImageStoreError::InvalidData(_) => (StatusCode::BAD_REQUEST, "Invalid image data"),
		ImageStoreError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "Image too large"),
		ImageStoreError::NotFound => (StatusCode::NOT_FOUND, "Image not found"),
		ImageStoreError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to access image"),
	};

	RouteError::from((status, message, err))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest {
	id: i64,
	image_name: String,
	image_data: String,
}

async fn upload<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_editor().await?;
	let body: UploadRequest = read_json(req, global.config::<ApiConfig>().max_body_size).await?;

	let record = global
		.db()
		.get_celebrity(body.id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
		.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))?;
	if !auth.can_modify(&record) {
		return Err(crate::api::auth::AuthError::Forbidden.into());
	}

	let bytes = decode_image_data(&body.image_data).map_err(store_error)?;
	global
		.image_store()
		.save(body.id, &body.image_name, &bytes)
		.await
		.map_err(store_error)?;

	let base = global.config::<ImagesConfig>().base_url.trim_end_matches('/');

	tracing::info!(id = body.id, name = %body.image_name, size = bytes.len(), "uploaded image");
	Ok(make_response!(
		StatusCode::OK,
		json!({
			"success": true,
			"imagePath": format!("{base}/{}/{}", body.id, body.image_name),
		})
	))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
	id: i64,
	image_name: String,
}

async fn delete<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_editor().await?;
	let body: DeleteRequest = read_json(req, global.config::<ApiConfig>().max_body_size).await?;

	if let Some(record) = global
		.db()
		.get_celebrity(body.id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
	{
		if !auth.can_modify(&record) {
			return Err(crate::api::auth::AuthError::Forbidden.into());
		}
	}

	global
		.image_store()
		.delete(body.id, &body.image_name)
		.await
		.map_err(store_error)?;

	tracing::info!(id = body.id, name = %body.image_name, "deleted image");
	Ok(make_response!(StatusCode::OK, json!({ "success": true })))
}

async fn serve<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;

	let id = req
		.param("id")
		.and_then(|id| id.parse::<i64>().ok())
		.map_err_route((StatusCode::BAD_REQUEST, "invalid id"))?;
	let name = req.param("name").map_err_route((StatusCode::BAD_REQUEST, "missing name"))?;

	let bytes = global.image_store().read(id, name).await.map_err(store_error)?;

	Response::builder()
		.status(StatusCode::OK)
		.header(hyper::header::CONTENT_TYPE, content_type(name))
		.header(hyper::header::X_CONTENT_TYPE_OPTIONS, "nosniff")
		.header(hyper::header::CACHE_CONTROL, "public, max-age=3600")
		.body(Body::from(bytes))
		.map_ignore_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to build response"))
}
