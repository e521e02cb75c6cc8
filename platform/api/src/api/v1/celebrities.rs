use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use common::http::ext::{OptionExt, RequestGlobalExt, ResultExt};
use common::http::router::builder::RouterBuilder;
use common::http::router::Router;
use common::http::RouteError;
use common::make_response;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use multer::{Constraints, SizeLimit};
use platform_view::record::{parse_slot_field, ImageSlots};
use platform_view::Celebrity;
use serde_json::json;

use crate::api::auth::{AuthData, AuthError};
use crate::api::error::{ApiError, Result};
use crate::api::ext::{read_body, RequestContextExt};
use crate::api::Body;
use crate::config::{ApiConfig, ImagesConfig};
use crate::global::ApiGlobal;

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, Body, RouteError<ApiError>> {
	Router::builder()
		.get("/", list::<G>)
		.post("/", mutate::<G>)
		.post("/create", create::<G>)
}

fn json_record(status: StatusCode, record: &Celebrity) -> Result<Response<Body>> {
	let body = serde_json::to_value(record).map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to encode record"))?;
	Ok(make_response!(status, body))
}

async fn list<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;

	let records = global
		.db()
		.list_celebrities()
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;

	let body = serde_json::to_value(&records).map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to encode records"))?;
	Ok(make_response!(StatusCode::OK, body))
}

/// Creates an empty record owned by the caller.
async fn create<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_editor().await?;

	let record = Celebrity {
		owner: Some(auth.user.name.clone()),
		..Default::default()
	};

	let saved = global
		.db()
		.insert_celebrity(&record)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;

	tracing::info!(id = ?saved.id, user = %auth.user.email, "created blank celebrity");
	json_record(StatusCode::CREATED, &saved)
}

struct UploadedImage {
	slot: usize,
	file_name: Option<String>,
	bytes: Bytes,
}

/// The multipart form of a celebrity mutation. Absent fields are `None`.
#[derive(Default)]
struct CelebrityForm {
	action: Option<String>,
	id: Option<String>,
	geo: Option<String>,
	name: Option<String>,
	category: Option<String>,
	subject: Option<String>,
	about: Option<String>,
	owner: Option<String>,
	images: ImageSlots,
	files: Vec<UploadedImage>,
}

impl CelebrityForm {
	fn id(&self) -> Result<Option<i64>> {
		self.id
			.as_deref()
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(str::parse::<i64>)
			.transpose()
			.map_ignore_err_route((StatusCode::BAD_REQUEST, "invalid id"))
	}

	fn require_id(&self) -> Result<i64> {
		self.id()?.map_err_route((StatusCode::BAD_REQUEST, "missing id"))
	}

	/// Overlays the submitted fields on `base`.
	fn apply(&self, mut base: Celebrity) -> Celebrity {
		for (target, value) in [
			(&mut base.geo, &self.geo),
			(&mut base.name, &self.name),
			(&mut base.category, &self.category),
			(&mut base.subject, &self.subject),
			(&mut base.about, &self.about),
		] {
			if let Some(value) = value {
				*target = value.clone();
			}
		}

		if let Some(owner) = self.owner.as_deref().filter(|o| !o.trim().is_empty()) {
			base.owner = Some(owner.to_owned());
		}

		for (slot, name) in self.images.iter() {
			base.images.set(slot, Some(name.to_owned()));
		}

		base
	}
}

/// Name under which an uploaded file is stored, keeping a sane extension.
fn stored_name(slot: usize, original: Option<&str>) -> String {
	let ext = original
		.and_then(|name| name.rsplit_once('.'))
		.map(|(_, ext)| ext.to_ascii_lowercase())
		.filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
		.unwrap_or_else(|| "jpg".to_owned());

	format!("{}-cimg{slot}.{ext}", chrono::Utc::now().timestamp_millis())
}

async fn parse_form(req: Request<Incoming>, max_body: usize, max_image: usize) -> Result<CelebrityForm> {
	let content_type = req
		.headers()
		.get(hyper::header::CONTENT_TYPE)
		.map_err_route((StatusCode::BAD_REQUEST, "missing content-type header"))?
		.to_str()
		.map_ignore_err_route((StatusCode::BAD_REQUEST, "invalid content-type header"))?;

	let boundary = multer::parse_boundary(content_type)
		.map_ignore_err_route((StatusCode::BAD_REQUEST, "invalid content-type header"))?;

	let body = read_body(req, max_body).await?;

	let constraints = Constraints::new().size_limit(SizeLimit::new().per_field(max_image as u64));
	let mut multipart = multer::Multipart::with_constraints(
		futures::stream::once(async move { Ok::<_, Infallible>(body) }),
		boundary,
		constraints,
	);

	let mut form = CelebrityForm::default();

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err_route((StatusCode::BAD_REQUEST, "invalid multipart body"))?
	{
		let name = field
			.name()
			.map_err_route((StatusCode::BAD_REQUEST, "invalid multipart body"))?
			.to_owned();

		if let (Some(slot), Some(file_name)) = (parse_slot_field(&name), field.file_name()) {
			let file_name = Some(file_name.to_owned());
			let bytes = field
				.bytes()
				.await
				.map_err_route((StatusCode::PAYLOAD_TOO_LARGE, "image too large"))?;

			if !bytes.is_empty() {
				form.files.push(UploadedImage { slot, file_name, bytes });
			}
			continue;
		}

		let value = field
			.text()
			.await
			.map_err_route((StatusCode::BAD_REQUEST, "invalid multipart body"))?;

		match name.as_str() {
			"action" => form.action = Some(value),
			"id" => form.id = Some(value),
			"geo" => form.geo = Some(value),
			"name" => form.name = Some(value),
			"category" => form.category = Some(value),
			"subject" => form.subject = Some(value),
			"about" => form.about = Some(value),
			"owner" => form.owner = Some(value),
			other => match parse_slot_field(other) {
				Some(slot) => {
					form.images.set(slot, Some(value));
				}
				None => tracing::debug!(field = other, "ignoring unknown form field"),
			},
		}
	}

	Ok(form)
}

/// Writes uploaded files for record `id` and points their slots at them.
async fn store_files<G: ApiGlobal>(global: &Arc<G>, id: i64, files: &[UploadedImage], record: &mut Celebrity) -> Result<()> {
	for file in files {
		let name = stored_name(file.slot, file.file_name.as_deref());

		global
			.image_store()
			.save(id, &name, &file.bytes)
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to store image"))?;

		record.images.set(file.slot, Some(name));
	}

	Ok(())
}

fn check_required(record: &Celebrity) -> Result<()> {
	record.validate().map_err(|err| {
		RouteError::<ApiError>::from((StatusCode::BAD_REQUEST, format!("Missing required fields: {}", field_list(&err))))
	})
}

fn field_list(err: &platform_view::error::ValidationError) -> String {
	err.fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

async fn existing<G: ApiGlobal>(global: &Arc<G>, id: i64) -> Result<Celebrity> {
	global
		.db()
		.get_celebrity(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
		.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))
}

fn check_can_modify(auth: &AuthData, record: &Celebrity) -> Result<()> {
	if auth.can_modify(record) {
		Ok(())
	} else {
		Err(AuthError::Forbidden.into())
	}
}

/// Single entry point for changes, dispatched on the `action` field:
/// `delete`, `duplicate`, or absent for create/update by presence of `id`.
async fn mutate<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_editor().await?;

	let form = parse_form(
		req,
		global.config::<ApiConfig>().max_body_size,
		global.config::<ImagesConfig>().max_size,
	)
	.await?;

	match form.action.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
		Some("delete") => delete(&global, &auth, &form).await,
		Some("duplicate") => duplicate(&global, &auth, &form).await,
		Some(_) => Err((StatusCode::BAD_REQUEST, "unknown action").into()),
		None => upsert(&global, &auth, &form).await,
	}
}

async fn delete<G: ApiGlobal>(global: &Arc<G>, auth: &AuthData, form: &CelebrityForm) -> Result<Response<Body>> {
	let id = form.require_id()?;
	check_can_modify(auth, &existing(global, id).await?)?;

	let deleted = global
		.db()
		.delete_celebrity(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
		.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))?;

	if let Err(err) = global.image_store().delete_all(id).await {
		tracing::warn!(id, error = %err, "failed to remove images of deleted celebrity");
	}

	tracing::info!(id, user = %auth.user.email, "deleted celebrity");
	json_record(StatusCode::OK, &deleted)
}

async fn duplicate<G: ApiGlobal>(global: &Arc<G>, auth: &AuthData, form: &CelebrityForm) -> Result<Response<Body>> {
	let source_id = form.require_id()?;
	let source = existing(global, source_id).await?;

	let mut record = form.apply(source);
	if form.owner.as_deref().map_or(true, |o| o.trim().is_empty()) {
		record.owner = Some(auth.user.name.clone());
	}
	check_can_modify(auth, &record)?;

	let mut saved = global
		.db()
		.insert_celebrity(&record)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;
	let id = saved.id.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "record saved without id"))?;

	for (_, name) in record.images.iter() {
		match global.image_store().copy(source_id, id, name).await {
			Ok(true) => {}
			Ok(false) => tracing::debug!(source_id, name, "image to copy is missing"),
			Err(err) => tracing::warn!(source_id, name, error = %err, "failed to copy image"),
		}
	}

	if !form.files.is_empty() {
		store_files(global, id, &form.files, &mut saved).await?;
		saved = global
			.db()
			.update_celebrity(id, &saved)
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
			.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))?;
	}

	tracing::info!(source_id, id, user = %auth.user.email, "duplicated celebrity");
	json_record(StatusCode::CREATED, &saved)
}

async fn upsert<G: ApiGlobal>(global: &Arc<G>, auth: &AuthData, form: &CelebrityForm) -> Result<Response<Body>> {
	let mut record = form.apply(Celebrity::default());
	if record.owner.is_none() {
		record.owner = Some(auth.user.name.clone());
	}

	check_required(&record)?;
	// Only admins may hand a record to someone else.
	check_can_modify(auth, &record)?;

	match form.id()? {
		Some(id) => {
			check_can_modify(auth, &existing(global, id).await?)?;

			store_files(global, id, &form.files, &mut record).await?;

			let saved = global
				.db()
				.update_celebrity(id, &record)
				.await
				.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
				.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))?;

			tracing::info!(id, user = %auth.user.email, "updated celebrity");
			json_record(StatusCode::OK, &saved)
		}
		None => {
			let mut saved = global
				.db()
				.insert_celebrity(&record)
				.await
				.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;
			let id = saved.id.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "record saved without id"))?;

			if !form.files.is_empty() {
				store_files(global, id, &form.files, &mut saved).await?;
				saved = global
					.db()
					.update_celebrity(id, &saved)
					.await
					.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
					.map_err_route((StatusCode::NOT_FOUND, "Celebrity not found"))?;
			}

			tracing::info!(id, user = %auth.user.email, "created celebrity");
			json_record(StatusCode::CREATED, &saved)
		}
	}
}
