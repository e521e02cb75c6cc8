use std::sync::Arc;

use common::http::ext::{OptionExt, RequestGlobalExt, ResultExt};
use common::http::router::builder::RouterBuilder;
use common::http::router::Router;
use common::http::RouteError;
use common::make_response;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use platform_view::Role;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::{ApiError, Result};
use crate::api::ext::{read_json, RequestContextExt};
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::api::Body;
use crate::config::{ApiConfig, JwtConfig};
use crate::database::{hash_password, validate_email, validate_password, DatabaseError, NewUser, User, UserUpdate};
use crate::global::ApiGlobal;

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> RouterBuilder<Incoming, Body, RouteError<ApiError>> {
	Router::builder()
		.post("/login", login::<G>)
		.get("/me", me::<G>)
		.post("/register", register::<G>)
		.get("/users", list_users::<G>)
		.post("/users", update_user::<G>)
}

fn user_json(user: &User) -> serde_json::Value {
	json!({
		"id": user.id,
		"email": user.email,
		"name": user.name,
		"role": user.role,
	})
}

fn issue_token<G: ApiGlobal>(global: &Arc<G>, user: &User) -> Result<String> {
	AuthJwtPayload::for_user(user, global.config::<JwtConfig>())
		.serialize(global)
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to sign token"))
}

#[derive(Deserialize)]
struct LoginRequest {
	email: String,
	password: String,
}

async fn login<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let body: LoginRequest = read_json(req, global.config::<ApiConfig>().max_body_size).await?;

	let user = global
		.db()
		.user_by_email(body.email.trim())
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
		.filter(|user| user.verify_password(&body.password))
		.map_err_route((StatusCode::UNAUTHORIZED, "Invalid email or password"))?;

	let token = issue_token(&global, &user)?;

	tracing::info!(user = %user.email, "user logged in");
	Ok(make_response!(
		StatusCode::OK,
		json!({
			"user": user.viewer(),
			"token": token,
		})
	))
}

async fn me<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let auth = req.context()?.require_auth().await?;

	Ok(make_response!(StatusCode::OK, json!(auth.user.viewer())))
}

#[derive(Deserialize)]
struct RegisterRequest {
	email: String,
	password: String,
	#[serde(default)]
	name: Option<String>,
}

async fn register<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let body: RegisterRequest = read_json(req, global.config::<ApiConfig>().max_body_size).await?;

	let email = body.email.trim().to_owned();
	validate_email(&email).map_err(|msg| RouteError::<ApiError>::from((StatusCode::BAD_REQUEST, msg)))?;
	validate_password(&body.password).map_err(|msg| RouteError::<ApiError>::from((StatusCode::BAD_REQUEST, msg)))?;

	let name = body
		.name
		.map(|n| n.trim().to_owned())
		.filter(|n| !n.is_empty())
		.unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_owned());

	let password_hash = hash_password(&body.password)
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to hash password"))?;

	let user = match global
		.db()
		.insert_user(NewUser {
			email,
			name,
			password_hash,
			role: Role::NewUser,
		})
		.await
	{
		Ok(user) => user,
		Err(DatabaseError::Conflict(_)) => return Err((StatusCode::CONFLICT, "Email already registered").into()),
		Err(err) => return Err(RouteError::from((StatusCode::INTERNAL_SERVER_ERROR, "Database error", err))),
	};

	let token = issue_token(&global, &user)?;

	tracing::info!(user = %user.email, "user registered");
	Ok(make_response!(
		StatusCode::CREATED,
		json!({
			"user": user.viewer(),
			"token": token,
		})
	))
}

async fn list_users<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	req.context()?.require_admin().await?;

	let users = global
		.db()
		.list_users()
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;

	Ok(make_response!(
		StatusCode::OK,
		serde_json::Value::Array(users.iter().map(user_json).collect())
	))
}

#[derive(Deserialize)]
struct UpdateUserRequest {
	id: i64,
	#[serde(default)]
	action: Option<String>,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	role: Option<Role>,
}

/// Changes a user's name or role, or deletes them with `action: "delete"`.
async fn update_user<G: ApiGlobal>(req: Request<Incoming>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let auth = req.context()?.require_admin().await?;
	let body: UpdateUserRequest = read_json(req, global.config::<ApiConfig>().max_body_size).await?;

	if body.action.as_deref() == Some("delete") {
		if body.id == auth.user.id {
			return Err((StatusCode::BAD_REQUEST, "cannot delete yourself").into());
		}

		let deleted = global
			.db()
			.delete_user(body.id)
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;
		if !deleted {
			return Err((StatusCode::NOT_FOUND, "User not found").into());
		}

		tracing::info!(id = body.id, admin = %auth.user.email, "deleted user");
		return Ok(make_response!(StatusCode::OK, json!({ "success": true })));
	}

	if body.action.is_some() {
		return Err((StatusCode::BAD_REQUEST, "unknown action").into());
	}

	let user = global
		.db()
		.update_user(
			body.id,
			UserUpdate {
				name: body.name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()),
				role: body.role,
			},
		)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
		.map_err_route((StatusCode::NOT_FOUND, "User not found"))?;

	tracing::info!(id = user.id, role = %user.role, admin = %auth.user.email, "updated user");
	Ok(make_response!(StatusCode::OK, user_json(&user)))
}
