use std::sync::Arc;

use common::http::RouteError;
use hyper::StatusCode;
use platform_view::Role;

use super::error::ApiError;
use super::jwt::{AuthJwtPayload, JwtState};
use crate::database::User;
use crate::global::ApiGlobal;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
	#[error("not logged in")]
	NotLoggedIn,
	#[error("token must be a bearer token")]
	NotBearerToken,
	#[error("invalid token")]
	InvalidToken,
	#[error("failed to fetch user")]
	FetchUser,
	#[error("user not found")]
	UserNotFound,
	#[error("insufficient permissions")]
	Forbidden,
}

impl From<AuthError> for RouteError<ApiError> {
	fn from(value: AuthError) -> Self {
		RouteError::from(match &value {
			AuthError::NotLoggedIn => (StatusCode::UNAUTHORIZED, "not logged in"),
			AuthError::NotBearerToken => (StatusCode::UNAUTHORIZED, "token must be a bearer token"),
			AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
			AuthError::FetchUser => (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch user"),
			AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "user not found"),
			AuthError::Forbidden => (StatusCode::FORBIDDEN, "insufficient permissions"),
		})
		.with_source(Some(ApiError::Auth(value)))
	}
}

#[derive(Clone, Debug)]
pub struct AuthData {
	pub user: User,
}

impl AuthData {
	/// Resolves a bearer token to the user it was issued for. The user is
	/// read fresh so that role changes apply to existing tokens.
	pub async fn from_token<G: ApiGlobal>(global: &Arc<G>, token: &str) -> Result<Self, AuthError> {
		let jwt = AuthJwtPayload::verify(global, token).ok_or(AuthError::InvalidToken)?;

		let user = global
			.db()
			.user_by_id(jwt.user_id)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "failed to fetch user");
				AuthError::FetchUser
			})?
			.ok_or(AuthError::UserNotFound)?;

		Ok(Self { user })
	}

	pub fn is_admin(&self) -> bool {
		self.user.role == Role::Admin
	}

	/// Admins and team users may change records.
	pub fn can_edit(&self) -> bool {
		matches!(self.user.role, Role::Admin | Role::TeamUser)
	}

	/// Admins may touch any record; team users only their own and unowned
	/// ones.
	pub fn can_modify(&self, record: &platform_view::Celebrity) -> bool {
		match self.user.role {
			Role::Admin => true,
			Role::TeamUser => record.is_unowned() || record.is_owned_by(&self.user.name),
			Role::NewUser | Role::NoUser => false,
		}
	}
}
