use common::http::RouteError;

use super::auth::AuthError;
use crate::database::DatabaseError;
use crate::image_store::ImageStoreError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("failed to read http body: {0}")]
	ReadBody(#[source] Box<dyn std::error::Error + Send + Sync>),
	#[error("failed to parse json body: {0}")]
	ParseJson(#[from] serde_json::Error),
	#[error("failed to parse multipart body: {0}")]
	Multipart(#[from] multer::Error),
	#[error("database error: {0}")]
	Database(#[from] DatabaseError),
	#[error("image store error: {0}")]
	ImageStore(#[from] ImageStoreError),
	#[error("password hash error: {0}")]
	PasswordHash(argon2::password_hash::Error),
	#[error("auth error: {0}")]
	Auth(#[from] AuthError),
}

impl From<argon2::password_hash::Error> for ApiError {
	fn from(value: argon2::password_hash::Error) -> Self {
		Self::PasswordHash(value)
	}
}
