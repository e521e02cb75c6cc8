use std::sync::Arc;

use async_trait::async_trait;
use platform_view::{Celebrity, Role};

mod memory;
mod postgres;
mod user;

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;
pub use user::*;

/// Selects the in-memory backend.
pub const MEMORY_URI: &str = "memory://";

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[error("{0} already exists")]
	Conflict(String),
	#[error("corrupt row: {0}")]
	Corrupt(String),
}

/// Everything the API persists.
#[async_trait]
pub trait Database: Send + Sync + 'static {
	async fn list_celebrities(&self) -> Result<Vec<Celebrity>, DatabaseError>;

	async fn get_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError>;

	/// Ignores any id on `record` and assigns a fresh one.
	async fn insert_celebrity(&self, record: &Celebrity) -> Result<Celebrity, DatabaseError>;

	/// `None` when no record has the id.
	async fn update_celebrity(&self, id: i64, record: &Celebrity) -> Result<Option<Celebrity>, DatabaseError>;

	async fn delete_celebrity(&self, id: i64) -> Result<Option<Celebrity>, DatabaseError>;

	async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

	async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

	/// Emails are matched case-insensitively.
	async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

	/// Fails with [`DatabaseError::Conflict`] when the email is taken.
	async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

	async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, DatabaseError>;

	async fn delete_user(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Opens the backend named by `uri`.
pub async fn connect(uri: &str) -> Result<Arc<dyn Database>, DatabaseError> {
	if uri.starts_with(MEMORY_URI) {
		tracing::info!("using in-memory database");
		return Ok(Arc::new(MemoryDatabase::default()));
	}

	let db = PgDatabase::connect(uri).await?;
	db.migrate().await?;

	Ok(Arc::new(db))
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, DatabaseError> {
	raw.parse().map_err(|err: platform_view::viewer::UnknownRole| DatabaseError::Corrupt(err.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error(transparent)]
	Database(#[from] DatabaseError),
	#[error("failed to hash password: {0}")]
	Hash(argon2::password_hash::Error),
}

/// Creates the configured admin unless a user with that email exists.
/// Returns whether a user was created.
pub async fn ensure_admin(db: &dyn Database, admin: &crate::config::BootstrapAdmin) -> Result<bool, BootstrapError> {
	if db.user_by_email(&admin.email).await?.is_some() {
		return Ok(false);
	}

	let password_hash = hash_password(&admin.password).map_err(BootstrapError::Hash)?;
	db.insert_user(NewUser {
		email: admin.email.clone(),
		name: admin.name.clone(),
		password_hash,
		role: Role::Admin,
	})
	.await?;

	tracing::info!(email = %admin.email, "created bootstrap admin");

	Ok(true)
}
