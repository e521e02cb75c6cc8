use std::sync::Arc;

use tokio::sync::RwLock;

use super::auth::{AuthData, AuthError};

#[derive(Default, Clone)]
pub struct ContextData {
	pub auth: Option<AuthData>,
	/// Set when a token was sent but could not be used.
	pub auth_error: Option<AuthError>,
}

#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
	pub async fn set_auth(&self, data: AuthData) {
		let mut guard = self.0.write().await;
		guard.auth = Some(data);
		guard.auth_error = None;
	}

	pub async fn set_auth_error(&self, err: AuthError) {
		let mut guard = self.0.write().await;
		guard.auth = None;
		guard.auth_error = Some(err);
	}

	/// The authenticated user, or why there is none.
	pub async fn require_auth(&self) -> Result<AuthData, AuthError> {
		let guard = self.0.read().await;
		match (&guard.auth, &guard.auth_error) {
			(Some(auth), _) => Ok(auth.clone()),
			(None, Some(err)) => Err(err.clone()),
			(None, None) => Err(AuthError::NotLoggedIn),
		}
	}

	pub async fn require_admin(&self) -> Result<AuthData, AuthError> {
		let auth = self.require_auth().await?;
		if !auth.is_admin() {
			return Err(AuthError::Forbidden);
		}

		Ok(auth)
	}

	pub async fn require_editor(&self) -> Result<AuthData, AuthError> {
		let auth = self.require_auth().await?;
		if !auth.can_edit() {
			return Err(AuthError::Forbidden);
		}

		Ok(auth)
	}
}
