use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, SessionError, SourceError};
use crate::viewer::Viewer;

/// Name under which the viewer session is persisted.
pub const SESSION_KEY: &str = "viewer-session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
	pub user: Viewer,
	#[serde(default)]
	pub token: Option<String>,
}

#[async_trait]
pub trait AuthSource: Send + Sync {
	async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, SourceError>;

	/// Resolves a token back into the user it was issued for.
	async fn whoami(&self, token: &str) -> Result<Viewer, SourceError>;

	/// Drops any credentials the source kept from `login` or `whoami`.
	fn forget(&self) {}
}

/// What survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	pub viewer: Viewer,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
}

pub trait SessionStore: Send + Sync {
	fn load(&self) -> Result<Option<Session>, SessionError>;
	fn save(&self, session: &Session) -> Result<(), SessionError>;
	fn clear(&self) -> Result<(), SessionError>;
}

/// Keeps the session as a JSON file named after [`SESSION_KEY`].
#[derive(Debug, Clone)]
pub struct FileSessionStore {
	path: PathBuf,
}

impl FileSessionStore {
	pub fn new(dir: impl AsRef<Path>) -> Self {
		Self {
			path: dir.as_ref().join(format!("{SESSION_KEY}.json")),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl SessionStore for FileSessionStore {
	fn load(&self) -> Result<Option<Session>, SessionError> {
		match std::fs::read(&self.path) {
			Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	fn save(&self, session: &Session) -> Result<(), SessionError> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		std::fs::write(&self.path, serde_json::to_vec(session)?)?;
		Ok(())
	}

	fn clear(&self) -> Result<(), SessionError> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}

/// Tracks the signed-in viewer and keeps the session file in step with it.
pub struct AuthStore<A, S> {
	source: A,
	sessions: S,
	session: Option<Session>,
	is_checking_auth: bool,
	last_error: Option<String>,
}

impl<A: AuthSource, S: SessionStore> AuthStore<A, S> {
	pub fn new(source: A, sessions: S) -> Self {
		Self {
			source,
			sessions,
			session: None,
			is_checking_auth: false,
			last_error: None,
		}
	}

	pub fn viewer(&self) -> Option<&Viewer> {
		self.session.as_ref().map(|s| &s.viewer)
	}

	pub fn token(&self) -> Option<&str> {
		self.session.as_ref().and_then(|s| s.token.as_deref())
	}

	pub fn is_checking_auth(&self) -> bool {
		self.is_checking_auth
	}

	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	pub async fn login(&mut self, email: &str, password: &str) -> Result<Viewer, AuthError> {
		let response = match self.source.login(email, password).await {
			Ok(response) => response,
			Err(err) => {
				tracing::warn!(error = %err, "login failed");
				self.last_error = Some(format!("Login failed: {err}"));
				return Err(err.into());
			}
		};

		let session = Session {
			viewer: response.user,
			token: response.token,
		};

		// A session that cannot be persisted still works for this run.
		if let Err(err) = self.sessions.save(&session) {
			tracing::error!(error = %err, "failed to persist session");
		}

		tracing::info!(email = %session.viewer.email, role = %session.viewer.role, "logged in");
		let viewer = session.viewer.clone();
		self.session = Some(session);
		self.last_error = None;

		Ok(viewer)
	}

	pub fn logout(&mut self) -> Result<(), AuthError> {
		self.session = None;
		self.source.forget();
		self.sessions.clear()?;
		Ok(())
	}

	/// Restores the persisted session. With `revalidate`, a stored token is
	/// checked against the server: a rejected token ends the session, an
	/// unreachable server keeps it.
	pub async fn check_auth(&mut self, revalidate: bool) -> Option<Viewer> {
		self.is_checking_auth = true;

		let stored = match self.sessions.load() {
			Ok(stored) => stored,
			Err(err) => {
				tracing::warn!(error = %err, "discarding unreadable session");
				if let Err(err) = self.sessions.clear() {
					tracing::error!(error = %err, "failed to clear session");
				}
				None
			}
		};

		self.session = match (stored, revalidate) {
			(Some(mut session), true) => match session.token.clone() {
				Some(token) => match self.source.whoami(&token).await {
					Ok(viewer) => {
						if viewer != session.viewer {
							session.viewer = viewer;
							if let Err(err) = self.sessions.save(&session) {
								tracing::error!(error = %err, "failed to persist session");
							}
						}
						Some(session)
					}
					Err(err) if err.is_auth_rejection() => {
						tracing::info!(error = %err, "stored session rejected");
						self.source.forget();
						if let Err(err) = self.sessions.clear() {
							tracing::error!(error = %err, "failed to clear session");
						}
						None
					}
					Err(err) => {
						tracing::warn!(error = %err, "could not revalidate session");
						Some(session)
					}
				},
				None => Some(session),
			},
			(stored, _) => stored,
		};

		self.is_checking_auth = false;
		self.viewer().cloned()
	}
}
