use std::sync::Arc;
use std::time::Duration;

use common::context::Handler;
use common::prelude::FutureTimeout;
use platform_view::Role;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::api;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::{ApiConfig, AppConfig, ImagesConfig, JwtConfig};
use crate::database::{hash_password, Database, NewUser, User};
use crate::global::GlobalState;
use crate::tests::global::mock_global_state;

mod v1;

/// An API server on a free port, backed by the in-memory database and a
/// temporary image directory.
pub struct TestServer {
	pub global: Arc<GlobalState>,
	base: String,
	handler: Handler,
	handle: JoinHandle<anyhow::Result<()>>,
	images: TempDir,
}

impl TestServer {
	pub async fn start() -> Self {
		Self::start_with(|_| {}).await
	}

	pub async fn start_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
		let port = portpicker::pick_unused_port().expect("failed to pick port");
		let images = tempfile::tempdir().expect("failed to create image dir");

		let mut config = AppConfig {
			api: ApiConfig {
				bind_address: format!("127.0.0.1:{port}").parse().unwrap(),
				..Default::default()
			},
			jwt: JwtConfig {
				secret: "test-secret".to_string(),
				..Default::default()
			},
			images: ImagesConfig {
				root: images.path().to_owned(),
				..Default::default()
			},
			..Default::default()
		};
		configure(&mut config);

		let (global, handler) = mock_global_state(config).await;

		let handle = tokio::spawn(api::run(global.clone()));

		// We need to wait for the server to start
		tokio::time::sleep(Duration::from_millis(300)).await;

		Self {
			global,
			base: format!("http://127.0.0.1:{port}"),
			handler,
			handle,
			images,
		}
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base)
	}

	pub fn images_dir(&self) -> &std::path::Path {
		self.images.path()
	}

	/// Inserts a user without a usable password and returns a token for it.
	pub async fn user(&self, name: &str, role: Role) -> (User, String) {
		self.insert_user(name, String::new(), role).await
	}

	/// Inserts a user that can log in with `password`.
	pub async fn user_with_password(&self, name: &str, password: &str, role: Role) -> (User, String) {
		let hash = hash_password(password).expect("failed to hash password");
		self.insert_user(name, hash, role).await
	}

	async fn insert_user(&self, name: &str, password_hash: String, role: Role) -> (User, String) {
		let user = self
			.global
			.db
			.insert_user(NewUser {
				email: format!("{name}@example.com"),
				name: name.to_string(),
				password_hash,
				role,
			})
			.await
			.expect("failed to insert user");

		let token = AuthJwtPayload::for_user(&user, &self.global.config.jwt)
			.serialize(&self.global)
			.expect("failed to sign token");

		(user, token)
	}

	pub async fn shutdown(self) {
		let Self {
			global,
			handler,
			handle,
			images,
			..
		} = self;

		drop(global);

		handler
			.cancel()
			.timeout(Duration::from_secs(1))
			.await
			.expect("failed to cancel context");

		handle
			.timeout(Duration::from_secs(1))
			.await
			.expect("failed to cancel api")
			.expect("api failed")
			.expect("api failed");

		drop(images);
	}
}
