use std::sync::Arc;

use common::context::Context;

use crate::config::{ApiConfig, AppConfig, ImagesConfig, JwtConfig};
use crate::database::Database;
use crate::image_store::ImageStore;

pub trait ApiState {
	fn db(&self) -> &Arc<dyn Database>;
	fn image_store(&self) -> &ImageStore;
}

pub trait ApiGlobal:
	common::global::GlobalCtx
	+ common::global::GlobalConfigProvider<ApiConfig>
	+ common::global::GlobalConfigProvider<JwtConfig>
	+ common::global::GlobalConfigProvider<ImagesConfig>
	+ common::global::GlobalConfig
	+ ApiState
	+ Send
	+ Sync
	+ 'static
{
}

impl<T> ApiGlobal for T where
	T: common::global::GlobalCtx
		+ common::global::GlobalConfigProvider<ApiConfig>
		+ common::global::GlobalConfigProvider<JwtConfig>
		+ common::global::GlobalConfigProvider<ImagesConfig>
		+ common::global::GlobalConfig
		+ ApiState
		+ Send
		+ Sync
		+ 'static
{
}

pub struct GlobalState {
	pub config: AppConfig,
	pub db: Arc<dyn Database>,
	pub image_store: ImageStore,
	pub ctx: Context,
}

impl GlobalState {
	pub fn new(config: AppConfig, db: Arc<dyn Database>, ctx: Context) -> Self {
		Self {
			image_store: ImageStore::new(config.images.root.clone(), config.images.max_size),
			config,
			db,
			ctx,
		}
	}
}

impl common::global::GlobalCtx for GlobalState {
	fn ctx(&self) -> &Context {
		&self.ctx
	}
}

impl common::global::GlobalConfigProvider<ApiConfig> for GlobalState {
	fn provide_config(&self) -> &ApiConfig {
		&self.config.api
	}
}

impl common::global::GlobalConfigProvider<JwtConfig> for GlobalState {
	fn provide_config(&self) -> &JwtConfig {
		&self.config.jwt
	}
}

impl common::global::GlobalConfigProvider<ImagesConfig> for GlobalState {
	fn provide_config(&self) -> &ImagesConfig {
		&self.config.images
	}
}

impl common::global::GlobalConfig for GlobalState {}

impl ApiState for GlobalState {
	fn db(&self) -> &Arc<dyn Database> {
		&self.db
	}

	fn image_store(&self) -> &ImageStore {
		&self.image_store
	}
}
