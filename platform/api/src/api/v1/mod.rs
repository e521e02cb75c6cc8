use std::sync::Arc;

use common::http::router::builder::RouterBuilder;
use common::http::router::Router;
use common::http::RouteError;
use hyper::body::Incoming;

use super::error::ApiError;
use super::Body;
use crate::global::ApiGlobal;

pub mod auth;
pub mod celebrities;
pub mod health;
pub mod images;

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> RouterBuilder<Incoming, Body, RouteError<ApiError>> {
	Router::builder()
		.scope("/health", health::routes(global))
		.scope("/auth", auth::routes(global))
		.scope("/celebrities", celebrities::routes(global))
		.scope("/images", images::routes(global))
}
