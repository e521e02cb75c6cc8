use std::sync::Arc;

use common::http::ext::RequestGlobalExt;
use common::http::router::middleware::Middleware;
use common::http::RouteError;
use hyper::http::header;

use crate::api::auth::{AuthData, AuthError};
use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::api::Body;
use crate::global::ApiGlobal;

/// Attaches a [`RequestContext`] to every request and fills it from the
/// bearer token, if any. Never fails the request; routes that need a user
/// ask the context and get the recorded error.
pub fn auth_middleware<G: ApiGlobal>(_: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
	Middleware::pre(|mut req| async move {
		let context = RequestContext::default();
		req.extensions_mut().insert(context.clone());

		let Some(token) = req.headers().get(header::AUTHORIZATION) else {
			// No Authorization header
			return Ok(req);
		};

		let token = match token.to_str().ok().and_then(|t| t.strip_prefix("Bearer ")) {
			Some(token) => token.trim().to_owned(),
			None => {
				context.set_auth_error(AuthError::NotBearerToken).await;
				return Ok(req);
			}
		};

		let global = req.get_global::<G>()?;

		match AuthData::from_token(&global, &token).await {
			Ok(data) => context.set_auth(data).await,
			Err(err) => {
				tracing::debug!(error = %err, "rejected bearer token");
				context.set_auth_error(err).await;
			}
		}

		Ok(req)
	})
}
