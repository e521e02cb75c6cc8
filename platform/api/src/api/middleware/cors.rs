use std::sync::Arc;

use common::http::router::middleware::Middleware;
use common::http::RouteError;
use hyper::http::header;
use hyper::http::HeaderValue;

use crate::api::error::ApiError;
use crate::api::Body;
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub fn cors_middleware<G: ApiGlobal>(global: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
	let origin = HeaderValue::from_str(&global.config::<ApiConfig>().cors_origin).unwrap_or(HeaderValue::from_static("*"));

	Middleware::post(move |mut resp| {
		let origin = origin.clone();
		async move {
			resp.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
			resp.headers_mut().insert(
				header::ACCESS_CONTROL_ALLOW_METHODS,
				HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
			);
			resp.headers_mut().insert(
				header::ACCESS_CONTROL_ALLOW_HEADERS,
				HeaderValue::from_static("Content-Type, Authorization"),
			);

			Ok(resp)
		}
	})
}
