use std::fmt::{Debug, Display};
use std::panic::Location;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::json;

pub mod router;

pub type Body = Full<Bytes>;

/// Builds a JSON response with the given status.
#[macro_export]
macro_rules! make_response {
	($status:expr, $body:expr) => {
		$crate::http::json_response($status, &$body)
	};
}

pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Body> {
	Response::builder()
		.status(status)
		.header(hyper::header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap_or_else(|_| {
			let mut res = Response::new(Body::from(r#"{"error":"internal server error"}"#));
			*res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
			res
		})
}

/// Logs a route failure and converts it into its response. Server errors are
/// logged at `error`, client errors that carry a source at `debug`.
pub async fn error_handler<E: Debug>(req: hyper::Request<()>, err: RouteError<E>) -> Response<Body> {
	let location = err.location();

	err.span().in_scope(|| match err.should_log() {
		ShouldLog::Yes => {
			tracing::error!(path = %req.uri(), method = %req.method(), location = location.to_string(), error = ?err, "http error")
		}
		ShouldLog::Debug => {
			tracing::debug!(path = %req.uri(), method = %req.method(), location = location.to_string(), error = ?err, "http error")
		}
		ShouldLog::No => (),
	});

	err.response()
}

/// A failed route: the response to send plus where and why it failed.
pub struct RouteError<E> {
	source: Option<E>,
	location: &'static Location<'static>,
	span: tracing::Span,
	response: Response<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldLog {
	Yes,
	Debug,
	No,
}

impl<E> RouteError<E> {
	pub fn span(&self) -> &tracing::Span {
		&self.span
	}

	pub fn location(&self) -> &'static Location<'static> {
		self.location
	}

	pub fn status(&self) -> StatusCode {
		self.response.status()
	}

	pub fn response(self) -> Response<Body> {
		self.response
	}

	pub fn should_log(&self) -> ShouldLog {
		if self.response.status().is_server_error() {
			ShouldLog::Yes
		} else if self.source.is_some() {
			ShouldLog::Debug
		} else {
			ShouldLog::No
		}
	}

	pub fn with_source(mut self, source: Option<E>) -> Self {
		self.source = source;
		self
	}

	pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
		self.location = location;
		self
	}
}

impl<E> From<Response<Body>> for RouteError<E> {
	#[track_caller]
	fn from(res: Response<Body>) -> Self {
		Self {
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
			response: res,
		}
	}
}

impl<E, S: AsRef<str>> From<(StatusCode, S)> for RouteError<E> {
	#[track_caller]
	fn from((status, message): (StatusCode, S)) -> Self {
		Self {
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
			response: make_response!(status, json!({ "error": message.as_ref() })),
		}
	}
}

impl<E, S: AsRef<str>, T: Into<E>> From<(StatusCode, S, T)> for RouteError<E> {
	#[track_caller]
	fn from((status, message, source): (StatusCode, S, T)) -> Self {
		Self {
			source: Some(source.into()),
			span: tracing::Span::current(),
			location: Location::caller(),
			response: make_response!(status, json!({ "error": message.as_ref() })),
		}
	}
}

impl<E> From<&'_ str> for RouteError<E> {
	#[track_caller]
	fn from(message: &'_ str) -> Self {
		(StatusCode::INTERNAL_SERVER_ERROR, message).into()
	}
}

impl<E: Debug> Debug for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {:?}", self.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.status()),
		}
	}
}

impl<E: Display> Display for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {}", self.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.status()),
		}
	}
}

impl<E: std::error::Error + 'static> std::error::Error for RouteError<E> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source.as_ref().map(|err| err as _)
	}
}

pub mod ext {
	use std::panic::Location;
	use std::sync::{Arc, Weak};

	use hyper::StatusCode;

	use super::router::ext::RequestExt;
	use super::RouteError;

	pub trait ResultExt<T, E, E2>: Sized {
		/// Maps the error into a route error built from `ctx`, keeping the
		/// original error as its source.
		fn map_err_route<C>(self, ctx: C) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<C>,
			E2: From<E>;

		/// Maps the error into a route error built from `ctx`, dropping it.
		fn map_ignore_err_route<C>(self, ctx: C) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<C>;

		fn into_err_route(self) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<E>;
	}

	impl<T, E, E2> ResultExt<T, E, E2> for Result<T, E> {
		#[track_caller]
		fn map_err_route<C>(self, ctx: C) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<C>,
			E2: From<E>,
		{
			match self {
				Ok(val) => Ok(val),
				Err(err) => Err(RouteError::from(ctx)
					.with_source(Some(err.into()))
					.with_location(Location::caller())),
			}
		}

		#[track_caller]
		fn map_ignore_err_route<C>(self, ctx: C) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<C>,
		{
			match self {
				Ok(val) => Ok(val),
				Err(_) => Err(RouteError::from(ctx).with_location(Location::caller())),
			}
		}

		#[track_caller]
		fn into_err_route(self) -> Result<T, RouteError<E2>>
		where
			RouteError<E2>: From<E>,
		{
			match self {
				Ok(val) => Ok(val),
				Err(err) => Err(RouteError::from(err).with_location(Location::caller())),
			}
		}
	}

	pub trait OptionExt<T, E>: Sized {
		fn map_err_route<C>(self, ctx: C) -> Result<T, RouteError<E>>
		where
			RouteError<E>: From<C>;
	}

	impl<T, E> OptionExt<T, E> for Option<T> {
		#[track_caller]
		fn map_err_route<C>(self, ctx: C) -> Result<T, RouteError<E>>
		where
			RouteError<E>: From<C>,
		{
			match self {
				Some(val) => Ok(val),
				None => Err(RouteError::from(ctx).with_location(Location::caller())),
			}
		}
	}

	/// The router stores a `Weak` to the global state so that open
	/// keep-alive connections do not hold the server up on shutdown.
	pub trait RequestGlobalExt<E> {
		fn get_global<G: Sync + Send + 'static>(&self) -> Result<Arc<G>, RouteError<E>>;
	}

	impl<E, B> RequestGlobalExt<E> for hyper::Request<B> {
		fn get_global<G: Sync + Send + 'static>(&self) -> Result<Arc<G>, RouteError<E>> {
			self.data::<Weak<G>>()
				.and_then(Weak::upgrade)
				.ok_or_else(|| (StatusCode::INTERNAL_SERVER_ERROR, "failed to upgrade global state").into())
		}
	}
}
