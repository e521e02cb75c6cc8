use std::future::Future;

use super::types::{BoxFunction, BoxFuture};

pub(crate) type PreMiddlewareHandler<E> = BoxFunction<hyper::Request<()>, BoxFuture<Result<hyper::Request<()>, E>>>;

pub(crate) type PostMiddlewareHandler<O, E> =
	BoxFunction<(hyper::Response<O>, hyper::Request<()>), BoxFuture<Result<hyper::Response<O>, E>>>;

/// Pre middlewares see the request head before the route runs. Post
/// middlewares see the response together with the request head.
pub enum Middleware<O, E> {
	Pre(PreMiddlewareHandler<E>),
	Post(PostMiddlewareHandler<O, E>),
}

impl<O: 'static, E: 'static> Middleware<O, E> {
	pub fn pre<F: Future<Output = Result<hyper::Request<()>, E>> + Send + 'static>(
		handler: impl Fn(hyper::Request<()>) -> F + Send + Sync + 'static,
	) -> Self {
		Self::Pre(Box::new(move |req| Box::pin(handler(req))))
	}

	pub fn post<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		handler: impl Fn(hyper::Response<O>) -> F + Send + Sync + 'static,
	) -> Self {
		Self::Post(Box::new(move |(res, _)| Box::pin(handler(res))))
	}

	pub fn post_with_req<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		handler: impl Fn(hyper::Response<O>, hyper::Request<()>) -> F + Send + Sync + 'static,
	) -> Self {
		Self::Post(Box::new(move |(res, req)| Box::pin(handler(res, req))))
	}
}
