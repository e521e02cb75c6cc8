use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub type BoxFunction<I, O> = Box<dyn Fn(I) -> O + Send + Sync>;

pub(crate) type RouteHandler<I, O, E> = BoxFunction<hyper::Request<I>, BoxFuture<Result<hyper::Response<O>, E>>>;
pub(crate) type ErrorHandler<O, E> = BoxFunction<(hyper::Request<()>, E), BoxFuture<hyper::Response<O>>>;

/// Path parameters captured by the matched route, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteParams(pub Vec<(String, String)>);

#[derive(Debug, Clone)]
pub(crate) struct RouteInfo {
	pub route: usize,
	pub pre_middleware: Vec<usize>,
	pub post_middleware: Vec<usize>,
}
