use std::future::Future;

use super::middleware::{Middleware, PostMiddlewareHandler, PreMiddlewareHandler};
use super::types::{ErrorHandler, RouteHandler, RouteInfo};
use super::{Router, ANY_METHOD};

enum Item<I, O, E> {
	Route(Option<hyper::Method>, RouteHandler<I, O, E>),
	Scope(RouterBuilder<I, O, E>),
}

pub struct RouterBuilder<I, O, E> {
	items: Vec<(&'static str, Item<I, O, E>)>,
	pre_middleware: Vec<PreMiddlewareHandler<E>>,
	post_middleware: Vec<PostMiddlewareHandler<O, E>>,
	error_handler: Option<ErrorHandler<O, E>>,
}

impl<I: 'static, O: 'static, E: 'static> Default for RouterBuilder<I, O, E> {
	fn default() -> Self {
		Self::new()
	}
}

fn join(parent: &str, path: &str) -> String {
	let parent = parent.trim_matches('/');
	let path = path.trim_matches('/');

	match (parent.is_empty(), path.is_empty()) {
		(true, _) => path.to_owned(),
		(false, true) => parent.to_owned(),
		(false, false) => format!("{parent}/{path}"),
	}
}

impl<I: 'static, O: 'static, E: 'static> RouterBuilder<I, O, E> {
	pub fn new() -> Self {
		Self {
			items: Vec::new(),
			pre_middleware: Vec::new(),
			post_middleware: Vec::new(),
			error_handler: None,
		}
	}

	pub fn middleware(mut self, middleware: Middleware<O, E>) -> Self {
		match middleware {
			Middleware::Pre(handler) => self.pre_middleware.push(handler),
			Middleware::Post(handler) => self.post_middleware.push(handler),
		}

		self
	}

	/// Makes `data` available to every request under this scope.
	pub fn data<T: Clone + Send + Sync + 'static>(self, data: T) -> Self {
		self.middleware(Middleware::pre(move |mut req| {
			req.extensions_mut().insert(data.clone());
			async move { Ok(req) }
		}))
	}

	/// Only the root builder's error handler is used.
	pub fn error_handler<F: Future<Output = hyper::Response<O>> + Send + 'static>(
		mut self,
		handler: impl Fn(hyper::Request<()>, E) -> F + Send + Sync + 'static,
	) -> Self {
		self.error_handler = Some(Box::new(move |(req, err)| Box::pin(handler(req, err))));
		self
	}

	pub fn get<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(Some(hyper::Method::GET), path, handler)
	}

	pub fn post<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(Some(hyper::Method::POST), path, handler)
	}

	pub fn delete<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(Some(hyper::Method::DELETE), path, handler)
	}

	pub fn options<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(Some(hyper::Method::OPTIONS), path, handler)
	}

	pub fn add_route<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		mut self,
		method: Option<hyper::Method>,
		path: &'static str,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.items
			.push((path, Item::Route(method, Box::new(move |req| Box::pin(handler(req))))));
		self
	}

	pub fn scope(mut self, path: &'static str, router: RouterBuilder<I, O, E>) -> Self {
		self.items.push((path, Item::Scope(router)));
		self
	}

	/// Catch-all for any method and path no other route matched.
	pub fn not_found<F: Future<Output = Result<hyper::Response<O>, E>> + Send + 'static>(
		self,
		handler: impl Fn(hyper::Request<I>) -> F + Send + Sync + 'static,
	) -> Self {
		self.add_route(None, "*", handler)
	}

	fn build_scoped(self, parent: &str, target: &mut Router<I, O, E>, pre: &[usize], post: &[usize]) {
		let pre = pre
			.iter()
			.copied()
			.chain(self.pre_middleware.into_iter().map(|handler| {
				target.pre_middlewares.push(handler);
				target.pre_middlewares.len() - 1
			}))
			.collect::<Vec<_>>();

		let post = post
			.iter()
			.copied()
			.chain(self.post_middleware.into_iter().map(|handler| {
				target.post_middlewares.push(handler);
				target.post_middlewares.len() - 1
			}))
			.collect::<Vec<_>>();

		for (path, item) in self.items {
			match item {
				Item::Route(method, handler) => {
					target.routes.push(handler);

					let method = method.as_ref().map(hyper::Method::as_str).unwrap_or(ANY_METHOD);
					let full_path = format!("/{method}/{}", join(parent, path));

					tracing::debug!(parent, path, full_path, "adding route");

					let _ = target.tree.insert(
						&full_path,
						RouteInfo {
							route: target.routes.len() - 1,
							pre_middleware: pre.clone(),
							post_middleware: post.clone(),
						},
					);
				}
				Item::Scope(router) => router.build_scoped(&join(parent, path), target, &pre, &post),
			}
		}
	}

	pub fn build(mut self) -> Router<I, O, E> {
		let mut router = Router {
			routes: Vec::new(),
			pre_middlewares: Vec::new(),
			post_middlewares: Vec::new(),
			error_handler: self.error_handler.take(),
			tree: path_tree::PathTree::new(),
		};

		self.build_scoped("", &mut router, &[], &[]);

		router
	}
}
