use std::fmt::{Debug, Formatter};

use self::builder::RouterBuilder;
use self::middleware::{PostMiddlewareHandler, PreMiddlewareHandler};
use self::types::{ErrorHandler, RouteHandler, RouteInfo, RouteParams};

pub mod builder;
pub mod ext;
pub mod middleware;
pub mod types;

pub(crate) const ANY_METHOD: &str = "ANY";

#[derive(thiserror::Error, Debug)]
pub enum RouterError<E> {
	#[error("unhandled error: {0:?}")]
	Unhandled(E),
	#[error("route not found")]
	NotFound,
}

/// A method + path router over a [`path_tree::PathTree`]. Routes are keyed
/// as `/{METHOD}/{path}`; routes added without a method use `ANY`.
pub struct Router<I, O, E> {
	routes: Vec<RouteHandler<I, O, E>>,
	pre_middlewares: Vec<PreMiddlewareHandler<E>>,
	post_middlewares: Vec<PostMiddlewareHandler<O, E>>,
	error_handler: Option<ErrorHandler<O, E>>,
	tree: path_tree::PathTree<RouteInfo>,
}

impl<I: 'static, O: 'static, E: 'static> Router<I, O, E> {
	pub fn builder() -> RouterBuilder<I, O, E> {
		RouterBuilder::new()
	}

	fn lookup(&self, method: &hyper::Method, path: &str) -> Option<(&RouteInfo, RouteParams)> {
		let keyed = format!("/{}{}", method.as_str(), path);
		let fallback = format!("/{ANY_METHOD}{}", path);

		[keyed, fallback].iter().find_map(|key| {
			self.tree.find(key).map(|(info, path)| {
				let params = path.params_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
				(info, RouteParams(params))
			})
		})
	}

	async fn fail(&self, head: hyper::Request<()>, err: E) -> Result<hyper::Response<O>, RouterError<E>> {
		match &self.error_handler {
			Some(handler) => Ok(handler((head, err)).await),
			None => Err(RouterError::Unhandled(err)),
		}
	}

	pub async fn handle(&self, req: hyper::Request<I>) -> Result<hyper::Response<O>, RouterError<E>> {
		let (info, params) = self.lookup(req.method(), req.uri().path()).ok_or(RouterError::NotFound)?;

		let (mut parts, body) = req.into_parts();
		parts.extensions.insert(params);

		for idx in &info.pre_middleware {
			let head = hyper::Request::from_parts(parts.clone(), ());
			match self.pre_middlewares[*idx](head).await {
				Ok(head) => parts = head.into_parts().0,
				Err(err) => return self.fail(hyper::Request::from_parts(parts, ()), err).await,
			}
		}

		let head = hyper::Request::from_parts(parts.clone(), ());

		let mut res = match self.routes[info.route](hyper::Request::from_parts(parts, body)).await {
			Ok(res) => res,
			Err(err) => self.fail(head.clone(), err).await?,
		};

		for idx in &info.post_middleware {
			res = match self.post_middlewares[*idx]((res, head.clone())).await {
				Ok(res) => res,
				Err(err) => return self.fail(head, err).await,
			};
		}

		Ok(res)
	}
}

impl<I, O, E> Debug for Router<I, O, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes.len())
			.field("pre_middlewares", &self.pre_middlewares.len())
			.field("post_middlewares", &self.post_middlewares.len())
			.field("tree", &self.tree)
			.finish()
	}
}
