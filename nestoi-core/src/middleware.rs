//! Type-erased request stages: middlewares and route endpoints.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::Router;
use tower::util::BoxCloneService;

use crate::route::HttpVerb;

pub type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxResponseFuture + Send + Sync;

/// A request stage that may answer on its own or hand the request to `next`.
///
/// ```ignore
/// let audit = Middleware::from_fn(|req: Request, next: Next| async move {
///     tracing::info!(path = %req.uri().path(), "audit");
///     next.run(req).await
/// });
/// ```
#[derive(Clone)]
pub struct Middleware(Arc<MiddlewareFn>);

impl Middleware {
    pub fn from_fn<F, Fut, Out>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse,
    {
        Self(Arc::new(move |req, next| {
            let fut = f(req, next);
            Box::pin(async move { fut.await.into_response() })
        }))
    }

    pub fn call(&self, req: Request, next: Next) -> BoxResponseFuture {
        (self.0)(req, next)
    }

    /// Wrap every route of `router` with this middleware.
    pub fn layer(&self, router: Router) -> Router {
        let mw = self.clone();
        router.layer(axum::middleware::from_fn(
            move |req: Request, next: Next| mw.call(req, next),
        ))
    }

    /// Wrap a single method route with this middleware.
    pub fn layer_method_router(&self, route: MethodRouter) -> MethodRouter {
        let mw = self.clone();
        route.route_layer(axum::middleware::from_fn(
            move |req: Request, next: Next| mw.call(req, next),
        ))
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Middleware")
    }
}

/// The terminal stage of a route.
#[derive(Clone)]
pub struct Endpoint {
    service: BoxCloneService<Request, Response, Infallible>,
}

impl Endpoint {
    /// Wrap any axum handler that needs no router state.
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            service: BoxCloneService::new(handler.with_state(())),
        }
    }

    /// Endpoint for routes declared without a handler.
    pub fn not_found() -> Self {
        Self {
            service: BoxCloneService::new(tower::service_fn(|_req: Request| async {
                Ok::<_, Infallible>(StatusCode::NOT_FOUND.into_response())
            })),
        }
    }

    pub fn into_method_router(self, verb: HttpVerb) -> MethodRouter {
        axum::routing::on_service(verb.method_filter(), self.service)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Endpoint")
    }
}
