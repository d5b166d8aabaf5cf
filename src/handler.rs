use futures::{future::BoxFuture, Future, FutureExt};

use crate::{request::Request, responder::Responder, response::Response};

/// Define a Handler of a potential http request
///
/// Implemented by default on any `async fn(Request) -> impl Responder`
pub trait Handler {
    /// Responder returned by the handler
    type Responder: Responder;
    /// Specific future returning the responder
    type Future: Future<Output = Self::Responder>;

    /// Handle the http request, returning a future of a responder
    fn handle(&self, req: Request) -> Self::Future;
}

impl<Fun, Fut, R> Handler for Fun
where
    Fun: Fn(Request) -> Fut,
    Fut: 'static + Future<Output = R> + Send,
    R: Responder,
{
    type Future = Fut;
    type Responder = R;

    #[inline]
    fn handle(&self, req: Request) -> Self::Future {
        (*self)(req)
    }
}

#[doc(hidden)]
pub trait DynHandler: Send + Sync {
    fn dyn_handle(&self, req: Request) -> BoxFuture<'static, Response>;
}

impl<H, Fut, R> DynHandler for H
where
    R: 'static + Responder + Send,
    Fut: 'static + Future<Output = R> + Send,
    H: Handler<Future = Fut, Responder = R> + Send + Sync,
{
    #[inline]
    fn dyn_handle(&self, req: Request) -> BoxFuture<'static, Response> {
        self.handle(req).map(Responder::respond).boxed()
    }
}
