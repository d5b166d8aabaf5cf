//! Server owns the router and the middleware stack, and runs every incoming
//! request through them.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use futures::{
    future::BoxFuture,
    task::{Context, Poll},
    FutureExt,
};
use http::HeaderValue;
use hyper::{body::Body as RawBody, server::conn::Http, service::Service};
use tokio::net::TcpListener;

use crate::{
    body::Body,
    error::ParametersError,
    http_context::HttpContext,
    middleware::{Builder as MiddlewareStackBuilder, MiddlewareChain, MiddlewareStack},
    request::Request,
    responder::Responder,
    response::Response,
    router::{Builder as RouterBuilder, Router},
};

/// Default listener ip addr is AnyAddr (0.0.0.0)
pub const DEFAULT_LISTENER_IFACE: &str = "0.0.0.0:0";
pub const DEFAULT_SERVER_NAME: &str = "parameters-middleware";

/// Builder of the listener configuration
pub struct ListenerBuilder {
    iface: Option<String>,
    server_name: Option<String>,
}

impl ListenerBuilder {
    #[inline]
    pub fn new() -> Self {
        ListenerBuilder {
            iface: None,
            server_name: None,
        }
    }

    /// Interface the server listens on, e.g. `127.0.0.1:3000`
    #[inline]
    pub fn interface(mut self, s: &str) -> Self {
        self.iface = Some(s.to_string());
        self
    }

    /// Value of the `Server` header sent with every response
    #[inline]
    pub fn server_name(mut self, name: &str) -> Self {
        self.server_name = Some(name.to_string());
        self
    }

    pub(crate) fn build(self) -> ListenerConfig {
        let ListenerBuilder { iface, server_name } = self;
        let server_name = server_name.unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());
        let server_header = HeaderValue::from_str(&server_name).unwrap_or_else(|e| {
            warn!("Invalid server name `{}`, using the default one: {}", server_name, e);
            HeaderValue::from_static(DEFAULT_SERVER_NAME)
        });

        ListenerConfig {
            iface: iface.unwrap_or_else(|| DEFAULT_LISTENER_IFACE.to_string()),
            server_header,
        }
    }
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        ListenerBuilder::new()
    }
}

pub struct ListenerConfig {
    pub(crate) iface: String,
    pub(crate) server_header: HeaderValue,
}

/// Builder of a server
pub struct Builder {
    listener: Option<ListenerBuilder>,
    router: RouterBuilder,
    middlewares: MiddlewareStackBuilder,
}

impl Builder {
    pub fn configure_listener<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ListenerBuilder) -> ListenerBuilder,
    {
        let l = if let Some(l) = self.listener.take() { l } else { ListenerBuilder::new() };

        self.listener = Some(f(l));
        self
    }

    pub fn configure_router<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RouterBuilder) -> RouterBuilder,
    {
        self.router = f(self.router);
        self
    }

    pub fn configure_middlewares<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MiddlewareStackBuilder) -> MiddlewareStackBuilder,
    {
        self.middlewares = f(self.middlewares);
        self
    }

    pub fn build(self) -> Server {
        Server {
            listener_config: self.listener.unwrap_or_default().build(),
            stack: Arc::new(Stack {
                router: self.router.build(),
                middlewares: self.middlewares.build(),
            }),
        }
    }
}

/// Http server running requests through its middleware stack, then its
/// router
///
/// ```rust,no_run
/// # use parameters_middleware::prelude::*;
/// async fn show(req: Request) -> Option<Parameters> {
///     req.parameters().cloned()
/// }
///
/// # async {
/// let server = Server::builder()
///     .configure_listener(|l| l.interface("127.0.0.1:3000"))
///     .configure_middlewares(|stack| {
///         stack
///             .apply(BodyParser::new(), vec!["/"], None)
///             .apply(ParametersMiddleware::new(UnionKind::Join), vec!["/"], None)
///     })
///     .configure_router(|r| r.route("/items/{id}", Method::POST, show))
///     .build();
///
/// server.run().await
/// # };
/// ```
pub struct Server {
    listener_config: ListenerConfig,
    stack: Arc<Stack>,
}

impl Server {
    #[inline]
    pub fn builder() -> Builder {
        Builder {
            listener: None,
            router: RouterBuilder::default(),
            middlewares: MiddlewareStackBuilder::default(),
        }
    }

    /// Bind the configured interface and serve connections
    pub async fn run(self) -> Result<(), ParametersError> {
        let listener = TcpListener::bind(self.listener_config.iface.as_str()).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted on an already bound listener. Failed accepts
    /// are logged and the listener keeps serving.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ParametersError> {
        info!("Server listening on {}", listener.local_addr()?);

        let http = Http::new();
        loop {
            let (stream, peer_addr) = match accepted(listener.accept().await) {
                Some(accepted) => accepted,
                None => continue,
            };
            let handler = StackHandler {
                stack: self.stack.clone(),
                server_header: self.listener_config.server_header.clone(),
                peer_addr: Some(peer_addr),
            };
            let conn = http.serve_connection(stream, handler);
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    debug!("Connection with {} ended with an error: {}", peer_addr, e);
                }
            });
        }
    }

    /// Run a request through the stack without any connection
    pub async fn inject(&self, req: http::Request<Body>) -> Response {
        self.stack.invoke(Request::new(req, None)).await
    }
}

fn accepted<S>(res: std::io::Result<(S, SocketAddr)>) -> Option<(S, SocketAddr)> {
    match res {
        Ok(accepted) => Some(accepted),
        Err(e) => {
            warn!("incoming connection encountered an error: {}", e);
            None
        }
    }
}

#[doc(hidden)]
pub struct Stack {
    router: Router,
    middlewares: MiddlewareStack,
}

impl Stack {
    async fn invoke(&self, mut req: Request) -> Response {
        let metadata = self.router.resolve(&mut req);
        trace!("{} {} resolved to {:?}", req.method(), req.uri().path(), metadata.route_id);
        let ctx = HttpContext::new(req, self.router.clone(), metadata);

        let res = self
            .middlewares
            .next(ctx)
            .await
            .and_then(|mut ctx| ctx.state.take_response().ok_or(ParametersError::ResponseMoved));

        match res {
            Ok(res) => res,
            Err(e) => e.respond(),
        }
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct StackHandler {
    stack: Arc<Stack>,
    server_header: HeaderValue,
    peer_addr: Option<SocketAddr>,
}

impl Service<hyper::Request<RawBody>> for StackHandler {
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<hyper::Response<RawBody>, Self::Error>>;
    type Response = hyper::Response<RawBody>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: hyper::Request<RawBody>) -> Self::Future {
        let req = Request::new(req.map(Body::from_raw), self.peer_addr);
        let stack = self.stack.clone();
        let server_header = self.server_header.clone();

        async move {
            let mut res = stack.invoke(req).await;
            res.headers_mut().insert(http::header::SERVER, server_header);
            Ok(res.map(RawBody::from))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn failed_accept_is_skipped() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert!(accepted::<()>(Err(IoError::from(ErrorKind::ConnectionAborted))).is_none());
        assert_eq!(accepted(Ok(((), addr))), Some(((), addr)));
    }

    #[tokio::test]
    async fn serves_after_dropped_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::builder()
            .configure_router(|r| r.route("/", http::Method::GET, |_req: Request| async { 204u16 }))
            .build();
        tokio::spawn(server.serve(listener));

        for _ in 0..2 {
            let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            drop(stream);
        }
        let res = hyper::Client::new()
            .get(format!("http://{}/", addr).parse().unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), http::StatusCode::NO_CONTENT);
    }
}
