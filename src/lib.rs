//! ### Unified request parameters for async http servers
//! A middleware copying the path captures, query string and body of every
//! request into a single [`Parameters`](parameters::Parameters) object, so
//! handlers read their input through one accessor whatever its origin.
//!
//! Which containers are read, and how they are combined, is chosen with a
//! [`UnionKind`](union::UnionKind):
//!
//! | Union | Sources, later ones overriding earlier ones |
//! |---|---|
//! | `join` | params, query, body |
//! | `body` (default) | body |
//! | `body-params` | params, body |
//! | `body-query` | query, body |
//! | `query` | query |
//! | `query-params` | params, query |
//! | `params` | params |
//! | `separate` | `{ params, query, body }`, not flattened |
//!
//! Just `use` the prelude module, and you're ready to go!
//!
//! ## Quick server setup
//! ```ignore
//! use parameters_middleware::prelude::*;
//!
//! async fn show(req: Request) -> Option<Parameters> {
//!     req.parameters().cloned()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParametersError> {
//!     env_logger::init();
//!
//!     let server = Server::builder()
//!         .configure_listener(|l| l.interface("127.0.0.1:3000"))
//!         .configure_middlewares(|stack| {
//!             stack
//!                 .apply(BodyParser::new(), vec!["/"], None)
//!                 .apply(ParametersMiddleware::new(UnionKind::Join), vec!["/"], None)
//!         })
//!         .configure_router(|r| r.route("/{id}", Method::POST, show))
//!         .build();
//!
//!     server.run().await
//! }
//! ```

#[macro_use]
extern crate log;

/// Request body
pub mod body;
/// Middleware decoding json and form bodies
pub mod body_parser;
/// Error definitions
pub mod error;
/// Definition of types which can handle an http request
pub mod handler;
/// Context enveloping every request <-> response
pub mod http_context;
/// Middleware storing the unified parameters on the request
pub mod inject;
/// The parameters merge
pub mod merge;
///
pub mod middleware;
/// Request scoped parameters holder
pub mod parameters;
/// The Http Request type
pub mod request;
/// Definition of type which can map to a response
pub mod responder;
/// The Http Response type
pub mod response;
///
pub mod router;
/// Server implementation
pub mod server;
/// Union kinds selecting the merged containers
pub mod union;
mod utils;
///
pub use http;
///
pub use hyper;

/// Contains everything you need to bootstrap your http server
///
/// ```rust
/// use parameters_middleware::prelude::*;
///
/// // implement magic
/// ```
pub mod prelude {
    ///
    pub use crate::body::Body;
    ///
    pub use crate::body::Bytes;
    ///
    pub use crate::body_parser::BodyParser;
    ///
    pub use crate::error::ParametersError;
    ///
    pub use crate::handler::Handler;
    ///
    pub use crate::http_context::HttpContext;
    ///
    pub use crate::inject::ParametersConfig;
    ///
    pub use crate::inject::ParametersMiddleware;
    ///
    pub use crate::merge::merge;
    ///
    pub use crate::merge::Subject;
    ///
    pub use crate::middleware::Middleware;
    ///
    pub use crate::middleware::MiddlewareChain;
    ///
    pub use crate::parameters::Parameters;
    ///
    pub use crate::request::Request;
    ///
    pub use crate::responder::Responder;
    ///
    pub use crate::response::Builder;
    ///
    pub use crate::response::Response;
    ///
    pub use crate::server::Server;
    ///
    pub use crate::union::UnionKind;
    ///
    pub use http::header;
    ///
    pub use http::Method;
    ///
    pub use http::StatusCode;
    ///
    pub use http::Uri;
}
