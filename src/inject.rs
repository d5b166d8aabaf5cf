use std::str::FromStr;

use futures::{future::BoxFuture, FutureExt};
use serde::Deserialize;

use crate::{
    error::ParametersError,
    http_context::HttpContext,
    merge::merge,
    middleware::{Middleware, MiddlewareChain},
    parameters::{Parameters, REQUEST_ORIGIN},
    request::Request,
    union::UnionKind,
};

/// Build the parameters of `req` from its path captures, query string and
/// parsed body, and store them on the request.
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// # use parameters_middleware::inject::inject_parameters;
/// # use serde_json::json;
/// let mut req = Request::new(http::Request::builder().uri("/18?extra=123").body(()).unwrap(), None);
/// req.captures_mut().insert("id".to_string(), "18".to_string());
///
/// inject_parameters(&mut req, UnionKind::Join);
///
/// let params = req.parameters().unwrap();
/// assert_eq!(params.origin(), "request");
/// assert_eq!(params.get("id"), Some(&json!("18")));
/// assert_eq!(params.get("extra"), Some(&json!("123")));
/// ```
pub fn inject_parameters<T>(req: &mut Request<T>, union: UnionKind) {
    let subject = merge(union, &req.path_params(), &req.query_params(), req.body_params());
    trace!("Injecting {} parameters for {}: {:?}", union, req.uri().path(), subject);
    if req.set_parameters(Parameters::new(subject, REQUEST_ORIGIN)).is_some() {
        debug!("Parameters of {} were injected more than once, keeping the last ones", req.uri().path());
    }
}

/// Deserializable configuration of a [`ParametersMiddleware`]
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// let config: ParametersConfig = serde_json::from_str(r#"{ "union": "query-params" }"#).unwrap();
/// assert_eq!(ParametersMiddleware::from(config).union(), UnionKind::QueryParams);
///
/// let config: ParametersConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config.union, UnionKind::Body);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ParametersConfig {
    #[serde(default)]
    pub union: UnionKind,
}

/// Middleware injecting the [`Parameters`] of every request it applies to.
///
/// It never fails nor stops the request: the chain always continues after
/// the parameters were stored.
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// let server = Server::builder()
///     .configure_middlewares(|stack| {
///         stack
///             .apply(BodyParser::new(), vec!["/"], None)
///             .apply(ParametersMiddleware::new(UnionKind::Join), vec!["/"], None)
///     })
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParametersMiddleware {
    union: UnionKind,
}

impl ParametersMiddleware {
    pub fn new(union: UnionKind) -> Self {
        ParametersMiddleware { union }
    }

    #[inline]
    pub fn union(&self) -> UnionKind {
        self.union
    }

    async fn next_inner(&self, mut ctx: HttpContext, chain: &dyn MiddlewareChain) -> Result<HttpContext, ParametersError> {
        match ctx.state.request_mut() {
            Some(req) => inject_parameters(req, self.union),
            None => warn!("Request was moved out of the context before the parameters middleware, skipping injection"),
        }

        chain.next(ctx).await
    }
}

impl From<UnionKind> for ParametersMiddleware {
    fn from(union: UnionKind) -> Self {
        ParametersMiddleware::new(union)
    }
}

impl From<ParametersConfig> for ParametersMiddleware {
    fn from(config: ParametersConfig) -> Self {
        ParametersMiddleware::new(config.union)
    }
}

/// Configure the middleware from a union literal, failing on unknown ones
impl FromStr for ParametersMiddleware {
    type Err = ParametersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ParametersMiddleware::new)
    }
}

impl Middleware for ParametersMiddleware {
    fn next<'a>(&'a self, ctx: HttpContext, chain: &'a dyn MiddlewareChain) -> BoxFuture<'a, Result<HttpContext, ParametersError>> {
        self.next_inner(ctx, chain).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn request(uri: &str, id: &str) -> Request<()> {
        let mut req = Request::new(http::Request::builder().method("POST").uri(uri).body(()).unwrap(), None);
        req.captures_mut().insert("id".to_string(), id.to_string());
        req
    }

    fn injected(req: &Request<()>) -> Value {
        Value::Object(req.parameters().unwrap().subject().clone())
    }

    #[test]
    fn injects_request_tagged_parameters() {
        let mut req = request("/18?extra=123", "18");
        req.set_body_params(json!({ "part": 1 }).as_object().cloned().unwrap());

        inject_parameters(&mut req, UnionKind::Join);
        assert_eq!(req.parameters().unwrap().origin(), REQUEST_ORIGIN);
        assert_eq!(injected(&req), json!({ "id": "18", "extra": "123", "part": 1 }));
    }

    #[test]
    fn missing_body_is_empty() {
        let mut req = request("/18?extra=123", "18");
        inject_parameters(&mut req, UnionKind::Separate);
        assert_eq!(
            injected(&req),
            json!({ "params": { "id": "18" }, "query": { "extra": "123" }, "body": {} })
        );
    }

    #[test]
    fn fresh_parameters_replace_previous_ones() {
        let mut req = request("/18?extra=123", "18");
        inject_parameters(&mut req, UnionKind::Params);
        inject_parameters(&mut req, UnionKind::Query);
        assert_eq!(injected(&req), json!({ "extra": "123" }));
    }

    #[test]
    fn injection_leaves_containers_untouched() {
        let mut req = request("/18?extra=123", "18");
        req.set_body_params(json!({ "part": 1 }).as_object().cloned().unwrap());
        inject_parameters(&mut req, UnionKind::Join);

        assert_eq!(req.captures()["id"], "18");
        assert_eq!(Value::Object(req.query_params()), json!({ "extra": "123" }));
        assert_eq!(Value::Object(req.body_params().cloned().unwrap()), json!({ "part": 1 }));
    }

    #[test]
    fn configured_from_literal() {
        assert_eq!("params".parse::<ParametersMiddleware>().unwrap().union(), UnionKind::Params);
        assert!(matches!(
            "all".parse::<ParametersMiddleware>(),
            Err(ParametersError::UnknownUnion(_))
        ));
        assert_eq!(ParametersMiddleware::default().union(), UnionKind::Body);
    }

    #[test]
    fn config_rejects_unknown_union() {
        assert!(serde_json::from_str::<ParametersConfig>(r#"{ "union": "everything" }"#).is_err());
    }
}
