use futures::{future::BoxFuture, FutureExt};
use regex::Regex;

use crate::{error::ParametersError, http_context::HttpContext};

/// The trait a struct need to `impl` to be considered as a middleware.
///
/// A middleware receives the context `Before` the handler ran and is
/// responsible of calling `chain.next(ctx)` to continue processing the
/// request, or to put a response in the context to stop it.
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// # use futures::{future::BoxFuture, FutureExt};
/// struct LogMiddleware;
///
/// impl LogMiddleware {
///     async fn next_inner(&self, ctx: HttpContext, chain: &dyn MiddlewareChain) -> Result<HttpContext, ParametersError> {
///         if let Some(req) = ctx.state.request() {
///             println!("{} {}", req.method(), req.uri());
///         }
///         chain.next(ctx).await
///     }
/// }
///
/// impl Middleware for LogMiddleware {
///     fn next<'a>(&'a self, ctx: HttpContext, chain: &'a dyn MiddlewareChain) -> BoxFuture<'a, Result<HttpContext, ParametersError>> {
///         self.next_inner(ctx, chain).boxed()
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    fn next<'a>(&'a self, ctx: HttpContext, chain: &'a dyn MiddlewareChain) -> BoxFuture<'a, Result<HttpContext, ParametersError>>;
}

/// Remaining links of the middleware stack. The last link dispatches the
/// request to the router.
pub trait MiddlewareChain: Send + Sync {
    fn next(&self, ctx: HttpContext) -> BoxFuture<'_, Result<HttpContext, ParametersError>>;
}

/// Paths a middleware applies to
pub(crate) struct MiddlewareRule {
    included_path: Vec<Regex>,
    excluded_path: Vec<Regex>,
}

impl MiddlewareRule {
    pub fn new(include_path: &[&str], exclude_path: &[&str]) -> Self {
        MiddlewareRule {
            included_path: include_path.iter().filter_map(|p| path_regex(p)).collect(),
            excluded_path: exclude_path.iter().filter_map(|p| path_regex(p)).collect(),
        }
    }

    pub fn validate_path(&self, path: &str) -> bool {
        self.included_path.iter().any(|r| r.is_match(path)) && !self.excluded_path.iter().any(|r| r.is_match(path))
    }
}

/// Translate a rule path into a prefix regex: `/users` applies to `/users`
/// and everything under it, `*` matches a single segment and `**` anything.
fn path_regex(path: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix("**") {
            pattern.push_str(".*");
            rest = r;
        } else if let Some(r) = rest.strip_prefix('*') {
            pattern.push_str("[^/]*");
            rest = r;
        } else {
            let end = rest.find('*').unwrap_or(rest.len());
            pattern.push_str(&regex::escape(&rest[..end]));
            rest = &rest[end..];
        }
    }

    if !path.ends_with('/') {
        pattern.push_str("(?:/|$)");
    }

    match Regex::new(&pattern) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("Ignoring invalid middleware path `{}`: {}", path, e);
            None
        }
    }
}

type MiddlewareEntry = (MiddlewareRule, Box<dyn Middleware>);

/// Builder for the middleware stack of a server
#[derive(Default)]
pub struct Builder {
    middlewares: Vec<MiddlewareEntry>,
}

impl Builder {
    /// Method to apply a new middleware onto the stack where the
    /// `include_path` vec are all path affected by the middleware, and
    /// `exclude_path` are exclusion amongst the included paths. Middlewares
    /// run in the order they are applied.
    pub fn apply<M>(mut self, m: M, include_path: Vec<&str>, exclude_path: Option<Vec<&str>>) -> Self
    where
        M: 'static + Middleware,
    {
        let rule = MiddlewareRule::new(&include_path, exclude_path.as_deref().unwrap_or_default());
        self.middlewares.push((rule, Box::new(m)));
        self
    }

    pub(crate) fn build(self) -> MiddlewareStack {
        MiddlewareStack {
            middlewares: self.middlewares,
        }
    }
}

#[doc(hidden)]
pub struct MiddlewareStack {
    middlewares: Vec<MiddlewareEntry>,
}

impl MiddlewareChain for MiddlewareStack {
    fn next(&self, ctx: HttpContext) -> BoxFuture<'_, Result<HttpContext, ParametersError>> {
        ChainLink {
            remaining: &self.middlewares,
        }
        .into_next(ctx)
    }
}

struct ChainLink<'s> {
    remaining: &'s [MiddlewareEntry],
}

impl<'s> ChainLink<'s> {
    fn into_next(self, mut ctx: HttpContext) -> BoxFuture<'s, Result<HttpContext, ParametersError>> {
        async move {
            match self.remaining.split_first() {
                Some(((rule, middleware), rest)) => {
                    let rest = ChainLink { remaining: rest };
                    let applies = ctx.state.request().map_or(false, |req| rule.validate_path(req.uri().path()));
                    if applies {
                        middleware.next(ctx, &rest).await
                    } else {
                        rest.into_next(ctx).await
                    }
                }
                None => match ctx.router.take() {
                    Some(router) => router.dispatch(ctx).await,
                    None => Ok(ctx),
                },
            }
        }
        .boxed()
    }
}

impl MiddlewareChain for ChainLink<'_> {
    fn next(&self, ctx: HttpContext) -> BoxFuture<'_, Result<HttpContext, ParametersError>> {
        ChainLink { remaining: self.remaining }.into_next(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_applies_to_prefix_at_segment_boundary() {
        let rule = MiddlewareRule::new(&["/users"], &[]);
        assert!(rule.validate_path("/users"));
        assert!(rule.validate_path("/users/18"));
        assert!(!rule.validate_path("/usersx"));
        assert!(!rule.validate_path("/posts"));
    }

    #[test]
    fn root_rule_applies_everywhere() {
        let rule = MiddlewareRule::new(&["/"], &[]);
        assert!(rule.validate_path("/"));
        assert!(rule.validate_path("/anything/at/all"));
    }

    #[test]
    fn exclusions_win() {
        let rule = MiddlewareRule::new(&["/"], &["/health", "/static/**"]);
        assert!(rule.validate_path("/users/18"));
        assert!(!rule.validate_path("/health"));
        assert!(!rule.validate_path("/static/site.css"));
    }

    #[test]
    fn single_segment_wildcard() {
        let rule = MiddlewareRule::new(&["/users/*/posts"], &[]);
        assert!(rule.validate_path("/users/18/posts"));
        assert!(rule.validate_path("/users/18/posts/7"));
        assert!(!rule.validate_path("/users/18/19/posts"));
    }

    #[test]
    fn special_characters_are_literal() {
        let rule = MiddlewareRule::new(&["/v1.0"], &[]);
        assert!(rule.validate_path("/v1.0/items"));
        assert!(!rule.validate_path("/v1x0/items"));
    }
}
