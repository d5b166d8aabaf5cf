use std::{collections::HashMap, sync::Arc};

use http::Method;
use percent_encoding::percent_decode_str;

use crate::{
    error::ParametersError,
    handler::DynHandler,
    http_context::{HandlerMetadata, HttpContext, RouteId},
    request::Request,
    response::Builder as ResponseBuilder,
};

#[derive(Debug, Clone, PartialEq)]
enum UriPathSegmentMatcher {
    Static { segment: String },
    Variable { name: String },
    Wildcard,
}

impl UriPathSegmentMatcher {
    fn new(segment: &str) -> Self {
        if segment == "*" {
            return UriPathSegmentMatcher::Wildcard;
        }

        let name = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| segment.strip_prefix(':'))
            .filter(|name| !name.is_empty());

        match name {
            Some(name) => UriPathSegmentMatcher::Variable { name: name.to_string() },
            None => UriPathSegmentMatcher::Static {
                segment: segment.to_string(),
            },
        }
    }

    fn match_and_capture(&self, segment: &str, captures: &mut HashMap<String, String>) -> bool {
        match self {
            UriPathSegmentMatcher::Static { segment: s } => s == segment,
            UriPathSegmentMatcher::Variable { name } => {
                let value = percent_decode_str(segment).decode_utf8_lossy().into_owned();
                captures.insert(name.clone(), value);
                true
            }
            UriPathSegmentMatcher::Wildcard => true,
        }
    }
}

/// Matches request paths against a route pattern such as
/// `/users/{user_id}/posts/:post_id`, `/files/*/raw` or `/static/**`.
#[derive(Debug)]
pub(crate) struct UriPathMatcher {
    segments: Vec<UriPathSegmentMatcher>,
    match_rest: bool,
}

impl UriPathMatcher {
    pub fn new(path_str: &str) -> Self {
        let mut match_rest = false;
        let mut segments = Vec::new();
        for seg in path_str.split('/').filter(|s| !s.is_empty()) {
            if seg == "**" {
                match_rest = true;
                break;
            }
            segments.push(UriPathSegmentMatcher::new(seg));
        }

        UriPathMatcher { segments, match_rest }
    }

    /// Match the whole path, filling `captures` only if it matched
    pub fn match_all_and_capture(&self, path: &str, captures: &mut HashMap<String, String>) -> bool {
        let path_segments = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
        let len_ok = if self.match_rest {
            path_segments.len() >= self.segments.len()
        } else {
            path_segments.len() == self.segments.len()
        };

        if !len_ok {
            return false;
        }

        let mut found = HashMap::new();
        let matched = self
            .segments
            .iter()
            .zip(path_segments.iter())
            .all(|(matcher, segment)| matcher.match_and_capture(segment, &mut found));

        if matched {
            captures.extend(found);
        }

        matched
    }
}

pub(crate) enum EndpointResolverResult {
    InvalidPath,
    MethodNotAllowed,
    Match,
}

pub(crate) struct EndpointResolver {
    path_matcher: UriPathMatcher,
    method: Method,
}

impl EndpointResolver {
    fn new(path_str: &str, method: Method) -> Self {
        EndpointResolver {
            path_matcher: UriPathMatcher::new(path_str),
            method,
        }
    }

    fn resolve<T>(&self, req: &mut Request<T>) -> EndpointResolverResult {
        let path = req.uri().path().to_string();
        let mut captures = HashMap::new();
        if !self.path_matcher.match_all_and_capture(&path, &mut captures) {
            return EndpointResolverResult::InvalidPath;
        }

        if &self.method != req.method() {
            return EndpointResolverResult::MethodNotAllowed;
        }

        req.captures_mut().extend(captures);
        EndpointResolverResult::Match
    }
}

struct Route {
    resolver: EndpointResolver,
    handler: Box<dyn DynHandler>,
}

/// Builder for the routes of a server
#[derive(Default)]
pub struct Builder {
    routes: Vec<Route>,
}

impl Builder {
    /// Add a route to the router. Routes are resolved in the order they were
    /// added.
    ///
    /// ```rust
    /// # use parameters_middleware::prelude::*;
    /// # use parameters_middleware::router::Builder as RouterBuilder;
    /// async fn show(req: Request) -> Option<Parameters> {
    ///     req.parameters().cloned()
    /// }
    ///
    /// let router = RouterBuilder::default()
    ///     .route("/items/{id}", Method::GET, show)
    ///     .route("/items/:id", Method::POST, show)
    ///     .build();
    /// ```
    pub fn route<H>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: 'static + DynHandler,
    {
        self.routes.push(Route {
            resolver: EndpointResolver::new(path, method),
            handler: Box::new(handler),
        });
        self
    }

    pub fn build(self) -> Router {
        Router {
            inner: Arc::new(self.routes),
        }
    }
}

/// Routes resolved once per request before the middleware stack runs, so that
/// path captures are available to middlewares
#[derive(Clone)]
pub struct Router {
    inner: Arc<Vec<Route>>,
}

impl Router {
    /// Find the route of a request and fill its path captures
    pub(crate) fn resolve<T>(&self, req: &mut Request<T>) -> HandlerMetadata {
        let mut method_not_allowed = false;
        for (id, route) in self.inner.iter().enumerate() {
            match route.resolver.resolve(req) {
                EndpointResolverResult::Match => return HandlerMetadata::new(id),
                EndpointResolverResult::MethodNotAllowed => method_not_allowed = true,
                EndpointResolverResult::InvalidPath => {}
            }
        }

        if method_not_allowed {
            HandlerMetadata::not_allowed()
        } else {
            HandlerMetadata::not_found()
        }
    }

    /// Run the handler of the resolved route, leaving its response in the
    /// context
    pub(crate) async fn dispatch(&self, mut ctx: HttpContext) -> Result<HttpContext, ParametersError> {
        let req = ctx.state.take_request().ok_or(ParametersError::RequestMovedBeforeHandler)?;
        let route = match ctx.metadata.route_id {
            RouteId::Id(id) => self.inner.get(id),
            RouteId::Error(_) => None,
        };

        let res = match (route, ctx.metadata.route_id) {
            (Some(route), _) => route.handler.dyn_handle(req).await,
            (None, RouteId::Error(status)) => ResponseBuilder::new().status(status).build()?,
            (None, RouteId::Id(_)) => ResponseBuilder::new().status(404).build()?,
        };

        ctx.after(res);
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures_of(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
        let mut captures = HashMap::new();
        if UriPathMatcher::new(pattern).match_all_and_capture(path, &mut captures) {
            Some(captures)
        } else {
            None
        }
    }

    #[test]
    fn captures_braces_and_colon_variables() {
        let captures = captures_of("/users/{user_id}/posts/:post_id", "/users/18/posts/7").unwrap();
        assert_eq!(captures["user_id"], "18");
        assert_eq!(captures["post_id"], "7");
    }

    #[test]
    fn captures_are_percent_decoded() {
        let captures = captures_of("/users/{name}", "/users/John%20Doe").unwrap();
        assert_eq!(captures["name"], "John Doe");
    }

    #[test]
    fn static_segments_must_match() {
        assert!(captures_of("/users/{id}", "/posts/18").is_none());
        assert!(captures_of("/users/{id}", "/users/18/extra").is_none());
        assert!(captures_of("/users/{id}", "/users").is_none());
        assert!(captures_of("/", "/").unwrap().is_empty());
    }

    #[test]
    fn wildcards() {
        assert!(captures_of("/files/*/raw", "/files/a.txt/raw").is_some());
        assert!(captures_of("/static/**", "/static/css/site.css").is_some());
        assert!(captures_of("/static/**", "/static").is_some());
        assert!(captures_of("/static/**", "/other/site.css").is_none());
    }

    #[test]
    fn failed_match_leaves_no_capture() {
        let mut captures = HashMap::new();
        assert!(!UriPathMatcher::new("/{id}/static").match_all_and_capture("/18/other", &mut captures));
        assert!(captures.is_empty());
    }

    #[test]
    fn resolve_reports_not_allowed_and_not_found() {
        let router = Builder::default().route("/{id}", Method::GET, |_req: Request| async { 200u16 }).build();

        let mut req = Request::new(http::Request::builder().method("GET").uri("/18").body(()).unwrap(), None);
        assert_eq!(router.resolve(&mut req).route_id, RouteId::Id(0));
        assert_eq!(req.captures()["id"], "18");

        let mut req = Request::new(http::Request::builder().method("DELETE").uri("/18").body(()).unwrap(), None);
        assert_eq!(router.resolve(&mut req).route_id, RouteId::Error(405));

        let mut req = Request::new(http::Request::builder().method("GET").uri("/18/more").body(()).unwrap(), None);
        assert_eq!(router.resolve(&mut req).route_id, RouteId::Error(404));
    }
}
