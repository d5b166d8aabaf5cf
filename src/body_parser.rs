use futures::{future::BoxFuture, FutureExt};
use http::{header, HeaderMap};
use mime::Mime;
use serde_json::Value;

use crate::{
    body::Bytes,
    error::ParametersError,
    http_context::HttpContext,
    merge::Subject,
    middleware::{Middleware, MiddlewareChain},
    request::Request,
    utils::collect_pairs,
};

/// Default maximum size of a parsed body, 100 KiB
pub const DEFAULT_BODY_LIMIT: usize = 102_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

/// Middleware decoding json and urlencoded form bodies into the request body
/// container read by the parameters middleware.
///
/// Bodies of other content types, and empty bodies, are left untouched and
/// the request has no body container.
#[derive(Debug, Clone, Copy)]
pub struct BodyParser {
    limit: Option<usize>,
    json: bool,
    form: bool,
}

impl BodyParser {
    /// Parser for both json and form bodies
    pub fn new() -> Self {
        BodyParser {
            limit: Some(DEFAULT_BODY_LIMIT),
            json: true,
            form: true,
        }
    }

    /// Parser for json bodies only
    pub fn json() -> Self {
        BodyParser {
            form: false,
            ..BodyParser::new()
        }
    }

    /// Parser for form bodies only
    pub fn form() -> Self {
        BodyParser {
            json: false,
            ..BodyParser::new()
        }
    }

    /// Maximum body size in bytes, `None` to read bodies of any size
    pub fn limit<L: Into<Option<usize>>>(mut self, limit: L) -> Self {
        self.limit = limit.into();
        self
    }

    fn body_kind(&self, headers: &HeaderMap) -> Option<BodyKind> {
        let mime = headers
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<Mime>().ok())?;

        if self.json && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)) {
            Some(BodyKind::Json)
        } else if self.form && mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Some(BodyKind::Form)
        } else {
            None
        }
    }

    fn declared_length(headers: &HeaderMap) -> Option<usize> {
        headers
            .get(header::CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok())
    }

    /// Decode the body of `req` if its content type is handled by this parser
    pub async fn parse(&self, req: &mut Request) -> Result<(), ParametersError> {
        let kind = match self.body_kind(req.headers()) {
            Some(kind) => kind,
            None => return Ok(()),
        };

        if let (Some(size), Some(limit)) = (Self::declared_length(req.headers()), self.limit) {
            if size > limit {
                return Err(ParametersError::PayloadTooLarge { size, limit });
            }
        }

        let bytes = req.body_mut().load_limited(self.limit).await?;
        if bytes.is_empty() {
            trace!("Empty {:?} body for {}", kind, req.uri().path());
            return Ok(());
        }

        let body = match kind {
            BodyKind::Json => decode_json(&bytes)?,
            BodyKind::Form => decode_form(&bytes)?,
        };
        req.set_body_params(body);
        Ok(())
    }

    async fn next_inner(&self, mut ctx: HttpContext, chain: &dyn MiddlewareChain) -> Result<HttpContext, ParametersError> {
        if let Some(req) = ctx.state.request_mut() {
            self.parse(req).await?;
        }

        chain.next(ctx).await
    }
}

impl Default for BodyParser {
    fn default() -> Self {
        BodyParser::new()
    }
}

impl Middleware for BodyParser {
    fn next<'a>(&'a self, ctx: HttpContext, chain: &'a dyn MiddlewareChain) -> BoxFuture<'a, Result<HttpContext, ParametersError>> {
        self.next_inner(ctx, chain).boxed()
    }
}

/// Decode a json body, which must hold an object
pub(crate) fn decode_json(bytes: &Bytes) -> Result<Subject, ParametersError> {
    match serde_json::from_slice::<Value>(bytes.as_ref())? {
        Value::Object(subject) => Ok(subject),
        other => Err(ParametersError::InvalidBody(format!("expected a json object, found {}", json_kind(&other)))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode an urlencoded form body, grouping repeated keys like the query
/// string
pub(crate) fn decode_form(bytes: &Bytes) -> Result<Subject, ParametersError> {
    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes.as_ref())?;
    Ok(collect_pairs(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use serde_json::json;

    fn request(content_type: &str, body: &'static str) -> Request {
        Request::new(
            http::Request::builder()
                .method("POST")
                .uri("/18")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
            None,
        )
    }

    fn parsed(req: &Request) -> Option<Value> {
        req.body_params().cloned().map(Value::Object)
    }

    #[tokio::test]
    async fn parses_json_object() {
        let mut req = request("application/json; charset=utf-8", r#"{"part":1,"nested":{"a":[1,2]}}"#);
        BodyParser::new().parse(&mut req).await.unwrap();
        assert_eq!(parsed(&req), Some(json!({ "part": 1, "nested": { "a": [1, 2] } })));
    }

    #[tokio::test]
    async fn parses_json_suffix_types() {
        let mut req = request("application/merge-patch+json", r#"{"part":1}"#);
        BodyParser::json().parse(&mut req).await.unwrap();
        assert_eq!(parsed(&req), Some(json!({ "part": 1 })));
    }

    #[tokio::test]
    async fn rejects_non_object_json() {
        let mut req = request("application/json", "[1,2]");
        match BodyParser::new().parse(&mut req).await {
            Err(ParametersError::InvalidBody(msg)) => assert!(msg.contains("an array")),
            other => panic!("expected InvalidBody, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let mut req = request("application/json", "{\"part\":");
        assert!(matches!(BodyParser::new().parse(&mut req).await, Err(ParametersError::SerdeJson(_))));
    }

    #[tokio::test]
    async fn parses_form() {
        let mut req = request("application/x-www-form-urlencoded", "name=John%20Doe&tag=a&tag=b");
        BodyParser::new().parse(&mut req).await.unwrap();
        assert_eq!(parsed(&req), Some(json!({ "name": "John Doe", "tag": ["a", "b"] })));
    }

    #[tokio::test]
    async fn empty_body_leaves_no_container() {
        let mut req = request("application/json", "");
        BodyParser::new().parse(&mut req).await.unwrap();
        assert!(req.body_params().is_none());
    }

    #[tokio::test]
    async fn other_content_types_are_ignored() {
        let mut req = request("text/plain", "part=1");
        BodyParser::new().parse(&mut req).await.unwrap();
        assert!(req.body_params().is_none());

        let mut req = request("application/json", r#"{"part":1}"#);
        BodyParser::form().parse(&mut req).await.unwrap();
        assert!(req.body_params().is_none());
    }

    #[tokio::test]
    async fn body_stays_readable_after_parsing() {
        let mut req = request("application/json", r#"{"part":1}"#);
        BodyParser::new().parse(&mut req).await.unwrap();
        assert_eq!(req.body_mut().load().await.unwrap(), Bytes::from_static(br#"{"part":1}"#));
    }

    #[tokio::test]
    async fn enforces_limit() {
        let mut req = request("application/json", r#"{"part":"0123456789"}"#);
        match BodyParser::new().limit(8).parse(&mut req).await {
            Err(ParametersError::PayloadTooLarge { limit, .. }) => assert_eq!(limit, 8),
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }

        let mut req = request("application/json", r#"{"part":"0123456789"}"#);
        BodyParser::new().limit(None).parse(&mut req).await.unwrap();
        assert!(req.body_params().is_some());
    }

    #[tokio::test]
    async fn declared_length_is_checked_before_reading() {
        let mut req = request("application/json", r#"{"part":1}"#);
        req.headers_mut().insert(header::CONTENT_LENGTH, "1000000".parse().unwrap());
        assert!(matches!(
            BodyParser::new().parse(&mut req).await,
            Err(ParametersError::PayloadTooLarge { size: 1_000_000, .. })
        ));
    }
}
