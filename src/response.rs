use http::{header::HeaderName, response::Builder as RawBuilder, HeaderValue, Response as RawResponse, StatusCode};

use crate::{body::Bytes, error::ParametersError};

/// The Http Response type, its body is always fully in memory
pub type Response = RawResponse<Bytes>;

/// Struct used to conveniently build a response
pub struct Builder {
    #[doc(hidden)]
    inner: RawBuilder,
    #[doc(hidden)]
    body: Bytes,
    #[doc(hidden)]
    status_set: bool,
}

impl Builder {
    /// Creates a new default instance of `Builder` to construct a `Response`.
    /// ```
    /// # use parameters_middleware::prelude::*;
    ///
    /// let response = Builder::new()
    ///     .status(200)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Builder {
            inner: RawBuilder::new(),
            body: Bytes::new(),
            status_set: false,
        }
    }

    /// Set the HTTP status for this response.
    #[inline]
    pub fn status<T>(mut self, status: T) -> Builder
    where
        StatusCode: TryFrom<T>,
        <StatusCode as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.status(status);
        self.status_set = true;
        self
    }

    /// Appends a header to this response builder.
    #[inline]
    pub fn header<K, V>(mut self, key: K, value: V) -> Builder
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    /// Set the response body
    #[inline]
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Builder {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the json response body
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Builder, ParametersError> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header(http::header::CONTENT_TYPE, "application/json").body(body))
    }

    /// Finish this builder into a `Response`. A builder without an explicit
    /// status responds `200 OK`.
    pub fn build(self) -> Result<Response, ParametersError> {
        let Builder { inner, body, status_set } = self;
        let inner = if status_set { inner } else { inner.status(StatusCode::OK) };
        Ok(inner.body(body)?)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

/// Bare response carrying only a status code, used when building a response
/// failed
pub(crate) fn status_response(status: StatusCode) -> Response {
    let mut res = Response::new(Bytes::new());
    *res.status_mut() = status;
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ok() {
        let res = Builder::new().body("hello").build().unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), &Bytes::from_static(b"hello"));
    }

    #[test]
    fn json_sets_content_type() {
        let res = Builder::new().status(201).json(&serde_json::json!({ "id": "18" })).unwrap().build().unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[http::header::CONTENT_TYPE], "application/json");
        assert_eq!(res.body(), &Bytes::from_static(b"{\"id\":\"18\"}"));
    }

    #[test]
    fn invalid_status_fails_on_build() {
        assert!(Builder::new().status(1000u16).build().is_err());
    }
}
