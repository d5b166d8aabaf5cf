use std::{
    collections::HashMap,
    net::SocketAddr,
    ops::{Deref, DerefMut},
};

use http::Request as RawRequest;
use serde_json::Value;

use crate::{body::Body, merge::Subject, parameters::Parameters, utils::parse_query};

/// Struct that wraps a hyper request + the containers parameters are built
/// from
pub struct Request<T = Body> {
    #[doc(hidden)]
    inner: RawRequest<T>,
    #[doc(hidden)]
    captures: HashMap<String, String>,
    #[doc(hidden)]
    body_params: Option<Subject>,
    #[doc(hidden)]
    parameters: Option<Parameters>,
    #[doc(hidden)]
    peer_addr: Option<SocketAddr>,
}

impl<T> Request<T> {
    pub fn new(raw: RawRequest<T>, peer_addr: Option<SocketAddr>) -> Self {
        Request {
            inner: raw,
            captures: Default::default(),
            body_params: None,
            parameters: None,
            peer_addr,
        }
    }

    /// Return the Peer SocketAddr if one was available when receiving the
    /// request
    #[inline]
    pub fn peer_addr(&self) -> Option<&SocketAddr> {
        self.peer_addr.as_ref()
    }

    /// Access the captured variables from the request path. E.g. a path
    /// composed as `/user/{user_id}/profile` will store a capture named
    /// `"user_id"`.
    ///
    /// ```rust
    /// # use parameters_middleware::prelude::*;
    /// # let mut req = Request::new(http::Request::builder().uri("/user/18/profile").body(()).unwrap(), None);
    /// # req.captures_mut().insert("user_id".to_string(), "18".to_string());
    /// let user_id = req.captures().get("user_id");
    /// assert_eq!(user_id.map(String::as_str), Some("18"));
    /// ```
    #[inline]
    pub fn captures(&self) -> &HashMap<String, String> {
        &self.captures
    }

    /// Access the captured variables from the request path, in a mutable way.
    #[inline]
    pub fn captures_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.captures
    }

    /// Path captures as a parameters container
    pub fn path_params(&self) -> Subject {
        self.captures.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()
    }

    /// Parsed query string of the request uri. Repeated keys are collected in
    /// arrays, a missing or undecodable query string is an empty container.
    pub fn query_params(&self) -> Subject {
        self.inner.uri().query().map(parse_query).unwrap_or_default()
    }

    /// Body decoded by a body parser, `None` if no parser ran or the body was
    /// empty
    #[inline]
    pub fn body_params(&self) -> Option<&Subject> {
        self.body_params.as_ref()
    }

    #[inline]
    pub fn set_body_params(&mut self, body: Subject) {
        self.body_params = Some(body);
    }

    /// Parameters injected by the
    /// [`ParametersMiddleware`](crate::inject::ParametersMiddleware)
    #[inline]
    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    #[inline]
    pub fn parameters_mut(&mut self) -> Option<&mut Parameters> {
        self.parameters.as_mut()
    }

    /// Store the request parameters, returning the ones previously stored
    #[inline]
    pub fn set_parameters(&mut self, parameters: Parameters) -> Option<Parameters> {
        self.parameters.replace(parameters)
    }

    #[inline]
    pub fn take_parameters(&mut self) -> Option<Parameters> {
        self.parameters.take()
    }
}

impl<T> Deref for Request<T> {
    type Target = RawRequest<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for Request<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
