use crate::{
    body::Bytes,
    parameters::Parameters,
    response::{status_response, Builder, Response},
};
use http::StatusCode;
use serde_json::Value;

macro_rules! impl_body_responder {
    ( $( $x:ty ),+ ) => {
        $(
            impl Responder for $x {
                fn respond_with_builder(self, builder: Builder) -> Builder {
                    builder.body(self)
                }
            }
        )+
    }
}

macro_rules! impl_plain_body_responder {
    ( $( $x:ty ),+ ) => {
        $(
            impl Responder for $x {
                fn respond_with_builder(self, builder: Builder) -> Builder {
                    builder.header(http::header::CONTENT_TYPE, "text/plain").body(self)
                }
            }
        )+
    }
}

/// Responder defines what type can generate a response
pub trait Responder {
    /// Consume self into a builder
    ///
    /// ```rust
    /// # use parameters_middleware::prelude::*;
    /// struct CustomResponder(String);
    ///
    /// impl Responder for CustomResponder {
    ///     fn respond_with_builder(self, builder: Builder) -> Builder {
    ///         // Put the string as the response body
    ///         builder.body(self.0)
    ///     }
    /// }
    /// ```
    fn respond_with_builder(self, builder: Builder) -> Builder;

    /// Consume self into a response. A responder producing an invalid
    /// response is answered with a bare `500`.
    fn respond(self) -> Response
    where
        Self: Sized,
    {
        self.respond_with_builder(Builder::new()).build().unwrap_or_else(|e| {
            warn!("Unable to build the response of a responder: {}", e);
            status_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }
}

impl Responder for () {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        builder
    }
}

impl Responder for StatusCode {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        builder.status(self)
    }
}

impl Responder for u16 {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        builder.status(self)
    }
}

impl_plain_body_responder!(String, &'static str);
impl_body_responder!(Vec<u8>, Bytes);

impl Responder for Value {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        let body = self.to_string();
        builder.header(http::header::CONTENT_TYPE, "application/json").body(body)
    }
}

/// Respond the parameters subject as a json object
impl Responder for Parameters {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        Value::Object(self.into_subject()).respond_with_builder(builder)
    }
}

impl<T: Responder> Responder for Option<T> {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        match self {
            Some(r) => r.respond_with_builder(builder),
            None => builder.status(StatusCode::NOT_FOUND),
        }
    }
}

impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        match self {
            Ok(r) => r.respond_with_builder(builder),
            Err(e) => e.respond_with_builder(builder),
        }
    }
}

impl<S: Responder, T: Responder> Responder for (S, T) {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        let builder = self.0.respond_with_builder(builder);
        self.1.respond_with_builder(builder)
    }
}
