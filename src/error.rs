use crate::{responder::Responder, response::Builder};
use http::{Error as HttpCrateError, StatusCode};
use hyper::Error as HyperError;
use std::io::Error as IoError;
use thiserror::Error;

/// Error type throughout the parameters stack
#[derive(Debug, Error)]
pub enum ParametersError {
    /// The union literal used to configure a middleware is not one of the
    /// eight known unions
    #[error("unknown parameters union `{0}`, expected one of: join, separate, body, body-params, body-query, query, query-params, params")]
    UnknownUnion(String),
    /// Body was taken and cannot be polled
    #[error("request body was already taken")]
    BodyAlreadyTaken,
    #[error("request body of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    /// The body was decoded but does not hold a key/value mapping
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    /// Error from deserializing json data
    #[error("unable to deserialize json body: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Error from deserializing form data
    #[error("unable to deserialize form body: {0}")]
    SerdeUrlDe(#[from] serde_urlencoded::de::Error),
    #[error("missing parameter `{0}`")]
    MissingParameter(String),
    #[error("unable to parse parameter `{0}`: {1}")]
    InvalidParameter(String, String),
    #[error("request was moved out of the context before reaching the handler")]
    RequestMovedBeforeHandler,
    #[error("response was moved out of the context before being sent")]
    ResponseMoved,
    #[error(transparent)]
    Http(#[from] HttpCrateError),
    #[error(transparent)]
    Hyper(#[from] HyperError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ParametersError {
    /// Status code of the response generated when this error reaches the
    /// end of the stack
    pub fn status_code(&self) -> StatusCode {
        match self {
            ParametersError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ParametersError::InvalidBody(_)
            | ParametersError::SerdeJson(_)
            | ParametersError::SerdeUrlDe(_)
            | ParametersError::MissingParameter(_)
            | ParametersError::InvalidParameter(..) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Responder for ParametersError {
    fn respond_with_builder(self, builder: Builder) -> Builder {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("Parameters stack encountered an error that was returned as a responder: {:?}", self);
        } else {
            debug!("Rejecting request: {}", self);
        }

        builder.status(status)
    }
}
