use crate::error::ParametersError;
use futures::StreamExt;
use hyper::body::{Body as RawBody, HttpBody};

pub use hyper::body::Bytes;

pub(crate) enum BodyInner {
    Raw(RawBody),
    Memory(Bytes),
}

impl BodyInner {
    pub fn empty() -> Self {
        BodyInner::Memory(Bytes::new())
    }

    async fn load(self, limit: Option<usize>) -> Result<Bytes, ParametersError> {
        match self {
            BodyInner::Raw(mut r) => {
                let first = match r.next().await.transpose()? {
                    Some(buf) => buf,
                    None => return Ok(Bytes::new()),
                };
                check_limit(first.len(), limit)?;

                let second = match r.next().await.transpose()? {
                    Some(buf) => buf,
                    None => return Ok(first),
                };

                let buffered = first.len().saturating_add(second.len());
                let mut vec = Vec::with_capacity(initial_capacity(buffered, r.size_hint().lower(), limit));
                vec.extend_from_slice(first.as_ref());
                vec.extend_from_slice(second.as_ref());
                check_limit(vec.len(), limit)?;

                while let Some(buf) = r.next().await.transpose()? {
                    vec.extend_from_slice(buf.as_ref());
                    check_limit(vec.len(), limit)?;
                }

                Ok(vec.into())
            }
            BodyInner::Memory(b) => {
                check_limit(b.len(), limit)?;
                Ok(b)
            }
        }
    }
}

/// Capacity reserved before streaming the rest of a body. The size hint comes
/// from the client declared length, so it is only trusted up to the limit.
fn initial_capacity(buffered: usize, hint: u64, limit: Option<usize>) -> usize {
    match limit {
        Some(limit) => {
            let hint = usize::try_from(hint).unwrap_or(usize::MAX);
            buffered.saturating_add(hint).min(limit.saturating_add(1))
        }
        None => buffered,
    }
}

#[inline]
fn check_limit(size: usize, limit: Option<usize>) -> Result<(), ParametersError> {
    match limit {
        Some(limit) if size > limit => Err(ParametersError::PayloadTooLarge { size, limit }),
        _ => Ok(()),
    }
}

/// Body of a request, either still streaming from the connection or already
/// loaded in memory
pub struct Body {
    inner: Option<BodyInner>,
}

impl Body {
    pub fn empty() -> Self {
        Body {
            inner: Some(BodyInner::empty()),
        }
    }

    #[inline]
    pub(crate) fn from_raw(raw: RawBody) -> Self {
        Body {
            inner: Some(BodyInner::Raw(raw)),
        }
    }

    /// Performing `take` will give your a owned version of the body, leaving
    /// a taken one behind
    #[inline]
    pub fn take(&mut self) -> Self {
        Body { inner: self.inner.take() }
    }

    /// Whether the body has been taken by a previous reader
    #[inline]
    pub fn is_taken(&self) -> bool {
        self.inner.is_none()
    }

    /// Load the whole body in memory. The loaded bytes stay in the body so
    /// that later readers get them again.
    pub async fn load(&mut self) -> Result<Bytes, ParametersError> {
        self.load_limited(None).await
    }

    /// Load the whole body in memory, failing with `PayloadTooLarge` as soon
    /// as more than `limit` bytes were received.
    pub async fn load_limited(&mut self, limit: Option<usize>) -> Result<Bytes, ParametersError> {
        let inner = self.inner.take().ok_or(ParametersError::BodyAlreadyTaken)?;
        let bytes = inner.load(limit).await?;
        self.inner = Some(BodyInner::Memory(bytes.clone()));
        Ok(bytes)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body {
            inner: Some(BodyInner::Memory(b)),
        }
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::from(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::from(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::from(Bytes::from(v))
    }
}
