use crate::error::ParametersError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Container a request parameter can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Captures of the matched route path
    Params,
    /// Parsed query string
    Query,
    /// Parsed request body
    Body,
}

impl Source {
    /// Key under which the source is stored by the `separate` union
    pub fn key(&self) -> &'static str {
        match self {
            Source::Params => "params",
            Source::Query => "query",
            Source::Body => "body",
        }
    }
}

/// Selects which request containers end up in the parameters subject and
/// how they are combined.
///
/// Every union except [`UnionKind::Separate`] flattens its sources into a
/// single mapping, later sources overriding earlier ones.
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// let union: UnionKind = "body-params".parse().unwrap();
/// assert_eq!(union, UnionKind::BodyParams);
/// assert_eq!(UnionKind::default(), UnionKind::Body);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnionKind {
    /// params, query, body
    Join,
    /// `{ params, query, body }` without flattening
    Separate,
    /// body only
    #[default]
    Body,
    /// params, body
    BodyParams,
    /// query, body
    BodyQuery,
    /// query only
    Query,
    /// params, query
    QueryParams,
    /// params only
    Params,
}

impl UnionKind {
    pub const ALL: [UnionKind; 8] = [
        UnionKind::Join,
        UnionKind::Separate,
        UnionKind::Body,
        UnionKind::BodyParams,
        UnionKind::BodyQuery,
        UnionKind::Query,
        UnionKind::QueryParams,
        UnionKind::Params,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnionKind::Join => "join",
            UnionKind::Separate => "separate",
            UnionKind::Body => "body",
            UnionKind::BodyParams => "body-params",
            UnionKind::BodyQuery => "body-query",
            UnionKind::Query => "query",
            UnionKind::QueryParams => "query-params",
            UnionKind::Params => "params",
        }
    }

    /// Sources flattened by this union, in override order (last one wins).
    /// Returns `None` for `Separate`, which does not flatten.
    pub fn sources(&self) -> Option<&'static [Source]> {
        match self {
            UnionKind::Join => Some(&[Source::Params, Source::Query, Source::Body]),
            UnionKind::Separate => None,
            UnionKind::Body => Some(&[Source::Body]),
            UnionKind::BodyParams => Some(&[Source::Params, Source::Body]),
            UnionKind::BodyQuery => Some(&[Source::Query, Source::Body]),
            UnionKind::Query => Some(&[Source::Query]),
            UnionKind::QueryParams => Some(&[Source::Params, Source::Query]),
            UnionKind::Params => Some(&[Source::Params]),
        }
    }
}

impl Display for UnionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnionKind {
    type Err = ParametersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnionKind::ALL
            .iter()
            .find(|u| u.as_str() == s)
            .copied()
            .ok_or_else(|| ParametersError::UnknownUnion(s.to_string()))
    }
}
