use crate::union::{Source, UnionKind};
use serde_json::{Map, Value};

/// Key/value mapping used for every parameters container
pub type Subject = Map<String, Value>;

/// Build the parameters subject of a request from its three containers.
///
/// Flat unions shallow-merge their sources left to right: a key present in
/// more than one source takes the value of the last one. `Separate` nests
/// each container, unmodified, under `params`, `query` and `body`. A missing
/// body is an empty mapping.
///
/// ```rust
/// # use parameters_middleware::prelude::*;
/// # use serde_json::json;
/// let params = json!({ "id": "18" }).as_object().cloned().unwrap();
/// let query = json!({ "extra": "123" }).as_object().cloned().unwrap();
///
/// let subject = merge(UnionKind::Join, &params, &query, None);
/// assert_eq!(serde_json::Value::Object(subject), json!({ "id": "18", "extra": "123" }));
/// ```
pub fn merge(union: UnionKind, params: &Subject, query: &Subject, body: Option<&Subject>) -> Subject {
    let empty = Subject::new();
    let body = body.unwrap_or(&empty);
    let container = |source: Source| match source {
        Source::Params => params,
        Source::Query => query,
        Source::Body => body,
    };

    let mut subject = Subject::new();
    match union.sources() {
        Some(sources) => {
            for source in sources {
                subject.extend(container(*source).iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        None => {
            for source in [Source::Params, Source::Query, Source::Body] {
                subject.insert(source.key().to_string(), Value::Object(container(source).clone()));
            }
        }
    }

    subject
}
