use crate::{error::ParametersError, merge::Subject};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Origin tag of parameters built from an http request
pub const REQUEST_ORIGIN: &str = "request";

/// Parameters of a request, unified from its path captures, query string and
/// body according to a [`UnionKind`](crate::union::UnionKind).
///
/// A fresh instance is stored on every request going through the
/// [`ParametersMiddleware`](crate::inject::ParametersMiddleware).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    subject: Subject,
    origin: &'static str,
}

impl Parameters {
    pub fn new(subject: Subject, origin: &'static str) -> Self {
        Parameters { subject, origin }
    }

    /// The unified key/value mapping
    #[inline]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Where the subject was built from, [`REQUEST_ORIGIN`] for parameters
    /// injected by the middleware
    #[inline]
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.subject.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.subject.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
    }

    /// Deserialize a single parameter.
    ///
    /// Path and query values are strings, so numeric parameters coming from
    /// them are read as `String` first and then parsed by the caller, or
    /// read directly when they come from a json body.
    ///
    /// ```rust
    /// # use parameters_middleware::prelude::*;
    /// # use serde_json::json;
    /// let subject = json!({ "id": "18", "part": 1 }).as_object().cloned().unwrap();
    /// let params = Parameters::new(subject, "request");
    ///
    /// assert_eq!(params.get_as::<String>("id").unwrap(), "18");
    /// assert_eq!(params.get_as::<u32>("part").unwrap(), 1);
    /// assert!(params.get_as::<u32>("missing").is_err());
    /// ```
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ParametersError> {
        let value = self.subject.get(key).ok_or_else(|| ParametersError::MissingParameter(key.to_string()))?;
        T::deserialize(value).map_err(|e| ParametersError::InvalidParameter(key.to_string(), e.to_string()))
    }

    /// Deserialize the whole subject into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ParametersError> {
        T::deserialize(Value::Object(self.subject.clone())).map_err(ParametersError::from)
    }

    pub fn into_subject(self) -> Subject {
        self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_derive::Deserialize;
    use serde_json::json;

    fn parameters(v: Value) -> Parameters {
        Parameters::new(v.as_object().cloned().unwrap(), REQUEST_ORIGIN)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
        part: u32,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn exposes_subject_and_origin() {
        let p = parameters(json!({ "id": "18" }));
        assert_eq!(p.origin(), "request");
        assert_eq!(p.get("id"), Some(&json!("18")));
        assert!(p.contains_key("id"));
        assert!(!p.contains_key("extra"));
        assert!(!p.is_empty());
    }

    #[test]
    fn get_as_reports_missing_and_invalid() {
        let p = parameters(json!({ "id": "18" }));
        match p.get_as::<String>("extra") {
            Err(ParametersError::MissingParameter(name)) => assert_eq!(name, "extra"),
            other => panic!("expected MissingParameter, got {:?}", other),
        }
        match p.get_as::<u64>("id") {
            Err(ParametersError::InvalidParameter(name, _)) => assert_eq!(name, "id"),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn deserializes_whole_subject() {
        let p = parameters(json!({ "id": "18", "part": 1, "tags": ["a", "b"] }));
        let item: Item = p.deserialize().unwrap();
        assert_eq!(
            item,
            Item {
                id: "18".to_string(),
                part: 1,
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );

        let missing = parameters(json!({ "id": "18" }));
        assert!(missing.deserialize::<Item>().is_err());
    }
}
