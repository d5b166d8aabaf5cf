use crate::merge::Subject;
use serde_json::Value;

/// Collect urlencoded pairs into a subject. A key seen once maps to a string,
/// a repeated key maps to an array of its values in order of appearance.
pub(crate) fn collect_pairs<I>(pairs: I) -> Subject
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut subject = Subject::new();
    for (key, value) in pairs {
        match subject.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                subject.insert(key, Value::String(value));
            }
        }
    }

    subject
}

/// Parse a query string (without the leading `?`). A query string that
/// cannot be decoded yields an empty subject.
pub(crate) fn parse_query(query: &str) -> Subject {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => collect_pairs(pairs),
        Err(e) => {
            debug!("Ignoring undecodable query string `{}`: {}", query, e);
            Subject::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_values_are_strings() {
        assert_eq!(Value::Object(parse_query("extra=123&name=john")), json!({ "extra": "123", "name": "john" }));
    }

    #[test]
    fn repeated_keys_become_arrays() {
        assert_eq!(
            Value::Object(parse_query("tag=a&id=1&tag=b&tag=c")),
            json!({ "tag": ["a", "b", "c"], "id": "1" })
        );
    }

    #[test]
    fn decodes_percent_and_plus() {
        assert_eq!(Value::Object(parse_query("name=John%20Doe&q=a+b")), json!({ "name": "John Doe", "q": "a b" }));
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn key_without_value_is_empty_string() {
        assert_eq!(Value::Object(parse_query("flag")), json!({ "flag": "" }));
    }
}
