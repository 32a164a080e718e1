//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::DomainError;

/// What to do with the annotations of each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Post,
    Update,
    Delete,
}

impl Action {
    /// Lowercase name, as used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Post => "post",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Post and update write a value; delete does not.
    pub fn requires_value(&self) -> bool {
        matches!(self, Action::Post | Action::Update)
    }

    /// Update and delete act on annotations that already exist.
    pub fn requires_existing(&self) -> bool {
        matches!(self, Action::Update | Action::Delete)
    }
}

impl FromStr for Action {
    type Err = DomainError;

    /// Case-insensitive: `post`, `Post` and `POST` all parse to [`Action::Post`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Action::Post, Action::Update, Action::Delete]
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source to act on, with the value to write (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub obj_id: String,
    pub value: Option<Value>,
}

impl Target {
    pub fn new(obj_id: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            obj_id: obj_id.into(),
            value,
        }
    }
}

/// An annotation record as returned by the catalog service.
///
/// The service owns these; the tool only reads them to find ids to
/// update or delete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Annotation {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub origin: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub obj_id: Option<String>,
}

impl Annotation {
    /// Value stored under `key`, if this annotation carries it.
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Accept integer or string ids; hold them as strings.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "annotation id must be a string or number, got {other}"
        ))),
    }
}

/// The `(origin, key)` pair that update and delete act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSelector {
    pub origin: String,
    pub key: String,
}

impl AnnotationSelector {
    pub fn new(origin: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            key: key.into(),
        }
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        annotation.origin == self.origin && annotation.data.contains_key(&self.key)
    }

    /// All matching annotations, in service order. Duplicates are kept.
    pub fn filter<'a>(&self, annotations: &'a [Annotation]) -> Vec<&'a Annotation> {
        annotations.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Body of `POST /api/sources/{obj_id}/annotations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnnotation {
    pub origin: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
}

impl NewAnnotation {
    pub fn new(origin: &str, key: &str, value: Value, group_ids: Option<Vec<i64>>) -> Self {
        Self {
            origin: origin.to_string(),
            data: single_entry(key, value),
            group_ids,
        }
    }
}

/// Body of `PUT /api/sources/{obj_id}/annotations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationUpdate {
    pub data: Map<String, Value>,
    pub origin: String,
    pub obj_id: String,
}

impl AnnotationUpdate {
    pub fn new(origin: &str, key: &str, value: Value, obj_id: &str) -> Self {
        Self {
            data: single_entry(key, value),
            origin: origin.to_string(),
            obj_id: obj_id.to_string(),
        }
    }
}

fn single_entry(key: &str, value: Value) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert(key.to_string(), value);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(id: &str, origin: &str, data: Value) -> Annotation {
        serde_json::from_value(json!({ "id": id, "origin": origin, "data": data }))
            .expect("valid annotation")
    }

    #[test]
    fn given_mixed_case_action_when_parsing_then_normalizes() {
        assert_eq!("Update".parse::<Action>().unwrap(), Action::Update);
        assert_eq!("DELETE".parse::<Action>().unwrap(), Action::Delete);
        assert_eq!(" post ".parse::<Action>().unwrap(), Action::Post);
    }

    #[test]
    fn given_unknown_action_when_parsing_then_errors() {
        let err = "archive".parse::<Action>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownAction(ref s) if s == "archive"));
    }

    #[test]
    fn given_numeric_id_when_deserializing_then_holds_string() {
        let a: Annotation =
            serde_json::from_value(json!({ "id": 42, "origin": "o", "data": {} })).unwrap();
        assert_eq!(a.id, "42");
    }

    #[test]
    fn given_selector_when_filtering_then_requires_origin_and_key() {
        let annotations = vec![
            annotation("1", "tool", json!({ "score": 0.1 })),
            annotation("2", "other", json!({ "score": 0.2 })),
            annotation("3", "tool", json!({ "period": 1.5 })),
            annotation("4", "tool", json!({ "score": 0.4 })),
        ];
        let selector = AnnotationSelector::new("tool", "score");

        let ids: Vec<_> = selector
            .filter(&annotations)
            .iter()
            .map(|a| a.id.as_str())
            .collect();

        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn given_new_annotation_when_serializing_then_keeps_field_order() {
        let body = NewAnnotation::new("tool", "score", json!(0.9), Some(vec![1]));
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"origin":"tool","data":{"score":0.9},"group_ids":[1]}"#
        );
    }

    #[test]
    fn given_no_groups_when_serializing_then_omits_group_ids() {
        let body = NewAnnotation::new("tool", "score", json!(1), None);
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"origin":"tool","data":{"score":1}}"#
        );
    }
}
