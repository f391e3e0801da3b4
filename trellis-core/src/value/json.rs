//! JSON bridge for building and snapshotting observed state.

use serde_json::Value as Json;

use super::{Record, Value};
use crate::error::ValueError;

impl Record {
    /// Build a record tree from a JSON document.
    ///
    /// Objects become object-shaped records; arrays become map-shaped
    /// records keyed `0..len`. The root must be an object or an array.
    pub fn from_json(json: Json) -> Result<Record, ValueError> {
        match Value::try_from(json)? {
            Value::Record(record) => Ok(record),
            other => Err(ValueError::NotAKeyedStructure(other.kind())),
        }
    }

    /// Snapshot the current entries as JSON.
    pub fn to_json(&self) -> Result<Json, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl TryFrom<Json> for Value {
    type Error = ValueError;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(ValueError::UnsupportedNumber(n.to_string()));
                }
            }
            Json::String(s) => Value::from(s),
            Json::Array(items) => {
                let record = Record::map();
                for (i, item) in (0_i64..).zip(items) {
                    record.insert(i, Value::try_from(item)?);
                }
                Value::Record(record)
            }
            Json::Object(fields) => {
                let record = Record::object();
                for (k, v) in fields {
                    record.insert(k, Value::try_from(v)?);
                }
                Value::Record(record)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Shape;
    use serde_json::json;

    #[test]
    fn from_json_builds_nested_records() {
        let root = Record::from_json(json!({
            "name": "ada",
            "age": 36,
            "tags": ["x", "y"],
            "address": { "city": "london" }
        }))
        .unwrap();

        assert_eq!(root.shape(), Shape::Object);
        assert_eq!(root.get("name"), Value::from("ada"));
        assert_eq!(root.get("age"), Value::Int(36));

        let tags = root.get("tags");
        let tags = tags.as_record().unwrap();
        assert_eq!(tags.shape(), Shape::Map);
        assert_eq!(tags.get(1), Value::from("y"));

        let address = root.get("address");
        assert_eq!(address.as_record().unwrap().get("city"), Value::from("london"));
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert_eq!(
            Record::from_json(json!(5)).unwrap_err(),
            ValueError::NotAKeyedStructure("int")
        );
    }

    #[test]
    fn snapshot_matches_source_document() {
        let doc = json!({ "a": 1, "b": { "c": [true, null, 2.5] } });
        let record = Record::from_json(doc.clone()).unwrap();
        assert_eq!(record.to_json().unwrap(), json!({ "a": 1, "b": { "c": { "0": true, "1": null, "2": 2.5 } } }));
    }
}
