use std::fmt;

use serde_json::Value;

use crate::errors::ServiceError;

/// Name of the primary-key attribute every record carries.
pub const ID_FIELD: &str = "id";

/// A schemaless record: any JSON object, stored verbatim.
pub type Record = serde_json::Map<String, Value>;

/// Primary key of a record.
///
/// Keys may arrive as JSON strings or numbers. The canonical text form is
/// what the table is keyed by, so `"7"` and `7` address the same record; the
/// original value is kept so a record created through an update carries the
/// id in the shape the caller sent.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordKey {
    text: String,
    value: Value,
}

impl RecordKey {
    pub fn from_value(value: &Value) -> Result<Self, ServiceError> {
        let text = match value {
            Value::String(s) if s.is_empty() => {
                return Err(ServiceError::Validation("`id` must not be empty".into()))
            }
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Null => return Err(ServiceError::Validation("missing primary key `id`".into())),
            other => {
                return Err(ServiceError::Validation(format!(
                    "`id` must be a string or number, got {}",
                    json_type_name(other)
                )))
            }
        };
        Ok(Self { text, value: value.clone() })
    }

    /// Key of a full record; fails when `id` is absent or malformed.
    pub fn of_record(record: &Record) -> Result<Self, ServiceError> {
        match record.get(ID_FIELD) {
            Some(v) => Self::from_value(v),
            None => Err(ServiceError::Validation("missing primary key `id`".into())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub(crate) fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_and_number_keys_share_text_form() {
        let s = RecordKey::from_value(&json!("7")).unwrap();
        let n = RecordKey::from_value(&json!(7)).unwrap();
        assert_eq!(s.as_str(), n.as_str());
        assert_eq!(n.value(), &json!(7));
        assert_eq!(n.to_string(), "7");
    }

    #[test]
    fn rejects_unusable_keys() {
        for bad in [json!(""), json!(null), json!(true), json!([1]), json!({"a": 1})] {
            assert!(matches!(RecordKey::from_value(&bad), Err(ServiceError::Validation(_))), "{bad}");
        }
    }

    #[test]
    fn of_record_requires_id() {
        let rec = json!({"name": "foo"}).as_object().cloned().unwrap();
        assert!(matches!(RecordKey::of_record(&rec), Err(ServiceError::Validation(_))));

        let rec = json!({"id": "x", "name": "foo"}).as_object().cloned().unwrap();
        assert_eq!(RecordKey::of_record(&rec).unwrap().as_str(), "x");
    }
}
