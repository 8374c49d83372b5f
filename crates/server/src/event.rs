//! Gateway-facing request and response shapes.
//!
//! `HttpEvent` is the proxy event the routing layer hands over; `Envelope` is
//! what goes back. The envelope body is always a JSON document encoded as a
//! string, on success and failure alike.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use service::ServiceError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "Application/Json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl HttpEvent {
    pub fn new(method: &str, path: &str) -> Self {
        Self { http_method: method.to_string(), path: path.to_string(), ..Default::default() }
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.as_ref()?.get(name).map(String::as_str)
    }
}

/// The operation a store-backed route performs, as reported in result bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Save,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Save => "SAVE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Envelope {
    /// Wrap a JSON payload; the payload is serialised into `body`.
    pub fn json(status_code: u16, payload: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string());
        Self { status_code, headers, body: payload.to_string() }
    }

    /// `{Operation, Message: SUCCESS, Item}` with status 200.
    pub fn success(op: Operation, item: Value) -> Self {
        Self::json(200, &json!({ "Operation": op.as_str(), "Message": "SUCCESS", "Item": item }))
    }

    /// `{Operation, Message: FAILED, Error}`; only the error's text goes out.
    pub fn failure(op: Option<Operation>, status_code: u16, error: &str) -> Self {
        Self::json(
            status_code,
            &json!({ "Operation": op.map(Operation::as_str), "Message": "FAILED", "Error": error }),
        )
    }

    pub fn from_error(op: Operation, err: &ServiceError) -> Self {
        Self::failure(Some(op), status_for(err), &err.to_string())
    }

    pub fn route_not_found(method: &str, path: &str) -> Self {
        Self::failure(None, 404, &format!("route not found: {method} {path}"))
    }

    /// Decode `body` back into JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Missing items are 404; every other failure, including the store's, is 400.
pub fn status_for(err: &ServiceError) -> u16 {
    match err {
        ServiceError::NotFound(_) => 404,
        ServiceError::Validation(_) | ServiceError::Store(_) => 400,
    }
}
