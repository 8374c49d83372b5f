use axum::http::Method;
use serde_json::{Map, Value};
use service::{ItemService, ServiceError};
use tracing::{debug, warn};

use crate::event::{Envelope, HttpEvent, Operation};

/// Greeting returned by the health route.
pub const HEALTH_GREETING: &str = "Hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Health,
    GetItem,
    SaveItem,
    ModifyItem,
    DeleteItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub action: RouteAction,
}

impl Route {
    fn new(method: Method, path: &str, action: RouteAction) -> Self {
        Self { method, path: path.to_string(), action }
    }
}

/// Ordered route table over one table's items. First match wins; anything
/// unmatched gets a 404 envelope.
pub struct Dispatcher {
    routes: Vec<Route>,
    items: ItemService,
}

impl Dispatcher {
    pub fn new(items: ItemService, health_path: &str, item_path: &str) -> Self {
        let routes = vec![
            Route::new(Method::GET, health_path, RouteAction::Health),
            Route::new(Method::GET, item_path, RouteAction::GetItem),
            Route::new(Method::POST, item_path, RouteAction::SaveItem),
            Route::new(Method::PATCH, item_path, RouteAction::ModifyItem),
            Route::new(Method::DELETE, item_path, RouteAction::DeleteItem),
        ];
        Self { routes, items }
    }

    pub fn from_config(items: ItemService, cfg: &configs::RoutesConfig) -> Self {
        Self::new(items, &cfg.health_path, &cfg.item_path)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Method names are matched case-insensitively; paths exactly.
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteAction> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).ok()?;
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
            .map(|r| r.action)
    }

    pub async fn handle(&self, event: &HttpEvent) -> Envelope {
        let Some(action) = self.resolve(&event.http_method, &event.path) else {
            debug!(method = %event.http_method, path = %event.path, "no route matched");
            return Envelope::route_not_found(&event.http_method, &event.path);
        };
        debug!(method = %event.http_method, path = %event.path, ?action, "route matched");

        match action {
            RouteAction::Health => Envelope::json(200, &Value::String(HEALTH_GREETING.into())),
            RouteAction::GetItem => self.get_item(event).await,
            RouteAction::SaveItem => self.save_item(event).await,
            RouteAction::ModifyItem => self.modify_item(event).await,
            RouteAction::DeleteItem => self.delete_item(event).await,
        }
    }

    async fn get_item(&self, event: &HttpEvent) -> Envelope {
        let result = match event.query_param("id") {
            Some(id) => self.items.get_item(&Value::String(id.to_string())).await,
            None => Err(ServiceError::Validation("missing query parameter `id`".into())),
        };
        match result {
            Ok(record) => Envelope::json(200, &Value::Object(record)),
            Err(e) => failed(Operation::Get, &e),
        }
    }

    async fn save_item(&self, event: &HttpEvent) -> Envelope {
        let result = match parse_body(event) {
            Ok(body) => {
                debug!(body = %body, "save request body");
                self.items.save_item(body).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(item) => Envelope::success(Operation::Save, Value::Object(item)),
            Err(e) => failed(Operation::Save, &e),
        }
    }

    async fn modify_item(&self, event: &HttpEvent) -> Envelope {
        let result = match parse_body_object(event).and_then(modify_args) {
            Ok((id, key, value)) => self.items.modify_item(&id, &key, value).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(updated) => Envelope::success(Operation::Update, Value::Object(updated)),
            Err(e) => failed(Operation::Update, &e),
        }
    }

    async fn delete_item(&self, event: &HttpEvent) -> Envelope {
        let result = match parse_body_object(event) {
            Ok(body) => {
                let id = body.get("id").cloned().unwrap_or(Value::Null);
                self.items.delete_item(&id).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(old) => Envelope::success(Operation::Delete, old.map(Value::Object).unwrap_or(Value::Null)),
            Err(e) => failed(Operation::Delete, &e),
        }
    }
}

fn failed(op: Operation, err: &ServiceError) -> Envelope {
    match err {
        ServiceError::Store(_) => warn!(operation = op.as_str(), error = %err, "store operation failed"),
        _ => debug!(operation = op.as_str(), error = %err, "request rejected"),
    }
    Envelope::from_error(op, err)
}

fn parse_body(event: &HttpEvent) -> Result<Value, ServiceError> {
    match event.body.as_deref().map(str::trim) {
        None | Some("") => Err(ServiceError::Validation("request body is required".into())),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| ServiceError::Validation(format!("invalid JSON body: {e}"))),
    }
}

fn parse_body_object(event: &HttpEvent) -> Result<Map<String, Value>, ServiceError> {
    match parse_body(event)? {
        Value::Object(map) => Ok(map),
        _ => Err(ServiceError::Validation("request body must be a JSON object".into())),
    }
}

/// `{id, updateKey, updateValue}`; `updateValue` may be null but must be present.
fn modify_args(mut body: Map<String, Value>) -> Result<(Value, String, Value), ServiceError> {
    let id = body.remove("id").unwrap_or(Value::Null);
    let key = match body.remove("updateKey") {
        Some(Value::String(k)) => k,
        Some(_) => return Err(ServiceError::Validation("`updateKey` must be a string".into())),
        None => return Err(ServiceError::Validation("missing `updateKey`".into())),
    };
    let value = body
        .remove("updateValue")
        .ok_or_else(|| ServiceError::Validation("missing `updateValue`".into()))?;
    Ok((id, key, value))
}
