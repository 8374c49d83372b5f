use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::record::{json_type_name, Record, RecordKey, ID_FIELD};
use crate::store::RecordStore;

/// Single-item operations over one table.
///
/// Holds the store handle it was constructed with; the key is validated here
/// so malformed requests never reach the store.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn RecordStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch one record. An absent record is `NotFound`.
    pub async fn get_item(&self, id: &Value) -> Result<Record, ServiceError> {
        let key = RecordKey::from_value(id)?;
        match self.store.get(&key).await? {
            Some(record) => Ok(record),
            None => Err(ServiceError::NotFound(format!("item {key}"))),
        }
    }

    /// Overwrite the record at the item's key with the item itself.
    /// Returns the item as stored.
    pub async fn save_item(&self, item: Value) -> Result<Record, ServiceError> {
        let record = match item {
            Value::Object(map) => map,
            other => {
                return Err(ServiceError::Validation(format!(
                    "item must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };
        let key = RecordKey::of_record(&record)?;
        self.store.put(&key, record.clone()).await?;
        info!(id = %key, "item saved");
        Ok(record)
    }

    /// Set a single attribute. Returns the attributes written.
    pub async fn modify_item(
        &self,
        id: &Value,
        update_key: &str,
        update_value: Value,
    ) -> Result<Record, ServiceError> {
        let key = RecordKey::from_value(id)?;
        if update_key.trim().is_empty() {
            return Err(ServiceError::Validation("`updateKey` must not be empty".into()));
        }
        if update_key == ID_FIELD {
            return Err(ServiceError::Validation(
                "cannot update attribute `id`: it is the primary key".into(),
            ));
        }
        let updated = self.store.update_attribute(&key, update_key, update_value).await?;
        info!(id = %key, attribute = update_key, "item updated");
        Ok(updated)
    }

    /// Remove a record. Deleting an absent record succeeds with `None`.
    pub async fn delete_item(&self, id: &Value) -> Result<Option<Record>, ServiceError> {
        let key = RecordKey::from_value(id)?;
        let old = self.store.delete(&key).await?;
        if old.is_none() {
            debug!(id = %key, "delete of absent item");
        } else {
            info!(id = %key, "item deleted");
        }
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::record_store::JsonFileRecordStore;
    use serde_json::json;

    async fn setup() -> (ItemService, std::path::PathBuf) {
        let tmp = std::env::temp_dir().join(format!("item_service_{}.json", uuid::Uuid::new_v4()));
        let store = JsonFileRecordStore::open("test_table", &tmp).await.expect("store init");
        (ItemService::new(store), tmp)
    }

    #[tokio::test]
    async fn save_then_get_round_trips() -> Result<(), anyhow::Error> {
        let (svc, tmp) = setup().await;
        let saved = svc.save_item(json!({"id": "a", "v": 1})).await?;
        assert_eq!(Value::Object(saved), json!({"id": "a", "v": 1}));
        let got = svc.get_item(&json!("a")).await?;
        assert_eq!(Value::Object(got), json!({"id": "a", "v": 1}));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_overwrites_without_merge() -> Result<(), anyhow::Error> {
        let (svc, tmp) = setup().await;
        svc.save_item(json!({"id": "a", "v": 1, "old": true})).await?;
        svc.save_item(json!({"id": "a", "v": 2})).await?;
        let got = svc.get_item(&json!("a")).await?;
        assert_eq!(Value::Object(got), json!({"id": "a", "v": 2}));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn modify_changes_only_the_named_attribute() -> Result<(), anyhow::Error> {
        let (svc, tmp) = setup().await;
        svc.save_item(json!({"id": "a", "v": 1, "name": "foo"})).await?;
        let updated = svc.modify_item(&json!("a"), "v", json!(2)).await?;
        assert_eq!(Value::Object(updated), json!({"v": 2}));
        let got = svc.get_item(&json!("a")).await?;
        assert_eq!(Value::Object(got), json!({"id": "a", "v": 2, "name": "foo"}));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> Result<(), anyhow::Error> {
        let (svc, tmp) = setup().await;
        svc.save_item(json!({"id": "a"})).await?;
        let first = svc.delete_item(&json!("a")).await?;
        assert_eq!(first.map(Value::Object), Some(json!({"id": "a"})));
        assert!(svc.delete_item(&json!("a")).await?.is_none());
        assert!(svc.delete_item(&json!("a")).await?.is_none());
        assert!(matches!(svc.get_item(&json!("a")).await, Err(ServiceError::NotFound(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_save_is_not_visible() -> Result<(), anyhow::Error> {
        let (svc, tmp) = setup().await;
        svc.save_item(json!({"id": "kept", "v": 1})).await?;
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;

        assert!(matches!(svc.save_item(json!({"id": "ghost", "v": 1})).await, Err(ServiceError::Store(_))));
        assert!(matches!(svc.get_item(&json!("ghost")).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.modify_item(&json!("kept"), "v", json!(2)).await, Err(ServiceError::Store(_))));
        assert!(matches!(svc.delete_item(&json!("kept")).await, Err(ServiceError::Store(_))));
        let kept = svc.get_item(&json!("kept")).await?;
        assert_eq!(Value::Object(kept), json!({"id": "kept", "v": 1}));

        let _ = tokio::fs::remove_dir(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn validation_happens_before_the_store() {
        let (svc, tmp) = setup().await;
        assert!(matches!(svc.save_item(json!({"name": "no id"})).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.save_item(json!([1, 2])).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.get_item(&Value::Null).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.modify_item(&json!("a"), "id", json!("b")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.modify_item(&json!("a"), " ", json!(1)).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.delete_item(&json!({"x": 1})).await, Err(ServiceError::Validation(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
    }
}
