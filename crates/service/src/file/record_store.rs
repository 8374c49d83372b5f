use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::ServiceError;
use crate::record::{Record, RecordKey, ID_FIELD};
use crate::storage::json_map_store::JsonMapStore;
use crate::store::RecordStore;

/// One table persisted as a JSON object of `id -> record`.
#[derive(Clone)]
pub struct JsonFileRecordStore {
    table: String,
    store: Arc<JsonMapStore<String, Record>>,
}

impl JsonFileRecordStore {
    /// Open the table file, creating it empty if missing.
    pub async fn open<P: Into<PathBuf>>(table: &str, path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, Record>::new(path).await?;
        Ok(Arc::new(Self { table: table.to_string(), store }))
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, ServiceError> {
        Ok(self.store.get(&key.as_str().to_string()).await)
    }

    async fn put(&self, key: &RecordKey, record: Record) -> Result<(), ServiceError> {
        debug!(table = %self.table, id = %key, "put record");
        self.store.insert(key.as_str().to_string(), record).await
    }

    async fn update_attribute(
        &self,
        key: &RecordKey,
        attribute: &str,
        value: Value,
    ) -> Result<Record, ServiceError> {
        debug!(table = %self.table, id = %key, attribute, "update attribute");
        self.store
            .update_map(|map| {
                let record = map.entry(key.as_str().to_string()).or_insert_with(|| {
                    let mut fresh = Record::new();
                    fresh.insert(ID_FIELD.to_string(), key.value().clone());
                    fresh
                });
                record.insert(attribute.to_string(), value.clone());

                let mut updated = Record::new();
                updated.insert(attribute.to_string(), value);
                Ok(updated)
            })
            .await
    }

    async fn delete(&self, key: &RecordKey) -> Result<Option<Record>, ServiceError> {
        debug!(table = %self.table, id = %key, "delete record");
        self.store.remove(&key.as_str().to_string()).await
    }
}
