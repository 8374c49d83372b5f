use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;
use crate::record::{Record, RecordKey};

/// The four single-item operations the handler needs from a table.
/// Implementations can be file-backed, in-memory, or a remote managed store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record by primary key.
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, ServiceError>;

    /// Upsert: create the record or overwrite it entirely. No merge.
    async fn put(&self, key: &RecordKey, record: Record) -> Result<(), ServiceError>;

    /// Set one attribute, creating the record when absent.
    /// Returns only the attributes written by this call.
    async fn update_attribute(
        &self,
        key: &RecordKey,
        attribute: &str,
        value: Value,
    ) -> Result<Record, ServiceError>;

    /// Remove a record, returning its previous content if it existed.
    async fn delete(&self, key: &RecordKey) -> Result<Option<Record>, ServiceError>;
}
