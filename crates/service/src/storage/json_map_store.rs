use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file and provides simple CRUD helpers.
/// Every mutation is applied to a copy of the map and rewrites the whole file
/// while the write lock is held; the copy becomes live only once the file has
/// been replaced, so memory and disk agree after both success and failure.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    /// An existing file that does not parse is an error rather than silently emptied.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Store(format!("corrupt store file {}: {e}", file_path.display()))
            })?,
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::store)?)
                    .await
                    .map_err(ServiceError::store)?;
                empty
            }
        };
        debug!(path = %file_path.display(), entries = map.len(), "json map store loaded");

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    /// Write `map` to a sibling temp file and rename it over the table file,
    /// so a crash mid-write never leaves a truncated table behind.
    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(ServiceError::store)?;
        let mut tmp_name = self.file_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, data).await.map_err(ServiceError::store)?;
        if let Err(e) = fs::rename(&tmp_path, &self.file_path).await {
            fs::remove_file(&tmp_path).await.ok();
            return Err(ServiceError::store(e));
        }
        Ok(())
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or overwrite a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.update_map(|m| {
            m.insert(key, value);
            Ok(())
        })
        .await
    }

    /// Remove a key and persist; returns the previous value if any.
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        let mut map = self.inner.write().await;
        if !map.contains_key(key) {
            return Ok(None);
        }
        let mut next = map.clone();
        let old = next.remove(key);
        self.persist(&next).await?;
        *map = next;
        Ok(old)
    }

    /// Apply a mutation to a copy of the map, persist the copy, and only then
    /// make it live. When the closure or the write fails the live map is
    /// left untouched.
    pub async fn update_map<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *map = next;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonMapStore::<String, String>::new(&tmp).await?;

        // initially empty
        assert_eq!(store.len().await, 0);

        store.insert("a".into(), "1".into()).await?;
        store.insert("b".into(), "2".into()).await?;
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));

        let prev = store
            .update_map(|m| {
                let v = m.get_mut("a").ok_or_else(|| ServiceError::not_found("a"))?;
                Ok(std::mem::replace(v, "10".into()))
            })
            .await?;
        assert_eq!(prev, "1");
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("10"));

        // remove returns the old value, then reload from disk
        assert_eq!(store.remove(&"b".into()).await?.as_deref(), Some("2"));
        assert_eq!(store.remove(&"b".into()).await?, None);
        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.len().await, 1);
        assert_eq!(reloaded.get(&"a".into()).await.as_deref(), Some("10"));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_update_is_not_persisted() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonMapStore::<String, u32>::new(&tmp).await?;
        store.insert("k".into(), 1).await?;

        let res = store
            .update_map(|m| {
                m.insert("k".into(), 2);
                Err::<(), _>(ServiceError::not_found("missing"))
            })
            .await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        assert_eq!(store.get(&"k".into()).await, Some(1));

        let reloaded = JsonMapStore::<String, u32>::new(&tmp).await?;
        assert_eq!(reloaded.get(&"k".into()).await, Some(1));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_live_map_unchanged() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonMapStore::<String, u32>::new(&tmp).await?;
        store.insert("k".into(), 1).await?;

        // a directory in place of the table file makes every rename fail
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;

        assert!(matches!(store.insert("ghost".into(), 9).await, Err(ServiceError::Store(_))));
        assert_eq!(store.get(&"ghost".into()).await, None);

        let res = store.update_map(|m| Ok(m.insert("k".into(), 2))).await;
        assert!(matches!(res, Err(ServiceError::Store(_))));
        assert_eq!(store.get(&"k".into()).await, Some(1));

        assert!(matches!(store.remove(&"k".into()).await, Err(ServiceError::Store(_))));
        assert_eq!(store.get(&"k".into()).await, Some(1));
        assert_eq!(store.len().await, 1);

        let mut tmp_name = tmp.as_os_str().to_owned();
        tmp_name.push(".tmp");
        assert!(!PathBuf::from(tmp_name).exists());

        let _ = tokio::fs::remove_dir(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn persist_leaves_no_temp_file() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = JsonMapStore::<String, u32>::new(&tmp).await?;
        store.insert("k".into(), 1).await?;

        let mut tmp_name = tmp.as_os_str().to_owned();
        tmp_name.push(".tmp");
        assert!(!PathBuf::from(tmp_name).exists());
        let on_disk: HashMap<String, u32> = serde_json::from_slice(&tokio::fs::read(&tmp).await?)?;
        assert_eq!(on_disk.get("k"), Some(&1));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        tokio::fs::write(&tmp, b"{not json").await?;
        let res = JsonMapStore::<String, String>::new(&tmp).await;
        assert!(matches!(res, Err(ServiceError::Store(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
