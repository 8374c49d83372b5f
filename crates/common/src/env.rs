//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::info;

/// Ensure the store data directory exists, creating it if needed.
pub async fn ensure_env(data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(data_dir).await.is_err() {
        info!(%data_dir, "data directory missing; creating it");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_nested_dir() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("record_env_{}", uuid::Uuid::new_v4()));
        let nested = root.join("a").join("b");
        let nested_str = nested.to_string_lossy().to_string();

        ensure_env(&nested_str).await?;
        assert!(tokio::fs::metadata(&nested).await?.is_dir());

        // second call is a no-op
        ensure_env(&nested_str).await?;

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
