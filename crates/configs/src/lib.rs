use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Path accepting raw gateway events and answering with the envelope itself.
    #[serde(default = "default_invoke_path")]
    pub invoke_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            invoke_path: default_invoke_path(),
        }
    }
}

/// The single table the handler serves.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { table_name: default_table_name(), data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_item_path")]
    pub item_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self { health_path: default_health_path(), item_path: default_item_path() }
    }
}

fn default_invoke_path() -> String { "/invocations".into() }
fn default_table_name() -> String { "test_table".into() }
fn default_data_dir() -> String { "data".into() }
fn default_health_path() -> String { "/test".into() }
fn default_item_path() -> String { "/test-test".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Build a config from defaults overridden by `SERVER_HOST`, `SERVER_PORT`,
    /// `STORE_TABLE` and `STORE_DATA_DIR`. Used when no config file exists.
    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Ok(table) = std::env::var("STORE_TABLE") {
            cfg.store.table_name = table;
        }
        if let Ok(dir) = std::env::var("STORE_DATA_DIR") {
            cfg.store.data_dir = dir;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.normalize()?;
        self.routes.validate()?;
        if self.server.invoke_path == self.routes.item_path
            || self.server.invoke_path == self.routes.health_path
        {
            return Err(anyhow!("server.invoke_path must differ from the routed paths"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        if !self.invoke_path.starts_with('/') {
            return Err(anyhow!("server.invoke_path must start with '/'"));
        }
        Ok(())
    }
}

impl StoreConfig {
    fn normalize(&mut self) -> Result<()> {
        self.table_name = self.table_name.trim().to_string();
        if self.table_name.is_empty() {
            return Err(anyhow!("store.table_name is empty"));
        }
        if self.table_name.contains(['/', '\\']) {
            return Err(anyhow!("store.table_name must not contain path separators"));
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        Ok(())
    }

    /// File backing the table: `<data_dir>/<table_name>.json`.
    pub fn table_file(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(format!("{}.json", self.table_name))
    }
}

impl RoutesConfig {
    fn validate(&self) -> Result<()> {
        for (name, path) in [("routes.health_path", &self.health_path), ("routes.item_path", &self.item_path)] {
            if !path.starts_with('/') {
                return Err(anyhow!("{name} must start with '/'"));
            }
        }
        if self.health_path == self.item_path {
            return Err(anyhow!("routes.health_path and routes.item_path must differ"));
        }
        Ok(())
    }
}
