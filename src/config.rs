use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Max event rows fetched per period; the only bound on aggregation memory.
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
}

fn default_row_limit() -> u32 {
    20_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Length of every top-N list in the overview.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Recent errors included in the overview.
    #[serde(default = "default_recent_errors_limit")]
    pub recent_errors_limit: u32,
}

fn default_top_n() -> usize {
    10
}

fn default_recent_errors_limit() -> u32 {
    20
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            recent_errors_limit: default_recent_errors_limit(),
        }
    }
}

/// Separate CORS policies for the SDK ingestion endpoint and the dashboard API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub collect: CorsPolicy,
    #[serde(default)]
    pub dashboard: CorsPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsPolicy {
    /// Exact origins, or `"*"` (or an empty list) for any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: false,
        }
    }
}

impl CorsPolicy {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.row_limit > 0,
            "database.row_limit must be > 0, got {}",
            self.database.row_limit
        );
        anyhow::ensure!(
            self.dashboard.top_n > 0,
            "dashboard.top_n must be > 0, got {}",
            self.dashboard.top_n
        );
        anyhow::ensure!(
            self.dashboard.recent_errors_limit > 0,
            "dashboard.recent_errors_limit must be > 0, got {}",
            self.dashboard.recent_errors_limit
        );
        Ok(())
    }
}
