use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Scraping
    pub base_url: String,
    pub num_workers: usize,

    // Write phase
    pub neo4j_batch_size: usize,

    // Progress reporting
    pub progress_interval: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing, before any
    /// network activity has started.
    pub fn from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            base_url: env::var("OEIS_BASE_URL").unwrap_or_else(|_| "https://oeis.org".to_string()),
            num_workers: parsed_env("SCRAPE_WORKERS", 10),
            neo4j_batch_size: parsed_env("NEO4J_BATCH_SIZE", 1000),
            progress_interval: parsed_env("PROGRESS_INTERVAL", 50),
        }
    }

    /// Log the effective configuration without credentials.
    pub fn log_redacted(&self) {
        info!(
            neo4j_uri = self.neo4j_uri.as_str(),
            neo4j_user = self.neo4j_user.as_str(),
            base_url = self.base_url.as_str(),
            num_workers = self.num_workers,
            neo4j_batch_size = self.neo4j_batch_size,
            progress_interval = self.progress_interval,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got {raw:?}")),
        Err(_) => default,
    }
}
