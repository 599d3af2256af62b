use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ledger: LedgerSection,
    pub import: ImportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    pub base_url: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSection {
    /// Account used as the source side when a row identifies none.
    pub default_account_id: Option<u64>,
    pub default_currency: String,
    /// Rows resolved concurrently; 1 = sequential.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger: LedgerSection {
                base_url: "http://localhost:8080".to_string(),
                access_token: String::new(),
            },
            import: ImportSection {
                default_account_id: None,
                default_currency: "EUR".to_string(),
                concurrency: 1,
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
