use crate::cli::Args;
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "BaseUrl", default = "default_base_url")]
    pub base_url: String,

    #[serde(rename = "RefreshInterval")]
    pub refresh_interval: u64,

    #[serde(rename = "BlockEndpoint", default)]
    pub block_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval: 5000,
            block_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".connwatch");
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)?;
                return Ok(toml::from_str(&content)?);
            }
        }

        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".connwatch");
            let content = toml::to_string_pretty(self)?;
            std::fs::write(config_path, content)?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self.refresh_interval = args.refresh_interval;
        if let Some(endpoint) = &args.block_endpoint {
            self.block_endpoint = Some(endpoint.clone());
        }
    }
}
