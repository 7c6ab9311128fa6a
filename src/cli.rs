use crate::validation;
use clap::Parser;

#[derive(Parser, Default)]
#[command(name = "connwatch", about = "A live dashboard for backend-reported network connections")]
#[command(version, long_about = None)]
pub struct Args {
    /// Base URL of the monitoring backend (default: http://localhost:4000)
    pub url: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(short = 't', long = "interval", default_value = "5000")]
    pub refresh_interval: u64,

    /// Enforcement endpoint that receives block intents via POST
    #[arg(long = "block-endpoint")]
    pub block_endpoint: Option<String>,

    /// Log poll cycles and block intents to file ("-" for stdout)
    #[arg(short = 'f', long = "file")]
    pub log_file: Option<String>,

    /// Fetch one snapshot, print a text summary, and exit (bypass TUI)
    #[arg(long)]
    pub once: bool,
}

impl Args {
    /// Checks everything user-supplied before any of it is used.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(url) = &self.url {
            validation::validate_endpoint_url(url).map_err(|e| e.to_string())?;
        }

        validation::validate_refresh_interval(self.refresh_interval).map_err(|e| e.to_string())?;

        if let Some(endpoint) = &self.block_endpoint {
            validation::validate_endpoint_url(endpoint).map_err(|e| e.to_string())?;
        }

        if let Some(path) = &self.log_file {
            if path != "-" {
                validation::validate_file_path(path).map_err(|e| e.to_string())?;
            }
        }

        Ok(())
    }
}
