//! Block-intent dispatch.
//!
//! Blocking is enforced by an external collaborator (a privileged agent
//! or firewall endpoint); the dashboard only emits an intent carrying the
//! process identifier. There is no confirmation channel, so the UI never
//! mutates its own state on dispatch and never claims success. The
//! outcome of the transport attempt goes to the cycle log only.

use crate::error::{ConnwatchError, Result};
use std::time::Duration;

pub trait BlockSink {
    /// Emits one block intent for `pid`. Fire-and-forget from the
    /// dashboard's perspective; errors are logged, not surfaced.
    fn request_block(&mut self, pid: &str) -> Result<()>;

    /// Where intents go, for the status line and the log.
    fn describe(&self) -> String;
}

/// POSTs intents to an enforcement endpoint as a small JSON document.
pub struct HttpBlockSink {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpBlockSink {
    pub fn new(endpoint: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

impl BlockSink for HttpBlockSink {
    fn request_block(&mut self, pid: &str) -> Result<()> {
        let body = serde_json::json!({ "PID": pid }).to_string();
        self.agent
            .post(&self.endpoint)
            .set("content-type", "application/json")
            .send_string(&body)
            .map_err(|e| ConnwatchError::Transport(format!("POST {}: {e}", self.endpoint)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// Used when no enforcement endpoint is configured: the intent only
/// reaches the cycle log, which the dashboard writes for every dispatch.
#[derive(Default)]
pub struct LogBlockSink;

impl BlockSink for LogBlockSink {
    fn request_block(&mut self, _pid: &str) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "log-only".to_string()
    }
}
