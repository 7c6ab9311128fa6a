//! Fixed-interval polling of the monitoring backend.
//!
//! The poller is driven cooperatively by the dashboard loop: `tick_due`
//! says whether the refresh interval has elapsed, `fetch` performs one
//! blocking GET and decode. Failures are terminal for that cycle only;
//! the caller logs them and the previously rendered snapshot stays up.
//!
//! Every fetch is stamped with a monotonically increasing sequence
//! number and a result is applied only if its sequence is the highest
//! seen so far. With the current blocking loop fetches cannot overlap,
//! but the guard keeps stale results from ever overwriting fresher ones
//! should issuance become concurrent.

use crate::error::{ConnwatchError, Result};
use crate::snapshot::Snapshot;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Running totals for the status line and the cycle log.
#[derive(Debug, Clone, Default)]
pub struct PollStats {
    pub ok: u64,
    pub failed: u64,
    pub stale: u64,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Local>>,
}

pub struct Poller {
    agent: ureq::Agent,
    base_url: String,
    interval: Duration,
    last_attempt: Option<Instant>,
    next_seq: u64,
    applied_seq: Option<u64>,
    stats: PollStats,
}

impl Poller {
    pub fn new(base_url: &str, interval: Duration) -> Self {
        // The transport timeout is tied to the refresh interval so a hung
        // backend cannot stall the loop past the next tick, with a floor
        // of one second for very aggressive intervals.
        let timeout = interval.max(Duration::from_secs(1));
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            interval,
            last_attempt: None,
            next_seq: 0,
            applied_seq: None,
            stats: PollStats::default(),
        }
    }

    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}/connections", self.base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// True when the next cycle should run. The first call is due
    /// immediately so the dashboard renders without waiting a full
    /// interval.
    #[must_use]
    pub fn tick_due(&self) -> bool {
        match self.last_attempt {
            None => true,
            Some(at) => at.elapsed() >= self.interval,
        }
    }

    /// Makes the next `tick_due` fire immediately (manual refresh).
    pub fn force_due(&mut self) {
        self.last_attempt = None;
    }

    /// Runs one poll cycle. `Ok(Some(..))` carries a fresh snapshot,
    /// `Ok(None)` means the result was superseded and discarded, and
    /// errors cover both transport and decode failures for this cycle.
    pub fn fetch(&mut self) -> Result<Option<Snapshot>> {
        self.last_attempt = Some(Instant::now());
        let seq = self.next_seq;
        self.next_seq += 1;

        match self.fetch_inner() {
            Ok(snapshot) => {
                if !self.apply_guard(seq) {
                    self.stats.stale += 1;
                    return Ok(None);
                }
                self.stats.ok += 1;
                self.stats.consecutive_failures = 0;
                self.stats.last_success = Some(Local::now());
                Ok(Some(snapshot))
            }
            Err(e) => {
                self.stats.failed += 1;
                self.stats.consecutive_failures += 1;
                Err(e)
            }
        }
    }

    fn fetch_inner(&self) -> Result<Snapshot> {
        let url = self.endpoint_url();
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ConnwatchError::Transport(format!("GET {url}: {e}")))?;
        let body = response
            .into_string()
            .map_err(|e| ConnwatchError::Transport(format!("read response body: {e}")))?;
        Snapshot::from_json_str(&body)
    }

    /// Accepts `seq` only if it is newer than everything applied so far.
    fn apply_guard(&mut self, seq: u64) -> bool {
        match self.applied_seq {
            Some(applied) if applied >= seq => false,
            _ => {
                self.applied_seq = Some(seq);
                true
            }
        }
    }
}
