use crate::poller::PollStats;
use crate::validation;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Writes one line per poll cycle and per block intent to a file or to
/// stdout. This is the only place transport failures and block outcomes
/// are recorded; the dashboard itself just shows a staleness indicator.
pub struct CycleLogger {
    file: Option<std::fs::File>,
    use_stdout: bool,
}

impl CycleLogger {
    pub fn new(path: Option<String>) -> anyhow::Result<Self> {
        let (file, use_stdout) = if let Some(path) = path {
            if path == "-" {
                (None, true) // stdout logging
            } else {
                validation::validate_file_path(&path)?;
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                (Some(f), false)
            }
        } else {
            (None, false)
        };

        let mut logger = Self { file, use_stdout };

        // Write header if file is new or empty
        if let Some(ref mut f) = logger.file {
            let metadata = f.metadata()?;
            if metadata.len() == 0 {
                logger.write_header()?;
            }
        } else if logger.use_stdout {
            logger.write_header()?;
        }

        Ok(logger)
    }

    /// A logger that drops everything, for when no log target is set.
    pub fn disabled() -> Self {
        Self {
            file: None,
            use_stdout: false,
        }
    }

    fn write_header(&mut self) -> anyhow::Result<()> {
        let header = "Date Time Event Groups Connections OkTotal FailedTotal Detail\n";
        self.write_line(header)
    }

    pub fn log_cycle_ok(&mut self, groups: usize, connections: usize, stats: &PollStats) {
        self.log_event("poll-ok", groups, connections, stats, "-");
    }

    pub fn log_cycle_stale(&mut self, stats: &PollStats) {
        self.log_event("poll-stale", 0, 0, stats, "superseded result discarded");
    }

    pub fn log_cycle_failure(&mut self, stats: &PollStats, error: &str) {
        self.log_event("poll-failed", 0, 0, stats, error);
    }

    pub fn log_block_intent(&mut self, pid: &str, sink: &str, outcome: &str) {
        let now = Local::now();
        let line = format!(
            "{} {} block-intent pid={} sink={} outcome={}\n",
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S"),
            pid,
            sink,
            outcome
        );
        let _ = self.write_line(&line);
    }

    fn log_event(
        &mut self,
        event: &str,
        groups: usize,
        connections: usize,
        stats: &PollStats,
        detail: &str,
    ) {
        let now = Local::now();
        // Spaces in error text would break the column format
        let detail = detail.replace(char::is_whitespace, "_");
        let line = format!(
            "{} {} {} {} {} {} {} {}\n",
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S"),
            event,
            groups,
            connections,
            stats.ok,
            stats.failed,
            detail
        );
        let _ = self.write_line(&line);
    }

    fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        match (&mut self.file, self.use_stdout) {
            (Some(f), _) => {
                f.write_all(line.as_bytes())?;
                f.flush()?;
            }
            (None, true) => print!("{line}"),
            _ => {} // No output
        }

        Ok(())
    }
}
