//! Progress and completion accounting
//!
//! A run is complete once every scanned file has an outcome. The runner awaits
//! each file before moving on, so completion is checked once after the last
//! file rather than polled.

use crate::protocol::Event;

/// Per-run tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total_files: usize,
    pub success_count: usize,
    pub fail_count: usize,
}

impl RunCounters {
    pub fn accounted(&self) -> usize {
        self.success_count + self.fail_count
    }

    /// `floor(accounted / total * 100)`, 100 for an empty run
    pub fn percent(&self) -> u8 {
        if self.total_files == 0 {
            return 100;
        }
        (self.accounted() * 100 / self.total_files).min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.accounted() == self.total_files
    }
}

/// Owns the counters of one run and guards the single terminal message
#[derive(Debug)]
pub struct CompletionTracker {
    counters: RunCounters,
    terminal_sent: bool,
}

impl CompletionTracker {
    pub fn new(total_files: usize) -> Self {
        Self {
            counters: RunCounters {
                total_files,
                ..Default::default()
            },
            terminal_sent: false,
        }
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn percent(&self) -> u8 {
        self.counters.percent()
    }

    pub fn record_success(&mut self) {
        if self.has_room() {
            self.counters.success_count += 1;
        }
    }

    pub fn record_failure(&mut self) {
        if self.has_room() {
            self.counters.fail_count += 1;
        }
    }

    fn has_room(&self) -> bool {
        let room = self.counters.accounted() < self.counters.total_files;
        if !room {
            tracing::warn!("Outcome recorded past total of {}", self.counters.total_files);
        }
        room
    }

    /// The terminal message, once the run is complete and only the first time
    pub fn complete(&mut self) -> Option<Event> {
        if self.terminal_sent || !self.counters.is_complete() {
            return None;
        }
        self.terminal_sent = true;
        if self.counters.fail_count == 0 {
            Some(Event::success())
        } else {
            Some(Event::fail(format!(
                "{} files failed to obfuscate",
                self.counters.fail_count
            )))
        }
    }

    /// A terminal failure for a run-fatal error, unless a terminal was already sent
    pub fn abort(&mut self, error: impl Into<String>) -> Option<Event> {
        if self.terminal_sent {
            return None;
        }
        self.terminal_sent = true;
        Some(Event::fail(error))
    }

    pub fn terminal_sent(&self) -> bool {
        self.terminal_sent
    }
}
