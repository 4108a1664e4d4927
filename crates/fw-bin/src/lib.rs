//! Host loop pieces shared by the `framewatch` binary and its tests.
//!
//! Each tick loads a fresh process table from the snapshot source, composes
//! the report for every process and repaints the surface. A failed load keeps
//! the last good table on screen; the display never stops because the capture
//! side hiccupped.

use core_config::VerbosityLevel;
use core_render::{RepaintOutcome, ScreenRepainter, compose_report};
use core_stats::{ProcessTable, SnapshotSource};
use core_terminal::TerminalSurface;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Running totals over every repaint of a session, reported in the periodic
/// summary log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepaintStats {
    pub painted: u64,
    pub skipped: u64,
    /// Painted frames whose report did not fit the staging capacity.
    pub truncated: u64,
    pub last_cells: usize,
    pub last_duration: Duration,
    pub slowest: Duration,
}

impl RepaintStats {
    fn record(&mut self, outcome: RepaintOutcome, took: Duration) {
        match outcome {
            RepaintOutcome::Painted {
                cells, truncated, ..
            } => {
                self.painted += 1;
                self.truncated += u64::from(truncated);
                self.last_cells = cells;
            }
            RepaintOutcome::Skipped(_) => self.skipped += 1,
        }
        self.last_duration = took;
        self.slowest = self.slowest.max(took);
    }
}

pub struct ReportLoop<S> {
    source: S,
    repainter: ScreenRepainter,
    verbosity: VerbosityLevel,
    table: ProcessTable,
    frames: u64,
    load_failures: u64,
    stats: RepaintStats,
}

impl<S: SnapshotSource> ReportLoop<S> {
    pub fn new(source: S, repainter: ScreenRepainter, verbosity: VerbosityLevel) -> Self {
        Self {
            source,
            repainter,
            verbosity,
            table: ProcessTable::new(),
            frames: 0,
            load_failures: 0,
            stats: RepaintStats::default(),
        }
    }

    /// Reload the process table. Returns false (keeping the previous table) on failure.
    pub fn refresh(&mut self) -> bool {
        match self.source.load() {
            Ok(table) => {
                self.table = table;
                true
            }
            Err(e) => {
                self.load_failures += 1;
                warn!(
                    target: "capture",
                    error = %e,
                    failures = self.load_failures,
                    "snapshot_load_failed_keeping_last"
                );
                false
            }
        }
    }

    /// One refresh + compose + repaint cycle.
    pub fn tick<T: TerminalSurface + ?Sized>(&mut self, surface: &mut T) -> RepaintOutcome {
        self.refresh();
        let text = compose_report(&self.table, self.verbosity);
        let started = Instant::now();
        let outcome = self.repainter.repaint(&text, surface);
        self.stats.record(outcome, started.elapsed());
        self.frames += 1;
        match outcome {
            RepaintOutcome::Painted { truncated: true, cells, .. } => {
                debug!(target: "runtime", frame = self.frames, cells, "report_truncated");
            }
            RepaintOutcome::Skipped(reason) => {
                debug!(target: "runtime", frame = self.frames, ?reason, "repaint_skipped");
            }
            RepaintOutcome::Painted { .. } => {}
        }
        outcome
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn load_failures(&self) -> u64 {
        self.load_failures
    }

    pub fn stats(&self) -> RepaintStats {
        self.stats
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }
}

/// `q`, `Esc` and `Ctrl-C` end the session (raw mode swallows SIGINT).
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn stats_split_painted_and_skipped() {
        let mut stats = RepaintStats::default();
        let painted = |truncated| RepaintOutcome::Painted {
            cells: 40,
            text_cells: 12,
            truncated,
        };
        stats.record(painted(false), Duration::from_micros(30));
        stats.record(painted(true), Duration::from_micros(90));
        stats.record(
            RepaintOutcome::Skipped(core_render::SkipReason::DimensionsUnavailable),
            Duration::from_micros(5),
        );
        assert_eq!(stats.painted, 2);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.last_cells, 40);
        assert_eq!(stats.last_duration, Duration::from_micros(5));
        assert_eq!(stats.slowest, Duration::from_micros(90));
    }

    #[test]
    fn release_events_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&key));
    }
}
