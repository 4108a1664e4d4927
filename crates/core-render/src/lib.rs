//! Display tier: report composition + in-place screen repaint.
//!
//! Pipeline (no feedback):
//! 1. `report` turns each process snapshot into newline-delimited text under a
//!    [`VerbosityLevel`]; the host accumulates one text across all processes.
//! 2. `repaint` expands that text into a bounded staging buffer and overwrites
//!    the terminal from the origin, padding with spaces to erase what the
//!    previous, possibly longer, frame left behind.
//!
//! Invariants:
//! - Composition is pure and deterministic: chains in ascending handle order,
//!   processes in ascending id order.
//! - A repaint never writes more than the staging capacity and never reports
//!   an error to its caller; an unavailable surface turns the call into a
//!   no-op.
//! - Nothing is cached between repaints; the terminal size is re-queried every
//!   call so resizes are picked up on the next frame.
//!
//! Exposed Components:
//! - `report`: `compose`, `compose_into`, `compose_report`.
//! - `repaint`: `ScreenRepainter` and its `RepaintOutcome`.
//! - `staging`: fixed-capacity, drop-on-overflow cell buffer.

pub use core_config::VerbosityLevel;

pub mod repaint;
pub mod report;
pub mod staging;

pub use repaint::{RepaintOutcome, ScreenRepainter, SkipReason};
pub use report::{compose, compose_into, compose_report};
pub use staging::DEFAULT_CAPACITY;
