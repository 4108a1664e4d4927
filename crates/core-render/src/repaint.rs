//! Flicker-free in-place repaint.
//!
//! Each call is a complete, independent repaint computed from the text and a
//! freshly queried terminal size; nothing is carried between calls.
//!
//! Algorithm:
//! 1. Query `(W, H)`. On failure the call is a no-op and the terminal keeps
//!    whatever it showed before.
//! 2. Expand the text into a staging buffer of capacity `C`, tracking a
//!    virtual column `x`: `\t` becomes 4 spaces regardless of `x`, `\n` becomes
//!    `W - x` spaces (fill to end of row), anything else is one cell. After
//!    every staged cell `x` advances and wraps to 0 at `W`. Cells past `C` are
//!    dropped.
//! 3. Pad with spaces up to `min(W * H, C)` so leftovers from a longer previous
//!    frame are overwritten instead of cleared (no full-screen clear, no
//!    flicker).
//! 4. One block write at the origin, then park the cursor at the origin.
//!
//! Surface errors never leave this module; they are logged and reported in the
//! returned [`RepaintOutcome`].

use crate::staging::{DEFAULT_CAPACITY, StagingBuffer};
use core_terminal::{CellPos, TerminalSurface};
use std::time::Instant;
use tracing::{debug, trace};

pub const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Terminal size could not be queried.
    DimensionsUnavailable,
    /// The block write was rejected; nothing reached the screen.
    WriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintOutcome {
    Skipped(SkipReason),
    Painted {
        /// Total cells written, padding included.
        cells: usize,
        /// Cells produced by the text before padding.
        text_cells: usize,
        /// Some of the expanded text did not fit in the staging buffer.
        truncated: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ScreenRepainter {
    capacity: usize,
}

impl Default for ScreenRepainter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRepainter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Repainter staging at most `capacity` cells per call (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn repaint<S: TerminalSurface + ?Sized>(
        &self,
        text: &str,
        surface: &mut S,
    ) -> RepaintOutcome {
        let start = Instant::now();
        let (width, height) = match surface.dimensions() {
            Ok(dims) => dims,
            Err(e) => {
                debug!(target: "render.repaint", error = %e, "repaint_skipped_no_dimensions");
                return RepaintOutcome::Skipped(SkipReason::DimensionsUnavailable);
            }
        };
        let width = usize::from(width);
        let screen_cells = (width * usize::from(height)).min(self.capacity);

        let mut staging = StagingBuffer::with_capacity(self.capacity);
        stage_text(text, width, &mut staging);
        let text_cells = staging.len();
        let dropped = staging.dropped();
        let truncated = dropped > 0;
        staging.pad_to(screen_cells, ' ');

        if let Err(e) = surface.write_cells(CellPos::origin(), staging.as_slice()) {
            debug!(
                target: "render.repaint",
                error = %e,
                cells = staging.len(),
                "repaint_write_failed"
            );
            return RepaintOutcome::Skipped(SkipReason::WriteFailed);
        }
        if let Err(e) = surface.set_cursor(CellPos::origin()) {
            debug!(target: "render.repaint", error = %e, "repaint_cursor_failed");
        }

        let elapsed = start.elapsed().as_nanos() as u64;
        trace!(
            target: "render.repaint",
            width,
            height,
            text_cells,
            cells = staging.len(),
            dropped,
            elapsed_ns = elapsed,
            "repaint_done"
        );
        RepaintOutcome::Painted {
            cells: staging.len(),
            text_cells,
            truncated,
        }
    }
}

/// Expand `text` into `staging`, stopping at the first cell that does not fit.
fn stage_text(text: &str, width: usize, staging: &mut StagingBuffer) {
    let mut x = 0usize;
    for ch in text.chars() {
        let (cell, repeat) = match ch {
            '\t' => (' ', TAB_WIDTH),
            '\n' => (' ', width.saturating_sub(x)),
            other => (other, 1),
        };
        for _ in 0..repeat {
            if !staging.push(cell) {
                return;
            }
            x += 1;
            if x >= width {
                x = 0;
            }
        }
    }
}
