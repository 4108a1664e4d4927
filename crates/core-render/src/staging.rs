//! Fixed-capacity cell staging for a single repaint.
//!
//! Policy is truncate-not-grow: the buffer is allocated once at its full
//! capacity and pushes past that capacity are dropped without error or marker.
//! The count of refused cells is kept for the repaint trace.

/// Default number of cells a single repaint may stage.
pub const DEFAULT_CAPACITY: usize = 16384;

#[derive(Debug)]
pub(crate) struct StagingBuffer {
    cells: Vec<char>,
    capacity: usize,
    dropped: usize,
}

impl StagingBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Stage one cell. Returns `false` when the cell was dropped.
    #[inline]
    pub(crate) fn push(&mut self, ch: char) -> bool {
        if self.cells.len() < self.capacity {
            self.cells.push(ch);
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Stage `ch` until `len()` reaches `target` (clamped to capacity).
    pub(crate) fn pad_to(&mut self, target: usize, ch: char) {
        let target = target.min(self.capacity);
        if self.cells.len() < target {
            self.cells.resize(target, ch);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Cells refused because the buffer was full.
    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }

    pub(crate) fn as_slice(&self) -> &[char] {
        &self.cells
    }
}
