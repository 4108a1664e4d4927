//! In-memory [`TerminalSurface`] double.
//!
//! Keeps a `width * height` character grid plus a log of every block handed to
//! `write_cells`, so tests can assert both what reached the screen and exactly
//! what the repainter emitted. Failures can be injected per primitive.

use crate::surface::{CellPos, SurfaceError, TerminalSurface};

#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: u16,
    height: u16,
    grid: Vec<char>,
    writes: Vec<Vec<char>>,
    cursor: Option<CellPos>,
    pub fail_dimensions: bool,
    pub fail_writes: bool,
}

impl MemorySurface {
    /// Fresh surface filled with `fill` so untouched cells are recognizable.
    pub fn filled(width: u16, height: u16, fill: char) -> Self {
        Self {
            width,
            height,
            grid: vec![fill; usize::from(width) * usize::from(height)],
            writes: Vec::new(),
            cursor: None,
            fail_dimensions: false,
            fail_writes: false,
        }
    }

    pub fn new(width: u16, height: u16) -> Self {
        Self::filled(width, height, ' ')
    }

    /// Change the reported size. Existing content is discarded.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self {
            writes: std::mem::take(&mut self.writes),
            cursor: self.cursor,
            fail_dimensions: self.fail_dimensions,
            fail_writes: self.fail_writes,
            ..Self::new(width, height)
        };
    }

    pub fn writes(&self) -> &[Vec<char>] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&[char]> {
        self.writes.last().map(Vec::as_slice)
    }

    pub fn cursor(&self) -> Option<CellPos> {
        self.cursor
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.grid
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    pub fn row(&self, y: u16) -> String {
        let w = usize::from(self.width);
        let start = usize::from(y) * w;
        self.grid
            .get(start..start + w)
            .map(|r| r.iter().collect())
            .unwrap_or_default()
    }

    /// Whole grid, one `\n`-terminated line per row.
    pub fn contents(&self) -> String {
        (0..self.height).map(|y| self.row(y) + "\n").collect()
    }
}

impl TerminalSurface for MemorySurface {
    fn dimensions(&mut self) -> Result<(u16, u16), SurfaceError> {
        if self.fail_dimensions {
            return Err(SurfaceError::Unavailable);
        }
        Ok((self.width, self.height))
    }

    fn write_cells(&mut self, origin: CellPos, cells: &[char]) -> Result<(), SurfaceError> {
        if self.fail_writes {
            return Err(SurfaceError::Unavailable);
        }
        let start = usize::from(origin.y) * usize::from(self.width) + usize::from(origin.x);
        for (slot, ch) in self.grid.iter_mut().skip(start).zip(cells) {
            *slot = *ch;
        }
        self.writes.push(cells.to_vec());
        Ok(())
    }

    fn set_cursor(&mut self, pos: CellPos) -> Result<(), SurfaceError> {
        self.cursor = Some(pos);
        Ok(())
    }
}
