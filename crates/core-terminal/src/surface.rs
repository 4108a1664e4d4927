//! Cell surface primitives used by the in-place repainter.
//!
//! The repainter only needs three things from a terminal: its size, a way to
//! write a contiguous run of cells starting at a position, and a way to park
//! the cursor. Cells are laid out row-major; a run longer than the remaining
//! width of a row continues at column 0 of the next row.
//!
//! [`CrosstermSurface`] never relies on terminal autowrap: each row of a run is
//! positioned with an explicit `MoveTo` and rows past the bottom edge are
//! clipped, so a full-screen write cannot scroll the display. Cells are drawn
//! literally: anything that does not occupy exactly one column (control
//! characters, escapes, wide or zero-width characters) is replaced by
//! [`REPLACEMENT_CELL`] so one cell is always one column.
//!
//! A surface whose output is not a terminal is detached: it reports
//! [`SurfaceError::Unavailable`] for its size and never writes, so redirected
//! output stays empty.

use crossterm::{cursor::MoveTo, queue, style::Print};
use std::io::{self, IsTerminal, Stdout, Write};
use thiserror::Error;
use unicode_width::UnicodeWidthChar;

/// Stand-in drawn for cells that are not exactly one column wide.
pub const REPLACEMENT_CELL: char = '?';

/// Zero-based (column, row) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellPos {
    pub x: u16,
    pub y: u16,
}

impl CellPos {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("terminal size unavailable: {0}")]
    Dimensions(#[source] io::Error),
    #[error("cell write failed: {0}")]
    Write(#[source] io::Error),
    #[error("surface has not been measured")]
    NotMeasured,
    #[error("surface unavailable")]
    Unavailable,
}

pub trait TerminalSurface {
    /// Current (columns, rows).
    fn dimensions(&mut self) -> Result<(u16, u16), SurfaceError>;
    /// Write `cells` row-major starting at `origin`.
    fn write_cells(&mut self, origin: CellPos, cells: &[char]) -> Result<(), SurfaceError>;
    fn set_cursor(&mut self, pos: CellPos) -> Result<(), SurfaceError>;
}

type SizeProbe = fn() -> io::Result<(u16, u16)>;

/// Crossterm-backed surface. Generic over the output sink so the emitted
/// command stream can be inspected without a tty.
pub struct CrosstermSurface<W: Write = Stdout> {
    out: W,
    probe: SizeProbe,
    size: Option<(u16, u16)>,
    attached: bool,
}

impl CrosstermSurface<Stdout> {
    /// Surface over stdout, detached when stdout is redirected.
    ///
    /// `terminal::size` measures the controlling tty even when stdout is a
    /// file, so the check has to be made on stdout itself.
    pub fn stdout() -> Self {
        let attached = io::stdout().is_terminal();
        Self::with_writer(io::stdout(), crossterm::terminal::size).attached(attached)
    }
}

impl<W: Write> CrosstermSurface<W> {
    pub fn with_writer(out: W, probe: SizeProbe) -> Self {
        Self {
            out,
            probe,
            size: None,
            attached: true,
        }
    }

    pub fn attached(mut self, attached: bool) -> Self {
        self.attached = attached;
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalSurface for CrosstermSurface<W> {
    fn dimensions(&mut self) -> Result<(u16, u16), SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Unavailable);
        }
        let size = (self.probe)().map_err(SurfaceError::Dimensions)?;
        self.size = Some(size);
        Ok(size)
    }

    fn write_cells(&mut self, origin: CellPos, cells: &[char]) -> Result<(), SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Unavailable);
        }
        let (width, height) = self.size.ok_or(SurfaceError::NotMeasured)?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let mut x = origin.x.min(width - 1);
        let mut y = origin.y;
        let mut rest = cells;
        while !rest.is_empty() && y < height {
            let take = usize::from(width - x).min(rest.len());
            let (row, tail) = rest.split_at(take);
            let line: String = row.iter().copied().map(display_cell).collect();
            queue!(self.out, MoveTo(x, y), Print(line)).map_err(SurfaceError::Write)?;
            rest = tail;
            x = 0;
            y += 1;
        }
        self.out.flush().map_err(SurfaceError::Write)
    }

    fn set_cursor(&mut self, pos: CellPos) -> Result<(), SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Unavailable);
        }
        queue!(self.out, MoveTo(pos.x, pos.y)).map_err(SurfaceError::Write)?;
        self.out.flush().map_err(SurfaceError::Write)
    }
}

fn display_cell(ch: char) -> char {
    if ch.width() == Some(1) {
        ch
    } else {
        REPLACEMENT_CELL
    }
}
