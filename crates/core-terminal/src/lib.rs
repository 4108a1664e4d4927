//! Terminal access for the report display.
//!
//! - [`TerminalSurface`]: the three primitives the repainter draws through
//!   (dimensions, block cell write, cursor placement). [`CrosstermSurface`]
//!   drives a real terminal; [`MemorySurface`] is an in-memory double.
//! - [`TerminalSession`]: owns the stdout surface for the lifetime of the
//!   display. While attached to a terminal it holds raw mode, the alternate
//!   screen and a hidden cursor, and restores all three on drop. Over
//!   redirected output it changes nothing and every repaint is a no-op.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::{self, Stdout, Write};
use tracing::{debug, warn};

pub mod memory;
pub mod surface;
pub use memory::MemorySurface;
pub use surface::{CellPos, CrosstermSurface, REPLACEMENT_CELL, SurfaceError, TerminalSurface};

pub struct TerminalSession<W: Write = Stdout> {
    surface: CrosstermSurface<W>,
    entered: bool,
}

impl TerminalSession<Stdout> {
    /// Take over stdout for the display.
    pub fn start(title: &str) -> Self {
        Self::with_surface(CrosstermSurface::stdout(), title)
    }
}

impl<W: Write> TerminalSession<W> {
    /// Enter the display session on `surface`. A detached surface is kept
    /// as is; failing to switch the terminal is logged and leaves it
    /// untouched, the display then draws over the normal screen.
    pub fn with_surface(mut surface: CrosstermSurface<W>, title: &str) -> Self {
        if !surface.is_attached() {
            debug!(target: "terminal", "session_detached");
            return Self {
                surface,
                entered: false,
            };
        }
        let entered = match enter(surface.writer_mut(), title) {
            Ok(()) => {
                debug!(target: "terminal", "session_entered");
                true
            }
            Err(e) => {
                warn!(target: "terminal", error = %e, "session_enter_failed");
                false
            }
        };
        Self { surface, entered }
    }

    pub fn surface(&mut self) -> &mut CrosstermSurface<W> {
        &mut self.surface
    }

    /// True while raw mode and the alternate screen are held.
    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

fn enter(out: &mut impl Write, title: &str) -> io::Result<()> {
    enable_raw_mode()?;
    if let Err(e) = execute!(out, EnterAlternateScreen, Hide, SetTitle(title)) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    Ok(())
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        if self.entered {
            let _ = execute!(self.surface.writer_mut(), LeaveAlternateScreen, Show);
            let _ = disable_raw_mode();
            debug!(target: "terminal", "session_left");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn probe_8x2() -> io::Result<(u16, u16)> {
        Ok((8, 2))
    }

    #[test]
    fn detached_session_leaves_output_untouched() {
        let surface = CrosstermSurface::with_writer(Vec::new(), probe_8x2).attached(false);
        let mut session = TerminalSession::with_surface(surface, "framewatch");
        assert!(!session.is_entered());
        assert!(matches!(
            session.surface().dimensions(),
            Err(SurfaceError::Unavailable)
        ));
        let written = std::mem::take(session.surface().writer_mut());
        drop(session);
        assert_eq!(written, Vec::<u8>::new());
    }
}
