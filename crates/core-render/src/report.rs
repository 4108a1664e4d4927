//! Report composition: process snapshots to report text.
//!
//! Per visible process the report holds a header line followed by one line per
//! swap chain, in ascending chain handle order:
//!
//! ```text
//! \n<module>[<pid>]:\n
//! \t<chain hex> (<runtime>): SyncInterval <n> | Flags <n> | <ms> ms/frame (<fps> fps, [<dfps> displayed fps, ]<cpu> ms CPU[, <lat> ms latency) (<mode>[: Plane <n>][, DWM notified][, batched]])\n
//! ```
//!
//! Verbosity gates the bracketed clauses: `> Simple` adds displayed fps and the
//! latency / present mode clause, `>= Verbose` adds the DWM and batched flags.
//! The final `)` is emitted unconditionally: at `Simple` it closes the fps
//! group, otherwise the present mode group opened by the latency clause.
//!
//! Composition never truncates and has no side effects; bounding the output is
//! the repainter's job.

use core_config::VerbosityLevel;
use core_stats::{ChainId, ChainStats, PresentMode, ProcessSnapshot, ProcessTable};
use std::fmt::{self, Write};
use tracing::trace;

/// Compose the report fragment for a single process. Empty when the process is
/// not visible (not a target, unnamed, or without chains).
pub fn compose(process_id: u32, snapshot: &ProcessSnapshot, verbosity: VerbosityLevel) -> String {
    let mut out = String::new();
    compose_into(&mut out, process_id, snapshot, verbosity);
    out
}

/// Append the fragment for one process to an accumulating report.
pub fn compose_into(
    out: &mut String,
    process_id: u32,
    snapshot: &ProcessSnapshot,
    verbosity: VerbosityLevel,
) {
    if !snapshot.is_visible() {
        return;
    }
    // Writing into a String cannot fail.
    let _ = write_process(out, process_id, snapshot, verbosity);
}

/// Compose every process of a table in ascending process id order.
pub fn compose_report(processes: &ProcessTable, verbosity: VerbosityLevel) -> String {
    let mut out = String::new();
    let mut visible = 0usize;
    for (pid, snapshot) in processes {
        let before = out.len();
        compose_into(&mut out, *pid, snapshot, verbosity);
        if out.len() != before {
            visible += 1;
        }
    }
    trace!(
        target: "render.report",
        processes = processes.len(),
        visible,
        chars = out.len(),
        verbosity = verbosity.as_str(),
        "report_composed"
    );
    out
}

fn write_process(
    out: &mut String,
    process_id: u32,
    snapshot: &ProcessSnapshot,
    verbosity: VerbosityLevel,
) -> fmt::Result {
    write!(out, "\n{}[{}]:\n", snapshot.module_name, process_id)?;
    for (id, stats) in &snapshot.chains {
        write_chain(out, *id, stats, verbosity)?;
    }
    Ok(())
}

fn write_chain(
    out: &mut String,
    id: ChainId,
    chain: &ChainStats,
    verbosity: VerbosityLevel,
) -> fmt::Result {
    let fps = chain.fps;
    write!(
        out,
        "\t{} ({}): SyncInterval {} | Flags {} | {:.2} ms/frame ({:.1} fps, ",
        id,
        chain.runtime.name(),
        chain.sync_interval,
        chain.present_flags,
        1000.0 / fps,
        fps
    )?;

    if verbosity > VerbosityLevel::Simple {
        write!(out, "{:.1} displayed fps, ", chain.displayed_fps)?;
    }

    write!(out, "{:.2} ms CPU", chain.cpu_frame_time_seconds * 1000.0)?;

    if verbosity > VerbosityLevel::Simple {
        write!(
            out,
            ", {:.2} ms latency) ({}",
            1000.0 * chain.latency_seconds,
            chain.present_mode.name()
        )?;

        if chain.present_mode == PresentMode::HardwareComposedIndependentFlip {
            write!(out, ": Plane {}", chain.plane_index)?;
        }

        if chain.present_mode.is_independent_flip()
            && verbosity >= VerbosityLevel::Verbose
            && chain.dwm_notified
        {
            out.push_str(", DWM notified");
        }

        if verbosity >= VerbosityLevel::Verbose && chain.has_been_batched {
            out.push_str(", batched");
        }
    }

    out.push_str(")\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(mode: PresentMode) -> ChainStats {
        ChainStats {
            present_mode: mode,
            fps: 100.0,
            displayed_fps: 100.0,
            ..ChainStats::default()
        }
    }

    #[test]
    fn invisible_process_contributes_nothing() {
        let hidden =
            ProcessSnapshot::new("game.exe", false).with_chain(1, chain(PresentMode::ComposedFlip));
        let mut out = String::from("prefix");
        compose_into(&mut out, 1, &hidden, VerbosityLevel::Verbose);
        assert_eq!(out, "prefix");
    }

    #[test]
    fn dwm_notified_only_for_independent_flip() {
        let mut c = chain(PresentMode::ComposedFlip);
        c.dwm_notified = true;
        let snap = ProcessSnapshot::new("a.exe", true).with_chain(1, c);
        let text = compose(1, &snap, VerbosityLevel::Verbose);
        assert!(!text.contains("DWM notified"));
        assert!(text.ends_with("(Composed Flip)\n"));
    }

    #[test]
    fn plane_only_for_composed_independent_flip() {
        let mut c = chain(PresentMode::HardwareIndependentFlip);
        c.plane_index = 3;
        c.dwm_notified = true;
        let snap = ProcessSnapshot::new("a.exe", true).with_chain(1, c);
        let text = compose(1, &snap, VerbosityLevel::Verbose);
        assert!(!text.contains("Plane"));
        assert!(text.ends_with("(Hardware Independent Flip, DWM notified)\n"));
    }

    #[test]
    fn unknown_present_mode_reads_other() {
        let snap = ProcessSnapshot::new("a.exe", true).with_chain(1, chain(PresentMode::Unknown));
        let text = compose(1, &snap, VerbosityLevel::Default);
        assert!(text.ends_with(" ms latency) (Other)\n"), "{text}");
    }

    #[test]
    fn zero_fps_formats_without_panicking() {
        let snap = ProcessSnapshot::new("a.exe", true).with_chain(1, ChainStats::default());
        let text = compose(1, &snap, VerbosityLevel::Simple);
        assert!(text.contains("inf ms/frame (0.0 fps, "));
    }
}
