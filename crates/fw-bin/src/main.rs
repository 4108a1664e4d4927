//! framewatch entrypoint: live in-place report of per-process presentation stats.
use anyhow::Result;
use clap::Parser;
use core_config::{ConfigOverrides, VerbosityLevel, load_from};
use core_render::ScreenRepainter;
use core_stats::JsonFileSource;
use core_terminal::{CrosstermSurface, TerminalSession};
use crossterm::event::{self, Event};
use framewatch::{ReportLoop, is_quit_key};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Emit a summary log line every this many frames.
const SUMMARY_EVERY_FRAMES: u64 = 60;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "framewatch", version, about = "Live frame presentation report")]
struct Args {
    /// Snapshot document exported by the capture engine (re-read every refresh).
    #[arg(long = "snapshot")]
    pub snapshot: PathBuf,
    /// Report detail: simple, default or verbose (overrides the config file).
    #[arg(long = "verbosity")]
    pub verbosity: Option<VerbosityLevel>,
    /// Repaint cadence in milliseconds (overrides the config file).
    #[arg(long = "refresh-ms")]
    pub refresh_ms: Option<u64>,
    /// Optional configuration file path (overrides discovery of `framewatch.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Stop after this many repaints.
    #[arg(long = "frames")]
    pub frames: Option<u64>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("framewatch.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        // Logs go to a file; stdout belongs to the repainter.
        let file_appender = tracing_appender::rolling::never(log_dir, "framewatch.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_ansi(false)
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                // Restore the terminal before the default hook prints.
                if std::io::stdout().is_terminal() {
                    let _ = crossterm::terminal::disable_raw_mode();
                    let _ = crossterm::execute!(
                        std::io::stdout(),
                        crossterm::terminal::LeaveAlternateScreen,
                        crossterm::cursor::Show
                    );
                }
                default_panic(info);
            }));
        });
    }

    fn run(&mut self) -> Result<()> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let args = Args::parse();
        let mut config = load_from(args.config.clone())?;
        config.apply_overrides(ConfigOverrides {
            verbosity: args.verbosity,
            refresh_ms: args.refresh_ms,
        });
        let interval = config.refresh_interval();
        let repainter = config
            .staging_capacity()
            .map(ScreenRepainter::with_capacity)
            .unwrap_or_default();
        info!(
            target: "runtime.startup",
            snapshot = %args.snapshot.display(),
            verbosity = config.verbosity().as_str(),
            refresh_ms = interval.as_millis() as u64,
            staging_capacity = repainter.capacity(),
            frame_limit = args.frames,
            config_override = args.config.is_some(),
            "bootstrap_complete"
        );

        let mut report = ReportLoop::new(
            JsonFileSource::new(&args.snapshot),
            repainter,
            config.verbosity(),
        );
        // Over redirected output the session stays detached and repaints skip.
        let mut session = TerminalSession::start("framewatch");
        info!(target: "runtime", entered = session.is_entered(), "session_ready");
        run_loop(&mut report, session.surface(), interval, args.frames)?;
        drop(session);
        info!(target: "runtime", frames = report.frames(), "shutdown");
        Ok(())
    }
}

fn run_loop(
    report: &mut ReportLoop<JsonFileSource>,
    surface: &mut CrosstermSurface,
    interval: Duration,
    frame_limit: Option<u64>,
) -> Result<()> {
    loop {
        let started = Instant::now();
        report.tick(surface);
        if report.frames() % SUMMARY_EVERY_FRAMES == 0 {
            let stats = report.stats();
            info!(
                target: "runtime",
                frames = report.frames(),
                processes = report.table().len(),
                load_failures = report.load_failures(),
                painted = stats.painted,
                skipped = stats.skipped,
                truncated = stats.truncated,
                last_cells = stats.last_cells,
                last_repaint_us = stats.last_duration.as_micros() as u64,
                slowest_repaint_us = stats.slowest.as_micros() as u64,
                "report_summary"
            );
        }
        if frame_limit.is_some_and(|limit| report.frames() >= limit) {
            return Ok(());
        }
        // Wait out the rest of the interval, waking early for a quit key.
        let deadline = started + interval;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match event::poll(remaining) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    // No controlling terminal to read keys from; keep the cadence.
                    debug!(target: "runtime", error = %e, "key_poll_unavailable");
                    std::thread::sleep(remaining);
                    break;
                }
            }
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    return Ok(());
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.run()
}
