use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use crossterm::{cursor, execute, queue, style::Print, terminal};
use rand::{rngs::StdRng, SeedableRng};

use crate::cli::{self, Args};
use crate::glyphs::GlyphTable;
use crate::pacing::{FpsWindow, Pacer};
use crate::pipeline::{Scene, Scheduler};

/// Geometry used when the terminal size cannot be queried (stdout piped or
/// redirected).
const FALLBACK_COLS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;

/// Rolling FPS estimate window, in frames.
const FPS_WINDOW: usize = 30;

/// Cancellation token: set exactly once by the Ctrl-C handler, read at the
/// top of every display-loop iteration.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn run(args: Args) -> Result<()> {
    let cancel = CancelToken::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || handler.cancel())
        .context("could not install the Ctrl-C handler")?;

    let mut rng = StdRng::from_entropy();
    let charset = if args.random {
        let charset = cli::random_charset(&mut rng);
        eprintln!("Random charset: {}", charset.name());
        charset
    } else {
        args.charset
    };
    let gradient = if args.no_color {
        None
    } else if args.random {
        let (start, end) = cli::random_colors(&mut rng);
        eprintln!("Random colors: {start} -> {end}");
        Some((start, end))
    } else {
        Some((args.color_start, args.color_end))
    };

    let seed = args.seed.unwrap_or_else(time_seed);
    let table = Arc::new(GlyphTable::new(&charset.glyphs(), gradient));
    let (width, height) = frame_geometry(args.show_fps);

    let pacer = Pacer::new(args.max_fps);
    let scene = Scene {
        width,
        height,
        scale: args.scale,
        seed,
        table,
    };
    let mut scheduler = if args.serial {
        Scheduler::serial(scene)
    } else {
        let workers = args.workers.unwrap_or_else(default_workers);
        Scheduler::pool(scene, workers, render_wait_cap(pacer.interval()))
    };

    let mut out = io::stdout();
    execute!(out, cursor::Hide)?;
    let result = animate(&mut out, &mut scheduler, &pacer, args.show_fps, &cancel);

    // Every exit path, including errors, must leave the cursor visible.
    execute!(out, cursor::Show).ok();
    writeln!(out).ok();
    out.flush().ok();
    result
}

fn animate(
    out: &mut io::Stdout,
    scheduler: &mut Scheduler,
    pacer: &Pacer,
    show_fps: bool,
    cancel: &CancelToken,
) -> Result<()> {
    let mut window = FpsWindow::new(FPS_WINDOW);
    let mut last = Instant::now();
    while !cancel.is_cancelled() {
        let start = Instant::now();
        let frame = scheduler.next_frame();
        queue!(out, cursor::MoveTo(0, 0), Print(&frame))?;
        if show_fps {
            let now = Instant::now();
            window.push(now - last);
            last = now;
            queue!(out, Print(format!("\n{:.2}", window.fps())))?;
        }
        out.flush()?;
        pacer.pace(start);
    }
    Ok(())
}

/// Terminal geometry, queried once per run. One row is reserved to avoid
/// scrolling, a second for the FPS line when enabled.
fn frame_geometry(show_fps: bool) -> (usize, usize) {
    let (cols, rows) = terminal::size().unwrap_or_else(|err| {
        log::warn!("terminal size unavailable ({err}); assuming {FALLBACK_COLS}x{FALLBACK_ROWS}");
        (FALLBACK_COLS, FALLBACK_ROWS)
    });
    let reserve = if show_fps { 2 } else { 1 };
    (
        cols.max(1) as usize,
        rows.saturating_sub(reserve).max(1) as usize,
    )
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// A frame more than a few intervals late is treated as lost and replaced
/// by a blank, so one stuck worker cannot stall the animation.
fn render_wait_cap(frame_interval: Duration) -> Duration {
    (frame_interval * 4).max(Duration::from_millis(250))
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_set_once_and_observed() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn wait_cap_scales_with_the_interval_but_never_below_the_floor() {
        // 120 fps -> ~33ms of slack is too twitchy; the floor applies.
        assert_eq!(
            render_wait_cap(Duration::from_millis(8)),
            Duration::from_millis(250)
        );
        // 2 fps -> four intervals.
        assert_eq!(
            render_wait_cap(Duration::from_millis(500)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn default_worker_count_is_at_least_one() {
        assert!(default_workers() >= 1);
    }

    #[test]
    fn time_seed_is_past_the_epoch() {
        assert!(time_seed() > 0);
    }
}
