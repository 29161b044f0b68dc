//! Progress observers: hooks for progress bars, logging, and tests.
//!
//! Estimators receive a `&mut dyn ProgressReporter` and call
//! [`ProgressReporter::report`] at chunk / iteration boundaries. Reporters
//! only get [`Progress`] values by copy, so they cannot influence the
//! estimation. Any `FnMut(Progress)` closure is a reporter.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::errors::{ErrorCode, RankError, Result, SpecError};

/// A progress notification from an estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Random walks finished so far.
    Walks { completed: usize, total: usize },
    /// A distribution iteration finished with the given delta. `cap` is the
    /// most iterations the run may take.
    Iteration {
        iteration: usize,
        delta: f64,
        cap: usize,
    },
}

impl Progress {
    /// Fraction of the maximum work done, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let (done, total) = match *self {
            Self::Walks { completed, total } => (completed, total),
            Self::Iteration { iteration, cap, .. } => (iteration, cap),
        };
        if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).clamp(0.0, 1.0)
        }
    }
}

/// Receives progress notifications.
pub trait ProgressReporter {
    fn report(&mut self, progress: Progress);
}

impl<F> ProgressReporter for F
where
    F: FnMut(Progress),
{
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    #[inline]
    fn report(&mut self, _progress: Progress) {
        // Intentionally empty.
    }
}

/// Records every notification in order.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    pub events: Vec<Progress>,
}

impl ProgressReporter for ProgressLog {
    fn report(&mut self, progress: Progress) {
        self.events.push(progress);
    }
}

/// Default line width of a [`ProgressBar`].
pub const DEFAULT_BAR_WIDTH: usize = 80;

/// Widest status text the bar can show, used to check the title fits.
const WIDEST_STATUS: &str = " (100% 99:59) ";

/// Single-line text progress bar: `title (42% 01:05) [#####.....]`
///
/// The line is redrawn in place with `\r`, at most once per percent.
/// Write failures do not abort the estimation; the first one is kept and
/// can be inspected with [`ProgressBar::error`].
pub struct ProgressBar<W: Write> {
    out: W,
    title: String,
    width: usize,
    start: Instant,
    last_percent: Option<u32>,
    error: Option<io::Error>,
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W, title: impl Into<String>) -> Result<Self> {
        Self::with_width(out, title, DEFAULT_BAR_WIDTH)
    }

    /// Fails when the title leaves no room for the bar itself.
    pub fn with_width(out: W, title: impl Into<String>, width: usize) -> Result<Self> {
        let title = title.into();
        if title.chars().count() + WIDEST_STATUS.len() + 3 >= width {
            return Err(RankError::InvalidConfig(
                SpecError::new(
                    ErrorCode::InvalidValue,
                    "/progress/width",
                    format!("progress bar title \"{title}\" does not fit in {width} columns"),
                )
                .with_hint("Shorten the title or increase the width"),
            ));
        }
        Ok(Self {
            out,
            title,
            width,
            start: Instant::now(),
            last_percent: None,
            error: None,
        })
    }

    /// The bar line for a given completed fraction and elapsed time.
    pub fn render(&self, fraction: f64, elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        let status = format!(
            "{} ({:.0}% {:02}:{:02}) ",
            self.title,
            fraction * 100.0,
            secs / 60,
            secs % 60
        );
        let bar_width = self.width.saturating_sub(status.chars().count() + 3);
        let full = ((bar_width as f64 * fraction) as usize).min(bar_width);
        format!(
            "{status}[{}{}]",
            "#".repeat(full),
            ".".repeat(bar_width - full)
        )
    }

    /// Clear the bar line.
    pub fn finish(&mut self) {
        let blank = " ".repeat(self.width);
        let result = write!(self.out, "\r{blank}\r").and_then(|_| self.out.flush());
        self.keep_error(result);
    }

    /// First write error seen, if any.
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> ProgressReporter for ProgressBar<W> {
    fn report(&mut self, progress: Progress) {
        let fraction = progress.fraction();
        let percent = (fraction * 100.0) as u32;
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);

        let line = self.render(fraction, self.start.elapsed());
        let result = write!(self.out, "\r{line}").and_then(|_| self.out.flush());
        self.keep_error(result);
    }
}
