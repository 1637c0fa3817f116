//! Progress reporting for pipeline stages.
//!
//! The CLI uses `IndicatifReporter` for a spinner on stderr.
//! Library callers can use `NoopReporter` or provide their own implementation.

use indicatif::{ProgressBar, ProgressStyle};

/// Trait for reporting progress of pipeline stages.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new stage with an optional total count.
    fn start(&self, stage: &str, total: Option<u64>);

    /// Advance progress by the given amount.
    fn advance(&self, amount: u64);

    /// Mark the current stage as finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _stage: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by an `indicatif` progress bar for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    /// A reporter whose bar never draws. Used when output is quiet.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, stage: &str, total: Option<u64>) {
        let template = if total.is_some() {
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}"
        } else {
            "{spinner:.green} {msg}"
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            self.bar.set_style(style.progress_chars("=> "));
        }
        self.bar.set_length(total.unwrap_or(0));
        self.bar.set_message(stage.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_is_silent() {
        let reporter = NoopReporter;
        reporter.start("extract", Some(3));
        reporter.advance(1);
        reporter.message("hello");
        reporter.finish();
    }

    #[test]
    fn indicatif_reporter_counts_per_stage() {
        let reporter = IndicatifReporter::hidden();
        reporter.start("extract", Some(10));
        reporter.advance(4);
        reporter.advance(6);
        assert_eq!(reporter.bar.position(), 10);

        reporter.start("build", None);
        assert_eq!(reporter.bar.position(), 0);
        reporter.finish();
    }
}
