//! Batch progress reporting.
//!
//! With the `progress` feature, [`BatchProgress`] draws an `indicatif` bar on
//! stderr that worker threads advance concurrently. Without the feature every
//! method is a no-op, so call sites stay free of `cfg` attributes.
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

pub(crate) struct BatchProgress {
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl BatchProgress {
    #[cfg(feature = "progress")]
    pub(crate) fn new(total: usize, label: &str) -> Self {
        let bar = ProgressBar::new(total.max(1) as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}",
        ) {
            bar.set_style(style);
        }
        bar.set_message(label.to_string());
        BatchProgress { bar }
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn new(_total: usize, _label: &str) -> Self {
        BatchProgress {}
    }

    /// Advance by one finished object. Safe to call from any worker thread.
    #[inline]
    pub(crate) fn tick(&self) {
        #[cfg(feature = "progress")]
        self.bar.inc(1);
    }

    pub(crate) fn finish(&self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}
