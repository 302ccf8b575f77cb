//! Terminal progress bars for the engine's reporter interface

use indicatif::{ProgressBar, ProgressStyle};
use vdiff_core::Progress;

/// An indicatif-backed reporter. The bar's length is taken from the
/// first report, so phases don't need to pre-announce their totals.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{msg:>16} [{bar:25}] {pos}/{len} ({per_sec}, eta {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("■■ "),
        );
        bar.set_message(label.to_string());
        Self { bar }
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn report(&self, current: u64, total: u64) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
    }
}
