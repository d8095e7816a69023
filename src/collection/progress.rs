//! Reporting the progress of a collection.

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// Something following the progress of a collection.
/// It's told the number of items to process, then advanced once per item
/// processed, whether it succeeded or failed.
pub trait ProgressReporter: Send + Sync {
    /// The collection starts with `total` items.
    fn start(&self, total: u64);

    /// One more item has been processed.
    fn advance(&self);

    /// The collection is over. `remaining` items were not processed because
    /// the collection stopped early.
    fn finish(&self, processed: u64, remaining: u64);
}

/// Reports the progress with a progress bar on the terminal.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(label.to_string());
        BarReporter { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish(&self, processed: u64, remaining: u64) {
        self.bar.finish_and_clear();
        info!("{} processed, {} remaining", processed, remaining);
    }
}

/// Reports nothing, used when the output isn't a terminal.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn start(&self, _total: u64) {}

    fn advance(&self) {}

    fn finish(&self, processed: u64, remaining: u64) {
        info!("{} processed, {} remaining", processed, remaining);
    }
}
