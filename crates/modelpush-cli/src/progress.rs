//! Terminal reporter with a spinner while requests are in flight.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use modelpush_hub::Reporter;

/// Prints result lines to stdout and spins on stderr between them.
///
/// The spinner hides itself when stderr is not a terminal.
pub struct SpinnerReporter {
    spinner: ProgressBar,
}

impl SpinnerReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { spinner }
    }

    fn line(&self, text: String) {
        self.spinner.suspend(|| println!("{text}"));
    }

    fn stop(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Reporter for SpinnerReporter {
    fn progress(&self, message: &str) {
        self.line(message.to_string());
        self.spinner.set_message("Uploading...");
        self.spinner.enable_steady_tick(Duration::from_millis(100));
    }

    fn success(&self, message: &str) {
        self.stop();
        self.line(format!("✅ {message}"));
    }

    fn warning(&self, message: &str) {
        self.stop();
        self.line(format!("⚠️ Warning: {message}"));
    }

    fn failure(&self, message: &str) {
        self.stop();
        self.line(format!("❌ {message}"));
    }
}

impl Drop for SpinnerReporter {
    fn drop(&mut self) {
        self.stop();
    }
}
