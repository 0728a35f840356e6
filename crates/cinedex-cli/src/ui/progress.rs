//! Spinner for long-running CLI operations (model loading, reindex).
//!
//! Built on `indicatif`. The spinner draws to stderr only in interactive
//! mode; quiet, piped and `--json` runs get a hidden bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: show an animated spinner
    Interactive,
    /// Non-TTY or `--quiet`: suppress progress, show only final results
    Quiet,
    /// Machine-readable: no progress at all (for `--json`)
    Silent,
}

impl ProgressMode {
    /// Detect the appropriate mode from flags and the terminal.
    pub fn detect(quiet: bool, json: bool) -> Self {
        if json {
            Self::Silent
        } else if quiet || !atty::is(atty::Stream::Stderr) {
            Self::Quiet
        } else {
            Self::Interactive
        }
    }

    /// Check if progress should be shown.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// An indeterminate spinner.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Start a spinner with `message`.
    ///
    /// ```ignore
    /// let progress = Progress::spinner("Rebuilding index...", mode);
    /// let report = engine.reindex();
    /// progress.finish_clear();
    /// ```
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        if !mode.is_interactive() {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars(SPINNER_CHARS)
            .template("{spinner:.cyan} {msg} ({elapsed})")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Update the message while running.
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Finish and clear the spinner line.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_mode_detection() {
        assert_eq!(ProgressMode::detect(false, true), ProgressMode::Silent);
        assert_eq!(ProgressMode::detect(true, true), ProgressMode::Silent);
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Quiet);
    }

    #[test]
    fn test_progress_mode_is_interactive() {
        assert!(ProgressMode::Interactive.is_interactive());
        assert!(!ProgressMode::Quiet.is_interactive());
        assert!(!ProgressMode::Silent.is_interactive());
    }

    #[test]
    fn test_hidden_spinner() {
        let progress = Progress::spinner("Rebuilding index...", ProgressMode::Quiet);
        progress.set_message("Embedding movies...");
        progress.finish_clear();
    }
}
