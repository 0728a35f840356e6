//! Message styling for CLI output.
//!
//! Provides consistent prefixes, colors, and formatting for all CLI messages.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |
//! | `[skip]` | Skipped | Dim |

use owo_colors::OwoColorize;

use cinedex_core::IndexHealth;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Success - operation completed successfully
    Ok,
    /// Error - operation failed, cannot continue
    Err,
    /// Warning - operation succeeded with caveats
    Warn,
    /// Information - neutral status or progress update
    Info,
    /// Hint - actionable next step or tip
    Hint,
    /// Skipped - item was intentionally not processed
    Skip,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
            Self::Skip => "[skip]",
        }
    }
}

/// Main styling interface for CLI output.
///
/// # Example
///
/// ```ignore
/// let style = Style::new(ColorMode::Never);
/// println!("{}", style.message(MessageType::Ok, "Added movie 7"));
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
    quiet: bool,
}

impl Style {
    /// Create a Style instance with an explicit color mode.
    pub fn new(color_mode: ColorMode) -> Self {
        Self {
            color_mode,
            quiet: false,
        }
    }

    /// Suppress `[info]` and `[hint]` lines.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Get the current color mode.
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Whether informational output is suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Format a simple message with a type prefix.
    ///
    /// ```ignore
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(style.message(MessageType::Ok, "Done"), "[ok] Done");
    /// ```
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
                MessageType::Skip => prefix.dimmed().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Print a message to stdout, unless quiet mode hides its type.
    pub fn print(&self, msg_type: MessageType, text: &str) {
        if self.quiet && matches!(msg_type, MessageType::Info | MessageType::Hint) {
            return;
        }
        println!("{}", self.message(msg_type, text));
    }

    /// Format a detail line with 5-space indentation.
    ///
    /// ```ignore
    /// assert_eq!(style.message_detail("Indexed", "14 movies"), "     Indexed: 14 movies");
    /// ```
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    /// Format a section header.
    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a structured error with optional cause and hint.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }

    /// Format a list item with a prefix marker.
    pub fn list_item(&self, prefix: &str, text: &str) -> String {
        let styled_prefix = if self.colors_enabled() {
            match prefix {
                "+" => prefix.green().to_string(),
                "-" => prefix.red().to_string(),
                _ => prefix.to_string(),
            }
        } else {
            prefix.to_string()
        };
        format!("  {} {}", styled_prefix, text)
    }

    /// Format a key-value pair with optional coloring.
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.colors_enabled() {
            format!("{}: {}", key.dimmed(), value)
        } else {
            format!("{}: {}", key, value)
        }
    }

    /// Format a movie id (`#42`, colored yellow).
    pub fn movie_id(&self, id: i64) -> String {
        let text = format!("#{}", id);
        if self.colors_enabled() {
            text.yellow().to_string()
        } else {
            text
        }
    }

    /// Format a similarity value with color based on magnitude.
    ///
    /// - >= 0.6: green
    /// - >= 0.3: yellow
    /// - < 0.3: red
    pub fn similarity(&self, value: f32) -> String {
        let formatted = format!("{:.3}", value);
        if self.colors_enabled() {
            if value >= 0.6 {
                formatted.green().to_string()
            } else if value >= 0.3 {
                formatted.yellow().to_string()
            } else {
                formatted.red().to_string()
            }
        } else {
            formatted
        }
    }

    /// Format an index health label.
    pub fn health(&self, health: &IndexHealth) -> String {
        let label = match health {
            IndexHealth::InSync => "in sync",
            IndexHealth::Drifted => "drifted",
            IndexHealth::Unavailable => "unavailable",
            IndexHealth::Disabled => "disabled",
        };
        if !self.colors_enabled() {
            return label.to_string();
        }
        match health {
            IndexHealth::InSync => label.green().to_string(),
            IndexHealth::Drifted => label.yellow().to_string(),
            IndexHealth::Unavailable => label.red().to_string(),
            IndexHealth::Disabled => label.dimmed().to_string(),
        }
    }
}
