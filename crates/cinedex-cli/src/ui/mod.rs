//! # CLI UI Module
//!
//! Styling and formatting layer for cinedex CLI output.
//!
//! Human output uses bracketed prefixes (`[ok]`, `[warn]`, ...) and plain
//! tables; every command also has a `--json` form for scripting. Colors
//! follow `--color` and respect `NO_COLOR`.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Utility formatters (durations, counts, truncation)
//! - `table`: Movie tables rendered with comfy-table
//! - `progress`: Spinner for long operations

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use progress::{Progress, ProgressMode};
pub use style::{MessageType, Style};
