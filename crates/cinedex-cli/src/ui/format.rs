//! Formatting utilities for CLI output.
//!
//! Provides consistent formatting for durations, counts, and text truncation.

use chrono::{DateTime, Utc};

/// Format a duration in milliseconds (`850 ms`, `2.4 s`, `3m 05s`).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_duration_ms(850), "850 ms");
/// assert_eq!(format_duration_ms(2_400), "2.4 s");
/// ```
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{} ms", ms)
    } else if ms < 60_000 {
        format!("{:.1} s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string to at most `max_len` characters, ending in `...`.
///
/// Counts characters, not bytes, so multi-byte titles are never split.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_str("Alien", 10), "Alien");
/// assert_eq!(truncate_str("The Lord of the Rings", 10), "The Lor...");
/// ```
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

/// Format a number with thousands separators.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_thousands(1000), "1,000");
/// assert_eq!(format_thousands(1234567), "1,234,567");
/// ```
pub fn format_thousands(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let len = s.len();

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// `"1 movie"`, `"3 movies"`.
pub fn count_noun(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", format_thousands(count), noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(0), "0 ms");
        assert_eq!(format_duration_ms(850), "850 ms");
        assert_eq!(format_duration_ms(1_000), "1.0 s");
        assert_eq!(format_duration_ms(2_400), "2.4 s");
        assert_eq!(format_duration_ms(185_000), "3m 05s");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-09 07:05:00 UTC");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Alien", 10), "Alien");
        assert_eq!(truncate_str("Alien", 5), "Alien");
        assert_eq!(truncate_str("The Lord of the Rings", 10), "The Lor...");
        assert_eq!(truncate_str("Amélie Poulain", 8), "Améli...");
        assert_eq!(truncate_str("Heat", 3), "...");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_count_noun() {
        assert_eq!(count_noun(1, "movie"), "1 movie");
        assert_eq!(count_noun(0, "movie"), "0 movies");
        assert_eq!(count_noun(1500, "movie"), "1,500 movies");
    }
}
