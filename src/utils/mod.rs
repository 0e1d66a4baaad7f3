pub mod logger;

/// Utility functions for the application
pub struct Utils;

impl Utils {
    /// Format duration in human readable format
    pub fn format_duration(seconds: u64) -> String {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }

    /// Format duration in milliseconds
    pub fn format_duration_ms(milliseconds: u64) -> String {
        Self::format_duration(milliseconds / 1000)
    }

    /// Group digits in threes: 1234567 → "1,234,567"
    pub fn format_count(count: u64) -> String {
        let digits = count.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, digit) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        grouped
    }

    /// Format a score with two decimals
    pub fn format_score(score: f64) -> String {
        format!("{:.2}", score)
    }

    /// Cut `text` to at most `max_chars` characters, marking the cut with "…"
    pub fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept.trim_end())
    }

    /// Format a duration given in seconds as e.g. "7d", "3h", "90s"
    pub fn format_ttl(seconds: u64) -> String {
        match seconds {
            s if s > 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
            s if s > 0 && s % 3_600 == 0 => format!("{}h", s / 3_600),
            s if s > 0 && s % 60 == 0 => format!("{}m", s / 60),
            s => format!("{}s", s),
        }
    }
}
