//! Audit time-window resolution.
//!
//! Turns the mutually-exclusive time-range configuration into the two query
//! fragments consumed verbatim by the worst-query template. Malformed
//! timestamp strings are not validated here; they surface as a downstream
//! query failure in the owning region.

use crate::config::TimeRangeConfig;

/// Concrete window fragments for the job-history predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Lower-bound timestamp expression.
    pub start_expr: String,
    /// Upper-bound clause; empty when the window is open-ended.
    pub end_clause: String,
}

/// Resolve the configured window. Precedence: relative interval, then
/// explicit start (with optional end), then a one-day default.
pub fn resolve(config: &TimeRangeConfig) -> TimeWindow {
    if let Some(interval) = config.interval.as_deref().filter(|s| !s.is_empty()) {
        return TimeWindow {
            start_expr: format!("TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {})", interval),
            end_clause: String::new(),
        };
    }

    if let Some(start) = config.start.as_deref().filter(|s| !s.is_empty()) {
        let end_clause = match config.end.as_deref().filter(|s| !s.is_empty()) {
            Some(end) => format!("AND creation_time <= TIMESTAMP('{}')", end),
            None => String::new(),
        };
        return TimeWindow { start_expr: format!("TIMESTAMP('{}')", start), end_clause };
    }

    TimeWindow {
        start_expr: "TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 1 DAY)".to_string(),
        end_clause: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_interval_takes_precedence() {
        let config = TimeRangeConfig {
            interval: Some("2 DAY".to_string()),
            start: Some("2024-01-01".to_string()),
            end: Some("2024-01-02".to_string()),
        };
        let window = resolve(&config);
        assert_eq!(window.start_expr, "TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 2 DAY)");
        assert_eq!(window.end_clause, "");
    }

    #[test]
    fn test_explicit_start_and_end() {
        let config = TimeRangeConfig {
            interval: None,
            start: Some("2024-01-01".to_string()),
            end: Some("2024-01-02".to_string()),
        };
        let window = resolve(&config);
        assert_eq!(window.start_expr, "TIMESTAMP('2024-01-01')");
        assert_eq!(window.end_clause, "AND creation_time <= TIMESTAMP('2024-01-02')");
    }

    #[test]
    fn test_explicit_start_without_end_is_open_ended() {
        let config = TimeRangeConfig {
            interval: None,
            start: Some("2024-01-01".to_string()),
            end: None,
        };
        let window = resolve(&config);
        assert_eq!(window.start_expr, "TIMESTAMP('2024-01-01')");
        assert_eq!(window.end_clause, "");
    }

    #[test]
    fn test_default_is_one_day_open_ended() {
        let window = resolve(&TimeRangeConfig::default());
        assert_eq!(window.start_expr, "TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 1 DAY)");
        assert_eq!(window.end_clause, "");
    }
}
