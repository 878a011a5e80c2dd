//! Extraction of the recommendation section from the analyzer's raw output.

/// Returned when the raw output carries no recommendation marker.
pub const NO_FINDINGS_SENTINEL: &str = "No anti-patterns found.";

const MARKER: &str = "Recommendations for query:";

/// Cut the analyzer's raw output down to its recommendation section: from
/// the literal marker through (but excluding) the next line beginning with
/// `-`, or end of output when no such line follows.
pub fn extract_recommendations(raw_output: &str) -> String {
    let start = match raw_output.find(MARKER) {
        Some(start) => start,
        None => return NO_FINDINGS_SENTINEL.to_string(),
    };

    let tail = &raw_output[start..];
    let section = match tail.find("\n-") {
        Some(end) => &tail[..end],
        None => tail,
    };
    section.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_is_cut_before_next_dash_line() {
        let raw = "startup noise\nRecommendations for query: X\n- next section";
        assert_eq!(extract_recommendations(raw), "Recommendations for query: X");
    }

    #[test]
    fn test_section_runs_to_end_without_dash_line() {
        let raw = "Recommendations for query:\n  Use a partition filter on event_date.\n";
        assert_eq!(
            extract_recommendations(raw),
            "Recommendations for query:\n  Use a partition filter on event_date."
        );
    }

    #[test]
    fn test_multiline_section_keeps_inner_lines() {
        let raw = "Recommendations for query: q1\n  CROSS_JOIN: rewrite as INNER JOIN\n- done";
        assert_eq!(
            extract_recommendations(raw),
            "Recommendations for query: q1\n  CROSS_JOIN: rewrite as INNER JOIN"
        );
    }

    #[test]
    fn test_missing_marker_yields_sentinel() {
        assert_eq!(extract_recommendations("nothing to see here"), NO_FINDINGS_SENTINEL);
        assert_eq!(extract_recommendations(""), NO_FINDINGS_SENTINEL);
    }
}
