use crate::models::DictionaryRow;
use crate::services::warehouse_client::WarehouseClient;

/// Substituted when no catalogued pattern matches the detected text.
pub const NO_MATCH_SENTINEL: &str = "None.";

/// Catalog mapping anti-pattern names to a fixed problem/remediation block.
///
/// Entries keep their load order so narrowed output is deterministic; the
/// catalog is loaded once per run and read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct MasterDictionary {
    entries: Vec<(String, String)>,
}

impl MasterDictionary {
    pub fn from_rows(rows: Vec<DictionaryRow>) -> Self {
        let entries = rows
            .into_iter()
            .map(|row| {
                let block = format!(
                    "■ {}\n  - Problem: {}\n  - Remediation: {}",
                    row.pattern_name, row.problem_description, row.best_practice
                );
                (row.pattern_name, block)
            })
            .collect();
        Self { entries }
    }

    /// Load the catalog from the audit master table. Failure degrades to an
    /// empty dictionary; narrowing then always yields the "none" sentinel.
    pub async fn load(client: &WarehouseClient, source_project: &str) -> Self {
        tracing::info!("Loading anti-pattern master dictionary...");
        let sql = format!(
            "SELECT pattern_name, problem_description, best_practice \
             FROM `{}.audit_master.antipattern_master`",
            source_project
        );

        match client.query::<DictionaryRow>(source_project, &sql, None).await {
            Ok(rows) => {
                let dictionary = Self::from_rows(rows);
                tracing::info!("Loaded {} patterns into memory.", dictionary.len());
                dictionary
            },
            Err(e) => {
                tracing::error!("Failed to load master dictionary: {}", e);
                Self::default()
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Blocks for every pattern name appearing as a literal substring of
    /// `detected_text`, concatenated in dictionary order.
    pub fn narrow(&self, detected_text: &str) -> String {
        if detected_text.is_empty() || self.entries.is_empty() {
            return NO_MATCH_SENTINEL.to_string();
        }

        let relevant: Vec<&str> = self
            .entries
            .iter()
            .filter(|(name, _)| detected_text.contains(name.as_str()))
            .map(|(_, block)| block.as_str())
            .collect();

        if relevant.is_empty() {
            NO_MATCH_SENTINEL.to_string()
        } else {
            relevant.join("\n\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> MasterDictionary {
        MasterDictionary::from_rows(vec![
            DictionaryRow {
                pattern_name: "CROSS_JOIN".to_string(),
                problem_description: "Unbounded row explosion".to_string(),
                best_practice: "Use an explicit join predicate".to_string(),
            },
            DictionaryRow {
                pattern_name: "SELECT_STAR".to_string(),
                problem_description: "Scans every column".to_string(),
                best_practice: "Project only needed columns".to_string(),
            },
        ])
    }

    #[test]
    fn test_narrow_keeps_only_detected_patterns() {
        let narrowed = dictionary().narrow("Recommendations: CROSS_JOIN on line 3");
        assert!(narrowed.contains("CROSS_JOIN"));
        assert!(narrowed.contains("Unbounded row explosion"));
        assert!(!narrowed.contains("SELECT_STAR"));
    }

    #[test]
    fn test_narrow_concatenates_in_dictionary_order() {
        let narrowed = dictionary().narrow("SELECT_STAR then CROSS_JOIN");
        let cross = narrowed.find("CROSS_JOIN").unwrap();
        let star = narrowed.find("SELECT_STAR").unwrap();
        assert!(cross < star);
    }

    #[test]
    fn test_narrow_without_match_is_sentinel() {
        assert_eq!(dictionary().narrow("No anti-patterns found."), NO_MATCH_SENTINEL);
    }

    #[test]
    fn test_narrow_empty_inputs_are_sentinel() {
        assert_eq!(dictionary().narrow(""), NO_MATCH_SENTINEL);
        assert_eq!(MasterDictionary::default().narrow("CROSS_JOIN"), NO_MATCH_SENTINEL);
    }
}
