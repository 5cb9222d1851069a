//! Human-readable labels for ownership categories

use crate::types::{LabeledOwnershipRow, OwnershipRow};
use hashbrown::HashMap;

/// Investor type codes and their display names
pub const INVESTOR_NAMES: [(&str, &str); 9] = [
    ("ID", "Individual"),
    ("CP", "Corporate (Company)"),
    ("MF", "Mutual Fund"),
    ("IB", "Financial Institution"),
    ("IS", "Insurance"),
    ("SC", "Securities Company"),
    ("PF", "Pension Fund"),
    ("FD", "Foundation"),
    ("OT", "Others"),
];

/// Maps `"<Region> <Code>"` categories to `"<Region> <Name>"` labels
#[derive(Debug, Clone)]
pub struct CategoryLabeler {
    names: HashMap<String, String>,
}

impl Default for CategoryLabeler {
    fn default() -> Self {
        Self::with_names(
            INVESTOR_NAMES
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string())),
        )
    }
}

impl CategoryLabeler {
    /// Labeler with the standard investor names
    pub fn new() -> Self {
        Self::default()
    }

    /// Labeler with a custom code-to-name mapping (codes are case-sensitive)
    pub fn with_names<I, K, V>(names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Display name for an investor code, if mapped
    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(|s| s.as_str())
    }

    /// Label one category string
    ///
    /// Unknown codes keep the code itself; strings that are not exactly two
    /// whitespace-separated tokens come back unchanged.
    pub fn label(&self, category: &str) -> String {
        let mut tokens = category.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(region), Some(code), None) => {
                format!("{} {}", region, self.name(code).unwrap_or(code))
            }
            _ => category.to_string(),
        }
    }

    /// Attach labels to long rows
    pub fn apply(&self, rows: Vec<OwnershipRow>) -> Vec<LabeledOwnershipRow> {
        rows.into_iter()
            .map(|row| LabeledOwnershipRow {
                category_label: self.label(&row.category),
                date: row.date,
                code: row.code,
                category: row.category,
                shares: row.shares,
            })
            .collect()
    }

    /// Recompute labels in place from each row's `category`
    pub fn relabel(&self, rows: &mut [LabeledOwnershipRow]) {
        for row in rows {
            row.category_label = self.label(&row.category);
        }
    }
}

/// Label a category with the standard investor names
pub fn label_category(category: &str) -> String {
    CategoryLabeler::new().label(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_standard_labels() {
        let labeler = CategoryLabeler::new();
        assert_eq!(labeler.label("Local ID"), "Local Individual");
        assert_eq!(labeler.label("Foreign ID"), "Foreign Individual");
        assert_eq!(labeler.label("Local CP"), "Local Corporate (Company)");
        assert_eq!(labeler.label("Foreign IB"), "Foreign Financial Institution");
        assert_eq!(labeler.label("Local OT"), "Local Others");
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        assert_eq!(label_category("Unknown XX"), "Unknown XX");
        assert_eq!(label_category("Local xx"), "Local xx");
        // Codes are case-sensitive
        assert_eq!(label_category("Local id"), "Local id");
    }

    #[test]
    fn test_malformed_categories_pass_through() {
        assert_eq!(label_category("Total"), "Total");
        assert_eq!(label_category("Local ID Extra"), "Local ID Extra");
        assert_eq!(label_category(""), "");
    }

    #[test]
    fn test_whitespace_runs_split() {
        assert_eq!(label_category("Local   MF"), "Local Mutual Fund");
    }

    #[test]
    fn test_custom_names() {
        let labeler = CategoryLabeler::with_names(vec![("ID", "Individu")]);
        assert_eq!(labeler.label("Local ID"), "Local Individu");
        assert_eq!(labeler.label("Local MF"), "Local MF");
    }

    #[test]
    fn test_relabel_is_stable() {
        let labeler = CategoryLabeler::new();
        let rows = vec![OwnershipRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            code: "BBCA".to_string(),
            category: "Foreign PF".to_string(),
            shares: 5.0,
        }];

        let once = labeler.apply(rows);
        let mut twice = once.clone();
        labeler.relabel(&mut twice);
        assert_eq!(once, twice);
        assert_eq!(once[0].category_label, "Foreign Pension Fund");
    }
}
