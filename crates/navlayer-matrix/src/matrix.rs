//! Built framework hierarchy
//!
//! Tactic columns in framework order, each holding alphabetically ordered
//! top-level techniques and their sub-techniques keyed by parent id. A built
//! [`Matrix`] is read-only; ordering produces a new one.

use indexmap::IndexMap;
use navlayer_model::Domain;
use serde::{Deserialize, Serialize};

/// Identity of a tactic, technique or sub-technique
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkEntry {
    pub id: String,
    pub name: String,
}

impl FrameworkEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One tactic and the techniques under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticColumn {
    pub tactic: FrameworkEntry,
    /// Kill-chain phase name (`credential-access`)
    pub short_name: String,
    pub techniques: Vec<FrameworkEntry>,
    pub subtechniques: IndexMap<String, Vec<FrameworkEntry>>,
}

impl TacticColumn {
    /// Sub-techniques of a parent in this column
    #[must_use]
    pub fn children(&self, parent_id: &str) -> &[FrameworkEntry] {
        self.subtechniques.get(parent_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Top-level technique or sub-technique listed in this column
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&FrameworkEntry> {
        self.techniques
            .iter()
            .chain(self.subtechniques.values().flatten())
            .find(|e| e.id == id)
    }
}

/// Framework hierarchy for one domain and edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub domain: Domain,
    pub edition: String,
    pub columns: Vec<TacticColumn>,
}

impl Matrix {
    /// Column for a tactic short name
    #[must_use]
    pub fn column(&self, short_name: &str) -> Option<&TacticColumn> {
        self.columns.iter().find(|c| c.short_name == short_name)
    }

    /// Display name for an id (technique, sub-technique or tactic)
    #[must_use]
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.columns.iter().find_map(|c| {
            if c.tactic.id == id {
                Some(c.tactic.name.as_str())
            } else {
                c.find(id).map(|e| e.name.as_str())
            }
        })
    }

    /// Id for a display name; first match in column order
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.columns.iter().find_map(|c| {
            if c.tactic.name == name {
                Some(c.tactic.id.as_str())
            } else {
                c.techniques
                    .iter()
                    .chain(c.subtechniques.values().flatten())
                    .find(|e| e.name == name)
                    .map(|e| e.id.as_str())
            }
        })
    }

    /// Short name for a tactic display name
    #[must_use]
    pub fn tactic_short_name(&self, display: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.tactic.name == display)
            .map(|c| c.short_name.as_str())
    }

    /// Display name for a tactic short name
    #[must_use]
    pub fn tactic_display_name(&self, short_name: &str) -> Option<&str> {
        self.column(short_name).map(|c| c.tactic.name.as_str())
    }

    /// Whether an id appears, optionally only under one tactic
    #[must_use]
    pub fn contains(&self, id: &str, tactic: Option<&str>) -> bool {
        self.columns
            .iter()
            .filter(|c| tactic.map_or(true, |t| c.short_name == t))
            .any(|c| c.find(id).is_some())
    }

    /// Tactic short names under which an id appears
    #[must_use]
    pub fn tactics_of(&self, id: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.find(id).is_some())
            .map(|c| c.short_name.as_str())
            .collect()
    }

    /// Total technique occurrences (top-level plus sub-techniques)
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.techniques.len() + c.subtechniques.values().map(Vec::len).sum::<usize>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Matrix {
        let mut subs = IndexMap::new();
        subs.insert(
            "T1110".to_string(),
            vec![FrameworkEntry::new("T1110.001", "Password Guessing")],
        );
        Matrix {
            domain: Domain::Enterprise,
            edition: "test".into(),
            columns: vec![
                TacticColumn {
                    tactic: FrameworkEntry::new("TA0006", "Credential Access"),
                    short_name: "credential-access".into(),
                    techniques: vec![FrameworkEntry::new("T1110", "Brute Force")],
                    subtechniques: subs,
                },
                TacticColumn {
                    tactic: FrameworkEntry::new("TA0040", "Impact"),
                    short_name: "impact".into(),
                    techniques: vec![],
                    subtechniques: IndexMap::new(),
                },
            ],
        }
    }

    #[test]
    fn name_and_id_resolution() {
        let m = matrix();
        assert_eq!(m.name_of("T1110.001"), Some("Password Guessing"));
        assert_eq!(m.name_of("TA0040"), Some("Impact"));
        assert_eq!(m.id_of("Brute Force"), Some("T1110"));
        assert_eq!(m.name_of("T9999"), None);
    }

    #[test]
    fn tactic_conversion() {
        let m = matrix();
        assert_eq!(m.tactic_short_name("Credential Access"), Some("credential-access"));
        assert_eq!(m.tactic_display_name("impact"), Some("Impact"));
    }

    #[test]
    fn scoped_containment() {
        let m = matrix();
        assert!(m.contains("T1110.001", None));
        assert!(m.contains("T1110", Some("credential-access")));
        assert!(!m.contains("T1110", Some("impact")));
        assert_eq!(m.tactics_of("T1110"), vec!["credential-access"]);
        assert_eq!(m.occurrence_count(), 2);
        assert!(m.column("impact").unwrap().children("T1110").is_empty());
    }
}
