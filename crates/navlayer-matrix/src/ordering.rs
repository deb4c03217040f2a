//! Sort and scope rules
//!
//! Scores reach ordering (and later color resolution) through a
//! [`ScoreOverlay`] built per export. Nothing here writes to a [`Matrix`];
//! [`adjust_ordering`] returns a reordered copy.

use crate::matrix::{FrameworkEntry, Matrix};
use navlayer_model::{Annotation, SortMode, TacticScope};

/// Per-export score lookup: `(technique id, scope) → score`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreOverlay {
    entries: Vec<(String, TacticScope, f64)>,
}

impl ScoreOverlay {
    /// Empty overlay
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay from annotations carrying a score, in document order
    #[must_use]
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        Self {
            entries: annotations
                .iter()
                .filter_map(|a| a.score.map(|s| (a.technique_id.clone(), a.scope(), s)))
                .collect(),
        }
    }

    /// Add an entry after the existing ones
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, scope: TacticScope, score: f64) -> Self {
        self.entries.push((id.into(), scope, score));
        self
    }

    /// Score for an occurrence; the first matching entry wins
    #[must_use]
    pub fn lookup(&self, id: &str, column_tactic: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(eid, scope, _)| eid == id && scope.matches(column_tactic))
            .map(|(_, _, score)| *score)
    }

    /// Score for an occurrence, 0 when absent
    #[inline]
    #[must_use]
    pub fn score_or_default(&self, id: &str, column_tactic: &str) -> f64 {
        self.lookup(id, column_tactic).unwrap_or(0.0)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `(id, tactic-or-wildcard)` rule matched against technique occurrences
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeRule {
    pub id: String,
    pub scope: TacticScope,
}

impl ScopeRule {
    /// Rule for an id in every column
    pub fn any(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: TacticScope::Any,
        }
    }

    /// Rule for an id in one tactic's column
    pub fn only(id: impl Into<String>, tactic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: TacticScope::Only(tactic.into()),
        }
    }

    /// Match an occurrence of `id` in the column for `column_tactic`
    #[inline]
    #[must_use]
    pub fn matches(&self, id: &str, column_tactic: &str) -> bool {
        self.id == id && self.scope.matches(column_tactic)
    }
}

/// Any rule in `rules` matches the occurrence
#[must_use]
pub fn is_excluded(rules: &[ScopeRule], id: &str, column_tactic: &str) -> bool {
    rules.iter().any(|r| r.matches(id, column_tactic))
}

/// Which parents show their sub-techniques
///
/// Only decides child expansion; never which parent rows exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionRules {
    expand_all: bool,
    rules: Vec<ScopeRule>,
}

impl ExpansionRules {
    /// Nothing expanded
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Every parent expanded
    #[must_use]
    pub fn all() -> Self {
        Self {
            expand_all: true,
            rules: Vec::new(),
        }
    }

    /// Expand exactly the matching occurrences
    #[must_use]
    pub fn from_rules(rules: Vec<ScopeRule>) -> Self {
        Self {
            expand_all: false,
            rules,
        }
    }

    /// Rules from annotations with `showSubtechniques: true`
    #[must_use]
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        Self::from_rules(
            annotations
                .iter()
                .filter(|a| a.show_subtechniques == Some(true))
                .map(|a| ScopeRule {
                    id: a.technique_id.clone(),
                    scope: a.scope(),
                })
                .collect(),
        )
    }

    /// Whether the occurrence of `id` in `column_tactic` is expanded
    #[must_use]
    pub fn expands(&self, id: &str, column_tactic: &str) -> bool {
        self.expand_all || is_excluded(&self.rules, id, column_tactic)
    }
}

/// Reorder techniques and sub-techniques in every column
///
/// - `Alphabetical`: unchanged
/// - `Reversed`: reverses whatever order the input has
/// - `ScoreAscending` / `ScoreDescending`: stable sort by overlay score
///   (0 when unscored); ties keep their input order
#[must_use]
pub fn adjust_ordering(matrix: &Matrix, mode: SortMode, overlay: &ScoreOverlay) -> Matrix {
    let mut out = matrix.clone();
    if mode == SortMode::Alphabetical {
        return out;
    }

    for column in &mut out.columns {
        let tactic = column.short_name.clone();
        reorder(&mut column.techniques, mode, overlay, &tactic);
        for children in column.subtechniques.values_mut() {
            reorder(children, mode, overlay, &tactic);
        }
    }
    tracing::debug!(mode = %mode, columns = out.columns.len(), "ordering adjusted");
    out
}

fn reorder(entries: &mut [FrameworkEntry], mode: SortMode, overlay: &ScoreOverlay, tactic: &str) {
    let score = |e: &FrameworkEntry| overlay.score_or_default(&e.id, tactic);
    match mode {
        SortMode::Alphabetical => {}
        SortMode::Reversed => entries.reverse(),
        SortMode::ScoreAscending => entries.sort_by(|a, b| score(a).total_cmp(&score(b))),
        SortMode::ScoreDescending => entries.sort_by(|a, b| score(b).total_cmp(&score(a))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TacticColumn;
    use indexmap::IndexMap;
    use navlayer_model::Domain;
    use pretty_assertions::assert_eq;

    fn column(short: &str, ids: &[&str]) -> TacticColumn {
        TacticColumn {
            tactic: FrameworkEntry::new(short.to_uppercase(), short),
            short_name: short.into(),
            techniques: ids.iter().map(|id| FrameworkEntry::new(*id, *id)).collect(),
            subtechniques: IndexMap::new(),
        }
    }

    fn ids(matrix: &Matrix, col: usize) -> Vec<&str> {
        matrix.columns[col].techniques.iter().map(|t| t.id.as_str()).collect()
    }

    fn matrix() -> Matrix {
        Matrix {
            domain: Domain::Enterprise,
            edition: "test".into(),
            columns: vec![
                column("persistence", &["T1", "T2", "T3", "T4"]),
                column("execution", &["T2", "T5"]),
            ],
        }
    }

    #[test]
    fn alphabetical_is_identity() {
        let m = matrix();
        assert_eq!(adjust_ordering(&m, SortMode::Alphabetical, &ScoreOverlay::new()), m);
    }

    #[test]
    fn reversed_reverses_current_order() {
        let m = matrix();
        let once = adjust_ordering(&m, SortMode::Reversed, &ScoreOverlay::new());
        assert_eq!(ids(&once, 0), vec!["T4", "T3", "T2", "T1"]);
        // applied twice it restores the input, it does not recompute
        let twice = adjust_ordering(&once, SortMode::Reversed, &ScoreOverlay::new());
        assert_eq!(twice, m);
    }

    #[test]
    fn score_sort_is_stable_and_scoped() {
        let overlay = ScoreOverlay::new()
            .with("T3", TacticScope::Any, 5.0)
            .with("T2", TacticScope::Only("execution".into()), 9.0);

        let asc = adjust_ordering(&matrix(), SortMode::ScoreAscending, &overlay);
        // unscored entries tie at 0 and keep input order
        assert_eq!(ids(&asc, 0), vec!["T1", "T2", "T4", "T3"]);
        assert_eq!(ids(&asc, 1), vec!["T5", "T2"]);

        let desc = adjust_ordering(&matrix(), SortMode::ScoreDescending, &overlay);
        assert_eq!(ids(&desc, 0), vec!["T3", "T1", "T2", "T4"]);
        assert_eq!(ids(&desc, 1), vec!["T2", "T5"]);
    }

    #[test]
    fn first_matching_overlay_entry_wins() {
        let overlay = ScoreOverlay::new()
            .with("T1", TacticScope::Only("persistence".into()), 1.0)
            .with("T1", TacticScope::Any, 7.0);
        assert_eq!(overlay.lookup("T1", "persistence"), Some(1.0));
        assert_eq!(overlay.lookup("T1", "execution"), Some(7.0));
        assert_eq!(overlay.lookup("T9", "execution"), None);
    }

    #[test]
    fn overlay_from_annotations_skips_unscored() {
        let overlay = ScoreOverlay::from_annotations(&[
            Annotation::new("T1110").with_comment("no score"),
            Annotation::new("T1110").with_tactic("credential-access").with_score(4.0),
        ]);
        assert_eq!(overlay.lookup("T1110", "credential-access"), Some(4.0));
        assert_eq!(overlay.lookup("T1110", "impact"), None);
    }

    #[test]
    fn scope_rules() {
        let rules = vec![ScopeRule::only("T2", "execution"), ScopeRule::any("T4")];
        assert!(is_excluded(&rules, "T2", "execution"));
        assert!(!is_excluded(&rules, "T2", "persistence"));
        assert!(is_excluded(&rules, "T4", "anything"));
    }

    #[test]
    fn expansion_from_annotations() {
        let rules = ExpansionRules::from_annotations(&[
            Annotation::new("T1110").with_tactic("credential-access").with_subtechniques_shown(true),
            Annotation::new("T1078").with_subtechniques_shown(false),
        ]);
        assert!(rules.expands("T1110", "credential-access"));
        assert!(!rules.expands("T1110", "impact"));
        assert!(!rules.expands("T1078", "persistence"));
        assert!(ExpansionRules::all().expands("T1078", "persistence"));
        assert!(!ExpansionRules::none().expands("T1078", "persistence"));
    }
}
