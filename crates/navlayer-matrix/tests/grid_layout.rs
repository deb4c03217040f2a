//! Layout and ordering invariants over generated and fixture matrices

use indexmap::IndexMap;
use navlayer_matrix::prelude::*;
use navlayer_matrix::{plan_column, CellKind, TacticColumn};
use navlayer_model::{Domain, SortMode, TacticScope};
use navlayer_test_utils::{enterprise_bundle, technique_name, BUNDLE_ID};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const TACTICS: [&str; 3] = ["execution", "persistence", "discovery"];

fn synthetic(techniques_per_column: &[usize]) -> Matrix {
    let columns = techniques_per_column
        .iter()
        .zip(TACTICS)
        .map(|(count, short)| TacticColumn {
            tactic: FrameworkEntry::new(short, short),
            short_name: short.to_string(),
            // every column shares the same ids so scoped rules matter
            techniques: (0..*count)
                .map(|i| FrameworkEntry::new(format!("T10{i:02}"), format!("technique {i:02}")))
                .collect(),
            subtechniques: IndexMap::new(),
        })
        .collect();
    Matrix {
        domain: Domain::Enterprise,
        edition: "synthetic".into(),
        columns,
    }
}

fn column_ids(layout: &GridLayout, column: usize) -> Vec<String> {
    layout
        .grid
        .iter()
        .filter(|(at, cell)| at.column == column && cell.kind != CellKind::TacticHeader)
        .map(|(_, cell)| cell.id.clone())
        .collect()
}

fn technique_ids(matrix: &Matrix, column: usize) -> Vec<String> {
    matrix.columns[column].techniques.iter().map(|t| t.id.clone()).collect()
}

prop_compose! {
    fn matrix_and_exclusions()(counts in prop::collection::vec(0usize..10, 1..=3))
        (rules in prop::collection::vec((0usize..10, prop::option::of(0usize..3)), 0..8), counts in Just(counts))
        -> (Matrix, Vec<ScopeRule>)
    {
        let rules = rules
            .into_iter()
            .map(|(i, tactic)| match tactic {
                Some(t) => ScopeRule::only(format!("T10{i:02}"), TACTICS[t]),
                None => ScopeRule::any(format!("T10{i:02}")),
            })
            .collect();
        (synthetic(&counts), rules)
    }
}

proptest! {
    #[test]
    fn rows_per_column_are_survivors_plus_header((matrix, rules) in matrix_and_exclusions()) {
        let layout = build_grid(&matrix, &ExpansionRules::none(), &rules, LabelMode::Name);
        prop_assert!(layout.merges.is_empty());

        for (index, column) in matrix.columns.iter().enumerate() {
            let survivors = column
                .techniques
                .iter()
                .filter(|t| !rules.iter().any(|r| r.matches(&t.id, &column.short_name)))
                .count();
            let physical = index + 1;
            prop_assert_eq!(layout.grid.column_cells(physical).count(), survivors + 1);
            let plan = plan_column(column, &ExpansionRules::none(), &rules);
            prop_assert_eq!(plan.row_count(), survivors + 1);
        }
    }

    #[test]
    fn scoped_exclusion_stays_in_its_column(
        counts in prop::collection::vec(1usize..10, 3),
        target in 0usize..3,
        ids in prop::collection::hash_set(0usize..10, 0..10),
    ) {
        let matrix = synthetic(&counts);
        let rules: Vec<ScopeRule> = ids
            .iter()
            .map(|i| ScopeRule::only(format!("T10{i:02}"), TACTICS[target]))
            .collect();
        let layout = build_grid(&matrix, &ExpansionRules::none(), &rules, LabelMode::Name);

        for index in (0..3).filter(|i| *i != target) {
            prop_assert_eq!(column_ids(&layout, index + 1), technique_ids(&matrix, index));
        }
    }

    #[test]
    fn ascending_reversed_equals_descending_without_ties(
        scores in prop::collection::hash_set(-50i32..50, 1..10),
    ) {
        let scores: Vec<i32> = scores.into_iter().collect();
        let matrix = synthetic(&[scores.len()]);
        let overlay = scores.iter().enumerate().fold(ScoreOverlay::new(), |overlay, (i, s)| {
            overlay.with(format!("T10{i:02}"), TacticScope::Any, f64::from(*s))
        });

        let ascending = adjust_ordering(&matrix, SortMode::ScoreAscending, &overlay);
        let descending = adjust_ordering(&matrix, SortMode::ScoreDescending, &overlay);
        let mut reversed = technique_ids(&ascending, 0);
        reversed.reverse();
        prop_assert_eq!(reversed, technique_ids(&descending, 0));
    }

    #[test]
    fn ties_keep_alphabetical_order(count in 1usize..10, score in -5i32..5) {
        let matrix = synthetic(&[count]);
        let overlay = (0..count).fold(ScoreOverlay::new(), |overlay, i| {
            overlay.with(format!("T10{i:02}"), TacticScope::Any, f64::from(score))
        });
        for mode in [SortMode::ScoreAscending, SortMode::ScoreDescending] {
            let sorted = adjust_ordering(&matrix, mode, &overlay);
            prop_assert_eq!(technique_ids(&sorted, 0), technique_ids(&matrix, 0));
        }
    }
}

fn fixture_matrix() -> Arc<Matrix> {
    let store = MemoryStore::from_bundle(&enterprise_bundle()).unwrap();
    MatrixCache::default().get_or_build(&store, Domain::Enterprise).unwrap()
}

#[test]
fn fixture_matrix_follows_declared_tactic_order() {
    let matrix = fixture_matrix();
    assert_eq!(matrix.edition, BUNDLE_ID);
    let tactics: Vec<&str> = matrix.columns.iter().map(|c| c.short_name.as_str()).collect();
    assert_eq!(tactics, vec!["initial-access", "persistence", "credential-access", "impact"]);

    let credential = matrix.column("credential-access").unwrap();
    let names: Vec<&str> = credential.techniques.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Brute Force", "Credentials from Password Stores", "OS Credential Dumping"]
    );
    assert!(matrix.column("impact").unwrap().techniques.is_empty());
}

#[test]
fn inactive_and_foreign_techniques_never_appear() {
    let matrix = fixture_matrix();
    for id in ["T1208", "T1054", "T1411"] {
        assert!(!matrix.contains(id, None), "{id} should be filtered");
    }
    assert_eq!(matrix.tactics_of("T1078"), vec!["initial-access", "persistence"]);
    assert_eq!(matrix.name_of("T1110.003"), Some(technique_name("T1110.003")));
}

#[test]
fn brute_force_children_fill_the_deferred_column() {
    let matrix = fixture_matrix();
    let rules = ExpansionRules::from_rules(vec![ScopeRule::only("T1110", "credential-access")]);
    let layout = build_grid(&matrix, &rules, &[], LabelMode::Name);

    // credential-access is the third tactic; its children go one column right
    let children: Vec<(usize, String)> = layout
        .grid
        .column_cells(4)
        .map(|(at, cell)| (at.row, cell.label.clone()))
        .collect();
    assert_eq!(
        children,
        vec![
            (2, "Credential Stuffing".to_string()),
            (3, "Password Cracking".to_string()),
            (4, "Password Guessing".to_string()),
            (5, "Password Spraying".to_string()),
        ]
    );

    let group: Vec<&MergeRegion> = layout.merges.iter().filter(|m| m.col_span == 1).collect();
    assert_eq!(group.len(), 1);
    assert_eq!((group[0].start_row, group[0].row_span), (2, 4));
    assert!(layout
        .merges
        .contains(&MergeRegion { start_row: 1, column: 3, row_span: 1, col_span: 2 }));

    // impact starts two physical columns after credential access
    let impact = layout.grid.get(Coordinate::new(1, 5)).unwrap();
    assert_eq!(impact.id, "impact");
    assert_eq!(layout.grid.column_cells(5).count(), 1);

    // the next technique sits below the children
    assert_eq!(layout.grid.get(Coordinate::new(6, 3)).unwrap().id, "T1555");
}

#[test]
fn collapsed_subtechnique_is_hidden_not_absent() {
    let matrix = fixture_matrix();
    let layout = build_grid(&matrix, &ExpansionRules::none(), &[], LabelMode::Name);
    assert_eq!(
        find_coordinates(&layout, "T1110.001", Some("credential-access")),
        Placement::Hidden
    );
    assert_eq!(
        find_coordinates(&layout, "T1110.001", Some("persistence")),
        Placement::Absent
    );
    assert_eq!(
        find_coordinates(&layout, "T1110.999", Some("credential-access")),
        Placement::Absent
    );
    assert_eq!(find_coordinates(&layout, "T1078", None).coordinates().len(), 2);
}

#[test]
fn cache_shares_one_matrix_per_edition() {
    let store = MemoryStore::from_bundle(&enterprise_bundle()).unwrap();
    let cache = MatrixCache::new(4);
    let first = cache.get_or_build(&store, Domain::Enterprise).unwrap();
    let second = cache.get_or_build(&store, Domain::Enterprise).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let renamed = store.clone().with_edition("bundle--other");
    let third = cache.get_or_build(&renamed, Domain::Enterprise).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first.columns, third.columns);
    assert_eq!(cache.stats().entry_count, 2);

    cache.invalidate_all();
    assert_eq!(cache.stats().entry_count, 0);
}

#[test]
fn ordering_leaves_cached_matrix_untouched() {
    let matrix = fixture_matrix();
    let before = (*matrix).clone();
    let overlay = ScoreOverlay::new().with("T1555", TacticScope::Any, 9.0);
    let sorted = adjust_ordering(&matrix, SortMode::ScoreDescending, &overlay);
    assert_eq!(*matrix, before);
    assert_eq!(sorted.column("credential-access").unwrap().techniques[0].id, "T1555");
    let seen: HashSet<&str> = sorted.columns.iter().map(|c| c.short_name.as_str()).collect();
    assert_eq!(seen.len(), 4);
}
