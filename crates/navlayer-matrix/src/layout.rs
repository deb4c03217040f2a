//! Tree-to-grid placement
//!
//! Each tactic column is laid out in two passes. [`plan_column`] decides,
//! without touching the grid, which techniques get a row and which parents
//! expand their sub-techniques; [`materialize`] then writes the cells and
//! merge regions for that plan.
//!
//! ```text
//!  col c            col c+1
//! ┌────────────────────────────┐
//! │ Credential Access          │  row 1  header span {1, c, 1, 2}
//! ├─────────────┬──────────────┤
//! │             │ Password ... │  row 2
//! │ Brute Force │ Password ... │  row 3  group merge {2, c, 4, 1}
//! │             │ Password ... │  row 4
//! │             │ Credential...│  row 5
//! ├─────────────┼──────────────┤
//! │ Credentials │              │  row 6
//! └─────────────┴──────────────┘
//! ```
//!
//! A column without expanded parents is one physical column wide and emits
//! no merge regions.

use crate::matrix::{FrameworkEntry, Matrix, TacticColumn};
use crate::ordering::{is_excluded, ExpansionRules, ScopeRule};
use navlayer_model::LayoutSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Row of the tactic headers
pub const HEADER_ROW: usize = 1;

/// 1-based grid position; orders row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub column: usize,
}

impl Coordinate {
    #[inline]
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// What a cell renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellKind {
    TacticHeader,
    Technique,
    Subtechnique,
}

/// Occupied grid cell
///
/// `id` is the framework id for technique cells and the tactic short name
/// for headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub label: String,
    pub id: String,
    pub kind: CellKind,
}

/// Contiguous block of cells rendered as one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRegion {
    pub start_row: usize,
    pub column: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl MergeRegion {
    /// Whether the region covers a coordinate
    #[must_use]
    pub fn covers(&self, at: Coordinate) -> bool {
        (self.start_row..self.start_row + self.row_span).contains(&at.row)
            && (self.column..self.column + self.col_span).contains(&at.column)
    }
}

/// Sparse `(row, column) → cell` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: BTreeMap<Coordinate, GridCell>,
}

impl Grid {
    /// Create empty grid
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a cell, replacing any previous one
    pub fn insert(&mut self, at: Coordinate, cell: GridCell) {
        self.cells.insert(at, cell);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, at: Coordinate) -> Option<&GridCell> {
        self.cells.get(&at)
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate, &GridCell)> {
        self.cells.iter()
    }

    /// Occupied cells of one physical column, top to bottom
    pub fn column_cells(&self, column: usize) -> impl Iterator<Item = (&Coordinate, &GridCell)> {
        self.cells.iter().filter(move |(at, _)| at.column == column)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lowest occupied row, 0 when empty
    #[must_use]
    pub fn max_row(&self) -> usize {
        self.cells.keys().map(|at| at.row).max().unwrap_or(0)
    }

    /// Rightmost occupied column, 0 when empty
    #[must_use]
    pub fn max_column(&self) -> usize {
        self.cells.keys().map(|at| at.column).max().unwrap_or(0)
    }
}

/// How technique cells are labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelMode {
    #[default]
    Name,
    Id,
    IdAndName,
}

impl LabelMode {
    /// Mode from the layer's `showName` / `showID` flags
    ///
    /// Names are shown unless explicitly turned off; ids only on request.
    #[must_use]
    pub fn from_flags(show_name: Option<bool>, show_id: Option<bool>) -> Self {
        match (show_name.unwrap_or(true), show_id.unwrap_or(false)) {
            (true, true) => Self::IdAndName,
            (false, true) => Self::Id,
            _ => Self::Name,
        }
    }

    /// Mode from layout settings, `Name` when absent
    #[must_use]
    pub fn from_layout(layout: Option<&LayoutSettings>) -> Self {
        layout.map_or(Self::Name, |l| Self::from_flags(l.show_name, l.show_id))
    }

    /// Cell text for a technique or sub-technique
    #[must_use]
    pub fn label(self, entry: &FrameworkEntry) -> String {
        match self {
            Self::Name => entry.name.clone(),
            Self::Id => entry.id.clone(),
            Self::IdAndName => format!("{}: {}", entry.id, entry.name),
        }
    }
}

/// Technique placed in the main column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRow {
    pub row: usize,
    pub entry: FrameworkEntry,
}

/// Expanded parent and the children written beside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildGroup {
    pub start_row: usize,
    pub parent_id: String,
    pub children: Vec<FrameworkEntry>,
}

/// Row assignment for one tactic column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan {
    pub tactic: FrameworkEntry,
    pub short_name: String,
    pub rows: Vec<PlannedRow>,
    pub groups: Vec<ChildGroup>,
    /// Surviving sub-techniques of placed parents that did not expand
    pub collapsed: Vec<String>,
}

impl ColumnPlan {
    /// Physical columns used: 2 with expanded parents, else 1
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        if self.groups.is_empty() {
            1
        } else {
            2
        }
    }

    /// Rows used including the header
    #[must_use]
    pub fn row_count(&self) -> usize {
        let body_end = self
            .groups
            .iter()
            .map(|g| g.start_row + g.children.len())
            .chain(self.rows.iter().map(|r| r.row + 1))
            .max()
            .unwrap_or(HEADER_ROW + 1);
        body_end - 1
    }
}

/// Decide rows and child groups for one column
///
/// Excluded techniques consume no row. A parent expands when the rules say
/// so and at least one of its children survives exclusion; it then spans as
/// many rows as it has surviving children. Surviving children of a placed
/// parent that stays collapsed are listed in [`ColumnPlan::collapsed`].
#[must_use]
pub fn plan_column(column: &TacticColumn, expansion: &ExpansionRules, excluded: &[ScopeRule]) -> ColumnPlan {
    let tactic = column.short_name.as_str();
    let mut rows = Vec::with_capacity(column.techniques.len());
    let mut groups = Vec::new();
    let mut collapsed = Vec::new();
    let mut cursor = HEADER_ROW + 1;

    for technique in &column.techniques {
        if is_excluded(excluded, &technique.id, tactic) {
            continue;
        }
        rows.push(PlannedRow {
            row: cursor,
            entry: technique.clone(),
        });

        let surviving: Vec<FrameworkEntry> = column
            .children(&technique.id)
            .iter()
            .filter(|child| !is_excluded(excluded, &child.id, tactic))
            .cloned()
            .collect();
        let children = if expansion.expands(&technique.id, tactic) {
            surviving
        } else {
            collapsed.extend(surviving.into_iter().map(|child| child.id));
            Vec::new()
        };

        if children.is_empty() {
            cursor += 1;
        } else {
            let span = children.len();
            groups.push(ChildGroup {
                start_row: cursor,
                parent_id: technique.id.clone(),
                children,
            });
            cursor += span;
        }
    }

    ColumnPlan {
        tactic: column.tactic.clone(),
        short_name: column.short_name.clone(),
        rows,
        groups,
        collapsed,
    }
}

/// Write a planned column starting at physical column `column`
///
/// Returns the number of physical columns used.
pub fn materialize(
    plan: &ColumnPlan,
    column: usize,
    labels: LabelMode,
    grid: &mut Grid,
    merges: &mut Vec<MergeRegion>,
) -> usize {
    grid.insert(
        Coordinate::new(HEADER_ROW, column),
        GridCell {
            label: plan.tactic.name.clone(),
            id: plan.short_name.clone(),
            kind: CellKind::TacticHeader,
        },
    );

    for planned in &plan.rows {
        grid.insert(
            Coordinate::new(planned.row, column),
            GridCell {
                label: labels.label(&planned.entry),
                id: planned.entry.id.clone(),
                kind: CellKind::Technique,
            },
        );
    }

    if plan.groups.is_empty() {
        return 1;
    }

    let extra = column + 1;
    merges.push(MergeRegion {
        start_row: HEADER_ROW,
        column,
        row_span: 1,
        col_span: 2,
    });
    for group in &plan.groups {
        for (offset, child) in group.children.iter().enumerate() {
            grid.insert(
                Coordinate::new(group.start_row + offset, extra),
                GridCell {
                    label: labels.label(child),
                    id: child.id.clone(),
                    kind: CellKind::Subtechnique,
                },
            );
        }
        merges.push(MergeRegion {
            start_row: group.start_row,
            column,
            row_span: group.children.len(),
            col_span: 1,
        });
    }
    plan.width()
}

/// Cells plus merge regions for one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub grid: Grid,
    pub merges: Vec<MergeRegion>,
    /// `(tactic short name, sub-technique id)` kept inside a collapsed parent
    pub collapsed: BTreeSet<(String, String)>,
}

impl GridLayout {
    /// Tactic short name governing a physical column
    ///
    /// Main columns carry their own header; a sub-technique column takes
    /// the header one column to the left.
    #[must_use]
    pub fn column_tactic(&self, column: usize) -> Option<&str> {
        let header = |c: usize| {
            self.grid
                .get(Coordinate::new(HEADER_ROW, c))
                .filter(|cell| cell.kind == CellKind::TacticHeader)
                .map(|cell| cell.id.as_str())
        };
        header(column).or_else(|| column.checked_sub(1).and_then(header))
    }

    /// Sub-technique exists under a placed parent that is not expanded
    ///
    /// With a tactic, only that tactic's column counts.
    #[must_use]
    pub fn is_collapsed(&self, technique_id: &str, tactic: Option<&str>) -> bool {
        self.collapsed
            .iter()
            .any(|(short, id)| id == technique_id && tactic.map_or(true, |t| short == t))
    }

    /// Merge region starting at a coordinate, if any
    #[must_use]
    pub fn merge_at(&self, at: Coordinate) -> Option<&MergeRegion> {
        self.merges
            .iter()
            .find(|m| m.start_row == at.row && m.column == at.column)
    }
}

/// Lay out every tactic column of a matrix
///
/// Tactics are placed left to right starting at column 1; a tactic with
/// expanded parents takes two physical columns.
#[must_use]
pub fn build_grid(
    matrix: &Matrix,
    expansion: &ExpansionRules,
    excluded: &[ScopeRule],
    labels: LabelMode,
) -> GridLayout {
    let mut layout = GridLayout::default();
    let mut column = 1;
    for tactic in &matrix.columns {
        let plan = plan_column(tactic, expansion, excluded);
        layout
            .collapsed
            .extend(plan.collapsed.iter().map(|id| (plan.short_name.clone(), id.clone())));
        column += materialize(&plan, column, labels, &mut layout.grid, &mut layout.merges);
    }
    tracing::debug!(
        cells = layout.grid.len(),
        merges = layout.merges.len(),
        columns = column - 1,
        "grid built"
    );
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use navlayer_model::Domain;
    use pretty_assertions::assert_eq;

    fn entry(id: &str) -> FrameworkEntry {
        FrameworkEntry::new(id, format!("name {id}"))
    }

    fn column(short: &str, techniques: &[&str], children: &[(&str, &[&str])]) -> TacticColumn {
        let mut subtechniques = IndexMap::new();
        for (parent, ids) in children {
            subtechniques.insert(parent.to_string(), ids.iter().map(|id| entry(id)).collect());
        }
        TacticColumn {
            tactic: FrameworkEntry::new(short.to_uppercase(), short),
            short_name: short.into(),
            techniques: techniques.iter().map(|id| entry(id)).collect(),
            subtechniques,
        }
    }

    fn matrix() -> Matrix {
        Matrix {
            domain: Domain::Enterprise,
            edition: "test".into(),
            columns: vec![
                column("a", &["T1", "T2", "T3"], &[("T2", &["T2.001", "T2.002"])]),
                column("b", &["T4"], &[]),
            ],
        }
    }

    #[test]
    fn no_expansion_is_one_column_per_tactic() {
        let layout = build_grid(&matrix(), &ExpansionRules::none(), &[], LabelMode::Name);
        assert!(layout.merges.is_empty());
        assert_eq!(layout.grid.max_column(), 2);
        assert_eq!(layout.grid.column_cells(1).count(), 4);
        assert_eq!(layout.grid.get(Coordinate::new(1, 2)).unwrap().label, "b");
        assert_eq!(layout.grid.get(Coordinate::new(3, 1)).unwrap().id, "T2");
    }

    #[test]
    fn expanded_parent_spans_its_children() {
        let rules = ExpansionRules::from_rules(vec![ScopeRule::only("T2", "a")]);
        let layout = build_grid(&matrix(), &rules, &[], LabelMode::Id);

        let ids: Vec<(Coordinate, &str)> = layout
            .grid
            .iter()
            .filter(|(at, _)| at.column == 2)
            .map(|(at, cell)| (*at, cell.id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![(Coordinate::new(3, 2), "T2.001"), (Coordinate::new(4, 2), "T2.002")]
        );
        // T3 moves below the two child rows
        assert_eq!(layout.grid.get(Coordinate::new(5, 1)).unwrap().id, "T3");
        assert_eq!(
            layout.merges,
            vec![
                MergeRegion { start_row: 1, column: 1, row_span: 1, col_span: 2 },
                MergeRegion { start_row: 3, column: 1, row_span: 2, col_span: 1 },
            ]
        );
        // next tactic two physical columns later
        assert_eq!(layout.grid.get(Coordinate::new(1, 3)).unwrap().id, "b");
        assert_eq!(layout.column_tactic(2), Some("a"));
        assert_eq!(layout.column_tactic(3), Some("b"));
    }

    #[test]
    fn last_column_children_are_written() {
        let m = Matrix {
            domain: Domain::Enterprise,
            edition: "test".into(),
            columns: vec![column("z", &["T9"], &[("T9", &["T9.001"])])],
        };
        let layout = build_grid(&m, &ExpansionRules::all(), &[], LabelMode::Name);
        assert_eq!(layout.grid.get(Coordinate::new(2, 2)).unwrap().id, "T9.001");
        assert_eq!(layout.merges.len(), 2);
    }

    #[test]
    fn excluded_children_shrink_the_group() {
        let plan = plan_column(
            &matrix().columns[0],
            &ExpansionRules::all(),
            &[ScopeRule::any("T2.001")],
        );
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].children, vec![entry("T2.002")]);
        assert_eq!(plan.row_count(), 4);
    }

    #[test]
    fn all_children_excluded_means_no_expansion() {
        let plan = plan_column(
            &matrix().columns[0],
            &ExpansionRules::all(),
            &[ScopeRule::any("T2.001"), ScopeRule::any("T2.002")],
        );
        assert!(plan.groups.is_empty());
        assert_eq!(plan.width(), 1);
        assert_eq!(plan.rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn collapsed_children_are_recorded() {
        let plan = plan_column(&matrix().columns[0], &ExpansionRules::none(), &[ScopeRule::any("T2.002")]);
        assert_eq!(plan.collapsed, vec!["T2.001".to_string()]);

        let expanded = plan_column(&matrix().columns[0], &ExpansionRules::all(), &[]);
        assert!(expanded.collapsed.is_empty());

        let layout = build_grid(&matrix(), &ExpansionRules::none(), &[], LabelMode::Name);
        assert!(layout.is_collapsed("T2.001", Some("a")));
        assert!(layout.is_collapsed("T2.002", None));
        assert!(!layout.is_collapsed("T2.001", Some("b")));
    }

    #[test]
    fn empty_tactic_keeps_its_header() {
        let plan = plan_column(&column("empty", &[], &[]), &ExpansionRules::none(), &[]);
        assert_eq!(plan.row_count(), 1);
        let mut grid = Grid::new();
        let mut merges = Vec::new();
        assert_eq!(materialize(&plan, 7, LabelMode::Name, &mut grid, &mut merges), 1);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(Coordinate::new(1, 7)).unwrap().kind, CellKind::TacticHeader);
        assert!(merges.is_empty());
    }

    #[test]
    fn label_modes() {
        let e = FrameworkEntry::new("T1110", "Brute Force");
        assert_eq!(LabelMode::from_flags(None, None).label(&e), "Brute Force");
        assert_eq!(LabelMode::from_flags(Some(false), Some(true)).label(&e), "T1110");
        assert_eq!(LabelMode::from_flags(None, Some(true)).label(&e), "T1110: Brute Force");
        assert_eq!(LabelMode::from_flags(Some(false), Some(false)), LabelMode::Name);
    }

    #[test]
    fn merge_region_coverage() {
        let region = MergeRegion { start_row: 2, column: 3, row_span: 4, col_span: 1 };
        assert!(region.covers(Coordinate::new(5, 3)));
        assert!(!region.covers(Coordinate::new(6, 3)));
        assert!(!region.covers(Coordinate::new(2, 4)));
    }
}
