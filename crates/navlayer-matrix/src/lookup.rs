//! Reverse lookup from framework ids to grid coordinates

use crate::layout::{CellKind, Coordinate, GridLayout};

/// Where an id ended up in a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Rendered at these coordinates, row-major
    Found(Vec<Coordinate>),
    /// Framework sub-technique whose parent is rendered but not expanded
    Hidden,
    /// Not rendered (excluded, or not in the framework or column)
    Absent,
}

impl Placement {
    /// Coordinates when found, empty otherwise
    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        match self {
            Self::Found(at) => at,
            Self::Hidden | Self::Absent => &[],
        }
    }

    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Locate the cells rendering `technique_id`
///
/// With a tactic, only cells whose column belongs to that tactic count. An
/// unmatched id resolves to [`Placement::Hidden`] only when the framework
/// lists it as a surviving sub-technique of a parent that was placed but not
/// expanded, under the same constraint. Anything else is
/// [`Placement::Absent`].
#[must_use]
pub fn find_coordinates(layout: &GridLayout, technique_id: &str, tactic: Option<&str>) -> Placement {
    let found: Vec<Coordinate> = layout
        .grid
        .iter()
        .filter(|(_, cell)| cell.kind != CellKind::TacticHeader && cell.id == technique_id)
        .filter(|(at, _)| tactic.map_or(true, |t| layout.column_tactic(at.column) == Some(t)))
        .map(|(at, _)| *at)
        .collect();

    if !found.is_empty() {
        Placement::Found(found)
    } else if layout.is_collapsed(technique_id, tactic) {
        Placement::Hidden
    } else {
        Placement::Absent
    }
}
