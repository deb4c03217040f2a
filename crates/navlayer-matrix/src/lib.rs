//! Navlayer Matrix
//!
//! Builds the tactic/technique hierarchy of a threat framework and lays it
//! out as a sparse grid with merge regions.
//!
//! # Core Operations
//!
//! - **Build**: query a [`FrameworkSource`] and assemble a [`Matrix`]
//!   (cached per edition and domain in [`MatrixCache`])
//! - **Order**: reorder a matrix copy by sort mode and a [`ScoreOverlay`]
//! - **Lay out**: plan each column, then write cells and [`MergeRegion`]s
//! - **Look up**: find the coordinates rendering an id, or learn that its
//!   parent hides it
//!
//! # Architecture
//!
//! ```text
//! FrameworkSource ──► MatrixBuilder ──► Arc<Matrix> (cached, read-only)
//!                                           │
//!                    ScoreOverlay ──► adjust_ordering()
//!                                           │
//!        ExpansionRules + exclusions ──► build_grid() ──► GridLayout
//!                                                            │
//!                                                  find_coordinates()
//! ```
//!
//! # Example
//!
//! ```
//! use navlayer_matrix::prelude::*;
//! use navlayer_model::{Domain, SortMode};
//! use serde_json::json;
//!
//! let store = MemoryStore::from_bundle(&json!({
//!     "id": "bundle--demo",
//!     "objects": [
//!         {"type": "x-mitre-matrix", "id": "x-mitre-matrix--1", "name": "Enterprise",
//!          "tactic_refs": ["x-mitre-tactic--1"]},
//!         {"type": "x-mitre-tactic", "id": "x-mitre-tactic--1", "name": "Impact",
//!          "x_mitre_shortname": "impact",
//!          "external_references": [{"source_name": "mitre-attack", "external_id": "TA0040"}]},
//!         {"type": "attack-pattern", "id": "attack-pattern--1", "name": "Data Destruction",
//!          "kill_chain_phases": [{"kill_chain_name": "mitre-attack", "phase_name": "impact"}],
//!          "external_references": [{"source_name": "mitre-attack", "external_id": "T1485"}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let cache = MatrixCache::default();
//! let matrix = cache.get_or_build(&store, Domain::Enterprise).unwrap();
//! let ordered = adjust_ordering(&matrix, SortMode::Alphabetical, &ScoreOverlay::new());
//! let layout = build_grid(&ordered, &ExpansionRules::none(), &[], LabelMode::Name);
//!
//! assert_eq!(
//!     find_coordinates(&layout, "T1485", Some("impact")),
//!     Placement::Found(vec![Coordinate::new(2, 1)])
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod cache;
pub mod error;
pub mod layout;
pub mod lookup;
pub mod matrix;
pub mod ordering;
pub mod source;

pub use builder::MatrixBuilder;
pub use cache::{CacheStats, MatrixCache, MatrixKey};
pub use error::{MatrixError, MatrixResult};
pub use layout::{
    build_grid, materialize, plan_column, CellKind, ChildGroup, ColumnPlan, Coordinate, Grid, GridCell,
    GridLayout, LabelMode, MergeRegion, PlannedRow, HEADER_ROW,
};
pub use lookup::{find_coordinates, Placement};
pub use matrix::{FrameworkEntry, Matrix, TacticColumn};
pub use ordering::{adjust_ordering, is_excluded, ExpansionRules, ScopeRule, ScoreOverlay};
pub use source::{FrameworkSource, MemoryStore, ObjectFilter, StixObject};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and laying out matrices
    pub use crate::builder::MatrixBuilder;
    pub use crate::cache::MatrixCache;
    pub use crate::error::{MatrixError, MatrixResult};
    pub use crate::layout::{build_grid, Coordinate, GridLayout, LabelMode, MergeRegion};
    pub use crate::lookup::{find_coordinates, Placement};
    pub use crate::matrix::{FrameworkEntry, Matrix};
    pub use crate::ordering::{adjust_ordering, ExpansionRules, ScopeRule, ScoreOverlay};
    pub use crate::source::{FrameworkSource, MemoryStore};
}
