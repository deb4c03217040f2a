//! Navlayer Export
//!
//! Turns an annotation layer into a styled matrix sheet: tactic columns,
//! technique rows, sub-technique groups and per-cell fill, font and notes.
//!
//! # Core Operations
//!
//! - **Export**: [`Exporter::export`] orders, lays out and styles one layer
//! - **Style**: explicit color, then gradient(score), then no fill;
//!   disabled techniques are hidden or dimmed
//! - **Render**: [`Renderer`] backends encode a [`RenderedSheet`]
//!
//! # Example
//!
//! ```
//! use navlayer_export::{Exporter, OutputFormat, Renderer};
//! use navlayer_matrix::MemoryStore;
//! use navlayer_model::{Annotation, Domain, Gradient, LayerDocument};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::from_bundle(&json!({
//!     "id": "bundle--demo",
//!     "objects": [
//!         {"type": "x-mitre-matrix", "id": "x-mitre-matrix--1", "name": "Enterprise",
//!          "tactic_refs": ["x-mitre-tactic--1"]},
//!         {"type": "x-mitre-tactic", "id": "x-mitre-tactic--1", "name": "Impact",
//!          "x_mitre_shortname": "impact"},
//!         {"type": "attack-pattern", "id": "attack-pattern--1", "name": "Data Destruction",
//!          "kill_chain_phases": [{"kill_chain_name": "mitre-attack", "phase_name": "impact"}],
//!          "external_references": [{"source_name": "mitre-attack", "external_id": "T1485"}]}
//!     ]
//! }))
//! .unwrap();
//!
//! let layer = LayerDocument::new("demo", Domain::Enterprise)
//!     .with_gradient(Gradient::new(&["#ff0000", "#00ff00"], 0, 10).unwrap())
//!     .with_annotation(Annotation::new("T1485").with_score(10.0));
//!
//! let export = Exporter::new(Domain::Enterprise, Arc::new(store)).export(&layer).unwrap();
//! let cell = export.sheet.cell(2, 1).unwrap();
//! assert_eq!(cell.style.fill.as_deref(), Some("#00ff00"));
//!
//! let text = OutputFormat::Text.renderer().render(&export.sheet).unwrap();
//! assert!(text.contains("Data Destruction"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod export;
pub mod render;
pub mod style;

pub use config::{ConfigFormat, ExportConfig, SubtechniqueDisplay};
pub use error::{ExportError, ExportResult};
pub use export::{hidden_rules, Export, Exporter};
pub use render::{JsonRenderer, OutputFormat, RenderedSheet, Renderer, TextRenderer};
pub use style::{style_grid, CellStyle, Note, StyleResolver, StyledCell, StyledGrid};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
