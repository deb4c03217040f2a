//! Navlayer Model
//!
//! Versioned annotation layers for threat-framework matrices: the document
//! a user writes to score, color, comment on and hide techniques.
//!
//! # Core Operations
//!
//! - **Load**: migrate legacy shapes, validate field by field, build a typed
//!   [`LayerDocument`] (strict or lenient)
//! - **Save**: serialize every retained field back to the layer file shape
//! - **Color**: map scores to colors through a tabulated [`Gradient`]
//! - **Combine**: merge several layers with [`LayerOps`]
//!
//! # Architecture
//!
//! ```text
//! raw JSON → migrate() → validate_layer() → LayerDocument
//!               ↓               ↓
//!          info notes     warnings (lenient) / FieldError (strict)
//! ```
//!
//! # Example
//!
//! ```
//! use navlayer_model::prelude::*;
//! use serde_json::json;
//!
//! let mut layer = Layer::new(LoadMode::Lenient);
//! let doc = layer
//!     .load_value(&json!({
//!         "name": "triage",
//!         "domain": "enterprise-attack",
//!         "version": "3.0",
//!         "techniques": [{"techniqueID": "T1110", "score": 3}]
//!     }))
//!     .unwrap();
//! assert_eq!(doc.versions.layer, "4.1");
//! assert_eq!(layer.diagnostics().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod annotation;
pub mod color;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod gradient;
pub mod layer;
pub mod ops;
pub mod schema;
pub mod taxonomy;
pub mod versions;

pub use annotation::{Annotation, MetadataEntry, TacticScope};
pub use color::Rgb;
pub use diagnostic::{Diagnostic, Severity};
pub use document::{Filters, LayerDocument, LayoutKind, LayoutSettings, LegendItem, Loaded, SortMode};
pub use error::{FieldError, LayerError, ModelError, ModelResult};
pub use gradient::{Gradient, MAX_GRADIENT_STEPS};
pub use layer::{Layer, LayerState};
pub use ops::{Defaults, LayerOps};
pub use schema::{validate_layer, LoadMode};
pub use taxonomy::{is_technique_id, parent_id, Domain, TacticName};
pub use versions::{migrate, Migrated, Versions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with layers
    pub use crate::annotation::{Annotation, MetadataEntry, TacticScope};
    pub use crate::diagnostic::{Diagnostic, Severity};
    pub use crate::document::{LayerDocument, SortMode};
    pub use crate::error::{FieldError, LayerError, ModelError};
    pub use crate::gradient::Gradient;
    pub use crate::layer::Layer;
    pub use crate::ops::LayerOps;
    pub use crate::schema::LoadMode;
    pub use crate::taxonomy::Domain;
}
