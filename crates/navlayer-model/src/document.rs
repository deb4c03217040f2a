//! Layer document model
//!
//! [`LayerDocument`] is the typed form of a validated layer. It is only ever
//! built from a value that passed [`crate::schema::validate_layer`] (or
//! programmatically through [`LayerDocument::new`]), so deserialization here
//! cannot fail on shape.

use crate::annotation::{Annotation, MetadataEntry};
use crate::diagnostic::Diagnostic;
use crate::error::LayerError;
use crate::gradient::Gradient;
use crate::schema::{validate_layer, LoadMode};
use crate::taxonomy::Domain;
use crate::versions::{migrate, Versions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Technique sort order (`sorting` 0..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SortMode {
    /// 0: framework order (alphabetical by name)
    #[default]
    Alphabetical,
    /// 1: reverse of the currently materialized order
    Reversed,
    /// 2: score ascending
    ScoreAscending,
    /// 3: score descending
    ScoreDescending,
}

impl TryFrom<u8> for SortMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Alphabetical),
            1 => Ok(Self::Reversed),
            2 => Ok(Self::ScoreAscending),
            3 => Ok(Self::ScoreDescending),
            other => Err(format!("{other} is not a sort mode (expected 0 to 3)")),
        }
    }
}

impl From<SortMode> for u8 {
    fn from(mode: SortMode) -> Self {
        match mode {
            SortMode::Alphabetical => 0,
            SortMode::Reversed => 1,
            SortMode::ScoreAscending => 2,
            SortMode::ScoreDescending => 3,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Alphabetical => "alphabetical",
            Self::Reversed => "reversed",
            Self::ScoreAscending => "score ascending",
            Self::ScoreDescending => "score descending",
        };
        f.write_str(label)
    }
}

/// Platform filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
}

/// Matrix layout style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Side,
    Flat,
    Mini,
}

/// Layout flags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_name: Option<bool>,
    #[serde(default, rename = "showID", skip_serializing_if = "Option::is_none")]
    pub show_id: Option<bool>,
}

/// Legend entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub color: String,
}

/// A validated annotation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    pub name: String,
    pub versions: Versions,
    domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<SortMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub techniques: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legend_items: Vec<LegendItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tactic_row_background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic_row_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_techniques_across_tactics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_subtechniques_with_parent: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
}

/// Successfully loaded document with its load diagnostics
#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: LayerDocument,
    /// Migration notes followed by validation warnings
    pub diagnostics: Vec<Diagnostic>,
}

impl LayerDocument {
    /// Create an empty layer for a domain
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            versions: Versions::default(),
            domain,
            description: None,
            filters: None,
            sorting: None,
            layout: None,
            hide_disabled: None,
            techniques: Vec::new(),
            gradient: None,
            legend_items: Vec::new(),
            show_tactic_row_background: None,
            tactic_row_background: None,
            select_techniques_across_tactics: None,
            select_subtechniques_with_parent: None,
            metadata: Vec::new(),
        }
    }

    /// Migrate, validate and build a document from a raw value
    ///
    /// # Errors
    /// Returns `LayerError` when the root is not an object, `name` or
    /// `domain` is unusable, or (strict mode) any field fails validation.
    pub fn load(raw: &Value, mode: LoadMode) -> Result<Loaded, LayerError> {
        let migrated = migrate(raw);
        let validated = validate_layer(&migrated.value, mode)?;
        let document: LayerDocument = serde_json::from_value(validated.value)?;

        let mut diagnostics = migrated.notes;
        diagnostics.extend(validated.diagnostics);
        tracing::debug!(
            layer = %document.name,
            domain = %document.domain,
            techniques = document.techniques.len(),
            diagnostics = diagnostics.len(),
            "layer loaded"
        );
        Ok(Loaded {
            document,
            diagnostics,
        })
    }

    /// Domain, fixed at construction
    #[inline]
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Effective sort mode (absent means alphabetical)
    #[inline]
    #[must_use]
    pub fn sort_mode(&self) -> SortMode {
        self.sorting.unwrap_or_default()
    }

    /// Disabled techniques are hidden rather than dimmed
    #[inline]
    #[must_use]
    pub fn hides_disabled(&self) -> bool {
        self.hide_disabled.unwrap_or(false)
    }

    /// Serialize to the layer file shape
    ///
    /// # Errors
    /// Returns `LayerError::Json` if serialization fails.
    pub fn to_value(&self) -> Result<Value, LayerError> {
        Ok(serde_json::to_value(self)?)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_sorting(mut self, sorting: SortMode) -> Self {
        self.sorting = Some(sorting);
        self
    }

    #[must_use]
    pub fn with_gradient(mut self, gradient: Gradient) -> Self {
        self.gradient = Some(gradient);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.techniques.push(annotation);
        self
    }

    #[must_use]
    pub fn with_hide_disabled(mut self, hide: bool) -> Self {
        self.hide_disabled = Some(hide);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutSettings) -> Self {
        self.layout = Some(layout);
        self
    }
}
