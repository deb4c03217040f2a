//! Combining layers
//!
//! [`LayerOps`] aligns the annotations of several layers on
//! `(techniqueID, tactic)` and computes each output field with a caller
//! supplied closure over the aligned values. Layers missing an annotation
//! contribute the configured [`Defaults`]. The combined layer is checked
//! by the strict validator before it is handed back.
//!
//! ```
//! use navlayer_model::prelude::*;
//!
//! let a = LayerDocument::new("a", Domain::Enterprise)
//!     .with_annotation(Annotation::new("T1110").with_score(2.0));
//! let b = LayerDocument::new("b", Domain::Enterprise)
//!     .with_annotation(Annotation::new("T1110").with_score(3.0));
//!
//! let sum = LayerOps::new(&[&a, &b])
//!     .unwrap()
//!     .score(|s| s.iter().sum())
//!     .name(|names| names.join("+"))
//!     .process()
//!     .unwrap();
//! assert_eq!(sum.techniques[0].score, Some(5.0));
//! assert_eq!(sum.name, "a+b");
//! ```

use crate::annotation::{Annotation, MetadataEntry};
use crate::diagnostic::Diagnostic;
use crate::document::LayerDocument;
use crate::error::{ModelError, ModelResult};
use crate::schema::{validate_layer, LoadMode};

/// Values used when a layer has no annotation for a key
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub comment: String,
    pub enabled: bool,
    pub color: String,
    pub score: f64,
    pub metadata: Vec<MetadataEntry>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            comment: String::new(),
            enabled: true,
            color: "#ffffff".to_string(),
            score: 1.0,
            metadata: Vec::new(),
        }
    }
}

type Combine<'a, T, R> = Box<dyn Fn(&[T]) -> R + 'a>;

/// Combine several layers of one domain into a new layer
pub struct LayerOps<'a> {
    layers: Vec<&'a LayerDocument>,
    keys: Vec<(String, Option<String>)>,
    defaults: Defaults,
    diagnostics: Vec<Diagnostic>,
    score: Option<Combine<'a, f64, f64>>,
    comment: Option<Combine<'a, String, String>>,
    enabled: Option<Combine<'a, bool, bool>>,
    color: Option<Combine<'a, String, String>>,
    metadata: Option<Combine<'a, Vec<MetadataEntry>, Vec<MetadataEntry>>>,
    name: Option<Combine<'a, String, String>>,
    description: Option<Combine<'a, String, String>>,
}

impl<'a> LayerOps<'a> {
    /// Prepare layers for combination
    ///
    /// Document-level fields are taken from the first layer; any other layer
    /// disagreeing on one of them produces a warning.
    ///
    /// # Errors
    /// - `ModelError::NoLayers` for an empty input
    /// - `ModelError::MismatchedDomain` if the layers' domains differ
    pub fn new(layers: &[&'a LayerDocument]) -> ModelResult<Self> {
        let first = *layers.first().ok_or(ModelError::NoLayers)?;

        let mut diagnostics = Vec::new();
        for (i, other) in layers.iter().enumerate().skip(1) {
            if other.domain() != first.domain() {
                return Err(ModelError::MismatchedDomain {
                    expected: first.domain(),
                    actual: other.domain(),
                });
            }
            for field in mismatched_fields(first, other) {
                diagnostics.push(Diagnostic::warning(
                    format!("layers[{i}].{field}"),
                    format!("{field} differs from the first layer; keeping '{}' value", first.name),
                ));
            }
        }

        let mut keys: Vec<(String, Option<String>)> = Vec::new();
        for annotation in layers.iter().flat_map(|l| &l.techniques) {
            let key = (annotation.technique_id.clone(), annotation.tactic.clone());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Ok(Self {
            layers: layers.to_vec(),
            keys,
            defaults: Defaults::default(),
            diagnostics,
            score: None,
            comment: None,
            enabled: None,
            color: None,
            metadata: None,
            name: None,
            description: None,
        })
    }

    #[must_use]
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn score(mut self, f: impl Fn(&[f64]) -> f64 + 'a) -> Self {
        self.score = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn comment(mut self, f: impl Fn(&[String]) -> String + 'a) -> Self {
        self.comment = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn enabled(mut self, f: impl Fn(&[bool]) -> bool + 'a) -> Self {
        self.enabled = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn color(mut self, f: impl Fn(&[String]) -> String + 'a) -> Self {
        self.color = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn metadata(mut self, f: impl Fn(&[Vec<MetadataEntry>]) -> Vec<MetadataEntry> + 'a) -> Self {
        self.metadata = Some(Box::new(f));
        self
    }

    /// Name of the combined layer, from the input names
    #[must_use]
    pub fn name(mut self, f: impl Fn(&[String]) -> String + 'a) -> Self {
        self.name = Some(Box::new(f));
        self
    }

    /// Description of the combined layer, from the input descriptions
    ///
    /// Layers without a description contribute an empty string.
    #[must_use]
    pub fn description(mut self, f: impl Fn(&[String]) -> String + 'a) -> Self {
        self.description = Some(Box::new(f));
        self
    }

    /// Warnings for document-level fields that differ between layers
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Build the combined layer
    ///
    /// One annotation per `(techniqueID, tactic)` seen in any input, in
    /// first-seen order. Only fields with a combining closure are set.
    ///
    /// # Errors
    /// `ModelError::Layer` if the combined layer fails strict validation,
    /// for example when a color closure yields something that is not a hex
    /// color.
    pub fn process(&self) -> ModelResult<LayerDocument> {
        let mut out = self.layers[0].clone();
        if let Some(f) = &self.name {
            let names: Vec<String> = self.layers.iter().map(|l| l.name.clone()).collect();
            out.name = f(&names);
        }
        if let Some(f) = &self.description {
            let descriptions: Vec<String> = self
                .layers
                .iter()
                .map(|l| l.description.clone().unwrap_or_default())
                .collect();
            out.description = Some(f(&descriptions));
        }

        out.techniques = self
            .keys
            .iter()
            .map(|(id, tactic)| self.combine(id, tactic.as_deref()))
            .collect();

        tracing::debug!(
            layers = self.layers.len(),
            techniques = out.techniques.len(),
            "layers combined"
        );
        validate_layer(&out.to_value()?, LoadMode::Strict)?;
        Ok(out)
    }

    fn combine(&self, id: &str, tactic: Option<&str>) -> Annotation {
        let aligned: Vec<Option<&Annotation>> = self
            .layers
            .iter()
            .map(|l| {
                l.techniques
                    .iter()
                    .find(|a| a.technique_id == id && a.tactic.as_deref() == tactic)
            })
            .collect();

        let mut annotation = Annotation::new(id);
        annotation.tactic = tactic.map(str::to_string);

        if let Some(f) = &self.score {
            let values = gather(&aligned, |a| a.score, &self.defaults.score);
            annotation.score = Some(f(&values));
        }
        if let Some(f) = &self.enabled {
            let values = gather(&aligned, |a| a.enabled, &self.defaults.enabled);
            annotation.enabled = Some(f(&values));
        }
        if let Some(f) = &self.comment {
            let values = gather(&aligned, |a| a.comment.clone(), &self.defaults.comment);
            annotation.comment = Some(f(&values));
        }
        if let Some(f) = &self.color {
            let values = gather(&aligned, |a| a.color.clone(), &self.defaults.color);
            annotation.color = Some(f(&values));
        }
        if let Some(f) = &self.metadata {
            let values: Vec<Vec<MetadataEntry>> = aligned
                .iter()
                .map(|a| match a {
                    Some(a) if !a.metadata.is_empty() => a.metadata.clone(),
                    _ => self.defaults.metadata.clone(),
                })
                .collect();
            annotation.metadata = f(&values);
        }
        annotation
    }
}

/// One value per layer: the annotation's field, or the default
fn gather<T: Clone>(
    aligned: &[Option<&Annotation>],
    pick: impl Fn(&Annotation) -> Option<T>,
    default: &T,
) -> Vec<T> {
    aligned
        .iter()
        .map(|a| a.and_then(&pick).unwrap_or_else(|| default.clone()))
        .collect()
}

fn mismatched_fields(first: &LayerDocument, other: &LayerDocument) -> Vec<&'static str> {
    let checks: [(&'static str, bool); 9] = [
        ("name", first.name == other.name),
        ("versions", first.versions == other.versions),
        ("description", first.description == other.description),
        ("filters", first.filters == other.filters),
        ("sorting", first.sorting == other.sorting),
        ("layout", first.layout == other.layout),
        ("hideDisabled", first.hide_disabled == other.hide_disabled),
        ("gradient", first.gradient == other.gradient),
        ("legendItems", first.legend_items == other.legend_items),
    ];
    checks
        .into_iter()
        .filter(|(_, same)| !same)
        .map(|(field, _)| field)
        .collect()
}
