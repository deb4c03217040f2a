//! Layer load/save lifecycle
//!
//! A [`Layer`] is either fully loaded or in the explicit
//! [`LayerState::Unloaded`] state. A failed load always leaves it unloaded;
//! partially loaded documents exist only in [`LoadMode::Lenient`], where the
//! dropped elements are listed in [`Layer::diagnostics`].

use crate::diagnostic::Diagnostic;
use crate::document::LayerDocument;
use crate::error::LayerError;
use crate::schema::LoadMode;
use serde_json::Value;
use std::path::Path;

/// Load state of a layer
#[derive(Debug, Clone, Default)]
pub enum LayerState {
    /// Nothing loaded, or the last load failed
    #[default]
    Unloaded,
    /// Document available
    Loaded(Box<LayerDocument>),
}

/// Layer document holder with load/save operations
#[derive(Debug, Clone, Default)]
pub struct Layer {
    mode: LoadMode,
    state: LayerState,
    diagnostics: Vec<Diagnostic>,
}

impl Layer {
    /// Create an unloaded layer using `mode` for future loads
    #[must_use]
    pub fn new(mode: LoadMode) -> Self {
        Self {
            mode,
            state: LayerState::Unloaded,
            diagnostics: Vec::new(),
        }
    }

    /// Wrap an already-built document
    #[must_use]
    pub fn from_document(document: LayerDocument) -> Self {
        Self {
            mode: LoadMode::default(),
            state: LayerState::Loaded(Box::new(document)),
            diagnostics: Vec::new(),
        }
    }

    /// Load from a parsed JSON value
    ///
    /// On failure the layer is left unloaded and the error returned.
    pub fn load_value(&mut self, raw: &Value) -> Result<&LayerDocument, LayerError> {
        self.state = LayerState::Unloaded;
        self.diagnostics.clear();

        match LayerDocument::load(raw, self.mode) {
            Ok(loaded) => {
                loaded.diagnostics.iter().for_each(Diagnostic::emit);
                self.diagnostics = loaded.diagnostics;
                self.state = LayerState::Loaded(Box::new(loaded.document));
                self.document().ok_or(LayerError::Unloaded)
            }
            Err(err) => {
                tracing::warn!(mode = ?self.mode, error = %err, "layer load failed");
                Err(err)
            }
        }
    }

    /// Load from JSON text
    pub fn load_str(&mut self, text: &str) -> Result<&LayerDocument, LayerError> {
        let raw: Value = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(err) => {
                self.state = LayerState::Unloaded;
                self.diagnostics.clear();
                return Err(err.into());
            }
        };
        self.load_value(&raw)
    }

    /// Load from a layer file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&LayerDocument, LayerError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.state = LayerState::Unloaded;
                self.diagnostics.clear();
                return Err(LayerError::io_error(path, err));
            }
        };
        tracing::info!(path = %path.display(), "loading layer");
        self.load_str(&text)
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &LayerState {
        &self.state
    }

    /// Loaded document, if any
    #[must_use]
    pub fn document(&self) -> Option<&LayerDocument> {
        match &self.state {
            LayerState::Loaded(doc) => Some(doc),
            LayerState::Unloaded => None,
        }
    }

    /// Take the loaded document out, leaving the layer unloaded
    pub fn take_document(&mut self) -> Option<LayerDocument> {
        match std::mem::take(&mut self.state) {
            LayerState::Loaded(doc) => Some(*doc),
            LayerState::Unloaded => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LayerState::Loaded(_))
    }

    /// Diagnostics from the last load
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Serialize the loaded document
    ///
    /// # Errors
    /// `LayerError::Unloaded` when nothing is loaded.
    pub fn to_value(&self) -> Result<Value, LayerError> {
        self.document().ok_or(LayerError::Unloaded)?.to_value()
    }

    /// Serialize the loaded document as pretty JSON
    pub fn to_json_string(&self) -> Result<String, LayerError> {
        let doc = self.document().ok_or(LayerError::Unloaded)?;
        Ok(serde_json::to_string_pretty(doc)?)
    }

    /// Write the loaded document to a file
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), LayerError> {
        let path = path.as_ref();
        let text = self.to_json_string()?;
        std::fs::write(path, text).map_err(|err| LayerError::io_error(path, err))?;
        tracing::info!(path = %path.display(), "layer saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "name": "sample",
            "domain": "enterprise-attack",
            "versions": {"layer": "4.1", "navigator": "4.1"},
            "techniques": [{"techniqueID": "T1110", "score": 1}]
        })
    }

    #[test]
    fn starts_unloaded() {
        let layer = Layer::new(LoadMode::Strict);
        assert!(!layer.is_loaded());
        assert!(matches!(layer.to_value(), Err(LayerError::Unloaded)));
    }

    #[test]
    fn failed_load_resets_to_unloaded() {
        let mut layer = Layer::new(LoadMode::Strict);
        layer.load_value(&valid()).unwrap();
        assert!(layer.is_loaded());

        let mut bad = valid();
        bad["bogus"] = json!(1);
        assert!(layer.load_value(&bad).is_err());
        assert!(!layer.is_loaded());
        assert!(layer.diagnostics().is_empty());
    }

    #[test]
    fn lenient_keeps_diagnostics() {
        let mut layer = Layer::new(LoadMode::Lenient);
        let mut doc = valid();
        doc["bogus"] = json!(1);
        layer.load_value(&doc).unwrap();
        assert!(layer.is_loaded());
        assert_eq!(layer.diagnostics().len(), 1);
    }

    #[test]
    fn invalid_json_text() {
        let mut layer = Layer::new(LoadMode::Lenient);
        assert!(matches!(layer.load_str("{not json"), Err(LayerError::Json(_))));
    }

    #[test]
    fn missing_file() {
        let mut layer = Layer::new(LoadMode::Strict);
        let err = layer.load_file("/nonexistent/layer.json").unwrap_err();
        assert!(matches!(err, LayerError::Io { .. }));
    }

    #[test]
    fn save_and_reload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.json");

        let mut layer = Layer::new(LoadMode::Strict);
        layer.load_value(&valid()).unwrap();
        layer.save_file(&path).unwrap();

        let mut again = Layer::new(LoadMode::Strict);
        again.load_file(&path).unwrap();
        assert_eq!(again.to_value().unwrap(), valid());
    }

    #[test]
    fn empty_filters_round_trip() {
        let mut doc = valid();
        doc["filters"] = json!({});
        let mut layer = Layer::new(LoadMode::Strict);
        let loaded = layer.load_value(&doc).unwrap();
        assert!(loaded.filters.as_ref().unwrap().platforms.is_empty());
        assert_eq!(layer.to_value().unwrap()["filters"], json!({}));
    }

    #[test]
    fn take_document_unloads() {
        let mut layer = Layer::new(LoadMode::Strict);
        layer.load_value(&valid()).unwrap();
        let doc = layer.take_document().unwrap();
        assert_eq!(doc.name, "sample");
        assert!(!layer.is_loaded());
    }
}
