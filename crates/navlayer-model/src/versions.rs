//! Version triple and legacy migration
//!
//! Migration is a pure rewrite of the raw document: it never touches the
//! input and reports every change as an informational [`Diagnostic`].
//! The caller decides whether to surface the notes.

use crate::diagnostic::Diagnostic;
use crate::taxonomy::Domain;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Current layer format version
pub const CURRENT_LAYER_VERSION: &str = "4.1";

/// Navigator version written by default
pub const CURRENT_NAVIGATOR_VERSION: &str = "4.1";

/// Single-string versions accepted by the pre-4.0 format
pub const LEGACY_VERSIONS: &[&str] = &["3.0", "4.0", "4.1"];

/// `{layer, attack?, navigator}` version triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<String>,
    #[serde(default = "default_navigator")]
    pub navigator: String,
}

fn default_navigator() -> String {
    CURRENT_NAVIGATOR_VERSION.to_string()
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            layer: CURRENT_LAYER_VERSION.to_string(),
            attack: None,
            navigator: default_navigator(),
        }
    }
}

impl Versions {
    /// Set the framework edition the layer was authored against
    #[must_use]
    pub fn with_attack(mut self, attack: impl Into<String>) -> Self {
        self.attack = Some(attack.into());
        self
    }
}

/// Migrated document plus one note per rewrite
#[derive(Debug, Clone)]
pub struct Migrated {
    pub value: Value,
    pub notes: Vec<Diagnostic>,
}

impl Migrated {
    /// No rewrite was necessary
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Bring a raw layer up to the current representation
///
/// Rewrites applied, each with an info note:
/// - single `version` string → `versions` triple (`3.0` upgraded to `4.1`)
/// - `versions.layer` `3.0` → `4.1`
/// - missing `versions` → current defaults
/// - `mitre-enterprise` / `mitre-mobile` domains → current domain names
/// - `filters.stages` removed
///
/// Values that are not objects, and fields with unexpected shapes, are left
/// as they are for validation to report.
#[must_use]
pub fn migrate(raw: &Value) -> Migrated {
    let mut value = raw.clone();
    let mut notes = Vec::new();

    let Some(root) = value.as_object_mut() else {
        return Migrated { value, notes };
    };

    if let Some(Value::String(legacy)) = root.get("version").cloned() {
        if LEGACY_VERSIONS.contains(&legacy.as_str()) {
            root.remove("version");
            let layer = upgrade_layer_version(&legacy);
            if !root.contains_key("versions") {
                root.insert(
                    "versions".into(),
                    json!({"layer": layer, "navigator": CURRENT_NAVIGATOR_VERSION}),
                );
            }
            notes.push(Diagnostic::info(
                "layer.version",
                format!("converted legacy version '{legacy}' to versions.layer {layer}"),
            ));
        }
    }

    match root.get_mut("versions") {
        Some(Value::Object(versions)) => {
            if versions.get("layer").and_then(Value::as_str) == Some("3.0") {
                versions.insert("layer".into(), json!(CURRENT_LAYER_VERSION));
                notes.push(Diagnostic::info(
                    "layer.versions.layer",
                    format!("upgraded layer version 3.0 to {CURRENT_LAYER_VERSION}"),
                ));
            }
        }
        Some(_) => {}
        None => {
            root.insert(
                "versions".into(),
                json!({"layer": CURRENT_LAYER_VERSION, "navigator": CURRENT_NAVIGATOR_VERSION}),
            );
            notes.push(Diagnostic::info(
                "layer.versions",
                format!("no versions given, assuming layer {CURRENT_LAYER_VERSION}"),
            ));
        }
    }

    let legacy_domain = root
        .get("domain")
        .and_then(Value::as_str)
        .and_then(|d| Domain::from_legacy(d).map(|current| (d.to_string(), current)));
    if let Some((legacy, current)) = legacy_domain {
        root.insert("domain".into(), json!(current.as_str()));
        notes.push(Diagnostic::info(
            "layer.domain",
            format!("renamed legacy domain '{legacy}' to '{current}'"),
        ));
    }

    if let Some(Value::Object(filters)) = root.get_mut("filters") {
        if filters.remove("stages").is_some() {
            notes.push(Diagnostic::info(
                "layer.filters.stages",
                "removed filters.stages (no longer part of the format)",
            ));
        }
    }

    Migrated { value, notes }
}

fn upgrade_layer_version(legacy: &str) -> &str {
    if legacy == "3.0" {
        CURRENT_LAYER_VERSION
    } else {
        legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn legacy_version_string_becomes_triple() {
        let raw = json!({"name": "x", "domain": "enterprise-attack", "version": "3.0"});
        let out = migrate(&raw);
        assert_eq!(out.value["versions"], json!({"layer": "4.1", "navigator": "4.1"}));
        assert!(out.value.get("version").is_none());
        assert_eq!(out.notes.len(), 1);
        // input untouched
        assert_eq!(raw["version"], "3.0");
    }

    #[test]
    fn legacy_4_0_keeps_its_number() {
        let out = migrate(&json!({"version": "4.0"}));
        assert_eq!(out.value["versions"]["layer"], "4.0");
    }

    #[test]
    fn versions_layer_3_0_upgraded() {
        let out = migrate(&json!({"versions": {"layer": "3.0", "navigator": "4.0"}}));
        assert_eq!(out.value["versions"], json!({"layer": "4.1", "navigator": "4.0"}));
        assert_eq!(out.notes[0].path, "layer.versions.layer");
    }

    #[test]
    fn missing_versions_defaulted() {
        let out = migrate(&json!({"name": "x"}));
        assert_eq!(out.value["versions"], json!({"layer": "4.1", "navigator": "4.1"}));
        assert_eq!(out.notes.len(), 1);
    }

    #[test]
    fn legacy_domain_and_stages() {
        let raw = json!({
            "domain": "mitre-mobile",
            "versions": {"layer": "4.1", "navigator": "4.1"},
            "filters": {"stages": ["act"], "platforms": ["Android"]}
        });
        let out = migrate(&raw);
        assert_eq!(out.value["domain"], "mobile-attack");
        assert_eq!(out.value["filters"], json!({"platforms": ["Android"]}));
        assert_eq!(out.notes.len(), 2);
    }

    #[test]
    fn current_document_unchanged() {
        let raw = json!({
            "name": "x",
            "domain": "enterprise-attack",
            "versions": {"layer": "4.1", "navigator": "4.1"}
        });
        let out = migrate(&raw);
        assert!(out.is_unchanged());
        assert_eq!(out.value, raw);
    }

    #[test]
    fn unknown_legacy_version_left_for_validation() {
        let out = migrate(&json!({"version": "2.2", "versions": {"layer": "4.1"}}));
        assert_eq!(out.value["version"], "2.2");
    }

    #[test]
    fn non_object_passthrough() {
        let out = migrate(&json!("layer"));
        assert_eq!(out.value, json!("layer"));
        assert!(out.is_unchanged());
    }
}
