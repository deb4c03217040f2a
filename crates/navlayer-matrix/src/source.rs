//! Framework data sources
//!
//! The builder only needs `query(filter) -> objects`. [`MemoryStore`] answers
//! it from a STIX 2.x bundle already on disk or in memory; remote
//! collections would implement the same trait.

use crate::error::{MatrixError, MatrixResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// STIX type of matrix definitions
pub const MATRIX_TYPE: &str = "x-mitre-matrix";
/// STIX type of tactics
pub const TACTIC_TYPE: &str = "x-mitre-tactic";
/// STIX type of techniques and sub-techniques
pub const TECHNIQUE_TYPE: &str = "attack-pattern";

/// Kill-chain phase reference on a technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillChainPhase {
    pub kill_chain_name: String,
    pub phase_name: String,
}

/// External reference carrying the framework identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The subset of a STIX object the matrix builder reads
///
/// Unrecognised properties are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StixObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kill_chain_phases: Vec<KillChainPhase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<ExternalReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tactic_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_shortname: Option<String>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub x_mitre_deprecated: bool,
}

impl StixObject {
    /// Framework identifier (`T1110`, `TA0006`) from the first external
    /// reference whose source names the framework
    #[must_use]
    pub fn attack_id(&self) -> Option<&str> {
        self.external_references
            .iter()
            .find(|r| r.source_name.contains("attack"))
            .and_then(|r| r.external_id.as_deref())
    }

    /// Neither revoked nor deprecated
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.revoked && !self.x_mitre_deprecated
    }

    /// Listed under `phase` of `kill_chain`
    #[must_use]
    pub fn in_phase(&self, kill_chain: &str, phase: &str) -> bool {
        self.kill_chain_phases
            .iter()
            .any(|p| p.kill_chain_name == kill_chain && p.phase_name == phase)
    }
}

/// Query filter: object type plus optional kill-chain phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFilter {
    pub kind: String,
    pub phase: Option<(String, String)>,
    pub include_inactive: bool,
}

impl ObjectFilter {
    /// Active objects of one STIX type
    pub fn of_type(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            phase: None,
            include_inactive: false,
        }
    }

    /// Restrict to a kill-chain phase
    #[must_use]
    pub fn in_phase(mut self, kill_chain: impl Into<String>, phase: impl Into<String>) -> Self {
        self.phase = Some((kill_chain.into(), phase.into()));
        self
    }

    /// Also return revoked and deprecated objects
    #[must_use]
    pub fn with_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Check an object against the filter
    #[must_use]
    pub fn matches(&self, object: &StixObject) -> bool {
        object.kind == self.kind
            && (self.include_inactive || object.is_active())
            && self
                .phase
                .as_ref()
                .map_or(true, |(chain, phase)| object.in_phase(chain, phase))
    }
}

/// Queryable framework data
#[cfg_attr(test, mockall::automock)]
pub trait FrameworkSource: Send + Sync {
    /// Identifier of the data snapshot (used as cache key)
    fn edition(&self) -> String;

    /// Objects matching a filter, in source order
    fn query(&self, filter: &ObjectFilter) -> MatrixResult<Vec<StixObject>>;
}

/// In-memory STIX bundle
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    edition: String,
    objects: Vec<StixObject>,
}

impl MemoryStore {
    /// Create store from objects
    pub fn new(edition: impl Into<String>, objects: Vec<StixObject>) -> Self {
        Self {
            edition: edition.into(),
            objects,
        }
    }

    /// Load a bundle value (`{"type": "bundle", "id": ..., "objects": [...]}`)
    ///
    /// The bundle id becomes the edition. Objects that do not parse are
    /// skipped; a bundle without an `objects` array is an error.
    pub fn from_bundle(bundle: &Value) -> MatrixResult<Self> {
        let edition = bundle
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("unversioned")
            .to_string();
        let raw = bundle
            .get("objects")
            .and_then(Value::as_array)
            .ok_or_else(|| MatrixError::malformed(&edition, "bundle has no objects array"))?;

        let mut objects = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for value in raw {
            match serde_json::from_value::<StixObject>(value.clone()) {
                Ok(object) => objects.push(object),
                Err(_) => skipped += 1,
            }
        }
        tracing::debug!(edition = %edition, objects = objects.len(), skipped, "bundle loaded");
        Ok(Self { edition, objects })
    }

    /// Load a bundle from JSON text
    pub fn from_json_str(text: &str) -> MatrixResult<Self> {
        let bundle: Value = serde_json::from_str(text)?;
        Self::from_bundle(&bundle)
    }

    /// Load a bundle file
    pub fn from_file(path: impl AsRef<Path>) -> MatrixResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MatrixError::io_error(path, e))?;
        tracing::info!(path = %path.display(), "reading framework bundle");
        Self::from_json_str(&text)
    }

    /// Override the edition identifier
    #[must_use]
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FrameworkSource for MemoryStore {
    fn edition(&self) -> String {
        self.edition.clone()
    }

    fn query(&self, filter: &ObjectFilter) -> MatrixResult<Vec<StixObject>> {
        Ok(self
            .objects
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }
}
