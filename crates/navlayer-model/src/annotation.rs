//! Per-technique annotations

use serde::{Deserialize, Serialize, Serializer};

/// Which tactic column(s) an annotation or rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TacticScope {
    /// Every column where the technique appears
    Any,
    /// Only the column for this tactic short name
    Only(String),
}

impl TacticScope {
    /// Build from an optional tactic short name
    #[must_use]
    pub fn from_tactic(tactic: Option<&str>) -> Self {
        match tactic {
            Some(t) => Self::Only(t.to_string()),
            None => Self::Any,
        }
    }

    /// Check scope against a column's tactic short name
    #[inline]
    #[must_use]
    pub fn matches(&self, column_tactic: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(t) => t == column_tactic,
        }
    }

    /// Tactic label for messages (`(none)` when unscoped)
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Any => "(none)",
            Self::Only(t) => t,
        }
    }
}

/// Metadata entry: a name/value pair or a divider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataEntry {
    /// Visual divider
    Divider { divider: bool },
    /// Name/value pair
    Pair { name: String, value: String },
}

impl MetadataEntry {
    /// Create name/value entry
    pub fn pair(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Pair {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// User override for one technique (optionally one tactic occurrence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_score"
    )]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_subtechniques: Option<bool>,
}

impl Annotation {
    /// Create bare annotation for a technique id
    pub fn new(technique_id: impl Into<String>) -> Self {
        Self {
            technique_id: technique_id.into(),
            tactic: None,
            comment: None,
            enabled: None,
            score: None,
            color: None,
            metadata: Vec::new(),
            show_subtechniques: None,
        }
    }

    /// Scope to one tactic
    #[must_use]
    pub fn with_tactic(mut self, tactic: impl Into<String>) -> Self {
        self.tactic = Some(tactic.into());
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_subtechniques_shown(mut self, show: bool) -> Self {
        self.show_subtechniques = Some(show);
        self
    }

    /// Column scope of this annotation
    #[must_use]
    pub fn scope(&self) -> TacticScope {
        TacticScope::from_tactic(self.tactic.as_deref())
    }

    /// Explicitly disabled (`enabled: false`)
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

/// Whole-number scores are written back as integers
fn serialize_score<S: Serializer>(score: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match score {
        Some(s) if s.fract() == 0.0 && s.abs() < 9.0e15 => serializer.serialize_some(&(*s as i64)),
        Some(s) => serializer.serialize_some(s),
        None => serializer.serialize_none(),
    }
}
