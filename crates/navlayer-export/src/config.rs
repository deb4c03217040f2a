//! Export configuration
//!
//! Read from JSON or YAML (picked by file extension). Keys this version does
//! not know are logged and ignored so older tools can read newer files.

use crate::error::{ExportError, ExportResult};
use navlayer_model::{LayoutSettings, LoadMode, Rgb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Which sub-techniques get their own rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtechniqueDisplay {
    /// Only parents annotated with `showSubtechniques: true`
    #[default]
    Expanded,
    /// Every parent with children
    All,
    /// Never
    None,
}

/// Configuration file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format from a file extension; anything but `.yaml`/`.yml` is JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Settings for one export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sub-technique display policy
    pub subtechniques: SubtechniqueDisplay,
    /// Overrides the layer's `layout.showName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_name: Option<bool>,
    /// Overrides the layer's `layout.showID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_id: Option<bool>,
    /// Font color of disabled techniques
    pub dimmed_font_color: String,
    /// Fill of tactic header cells; falls back to the layer's tactic row
    /// background when that is switched on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_fill: Option<String>,
    /// Author attached to comment notes
    pub author: String,
    /// Load layers leniently
    pub lenient: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            subtechniques: SubtechniqueDisplay::Expanded,
            show_name: None,
            show_id: None,
            dimmed_font_color: "#909090".to_string(),
            header_fill: None,
            author: "navlayer".to_string(),
            lenient: false,
        }
    }
}

const KNOWN_KEYS: &[&str] = &[
    "subtechniques",
    "show_name",
    "show_id",
    "dimmed_font_color",
    "header_fill",
    "author",
    "lenient",
];

impl ExportConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_subtechniques(mut self, display: SubtechniqueDisplay) -> Self {
        self.subtechniques = display;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_show_name(mut self, show: bool) -> Self {
        self.show_name = Some(show);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_show_id(mut self, show: bool) -> Self {
        self.show_id = Some(show);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_header_fill(mut self, color: impl Into<String>) -> Self {
        self.header_fill = Some(color.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Layer load mode implied by `lenient`
    #[inline]
    #[must_use]
    pub fn load_mode(&self) -> LoadMode {
        if self.lenient {
            LoadMode::Lenient
        } else {
            LoadMode::Strict
        }
    }

    /// Label flags after applying overrides to the layer's layout
    #[must_use]
    pub fn label_flags(&self, layout: Option<&LayoutSettings>) -> (Option<bool>, Option<bool>) {
        (
            self.show_name.or_else(|| layout.and_then(|l| l.show_name)),
            self.show_id.or_else(|| layout.and_then(|l| l.show_id)),
        )
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// - `ExportError::Json` / `ExportError::Yaml` on syntax or type errors
    /// - `ExportError::Config` if the root is not a mapping or a color is
    ///   not hex
    pub fn parse(text: &str, format: ConfigFormat) -> ExportResult<Self> {
        let mut raw: Value = match format {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
        };
        let Some(map) = raw.as_object_mut() else {
            return Err(ExportError::config("configuration root must be a mapping"));
        };
        for key in unknown_keys(map.keys().map(String::as_str)) {
            tracing::warn!(key = %key, "unknown configuration key ignored");
            map.remove(&key);
        }

        let config: Self = serde_json::from_value(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> ExportResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ExportError::io_error(path, e))?;
        tracing::info!(path = %path.display(), "loading export configuration");
        Self::parse(&text, ConfigFormat::from_path(path))
    }

    /// Check color settings
    pub fn validate(&self) -> ExportResult<()> {
        if !Rgb::is_valid_hex(&self.dimmed_font_color) {
            return Err(ExportError::config(format!(
                "dimmed_font_color '{}' is not a hex color",
                self.dimmed_font_color
            )));
        }
        if let Some(fill) = self.header_fill.as_deref().filter(|f| !Rgb::is_valid_hex(f)) {
            return Err(ExportError::config(format!("header_fill '{fill}' is not a hex color")));
        }
        Ok(())
    }
}

/// Keys outside the configuration schema
pub fn unknown_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    keys.filter(|k| !KNOWN_KEYS.contains(k)).map(str::to_string).collect()
}
