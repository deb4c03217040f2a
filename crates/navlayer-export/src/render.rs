//! Renderer seam
//!
//! A [`RenderedSheet`] is everything a backend needs: cells with resolved
//! styles, merge regions and the legend. Spreadsheet or vector backends
//! implement [`Renderer`]; the built-in ones write JSON and plain text.

use crate::error::{ExportError, ExportResult};
use crate::style::StyledCell;
use navlayer_matrix::MergeRegion;
use navlayer_model::{Domain, LegendItem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

/// Styled grid for one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSheet {
    pub title: String,
    pub domain: Domain,
    pub edition: String,
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<StyledCell>,
    pub merges: Vec<MergeRegion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendItem>,
}

impl RenderedSheet {
    /// Cell at a position
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&StyledCell> {
        self.cells.iter().find(|c| c.row == row && c.column == column)
    }

    /// Cells rendering a framework id
    pub fn cells_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a StyledCell> + 'a {
        self.cells.iter().filter(move |c| c.id == id)
    }
}

/// Output format of the built-in renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    /// Format implied by an output path (`.txt`/`.tsv` are text)
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("txt" | "tsv") => Some(Self::Text),
            _ => None,
        }
    }

    /// Renderer for this format
    #[must_use]
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Self::Json => Box::new(JsonRenderer::default()),
            Self::Text => Box::new(TextRenderer),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Output backend
pub trait Renderer: Send + Sync {
    /// Encode a sheet
    fn render(&self, sheet: &RenderedSheet) -> ExportResult<String>;

    /// Encode a sheet into a file
    fn write_file(&self, sheet: &RenderedSheet, path: &Path) -> ExportResult<()> {
        let body = self.render(sheet)?;
        std::fs::write(path, body).map_err(|e| ExportError::io_error(path, e))?;
        tracing::info!(path = %path.display(), cells = sheet.cells.len(), "sheet written");
        Ok(())
    }
}

/// Full sheet as JSON
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, sheet: &RenderedSheet) -> ExportResult<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(sheet)?
        } else {
            serde_json::to_string(sheet)?
        })
    }
}

/// Tab-separated grid followed by merge and style listings
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, sheet: &RenderedSheet) -> ExportResult<String> {
        let mut out = String::new();
        let _ = writeln!(out, "# {} ({}, {})", sheet.title, sheet.domain, sheet.edition);
        for row in 1..=sheet.rows {
            let line: Vec<&str> = (1..=sheet.columns)
                .map(|column| sheet.cell(row, column).map_or("", |c| c.label.as_str()))
                .collect();
            let _ = writeln!(out, "{}", line.join("\t").trim_end_matches('\t'));
        }

        if !sheet.merges.is_empty() {
            let _ = writeln!(out, "\n# merges");
            for m in &sheet.merges {
                let _ = writeln!(
                    out,
                    "r{}c{} span {}x{}",
                    m.start_row, m.column, m.row_span, m.col_span
                );
            }
        }

        let styled: Vec<&StyledCell> = sheet.cells.iter().filter(|c| !c.style.is_plain()).collect();
        if !styled.is_empty() {
            let _ = writeln!(out, "\n# styles");
            for cell in styled {
                let mut parts = Vec::new();
                if let Some(fill) = &cell.style.fill {
                    parts.push(format!("fill={fill}"));
                }
                if let Some(font) = &cell.style.font_color {
                    parts.push(format!("font={font}"));
                }
                if let Some(note) = &cell.style.note {
                    parts.push(format!("note={:?} ({})", note.text, note.author));
                }
                let _ = writeln!(out, "r{}c{} {} {}", cell.row, cell.column, cell.id, parts.join(" "));
            }
        }
        Ok(out)
    }
}
