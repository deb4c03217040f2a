//! Per-cell style resolution
//!
//! Annotations are applied in document order to the cells that render their
//! technique; a later annotation overwrites whatever an earlier one set on
//! the same cell. Fill precedence is explicit color, then gradient(score),
//! then nothing. Disabled techniques are dimmed and get no fill.

use crate::config::ExportConfig;
use navlayer_matrix::{find_coordinates, CellKind, Coordinate, GridLayout, Placement};
use navlayer_model::{Annotation, Diagnostic, Gradient, LayerDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Comment attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub author: String,
}

/// Visual attributes of one cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

impl CellStyle {
    #[inline]
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self == &Self::default()
    }

    fn overwrite(&mut self, other: CellStyle) {
        if other.fill.is_some() {
            self.fill = other.fill;
        }
        if other.font_color.is_some() {
            self.font_color = other.font_color;
        }
        if other.note.is_some() {
            self.note = other.note;
        }
    }
}

/// Grid cell with its resolved style, ready for a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledCell {
    pub row: usize,
    pub column: usize,
    pub label: String,
    pub id: String,
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "CellStyle::is_plain")]
    pub style: CellStyle,
}

/// Turns annotations into cell styles
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    gradient: Option<&'a Gradient>,
    config: &'a ExportConfig,
}

impl<'a> StyleResolver<'a> {
    pub fn new(gradient: Option<&'a Gradient>, config: &'a ExportConfig) -> Self {
        Self { gradient, config }
    }

    /// Style one annotation contributes to each of its cells
    #[must_use]
    pub fn resolve(&self, annotation: &Annotation) -> CellStyle {
        let note = annotation.comment.as_ref().map(|text| Note {
            text: text.clone(),
            author: self.config.author.clone(),
        });

        if annotation.is_disabled() {
            return CellStyle {
                fill: None,
                font_color: Some(self.config.dimmed_font_color.clone()),
                note,
            };
        }

        let fill = annotation.color.clone().or_else(|| {
            let score = annotation.score?;
            self.gradient.map(|g| g.compute_color(score))
        });
        CellStyle {
            fill,
            font_color: None,
            note,
        }
    }
}

/// Styled cells plus the per-annotation diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledGrid {
    pub cells: Vec<StyledCell>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve every annotation of `document` against `layout`
///
/// Unresolved annotations produce one warning each and are skipped; an
/// annotation whose sub-technique is collapsed under its parent produces an
/// informational note. Disabled annotations removed by `hideDisabled` are
/// skipped silently.
#[must_use]
pub fn style_grid(layout: &GridLayout, document: &LayerDocument, config: &ExportConfig) -> StyledGrid {
    let resolver = StyleResolver::new(document.gradient.as_ref(), config);
    let mut styles: BTreeMap<Coordinate, CellStyle> = BTreeMap::new();
    let mut diagnostics = Vec::new();

    if let Some(fill) = header_fill(document, config) {
        for (at, cell) in layout.grid.iter() {
            if cell.kind == CellKind::TacticHeader {
                styles.entry(*at).or_default().fill = Some(fill.to_string());
            }
        }
    }

    for (index, annotation) in document.techniques.iter().enumerate() {
        if annotation.is_disabled() && document.hides_disabled() {
            tracing::debug!(technique = %annotation.technique_id, "disabled technique hidden");
            continue;
        }
        let path = format!("techniques[{index}]");
        let scope = annotation.scope();
        match find_coordinates(layout, &annotation.technique_id, annotation.tactic.as_deref()) {
            Placement::Found(coordinates) => {
                let style = resolver.resolve(annotation);
                for at in coordinates {
                    styles.entry(at).or_default().overwrite(style.clone());
                }
            }
            Placement::Hidden => diagnostics.push(Diagnostic::info(
                path,
                format!(
                    "{}/{} is collapsed under its parent",
                    annotation.technique_id,
                    scope.label()
                ),
            )),
            Placement::Absent => diagnostics.push(Diagnostic::warning(
                path,
                format!(
                    "unresolved technique {}/{} is not in the matrix, skipping",
                    annotation.technique_id,
                    scope.label()
                ),
            )),
        }
    }

    let cells = layout
        .grid
        .iter()
        .map(|(at, cell)| StyledCell {
            row: at.row,
            column: at.column,
            label: cell.label.clone(),
            id: cell.id.clone(),
            kind: cell.kind,
            style: styles.remove(at).unwrap_or_default(),
        })
        .collect();
    StyledGrid { cells, diagnostics }
}

fn header_fill<'a>(document: &'a LayerDocument, config: &'a ExportConfig) -> Option<&'a str> {
    config.header_fill.as_deref().or_else(|| {
        document
            .show_tactic_row_background
            .filter(|show| *show)
            .and(document.tactic_row_background.as_deref())
    })
}
