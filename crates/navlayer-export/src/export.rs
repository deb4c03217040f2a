//! Export pipeline: layer document → styled sheet
//!
//! ```text
//! LayerDocument ─┬─► ScoreOverlay ──► adjust_ordering ─┐
//!                ├─► ExpansionRules + exclusions ──────┼─► build_grid ─► style_grid ─► RenderedSheet
//!                └─► LabelMode ────────────────────────┘
//! ```
//!
//! The matrix comes from the shared cache and is only read.

use crate::config::{ExportConfig, SubtechniqueDisplay};
use crate::error::{ExportError, ExportResult};
use crate::render::RenderedSheet;
use crate::style::style_grid;
use navlayer_matrix::{
    adjust_ordering, build_grid, ExpansionRules, FrameworkSource, GridLayout, LabelMode, MatrixCache, ScopeRule,
    ScoreOverlay,
};
use navlayer_model::{Diagnostic, Domain, LayerDocument, Severity};
use std::sync::Arc;

/// Sheet plus the diagnostics gathered while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    /// Styled output sheet
    pub sheet: RenderedSheet,
    /// Unstyled grid the sheet was built from
    pub layout: GridLayout,
    /// Info notes and warnings, in annotation order
    pub diagnostics: Vec<Diagnostic>,
}

impl Export {
    /// Warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// Exports layers of one domain against one framework source
///
/// Cheap to clone; clones share the source and the matrix cache.
#[derive(Clone)]
pub struct Exporter {
    domain: Domain,
    source: Arc<dyn FrameworkSource>,
    cache: MatrixCache,
    config: ExportConfig,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("domain", &self.domain)
            .field("edition", &self.source.edition())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Create exporter with a private cache and default configuration
    pub fn new(domain: Domain, source: Arc<dyn FrameworkSource>) -> Self {
        Self {
            domain,
            source,
            cache: MatrixCache::default(),
            config: ExportConfig::default(),
        }
    }

    /// Share a matrix cache with other exporters
    #[must_use]
    pub fn with_cache(mut self, cache: MatrixCache) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Lay out and style one layer
    ///
    /// # Errors
    /// - `ExportError::DomainMismatch` if the layer is for another domain
    /// - `ExportError::Matrix` if the framework matrix cannot be built
    pub fn export(&self, document: &LayerDocument) -> ExportResult<Export> {
        if document.domain() != self.domain {
            return Err(ExportError::DomainMismatch {
                expected: self.domain,
                actual: document.domain(),
            });
        }

        let matrix = self.cache.get_or_build(self.source.as_ref(), self.domain)?;
        let overlay = ScoreOverlay::from_annotations(&document.techniques);
        let ordered = adjust_ordering(&matrix, document.sort_mode(), &overlay);

        let expansion = match self.config.subtechniques {
            SubtechniqueDisplay::Expanded => ExpansionRules::from_annotations(&document.techniques),
            SubtechniqueDisplay::All => ExpansionRules::all(),
            SubtechniqueDisplay::None => ExpansionRules::none(),
        };
        let excluded = hidden_rules(document);
        let (show_name, show_id) = self.config.label_flags(document.layout.as_ref());
        let labels = LabelMode::from_flags(show_name, show_id);

        let layout = build_grid(&ordered, &expansion, &excluded, labels);
        let styled = style_grid(&layout, document, &self.config);
        styled.diagnostics.iter().for_each(Diagnostic::emit);

        let sheet = RenderedSheet {
            title: document.name.clone(),
            domain: self.domain,
            edition: matrix.edition.clone(),
            rows: layout.grid.max_row(),
            columns: layout.grid.max_column(),
            cells: styled.cells,
            merges: layout.merges.clone(),
            legend: document.legend_items.clone(),
        };
        tracing::info!(
            layer = %document.name,
            cells = sheet.cells.len(),
            diagnostics = styled.diagnostics.len(),
            "layer exported"
        );
        Ok(Export {
            sheet,
            layout,
            diagnostics: styled.diagnostics,
        })
    }
}

/// Exclusions for disabled annotations when the layer hides them
#[must_use]
pub fn hidden_rules(document: &LayerDocument) -> Vec<ScopeRule> {
    if !document.hides_disabled() {
        return Vec::new();
    }
    document
        .techniques
        .iter()
        .filter(|a| a.is_disabled())
        .map(|a| ScopeRule {
            id: a.technique_id.clone(),
            scope: a.scope(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navlayer_model::{Annotation, TacticScope};
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_rules_only_when_hidden() {
        let document = LayerDocument::new("x", Domain::Enterprise)
            .with_annotation(Annotation::new("T1").with_enabled(false).with_tactic("impact"))
            .with_annotation(Annotation::new("T2").with_enabled(true));
        assert!(hidden_rules(&document).is_empty());

        let document = document.with_hide_disabled(true);
        assert_eq!(
            hidden_rules(&document),
            vec![ScopeRule {
                id: "T1".into(),
                scope: TacticScope::Only("impact".into()),
            }]
        );
    }
}
