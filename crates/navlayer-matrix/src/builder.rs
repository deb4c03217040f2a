//! Matrix construction from a framework source

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::{FrameworkEntry, Matrix, TacticColumn};
use crate::source::{FrameworkSource, ObjectFilter, StixObject, MATRIX_TYPE, TACTIC_TYPE, TECHNIQUE_TYPE};
use indexmap::IndexMap;
use navlayer_model::{parent_id, Domain};

/// Builds a [`Matrix`] from framework objects
///
/// Deterministic and side-effect free: the same source and domain always
/// produce the same matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixBuilder;

impl MatrixBuilder {
    /// Create new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the matrix for a domain
    ///
    /// Tactics follow the first matrix definition's `tactic_refs`; each
    /// column lists the active techniques in that tactic's kill-chain phase,
    /// sub-techniques grouped under their parent, both sorted by name.
    ///
    /// # Errors
    /// - `MatrixError::NoMatrix` if the source has no matrix definition
    /// - `MatrixError::MalformedObject` for a tactic without a short name
    /// - any error the source returns
    pub fn build(&self, source: &dyn FrameworkSource, domain: Domain) -> MatrixResult<Matrix> {
        let edition = source.edition();
        let definition = source
            .query(&ObjectFilter::of_type(MATRIX_TYPE))?
            .into_iter()
            .next()
            .ok_or_else(|| MatrixError::NoMatrix {
                domain,
                edition: edition.clone(),
            })?;

        let tactics = source.query(&ObjectFilter::of_type(TACTIC_TYPE))?;
        let mut columns = Vec::with_capacity(definition.tactic_refs.len());
        for tactic_ref in &definition.tactic_refs {
            let Some(tactic) = tactics.iter().find(|t| &t.id == tactic_ref) else {
                tracing::warn!(tactic = %tactic_ref, "matrix references unknown tactic, skipping");
                continue;
            };
            columns.push(self.column(source, domain, tactic)?);
        }

        tracing::debug!(
            domain = %domain,
            edition = %edition,
            tactics = columns.len(),
            "matrix built"
        );
        Ok(Matrix {
            domain,
            edition,
            columns,
        })
    }

    fn column(&self, source: &dyn FrameworkSource, domain: Domain, tactic: &StixObject) -> MatrixResult<TacticColumn> {
        let short_name = tactic
            .x_mitre_shortname
            .clone()
            .or_else(|| domain.tactic_short_name(&tactic.name).map(str::to_string))
            .ok_or_else(|| MatrixError::malformed(&tactic.id, "tactic has no short name"))?;
        let tactic_entry = FrameworkEntry::new(tactic.attack_id().unwrap_or(&tactic.id), &tactic.name);

        let filter = ObjectFilter::of_type(TECHNIQUE_TYPE).in_phase(domain.kill_chain_name(), &short_name);
        let mut techniques = Vec::new();
        let mut children: Vec<(String, FrameworkEntry)> = Vec::new();
        for object in source.query(&filter)? {
            let Some(id) = object.attack_id() else {
                tracing::debug!(object = %object.id, "technique without framework id, skipping");
                continue;
            };
            let entry = FrameworkEntry::new(id, &object.name);
            match parent_id(id) {
                Some(parent) => children.push((parent.to_string(), entry)),
                None => techniques.push(entry),
            }
        }

        techniques.sort_by(|a, b| a.name.cmp(&b.name));

        let mut subtechniques: IndexMap<String, Vec<FrameworkEntry>> = IndexMap::new();
        for technique in &techniques {
            let mut group: Vec<FrameworkEntry> = children
                .iter()
                .filter(|(parent, _)| *parent == technique.id)
                .map(|(_, entry)| entry.clone())
                .collect();
            if group.is_empty() {
                continue;
            }
            group.sort_by(|a, b| a.name.cmp(&b.name));
            subtechniques.insert(technique.id.clone(), group);
        }

        let orphans = children
            .iter()
            .filter(|(parent, _)| !subtechniques.contains_key(parent))
            .count();
        if orphans > 0 {
            tracing::debug!(tactic = %short_name, orphans, "sub-techniques without a parent in column dropped");
        }

        Ok(TacticColumn {
            tactic: tactic_entry,
            short_name,
            techniques,
            subtechniques,
        })
    }
}
