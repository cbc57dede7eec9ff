//! Consistency checking for resolved documents
//!
//! Two passes run over the declaration graph: the reference checker (which
//! computes transitive dependency sets and flags cycles) and the unit
//! checker (which infers a unit for every declaration). Each pass memoizes
//! per-declaration results in the typed side tables of [`Analysis`], so a
//! declaration is analyzed exactly once no matter how many times it is
//! referenced or in which order the passes reach it.

mod references;
mod units;

pub use references::ReferenceChecker;
pub use units::{UnitChecker, resolve_annotation};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::diagnostics::Reporter;
use crate::resolve::ResolvedDocument;
use crate::scope::DeclId;
use crate::units::{Unit, UnitRegistry};

/// Per-declaration results of the checking passes: one typed slot per pass,
/// written at most once per declaration.
///
/// Not internally synchronized: callers running passes concurrently over
/// scopes that share declarations must provide their own synchronization.
#[derive(Debug, Default)]
pub struct Analysis {
    pub(crate) references: FxHashMap<DeclId, FxHashSet<DeclId>>,
    pub(crate) circular: FxHashSet<DeclId>,
    pub(crate) units: FxHashMap<DeclId, Option<Unit>>,
}

impl Analysis {
    /// The declarations this one transitively reads. Returns a copy so the
    /// cached set cannot be corrupted by callers.
    pub fn references(&self, id: DeclId) -> FxHashSet<DeclId> {
        self.references.get(&id).cloned().unwrap_or_default()
    }

    /// True when the declaration participates in, or depends on, a
    /// reference cycle.
    pub fn has_circular_reference(&self, id: DeclId) -> bool {
        self.circular.contains(&id)
    }

    /// The declaration's checked unit: the asserted annotation when present
    /// and consistent, otherwise the inferred unit. `None` when inference
    /// failed.
    pub fn assigned_unit(&self, id: DeclId) -> Option<&Unit> {
        self.units.get(&id).and_then(|unit| unit.as_ref())
    }
}

/// Run both checking passes over a resolved document.
pub fn analyze(
    resolved: &ResolvedDocument,
    registry: &UnitRegistry,
    reporter: &mut Reporter,
) -> Analysis {
    let mut analysis = Analysis::default();
    ReferenceChecker::new(resolved, &mut analysis, reporter).run();
    UnitChecker::new(resolved, registry, &mut analysis, reporter).run();
    debug!(
        declarations = resolved.scope.len(),
        cycles = analysis.circular.len(),
        "analysis complete"
    );
    analysis
}
