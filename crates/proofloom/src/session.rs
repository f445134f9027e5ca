//! The prover session: all per-run state in one owned object.
//!
//! There is no process-wide mutable state; the driver owns the session
//! and threads its stores through every construction call. Several
//! sessions can coexist in one process.

use crate::config::{Budget, SessionConfig};
use crate::fol::{Interner, TermStore};
use crate::proof::UnitStore;
use crate::stats::Statistics;

/// Symbol interner, term/literal store, proof DAG, statistics and
/// configuration of one prover run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub config: SessionConfig,
    pub interner: Interner,
    pub terms: TermStore,
    pub units: UnitStore,
    pub stats: Statistics,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            interner: Interner::new(),
            terms: TermStore::new(),
            units: UnitStore::new(),
            stats: Statistics::default(),
        }
    }

    /// A budget derived from the session configuration, starting now.
    pub fn budget(&self) -> Budget {
        Budget::from_config(&self.config)
    }

    /// Refresh the store-derived counters in the statistics block.
    pub fn snapshot_stats(&mut self) {
        self.stats.terms = self.terms.term_count();
        self.stats.literals = self.terms.literal_count();
        self.stats.units = self.units.len();
    }
}
