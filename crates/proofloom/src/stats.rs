//! Session statistics, printed as a block by the top-level handler.

use serde::Serialize;
use std::fmt;

/// Counters accumulated over a session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    /// Distinct terms interned
    pub terms: usize,
    /// Distinct literals interned
    pub literals: usize,
    /// Units registered in the proof DAG
    pub units: usize,
    /// Clauses removed as tautologies during clausification
    pub tautologies_deleted: usize,
    /// Duplicate literals removed during clausification
    pub duplicate_literals_removed: usize,
    /// Trivial inequalities removed during clausification
    pub trivial_inequalities_removed: usize,
    /// Proof nodes sliced off by the interpolant minimizer
    pub sliced_off_nodes: usize,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------------------------")?;
        writeln!(f, "terms: {}", self.terms)?;
        writeln!(f, "literals: {}", self.literals)?;
        writeln!(f, "units: {}", self.units)?;
        writeln!(f, "tautologies deleted: {}", self.tautologies_deleted)?;
        writeln!(
            f,
            "duplicate literals removed: {}",
            self.duplicate_literals_removed
        )?;
        writeln!(
            f,
            "trivial inequalities removed: {}",
            self.trivial_inequalities_removed
        )?;
        writeln!(f, "sliced off nodes: {}", self.sliced_off_nodes)?;
        write!(f, "------------------------------")
    }
}
