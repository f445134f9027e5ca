//! Interpolation: proof-DAG traversal, minimization encoding and
//! interpolant reconstruction.

pub mod interpolants;
pub mod minimizer;
pub mod splitter;
pub mod traverse;

pub use interpolants::Interpolants;
pub use minimizer::InterpolantMinimizer;
pub use splitter::{ClauseSplitter, ComponentInfo};
pub use traverse::{traverse_proof, ParentColorState, UnitInfo};

use crate::config::Budget;
use crate::error::Result;
use crate::fol::Formula;
use crate::proof::UnitId;
use crate::session::Session;
use crate::smt::SmtMinimizer;

/// Produce the minimized interpolant of a refutation under the session
/// configuration, recording the slicing count in the session statistics.
pub fn minimized_interpolant(
    session: &mut Session,
    refutation: UnitId,
    minimizer: &mut dyn SmtMinimizer,
    budget: &Budget,
) -> Result<Formula> {
    let Session {
        config,
        interner,
        terms,
        units,
        stats,
    } = session;
    let mut engine = InterpolantMinimizer::new(
        config.optimization_target,
        config.no_slicing,
        config.show_stats,
    );
    let interpolant = engine.interpolant(terms, interner, units, refutation, minimizer, budget)?;
    stats.sliced_off_nodes = engine.sliced_off_count();
    Ok(interpolant)
}
