//! Units, inferences and the proof DAG.

pub mod inference;
pub mod unit;

pub use inference::Inference;
pub use unit::{Unit, UnitDisplay, UnitId, UnitPayload, UnitStore};
