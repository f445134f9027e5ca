//! First-order logic data structures
//!
//! Hash-consed terms and literals, clauses, formula trees and banked
//! substitutions, plus the session symbol interner.

pub mod clause;
pub mod formula;
pub mod interner;
pub mod literal;
pub mod substitution;
pub mod term;

// Re-export commonly used types
pub use clause::{Clause, ClauseDisplay, InputType};
pub use formula::{Formula, FormulaDisplay};
pub use interner::{Color, FunctionId, Interner, PredicateId, SortId};
pub use literal::{LitId, Literal, LiteralDisplay};
pub use substitution::{BankedTerm, RobSubstitution, VarBank, VarSpec};
pub use term::{Term, TermDisplay, TermId, TermStore};
