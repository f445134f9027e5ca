//! Proofloom: a first-order prover core with interpolation.
//!
//! Hash-consed terms and clauses, a unit/inference store forming the
//! proof DAG, unification with abstraction, substitution-tree indexing,
//! and an interpolant minimizer that encodes proof slicing as a weighted
//! boolean problem for an external SMT solver.

pub mod clausify;
pub mod config;
pub mod error;
pub mod fol;
pub mod index;
pub mod interpolation;
pub mod parser;
pub mod proof;
pub mod session;
pub mod smt;
pub mod stats;
pub mod unification;

// Re-export commonly used types from fol
pub use fol::{
    Clause, Color, Formula, FunctionId, InputType, Interner, LitId, Literal, PredicateId,
    RobSubstitution, SortId, Term, TermId, TermStore, VarBank, VarSpec,
};

// Re-export the proof DAG types
pub use proof::{Inference, Unit, UnitId, UnitPayload, UnitStore};

// Re-export unification types
pub use unification::{AbstractingUnifier, AbstractionPolicy, Constraint};

// Re-export indexing types
pub use index::{
    ClauseVariantIndex, LiteralClause, LiteralIndex, QueryIter, QueryRes, SubstitutionTree,
    TermIndex, TermLiteralClause,
};

// Re-export interpolation types
pub use interpolation::{minimized_interpolant, InterpolantMinimizer, Interpolants};

// Re-export the SMT back-end interface
pub use smt::{
    MinimizationResult, SmtBenchmark, SmtConstant, SmtFormula, SmtMinimizer, SmtModel, Z3Minimizer,
};

pub use clausify::{clausify, serialize_unit, ClausifyResult};
pub use config::{Budget, OptimizationTarget, SessionConfig};
pub use error::{ProofloomError, Result};
pub use parser::parse_tptp;
pub use session::Session;
pub use stats::Statistics;
