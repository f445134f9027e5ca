//! Unification with abstraction.
//!
//! Robinson unification over banked terms, generalized so that controlled
//! mismatches (interpreted arithmetic, AC operators, higher-order
//! applications) are retained as residual disequality constraints instead
//! of failing.

pub mod abstraction;
pub mod unifier;

pub use abstraction::AbstractionPolicy;
pub use unifier::{AbstractingUnifier, Constraint, UnifierMark};
