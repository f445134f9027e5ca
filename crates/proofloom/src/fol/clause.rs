//! Clauses: immutable sorted literal sequences with cached attributes.

use super::interner::{Color, Interner};
use super::literal::LitId;
use super::term::TermStore;
use crate::error::Result;
use std::fmt;

/// Origin of a unit in the input problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    /// Axiom or derives from axioms
    #[default]
    Axiom,
    /// Assumption or derives from axioms and assumptions
    Assumption,
    /// Derives from a lemma
    Lemma,
    /// Derives from the goal
    Conjecture,
}

impl InputType {
    /// Map a TPTP role string onto an input type.
    pub fn from_tptp_role(role: &str) -> InputType {
        match role {
            "axiom" | "definition" | "theorem" | "corollary" => InputType::Axiom,
            "hypothesis" | "assumption" => InputType::Assumption,
            "lemma" => InputType::Lemma,
            "conjecture" | "negated_conjecture" => InputType::Conjecture,
            _ => InputType::Axiom,
        }
    }

    pub fn tptp_role(&self) -> &'static str {
        match self {
            InputType::Axiom => "axiom",
            InputType::Assumption => "hypothesis",
            InputType::Lemma => "lemma",
            InputType::Conjecture => "negated_conjecture",
        }
    }
}

/// An immutable clause: literals sorted by literal id so that variant
/// checking and duplicate detection are canonical.
///
/// The literal sequence, weight and color are fixed at construction; the
/// reference count is the only mutable field and lives in the unit store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<LitId>,
    weight: u32,
    color: Color,
    ref_count: u32,
}

impl Clause {
    /// Build a clause from literals. The sequence is sorted by literal id
    /// and the weight and color caches are computed once.
    pub fn new(store: &TermStore, mut literals: Vec<LitId>) -> Result<Clause> {
        literals.sort_unstable();
        let weight = literals.iter().map(|&l| store.literal_weight(l)).sum();
        let mut color = Color::Transparent;
        for &lit in &literals {
            color = color.combine(store.literal_color(lit))?;
        }
        Ok(Clause {
            literals,
            weight,
            color,
            ref_count: 0,
        })
    }

    /// The empty clause (the refutation).
    pub fn empty() -> Clause {
        Clause {
            literals: Vec::new(),
            weight: 0,
            color: Color::Transparent,
            ref_count: 0,
        }
    }

    pub fn literals(&self) -> &[LitId] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Cached symbol-count weight.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Cached combined color of the literals.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub(crate) fn inc_ref(&mut self) {
        self.ref_count += 1;
    }

    /// Decrement the reference count; underflow is fatal.
    pub(crate) fn dec_ref(&mut self) {
        assert!(self.ref_count > 0, "clause reference count underflow");
        self.ref_count -= 1;
    }

    /// Format with an interner for name resolution.
    pub fn display<'a>(&'a self, store: &'a TermStore, interner: &'a Interner) -> ClauseDisplay<'a> {
        ClauseDisplay {
            clause: self,
            store,
            interner,
        }
    }
}

/// Display wrapper for a clause that resolves symbol names.
pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    store: &'a TermStore,
    interner: &'a Interner,
}

impl<'a> fmt::Display for ClauseDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            return write!(f, "$false");
        }
        for (i, &lit) in self.clause.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", self.store.display_literal(self.interner, lit))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Literal;

    #[test]
    fn test_literals_sorted_canonically() {
        let mut interner = Interner::new();
        let mut store = TermStore::new();
        let i = interner.individual_sort();
        let p = interner.intern_predicate("p", 1);
        let q = interner.intern_predicate("q", 1);
        let a = interner.intern_function("a", 0);
        let ca = store.intern_constant(&interner, a, i).unwrap();

        let lp = store
            .intern_literal(&interner, Literal::positive(p, vec![ca]))
            .unwrap();
        let lq = store
            .intern_literal(&interner, Literal::positive(q, vec![ca]))
            .unwrap();

        let c1 = Clause::new(&store, vec![lq, lp]).unwrap();
        let c2 = Clause::new(&store, vec![lp, lq]).unwrap();
        assert_eq!(c1.literals(), c2.literals());
        assert_eq!(c1.weight(), 4);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_ref_count_underflow_is_fatal() {
        let mut clause = Clause::empty();
        clause.dec_ref();
    }
}
