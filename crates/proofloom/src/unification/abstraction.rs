//! Abstraction policies: when a unification mismatch becomes a constraint.
//!
//! Under an abstraction policy, certain mismatches between two terms do
//! not fail the unification; the pair is retained as a residual
//! disequality to be discharged later by a theory solver or by syntactic
//! unification of subterms. Exactly one policy is in force per
//! unification attempt.

use crate::fol::{Interner, SortId, Term, TermId, TermStore};

/// Abstraction policy for unification mismatches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AbstractionPolicy {
    /// Standard syntactic unification
    #[default]
    Off,
    /// Abstract iff both roots are theory-interpreted
    InterpOnly,
    /// Abstract iff at least one root is theory-interpreted
    OneInterp,
    /// `OneInterp` plus flattening and multiset cancellation of
    /// associative-commutative operators; unmatched residues become one
    /// disequality of the sums
    Ac1,
    /// `Ac1` plus binding of a single-variable residue to the sum of the
    /// opposite residue before residualizing
    Ac2,
    /// Higher-order extensionality: mismatching applicative terms of
    /// coinciding result sort residualize as a disequality of the whole
    /// applications
    FuncExt,
}

impl AbstractionPolicy {
    /// Whether this policy uses the interpreted-operator rules.
    pub fn uses_interpretation(self) -> bool {
        matches!(
            self,
            AbstractionPolicy::InterpOnly
                | AbstractionPolicy::OneInterp
                | AbstractionPolicy::Ac1
                | AbstractionPolicy::Ac2
        )
    }

    /// Whether this policy flattens associative-commutative operators.
    pub fn uses_ac(self) -> bool {
        matches!(self, AbstractionPolicy::Ac1 | AbstractionPolicy::Ac2)
    }
}

/// Whether a (dereferenced, non-variable) term has a theory-interpreted
/// root symbol.
pub(crate) fn interpreted_root(store: &TermStore, interner: &Interner, term: TermId) -> bool {
    match store.term(term) {
        Term::Variable { .. } => false,
        Term::Application { functor, .. } => interner.is_interpreted(*functor),
    }
}

/// The leftmost symbol of the applicative spine of a term.
pub(crate) fn head_symbol(
    store: &TermStore,
    interner: &Interner,
    term: TermId,
) -> Option<crate::fol::FunctionId> {
    match store.term(term) {
        Term::Variable { .. } => None,
        Term::Application { functor, args, .. } => {
            if *functor == interner.app_function() && !args.is_empty() {
                head_symbol(store, interner, args[0])
            } else {
                Some(*functor)
            }
        }
    }
}

fn is_app_rooted(store: &TermStore, interner: &Interner, term: TermId) -> bool {
    match store.term(term) {
        Term::Application { functor, .. } => *functor == interner.app_function(),
        Term::Variable { .. } => false,
    }
}

fn is_functional_sort(interner: &Interner, sort: SortId) -> bool {
    interner.is_arrow(sort) || sort == interner.bool_sort()
}

/// Decide whether the mismatch between two dereferenced non-variable
/// terms is abstracted under `policy` instead of decomposed or failed.
///
/// The AC merge of `Ac1`/`Ac2` (same AC root on both sides) is handled
/// before this check by the unifier itself.
pub(crate) fn can_abstract(
    store: &TermStore,
    interner: &Interner,
    policy: AbstractionPolicy,
    t1: TermId,
    t2: TermId,
) -> bool {
    match policy {
        AbstractionPolicy::Off => false,
        AbstractionPolicy::InterpOnly => {
            interpreted_root(store, interner, t1) && interpreted_root(store, interner, t2)
        }
        AbstractionPolicy::OneInterp | AbstractionPolicy::Ac1 | AbstractionPolicy::Ac2 => {
            interpreted_root(store, interner, t1) || interpreted_root(store, interner, t2)
        }
        AbstractionPolicy::FuncExt => {
            let s1 = store.sort(t1);
            let s2 = store.sort(t2);
            if s1 != s2 {
                return false;
            }
            let h1 = head_symbol(store, interner, t1);
            let h2 = head_symbol(store, interner, t2);
            if h1.is_none() || h1 == h2 {
                return false;
            }
            is_functional_sort(interner, s1)
                || (is_app_rooted(store, interner, t1) && is_app_rooted(store, interner, t2))
        }
    }
}
