//! Banked substitutions.
//!
//! A substitution maps `(variable, bank)` pairs to terms tagged with the
//! bank their own variables live in. Banks let the two sides of a
//! unification share variable names without clashing: the query term's
//! variables live in [`VarBank::QUERY`], the indexed term's in
//! [`VarBank::RESULT`]. Bindings are recorded on a trail so tree traversal
//! can roll back to a checkpoint on backtracking.

use super::interner::Interner;
use super::term::{Term, TermId, TermStore};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;

/// Variable bank discriminator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarBank(pub u32);

impl VarBank {
    /// Bank of the query side of a unification.
    pub const QUERY: VarBank = VarBank(0);
    /// Bank of the result (indexed) side of a unification.
    pub const RESULT: VarBank = VarBank(1);
    /// Bank for internal helper variables.
    pub const INTERNAL: VarBank = VarBank(2);
}

/// A variable qualified by its bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VarSpec {
    pub var: u32,
    pub bank: VarBank,
}

impl VarSpec {
    pub fn new(var: u32, bank: VarBank) -> Self {
        VarSpec { var, bank }
    }
}

/// A term qualified by the bank of its variables.
pub type BankedTerm = (TermId, VarBank);

/// A backtrackable substitution over banked variables.
#[derive(Debug, Clone, Default)]
pub struct RobSubstitution {
    bindings: HashMap<VarSpec, BankedTerm>,
    trail: Vec<VarSpec>,
    /// Renaming of unbound variables into the output variable space,
    /// shared across all `apply` calls on this substitution.
    output: HashMap<VarSpec, u32>,
    next_output: u32,
}

impl RobSubstitution {
    pub fn new() -> Self {
        RobSubstitution::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn lookup(&self, spec: VarSpec) -> Option<BankedTerm> {
        self.bindings.get(&spec).copied()
    }

    pub fn is_bound(&self, spec: VarSpec) -> bool {
        self.bindings.contains_key(&spec)
    }

    /// Bind a variable. The caller must have dereferenced `spec` first;
    /// rebinding is a programming error.
    pub fn bind(&mut self, spec: VarSpec, term: BankedTerm) {
        let previous = self.bindings.insert(spec, term);
        debug_assert!(previous.is_none(), "variable bound twice");
        self.trail.push(spec);
    }

    /// Checkpoint for [`RobSubstitution::rollback_to`].
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Undo all bindings made since the checkpoint.
    pub fn rollback_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let spec = self.trail.pop().expect("trail shorter than mark");
            self.bindings.remove(&spec);
        }
    }

    /// Follow variable bindings until a non-variable term or an unbound
    /// variable is reached.
    pub fn deref(&self, store: &TermStore, term: TermId, bank: VarBank) -> BankedTerm {
        let mut current = (term, bank);
        loop {
            match store.term(current.0) {
                Term::Variable { var, .. } => {
                    match self.lookup(VarSpec::new(*var, current.1)) {
                        Some(next) => current = next,
                        None => return current,
                    }
                }
                _ => return current,
            }
        }
    }

    /// Whether `spec` occurs in `term` under the current bindings.
    pub fn occurs(&self, store: &TermStore, spec: VarSpec, term: TermId, bank: VarBank) -> bool {
        let (term, bank) = self.deref(store, term, bank);
        match store.term(term) {
            Term::Variable { var, .. } => VarSpec::new(*var, bank) == spec,
            Term::Application { args, .. } => {
                args.iter().any(|&arg| self.occurs(store, spec, arg, bank))
            }
        }
    }

    /// Apply the substitution in closed form, hash-consing the result.
    ///
    /// Unbound variables are renamed into a shared output variable space
    /// so that terms applied from different banks never capture each
    /// other's variables.
    pub fn apply(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        term: TermId,
        bank: VarBank,
    ) -> Result<TermId> {
        let (term, bank) = self.deref(store, term, bank);
        match store.term(term).clone() {
            Term::Variable { var, sort } => {
                let spec = VarSpec::new(var, bank);
                let out = match self.output.get(&spec) {
                    Some(&out) => out,
                    None => {
                        let out = self.next_output;
                        self.next_output += 1;
                        self.output.insert(spec, out);
                        out
                    }
                };
                Ok(store.intern_variable(out, sort))
            }
            Term::Application {
                functor,
                sort,
                args,
            } => {
                let mut new_args = Vec::with_capacity(args.len());
                for arg in args {
                    new_args.push(self.apply(store, interner, arg, bank)?);
                }
                store.intern_apply(interner, functor, sort, new_args)
            }
        }
    }
}

impl fmt::Display for VarSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}/{}", self.var, self.bank.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TermStore, Interner) {
        (TermStore::new(), Interner::new())
    }

    #[test]
    fn test_bind_and_deref() {
        let (mut store, mut interner) = setup();
        let i = interner.individual_sort();
        let x = store.intern_variable(0, i);
        let a_fn = interner.intern_function("a", 0);
        let a = store.intern_constant(&interner, a_fn, i).unwrap();

        let mut subst = RobSubstitution::new();
        subst.bind(VarSpec::new(0, VarBank::QUERY), (a, VarBank::RESULT));

        let (t, bank) = subst.deref(&store, x, VarBank::QUERY);
        assert_eq!(t, a);
        assert_eq!(bank, VarBank::RESULT);

        // The same variable in another bank is untouched
        let (t, bank) = subst.deref(&store, x, VarBank::RESULT);
        assert_eq!(t, x);
        assert_eq!(bank, VarBank::RESULT);
    }

    #[test]
    fn test_rollback() {
        let (mut store, interner) = setup();
        let i = interner.individual_sort();
        let x = store.intern_variable(0, i);
        let y = store.intern_variable(1, i);

        let mut subst = RobSubstitution::new();
        subst.bind(VarSpec::new(0, VarBank::QUERY), (y, VarBank::RESULT));
        let mark = subst.mark();
        subst.bind(VarSpec::new(1, VarBank::RESULT), (x, VarBank::QUERY));
        assert_eq!(subst.len(), 2);

        subst.rollback_to(mark);
        assert_eq!(subst.len(), 1);
        assert!(subst.is_bound(VarSpec::new(0, VarBank::QUERY)));
        assert!(!subst.is_bound(VarSpec::new(1, VarBank::RESULT)));
    }

    #[test]
    fn test_occurs_through_bindings() {
        let (mut store, mut interner) = setup();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 1);
        let x = store.intern_variable(0, i);
        let y = store.intern_variable(1, i);
        let fy = store.intern_apply(&interner, f, i, vec![y]).unwrap();

        let mut subst = RobSubstitution::new();
        subst.bind(VarSpec::new(1, VarBank::QUERY), (x, VarBank::QUERY));

        // X0 occurs in f(X1) because X1 is bound to X0
        assert!(subst.occurs(&store, VarSpec::new(0, VarBank::QUERY), fy, VarBank::QUERY));
        assert!(!subst.occurs(&store, VarSpec::new(2, VarBank::QUERY), fy, VarBank::QUERY));
    }

    #[test]
    fn test_apply_is_idempotent_on_ground_results() {
        let (mut store, mut interner) = setup();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 1);
        let a = interner.intern_function("a", 0);
        let ca = store.intern_constant(&interner, a, i).unwrap();
        let x = store.intern_variable(0, i);
        let fx = store.intern_apply(&interner, f, i, vec![x]).unwrap();

        let mut subst = RobSubstitution::new();
        subst.bind(VarSpec::new(0, VarBank::QUERY), (ca, VarBank::RESULT));

        let once = subst.apply(&mut store, &interner, fx, VarBank::QUERY).unwrap();
        let twice = subst.apply(&mut store, &interner, once, VarBank::QUERY).unwrap();
        assert_eq!(once, twice);
        assert!(store.is_ground(once));
    }

    #[test]
    fn test_apply_renames_unbound_variables_consistently() {
        let (mut store, mut interner) = setup();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 2);
        let x = store.intern_variable(5, i);
        let fxx = store.intern_apply(&interner, f, i, vec![x, x]).unwrap();

        let mut subst = RobSubstitution::new();
        let applied_q = subst.apply(&mut store, &interner, fxx, VarBank::QUERY).unwrap();
        let applied_r = subst.apply(&mut store, &interner, fxx, VarBank::RESULT).unwrap();

        // Same variable within one bank stays shared, across banks it differs
        assert_ne!(applied_q, applied_r);
        let again = subst.apply(&mut store, &interner, fxx, VarBank::QUERY).unwrap();
        assert_eq!(applied_q, again);
    }
}
