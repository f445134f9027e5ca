//! Robinson unification extended with abstraction.
//!
//! [`AbstractingUnifier::unify`] computes a substitution σ and a set C of
//! residual disequality constraints such that `σ(a) = σ(b) ∨ ∃ℓ∈C. ℓ`.
//! Callers deriving inferences from the unifier must carry C forward into
//! the derived clause. `None` is returned only when the pair is unifiable
//! under no extension permitted by the policy; the occurs check is always
//! performed on the syntactic part and is never bypassed by abstraction.

use super::abstraction::{can_abstract, AbstractionPolicy};
use crate::error::Result;
use crate::fol::{
    BankedTerm, Interner, LitId, Literal, RobSubstitution, Term, TermId, TermStore, VarBank,
    VarSpec,
};

/// A residual disequality recorded during unification. The literal form
/// is produced on demand by applying the final substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub lhs: BankedTerm,
    pub rhs: BankedTerm,
}

/// Checkpoint of a unifier state, for backtracking tree traversal.
#[derive(Debug, Clone, Copy)]
pub struct UnifierMark {
    subs: usize,
    constraints: usize,
}

/// A substitution together with the residual constraints accumulated
/// while computing it.
#[derive(Debug, Clone)]
pub struct AbstractingUnifier {
    subs: RobSubstitution,
    constraints: Vec<Constraint>,
    policy: AbstractionPolicy,
}

impl AbstractingUnifier {
    pub fn new(policy: AbstractionPolicy) -> Self {
        AbstractingUnifier {
            subs: RobSubstitution::new(),
            constraints: Vec::new(),
            policy,
        }
    }

    /// Unify two banked terms under an abstraction policy.
    pub fn unify(
        store: &mut TermStore,
        interner: &Interner,
        a: TermId,
        a_bank: VarBank,
        b: TermId,
        b_bank: VarBank,
        policy: AbstractionPolicy,
        fixed_point: bool,
    ) -> Result<Option<AbstractingUnifier>> {
        let mut unifier = AbstractingUnifier::new(policy);
        if !unifier.unify_step(store, interner, (a, a_bank), (b, b_bank))? {
            return Ok(None);
        }
        if fixed_point && !unifier.run_fixed_point(store, interner)? {
            return Ok(None);
        }
        Ok(Some(unifier))
    }

    pub fn policy(&self) -> AbstractionPolicy {
        self.policy
    }

    pub fn subs(&self) -> &RobSubstitution {
        &self.subs
    }

    pub(crate) fn subs_mut(&mut self) -> &mut RobSubstitution {
        &mut self.subs
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Apply the computed substitution to a banked term.
    pub fn apply(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        term: TermId,
        bank: VarBank,
    ) -> Result<TermId> {
        self.subs.apply(store, interner, term, bank)
    }

    /// The residual constraints as disequality literals under the final
    /// substitution, deduplicated modulo literal identity. Constraints
    /// whose sides became identical are dropped.
    pub fn constraint_literals(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
    ) -> Result<Vec<LitId>> {
        let mut seen = Vec::new();
        let mut literals = Vec::new();
        for i in 0..self.constraints.len() {
            let c = self.constraints[i];
            let lhs = self.subs.apply(store, interner, c.lhs.0, c.lhs.1)?;
            let rhs = self.subs.apply(store, interner, c.rhs.0, c.rhs.1)?;
            if lhs == rhs {
                continue;
            }
            let key = if lhs < rhs { (lhs, rhs) } else { (rhs, lhs) };
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            let lit = store.intern_literal(
                interner,
                Literal::negative(interner.eq_predicate(), vec![lhs, rhs]),
            )?;
            literals.push(lit);
        }
        Ok(literals)
    }

    /// Checkpoint for [`AbstractingUnifier::rollback_to`].
    pub fn mark(&self) -> UnifierMark {
        UnifierMark {
            subs: self.subs.mark(),
            constraints: self.constraints.len(),
        }
    }

    /// Undo all bindings and constraints recorded since the checkpoint.
    pub fn rollback_to(&mut self, mark: UnifierMark) {
        self.subs.rollback_to(mark.subs);
        self.constraints.truncate(mark.constraints);
    }

    /// Unify one pair under the current state. Returns `false` on a hard
    /// failure (clash with no permitted abstraction, or occurs check).
    pub(crate) fn unify_step(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        lhs: BankedTerm,
        rhs: BankedTerm,
    ) -> Result<bool> {
        let mut stack = vec![(lhs, rhs)];
        while let Some((l, r)) = stack.pop() {
            let (t1, b1) = self.subs.deref(store, l.0, l.1);
            let (t2, b2) = self.subs.deref(store, r.0, r.1);
            if t1 == t2 && (b1 == b2 || store.is_ground(t1)) {
                continue;
            }

            let term1 = store.term(t1).clone();
            let term2 = store.term(t2).clone();
            match (&term1, &term2) {
                (Term::Variable { var, sort }, _) => {
                    if *sort != term2.sort() {
                        return Ok(false);
                    }
                    let spec = VarSpec::new(*var, b1);
                    if self.subs.occurs(store, spec, t2, b2) {
                        return Ok(false);
                    }
                    self.subs.bind(spec, (t2, b2));
                }
                (_, Term::Variable { var, sort }) => {
                    if *sort != term1.sort() {
                        return Ok(false);
                    }
                    let spec = VarSpec::new(*var, b2);
                    if self.subs.occurs(store, spec, t1, b1) {
                        return Ok(false);
                    }
                    self.subs.bind(spec, (t1, b1));
                }
                (
                    Term::Application {
                        functor: f1,
                        sort: s1,
                        args: args1,
                    },
                    Term::Application {
                        functor: f2,
                        sort: s2,
                        args: args2,
                    },
                ) => {
                    if self.policy.uses_ac() && f1 == f2 && interner.is_ac(*f1) {
                        self.merge_ac(store, interner, *f1, *s1, (t1, b1), (t2, b2))?;
                        continue;
                    }
                    if can_abstract(store, interner, self.policy, t1, t2) {
                        self.constraints.push(Constraint {
                            lhs: (t1, b1),
                            rhs: (t2, b2),
                        });
                        continue;
                    }
                    if f1 != f2 || s1 != s2 || args1.len() != args2.len() {
                        return Ok(false);
                    }
                    // Pushed left to right, popped LIFO: the rightmost
                    // argument pair is processed first.
                    for (&a1, &a2) in args1.iter().zip(args2.iter()) {
                        stack.push(((a1, b1), (a2, b2)));
                    }
                }
            }
        }
        Ok(true)
    }

    /// Flatten nested applications of an AC operator into their argument
    /// list, dereferencing through the substitution at every element.
    fn flatten_ac(
        &self,
        store: &TermStore,
        functor: crate::fol::FunctionId,
        term: BankedTerm,
        out: &mut Vec<BankedTerm>,
    ) {
        let (t, b) = self.subs.deref(store, term.0, term.1);
        match store.term(t) {
            Term::Application { functor: f, args, .. } if *f == functor => {
                for &arg in args {
                    self.flatten_ac(store, functor, (arg, b), out);
                }
            }
            _ => out.push((t, b)),
        }
    }

    /// Unify two terms rooted in the same AC operator: flatten both
    /// sides, cancel syntactically equal elements (under the current
    /// substitution) as multisets, and residualize what remains.
    fn merge_ac(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        functor: crate::fol::FunctionId,
        sort: crate::fol::SortId,
        lhs: BankedTerm,
        rhs: BankedTerm,
    ) -> Result<()> {
        let mut left = Vec::new();
        let mut right = Vec::new();
        self.flatten_ac(store, functor, lhs, &mut left);
        self.flatten_ac(store, functor, rhs, &mut right);

        let left_applied: Vec<TermId> = left
            .iter()
            .map(|e| self.subs.apply(store, interner, e.0, e.1))
            .collect::<Result<_>>()?;
        let right_applied: Vec<TermId> = right
            .iter()
            .map(|e| self.subs.apply(store, interner, e.0, e.1))
            .collect::<Result<_>>()?;

        // Multiset cancellation of equal elements
        let mut right_used = vec![false; right.len()];
        let mut residue_l = Vec::new();
        for (i, &elem) in left.iter().enumerate() {
            let matched =
                (0..right.len()).find(|&j| !right_used[j] && right_applied[j] == left_applied[i]);
            match matched {
                Some(j) => right_used[j] = true,
                None => residue_l.push(elem),
            }
        }
        let residue_r: Vec<BankedTerm> = right
            .iter()
            .enumerate()
            .filter(|(j, _)| !right_used[*j])
            .map(|(_, &e)| e)
            .collect();

        if residue_l.is_empty() && residue_r.is_empty() {
            return Ok(());
        }

        if self.policy == AbstractionPolicy::Ac2 {
            if self.try_bind_pairwise(store, &residue_l, &residue_r)
                || self.try_bind_pairwise(store, &residue_r, &residue_l)
            {
                return Ok(());
            }
            if self.try_bind_residue(store, interner, functor, sort, &residue_l, &residue_r)? {
                return Ok(());
            }
            if self.try_bind_residue(store, interner, functor, sort, &residue_r, &residue_l)? {
                return Ok(());
            }
        }

        let constraint = match (
            self.rebuild_sum(store, interner, functor, sort, &residue_l)?,
            self.rebuild_sum(store, interner, functor, sort, &residue_r)?,
        ) {
            (Some(sum_l), Some(sum_r)) => Constraint {
                lhs: sum_l,
                rhs: sum_r,
            },
            // A one-sided or bank-mixed residue keeps the whole pair.
            _ => Constraint { lhs, rhs },
        };
        self.constraints.push(constraint);
        Ok(())
    }

    /// AC2 refinement: multiset matching of variable-free pieces. A
    /// residue of distinct unbound variables is matched pairwise against
    /// an equally long variable-free residue.
    fn try_bind_pairwise(
        &mut self,
        store: &mut TermStore,
        vars: &[BankedTerm],
        ground: &[BankedTerm],
    ) -> bool {
        if vars.is_empty() || vars.len() != ground.len() {
            return false;
        }
        let mut specs = Vec::with_capacity(vars.len());
        for &(term, bank) in vars {
            let Term::Variable { var, sort } = store.term(term).clone() else {
                return false;
            };
            let spec = VarSpec::new(var, bank);
            if specs.iter().any(|&(s, _)| s == spec) {
                return false;
            }
            specs.push((spec, sort));
        }
        if ground
            .iter()
            .zip(specs.iter())
            .any(|(&(t, _), &(_, sort))| !store.is_ground(t) || store.sort(t) != sort)
        {
            return false;
        }
        for (&(spec, _), &target) in specs.iter().zip(ground.iter()) {
            self.subs.bind(spec, target);
        }
        true
    }

    /// AC2 refinement: a residue consisting of exactly one unbound
    /// variable is bound to the sum of the opposite residue.
    fn try_bind_residue(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        functor: crate::fol::FunctionId,
        sort: crate::fol::SortId,
        single: &[BankedTerm],
        other: &[BankedTerm],
    ) -> Result<bool> {
        let &[(term, bank)] = single else {
            return Ok(false);
        };
        let Term::Variable { var, sort: vsort } = store.term(term).clone() else {
            return Ok(false);
        };
        if vsort != sort {
            return Ok(false);
        }
        let Some(sum) = self.rebuild_sum(store, interner, functor, sort, other)? else {
            return Ok(false);
        };
        let spec = VarSpec::new(var, bank);
        if self.subs.occurs(store, spec, sum.0, sum.1) {
            return Ok(false);
        }
        self.subs.bind(spec, sum);
        Ok(true)
    }

    /// Rebuild a flattened residue into a left-associated sum. Returns
    /// `None` when the residue is empty or its elements live in different
    /// banks (no single term can represent it).
    fn rebuild_sum(
        &self,
        store: &mut TermStore,
        interner: &Interner,
        functor: crate::fol::FunctionId,
        sort: crate::fol::SortId,
        residue: &[BankedTerm],
    ) -> Result<Option<BankedTerm>> {
        let Some(&(first, bank)) = residue.first() else {
            return Ok(None);
        };
        if residue.iter().any(|&(_, b)| b != bank) {
            return Ok(None);
        }
        let mut sum = first;
        for &(elem, _) in &residue[1..] {
            sum = store.intern_apply(interner, functor, sort, vec![sum, elem])?;
        }
        Ok(Some((sum, bank)))
    }

    /// Canonical signature of the constraint set under the current
    /// substitution, used to detect the fixed point.
    fn constraint_signature(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
    ) -> Result<Vec<(TermId, TermId)>> {
        let mut signature = Vec::with_capacity(self.constraints.len());
        for i in 0..self.constraints.len() {
            let c = self.constraints[i];
            let lhs = self.subs.apply(store, interner, c.lhs.0, c.lhs.1)?;
            let rhs = self.subs.apply(store, interner, c.rhs.0, c.rhs.1)?;
            let key = if lhs < rhs { (lhs, rhs) } else { (rhs, lhs) };
            if !signature.contains(&key) {
                signature.push(key);
            }
        }
        signature.sort_unstable();
        Ok(signature)
    }

    /// Re-examine each residual constraint, unifying its two sides under
    /// the grown substitution. A constraint either disappears (sides
    /// became identical), is refined to simpler residues, or fails the
    /// whole unification when its sides can never unify. Stops when a
    /// full pass changes nothing.
    pub(crate) fn run_fixed_point(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
    ) -> Result<bool> {
        loop {
            let before = self.constraint_signature(store, interner)?;
            let trail_before = self.subs.mark();
            let pending = std::mem::take(&mut self.constraints);
            for c in pending {
                if !self.unify_step(store, interner, c.lhs, c.rhs)? {
                    return Ok(false);
                }
            }
            let after = self.constraint_signature(store, interner)?;
            if after == before && self.subs.mark() == trail_before {
                return Ok(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test context for building terms with interned symbols
    struct TestCtx {
        interner: Interner,
        store: TermStore,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx {
                interner: Interner::new(),
                store: TermStore::new(),
            }
        }

        fn var(&mut self, id: u32) -> TermId {
            let int = self.interner.int_sort();
            self.store.intern_variable(id, int)
        }

        fn int_const(&mut self, name: &str) -> TermId {
            let int = self.interner.int_sort();
            let f = self.interner.intern_function(name, 0);
            self.store.intern_constant(&self.interner, f, int).unwrap()
        }

        fn num(&mut self, value: i64) -> TermId {
            let int = self.interner.int_sort();
            let f = self.interner.intern_integer(value);
            self.store.intern_constant(&self.interner, f, int).unwrap()
        }

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let int = self.interner.int_sort();
            let f = self.interner.intern_function(name, args.len() as u8);
            self.store
                .intern_apply(&self.interner, f, int, args)
                .unwrap()
        }

        fn sum(&mut self, lhs: TermId, rhs: TermId) -> TermId {
            let int = self.interner.int_sort();
            let f = self.interner.int_sum();
            self.store
                .intern_apply(&self.interner, f, int, vec![lhs, rhs])
                .unwrap()
        }

        fn unify(
            &mut self,
            a: TermId,
            b: TermId,
            policy: AbstractionPolicy,
            fixed_point: bool,
        ) -> Option<AbstractingUnifier> {
            AbstractingUnifier::unify(
                &mut self.store,
                &self.interner,
                a,
                VarBank::QUERY,
                b,
                VarBank::QUERY,
                policy,
                fixed_point,
            )
            .unwrap()
        }

        /// Constraints as (lhs, rhs) pairs of applied terms, unordered.
        fn constraint_pairs(&mut self, unifier: &mut AbstractingUnifier) -> Vec<(TermId, TermId)> {
            let lits = unifier
                .constraint_literals(&mut self.store, &self.interner)
                .unwrap();
            lits.iter()
                .map(|&l| {
                    let lit = self.store.literal(l).clone();
                    (lit.args[0], lit.args[1])
                })
                .collect()
        }
    }

    #[test]
    fn test_syntactic_unification() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let a = ctx.int_const("a");
        let fx = ctx.func("f", vec![x]);
        let fa = ctx.func("f", vec![a]);

        let mut u = ctx.unify(fx, fa, AbstractionPolicy::Off, false).unwrap();
        assert!(u.constraints().is_empty());
        let applied = u
            .apply(&mut ctx.store, &ctx.interner, fx, VarBank::QUERY)
            .unwrap();
        assert_eq!(applied, fa);
    }

    #[test]
    fn test_clash_fails_without_abstraction() {
        let mut ctx = TestCtx::new();
        let a = ctx.int_const("a");
        let fa = ctx.func("f", vec![a]);
        let ga = ctx.func("g", vec![a]);
        assert!(ctx.unify(fa, ga, AbstractionPolicy::Off, false).is_none());
        // Uninterpreted clash also fails under OneInterp
        assert!(ctx
            .unify(fa, ga, AbstractionPolicy::OneInterp, false)
            .is_none());
    }

    #[test]
    fn test_occurs_check_is_never_bypassed() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let fx = ctx.func("f", vec![x]);
        assert!(ctx.unify(x, fx, AbstractionPolicy::Off, false).is_none());
        assert!(ctx
            .unify(x, fx, AbstractionPolicy::OneInterp, false)
            .is_none());
    }

    #[test]
    fn test_one_interp_abstracts_whole_pair() {
        let mut ctx = TestCtx::new();
        // f(b + 2) vs f(x + 2): the sums abstract as one disequality
        let b = ctx.int_const("b");
        let two = ctx.num(2);
        let x = ctx.var(0);
        let b2 = ctx.sum(b, two);
        let x2 = ctx.sum(x, two);
        let f_b2 = ctx.func("f", vec![b2]);
        let f_x2 = ctx.func("f", vec![x2]);

        let mut u = ctx
            .unify(f_b2, f_x2, AbstractionPolicy::OneInterp, false)
            .unwrap();
        let pairs = ctx.constraint_pairs(&mut u);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_one_interp_against_uninterpreted_constant() {
        let mut ctx = TestCtx::new();
        // f(x + 2) vs f(a): abstracted because one root is interpreted
        let x = ctx.var(0);
        let two = ctx.num(2);
        let a = ctx.int_const("a");
        let x2 = ctx.sum(x, two);
        let f_x2 = ctx.func("f", vec![x2]);
        let f_a = ctx.func("f", vec![a]);

        let mut u = ctx
            .unify(f_x2, f_a, AbstractionPolicy::OneInterp, false)
            .unwrap();
        assert_eq!(ctx.constraint_pairs(&mut u).len(), 1);

        // but not under InterpOnly
        assert!(ctx
            .unify(f_x2, f_a, AbstractionPolicy::InterpOnly, false)
            .is_none());
    }

    #[test]
    fn test_constraint_deduplication() {
        let mut ctx = TestCtx::new();
        // f(a+1, a+1) vs f(b+1, b+1) produces the same disequality twice
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let one = ctx.num(1);
        let a1 = ctx.sum(a, one);
        let b1 = ctx.sum(b, one);
        let lhs = ctx.func("f2", vec![a1, a1]);
        let rhs = ctx.func("f2", vec![b1, b1]);

        let mut u = ctx
            .unify(lhs, rhs, AbstractionPolicy::OneInterp, false)
            .unwrap();
        assert_eq!(u.constraints().len(), 2);
        assert_eq!(ctx.constraint_pairs(&mut u).len(), 1);
    }

    #[test]
    fn test_ac_cancellation() {
        let mut ctx = TestCtx::new();
        // a+b+c+a vs a+b+x+y: a and b cancel, residues become one constraint
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let c = ctx.int_const("c");
        let x = ctx.var(0);
        let y = ctx.var(1);
        let lhs0 = ctx.sum(a, b);
        let lhs1 = ctx.sum(lhs0, c);
        let lhs = ctx.sum(lhs1, a);
        let rhs0 = ctx.sum(a, b);
        let rhs1 = ctx.sum(rhs0, x);
        let rhs = ctx.sum(rhs1, y);

        let mut u = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, false).unwrap();
        let pairs = ctx.constraint_pairs(&mut u);
        assert_eq!(pairs.len(), 1);
        // The residues are c+a vs x+y (modulo orientation)
        let expected_l = ctx.sum(c, a);
        let (l, r) = pairs[0];
        let weights = (ctx.store.weight(l), ctx.store.weight(r));
        assert_eq!(weights, (3, 3));
        assert!(l == expected_l || r == expected_l);
    }

    #[test]
    fn test_ac_full_cancellation_through_bindings() {
        let mut ctx = TestCtx::new();
        // f2(a+x+y, f2(x,y)) vs f2(c+b+a, f2(b,c)): the pair list binds
        // x:=b, y:=c first, then the sums cancel completely
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let c = ctx.int_const("c");
        let x = ctx.var(0);
        let y = ctx.var(1);
        let ax = ctx.sum(a, x);
        let axy = ctx.sum(ax, y);
        let cb = ctx.sum(c, b);
        let cba = ctx.sum(cb, a);
        let fxy = ctx.func("f2", vec![x, y]);
        let fbc = ctx.func("f2", vec![b, c]);
        let lhs = ctx.func("g2", vec![axy, fxy]);
        let rhs = ctx.func("g2", vec![cba, fbc]);

        let mut u = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, false).unwrap();
        assert!(ctx.constraint_pairs(&mut u).is_empty());
    }

    #[test]
    fn test_ac2_binds_single_variable_residue() {
        let mut ctx = TestCtx::new();
        // f2(x, a+b+c) vs f2(x, x+b+a): residue c vs x binds x:=c
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let c = ctx.int_const("c");
        let x = ctx.var(0);
        let ab = ctx.sum(a, b);
        let abc = ctx.sum(ab, c);
        let xb = ctx.sum(x, b);
        let xba = ctx.sum(xb, a);
        let lhs = ctx.func("f2", vec![x, abc]);
        let rhs = ctx.func("f2", vec![x, xba]);

        let mut u = ctx.unify(lhs, rhs, AbstractionPolicy::Ac2, false).unwrap();
        assert!(ctx.constraint_pairs(&mut u).is_empty());
        let applied = u
            .apply(&mut ctx.store, &ctx.interner, x, VarBank::QUERY)
            .unwrap();
        assert_eq!(applied, c);
    }

    #[test]
    fn test_fixed_point_refines_constraints() {
        let mut ctx = TestCtx::new();
        // f2(c, a+b+c) vs f2(z, x+y+z): without iteration the constraint
        // keeps whole sums; with iteration z:=c lets c cancel
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let c = ctx.int_const("c");
        let x = ctx.var(0);
        let y = ctx.var(1);
        let z = ctx.var(2);
        let ab = ctx.sum(a, b);
        let abc = ctx.sum(ab, c);
        let xy = ctx.sum(x, y);
        let xyz = ctx.sum(xy, z);
        let lhs = ctx.func("f2", vec![c, abc]);
        let rhs = ctx.func("f2", vec![z, xyz]);

        let mut plain = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, false).unwrap();
        let pairs = ctx.constraint_pairs(&mut plain);
        assert_eq!(pairs.len(), 1);
        assert_eq!(ctx.store.weight(pairs[0].0).max(ctx.store.weight(pairs[0].1)), 5);

        let mut iterated = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, true).unwrap();
        let pairs = ctx.constraint_pairs(&mut iterated);
        assert_eq!(pairs.len(), 1);
        // Refined to a+b vs x+y
        assert_eq!(ctx.store.weight(pairs[0].0), 3);
        assert_eq!(ctx.store.weight(pairs[0].1), 3);
    }

    #[test]
    fn test_fixed_point_detects_unsatisfiable_constraint() {
        let mut ctx = TestCtx::new();
        // f2(x, a+x) vs f2(c, b+a): the residue constraint reduces to
        // c != b, which can never be discharged by unification
        let a = ctx.int_const("a");
        let b = ctx.int_const("b");
        let c = ctx.int_const("c");
        let x = ctx.var(0);
        let ax = ctx.sum(a, x);
        let ba = ctx.sum(b, a);
        let lhs = ctx.func("f2", vec![x, ax]);
        let rhs = ctx.func("f2", vec![c, ba]);

        let plain = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, false);
        assert!(plain.is_some());
        let iterated = ctx.unify(lhs, rhs, AbstractionPolicy::Ac1, true);
        assert!(iterated.is_none());
    }

    #[test]
    fn test_func_ext_residualizes_functional_arguments() {
        let mut ctx = TestCtx::new();
        let srt = ctx.interner.intern_sort("srt");
        let fun_sort = ctx.interner.sort_arrow(srt, srt);
        let h_sort = ctx.interner.sort_arrow(fun_sort, srt);
        let h = ctx.interner.intern_function("h", 0);
        let f1 = ctx.interner.intern_function("f1", 0);
        let f2 = ctx.interner.intern_function("f2", 0);
        let c_h = ctx
            .store
            .intern_constant(&ctx.interner, h, h_sort)
            .unwrap();
        let c_f1 = ctx
            .store
            .intern_constant(&ctx.interner, f1, fun_sort)
            .unwrap();
        let c_f2 = ctx
            .store
            .intern_constant(&ctx.interner, f2, fun_sort)
            .unwrap();
        let app = ctx.interner.app_function();
        let ap_h_f1 = ctx
            .store
            .intern_apply(&ctx.interner, app, srt, vec![c_h, c_f1])
            .unwrap();
        let ap_h_f2 = ctx
            .store
            .intern_apply(&ctx.interner, app, srt, vec![c_h, c_f2])
            .unwrap();

        let mut u = ctx
            .unify(ap_h_f2, ap_h_f1, AbstractionPolicy::FuncExt, false)
            .unwrap();
        let pairs = ctx.constraint_pairs(&mut u);
        assert_eq!(pairs, vec![(c_f2, c_f1)]);

        // Without the policy the clash fails
        assert!(ctx
            .unify(ap_h_f2, ap_h_f1, AbstractionPolicy::Off, false)
            .is_none());
    }
}
