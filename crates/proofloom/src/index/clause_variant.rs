//! Clause variant index.
//!
//! Canonicalizes clauses (or clause components) modulo variable renaming:
//! two clauses that are renamings of each other share one component
//! index. Literals are ordered by a renaming-invariant structural key
//! before canonical renaming, so the literal order of the input does not
//! matter. Because terms are hash-consed, the canonical form is an exact
//! key; no tree search is needed.

use super::canonical_rename;
use crate::error::Result;
use crate::fol::{Interner, LitId, Literal, Term, TermId, TermStore};
use indexmap::IndexMap;

/// Index of clause components modulo variable renaming.
#[derive(Debug, Clone, Default)]
pub struct ClauseVariantIndex {
    components: IndexMap<Vec<LitId>, usize>,
}

impl ClauseVariantIndex {
    pub fn new() -> Self {
        ClauseVariantIndex::default()
    }

    /// Number of distinct components seen so far.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The component index of the variant class of `lits`, allocating a
    /// fresh index for an unseen class.
    pub fn component_of(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        lits: &[LitId],
    ) -> Result<usize> {
        let canonical = Self::canonicalize(store, interner, lits)?;
        let next = self.components.len();
        Ok(*self.components.entry(canonical).or_insert(next))
    }

    /// Canonical form: structural ordering, shared canonical renaming,
    /// then ordering by literal id.
    fn canonicalize(
        store: &mut TermStore,
        interner: &Interner,
        lits: &[LitId],
    ) -> Result<Vec<LitId>> {
        let mut ordered: Vec<LitId> = lits.to_vec();
        ordered.sort_by_cached_key(|&l| Self::structural_key(store, l));

        let mut map = Vec::new();
        let mut canonical = Vec::with_capacity(ordered.len());
        for lit_id in ordered {
            let lit = store.literal(lit_id).clone();
            let mut args = Vec::with_capacity(lit.args.len());
            for arg in lit.args {
                args.push(canonical_rename(store, interner, arg, &mut map)?);
            }
            canonical.push(store.intern_literal(
                interner,
                Literal {
                    predicate: lit.predicate,
                    polarity: lit.polarity,
                    args,
                },
            )?);
        }
        canonical.sort_unstable();
        Ok(canonical)
    }

    /// Renaming-invariant sort key of a literal: predicate, polarity and
    /// the term shape with variables wildcarded.
    fn structural_key(store: &TermStore, lit: LitId) -> (u32, bool, String) {
        let lit = store.literal(lit);
        let mut shape = String::new();
        for &arg in &lit.args {
            Self::term_shape(store, arg, &mut shape);
            shape.push(',');
        }
        (lit.predicate.as_u32(), lit.polarity, shape)
    }

    fn term_shape(store: &TermStore, term: TermId, out: &mut String) {
        match store.term(term) {
            Term::Variable { .. } => out.push('*'),
            Term::Application { functor, args, .. } => {
                out.push_str(&functor.as_u32().to_string());
                if !args.is_empty() {
                    out.push('(');
                    for &arg in args {
                        Self::term_shape(store, arg, out);
                        out.push(',');
                    }
                    out.push(')');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCtx {
        interner: Interner,
        store: TermStore,
        index: ClauseVariantIndex,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx {
                interner: Interner::new(),
                store: TermStore::new(),
                index: ClauseVariantIndex::new(),
            }
        }

        fn var(&mut self, id: u32) -> TermId {
            let i = self.interner.individual_sort();
            self.store.intern_variable(id, i)
        }

        fn lit(&mut self, pred: &str, polarity: bool, args: Vec<TermId>) -> LitId {
            let p = self.interner.intern_predicate(pred, args.len() as u8);
            self.store
                .intern_literal(
                    &self.interner,
                    Literal {
                        predicate: p,
                        polarity,
                        args,
                    },
                )
                .unwrap()
        }

        fn component(&mut self, lits: &[LitId]) -> usize {
            self.index
                .component_of(&mut self.store, &self.interner, lits)
                .unwrap()
        }
    }

    #[test]
    fn test_variants_share_a_component() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(7);
        let px = ctx.lit("p", true, vec![x]);
        let qx = ctx.lit("q", false, vec![x]);
        let py = ctx.lit("p", true, vec![y]);
        let qy = ctx.lit("q", false, vec![y]);

        let c1 = ctx.component(&[px, qx]);
        let c2 = ctx.component(&[qy, py]);
        assert_eq!(c1, c2);
        assert_eq!(ctx.index.len(), 1);
    }

    #[test]
    fn test_distinct_clauses_get_distinct_components() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let px = ctx.lit("p", true, vec![x]);
        let not_px = ctx.lit("p", false, vec![x]);

        let c1 = ctx.component(&[px]);
        let c2 = ctx.component(&[not_px]);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_shared_variable_structure_matters() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        // p(X) | q(X) shares its variable; p(X) | q(Y) does not
        let px = ctx.lit("p", true, vec![x]);
        let qx = ctx.lit("q", true, vec![x]);
        let qy = ctx.lit("q", true, vec![y]);

        let shared = ctx.component(&[px, qx]);
        let disjoint = ctx.component(&[px, qy]);
        assert_ne!(shared, disjoint);
    }
}
