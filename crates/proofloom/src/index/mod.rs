//! Term and literal indexing.
//!
//! Substitution-tree indexes parametrized by the payload stored at the
//! leaves: [`TermLiteralClause`] for term keys with their originating
//! literal and clause (the extra-aware form), [`LiteralClause`] for
//! literal keys. Payload keys are stored variable-normalized; the unifier
//! returned by a retrieval applies to the normalized key in the result
//! bank.

pub mod clause_variant;
pub mod substitution_tree;

use crate::config::Budget;
use crate::error::Result;
use crate::fol::{Interner, LitId, Literal, PredicateId, Term, TermId, TermStore};
use crate::proof::UnitId;
use crate::unification::AbstractionPolicy;

pub use clause_variant::ClauseVariantIndex;
pub use substitution_tree::{QueryIter, QueryRes, Retrieval, SubstitutionTree};

/// Rename the variables of a term canonically, sharing the renaming map
/// across calls (first occurrence order).
pub(crate) fn canonical_rename(
    store: &mut TermStore,
    interner: &Interner,
    term: TermId,
    map: &mut Vec<u32>,
) -> Result<TermId> {
    match store.term(term).clone() {
        Term::Variable { var, sort } => {
            let renamed = match map.iter().position(|&v| v == var) {
                Some(idx) => idx as u32,
                None => {
                    map.push(var);
                    map.len() as u32 - 1
                }
            };
            Ok(store.intern_variable(renamed, sort))
        }
        Term::Application {
            functor,
            sort,
            args,
        } => {
            let mut new_args = Vec::with_capacity(args.len());
            for arg in args {
                new_args.push(canonical_rename(store, interner, arg, map)?);
            }
            store.intern_apply(interner, functor, sort, new_args)
        }
    }
}

/// Leaf payload of a literal index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralClause {
    /// The indexed literal, variable-normalized
    pub literal: LitId,
    pub clause: Option<UnitId>,
}

/// Leaf payload of a term index entry: the key term plus the literal and
/// clause it occurs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermLiteralClause {
    /// The indexed term, variable-normalized
    pub term: TermId,
    pub literal: Option<LitId>,
    pub clause: Option<UnitId>,
}

/// Substitution-tree index over terms.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    tree: SubstitutionTree<TermLiteralClause>,
}

impl TermIndex {
    pub fn new() -> Self {
        TermIndex::default()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Index a term, remembering the literal and clause it comes from.
    pub fn insert(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        term: TermId,
        literal: Option<LitId>,
        clause: Option<UnitId>,
    ) -> Result<()> {
        let key = SubstitutionTree::<TermLiteralClause>::normalize_key(store, interner, term)?;
        self.tree.insert(
            store,
            interner,
            key,
            TermLiteralClause {
                term: key,
                literal,
                clause,
            },
        )
    }

    /// Remove one entry matching term, literal and clause.
    pub fn remove(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        term: TermId,
        literal: Option<LitId>,
        clause: Option<UnitId>,
    ) -> Result<bool> {
        self.tree.remove_where(store, interner, term, |d| {
            d.literal == literal && d.clause == clause
        })
    }

    /// Every indexed term unifying with `query` under `policy`, with the
    /// unifier and residual constraints.
    pub fn retrieve_unifiable<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        policy: AbstractionPolicy,
        fixed_point: bool,
        budget: Budget,
    ) -> QueryIter<'t, 'c, TermLiteralClause> {
        self.tree
            .retrieve_unifiable(store, interner, query, policy, fixed_point, budget)
    }

    /// Indexed terms alpha-equivalent to `query`.
    pub fn retrieve_variants<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        budget: Budget,
    ) -> QueryIter<'t, 'c, TermLiteralClause> {
        self.tree.retrieve_variants(store, interner, query, budget)
    }

    /// Indexed terms matching onto `query`.
    pub fn retrieve_generalizations<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        budget: Budget,
    ) -> QueryIter<'t, 'c, TermLiteralClause> {
        self.tree
            .retrieve_generalizations(store, interner, query, budget)
    }
}

/// Substitution-tree index over literals, split by polarity.
#[derive(Debug, Clone, Default)]
pub struct LiteralIndex {
    positive: SubstitutionTree<LiteralClause>,
    negative: SubstitutionTree<LiteralClause>,
}

impl LiteralIndex {
    pub fn new() -> Self {
        LiteralIndex::default()
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode a literal's atom as a term keyed by its predicate, so the
    /// substitution tree can discriminate on the predicate symbol.
    fn atom_key(
        store: &mut TermStore,
        interner: &mut Interner,
        predicate: PredicateId,
        args: &[TermId],
    ) -> Result<TermId> {
        let functor = interner.intern_function(
            &format!("'atom_{}'", predicate.as_u32()),
            args.len() as u8,
        );
        let sort = interner.bool_sort();
        store.intern_apply(interner, functor, sort, args.to_vec())
    }

    fn tree_for(&self, polarity: bool) -> &SubstitutionTree<LiteralClause> {
        if polarity {
            &self.positive
        } else {
            &self.negative
        }
    }

    fn tree_for_mut(&mut self, polarity: bool) -> &mut SubstitutionTree<LiteralClause> {
        if polarity {
            &mut self.positive
        } else {
            &mut self.negative
        }
    }

    /// Index a literal, remembering the clause it comes from.
    pub fn insert(
        &mut self,
        store: &mut TermStore,
        interner: &mut Interner,
        literal: LitId,
        clause: Option<UnitId>,
    ) -> Result<()> {
        let lit = store.literal(literal).clone();
        let key = Self::atom_key(store, interner, lit.predicate, &lit.args)?;
        let key = SubstitutionTree::<LiteralClause>::normalize_key(store, interner, key)?;

        // Rebuild the literal over the normalized key arguments so the
        // payload matches what retrieval substitutions apply to.
        let normalized_args = match store.term(key) {
            Term::Application { args, .. } => args.clone(),
            Term::Variable { .. } => Vec::new(),
        };
        let normalized = store.intern_literal(
            interner,
            Literal {
                predicate: lit.predicate,
                polarity: lit.polarity,
                args: normalized_args,
            },
        )?;

        self.tree_for_mut(lit.polarity).insert(
            store,
            interner,
            key,
            LiteralClause {
                literal: normalized,
                clause,
            },
        )
    }

    /// Remove one entry for this literal and clause.
    pub fn remove(
        &mut self,
        store: &mut TermStore,
        interner: &mut Interner,
        literal: LitId,
        clause: Option<UnitId>,
    ) -> Result<bool> {
        let lit = store.literal(literal).clone();
        let key = Self::atom_key(store, interner, lit.predicate, &lit.args)?;
        self.tree_for_mut(lit.polarity)
            .remove_where(store, interner, key, |d| d.clause == clause)
    }

    /// Every indexed literal whose atom unifies with the query's atom
    /// under `policy`. With `complementary`, literals of the opposite
    /// polarity are retrieved instead.
    pub fn retrieve_unifiable<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c mut Interner,
        query: LitId,
        complementary: bool,
        policy: AbstractionPolicy,
        fixed_point: bool,
        budget: Budget,
    ) -> Result<QueryIter<'t, 'c, LiteralClause>> {
        let lit = store.literal(query).clone();
        let key = Self::atom_key(store, interner, lit.predicate, &lit.args)?;
        let polarity = lit.polarity != complementary;
        Ok(self.tree_for(polarity).retrieve_unifiable(
            store,
            interner,
            key,
            policy,
            fixed_point,
            budget,
        ))
    }

    /// Indexed literals alpha-equivalent to the query.
    pub fn retrieve_variants<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c mut Interner,
        query: LitId,
        budget: Budget,
    ) -> Result<QueryIter<'t, 'c, LiteralClause>> {
        let lit = store.literal(query).clone();
        let key = Self::atom_key(store, interner, lit.predicate, &lit.args)?;
        Ok(self
            .tree_for(lit.polarity)
            .retrieve_variants(store, interner, key, budget))
    }
}
