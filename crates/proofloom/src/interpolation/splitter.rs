//! Clause splitting for component extraction.
//!
//! The minimizer prices the interpolant by its atomic components: maximal
//! variable-disjoint sub-clauses, shared modulo renaming through the
//! clause variant index. Single-literal components are keyed by their
//! normalized positive form; formulas count as one component keyed by
//! their textual form.

use crate::error::Result;
use crate::fol::{Clause, Formula, Interner, LitId, Literal, SortId, TermStore};
use crate::index::{canonical_rename, ClauseVariantIndex};
use indexmap::IndexMap;

/// Cost-relevant attributes of one component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentInfo {
    /// Symbol-count weight
    pub weight: u32,
    /// Number of distinct variables
    pub var_count: u32,
}

/// Splits clauses into shared components and assigns component ids.
#[derive(Debug, Clone, Default)]
pub struct ClauseSplitter {
    variant_index: ClauseVariantIndex,
    /// Variant-index component -> id string
    clause_ids: IndexMap<usize, String>,
    /// Normalized positive literal -> id string
    atom_ids: IndexMap<LitId, String>,
    /// Formula text -> id string
    formula_ids: IndexMap<String, String>,
    /// Component id -> cost attributes
    infos: IndexMap<String, ComponentInfo>,
}

impl ClauseSplitter {
    pub fn new() -> Self {
        ClauseSplitter::default()
    }

    /// The ids of the components of `clause`, allocating ids for unseen
    /// components. The empty clause has a single zero-weight component.
    pub fn clause_components(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        clause: &Clause,
    ) -> Result<Vec<String>> {
        if clause.is_empty() {
            let id = self.clause_component_id(store, interner, &[])?;
            return Ok(vec![id]);
        }

        let mut ids = Vec::new();
        for component in split_into_components(store, clause.literals()) {
            let id = if let [single] = component.as_slice() {
                self.atom_component_id(store, interner, *single)?
            } else {
                self.clause_component_id(store, interner, &component)?
            };
            ids.push(id);
        }
        Ok(ids)
    }

    /// The id of the single component of a formula unit.
    pub fn formula_component(
        &mut self,
        store: &TermStore,
        interner: &Interner,
        formula: &Formula,
    ) -> String {
        let key = formula.display(store, interner).to_string();
        if let Some(id) = self.formula_ids.get(&key) {
            return id.clone();
        }
        let id = format!("f{}", self.formula_ids.len());
        self.formula_ids.insert(key, id.clone());
        self.infos.insert(
            id.clone(),
            ComponentInfo {
                weight: formula.weight(store),
                var_count: formula.variable_count(store),
            },
        );
        id
    }

    pub fn component_info(&self, id: &str) -> Option<&ComponentInfo> {
        self.infos.get(id)
    }

    /// All components seen so far with their cost attributes.
    pub fn all_components(&self) -> impl Iterator<Item = (&String, &ComponentInfo)> {
        self.infos.iter()
    }

    fn clause_component_id(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        lits: &[LitId],
    ) -> Result<String> {
        let component = self
            .variant_index
            .component_of(store, interner, lits)?;
        if let Some(id) = self.clause_ids.get(&component) {
            return Ok(id.clone());
        }
        let id = format!("c{}", self.clause_ids.len() + self.atom_ids.len());
        self.clause_ids.insert(component, id.clone());
        self.infos.insert(
            id.clone(),
            ComponentInfo {
                weight: lits.iter().map(|&l| store.literal_weight(l)).sum(),
                var_count: count_variables(store, lits),
            },
        );
        Ok(id)
    }

    /// Single-literal components share across polarity: the key is the
    /// normalized positive form.
    fn atom_component_id(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        lit: LitId,
    ) -> Result<String> {
        let literal = store.literal(lit).clone();
        let mut map = Vec::new();
        let mut args = Vec::with_capacity(literal.args.len());
        for arg in literal.args {
            args.push(canonical_rename(store, interner, arg, &mut map)?);
        }
        let normalized = store.intern_literal(
            interner,
            Literal {
                predicate: literal.predicate,
                polarity: true,
                args,
            },
        )?;

        if let Some(id) = self.atom_ids.get(&normalized) {
            return Ok(id.clone());
        }
        let id = format!("c{}", self.clause_ids.len() + self.atom_ids.len());
        self.atom_ids.insert(normalized, id.clone());
        self.infos.insert(
            id.clone(),
            ComponentInfo {
                weight: store.literal_weight(normalized),
                var_count: count_variables(store, &[normalized]),
            },
        );
        Ok(id)
    }
}

fn count_variables(store: &TermStore, lits: &[LitId]) -> u32 {
    let mut vars: Vec<(u32, SortId)> = Vec::new();
    for &lit in lits {
        store.literal_variables(lit, &mut vars);
    }
    vars.len() as u32
}

/// Partition the literals into maximal variable-disjoint groups. Ground
/// literals form singleton groups.
fn split_into_components(store: &TermStore, literals: &[LitId]) -> Vec<Vec<LitId>> {
    let mut groups: Vec<(Vec<LitId>, Vec<u32>)> = Vec::new();
    for &lit in literals {
        let mut vars: Vec<(u32, SortId)> = Vec::new();
        store.literal_variables(lit, &mut vars);
        let vars: Vec<u32> = vars.into_iter().map(|(v, _)| v).collect();

        let mut touching: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter(|(_, (_, gvars))| gvars.iter().any(|v| vars.contains(v)))
            .map(|(i, _)| i)
            .collect();

        match touching.first().copied() {
            None => groups.push((vec![lit], vars)),
            Some(first) => {
                // Merge every other touching group into the first
                while let Some(last) = touching.pop() {
                    if last == first {
                        break;
                    }
                    let (lits, gvars) = groups.remove(last);
                    groups[first].0.extend(lits);
                    groups[first].1.extend(gvars);
                }
                groups[first].0.push(lit);
                groups[first].1.extend(vars);
            }
        }
    }
    groups.into_iter().map(|(lits, _)| lits).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Clause;

    struct TestCtx {
        interner: Interner,
        store: TermStore,
        splitter: ClauseSplitter,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx {
                interner: Interner::new(),
                store: TermStore::new(),
                splitter: ClauseSplitter::new(),
            }
        }

        fn lit(&mut self, pred: &str, args: Vec<crate::fol::TermId>) -> LitId {
            let p = self.interner.intern_predicate(pred, args.len() as u8);
            self.store
                .intern_literal(&self.interner, Literal::positive(p, args))
                .unwrap()
        }

        fn var(&mut self, id: u32) -> crate::fol::TermId {
            let i = self.interner.individual_sort();
            self.store.intern_variable(id, i)
        }

        fn components(&mut self, lits: Vec<LitId>) -> Vec<String> {
            let clause = Clause::new(&self.store, lits).unwrap();
            self.splitter
                .clause_components(&mut self.store, &self.interner, &clause)
                .unwrap()
        }
    }

    #[test]
    fn test_variable_disjoint_literals_split() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        let px = ctx.lit("p", vec![x]);
        let qy = ctx.lit("q", vec![y]);

        let ids = ctx.components(vec![px, qy]);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_shared_variable_keeps_literals_together() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let px = ctx.lit("p", vec![x]);
        let qx = ctx.lit("q", vec![x]);

        let ids = ctx.components(vec![px, qx]);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_variant_components_are_shared() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(5);
        let px = ctx.lit("p", vec![x]);
        let py = ctx.lit("p", vec![y]);

        let ids_x = ctx.components(vec![px]);
        let ids_y = ctx.components(vec![py]);
        assert_eq!(ids_x, ids_y);
        assert_eq!(ctx.splitter.all_components().count(), 1);
    }

    #[test]
    fn test_atom_components_share_across_polarity() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let p = ctx.interner.intern_predicate("p", 1);
        let pos = ctx
            .store
            .intern_literal(&ctx.interner, Literal::positive(p, vec![x]))
            .unwrap();
        let neg = ctx
            .store
            .intern_literal(&ctx.interner, Literal::negative(p, vec![x]))
            .unwrap();

        let ids_pos = ctx.components(vec![pos]);
        let ids_neg = ctx.components(vec![neg]);
        assert_eq!(ids_pos, ids_neg);
    }

    #[test]
    fn test_empty_clause_has_one_component() {
        let mut ctx = TestCtx::new();
        let ids = ctx.components(vec![]);
        assert_eq!(ids.len(), 1);
        let info = ctx.splitter.component_info(&ids[0]).unwrap();
        assert_eq!(info.weight, 0);
    }
}
