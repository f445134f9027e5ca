//! Substitution tree indexing.
//!
//! A substitution tree stores a set of keyed payloads so that, given a
//! query term and an abstraction policy, it yields every payload whose key
//! unifies with the query, together with the unifier and its residual
//! constraints. Internal nodes carry positional substitutions binding
//! special variables to pattern terms; the composition of the bindings
//! along any root-to-leaf path equals the (variable-normalized) key stored
//! at the leaf. Keys that are variants of each other normalize to the same
//! term and therefore share one leaf.
//!
//! Retrieval is a lazy backtracking iterator over the tree. The iterator
//! borrows the tree, so mutating the index while a retrieval is live is
//! rejected at compile time.

use crate::config::Budget;
use crate::error::Result;
use crate::fol::{Interner, Term, TermId, TermStore, VarBank, VarSpec};
use crate::unification::{AbstractingUnifier, AbstractionPolicy, UnifierMark};
use std::collections::BTreeMap;

/// Special (tree-internal) variables are allocated above this id so they
/// can never collide with normalized key variables.
const SVAR_BASE: u32 = 1 << 30;

/// The special variable every root child binds.
const ROOT_SVAR: u32 = SVAR_BASE;

fn is_special(var: u32) -> bool {
    var >= SVAR_BASE
}

/// How candidate keys are matched against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    /// Full unification under an abstraction policy
    Unifiable {
        policy: AbstractionPolicy,
        fixed_point: bool,
    },
    /// Alpha-equivalent keys only (rename-only unifier)
    Variants,
    /// Keys that subsume the query (match-only unifier)
    Generalizations,
}

/// One retrieval result: the unifier and the payload stored at the leaf.
#[derive(Debug)]
pub struct QueryRes<'t, D> {
    pub unifier: AbstractingUnifier,
    pub payload: &'t D,
}

#[derive(Debug, Clone)]
struct Node<D> {
    /// Positional substitution, sorted by special variable
    bindings: Vec<(u32, TermId)>,
    children: Vec<usize>,
    /// Payloads; non-empty only at leaves
    entries: Vec<D>,
}

impl<D> Node<D> {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A substitution tree over payloads of type `D`.
#[derive(Debug, Clone)]
pub struct SubstitutionTree<D> {
    nodes: Vec<Node<D>>,
    root_children: Vec<usize>,
    free: Vec<usize>,
    next_svar: u32,
    len: usize,
}

impl<D> Default for SubstitutionTree<D> {
    fn default() -> Self {
        SubstitutionTree::new()
    }
}

impl<D> SubstitutionTree<D> {
    pub fn new() -> Self {
        SubstitutionTree {
            nodes: Vec::new(),
            root_children: Vec::new(),
            free: Vec::new(),
            next_svar: ROOT_SVAR + 1,
            len: 0,
        }
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn alloc(&mut self, node: Node<D>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn fresh_svar(&mut self) -> u32 {
        let svar = self.next_svar;
        self.next_svar += 1;
        svar
    }

    /// Rename the variables of a key canonically (first occurrence order)
    /// so that alpha-equivalent keys become identical terms.
    pub fn normalize_key(store: &mut TermStore, interner: &Interner, term: TermId) -> Result<TermId> {
        let mut map = Vec::new();
        super::canonical_rename(store, interner, term, &mut map)
    }

    /// Insert a payload under a key. The key is normalized internally;
    /// alpha-equivalent keys share a leaf.
    pub fn insert(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        key: TermId,
        payload: D,
    ) -> Result<()> {
        let key = Self::normalize_key(store, interner, key)?;
        let mut state = BTreeMap::new();
        state.insert(ROOT_SVAR, key);
        self.insert_below(store, interner, None, state, payload)?;
        self.len += 1;
        Ok(())
    }

    fn children_of(&self, parent: Option<usize>) -> &Vec<usize> {
        match parent {
            None => &self.root_children,
            Some(p) => &self.nodes[p].children,
        }
    }

    fn push_child(&mut self, parent: Option<usize>, child: usize) {
        match parent {
            None => self.root_children.push(child),
            Some(p) => self.nodes[p].children.push(child),
        }
    }

    /// Find a compatible child of `parent` and descend, or create a new
    /// leaf closing every open special variable.
    fn insert_below(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        parent: Option<usize>,
        state: BTreeMap<u32, TermId>,
        payload: D,
    ) -> Result<()> {
        let candidates = self.children_of(parent).clone();
        for child in candidates {
            let (first_svar, first_term) = self.nodes[child].bindings[0];
            let Some(&ins_term) = state.get(&first_svar) else {
                continue;
            };
            if Self::top_compatible(store, first_term, ins_term) {
                return self.insert_at(store, interner, child, state, payload);
            }
        }
        let leaf = self.alloc(Node {
            bindings: state.into_iter().collect(),
            children: Vec::new(),
            entries: vec![payload],
        });
        self.push_child(parent, leaf);
        Ok(())
    }

    /// Whether the top symbols of a pattern and an insertion term agree,
    /// so that descending into the child can share structure.
    fn top_compatible(store: &TermStore, pattern: TermId, ins: TermId) -> bool {
        if pattern == ins {
            return true;
        }
        match (store.term(pattern), store.term(ins)) {
            (
                Term::Application {
                    functor: f1,
                    sort: s1,
                    args: a1,
                },
                Term::Application {
                    functor: f2,
                    sort: s2,
                    args: a2,
                },
            ) => f1 == f2 && s1 == s2 && a1.len() == a2.len(),
            _ => false,
        }
    }

    /// Descend into `node`, splitting it where the insertion key first
    /// disagrees with the node's substitution.
    fn insert_at(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        node: usize,
        mut state: BTreeMap<u32, TermId>,
        payload: D,
    ) -> Result<()> {
        let bindings = self.nodes[node].bindings.clone();
        let mut kept = Vec::new();
        let mut rho_node = Vec::new();
        let mut rho_ins = Vec::new();
        let mut split = false;

        for (svar, t_node) in bindings {
            let t_ins = state
                .remove(&svar)
                .expect("tree invariant: node binds an open special variable");
            if t_node == t_ins {
                kept.push((svar, t_node));
                continue;
            }
            if !Self::top_compatible(store, t_node, t_ins) && !Self::pattern_is_special(store, t_node)
            {
                // Divergence at the very top: the binding moves whole
                // into both branches and the variable stays open here.
                split = true;
                rho_node.push((svar, t_node));
                rho_ins.push((svar, t_ins));
                continue;
            }
            let before_node = rho_node.len();
            let g = self.common_generalization(
                store, interner, t_node, t_ins, &mut rho_node, &mut rho_ins,
            )?;
            if g == t_node {
                debug_assert_eq!(rho_node.len(), before_node);
                kept.push((svar, g));
            } else {
                split = true;
                kept.push((svar, g));
            }
        }

        if !split {
            // The node's substitution generalizes the key: bind the open
            // special variables it exposes and continue below.
            for (svar, term) in rho_ins {
                state.insert(svar, term);
            }
            if self.nodes[node].is_leaf() {
                debug_assert!(state.is_empty(), "leaf reached with open variables");
                self.nodes[node].entries.push(payload);
                return Ok(());
            }
            return self.insert_below(store, interner, Some(node), state, payload);
        }

        // Split: the node keeps the common generalization; its previous
        // content moves below, and the key becomes a sibling leaf.
        let old_children = std::mem::take(&mut self.nodes[node].children);
        let old_entries = std::mem::take(&mut self.nodes[node].entries);
        rho_node.sort_unstable_by_key(|&(s, _)| s);
        let old_node = self.alloc(Node {
            bindings: rho_node,
            children: old_children,
            entries: old_entries,
        });

        for (svar, term) in rho_ins {
            state.insert(svar, term);
        }
        let leaf = self.alloc(Node {
            bindings: state.into_iter().collect(),
            children: Vec::new(),
            entries: vec![payload],
        });

        kept.sort_unstable_by_key(|&(s, _)| s);
        self.nodes[node].bindings = kept;
        self.nodes[node].children = vec![old_node, leaf];
        Ok(())
    }

    fn pattern_is_special(store: &TermStore, term: TermId) -> bool {
        matches!(store.term(term), Term::Variable { var, .. } if is_special(*var))
    }

    /// Most specific common generalization of a node pattern and an
    /// insertion term. Special variables in the pattern stay; fresh
    /// special variables are introduced where the terms diverge, with the
    /// divergent subterms recorded in `rho_node` / `rho_ins`.
    fn common_generalization(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        pattern: TermId,
        ins: TermId,
        rho_node: &mut Vec<(u32, TermId)>,
        rho_ins: &mut Vec<(u32, TermId)>,
    ) -> Result<TermId> {
        if pattern == ins {
            return Ok(pattern);
        }
        if let Term::Variable { var, .. } = store.term(pattern) {
            if is_special(*var) {
                rho_ins.push((*var, ins));
                return Ok(pattern);
            }
        }
        match (store.term(pattern).clone(), store.term(ins).clone()) {
            (
                Term::Application {
                    functor: f1,
                    sort: s1,
                    args: a1,
                },
                Term::Application {
                    functor: f2,
                    sort: s2,
                    args: a2,
                },
            ) if f1 == f2 && s1 == s2 && a1.len() == a2.len() => {
                let mut args = Vec::with_capacity(a1.len());
                for (&p, &i) in a1.iter().zip(a2.iter()) {
                    args.push(
                        self.common_generalization(store, interner, p, i, rho_node, rho_ins)?,
                    );
                }
                store.intern_apply(interner, f1, s1, args)
            }
            _ => {
                let svar = self.fresh_svar();
                rho_node.push((svar, pattern));
                rho_ins.push((svar, ins));
                Ok(store.intern_variable(svar, store.sort(pattern)))
            }
        }
    }

    /// Remove one payload stored under `key` for which `matches` returns
    /// true. Emptied leaves are deleted and unary internal chains
    /// collapsed. Returns whether a payload was removed.
    pub fn remove_where(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        key: TermId,
        matches: impl Fn(&D) -> bool,
    ) -> Result<bool> {
        let key = Self::normalize_key(store, interner, key)?;
        let mut state = BTreeMap::new();
        state.insert(ROOT_SVAR, key);

        let children = self.root_children.clone();
        for (pos, child) in children.into_iter().enumerate() {
            if let Some(now_empty) = self.remove_at(store, child, state.clone(), &matches) {
                if now_empty {
                    self.root_children.remove(pos);
                    self.release(child);
                }
                self.len -= 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Try to remove below `node`; `Some(empty)` reports a removal and
    /// whether the node itself became empty.
    fn remove_at(
        &mut self,
        store: &TermStore,
        node: usize,
        mut state: BTreeMap<u32, TermId>,
        matches: &impl Fn(&D) -> bool,
    ) -> Option<bool> {
        for (svar, t_node) in self.nodes[node].bindings.clone() {
            let t_key = state.remove(&svar)?;
            if !Self::match_exactly(store, t_node, t_key, &mut state) {
                return None;
            }
        }

        if self.nodes[node].is_leaf() {
            if !state.is_empty() {
                return None;
            }
            let entry = self.nodes[node].entries.iter().position(matches)?;
            self.nodes[node].entries.remove(entry);
            return Some(self.nodes[node].entries.is_empty());
        }

        let children = self.nodes[node].children.clone();
        for (pos, child) in children.into_iter().enumerate() {
            if let Some(child_deletable) = self.remove_at(store, child, state.clone(), matches) {
                if child_deletable {
                    self.nodes[node].children.remove(pos);
                    self.release(child);
                    self.collapse(node);
                }
                let this = &self.nodes[node];
                return Some(this.children.is_empty() && this.entries.is_empty());
            }
        }
        None
    }

    /// Merge a now-unary internal node with its only child.
    fn collapse(&mut self, node: usize) {
        if self.nodes[node].children.len() != 1 || !self.nodes[node].entries.is_empty() {
            return;
        }
        let child = self.nodes[node].children[0];
        let mut child_node = std::mem::replace(
            &mut self.nodes[child],
            Node {
                bindings: Vec::new(),
                children: Vec::new(),
                entries: Vec::new(),
            },
        );
        self.nodes[node].bindings.append(&mut child_node.bindings);
        self.nodes[node]
            .bindings
            .sort_unstable_by_key(|&(s, _)| s);
        self.nodes[node].children = child_node.children;
        self.nodes[node].entries = child_node.entries;
        self.release(child);
    }

    fn release(&mut self, node: usize) {
        self.free.push(node);
    }

    /// Exact structural match of a pattern against a key subterm; special
    /// variables in the pattern capture the corresponding key subterms.
    fn match_exactly(
        store: &TermStore,
        pattern: TermId,
        key: TermId,
        state: &mut BTreeMap<u32, TermId>,
    ) -> bool {
        if pattern == key {
            return true;
        }
        if let Term::Variable { var, .. } = store.term(pattern) {
            if is_special(*var) {
                state.insert(*var, key);
                return true;
            }
            return false;
        }
        match (store.term(pattern), store.term(key)) {
            (
                Term::Application {
                    functor: f1,
                    sort: s1,
                    args: a1,
                },
                Term::Application {
                    functor: f2,
                    sort: s2,
                    args: a2,
                },
            ) if f1 == f2 && s1 == s2 && a1.len() == a2.len() => {
                let pairs: Vec<(TermId, TermId)> =
                    a1.iter().copied().zip(a2.iter().copied()).collect();
                pairs
                    .into_iter()
                    .all(|(p, k)| Self::match_exactly(store, p, k, state))
            }
            _ => false,
        }
    }

    /// Retrieve every payload whose key unifies with `query` under
    /// `policy`, with the unifier and residual constraints attached.
    pub fn retrieve_unifiable<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        policy: AbstractionPolicy,
        fixed_point: bool,
        budget: Budget,
    ) -> QueryIter<'t, 'c, D> {
        self.retrieve(
            store,
            interner,
            query,
            Retrieval::Unifiable {
                policy,
                fixed_point,
            },
            budget,
        )
    }

    /// Retrieve payloads whose key is alpha-equivalent to `query`.
    pub fn retrieve_variants<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        budget: Budget,
    ) -> QueryIter<'t, 'c, D> {
        self.retrieve(store, interner, query, Retrieval::Variants, budget)
    }

    /// Retrieve payloads whose key matches onto `query` (one-way).
    pub fn retrieve_generalizations<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        budget: Budget,
    ) -> QueryIter<'t, 'c, D> {
        self.retrieve(store, interner, query, Retrieval::Generalizations, budget)
    }

    fn retrieve<'t, 'c>(
        &'t self,
        store: &'c mut TermStore,
        interner: &'c Interner,
        query: TermId,
        mode: Retrieval,
        budget: Budget,
    ) -> QueryIter<'t, 'c, D> {
        let policy = match mode {
            Retrieval::Unifiable { policy, .. } => policy,
            _ => AbstractionPolicy::Off,
        };
        let mut unifier = AbstractingUnifier::new(policy);
        // Seed the root variable with the query; every root child binds it.
        unifier.subs_mut().bind(
            VarSpec::new(ROOT_SVAR, VarBank::RESULT),
            (query, VarBank::QUERY),
        );
        QueryIter {
            tree: self,
            store,
            interner,
            mode,
            unifier,
            budget,
            interrupted: false,
            failed: None,
            stack: vec![Frame {
                node: None,
                child_pos: 0,
                mark: None,
                rev_mark: 0,
            }],
            emitting: None,
            rev: Vec::new(),
        }
    }
}

struct Frame {
    /// None for the virtual root frame
    node: Option<usize>,
    child_pos: usize,
    /// Unifier checkpoint taken before this node's bindings were matched
    mark: Option<UnifierMark>,
    /// Length of the variant reverse map at entry
    rev_mark: usize,
}

/// Lazy backtracking iterator over retrieval results.
///
/// The iterator stops early when its budget expires; check
/// [`QueryIter::interrupted`] after draining it. A domain error during
/// unification also ends the iteration and is reported by
/// [`QueryIter::error`].
pub struct QueryIter<'t, 'c, D> {
    tree: &'t SubstitutionTree<D>,
    store: &'c mut TermStore,
    interner: &'c Interner,
    mode: Retrieval,
    unifier: AbstractingUnifier,
    budget: Budget,
    interrupted: bool,
    failed: Option<crate::error::ProofloomError>,
    stack: Vec<Frame>,
    /// Leaf currently being emitted and the next entry index
    emitting: Option<(usize, usize)>,
    /// Query variables already used as variant renaming targets
    rev: Vec<u32>,
}

impl<'t, 'c, D> QueryIter<'t, 'c, D> {
    /// Whether iteration was cut short by the budget.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// A domain error raised during unification, if any.
    pub fn error(&self) -> Option<&crate::error::ProofloomError> {
        self.failed.as_ref()
    }

    /// Match one pattern/query pair according to the retrieval mode.
    fn match_pair(&mut self, pattern: TermId, target: TermId) -> Result<bool> {
        match self.mode {
            Retrieval::Unifiable { .. } => self.unifier.unify_step(
                self.store,
                self.interner,
                (pattern, VarBank::RESULT),
                (target, VarBank::RESULT),
            ),
            Retrieval::Variants => self.match_restricted(pattern, target, true),
            Retrieval::Generalizations => self.match_restricted(pattern, target, false),
        }
    }

    /// Rename-only (variants) or match-only (generalizations) walk.
    ///
    /// Roles are determined by bank and id range, not by pair position:
    /// special variables bind freely (they encode tree structure), key
    /// variables (result bank) rename to distinct query variables in
    /// variant mode or match arbitrary query subterms in generalization
    /// mode, and query variables are never bound.
    fn match_restricted(&mut self, lhs: TermId, rhs: TermId, variants: bool) -> Result<bool> {
        let mut stack = vec![((lhs, VarBank::RESULT), (rhs, VarBank::RESULT))];
        while let Some((l, r)) = stack.pop() {
            let (lt, lb) = self.unifier.subs().deref(self.store, l.0, l.1);
            let (rt, rb) = self.unifier.subs().deref(self.store, r.0, r.1);
            if lt == rt && (lb == rb || self.store.is_ground(lt)) {
                continue;
            }

            // Special variables on either side capture the opposite term.
            if let Term::Variable { var, sort } = *self.store.term(lt) {
                if is_special(var) {
                    if sort != self.store.term(rt).sort() {
                        return Ok(false);
                    }
                    self.unifier.subs_mut().bind(VarSpec::new(var, lb), (rt, rb));
                    continue;
                }
            }
            if let Term::Variable { var, sort } = *self.store.term(rt) {
                if is_special(var) {
                    if sort != self.store.term(lt).sort() {
                        return Ok(false);
                    }
                    self.unifier.subs_mut().bind(VarSpec::new(var, rb), (lt, lb));
                    continue;
                }
            }

            // Key variables live in the result bank.
            let key_side = match (self.store.term(lt), self.store.term(rt)) {
                (Term::Variable { .. }, _) if lb == VarBank::RESULT => Some(((lt, lb), (rt, rb))),
                (_, Term::Variable { .. }) if rb == VarBank::RESULT => Some(((rt, rb), (lt, lb))),
                _ => None,
            };
            if let Some(((kt, kb), (qt, qb))) = key_side {
                let Term::Variable { var, sort } = *self.store.term(kt) else {
                    unreachable!("key side is a variable");
                };
                if sort != self.store.term(qt).sort() {
                    return Ok(false);
                }
                if variants {
                    let Term::Variable { var: qvar, .. } = *self.store.term(qt) else {
                        return Ok(false);
                    };
                    if qb != VarBank::QUERY || self.rev.contains(&qvar) {
                        return Ok(false);
                    }
                    self.rev.push(qvar);
                }
                self.unifier.subs_mut().bind(VarSpec::new(var, kb), (qt, qb));
                continue;
            }

            match (self.store.term(lt).clone(), self.store.term(rt).clone()) {
                (
                    Term::Application {
                        functor: f1,
                        sort: s1,
                        args: a1,
                    },
                    Term::Application {
                        functor: f2,
                        sort: s2,
                        args: a2,
                    },
                ) => {
                    if f1 != f2 || s1 != s2 || a1.len() != a2.len() {
                        return Ok(false);
                    }
                    for (p, t) in a1.into_iter().zip(a2.into_iter()) {
                        stack.push(((p, lb), (t, rb)));
                    }
                }
                // A query variable against anything else fails.
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Enter a node: match all of its bindings. On failure the unifier is
    /// rolled back and the node is skipped.
    fn enter(&mut self, node: usize) -> Result<bool> {
        let mark = self.unifier.mark();
        let rev_mark = self.rev.len();
        for (svar, pattern) in self.tree.nodes[node].bindings.clone() {
            let svar_term = self.store.intern_variable(svar, self.store.sort(pattern));
            if !self.match_pair(svar_term, pattern)? {
                self.unifier.rollback_to(mark);
                self.rev.truncate(rev_mark);
                return Ok(false);
            }
        }
        self.stack.push(Frame {
            node: Some(node),
            child_pos: 0,
            mark: Some(mark),
            rev_mark,
        });
        Ok(true)
    }

    fn leave(&mut self) {
        let frame = self.stack.pop().expect("leave without frame");
        if let Some(mark) = frame.mark {
            self.unifier.rollback_to(mark);
        }
        self.rev.truncate(frame.rev_mark);
    }

    fn advance(&mut self) -> Result<Option<QueryRes<'t, D>>> {
        loop {
            self.budget.check()?;

            // Drain the entries of the leaf being emitted
            if let Some((leaf, idx)) = self.emitting {
                let tree: &'t SubstitutionTree<D> = self.tree;
                let entries = &tree.nodes[leaf].entries;
                if idx < entries.len() {
                    self.emitting = Some((leaf, idx + 1));
                    let mut unifier = self.unifier.clone();
                    if let Retrieval::Unifiable {
                        fixed_point: true, ..
                    } = self.mode
                    {
                        if !unifier.run_fixed_point(self.store, self.interner)? {
                            continue;
                        }
                    }
                    return Ok(Some(QueryRes {
                        unifier,
                        payload: &entries[idx],
                    }));
                }
                self.emitting = None;
                self.leave();
                continue;
            }

            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let children = match frame.node {
                None => &self.tree.root_children,
                Some(n) => &self.tree.nodes[n].children,
            };
            let Some(&child) = children.get(frame.child_pos) else {
                // Exhausted this node's children
                if self.stack.len() == 1 {
                    self.stack.pop();
                    return Ok(None);
                }
                self.leave();
                continue;
            };
            frame.child_pos += 1;

            if self.enter(child)? && self.tree.nodes[child].is_leaf() {
                self.emitting = Some((child, 0));
            }
        }
    }
}

impl<'t, 'c, D> Iterator for QueryIter<'t, 'c, D> {
    type Item = QueryRes<'t, D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.interrupted || self.failed.is_some() {
            return None;
        }
        match self.advance() {
            Ok(res) => res,
            Err(crate::error::ProofloomError::TimeLimit) => {
                self.interrupted = true;
                None
            }
            Err(err) => {
                self.failed = Some(err);
                None
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
        tree: SubstitutionTree<u32>,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx {
                interner: Interner::new(),
                store: TermStore::new(),
                tree: SubstitutionTree::new(),
            }
        }

        fn var(&mut self, id: u32) -> TermId {
            let i = self.interner.individual_sort();
            self.store.intern_variable(id, i)
        }

        fn const_(&mut self, name: &str) -> TermId {
            let i = self.interner.individual_sort();
            let f = self.interner.intern_function(name, 0);
            self.store.intern_constant(&self.interner, f, i).unwrap()
        }

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let i = self.interner.individual_sort();
            let f = self.interner.intern_function(name, args.len() as u8);
            self.store
                .intern_apply(&self.interner, f, i, args)
                .unwrap()
        }

        fn insert(&mut self, key: TermId, payload: u32) {
            self.tree
                .insert(&mut self.store, &self.interner, key, payload)
                .unwrap();
        }

        fn unifiable_payloads(&mut self, query: TermId) -> Vec<u32> {
            let mut payloads: Vec<u32> = self
                .tree
                .retrieve_unifiable(
                    &mut self.store,
                    &self.interner,
                    query,
                    AbstractionPolicy::Off,
                    false,
                    Budget::unlimited(),
                )
                .map(|res| *res.payload)
                .collect();
            payloads.sort_unstable();
            payloads
        }
    }

    #[test]
    fn test_insert_splits_on_first_disagreement() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let fa = ctx.func("f", vec![a]);
        let fb = ctx.func("f", vec![b]);
        ctx.insert(fa, 1);
        ctx.insert(fb, 2);
        assert_eq!(ctx.tree.len(), 2);

        let x = ctx.var(0);
        let fx = ctx.func("f", vec![x]);
        assert_eq!(ctx.unifiable_payloads(fx), vec![1, 2]);
        assert_eq!(ctx.unifiable_payloads(fa), vec![1]);
    }

    #[test]
    fn test_deep_sharing() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let ga = ctx.func("g", vec![a]);
        let gb = ctx.func("g", vec![b]);
        let fga = ctx.func("f", vec![ga]);
        let fgb = ctx.func("f", vec![gb]);
        let fa = ctx.func("f", vec![a]);
        ctx.insert(fga, 1);
        ctx.insert(fgb, 2);
        ctx.insert(fa, 3);

        assert_eq!(ctx.unifiable_payloads(fga), vec![1]);
        assert_eq!(ctx.unifiable_payloads(fgb), vec![2]);
        assert_eq!(ctx.unifiable_payloads(fa), vec![3]);

        let x = ctx.var(0);
        let fx = ctx.func("f", vec![x]);
        assert_eq!(ctx.unifiable_payloads(fx), vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_collapses_chains() {
        let mut ctx = TestCtx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let fa = ctx.func("f", vec![a]);
        let fb = ctx.func("f", vec![b]);
        ctx.insert(fa, 1);
        ctx.insert(fb, 2);

        let removed = ctx
            .tree
            .remove_where(&mut ctx.store, &ctx.interner, fa, |&p| p == 1)
            .unwrap();
        assert!(removed);
        assert_eq!(ctx.tree.len(), 1);
        assert_eq!(ctx.unifiable_payloads(fb), vec![2]);
        assert!(ctx.unifiable_payloads(fa).is_empty());

        let removed = ctx
            .tree
            .remove_where(&mut ctx.store, &ctx.interner, fb, |&p| p == 2)
            .unwrap();
        assert!(removed);
        assert!(ctx.tree.is_empty());
    }

    #[test]
    fn test_variable_keys() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(3);
        ctx.insert(x, 1);
        let a = ctx.const_("a");
        // A bare variable key unifies with everything of its sort
        assert_eq!(ctx.unifiable_payloads(a), vec![1]);
    }

    #[test]
    fn test_payloads_at_shared_leaf() {
        let mut ctx = TestCtx::new();
        let x = ctx.var(0);
        let y = ctx.var(1);
        let gxy = ctx.func("g", vec![x, y]);
        let gyx = ctx.func("g", vec![y, x]);
        // g(X,Y) and g(Y,X) are variants: one leaf, two payloads
        ctx.insert(gxy, 1);
        ctx.insert(gyx, 2);
        assert_eq!(ctx.tree.len(), 2);

        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let gab = ctx.func("g", vec![a, b]);
        assert_eq!(ctx.unifiable_payloads(gab), vec![1, 2]);
    }
}
