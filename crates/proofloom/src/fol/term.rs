//! Hash-consed terms.
//!
//! Every structurally distinct term is stored exactly once in the session's
//! [`TermStore`]; `TermId` equality therefore coincides with structural
//! equality and costs one integer comparison. Weight (node count) and
//! interpolation color are computed once at insertion and cached with the
//! stored node. Terms live for the whole session and are never freed
//! individually.

use super::interner::{Color, FunctionId, Interner, SortId};
use super::literal::{LitId, Literal};
use crate::error::Result;
use indexmap::IndexMap;
use std::fmt;

/// ID of a hash-consed term
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A term: a sorted variable or a function application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Variable {
        var: u32,
        sort: SortId,
    },
    Application {
        functor: FunctionId,
        sort: SortId,
        args: Vec<TermId>,
    },
}

impl Term {
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable { .. })
    }

    pub fn sort(&self) -> SortId {
        match self {
            Term::Variable { sort, .. } => *sort,
            Term::Application { sort, .. } => *sort,
        }
    }
}

#[derive(Debug, Clone)]
struct TermCell {
    term: Term,
    weight: u32,
    color: Color,
}

#[derive(Debug, Clone)]
struct LitCell {
    literal: Literal,
    weight: u32,
    color: Color,
}

/// Session-owned store of hash-consed terms and literals.
#[derive(Debug, Clone, Default)]
pub struct TermStore {
    terms: Vec<TermCell>,
    term_lookup: IndexMap<Term, TermId>,
    literals: Vec<LitCell>,
    literal_lookup: IndexMap<Literal, LitId>,
}

impl TermStore {
    pub fn new() -> Self {
        TermStore::default()
    }

    /// Intern a variable term (get-or-create).
    pub fn intern_variable(&mut self, var: u32, sort: SortId) -> TermId {
        let term = Term::Variable { var, sort };
        if let Some(&id) = self.term_lookup.get(&term) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(TermCell {
            term: term.clone(),
            weight: 1,
            color: Color::Transparent,
        });
        self.term_lookup.insert(term, id);
        id
    }

    /// Intern a function application (get-or-create).
    ///
    /// Weight and color are computed once here. A Left/Right color
    /// collision between the functor and the arguments is refused with a
    /// domain error; no node is stored in that case.
    pub fn intern_apply(
        &mut self,
        interner: &Interner,
        functor: FunctionId,
        sort: SortId,
        args: Vec<TermId>,
    ) -> Result<TermId> {
        let term = Term::Application {
            functor,
            sort,
            args,
        };
        if let Some(&id) = self.term_lookup.get(&term) {
            return Ok(id);
        }

        let mut weight = 1u32;
        let mut color = interner.function_color(functor);
        if let Term::Application { args, .. } = &term {
            for &arg in args {
                weight += self.weight(arg);
                color = color.combine(self.color(arg))?;
            }
        }

        let id = TermId(self.terms.len() as u32);
        self.terms.push(TermCell {
            term: term.clone(),
            weight,
            color,
        });
        self.term_lookup.insert(term, id);
        Ok(id)
    }

    /// Intern a constant (nullary application).
    pub fn intern_constant(
        &mut self,
        interner: &Interner,
        functor: FunctionId,
        sort: SortId,
    ) -> Result<TermId> {
        self.intern_apply(interner, functor, sort, Vec::new())
    }

    /// Intern a literal (get-or-create), caching weight and color.
    pub fn intern_literal(
        &mut self,
        interner: &Interner,
        literal: Literal,
    ) -> Result<LitId> {
        if let Some(&id) = self.literal_lookup.get(&literal) {
            return Ok(id);
        }

        let mut weight = 1u32;
        let mut color = interner.predicate_color(literal.predicate);
        for &arg in &literal.args {
            weight += self.weight(arg);
            color = color.combine(self.color(arg))?;
        }

        let id = LitId(self.literals.len() as u32);
        self.literals.push(LitCell {
            literal: literal.clone(),
            weight,
            color,
        });
        self.literal_lookup.insert(literal, id);
        Ok(id)
    }

    /// Look up a stored term.
    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize].term
    }

    /// Cached node count of a term.
    pub fn weight(&self, id: TermId) -> u32 {
        self.terms[id.0 as usize].weight
    }

    /// Cached interpolation color of a term.
    pub fn color(&self, id: TermId) -> Color {
        self.terms[id.0 as usize].color
    }

    pub fn sort(&self, id: TermId) -> SortId {
        self.term(id).sort()
    }

    /// Look up a stored literal.
    pub fn literal(&self, id: LitId) -> &Literal {
        &self.literals[id.0 as usize].literal
    }

    /// Cached symbol count of a literal (predicate plus argument weights).
    pub fn literal_weight(&self, id: LitId) -> u32 {
        self.literals[id.0 as usize].weight
    }

    /// Cached interpolation color of a literal.
    pub fn literal_color(&self, id: LitId) -> Color {
        self.literals[id.0 as usize].color
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    /// Collect the distinct variables of a term in first-occurrence order.
    pub fn variables_of(&self, id: TermId, vars: &mut Vec<(u32, SortId)>) {
        match self.term(id) {
            Term::Variable { var, sort } => {
                if !vars.iter().any(|(v, _)| v == var) {
                    vars.push((*var, *sort));
                }
            }
            Term::Application { args, .. } => {
                for &arg in args {
                    self.variables_of(arg, vars);
                }
            }
        }
    }

    /// Collect the distinct variables of a literal in first-occurrence order.
    pub fn literal_variables(&self, id: LitId, vars: &mut Vec<(u32, SortId)>) {
        for &arg in &self.literal(id).args {
            self.variables_of(arg, vars);
        }
    }

    /// Whether a term contains no variables.
    pub fn is_ground(&self, id: TermId) -> bool {
        match self.term(id) {
            Term::Variable { .. } => false,
            Term::Application { args, .. } => args.iter().all(|&arg| self.is_ground(arg)),
        }
    }

    /// Format a term with an interner for name resolution.
    pub fn display<'a>(&'a self, interner: &'a Interner, id: TermId) -> TermDisplay<'a> {
        TermDisplay {
            store: self,
            interner,
            id,
        }
    }
}

/// Display wrapper for a term that resolves symbol names.
pub struct TermDisplay<'a> {
    store: &'a TermStore,
    interner: &'a Interner,
    id: TermId,
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.term(self.id) {
            Term::Variable { var, .. } => write!(f, "X{}", var),
            Term::Application { functor, args, .. } => {
                if args.is_empty() {
                    return write!(f, "{}", self.interner.function_name(*functor));
                }
                write!(f, "{}(", self.interner.function_name(*functor))?;
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", self.store.display(self.interner, arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_interner() -> (TermStore, Interner) {
        (TermStore::new(), Interner::new())
    }

    #[test]
    fn test_hash_cons_identity() {
        let (mut store, mut interner) = store_with_interner();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 1);
        let a = interner.intern_function("a", 0);

        let ca = store.intern_constant(&interner, a, i).unwrap();
        let t1 = store.intern_apply(&interner, f, i, vec![ca]).unwrap();
        let t2 = store.intern_apply(&interner, f, i, vec![ca]).unwrap();

        assert_eq!(t1, t2);
        assert_eq!(store.term_count(), 2);
    }

    #[test]
    fn test_cached_weight() {
        let (mut store, mut interner) = store_with_interner();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 2);
        let a = interner.intern_function("a", 0);

        let ca = store.intern_constant(&interner, a, i).unwrap();
        let x = store.intern_variable(0, i);
        let t = store.intern_apply(&interner, f, i, vec![ca, x]).unwrap();

        assert_eq!(store.weight(ca), 1);
        assert_eq!(store.weight(t), 3);
    }

    #[test]
    fn test_color_propagation() {
        let (mut store, mut interner) = store_with_interner();
        let i = interner.individual_sort();
        let l = interner.intern_function("l", 0);
        let r = interner.intern_function("r", 0);
        let f = interner.intern_function("f", 2);
        interner.set_function_color(l, Color::Left).unwrap();
        interner.set_function_color(r, Color::Right).unwrap();

        let cl = store.intern_constant(&interner, l, i).unwrap();
        let cr = store.intern_constant(&interner, r, i).unwrap();
        assert_eq!(store.color(cl), Color::Left);
        assert_eq!(store.color(cr), Color::Right);

        let x = store.intern_variable(0, i);
        let left_term = store.intern_apply(&interner, f, i, vec![cl, x]).unwrap();
        assert_eq!(store.color(left_term), Color::Left);

        // Mixing both sides in one term is refused
        assert!(store.intern_apply(&interner, f, i, vec![cl, cr]).is_err());
    }

    #[test]
    fn test_literal_interning() {
        let (mut store, mut interner) = store_with_interner();
        let i = interner.individual_sort();
        let p = interner.intern_predicate("p", 1);
        let a = interner.intern_function("a", 0);
        let ca = store.intern_constant(&interner, a, i).unwrap();

        let l1 = store
            .intern_literal(&interner, Literal::positive(p, vec![ca]))
            .unwrap();
        let l2 = store
            .intern_literal(&interner, Literal::positive(p, vec![ca]))
            .unwrap();
        let l3 = store
            .intern_literal(&interner, Literal::negative(p, vec![ca]))
            .unwrap();

        assert_eq!(l1, l2);
        assert_ne!(l1, l3);
        assert_eq!(store.literal_weight(l1), 2);
    }

    #[test]
    fn test_variables_of() {
        let (mut store, mut interner) = store_with_interner();
        let i = interner.individual_sort();
        let f = interner.intern_function("f", 3);
        let x = store.intern_variable(0, i);
        let y = store.intern_variable(1, i);
        let t = store.intern_apply(&interner, f, i, vec![x, y, x]).unwrap();

        let mut vars = Vec::new();
        store.variables_of(t, &mut vars);
        assert_eq!(vars, vec![(0, i), (1, i)]);
        assert!(!store.is_ground(t));
    }
}
