//! Formula trees for non-clausal units and interpolant output.

use super::interner::{Color, Interner, SortId};
use super::literal::LitId;
use super::term::TermStore;
use crate::error::Result;
use std::fmt;

/// A first-order formula tree.
///
/// Clausal reasoning never builds these; they carry non-clausal input
/// units and the assembled interpolant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    True,
    False,
    Atom(LitId),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    Forall(Vec<(u32, SortId)>, Box<Formula>),
    Exists(Vec<(u32, SortId)>, Box<Formula>),
}

impl Formula {
    /// Negate, pushing through a single outer negation.
    pub fn negated(self) -> Formula {
        match self {
            Formula::True => Formula::False,
            Formula::False => Formula::True,
            Formula::Not(inner) => *inner,
            other => Formula::Not(Box::new(other)),
        }
    }

    /// Conjunction of parts, flattening trivial cases.
    pub fn conjunction(mut parts: Vec<Formula>) -> Formula {
        parts.retain(|p| !matches!(p, Formula::True));
        if parts.iter().any(|p| matches!(p, Formula::False)) {
            return Formula::False;
        }
        match parts.len() {
            0 => Formula::True,
            1 => parts.pop().expect("nonempty"),
            _ => Formula::And(parts),
        }
    }

    /// Symbol-count weight, matching the cached weights of stored literals.
    pub fn weight(&self, store: &TermStore) -> u32 {
        match self {
            Formula::True | Formula::False => 1,
            Formula::Atom(lit) => store.literal_weight(*lit),
            Formula::Not(inner) => 1 + inner.weight(store),
            Formula::And(parts) | Formula::Or(parts) => {
                1 + parts.iter().map(|p| p.weight(store)).sum::<u32>()
            }
            Formula::Implies(l, r) | Formula::Iff(l, r) => 1 + l.weight(store) + r.weight(store),
            Formula::Forall(_, inner) | Formula::Exists(_, inner) => 1 + inner.weight(store),
        }
    }

    /// Collect the distinct free-occurring variables (quantified variables
    /// included; prenex differences therefore keep formulas distinct).
    pub fn variables(&self, store: &TermStore, vars: &mut Vec<(u32, SortId)>) {
        match self {
            Formula::True | Formula::False => {}
            Formula::Atom(lit) => store.literal_variables(*lit, vars),
            Formula::Not(inner) => inner.variables(store, vars),
            Formula::And(parts) | Formula::Or(parts) => {
                for p in parts {
                    p.variables(store, vars);
                }
            }
            Formula::Implies(l, r) | Formula::Iff(l, r) => {
                l.variables(store, vars);
                r.variables(store, vars);
            }
            Formula::Forall(bound, inner) | Formula::Exists(bound, inner) => {
                for &(v, s) in bound {
                    if !vars.iter().any(|(w, _)| *w == v) {
                        vars.push((v, s));
                    }
                }
                inner.variables(store, vars);
            }
        }
    }

    /// Number of distinct variables (the quantifier-minimization weight).
    pub fn variable_count(&self, store: &TermStore) -> u32 {
        let mut vars = Vec::new();
        self.variables(store, &mut vars);
        vars.len() as u32
    }

    /// Combined interpolation color of all atoms.
    pub fn color(&self, store: &TermStore) -> Result<Color> {
        match self {
            Formula::True | Formula::False => Ok(Color::Transparent),
            Formula::Atom(lit) => Ok(store.literal_color(*lit)),
            Formula::Not(inner) => inner.color(store),
            Formula::And(parts) | Formula::Or(parts) => {
                let mut color = Color::Transparent;
                for p in parts {
                    color = color.combine(p.color(store)?)?;
                }
                Ok(color)
            }
            Formula::Implies(l, r) | Formula::Iff(l, r) => l.color(store)?.combine(r.color(store)?),
            Formula::Forall(_, inner) | Formula::Exists(_, inner) => inner.color(store),
        }
    }

    /// Format with an interner for name resolution.
    pub fn display<'a>(
        &'a self,
        store: &'a TermStore,
        interner: &'a Interner,
    ) -> FormulaDisplay<'a> {
        FormulaDisplay {
            formula: self,
            store,
            interner,
        }
    }
}

/// Display wrapper for a formula that resolves symbol names.
pub struct FormulaDisplay<'a> {
    formula: &'a Formula,
    store: &'a TermStore,
    interner: &'a Interner,
}

impl<'a> FormulaDisplay<'a> {
    fn sub(&self, formula: &'a Formula) -> FormulaDisplay<'a> {
        FormulaDisplay {
            formula,
            store: self.store,
            interner: self.interner,
        }
    }

    fn write_connective(
        &self,
        f: &mut fmt::Formatter<'_>,
        parts: &'a [Formula],
        op: &str,
    ) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in parts.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", op)?;
            }
            write!(f, "{}", self.sub(p))?;
        }
        write!(f, ")")
    }
}

impl<'a> fmt::Display for FormulaDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formula {
            Formula::True => write!(f, "$true"),
            Formula::False => write!(f, "$false"),
            Formula::Atom(lit) => {
                write!(f, "{}", self.store.display_literal(self.interner, *lit))
            }
            Formula::Not(inner) => write!(f, "~({})", self.sub(inner)),
            Formula::And(parts) => self.write_connective(f, parts, "&"),
            Formula::Or(parts) => self.write_connective(f, parts, "|"),
            Formula::Implies(l, r) => write!(f, "({} => {})", self.sub(l), self.sub(r)),
            Formula::Iff(l, r) => write!(f, "({} <=> {})", self.sub(l), self.sub(r)),
            Formula::Forall(vars, inner) => {
                write!(f, "(! [")?;
                for (i, (v, _)) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "X{}", v)?;
                }
                write!(f, "] : {})", self.sub(inner))
            }
            Formula::Exists(vars, inner) => {
                write!(f, "(? [")?;
                for (i, (v, _)) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "X{}", v)?;
                }
                write!(f, "] : {})", self.sub(inner))
            }
        }
    }
}
