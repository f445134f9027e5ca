//! Units and the unit store: the proof DAG.
//!
//! A unit is a clause or a formula together with its inference, input type
//! and inherited interpolation color. Units are keyed by a session-unique
//! number assigned at registration; parents are always earlier-numbered,
//! which keeps the proof DAG acyclic and lets the store use a plain arena.

use crate::error::{ProofloomError, Result};
use crate::fol::{Clause, Color, Formula, InputType, Interner, TermStore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::inference::Inference;

/// Session-unique number of a unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) u32);

impl UnitId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(UnitId)
    }
}

/// The payload of a unit: a clause or a formula tree.
#[derive(Debug, Clone)]
pub enum UnitPayload {
    Clause(Clause),
    Formula(Formula),
}

/// A unit of inference: payload plus derivation attributes.
///
/// Once registered, the payload, inference and input type are immutable;
/// the clause reference count is the only mutable field.
#[derive(Debug, Clone)]
pub struct Unit {
    payload: UnitPayload,
    input_type: InputType,
    /// Color this unit inherited from the input problem (for inputs marked
    /// as belonging to one side without containing colored symbols).
    inherited_color: Color,
    inference: Inference,
}

impl Unit {
    pub fn clause(clause: Clause, input_type: InputType, inference: Inference) -> Unit {
        Unit {
            payload: UnitPayload::Clause(clause),
            input_type,
            inherited_color: Color::Transparent,
            inference,
        }
    }

    pub fn formula(formula: Formula, input_type: InputType, inference: Inference) -> Unit {
        Unit {
            payload: UnitPayload::Formula(formula),
            input_type,
            inherited_color: Color::Transparent,
            inference,
        }
    }

    /// Tag an input unit with the side it was stated on.
    pub fn with_inherited_color(mut self, color: Color) -> Unit {
        self.inherited_color = color;
        self
    }

    pub fn payload(&self) -> &UnitPayload {
        &self.payload
    }

    pub fn as_clause(&self) -> Option<&Clause> {
        match &self.payload {
            UnitPayload::Clause(c) => Some(c),
            UnitPayload::Formula(_) => None,
        }
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match &self.payload {
            UnitPayload::Formula(f) => Some(f),
            UnitPayload::Clause(_) => None,
        }
    }

    pub fn is_clause(&self) -> bool {
        matches!(self.payload, UnitPayload::Clause(_))
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn inherited_color(&self) -> Color {
        self.inherited_color
    }

    pub fn inference(&self) -> &Inference {
        &self.inference
    }

    /// Combined color of the payload.
    pub fn color(&self, store: &TermStore) -> Result<Color> {
        match &self.payload {
            UnitPayload::Clause(c) => Ok(c.color()),
            UnitPayload::Formula(f) => f.color(store),
        }
    }

    /// The payload as a closed formula (universal closure for clauses).
    pub fn formula_of(&self, store: &TermStore) -> Formula {
        match &self.payload {
            UnitPayload::Formula(f) => f.clone(),
            UnitPayload::Clause(c) => {
                if c.is_empty() {
                    return Formula::False;
                }
                let disjuncts: Vec<Formula> =
                    c.literals().iter().map(|&l| Formula::Atom(l)).collect();
                let body = if disjuncts.len() == 1 {
                    disjuncts.into_iter().next().expect("one disjunct")
                } else {
                    Formula::Or(disjuncts)
                };
                let mut vars = Vec::new();
                for &lit in c.literals() {
                    store.literal_variables(lit, &mut vars);
                }
                if vars.is_empty() {
                    body
                } else {
                    Formula::Forall(vars, Box::new(body))
                }
            }
        }
    }
}

/// Arena of all units of a session, indexed by unit number.
#[derive(Debug, Clone, Default)]
pub struct UnitStore {
    units: Vec<Unit>,
}

impl UnitStore {
    pub fn new() -> Self {
        UnitStore::default()
    }

    /// Register a unit, assigning the next number. Fails if any parent
    /// refers to a not-yet-registered unit; a number is assigned exactly
    /// once and never reused.
    pub fn register(&mut self, unit: Unit) -> Result<UnitId> {
        let number = self.units.len() as u32;
        for parent in &unit.inference.parents {
            if parent.0 >= number {
                return Err(ProofloomError::Domain(format!(
                    "unit registered with forward parent reference {} >= {}",
                    parent.0, number
                )));
            }
        }
        self.units.push(unit);
        Ok(UnitId(number))
    }

    pub fn get(&self, id: UnitId) -> &Unit {
        &self.units[id.0 as usize]
    }

    /// The number of a unit (its stable identity).
    pub fn number(&self, id: UnitId) -> u32 {
        id.0
    }

    /// Stable textual identifier of a unit, used to key the minimization
    /// encoding.
    pub fn unit_id_string(&self, id: UnitId) -> String {
        id.0.to_string()
    }

    /// Iterate over the parents of a unit.
    pub fn parents_of(&self, id: UnitId) -> impl Iterator<Item = UnitId> + '_ {
        self.get(id).inference.parents.iter().copied()
    }

    /// Whether the unit is the empty clause.
    pub fn is_refutation(&self, id: UnitId) -> bool {
        self.get(id).as_clause().is_some_and(|c| c.is_empty())
    }

    /// Increase the reference count of a clause unit. Formula units are
    /// not reference counted.
    pub fn inc_ref(&mut self, id: UnitId) {
        if let UnitPayload::Clause(c) = &mut self.units[id.0 as usize].payload {
            c.inc_ref();
        }
    }

    /// Decrease the reference count of a clause unit; underflow is fatal.
    pub fn dec_ref(&mut self, id: UnitId) {
        if let UnitPayload::Clause(c) = &mut self.units[id.0 as usize].payload {
            c.dec_ref();
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate over all registered unit ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = UnitId> {
        (0..self.units.len() as u32).map(UnitId)
    }

    /// Format a unit with name resolution.
    pub fn display<'a>(
        &'a self,
        store: &'a TermStore,
        interner: &'a Interner,
        id: UnitId,
    ) -> UnitDisplay<'a> {
        UnitDisplay {
            units: self,
            store,
            interner,
            id,
        }
    }
}

/// Display wrapper for a unit.
pub struct UnitDisplay<'a> {
    units: &'a UnitStore,
    store: &'a TermStore,
    interner: &'a Interner,
    id: UnitId,
}

impl<'a> fmt::Display for UnitDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.units.get(self.id);
        write!(f, "{}. ", self.id)?;
        match unit.payload() {
            UnitPayload::Clause(c) => write!(f, "{}", c.display(self.store, self.interner))?,
            UnitPayload::Formula(formula) => {
                write!(f, "{}", formula.display(self.store, self.interner))?
            }
        }
        write!(f, " [{}]", unit.inference().rule_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Literal;

    fn input_clause_unit(store: &mut TermStore, interner: &mut Interner, name: &str) -> Unit {
        let i = interner.individual_sort();
        let p = interner.intern_predicate(name, 0);
        let lit = store
            .intern_literal(interner, Literal::positive(p, vec![]))
            .unwrap();
        let clause = Clause::new(store, vec![lit]).unwrap();
        Unit::clause(clause, InputType::Axiom, Inference::input())
    }

    #[test]
    fn test_register_assigns_monotonic_numbers() {
        let mut interner = Interner::new();
        let mut store = TermStore::new();
        let mut units = UnitStore::new();

        let u0 = units
            .register(input_clause_unit(&mut store, &mut interner, "p"))
            .unwrap();
        let u1 = units
            .register(input_clause_unit(&mut store, &mut interner, "q"))
            .unwrap();

        assert_eq!(units.number(u0), 0);
        assert_eq!(units.number(u1), 1);
        assert_eq!(units.unit_id_string(u1), "1");
    }

    #[test]
    fn test_forward_parent_reference_is_rejected() {
        let mut units = UnitStore::new();
        let bad = Unit::clause(
            Clause::empty(),
            InputType::Axiom,
            Inference::derived("Resolution", vec![UnitId(7)]),
        );
        assert!(units.register(bad).is_err());
    }

    #[test]
    fn test_parents_iteration() {
        let mut interner = Interner::new();
        let mut store = TermStore::new();
        let mut units = UnitStore::new();

        let u0 = units
            .register(input_clause_unit(&mut store, &mut interner, "p"))
            .unwrap();
        let u1 = units
            .register(input_clause_unit(&mut store, &mut interner, "q"))
            .unwrap();
        let derived = Unit::clause(
            Clause::empty(),
            InputType::Axiom,
            Inference::resolution(u0, u1),
        );
        let u2 = units.register(derived).unwrap();

        let parents: Vec<UnitId> = units.parents_of(u2).collect();
        assert_eq!(parents, vec![u0, u1]);
        assert!(units.is_refutation(u2));
        assert!(!units.is_refutation(u0));
    }

    #[test]
    fn test_ref_counting() {
        let mut interner = Interner::new();
        let mut store = TermStore::new();
        let mut units = UnitStore::new();
        let u0 = units
            .register(input_clause_unit(&mut store, &mut interner, "p"))
            .unwrap();

        units.inc_ref(u0);
        units.inc_ref(u0);
        assert_eq!(units.get(u0).as_clause().unwrap().ref_count(), 2);
        units.dec_ref(u0);
        assert_eq!(units.get(u0).as_clause().unwrap().ref_count(), 1);
    }
}
