//! Inference records: how each unit was obtained.
//!
//! An inference stores the rule name and the ordered parent units. The set
//! of all inferences forms the proof DAG; parents are always
//! earlier-numbered units, so the DAG is acyclic by construction.

use super::unit::UnitId;
use serde::{Deserialize, Serialize};

/// How a unit was obtained (rule name plus premise units).
///
/// The rule name is a plain string so that new rules can be added without
/// touching this type; the constructors below cover the rules this crate
/// itself produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inference {
    /// Name of the rule that produced the unit
    pub rule_name: String,
    /// Parent units, in rule-specific order
    pub parents: Vec<UnitId>,
}

impl Inference {
    /// An input unit (no premises).
    pub fn input() -> Self {
        Inference {
            rule_name: "Input".into(),
            parents: vec![],
        }
    }

    /// Duplicate literal removal during clausification.
    pub fn duplicate_literal_removal(parent: UnitId) -> Self {
        Inference {
            rule_name: "DuplicateLiteralRemoval".into(),
            parents: vec![parent],
        }
    }

    /// Trivial inequality removal during clausification.
    pub fn trivial_inequality_removal(parent: UnitId) -> Self {
        Inference {
            rule_name: "TrivialInequalityRemoval".into(),
            parents: vec![parent],
        }
    }

    /// Binary resolution.
    pub fn resolution(parent1: UnitId, parent2: UnitId) -> Self {
        Inference {
            rule_name: "Resolution".into(),
            parents: vec![parent1, parent2],
        }
    }

    /// A generic derived unit.
    pub fn derived(rule_name: &str, parents: Vec<UnitId>) -> Self {
        Inference {
            rule_name: rule_name.into(),
            parents,
        }
    }

    pub fn is_input(&self) -> bool {
        self.rule_name == "Input"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_constructors() {
        let input = Inference::input();
        assert!(input.is_input());
        assert!(input.parents.is_empty());

        let res = Inference::resolution(UnitId(1), UnitId(2));
        assert_eq!(res.rule_name, "Resolution");
        assert_eq!(res.parents, vec![UnitId(1), UnitId(2)]);
    }

    #[test]
    fn test_serialization() {
        let inf = Inference::resolution(UnitId(0), UnitId(3));
        let json = serde_json::to_string(&inf).unwrap();
        let parsed: Inference = serde_json::from_str(&json).unwrap();
        assert_eq!(inf, parsed);
    }
}
