//! Clausification pipeline.
//!
//! Parses the clausal TPTP input, applies the immediate simplifications
//! (duplicate literal removal, trivial inequality removal, tautology
//! deletion) and serializes the surviving clauses back to TPTP, one
//! `cnf(...)` line per clause.

use crate::config::Budget;
use crate::error::Result;
use crate::fol::{Clause, Interner, LitId, TermStore};
use crate::parser::parse_tptp;
use crate::proof::{Inference, Unit, UnitId, UnitStore};
use crate::session::Session;
use log::debug;

/// Outcome of a clausification run.
#[derive(Debug, Clone, Default)]
pub struct ClausifyResult {
    /// Units surviving simplification, in input order
    pub units: Vec<UnitId>,
}

/// Parse, simplify and register the input problem.
pub fn clausify(session: &mut Session, source: &str, budget: &Budget) -> Result<ClausifyResult> {
    let Session {
        interner,
        terms,
        units,
        stats,
        ..
    } = session;

    let parsed = parse_tptp(source, terms, interner, units)?;
    debug!("parsed {} input clauses", parsed.len());

    let mut surviving = Vec::new();
    for unit_id in parsed {
        budget.check_memory()?;
        let clause = units
            .get(unit_id)
            .as_clause()
            .expect("clausal input")
            .clone();

        // Duplicate literal removal (the literal list is sorted, so
        // duplicates are adjacent)
        let mut literals: Vec<LitId> = clause.literals().to_vec();
        literals.dedup();
        let duplicates_removed = clause.len() - literals.len();
        stats.duplicate_literals_removed += duplicates_removed;

        // Trivial inequality removal: drop t != t literals
        let before = literals.len();
        literals.retain(|&l| {
            let lit = terms.literal(l);
            !(lit.is_equality(interner) && !lit.polarity && lit.args[0] == lit.args[1])
        });
        let trivial_removed = before - literals.len();
        stats.trivial_inequalities_removed += trivial_removed;

        // Tautology deletion: a positive t = t literal or a
        // complementary pair
        if is_tautology(terms, interner, &literals) {
            stats.tautologies_deleted += 1;
            continue;
        }

        if duplicates_removed == 0 && trivial_removed == 0 {
            surviving.push(unit_id);
            continue;
        }

        let mut inference = if duplicates_removed > 0 {
            Inference::duplicate_literal_removal(unit_id)
        } else {
            Inference::trivial_inequality_removal(unit_id)
        };
        if duplicates_removed > 0 && trivial_removed > 0 {
            inference = Inference::derived("ImmediateSimplification", vec![unit_id]);
        }
        let simplified = Unit::clause(
            Clause::new(terms, literals)?,
            units.get(unit_id).input_type(),
            inference,
        );
        surviving.push(units.register(simplified)?);
    }

    Ok(ClausifyResult { units: surviving })
}

fn is_tautology(terms: &TermStore, interner: &Interner, literals: &[LitId]) -> bool {
    for (i, &l1) in literals.iter().enumerate() {
        let lit1 = terms.literal(l1);
        if lit1.is_equality(interner) && lit1.polarity && lit1.args[0] == lit1.args[1] {
            return true;
        }
        for &l2 in &literals[i + 1..] {
            let lit2 = terms.literal(l2);
            if lit1.predicate == lit2.predicate
                && lit1.args == lit2.args
                && lit1.polarity != lit2.polarity
            {
                return true;
            }
        }
    }
    false
}

/// Serialize a unit as one TPTP `cnf(...)` line.
pub fn serialize_unit(
    terms: &TermStore,
    interner: &Interner,
    units: &UnitStore,
    unit: UnitId,
) -> String {
    let record = units.get(unit);
    let clause = record.as_clause().expect("clausal unit");
    format!(
        "cnf(u{}, {}, ({})).",
        units.number(unit),
        record.input_type().tptp_role(),
        clause.display(terms, interner)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn run(source: &str) -> (Session, ClausifyResult) {
        let mut session = Session::new(SessionConfig::default());
        let result = clausify(&mut session, source, &Budget::unlimited()).unwrap();
        (session, result)
    }

    #[test]
    fn test_duplicate_literals_are_removed() {
        let (session, result) = run("cnf(dup, axiom, (p(a) | p(a) | q(a))).");
        assert_eq!(result.units.len(), 1);
        let clause = session.units.get(result.units[0]).as_clause().unwrap();
        assert_eq!(clause.len(), 2);
        assert_eq!(session.stats.duplicate_literals_removed, 1);
        // The simplified clause records its parent
        let parents: Vec<UnitId> = session.units.parents_of(result.units[0]).collect();
        assert_eq!(parents.len(), 1);
    }

    #[test]
    fn test_tautologies_are_deleted() {
        let (session, result) = run(
            "cnf(taut1, axiom, (p(a) | ~p(a))).
             cnf(taut2, axiom, (a = a | q(b))).
             cnf(keep, axiom, p(b)).",
        );
        assert_eq!(result.units.len(), 1);
        assert_eq!(session.stats.tautologies_deleted, 2);
    }

    #[test]
    fn test_trivial_inequalities_are_removed() {
        let (session, result) = run("cnf(tri, axiom, (a != a | q(b))).");
        assert_eq!(result.units.len(), 1);
        let clause = session.units.get(result.units[0]).as_clause().unwrap();
        assert_eq!(clause.len(), 1);
        assert_eq!(session.stats.trivial_inequalities_removed, 1);
    }

    #[test]
    fn test_round_trip() {
        let source = "cnf(c1, axiom, (p(X) | ~q(f(X), a))).";
        let (session, result) = run(source);
        let line = serialize_unit(
            &session.terms,
            &session.interner,
            &session.units,
            result.units[0],
        );
        assert!(line.starts_with("cnf(u0, axiom, ("));
        assert!(line.ends_with("))."));

        // The serialized form parses back to a clause with the same shape
        let mut session2 = Session::new(SessionConfig::default());
        let reparsed = clausify(&mut session2, &line, &Budget::unlimited()).unwrap();
        assert_eq!(reparsed.units.len(), 1);
        let clause = session2.units.get(reparsed.units[0]).as_clause().unwrap();
        assert_eq!(clause.len(), 2);
    }
}
