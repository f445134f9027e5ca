//! TPTP parser for the clausal fragment.
//!
//! Accepts `cnf(name, role, formula).` annotated formulas and `%` line
//! comments. Formulas are disjunctions of literals over plain first-order
//! terms; `=`/`!=` are recognized as equality. The parser builds a small
//! AST first and interns it into the session stores in a second step, so
//! no parsing state outlives the call.

use crate::error::{ProofloomError, Result};
use crate::fol::{Clause, InputType, Interner, Literal, TermId, TermStore};
use crate::proof::{Inference, Unit, UnitId, UnitStore};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{map, opt, verify},
    multi::separated_list1,
    sequence::{delimited, tuple},
    IResult,
};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum AstTerm {
    Var(String),
    Fun(String, Vec<AstTerm>),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
enum AstAtom {
    Pred(String, Vec<AstTerm>),
    Eq(AstTerm, AstTerm),
}

#[derive(Debug, Clone, PartialEq)]
struct AstLiteral {
    polarity: bool,
    atom: AstAtom,
}

#[derive(Debug, Clone, PartialEq)]
struct AstClause {
    name: String,
    role: String,
    literals: Vec<AstLiteral>,
}

/// Skip whitespace and `%` line comments.
fn sp(input: &str) -> IResult<&str, ()> {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.strip_prefix('%') {
            Some(comment) => match comment.find('\n') {
                Some(nl) => rest = &comment[nl + 1..],
                None => return Ok(("", ())),
            },
            None => return Ok((trimmed, ())),
        }
    }
}

fn token<'a, O>(
    mut inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    move |input| {
        let (input, ()) = sp(input)?;
        inner(input)
    }
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// A lowercase-initial atomic word (functor, predicate, role or name).
fn lower_word(input: &str) -> IResult<&str, &str> {
    verify(word, |w: &str| {
        w.starts_with(|c: char| c.is_ascii_lowercase())
    })(input)
}

/// An uppercase-initial variable name.
fn upper_word(input: &str) -> IResult<&str, &str> {
    verify(word, |w: &str| {
        w.starts_with(|c: char| c.is_ascii_uppercase())
    })(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    let (rest, (sign, digits)) =
        tuple((opt(char('-')), take_while1(|c: char| c.is_ascii_digit())))(input)?;
    let value: i64 = digits.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((rest, if sign.is_some() { -value } else { value }))
}

fn term(input: &str) -> IResult<&str, AstTerm> {
    alt((
        map(token(integer), AstTerm::Int),
        map(token(upper_word), |v| AstTerm::Var(v.to_string())),
        map(
            tuple((token(lower_word), opt(argument_list))),
            |(name, args)| AstTerm::Fun(name.to_string(), args.unwrap_or_default()),
        ),
    ))(input)
}

fn argument_list(input: &str) -> IResult<&str, Vec<AstTerm>> {
    delimited(
        token(char('(')),
        separated_list1(token(char(',')), term),
        token(char(')')),
    )(input)
}

/// A literal: an optionally negated atom, or an (in)equality of terms.
fn literal(input: &str) -> IResult<&str, AstLiteral> {
    let (input, negated) = opt(token(char('~')))(input)?;
    let (input, lhs) = term(input)?;
    let (input, eq_rhs) = opt(tuple((
        token(alt((tag("!="), tag("=")))),
        term,
    )))(input)?;

    let (polarity, atom) = match eq_rhs {
        Some((op, rhs)) => (op == "=", AstAtom::Eq(lhs, rhs)),
        None => {
            let AstTerm::Fun(name, args) = lhs else {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Verify,
                )));
            };
            (true, AstAtom::Pred(name, args))
        }
    };
    let polarity = polarity != negated.is_some();
    Ok((input, AstLiteral { polarity, atom }))
}

fn disjunction(input: &str) -> IResult<&str, Vec<AstLiteral>> {
    alt((
        map(token(tag("$false")), |_| Vec::new()),
        separated_list1(token(char('|')), literal),
    ))(input)
}

/// A clause body, optionally parenthesized.
fn clause_body(input: &str) -> IResult<&str, Vec<AstLiteral>> {
    alt((
        delimited(token(char('(')), disjunction, token(char(')'))),
        disjunction,
    ))(input)
}

fn cnf_annotated(input: &str) -> IResult<&str, AstClause> {
    let (input, _) = token(tag("cnf"))(input)?;
    let (input, (name, _, role, _, literals)) = delimited(
        token(char('(')),
        tuple((
            token(word),
            token(char(',')),
            token(lower_word),
            token(char(',')),
            clause_body,
        )),
        token(char(')')),
    )(input)?;
    let (input, _) = token(char('.'))(input)?;
    Ok((
        input,
        AstClause {
            name: name.to_string(),
            role: role.to_string(),
            literals,
        },
    ))
}

fn problem(input: &str) -> IResult<&str, Vec<AstClause>> {
    let mut clauses = Vec::new();
    let mut rest = input;
    loop {
        let (after, ()) = sp(rest)?;
        if after.is_empty() {
            return Ok((after, clauses));
        }
        let (after, clause) = cnf_annotated(after)?;
        clauses.push(clause);
        rest = after;
    }
}

/// Parse a TPTP CNF problem and register one input unit per clause.
pub fn parse_tptp(
    source: &str,
    store: &mut TermStore,
    interner: &mut Interner,
    units: &mut UnitStore,
) -> Result<Vec<UnitId>> {
    let clauses = match problem(source) {
        Ok((_, clauses)) => clauses,
        Err(err) => {
            let location = match &err {
                nom::Err::Error(e) | nom::Err::Failure(e) => {
                    e.input.chars().take(40).collect::<String>()
                }
                nom::Err::Incomplete(_) => String::new(),
            };
            return Err(ProofloomError::Parse(format!(
                "malformed TPTP input near '{}'",
                location
            )));
        }
    };

    let mut ids = Vec::with_capacity(clauses.len());
    for ast in clauses {
        let mut vars: HashMap<String, u32> = HashMap::new();
        let mut literals = Vec::with_capacity(ast.literals.len());
        for lit in &ast.literals {
            literals.push(intern_literal(store, interner, lit, &mut vars)?);
        }
        let clause = Clause::new(store, literals)?;
        let unit = Unit::clause(
            clause,
            InputType::from_tptp_role(&ast.role),
            Inference::input(),
        );
        ids.push(units.register(unit)?);
    }
    Ok(ids)
}

fn intern_literal(
    store: &mut TermStore,
    interner: &mut Interner,
    lit: &AstLiteral,
    vars: &mut HashMap<String, u32>,
) -> Result<crate::fol::LitId> {
    let literal = match &lit.atom {
        AstAtom::Pred(name, args) => {
            let predicate = interner.intern_predicate(name, args.len() as u8);
            let args = args
                .iter()
                .map(|a| intern_term(store, interner, a, vars))
                .collect::<Result<Vec<TermId>>>()?;
            Literal {
                predicate,
                polarity: lit.polarity,
                args,
            }
        }
        AstAtom::Eq(lhs, rhs) => {
            let lhs = intern_term(store, interner, lhs, vars)?;
            let rhs = intern_term(store, interner, rhs, vars)?;
            Literal {
                predicate: interner.eq_predicate(),
                polarity: lit.polarity,
                args: vec![lhs, rhs],
            }
        }
    };
    store.intern_literal(interner, literal)
}

fn intern_term(
    store: &mut TermStore,
    interner: &mut Interner,
    term: &AstTerm,
    vars: &mut HashMap<String, u32>,
) -> Result<TermId> {
    match term {
        AstTerm::Var(name) => {
            let next = vars.len() as u32;
            let var = *vars.entry(name.clone()).or_insert(next);
            Ok(store.intern_variable(var, interner.individual_sort()))
        }
        AstTerm::Int(value) => {
            let functor = interner.intern_integer(*value);
            store.intern_constant(interner, functor, interner.int_sort())
        }
        AstTerm::Fun(name, args) => {
            let functor = interner.intern_function(name, args.len() as u8);
            let args = args
                .iter()
                .map(|a| intern_term(store, interner, a, vars))
                .collect::<Result<Vec<TermId>>>()?;
            store.intern_apply(interner, functor, interner.individual_sort(), args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (TermStore, Interner, UnitStore, Vec<UnitId>) {
        let mut store = TermStore::new();
        let mut interner = Interner::new();
        let mut units = UnitStore::new();
        let ids = parse_tptp(source, &mut store, &mut interner, &mut units).unwrap();
        (store, interner, units, ids)
    }

    #[test]
    fn test_parse_simple_clauses() {
        let (_, _, units, ids) = parse(
            r#"
            % a small problem
            cnf(p_a, axiom, p(a)).
            cnf(p_implies_q, axiom, (~p(X) | q(X))).
            cnf(goal, negated_conjecture, ~q(a)).
            "#,
        );
        assert_eq!(ids.len(), 3);
        assert_eq!(units.get(ids[0]).as_clause().unwrap().len(), 1);
        assert_eq!(units.get(ids[1]).as_clause().unwrap().len(), 2);
        assert_eq!(
            units.get(ids[2]).input_type(),
            InputType::Conjecture
        );
    }

    #[test]
    fn test_parse_equality_literals() {
        let (store, interner, units, ids) = parse("cnf(eq, axiom, (a = b | c != d)).");
        let clause = units.get(ids[0]).as_clause().unwrap();
        assert_eq!(clause.len(), 2);
        let polarities: Vec<bool> = clause
            .literals()
            .iter()
            .map(|&l| store.literal(l).polarity)
            .collect();
        assert!(polarities.contains(&true));
        assert!(polarities.contains(&false));
        for &l in clause.literals() {
            assert!(store.literal(l).is_equality(&interner));
        }
    }

    #[test]
    fn test_parse_empty_clause() {
        let (_, _, units, ids) = parse("cnf(bot, axiom, $false).");
        assert!(units.is_refutation(ids[0]));
    }

    #[test]
    fn test_variables_are_clause_local() {
        let (store, _, units, ids) =
            parse("cnf(one, axiom, p(X)). cnf(two, axiom, q(X)).");
        let first = units.get(ids[0]).as_clause().unwrap().literals()[0];
        let second = units.get(ids[1]).as_clause().unwrap().literals()[0];
        // Both clauses use variable slot 0
        assert_eq!(
            store.literal(first).args[0],
            store.literal(second).args[0]
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut store = TermStore::new();
        let mut interner = Interner::new();
        let mut units = UnitStore::new();
        let res = parse_tptp("cnf(broken, axiom", &mut store, &mut interner, &mut units);
        assert!(matches!(res, Err(ProofloomError::Parse(_))));
    }

    #[test]
    fn test_numerals() {
        let (store, interner, units, ids) = parse("cnf(n, axiom, p(1, -2)).");
        let lit = units.get(ids[0]).as_clause().unwrap().literals()[0];
        let args = &store.literal(lit).args;
        assert_eq!(store.sort(args[0]), interner.int_sort());
        assert_eq!(store.sort(args[1]), interner.int_sort());
    }
}
