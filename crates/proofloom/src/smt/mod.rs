//! SMT benchmark construction for the interpolant minimizer.
//!
//! A thin propositional-plus-cost formula language and a benchmark
//! container that serializes to SMT-LIB 2 with a `minimize` directive.
//! The minimizer declares one boolean constant per trace predicate and
//! one real constant for the cost function.

pub mod solver;

pub use solver::{MinimizationResult, SmtMinimizer, SmtModel, Z3Minimizer};

use indexmap::IndexSet;
use std::fmt;

/// A named SMT constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SmtConstant(pub String);

impl SmtConstant {
    pub fn new(prefix: &str, node: &str) -> Self {
        SmtConstant(format!("{}_{}", prefix, node))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A formula of the minimization encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SmtFormula {
    True,
    False,
    Const(SmtConstant),
    Not(Box<SmtFormula>),
    And(Vec<SmtFormula>),
    Or(Vec<SmtFormula>),
    Implies(Box<SmtFormula>, Box<SmtFormula>),
    Iff(Box<SmtFormula>, Box<SmtFormula>),
    /// Unsigned numeric literal
    Number(u32),
    /// `weight` if the constant is true, else 0
    CondNumber(SmtConstant, u32),
    Add(Vec<SmtFormula>),
    Equals(Box<SmtFormula>, Box<SmtFormula>),
}

impl SmtFormula {
    pub fn constant(c: &SmtConstant) -> SmtFormula {
        SmtFormula::Const(c.clone())
    }

    pub fn negated(self) -> SmtFormula {
        match self {
            SmtFormula::True => SmtFormula::False,
            SmtFormula::False => SmtFormula::True,
            SmtFormula::Not(inner) => *inner,
            other => SmtFormula::Not(Box::new(other)),
        }
    }

    /// Conjunction, absorbing neutral elements.
    pub fn and(self, rhs: SmtFormula) -> SmtFormula {
        match (self, rhs) {
            (SmtFormula::True, f) | (f, SmtFormula::True) => f,
            (SmtFormula::And(mut parts), f) => {
                parts.push(f);
                SmtFormula::And(parts)
            }
            (l, r) => SmtFormula::And(vec![l, r]),
        }
    }

    /// Disjunction, absorbing neutral elements.
    pub fn or(self, rhs: SmtFormula) -> SmtFormula {
        match (self, rhs) {
            (SmtFormula::False, f) | (f, SmtFormula::False) => f,
            (SmtFormula::Or(mut parts), f) => {
                parts.push(f);
                SmtFormula::Or(parts)
            }
            (l, r) => SmtFormula::Or(vec![l, r]),
        }
    }

    pub fn implies(self, rhs: SmtFormula) -> SmtFormula {
        SmtFormula::Implies(Box::new(self), Box::new(rhs))
    }

    pub fn iff(self, rhs: SmtFormula) -> SmtFormula {
        SmtFormula::Iff(Box::new(self), Box::new(rhs))
    }

    pub fn equals(self, rhs: SmtFormula) -> SmtFormula {
        SmtFormula::Equals(Box::new(self), Box::new(rhs))
    }

    pub fn add(self, rhs: SmtFormula) -> SmtFormula {
        match (self, rhs) {
            (SmtFormula::Add(mut parts), f) => {
                parts.push(f);
                SmtFormula::Add(parts)
            }
            (l, r) => SmtFormula::Add(vec![l, r]),
        }
    }

    fn write_sexp(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtFormula::True => write!(f, "true"),
            SmtFormula::False => write!(f, "false"),
            SmtFormula::Const(c) => write!(f, "{}", c.name()),
            SmtFormula::Not(inner) => {
                write!(f, "(not ")?;
                inner.write_sexp(f)?;
                write!(f, ")")
            }
            SmtFormula::And(parts) => Self::write_nary(f, "and", parts),
            SmtFormula::Or(parts) => Self::write_nary(f, "or", parts),
            SmtFormula::Implies(l, r) => Self::write_binary(f, "=>", l, r),
            SmtFormula::Iff(l, r) => Self::write_binary(f, "=", l, r),
            SmtFormula::Number(n) => write!(f, "{}", n),
            SmtFormula::CondNumber(c, n) => write!(f, "(ite {} {} 0)", c.name(), n),
            SmtFormula::Add(parts) => Self::write_nary(f, "+", parts),
            SmtFormula::Equals(l, r) => Self::write_binary(f, "=", l, r),
        }
    }

    fn write_nary(f: &mut fmt::Formatter<'_>, op: &str, parts: &[SmtFormula]) -> fmt::Result {
        match parts {
            [] => write!(f, "({})", op),
            [single] => single.write_sexp(f),
            _ => {
                write!(f, "({}", op)?;
                for part in parts {
                    write!(f, " ")?;
                    part.write_sexp(f)?;
                }
                write!(f, ")")
            }
        }
    }

    fn write_binary(
        f: &mut fmt::Formatter<'_>,
        op: &str,
        l: &SmtFormula,
        r: &SmtFormula,
    ) -> fmt::Result {
        write!(f, "({} ", op)?;
        l.write_sexp(f)?;
        write!(f, " ")?;
        r.write_sexp(f)?;
        write!(f, ")")
    }
}

impl fmt::Display for SmtFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_sexp(f)
    }
}

/// The full minimization problem: declarations, asserted formulas and the
/// constant to minimize.
#[derive(Debug, Clone, Default)]
pub struct SmtBenchmark {
    bool_constants: IndexSet<String>,
    real_constants: IndexSet<String>,
    formulas: Vec<(SmtFormula, Option<String>)>,
}

impl SmtBenchmark {
    pub fn new() -> Self {
        SmtBenchmark::default()
    }

    pub fn declare_propositional_constant(&mut self, c: &SmtConstant) {
        self.bool_constants.insert(c.name().to_string());
    }

    pub fn declare_real_constant(&mut self, c: &SmtConstant) {
        self.real_constants.insert(c.name().to_string());
    }

    pub fn add_formula(&mut self, formula: SmtFormula) {
        self.formulas.push((formula, None));
    }

    pub fn add_formula_with_comment(&mut self, formula: SmtFormula, comment: &str) {
        self.formulas.push((formula, Some(comment.to_string())));
    }

    pub fn formula_count(&self) -> usize {
        self.formulas.len()
    }

    /// Serialize to SMT-LIB 2 with a `minimize` objective.
    pub fn serialize(&self, cost: &SmtConstant) -> String {
        let mut out = String::new();
        out.push_str("(set-option :produce-models true)\n");
        for name in &self.bool_constants {
            out.push_str(&format!("(declare-const {} Bool)\n", name));
        }
        for name in &self.real_constants {
            out.push_str(&format!("(declare-const {} Real)\n", name));
        }
        for (formula, comment) in &self.formulas {
            if let Some(comment) = comment {
                out.push_str(&format!("; {}\n", comment));
            }
            out.push_str(&format!("(assert {})\n", formula));
        }
        out.push_str(&format!("(minimize {})\n", cost.name()));
        out.push_str("(check-sat)\n(get-model)\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_rendering() {
        let a = SmtConstant::new("s", "1");
        let b = SmtConstant::new("d", "1");
        let f = SmtFormula::constant(&a)
            .negated()
            .and(SmtFormula::constant(&b));
        assert_eq!(f.to_string(), "(and (not s_1) d_1)");

        let iff = SmtFormula::constant(&a).iff(SmtFormula::constant(&b));
        assert_eq!(iff.to_string(), "(= s_1 d_1)");
    }

    #[test]
    fn test_cost_sum_rendering() {
        let v1 = SmtConstant::new("v", "c0");
        let v2 = SmtConstant::new("v", "c1");
        let sum = SmtFormula::Number(0)
            .add(SmtFormula::CondNumber(v1, 3))
            .add(SmtFormula::CondNumber(v2, 5));
        assert_eq!(sum.to_string(), "(+ 0 (ite v_c0 3 0) (ite v_c1 5 0))");
    }

    #[test]
    fn test_benchmark_serialization() {
        let mut benchmark = SmtBenchmark::new();
        let s = SmtConstant::new("s", "0");
        let cost = SmtConstant("cost".to_string());
        benchmark.declare_propositional_constant(&s);
        benchmark.declare_real_constant(&cost);
        benchmark.add_formula_with_comment(SmtFormula::constant(&s).negated(), "refutation");

        let text = benchmark.serialize(&cost);
        assert!(text.contains("(declare-const s_0 Bool)"));
        assert!(text.contains("(declare-const cost Real)"));
        assert!(text.contains("; refutation"));
        assert!(text.contains("(assert (not s_0))"));
        assert!(text.contains("(minimize cost)"));
        assert!(text.ends_with("(check-sat)\n(get-model)\n"));
    }
}
