//! External SMT minimizer interface.
//!
//! The minimizer hands a serialized benchmark to an optimizing SMT solver
//! and reads back per-constant assignments. [`Z3Minimizer`] shells out to
//! a `z3`-style binary; tests substitute a scripted implementation of
//! [`SmtMinimizer`].

use super::{SmtBenchmark, SmtConstant};
use indexmap::IndexMap;
use log::warn;
use std::io::Write;
use std::process::{Command, Stdio};

/// Outcome of a minimization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizationResult {
    /// The model minimizes the cost function
    Optimal,
    /// A model was found but optimality was not established
    Approximate,
    /// No usable model (timeout, unsat, solver error)
    Fail,
}

/// Per-constant assignments returned by the back end: `"true"`/`"false"`
/// for booleans, a decimal string for the cost.
#[derive(Debug, Clone, Default)]
pub struct SmtModel {
    assignment: IndexMap<String, String>,
}

impl SmtModel {
    pub fn new() -> Self {
        SmtModel::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.assignment.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignment.get(name).map(String::as_str)
    }

    pub fn is_true(&self, constant: &SmtConstant) -> bool {
        self.get(constant.name()) == Some("true")
    }

    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }
}

/// An external solver that minimizes `cost` subject to the benchmark.
pub trait SmtMinimizer {
    fn minimize(
        &mut self,
        benchmark: &SmtBenchmark,
        cost: &SmtConstant,
    ) -> (MinimizationResult, SmtModel);
}

/// Process wrapper around an optimizing SMT solver with SMT-LIB 2 input.
#[derive(Debug, Clone)]
pub struct Z3Minimizer {
    /// Solver executable
    pub command: String,
    /// Extra arguments before `-in -smt2`
    pub args: Vec<String>,
}

impl Default for Z3Minimizer {
    fn default() -> Self {
        Z3Minimizer {
            command: "z3".to_string(),
            args: Vec::new(),
        }
    }
}

impl SmtMinimizer for Z3Minimizer {
    fn minimize(
        &mut self,
        benchmark: &SmtBenchmark,
        cost: &SmtConstant,
    ) -> (MinimizationResult, SmtModel) {
        let input = benchmark.serialize(cost);
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg("-in")
            .arg("-smt2")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(|mut child| {
                child
                    .stdin
                    .as_mut()
                    .expect("stdin piped")
                    .write_all(input.as_bytes())?;
                child.wait_with_output()
            });

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!("SMT minimizer process failed: {}", err);
                return (MinimizationResult::Fail, SmtModel::new());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();
        let verdict = lines.next().unwrap_or("").trim().to_string();
        let rest: String = lines.collect::<Vec<_>>().join("\n");

        match verdict.as_str() {
            "sat" => (MinimizationResult::Optimal, parse_model(&rest)),
            "unknown" => {
                let model = parse_model(&rest);
                if model.is_empty() {
                    (MinimizationResult::Fail, model)
                } else {
                    (MinimizationResult::Approximate, model)
                }
            }
            _ => {
                warn!("SMT minimizer returned '{}'", verdict);
                (MinimizationResult::Fail, SmtModel::new())
            }
        }
    }
}

/// Parse `(define-fun name () Sort value)` entries of a `get-model`
/// answer into name/value pairs.
pub fn parse_model(text: &str) -> SmtModel {
    let tokens = tokenize(text);
    let mut model = SmtModel::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] != "define-fun" {
            i += 1;
            continue;
        }
        // name ( ) Sort value
        if i + 4 >= tokens.len() {
            break;
        }
        let name = tokens[i + 1].clone();
        let mut j = i + 2;
        // skip the (possibly empty) parameter list
        if tokens[j] == "(" {
            let mut depth = 0;
            while j < tokens.len() {
                if tokens[j] == "(" {
                    depth += 1;
                } else if tokens[j] == ")" {
                    depth -= 1;
                    if depth == 0 {
                        j += 1;
                        break;
                    }
                }
                j += 1;
            }
        }
        // skip the sort (named or parenthesized)
        if j < tokens.len() && tokens[j] == "(" {
            let mut depth = 0;
            while j < tokens.len() {
                if tokens[j] == "(" {
                    depth += 1;
                } else if tokens[j] == ")" {
                    depth -= 1;
                    if depth == 0 {
                        j += 1;
                        break;
                    }
                }
                j += 1;
            }
        } else {
            j += 1;
        }
        // the value: a token or a parenthesized expression like (- 1.0)
        if j < tokens.len() {
            let value = if tokens[j] == "(" {
                let mut depth = 0;
                let mut parts = Vec::new();
                while j < tokens.len() {
                    if tokens[j] == "(" {
                        depth += 1;
                    } else if tokens[j] == ")" {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    } else {
                        parts.push(tokens[j].clone());
                    }
                    j += 1;
                }
                if parts.first().map(String::as_str) == Some("-") {
                    format!("-{}", parts[1..].join(" "))
                } else {
                    parts.join(" ")
                }
            } else {
                tokens[j].clone()
            };
            model.set(&name, &value);
        }
        i = j + 1;
    }
    model
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_booleans() {
        let text = r#"
(
  (define-fun s_3 () Bool
    true)
  (define-fun d_1 () Bool
    false)
  (define-fun cost () Real
    7.0)
)
"#;
        let model = parse_model(text);
        assert_eq!(model.get("s_3"), Some("true"));
        assert_eq!(model.get("d_1"), Some("false"));
        assert_eq!(model.get("cost"), Some("7.0"));
    }

    #[test]
    fn test_parse_model_negative_value() {
        let text = "((define-fun cost () Real (- 2.0)))";
        let model = parse_model(text);
        assert_eq!(model.get("cost"), Some("-2.0"));
    }

    #[test]
    fn test_model_is_true() {
        let mut model = SmtModel::new();
        model.set("s_0", "true");
        assert!(model.is_true(&SmtConstant::new("s", "0")));
        assert!(!model.is_true(&SmtConstant::new("s", "1")));
    }
}
