//! Literals: typed predicate applications with polarity.

use super::interner::{Interner, PredicateId};
use super::term::{TermId, TermStore};
use std::fmt;

/// ID of a hash-consed literal
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LitId(pub(crate) u32);

impl LitId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A literal: predicate applied to terms, with polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub predicate: PredicateId,
    pub polarity: bool,
    pub args: Vec<TermId>,
}

impl Literal {
    pub fn positive(predicate: PredicateId, args: Vec<TermId>) -> Self {
        Literal {
            predicate,
            polarity: true,
            args,
        }
    }

    pub fn negative(predicate: PredicateId, args: Vec<TermId>) -> Self {
        Literal {
            predicate,
            polarity: false,
            args,
        }
    }

    /// The same atom with the opposite polarity.
    pub fn complement(&self) -> Literal {
        Literal {
            predicate: self.predicate,
            polarity: !self.polarity,
            args: self.args.clone(),
        }
    }

    /// The positive form of this literal (identity if already positive).
    pub fn positive_form(&self) -> Literal {
        Literal {
            predicate: self.predicate,
            polarity: true,
            args: self.args.clone(),
        }
    }

    pub fn is_equality(&self, interner: &Interner) -> bool {
        interner.is_equality(self.predicate)
    }
}

/// Display wrapper for a literal that resolves symbol names.
pub struct LiteralDisplay<'a> {
    pub(crate) store: &'a TermStore,
    pub(crate) interner: &'a Interner,
    pub(crate) id: LitId,
}

impl TermStore {
    /// Format a literal with an interner for name resolution.
    pub fn display_literal<'a>(&'a self, interner: &'a Interner, id: LitId) -> LiteralDisplay<'a> {
        LiteralDisplay {
            store: self,
            interner,
            id,
        }
    }
}

impl<'a> fmt::Display for LiteralDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.store.literal(self.id);
        if lit.is_equality(self.interner) && lit.args.len() == 2 {
            let op = if lit.polarity { "=" } else { "!=" };
            return write!(
                f,
                "{} {} {}",
                self.store.display(self.interner, lit.args[0]),
                op,
                self.store.display(self.interner, lit.args[1])
            );
        }
        if !lit.polarity {
            write!(f, "~")?;
        }
        write!(f, "{}", self.interner.predicate_name(lit.predicate))?;
        if !lit.args.is_empty() {
            write!(f, "(")?;
            for (i, &arg) in lit.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", self.store.display(self.interner, arg))?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
