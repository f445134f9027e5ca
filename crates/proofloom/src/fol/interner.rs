//! Symbol interning: sorts, function and predicate symbols.
//!
//! Symbols are referred to by compact `u32` ids everywhere in the engine.
//! The interner also owns the attributes the rest of the engine consults:
//! the sort table (with constructed arrow sorts for the applicative
//! fragment), interpolation colors, and theory-interpretation marks for the
//! abstraction policies. It is session-owned and threaded through all
//! construction calls; there is no process-wide symbol state.

use crate::error::{ProofloomError, Result};
use indexmap::IndexMap;
use std::fmt;

/// ID of an interned sort
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub(crate) u32);

/// ID of an interned function symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) u32);

/// ID of an interned predicate symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub(crate) u32);

impl SortId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl FunctionId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl PredicateId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Interpolation color of a symbol, term or unit.
///
/// Compounds combine their parts' colors; a Left/Right collision is a
/// domain error refused at construction time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Transparent,
    Left,
    Right,
}

impl Color {
    /// Combine the colors of two parts of a compound.
    pub fn combine(self, other: Color) -> Result<Color> {
        match (self, other) {
            (Color::Transparent, c) | (c, Color::Transparent) => Ok(c),
            (a, b) if a == b => Ok(a),
            _ => Err(ProofloomError::Domain(
                "left and right colors merged in one term".to_string(),
            )),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Transparent => write!(f, "transparent"),
            Color::Left => write!(f, "left"),
            Color::Right => write!(f, "right"),
        }
    }
}

/// Structural key of a sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SortKey {
    Named(String),
    /// Function sort `A > B`
    Arrow(SortId, SortId),
}

#[derive(Debug, Clone)]
struct FunctionData {
    name: String,
    arity: u8,
    color: Color,
    /// Theory-interpreted (integer arithmetic operator or numeral)
    interpreted: bool,
    /// Associative-commutative theory operator
    ac: bool,
}

#[derive(Debug, Clone)]
struct PredicateData {
    name: String,
    arity: u8,
    color: Color,
}

/// Session-owned symbol interner.
///
/// Construction pre-declares the built-in sorts (`$i`, `$int`, `$o`), the
/// equality predicate, the applicative `@` functor, and the interpreted
/// integer operators `$sum`, `$product` and `$uminus` (with `$sum` marked
/// associative-commutative). Numerals are interned on demand.
#[derive(Debug, Clone)]
pub struct Interner {
    sorts: Vec<SortKey>,
    sort_lookup: IndexMap<SortKey, u32>,
    functions: Vec<FunctionData>,
    function_lookup: IndexMap<(String, u8), u32>,
    predicates: Vec<PredicateData>,
    predicate_lookup: IndexMap<(String, u8), u32>,
    numerals: IndexMap<i64, FunctionId>,

    sort_individual: SortId,
    sort_int: SortId,
    sort_bool: SortId,
    eq_predicate: PredicateId,
    app_function: FunctionId,
    int_sum: FunctionId,
    int_product: FunctionId,
    int_uminus: FunctionId,
}

impl Default for Interner {
    fn default() -> Self {
        Interner::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Interner {
            sorts: Vec::new(),
            sort_lookup: IndexMap::new(),
            functions: Vec::new(),
            function_lookup: IndexMap::new(),
            predicates: Vec::new(),
            predicate_lookup: IndexMap::new(),
            numerals: IndexMap::new(),
            sort_individual: SortId(0),
            sort_int: SortId(0),
            sort_bool: SortId(0),
            eq_predicate: PredicateId(0),
            app_function: FunctionId(0),
            int_sum: FunctionId(0),
            int_product: FunctionId(0),
            int_uminus: FunctionId(0),
        };

        interner.sort_individual = interner.intern_sort("$i");
        interner.sort_int = interner.intern_sort("$int");
        interner.sort_bool = interner.intern_sort("$o");
        interner.eq_predicate = interner.intern_predicate("=", 2);
        interner.app_function = interner.intern_function("@", 2);

        interner.int_sum = interner.intern_function("$sum", 2);
        interner.int_product = interner.intern_function("$product", 2);
        interner.int_uminus = interner.intern_function("$uminus", 1);
        for f in [interner.int_sum, interner.int_product, interner.int_uminus] {
            interner.functions[f.0 as usize].interpreted = true;
        }
        interner.functions[interner.int_sum.0 as usize].ac = true;

        interner
    }

    // === Sorts ===

    /// Intern a named sort (get-or-create).
    pub fn intern_sort(&mut self, name: &str) -> SortId {
        let key = SortKey::Named(name.to_string());
        if let Some(&id) = self.sort_lookup.get(&key) {
            return SortId(id);
        }
        let id = self.sorts.len() as u32;
        self.sorts.push(key.clone());
        self.sort_lookup.insert(key, id);
        SortId(id)
    }

    /// Intern the function sort `arg > result` (get-or-create).
    pub fn sort_arrow(&mut self, arg: SortId, result: SortId) -> SortId {
        let key = SortKey::Arrow(arg, result);
        if let Some(&id) = self.sort_lookup.get(&key) {
            return SortId(id);
        }
        let id = self.sorts.len() as u32;
        self.sorts.push(key.clone());
        self.sort_lookup.insert(key, id);
        SortId(id)
    }

    /// Decompose an arrow sort into `(argument, result)`.
    pub fn arrow_parts(&self, sort: SortId) -> Option<(SortId, SortId)> {
        match self.sorts[sort.0 as usize] {
            SortKey::Arrow(a, r) => Some((a, r)),
            SortKey::Named(_) => None,
        }
    }

    pub fn is_arrow(&self, sort: SortId) -> bool {
        self.arrow_parts(sort).is_some()
    }

    /// The default individual sort `$i`.
    pub fn individual_sort(&self) -> SortId {
        self.sort_individual
    }

    /// The integer sort `$int`.
    pub fn int_sort(&self) -> SortId {
        self.sort_int
    }

    /// The boolean sort `$o`.
    pub fn bool_sort(&self) -> SortId {
        self.sort_bool
    }

    pub fn sort_name(&self, sort: SortId) -> String {
        match &self.sorts[sort.0 as usize] {
            SortKey::Named(n) => n.clone(),
            SortKey::Arrow(a, r) => {
                format!("({} > {})", self.sort_name(*a), self.sort_name(*r))
            }
        }
    }

    // === Functions ===

    /// Intern a function symbol by name and arity (get-or-create).
    pub fn intern_function(&mut self, name: &str, arity: u8) -> FunctionId {
        let key = (name.to_string(), arity);
        if let Some(&id) = self.function_lookup.get(&key) {
            return FunctionId(id);
        }
        let id = self.functions.len() as u32;
        self.functions.push(FunctionData {
            name: name.to_string(),
            arity,
            color: Color::Transparent,
            interpreted: false,
            ac: false,
        });
        self.function_lookup.insert(key, id);
        FunctionId(id)
    }

    /// Intern an integer numeral as an interpreted constant.
    pub fn intern_integer(&mut self, value: i64) -> FunctionId {
        if let Some(&id) = self.numerals.get(&value) {
            return id;
        }
        let id = self.intern_function(&value.to_string(), 0);
        self.functions[id.0 as usize].interpreted = true;
        self.numerals.insert(value, id);
        id
    }

    pub fn function_name(&self, id: FunctionId) -> &str {
        &self.functions[id.0 as usize].name
    }

    pub fn function_arity(&self, id: FunctionId) -> u8 {
        self.functions[id.0 as usize].arity
    }

    pub fn function_color(&self, id: FunctionId) -> Color {
        self.functions[id.0 as usize].color
    }

    /// Assign an interpolation color to a function symbol. A symbol is
    /// colored at most once; recoloring to a different side is a domain
    /// error.
    pub fn set_function_color(&mut self, id: FunctionId, color: Color) -> Result<()> {
        let data = &mut self.functions[id.0 as usize];
        data.color = data.color.combine(color)?;
        Ok(())
    }

    pub fn is_interpreted(&self, id: FunctionId) -> bool {
        self.functions[id.0 as usize].interpreted
    }

    pub fn is_ac(&self, id: FunctionId) -> bool {
        self.functions[id.0 as usize].ac
    }

    /// The applicative `@` functor of the higher-order fragment.
    pub fn app_function(&self) -> FunctionId {
        self.app_function
    }

    /// The interpreted integer addition `$sum`.
    pub fn int_sum(&self) -> FunctionId {
        self.int_sum
    }

    /// The interpreted integer multiplication `$product`.
    pub fn int_product(&self) -> FunctionId {
        self.int_product
    }

    /// The interpreted integer unary minus `$uminus`.
    pub fn int_uminus(&self) -> FunctionId {
        self.int_uminus
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    // === Predicates ===

    /// Intern a predicate symbol by name and arity (get-or-create).
    pub fn intern_predicate(&mut self, name: &str, arity: u8) -> PredicateId {
        let key = (name.to_string(), arity);
        if let Some(&id) = self.predicate_lookup.get(&key) {
            return PredicateId(id);
        }
        let id = self.predicates.len() as u32;
        self.predicates.push(PredicateData {
            name: name.to_string(),
            arity,
            color: Color::Transparent,
        });
        self.predicate_lookup.insert(key, id);
        PredicateId(id)
    }

    pub fn predicate_name(&self, id: PredicateId) -> &str {
        &self.predicates[id.0 as usize].name
    }

    pub fn predicate_arity(&self, id: PredicateId) -> u8 {
        self.predicates[id.0 as usize].arity
    }

    pub fn predicate_color(&self, id: PredicateId) -> Color {
        self.predicates[id.0 as usize].color
    }

    /// Assign an interpolation color to a predicate symbol.
    pub fn set_predicate_color(&mut self, id: PredicateId, color: Color) -> Result<()> {
        let data = &mut self.predicates[id.0 as usize];
        data.color = data.color.combine(color)?;
        Ok(())
    }

    /// The built-in equality predicate.
    pub fn eq_predicate(&self) -> PredicateId {
        self.eq_predicate
    }

    pub fn is_equality(&self, id: PredicateId) -> bool {
        id == self.eq_predicate
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_interning() {
        let mut interner = Interner::new();

        let f = interner.intern_function("f", 1);
        let g = interner.intern_function("g", 1);
        let f2 = interner.intern_function("f", 1);

        assert_eq!(f, f2);
        assert_ne!(f, g);
        assert_eq!(interner.function_name(f), "f");
        assert_eq!(interner.function_arity(f), 1);
    }

    #[test]
    fn test_arity_is_part_of_the_key() {
        let mut interner = Interner::new();

        let f1 = interner.intern_function("f", 1);
        let f2 = interner.intern_function("f", 2);
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_builtin_arithmetic_is_interpreted() {
        let interner = Interner::new();
        assert!(interner.is_interpreted(interner.int_sum()));
        assert!(interner.is_interpreted(interner.int_product()));
        assert!(interner.is_ac(interner.int_sum()));
        assert!(!interner.is_ac(interner.int_product()));
    }

    #[test]
    fn test_numerals_are_interpreted_constants() {
        let mut interner = Interner::new();
        let one = interner.intern_integer(1);
        let one_again = interner.intern_integer(1);
        assert_eq!(one, one_again);
        assert!(interner.is_interpreted(one));
        assert_eq!(interner.function_arity(one), 0);
        assert_eq!(interner.function_name(one), "1");
    }

    #[test]
    fn test_arrow_sorts() {
        let mut interner = Interner::new();
        let i = interner.individual_sort();
        let a1 = interner.sort_arrow(i, i);
        let a2 = interner.sort_arrow(i, i);
        assert_eq!(a1, a2);
        assert!(interner.is_arrow(a1));
        assert_eq!(interner.arrow_parts(a1), Some((i, i)));
        assert!(!interner.is_arrow(i));
    }

    #[test]
    fn test_color_combination() {
        assert_eq!(
            Color::Transparent.combine(Color::Left).unwrap(),
            Color::Left
        );
        assert_eq!(Color::Left.combine(Color::Left).unwrap(), Color::Left);
        assert!(Color::Left.combine(Color::Right).is_err());
    }

    #[test]
    fn test_symbol_coloring() {
        let mut interner = Interner::new();
        let f = interner.intern_function("f", 1);
        interner.set_function_color(f, Color::Left).unwrap();
        assert_eq!(interner.function_color(f), Color::Left);
        // Recoloring to the same side is idempotent, the other side is refused
        assert!(interner.set_function_color(f, Color::Left).is_ok());
        assert!(interner.set_function_color(f, Color::Right).is_err());
    }
}
