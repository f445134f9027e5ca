//! Interpolant reconstruction.
//!
//! Given a slicing set, evaluates the canonical trace assignment it
//! induces on the proof DAG (sliced transparent units inherit the colored
//! trace of their parents, everything else stays grey), computes the
//! boundary and fringe flags by the same definitions the minimization
//! encoding uses, and assembles the digest formulas: red-boundary units
//! contribute their formula, blue-boundary units the negation.

use crate::config::Budget;
use crate::error::{ProofloomError, Result};
use crate::fol::{Color, Formula, TermStore};
use crate::proof::{UnitId, UnitStore};
use indexmap::{IndexMap, IndexSet};

use super::traverse::{traverse_proof, UnitInfo};

/// Trace color a unit takes in the sliced proof. `Sliced` is final and
/// reachable only from `Grey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Trace {
    #[default]
    Grey,
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    trace: Trace,
    sliced: bool,
    red_boundary: bool,
    blue_boundary: bool,
    red_fringe: bool,
    blue_fringe: bool,
}

/// Generator of the interpolant for a fixed slicing set.
#[derive(Debug, Clone, Default)]
pub struct Interpolants {
    sliced_off: IndexSet<UnitId>,
}

impl Interpolants {
    pub fn new(sliced_off: IndexSet<UnitId>) -> Self {
        Interpolants { sliced_off }
    }

    /// The interpolant of `refutation` with the sliced units collapsed
    /// through their children.
    pub fn interpolant(
        &self,
        store: &TermStore,
        units: &UnitStore,
        refutation: UnitId,
        budget: &Budget,
    ) -> Result<Formula> {
        let infos = traverse_proof(store, units, refutation, budget)?;

        // The refutation itself is never sliced.
        if self.sliced_off.contains(&refutation) {
            return Err(ProofloomError::Domain(
                "the refutation may not be sliced".to_string(),
            ));
        }

        let mut flags: IndexMap<UnitId, Flags> = IndexMap::new();

        // Traces and boundaries, parents before children.
        let mut ascending: Vec<UnitId> = infos.keys().copied().collect();
        ascending.sort_unstable();
        for &unit in &ascending {
            budget.check()?;
            let info = &infos[&unit];
            let mut f = Flags::default();
            if info.color != Color::Transparent || !info.leads_to_color {
                f.trace = match info.color {
                    Color::Left => Trace::Red,
                    Color::Right => Trace::Blue,
                    Color::Transparent => Trace::Grey,
                };
                flags.insert(unit, f);
                continue;
            }

            let (red_parent, blue_parent) = self.parent_influence(units, &infos, &flags, unit);
            f.sliced = self.sliced_off.contains(&unit);
            if f.sliced {
                f.trace = match (red_parent, blue_parent) {
                    (true, true) => {
                        return Err(ProofloomError::Domain(format!(
                            "unit {} has both red and blue influence",
                            units.number(unit)
                        )))
                    }
                    (true, false) => Trace::Red,
                    (false, true) => Trace::Blue,
                    (false, false) => Trace::Grey,
                };
            }
            f.red_boundary = !f.sliced && red_parent;
            f.blue_boundary = !f.sliced && blue_parent;
            flags.insert(unit, f);
        }

        // Fringes, children before parents (successors are later-numbered).
        for &unit in ascending.iter().rev() {
            budget.check()?;
            let info = &infos[&unit];
            if info.color != Color::Transparent || !info.leads_to_color {
                continue;
            }
            let (rf, bf) = if info.is_refutation {
                (false, true)
            } else {
                (
                    self.fringe(&flags, info, false),
                    self.fringe(&flags, info, true),
                )
            };
            let f = flags.get_mut(&unit).expect("flags computed");
            f.red_fringe = rf;
            f.blue_fringe = bf;
        }

        // The digest, in proof order.
        let mut parts = Vec::new();
        for &unit in &ascending {
            let info = &infos[&unit];
            if info.color != Color::Transparent || !info.leads_to_color {
                continue;
            }
            let f = flags[&unit];
            let is_leaf_with_inherited_color =
                info.input_inherited_color != Color::Transparent;
            let (in_red_digest, in_blue_digest) = if is_leaf_with_inherited_color {
                (
                    info.input_inherited_color == Color::Left,
                    info.input_inherited_color == Color::Right,
                )
            } else {
                (
                    f.red_boundary && !f.red_fringe,
                    f.blue_boundary && !f.blue_fringe,
                )
            };

            if in_red_digest {
                parts.push(units.get(unit).formula_of(store));
            } else if in_blue_digest {
                parts.push(units.get(unit).formula_of(store).negated());
            }
        }

        Ok(Formula::conjunction(parts))
    }

    /// Whether any premise carries red (resp. blue) influence: a colored
    /// parent of that side, or a parent whose trace took that color.
    fn parent_influence(
        &self,
        units: &UnitStore,
        infos: &IndexMap<UnitId, UnitInfo>,
        flags: &IndexMap<UnitId, Flags>,
        unit: UnitId,
    ) -> (bool, bool) {
        let mut red = false;
        let mut blue = false;
        for parent in units.parents_of(unit) {
            let info = &infos[&parent];
            if !info.leads_to_color {
                continue;
            }
            match flags[&parent].trace {
                Trace::Red => red = true,
                Trace::Blue => blue = true,
                Trace::Grey => {}
            }
        }
        (red, blue)
    }

    /// Fringe propagation over the transparent successors; a successor of
    /// the opposite color kills the fringe.
    fn fringe(&self, flags: &IndexMap<UnitId, Flags>, info: &UnitInfo, blue: bool) -> bool {
        let opposite_successors = if blue {
            &info.left_successors
        } else {
            &info.right_successors
        };
        if !opposite_successors.is_empty() {
            return false;
        }
        info.transparent_successors.iter().all(|succ| {
            let f = flags[succ];
            if blue {
                (f.blue_fringe || f.blue_boundary) && !f.red_boundary
            } else {
                (f.red_fringe || f.red_boundary) && !f.blue_boundary
            }
        })
    }
}
