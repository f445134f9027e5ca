//! Proof-DAG traversal for interpolation.
//!
//! Collects, for every unit reachable from the refutation, the
//! interpolation attributes the minimizer and the interpolant generator
//! share: colors, `leadsToColor`, successor lists keyed by the
//! successor's color, and the parent-color flags.

use crate::config::Budget;
use crate::error::{ProofloomError, Result};
use crate::fol::{Color, TermStore};
use crate::proof::{UnitId, UnitStore};
use indexmap::IndexMap;

/// Which colored side a unit has received a parent from. The pair of
/// flags is monotone: once a side is recorded it is never reset, and
/// receiving both sides is an invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentColorState {
    #[default]
    NoColoredParent,
    HasLeftParent,
    HasRightParent,
}

/// Interpolation attributes of one proof-DAG unit.
#[derive(Debug, Clone, Default)]
pub struct UnitInfo {
    pub color: Color,
    /// Color the unit inherited from its input declaration (relevant for
    /// leaves whose content is transparent but which belong to one side)
    pub input_inherited_color: Color,
    pub is_refutation: bool,
    /// True iff the unit or one of its ancestors carries a color
    pub leads_to_color: bool,
    pub state: ParentColorState,
    pub is_parent_of_left: bool,
    pub is_parent_of_right: bool,
    pub left_successors: Vec<UnitId>,
    pub right_successors: Vec<UnitId>,
    pub transparent_successors: Vec<UnitId>,
}

struct StackEntry {
    unit: UnitId,
    next_parent: usize,
}

/// Depth-first traversal from the refutation, recording a [`UnitInfo`]
/// per visited unit. Iterative so deep proofs cannot overflow the stack;
/// the budget is checked once per step.
pub fn traverse_proof(
    store: &TermStore,
    units: &UnitStore,
    refutation: UnitId,
    budget: &Budget,
) -> Result<IndexMap<UnitId, UnitInfo>> {
    let mut infos: IndexMap<UnitId, UnitInfo> = IndexMap::new();
    let mut stack = Vec::new();

    enter(store, units, refutation, &mut infos)?;
    infos[&refutation].is_refutation = true;
    stack.push(StackEntry {
        unit: refutation,
        next_parent: 0,
    });

    while let Some(top) = stack.last_mut() {
        budget.check()?;
        let unit = top.unit;
        let parent = units.parents_of(unit).nth(top.next_parent);
        match parent {
            Some(parent) => {
                top.next_parent += 1;
                if infos.contains_key(&parent) {
                    process_parent(units, &mut infos, unit, parent)?;
                } else {
                    enter(store, units, parent, &mut infos)?;
                    stack.push(StackEntry {
                        unit: parent,
                        next_parent: 0,
                    });
                }
            }
            None => {
                let finished = stack.pop().expect("stack entry present").unit;
                if let Some(below) = stack.last() {
                    process_parent(units, &mut infos, below.unit, finished)?;
                }
            }
        }
    }

    Ok(infos)
}

/// Create the info record for a newly visited unit.
fn enter(
    store: &TermStore,
    units: &UnitStore,
    unit: UnitId,
    infos: &mut IndexMap<UnitId, UnitInfo>,
) -> Result<()> {
    let record = units.get(unit);
    let color = record.color(store)?;
    let is_leaf = record.inference().parents.is_empty();
    let input_inherited_color = if record.inherited_color() != Color::Transparent {
        record.inherited_color()
    } else if is_leaf {
        color
    } else {
        Color::Transparent
    };

    let mut info = UnitInfo {
        color,
        input_inherited_color,
        ..UnitInfo::default()
    };
    info.leads_to_color =
        color != Color::Transparent || input_inherited_color != Color::Transparent;
    let previous = infos.insert(unit, info);
    debug_assert!(previous.is_none(), "unit visited twice");
    Ok(())
}

/// Record the relation between `unit` and its premise `parent` (both
/// already visited).
fn process_parent(
    units: &UnitStore,
    infos: &mut IndexMap<UnitId, UnitInfo>,
    unit: UnitId,
    parent: UnitId,
) -> Result<()> {
    let parent_info = &infos[&parent];
    let parent_color = parent_info.color;
    let parent_leads = parent_info.leads_to_color;

    let info = infos.get_mut(&unit).expect("unit visited");
    match parent_color {
        Color::Left => {
            if info.state == ParentColorState::HasRightParent {
                return Err(ProofloomError::Domain(format!(
                    "unit {} has both a left and a right parent",
                    units.number(unit)
                )));
            }
            info.state = ParentColorState::HasLeftParent;
        }
        Color::Right => {
            if info.state == ParentColorState::HasLeftParent {
                return Err(ProofloomError::Domain(format!(
                    "unit {} has both a left and a right parent",
                    units.number(unit)
                )));
            }
            info.state = ParentColorState::HasRightParent;
        }
        Color::Transparent => {}
    }
    info.leads_to_color |= parent_leads;
    let unit_color = info.color;

    let parent_info = infos.get_mut(&parent).expect("parent visited");
    match unit_color {
        Color::Left => {
            parent_info.is_parent_of_left = true;
            parent_info.left_successors.push(unit);
        }
        Color::Right => {
            parent_info.is_parent_of_right = true;
            parent_info.right_successors.push(unit);
        }
        Color::Transparent => parent_info.transparent_successors.push(unit),
    }
    Ok(())
}
