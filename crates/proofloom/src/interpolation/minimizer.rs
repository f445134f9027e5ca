//! Interpolant minimization.
//!
//! Encodes the choice of which transparent proof nodes to slice as a
//! weighted boolean problem over per-unit trace predicates, hands it to
//! the external SMT minimizer, and reconstructs the interpolant from the
//! model. A solver failure falls back to the un-minimized interpolant.

use crate::config::{Budget, OptimizationTarget};
use crate::error::{ProofloomError, Result};
use crate::fol::{Color, Formula, Interner, TermStore};
use crate::proof::{UnitId, UnitPayload, UnitStore};
use crate::smt::{
    MinimizationResult, SmtBenchmark, SmtConstant, SmtFormula, SmtMinimizer,
};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};

use super::interpolants::Interpolants;
use super::splitter::ClauseSplitter;
use super::traverse::{traverse_proof, UnitInfo};

/// Trace predicate families of the encoding, named after their constant
/// prefixes on the SMT wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pred {
    /// Red trace color
    R,
    /// Blue trace color
    B,
    /// Grey trace color
    G,
    /// Unit is sliced from the digest
    S,
    /// Red color boundary
    Rc,
    /// Blue color boundary
    Bc,
    /// Red fringe
    Rf,
    /// Blue fringe
    Bf,
    /// Unit appears in the digest
    D,
    /// Component appears in the digest
    V,
}

impl Pred {
    fn prefix(self) -> &'static str {
        match self {
            Pred::R => "r",
            Pred::B => "b",
            Pred::G => "g",
            Pred::S => "s",
            Pred::Rc => "rc",
            Pred::Bc => "bc",
            Pred::Rf => "rf",
            Pred::Bf => "bf",
            Pred::D => "d",
            Pred::V => "v",
        }
    }
}

#[derive(Debug, Default)]
struct ParentSummary {
    red: Vec<String>,
    blue: Vec<String>,
    grey: Vec<String>,
}

/// Builder of the minimization problem for one refutation.
pub struct InterpolantMinimizer {
    target: OptimizationTarget,
    no_slicing: bool,
    show_stats: bool,
    infos: IndexMap<UnitId, UnitInfo>,
    benchmark: SmtBenchmark,
    splitter: ClauseSplitter,
    last_sliced: usize,
}

impl InterpolantMinimizer {
    pub fn new(target: OptimizationTarget, no_slicing: bool, show_stats: bool) -> Self {
        InterpolantMinimizer {
            target,
            no_slicing,
            show_stats,
            infos: IndexMap::new(),
            benchmark: SmtBenchmark::new(),
            splitter: ClauseSplitter::new(),
            last_sliced: 0,
        }
    }

    /// Produce the minimized interpolant of `refutation`.
    pub fn interpolant(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        units: &UnitStore,
        refutation: UnitId,
        minimizer: &mut dyn SmtMinimizer,
        budget: &Budget,
    ) -> Result<Formula> {
        self.infos = traverse_proof(store, units, refutation, budget)?;
        self.add_all_formulas(store, interner, units, budget)?;

        let cost = self.cost_constant();
        let (result, model) = minimizer.minimize(&self.benchmark, &cost);

        let mut sliced_off: IndexSet<UnitId> = IndexSet::new();
        match result {
            MinimizationResult::Fail => {
                warn!("minimization failed to find a satisfiable assignment, generating basic interpolant");
            }
            MinimizationResult::Approximate => {
                info!("minimization gave an approximate result");
                self.collect_sliced_off(&model, &mut sliced_off);
            }
            MinimizationResult::Optimal => {
                self.collect_sliced_off(&model, &mut sliced_off);
            }
        }

        if self.show_stats {
            info!(
                "interpolant cost: {}",
                model.get(cost.name()).unwrap_or("unknown")
            );
        }
        debug!("sliced off {} proof nodes", sliced_off.len());
        self.last_sliced = sliced_off.len();

        Interpolants::new(sliced_off).interpolant(store, units, refutation, budget)
    }

    /// How many proof nodes the last run sliced off.
    pub fn sliced_off_count(&self) -> usize {
        self.last_sliced
    }

    /// Units sliced off in the model: transparent, on a path to color,
    /// with their slice predicate assigned true.
    pub fn collect_sliced_off(
        &self,
        model: &crate::smt::SmtModel,
        acc: &mut IndexSet<UnitId>,
    ) {
        for (&unit, info) in &self.infos {
            if info.color != Color::Transparent || !info.leads_to_color {
                continue;
            }
            let name = SmtConstant::new(Pred::S.prefix(), &unit.to_string());
            if model.get(name.name()) == Some("true") {
                acc.insert(unit);
            }
        }
    }

    fn pred(&mut self, kind: Pred, node: &str) -> SmtConstant {
        let constant = SmtConstant::new(kind.prefix(), node);
        self.benchmark.declare_propositional_constant(&constant);
        constant
    }

    fn pred_formula(&mut self, kind: Pred, node: &str) -> SmtFormula {
        let constant = self.pred(kind, node);
        SmtFormula::Const(constant)
    }

    fn cost_constant(&mut self) -> SmtConstant {
        let constant = SmtConstant("cost".to_string());
        self.benchmark.declare_real_constant(&constant);
        constant
    }

    /// Add the formulas of every transparent unit on a path to color,
    /// then the cost definition.
    fn add_all_formulas(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        units: &UnitStore,
        budget: &Budget,
    ) -> Result<()> {
        let encoded: Vec<UnitId> = self
            .infos
            .iter()
            .filter(|(_, info)| info.color == Color::Transparent && info.leads_to_color)
            .map(|(&unit, _)| unit)
            .collect();
        for unit in encoded {
            budget.check()?;
            self.add_node_formulas(store, interner, units, unit)?;
        }
        self.add_cost_formula();
        Ok(())
    }

    /// Formulas relating one unit to its parents, its fringe and its
    /// atomic components.
    fn add_node_formulas(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        units: &UnitStore,
        unit: UnitId,
    ) -> Result<()> {
        let mut psum = ParentSummary::default();
        for parent in units.parents_of(unit) {
            let info = &self.infos[&parent];
            if !info.leads_to_color {
                continue;
            }
            let id = units.unit_id_string(parent);
            match info.color {
                Color::Left => psum.red.push(id),
                Color::Right => psum.blue.push(id),
                Color::Transparent => psum.grey.push(id),
            }
        }

        let info = self.infos[&unit].clone();
        debug_assert_eq!(info.color, Color::Transparent);
        let uid = units.unit_id_string(unit);

        if info.input_inherited_color != Color::Transparent {
            // A unit with an inherited color is an input and has no
            // parents to relate it to.
            if !(psum.red.is_empty() && psum.blue.is_empty() && psum.grey.is_empty()) {
                return Err(ProofloomError::Domain(format!(
                    "unit {} inherits a color but has parents",
                    uid
                )));
            }
            self.add_leaf_node_properties(&uid);
        } else {
            self.add_node_properties(&uid, &psum)?;
            self.add_fringe_formulas(units, unit)?;
        }

        if self.no_slicing || info.is_refutation {
            let comment = if info.is_refutation { "refutation" } else { "no_slicing" };
            let s = self.pred_formula(Pred::S, &uid);
            self.benchmark.add_formula_with_comment(s.negated(), comment);
        }

        // A parent of a colored unit may not take the opposite color in
        // the trace.
        if info.is_parent_of_left {
            let b = self.pred_formula(Pred::B, &uid);
            self.benchmark
                .add_formula_with_comment(b.negated(), "parent_of_left");
        }
        if info.is_parent_of_right {
            let r = self.pred_formula(Pred::R, &uid);
            self.benchmark
                .add_formula_with_comment(r.negated(), "parent_of_right");
        }

        self.add_atom_implication_formula(store, interner, units, unit, &uid)
    }

    /// Exactly one trace color per unit.
    fn add_distinct_colors_formula(&mut self, node: &str) {
        let r = self.pred_formula(Pred::R, node);
        let b = self.pred_formula(Pred::B, node);
        let g = self.pred_formula(Pred::G, node);

        let mut res = b.clone().or(r.clone()).or(g.clone());
        res = res.and(r.clone().implies(b.clone().negated().and(g.clone().negated())));
        res = res.and(b.clone().implies(r.clone().negated().and(g.clone().negated())));
        res = res.and(g.implies(r.negated().and(b.negated())));
        self.benchmark.add_formula(res);
    }

    fn add_node_properties(&mut self, node: &str, psum: &ParentSummary) -> Result<()> {
        self.add_distinct_colors_formula(node);
        if psum.red.is_empty() && psum.blue.is_empty() {
            self.add_grey_parent_properties(node, psum);
            Ok(())
        } else {
            self.add_colored_parent_properties(node, psum)
        }
    }

    /// Properties of a node all of whose parents are grey.
    fn add_grey_parent_properties(&mut self, node: &str, psum: &ParentSummary) {
        let mut r_par_disj = SmtFormula::False;
        let mut b_par_disj = SmtFormula::False;
        let mut g_par_conj = SmtFormula::True;
        for parent in &psum.grey {
            r_par_disj = r_par_disj.or(self.pred_formula(Pred::R, parent));
            b_par_disj = b_par_disj.or(self.pred_formula(Pred::B, parent));
            g_par_conj = g_par_conj.and(self.pred_formula(Pred::G, parent));
        }

        let r = self.pred_formula(Pred::R, node);
        let b = self.pred_formula(Pred::B, node);
        let g = self.pred_formula(Pred::G, node);
        let s = self.pred_formula(Pred::S, node);
        let rc = self.pred_formula(Pred::Rc, node);
        let bc = self.pred_formula(Pred::Bc, node);

        self.benchmark
            .add_formula(rc.iff(s.clone().negated().and(r_par_disj.clone())));
        self.benchmark
            .add_formula(bc.iff(s.clone().negated().and(b_par_disj.clone())));
        self.benchmark
            .add_formula(r_par_disj.clone().implies(b_par_disj.clone().negated()));
        self.benchmark
            .add_formula(b_par_disj.clone().implies(r_par_disj.clone().negated()));
        self.benchmark
            .add_formula(s.clone().and(r_par_disj).implies(r));
        self.benchmark
            .add_formula(s.clone().and(b_par_disj).implies(b));
        self.benchmark
            .add_formula(s.clone().and(g_par_conj).implies(g.clone()));
        self.benchmark.add_formula(s.negated().implies(g));
    }

    /// Properties of a node with parents of exactly one color.
    fn add_colored_parent_properties(&mut self, node: &str, psum: &ParentSummary) -> Result<()> {
        if psum.red.is_empty() == psum.blue.is_empty() {
            return Err(ProofloomError::Domain(format!(
                "unit {} has colored parents of both sides",
                node
            )));
        }
        let red_side = !psum.red.is_empty();
        let (parent_pred, opposite_pred) = if red_side {
            (Pred::R, Pred::B)
        } else {
            (Pred::B, Pred::R)
        };

        let mut g_par_neg_conj = SmtFormula::True;
        for parent in &psum.grey {
            g_par_neg_conj = g_par_neg_conj.and(self.pred_formula(opposite_pred, parent).negated());
        }

        let par = self.pred_formula(parent_pred, node);
        let g = self.pred_formula(Pred::G, node);
        let s = self.pred_formula(Pred::S, node);
        let rc = self.pred_formula(Pred::Rc, node);
        let bc = self.pred_formula(Pred::Bc, node);

        if red_side {
            self.benchmark.add_formula(rc.iff(s.clone().negated()));
            self.benchmark.add_formula(bc.negated());
        } else {
            self.benchmark.add_formula(bc.iff(s.clone().negated()));
            self.benchmark.add_formula(rc.negated());
        }
        self.benchmark.add_formula(g_par_neg_conj);
        self.benchmark.add_formula(s.clone().implies(par));
        self.benchmark.add_formula(s.negated().implies(g));
        Ok(())
    }

    /// A leaf marked as colored in the input but without colored symbols:
    /// never sliced, grey, always in the digest.
    fn add_leaf_node_properties(&mut self, node: &str) {
        let s = self.pred_formula(Pred::S, node);
        let g = self.pred_formula(Pred::G, node);
        let d = self.pred_formula(Pred::D, node);
        self.benchmark.add_formula(s.negated());
        self.benchmark.add_formula(g);
        self.benchmark.add_formula(d);
    }

    /// Digest and fringe propagation over the transparent successors.
    fn add_fringe_formulas(&mut self, units: &UnitStore, unit: UnitId) -> Result<()> {
        let uid = units.unit_id_string(unit);
        let info = self.infos[&unit].clone();

        let rc = self.pred_formula(Pred::Rc, &uid);
        let bc = self.pred_formula(Pred::Bc, &uid);
        let rf = self.pred_formula(Pred::Rf, &uid);
        let bf = self.pred_formula(Pred::Bf, &uid);
        let d = self.pred_formula(Pred::D, &uid);

        self.benchmark.add_formula(d.iff(
            rc.clone()
                .and(rf.clone().negated())
                .or(bc.clone().and(bf.clone().negated())),
        ));

        if info.is_refutation {
            self.benchmark.add_formula(rf.negated());
            self.benchmark.add_formula(bf);
            return Ok(());
        }

        let mut rf_rhs = SmtFormula::True;
        let mut bf_rhs = SmtFormula::True;
        for &succ in &info.transparent_successors {
            let sid = units.unit_id_string(succ);
            let rc_s = self.pred_formula(Pred::Rc, &sid);
            let bc_s = self.pred_formula(Pred::Bc, &sid);
            let rf_s = self.pred_formula(Pred::Rf, &sid);
            let bf_s = self.pred_formula(Pred::Bf, &sid);

            rf_rhs = rf_rhs.and(rf_s.or(rc_s.clone())).and(bc_s.clone().negated());
            bf_rhs = bf_rhs.and(bf_s.or(bc_s)).and(rc_s.negated());
        }

        if !info.right_successors.is_empty() {
            self.benchmark.add_formula(rf.negated());
        } else {
            self.benchmark.add_formula(rf.iff(rf_rhs));
        }
        if !info.left_successors.is_empty() {
            self.benchmark.add_formula(bf.negated());
        } else {
            self.benchmark.add_formula(bf.iff(bf_rhs));
        }
        Ok(())
    }

    /// If the unit is in the digest, all of its components are.
    fn add_atom_implication_formula(
        &mut self,
        store: &mut TermStore,
        interner: &Interner,
        units: &UnitStore,
        unit: UnitId,
        uid: &str,
    ) -> Result<()> {
        let atoms = match units.get(unit).payload() {
            UnitPayload::Clause(clause) => {
                self.splitter.clause_components(store, interner, clause)?
            }
            UnitPayload::Formula(formula) => {
                vec![self.splitter.formula_component(store, interner, formula)]
            }
        };

        let mut conj = SmtFormula::True;
        for atom in &atoms {
            conj = conj.and(self.pred_formula(Pred::V, atom));
        }
        let d = self.pred_formula(Pred::D, uid);
        let comment = format!("atom implications for unit {}", uid);
        self.benchmark
            .add_formula_with_comment(d.implies(conj), &comment);
        Ok(())
    }

    /// `cost = Σ_c V(c) · weight(c)` for the configured target.
    fn add_cost_formula(&mut self) {
        let mut cost_sum = SmtFormula::Number(0);
        let components: Vec<(String, u32)> = self
            .splitter
            .all_components()
            .map(|(id, info)| {
                let weight = match self.target {
                    OptimizationTarget::Weight => info.weight,
                    OptimizationTarget::Count => u32::from(info.weight > 0),
                    OptimizationTarget::Quantifiers => info.var_count,
                };
                (id.clone(), weight)
            })
            .collect();
        for (id, weight) in components {
            let v = self.pred(Pred::V, &id);
            cost_sum = cost_sum.add(SmtFormula::CondNumber(v, weight));
        }
        let cost = self.cost_constant();
        self.benchmark
            .add_formula(SmtFormula::Const(cost).equals(cost_sum));
    }

    /// The assembled benchmark (for inspection and tests).
    pub fn benchmark(&self) -> &SmtBenchmark {
        &self.benchmark
    }
}
