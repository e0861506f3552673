use crate::error::SolverError;
use crate::graph::{Edge, VertexId};
use crate::model::{Assignment, CableTrenchModel, VariableKind, to_expression};
use good_lp::Solution as LpSolution;
use good_lp::SolverModel;
use good_lp::solvers::coin_cbc::coin_cbc;
use log::{info, trace, warn};
use std::collections::BTreeMap;

/// Flows at or below this are treated as zero
const FLOW_TOLERANCE: f64 = 1e-6;

/// Something that can solve a [`CableTrenchModel`] to optimality.
///
/// Infeasible, unbounded and otherwise failed solves are reported as distinct
/// [`SolverError`] kinds.
pub trait Solver {
    fn solve(&self, model: CableTrenchModel) -> Result<ModelSolution, SolverError>;
}

/// Solve with the COIN-OR CBC branch-and-cut solver
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinCbc {
    /// Show the solver's own console output
    pub verbose: bool,
}

impl CoinCbc {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Solver for CoinCbc {
    fn solve(&self, mut model: CableTrenchModel) -> Result<ModelSolution, SolverError> {
        let variables = model.take_problem_variables();
        let objective = to_expression(model.objective());

        let mut problem = variables.minimise(objective).using(coin_cbc);
        if !self.verbose {
            problem.set_parameter("loglevel", "0");
        }
        let problem = model
            .constraints()
            .iter()
            .fold(problem, |p, constraint| {
                trace!(
                    "Adding constraint {}: {} terms {} {}",
                    constraint.label,
                    constraint.terms.len(),
                    constraint.comparison,
                    constraint.rhs
                );
                p.with(constraint.to_constraint())
            });

        let solution = problem.solve().map_err(|err| {
            let err = SolverError::from(err);
            warn!("Could not solve cable trench model: {err}");
            err
        })?;

        let values: Assignment = model
            .variables()
            .iter()
            .map(|v| (v.variable, solution.value(v.variable)))
            .collect();
        let solution = ModelSolution::from_assignment(&model, &values);
        info!("Solved cable trench model: objective {}", solution.objective_value);

        Ok(solution)
    }
}

/// The value of every declared variable, and the optimal objective
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSolution {
    pub variable_values: BTreeMap<String, f64>,
    pub objective_value: f64,
    cable_flows: BTreeMap<(VertexId, VertexId), f64>,
    trench_uses: BTreeMap<Edge, f64>,
}

impl ModelSolution {
    /// Read a solution from values assigned to the model's variables.
    ///
    /// Variables missing from `values` are taken to be zero.
    pub fn from_assignment(model: &CableTrenchModel, values: &Assignment) -> Self {
        let mut variable_values = BTreeMap::new();
        let mut cable_flows = BTreeMap::new();
        let mut trench_uses = BTreeMap::new();
        for var in model.variables() {
            let value = values.get(&var.variable).copied().unwrap_or(0.0);
            variable_values.insert(var.name.clone(), value);
            match var.kind {
                VariableKind::CableFlow { from, to } => {
                    cable_flows.insert((from, to), value);
                }
                VariableKind::TrenchUse(edge) => {
                    trench_uses.insert(edge, value);
                }
            }
        }

        Self {
            variable_values,
            objective_value: model.objective_value(values),
            cable_flows,
            trench_uses,
        }
    }

    /// The cable flow along the arc `from -> to`, if that arc exists
    pub fn cable_flow(&self, from: VertexId, to: VertexId) -> Option<f64> {
        self.cable_flows.get(&(from, to)).copied()
    }

    /// Iterate over the arcs carrying cable, with their flows
    pub fn iter_cable_flows(&self) -> impl Iterator<Item = (VertexId, VertexId, f64)> {
        self.cable_flows
            .iter()
            .filter(|(_, flow)| **flow > FLOW_TOLERANCE)
            .map(|(&(from, to), &flow)| (from, to, flow))
    }

    /// Whether a trench is dug between `a` and `b`, if they share an edge
    pub fn trench_used(&self, a: VertexId, b: VertexId) -> Option<bool> {
        self.trench_uses
            .get(&Edge::new(a, b))
            .or_else(|| self.trench_uses.get(&Edge::new(b, a)))
            .map(|&value| value.round() >= 1.0)
    }

    /// The edges with a trench, sorted by vertex pair
    pub fn trenches(&self) -> Vec<Edge> {
        self.trench_uses
            .iter()
            .filter(|(_, value)| value.round() >= 1.0)
            .map(|(&edge, _)| edge)
            .collect()
    }
}
