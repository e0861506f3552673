use crate::graph::VertexId;
use crate::solver::ModelSolution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cable trench problem instance, as read from a YAML document
#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    /// Number of vertices; vertex 1 is the root
    pub vertices: u32,
    pub edges: Vec<(VertexId, VertexId)>,
    #[serde(rename = "trenchCost")]
    pub trench_cost: Vec<f64>,
    /// Defaults to the trench costs
    #[serde(rename = "cableCost")]
    pub cable_cost: Option<Vec<f64>>,
    #[serde(rename = "cablePrice", default = "default_cable_price")]
    pub cable_price: f64,
    #[serde(rename = "trenchPrice", default = "default_trench_price")]
    pub trench_price: f64,
    #[serde(default)]
    pub verbose: bool,
}
fn default_cable_price() -> f64 {
    1.0
}
fn default_trench_price() -> f64 {
    0.5
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    pub trenches: Vec<(VertexId, VertexId)>,
    #[serde(rename = "cableFlows")]
    pub cable_flows: Vec<CableFlow>,
    pub variables: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CableFlow {
    pub from: VertexId,
    pub to: VertexId,
    pub flow: f64,
}

impl From<ModelSolution> for Solution {
    fn from(solution: ModelSolution) -> Self {
        let trenches = solution
            .trenches()
            .into_iter()
            .map(|edge| (edge.from, edge.to))
            .collect();
        let cable_flows = solution
            .iter_cable_flows()
            .map(|(from, to, flow)| CableFlow { from, to, flow })
            .collect();

        Self {
            objective: solution.objective_value,
            trenches,
            cable_flows,
            variables: solution.variable_values,
        }
    }
}
