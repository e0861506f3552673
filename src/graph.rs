use crate::error::InvalidTopologyError;
use log::debug;
use std::collections::BTreeSet;

/// A vertex of the graph. Vertices are numbered `1..=V`.
pub type VertexId = u32;

/// The vertex every cable starts from
pub const ROOT: VertexId = 1;

/// An undirected edge, stored with a fixed orientation `from -> to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
}

impl Edge {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    /// Whether the edge touches the given vertex
    pub fn is_incident_to(&self, vertex: VertexId) -> bool {
        self.from == vertex || self.to == vertex
    }

    /// The edge as an unordered pair, smallest vertex first
    fn unordered(&self) -> (VertexId, VertexId) {
        (self.from.min(self.to), self.from.max(self.to))
    }
}

/// Whether cable may also flow `to -> from` along this edge.
///
/// The root has no predecessor, so edges leaving the root only carry cable away from it.
pub fn has_reverse_arc(edge: &Edge) -> bool {
    edge.from != ROOT
}

/// A validated, immutable graph with per-edge trench and cable costs.
///
/// The `i`th entry of `trench_costs` and `cable_costs` belongs to the `i`th edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    vertex_count: u32,
    edges: Vec<Edge>,
    trench_costs: Vec<f64>,
    cable_costs: Vec<f64>,
}

impl Graph {
    /// Create a new graph, checking the topology and costs.
    ///
    /// Edges incident to the root are re-oriented to point away from it.
    pub fn new(
        vertex_count: u32,
        edges: Vec<Edge>,
        trench_costs: Vec<f64>,
        cable_costs: Vec<f64>,
    ) -> Result<Self, InvalidTopologyError> {
        if vertex_count < 2 {
            return Err(InvalidTopologyError::TooFewVertices(vertex_count));
        }
        if edges.is_empty() {
            return Err(InvalidTopologyError::NoEdges);
        }
        check_cost_count("trench", &trench_costs, edges.len())?;
        check_cost_count("cable", &cable_costs, edges.len())?;

        let mut seen = BTreeSet::new();
        let mut oriented = Vec::with_capacity(edges.len());
        for (index, edge) in edges.into_iter().enumerate() {
            for vertex in [edge.from, edge.to] {
                if !(1..=vertex_count).contains(&vertex) {
                    return Err(InvalidTopologyError::VertexOutOfRange {
                        edge: index,
                        vertex,
                        vertex_count,
                    });
                }
            }
            if edge.from == edge.to {
                return Err(InvalidTopologyError::SelfLoop {
                    edge: index,
                    vertex: edge.from,
                });
            }
            if !seen.insert(edge.unordered()) {
                return Err(InvalidTopologyError::DuplicateEdge {
                    edge: index,
                    from: edge.from,
                    to: edge.to,
                });
            }

            if edge.to == ROOT {
                debug!("Reorienting edge {index} ({}, {}) away from the root", edge.from, edge.to);
                oriented.push(Edge::new(ROOT, edge.from));
            } else {
                oriented.push(edge);
            }
        }

        check_costs_positive("trench", &trench_costs)?;
        check_costs_positive("cable", &cable_costs)?;

        Ok(Self {
            vertex_count,
            edges: oriented,
            trench_costs,
            cable_costs,
        })
    }

    /// Create a graph where laying cable along an edge costs the same as digging its trench
    pub fn with_uniform_costs(
        vertex_count: u32,
        edges: Vec<Edge>,
        costs: Vec<f64>,
    ) -> Result<Self, InvalidTopologyError> {
        Self::new(vertex_count, edges, costs.clone(), costs)
    }

    /// The number of vertices, `V`
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Iterate over all vertices, root first
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        1..=self.vertex_count
    }

    /// Iterate over every vertex except the root
    pub fn non_root_vertices(&self) -> impl Iterator<Item = VertexId> {
        (ROOT + 1)..=self.vertex_count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn trench_costs(&self) -> &[f64] {
        &self.trench_costs
    }

    pub fn cable_costs(&self) -> &[f64] {
        &self.cable_costs
    }

    /// Iterate over `(position, edge, trench cost, cable cost)` for every edge
    pub fn iter_edges(&self) -> impl Iterator<Item = (usize, &Edge, f64, f64)> {
        self.edges
            .iter()
            .zip(self.trench_costs.iter().zip(&self.cable_costs))
            .enumerate()
            .map(|(index, (edge, (&trench, &cable)))| (index, edge, trench, cable))
    }

    /// The number of edges touching the root
    pub fn root_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_incident_to(ROOT)).count()
    }

    /// The upper bound on the cable flow along any arc: a unit for every non-root vertex
    pub fn max_flow(&self) -> f64 {
        (self.vertex_count - 1) as f64
    }
}

fn check_cost_count(
    kind: &'static str,
    costs: &[f64],
    edge_count: usize,
) -> Result<(), InvalidTopologyError> {
    if costs.len() != edge_count {
        return Err(InvalidTopologyError::CostCountMismatch {
            kind,
            costs: costs.len(),
            edges: edge_count,
        });
    }
    Ok(())
}

fn check_costs_positive(kind: &'static str, costs: &[f64]) -> Result<(), InvalidTopologyError> {
    match costs
        .iter()
        .position(|&cost| !(cost.is_finite() && cost > 0.0))
    {
        Some(edge) => Err(InvalidTopologyError::NonPositiveCost {
            kind,
            edge,
            cost: costs[edge],
        }),
        None => Ok(()),
    }
}
