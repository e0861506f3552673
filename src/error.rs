use crate::graph::VertexId;
use good_lp::ResolutionError;
use thiserror::Error;

/// The input graph or prices cannot describe a cable trench problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTopologyError {
    #[error("A graph needs at least two vertices (got {0})")]
    TooFewVertices(u32),

    #[error("The graph has no edges")]
    NoEdges,

    #[error("Edge {edge} references vertex {vertex}, outside 1..={vertex_count}")]
    VertexOutOfRange {
        edge: usize,
        vertex: VertexId,
        vertex_count: u32,
    },

    #[error("Edge {edge} connects vertex {vertex} to itself")]
    SelfLoop { edge: usize, vertex: VertexId },

    #[error("Edge {edge} ({from}, {to}) duplicates an earlier edge")]
    DuplicateEdge {
        edge: usize,
        from: VertexId,
        to: VertexId,
    },

    #[error("Got {costs} {kind} costs for {edges} edges")]
    CostCountMismatch {
        kind: &'static str,
        costs: usize,
        edges: usize,
    },

    #[error("The {kind} cost of edge {edge} must be a finite number greater than zero (got {cost})")]
    NonPositiveCost {
        kind: &'static str,
        edge: usize,
        cost: f64,
    },

    #[error("The {kind} price must be a finite number greater than zero (got {price})")]
    NonPositivePrice { kind: &'static str, price: f64 },
}

/// How the solver failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// No assignment satisfies every constraint
    Infeasible,
    /// The objective can decrease without bound
    Unbounded,
    /// Numerical trouble, a limit being hit, or anything else the engine reports
    Other,
}

impl SolverErrorKind {
    /// A stable numeric code for the failure
    pub fn code(&self) -> i32 {
        match self {
            SolverErrorKind::Infeasible => 1,
            SolverErrorKind::Unbounded => 2,
            SolverErrorKind::Other => 3,
        }
    }
}

/// A failure reported by the solver, passed on unchanged
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Solver error {code} ({kind:?}): {message}", code = .kind.code())]
pub struct SolverError {
    pub kind: SolverErrorKind,
    pub message: String,
}

impl SolverError {
    pub fn new(kind: SolverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

impl From<ResolutionError> for SolverError {
    fn from(err: ResolutionError) -> Self {
        let kind = match err {
            ResolutionError::Infeasible => SolverErrorKind::Infeasible,
            ResolutionError::Unbounded => SolverErrorKind::Unbounded,
            _ => SolverErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

/// Any error raised by this crate
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidTopology(#[from] InvalidTopologyError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Could not parse problem document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
