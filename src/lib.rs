//! Formulate the Generalized Cable Trench Problem as a mixed-integer linear program and solve it.
//!
//! Given a graph whose vertex 1 is the root, the problem designs two networks at once: a cable
//! network (a spanning arborescence carrying one unit of cable from the root to every other
//! vertex) and a trench network (a spanning tree of dug edges). Cable may only be laid where a
//! trench is dug. The objective is the priced sum of cable and trench costs.
//!
//! ```no_run
//! use cable_trench::{CoinCbc, Edge, Graph, Prices, Solver, build_model};
//!
//! let graph = Graph::with_uniform_costs(
//!     3,
//!     vec![Edge::new(1, 2), Edge::new(2, 3), Edge::new(1, 3)],
//!     vec![4.0, 1.0, 6.0],
//! )?;
//! let model = build_model(&graph, &Prices::default());
//! let solution = CoinCbc::default().solve(model)?;
//! println!("Obj: {}", solution.objective_value);
//! # Ok::<_, cable_trench::Error>(())
//! ```
pub mod error;
pub mod graph;
pub mod log;
pub mod model;
pub mod solver;
pub mod types;

#[cfg(test)]
mod fixture;

pub use error::{Error, InvalidTopologyError, Result, SolverError, SolverErrorKind};
pub use graph::{Edge, Graph, ROOT, VertexId, has_reverse_arc};
pub use model::{CableTrenchModel, ConstraintFamily, Prices, build_model};
pub use solver::{CoinCbc, ModelSolution, Solver};
pub use types::{CableFlow, Problem, Solution};

use ::log::info;

impl Problem {
    /// Parse a problem from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The validated graph described by this problem
    pub fn graph(&self) -> std::result::Result<Graph, InvalidTopologyError> {
        let edges = self
            .edges
            .iter()
            .map(|&(from, to)| Edge::new(from, to))
            .collect();
        let cable_cost = self
            .cable_cost
            .clone()
            .unwrap_or_else(|| self.trench_cost.clone());

        Graph::new(self.vertices, edges, self.trench_cost.clone(), cable_cost)
    }

    /// The validated unit prices
    pub fn prices(&self) -> std::result::Result<Prices, InvalidTopologyError> {
        Prices::new(self.cable_price, self.trench_price)
    }

    /// Build the model and solve it with CBC
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(&CoinCbc::new(self.verbose))
    }

    /// Build the model and solve it with the given solver
    pub fn solve_with(&self, solver: &impl Solver) -> Result<Solution> {
        let graph = self.graph()?;
        let prices = self.prices()?;
        info!(
            "Solving cable trench problem with {} vertices and {} edges",
            graph.vertex_count(),
            graph.edges().len()
        );

        let model = build_model(&graph, &prices);
        let solution = solver.solve(model)?;

        Ok(solution.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::example_optimum;
    use crate::model::Assignment;
    use float_cmp::assert_approx_eq;
    use serde::Deserialize;
    use std::fs::{read_dir, read_to_string};
    use std::path::Path;

    /// The parts of a solution a test file pins down
    #[derive(Debug, Deserialize)]
    struct ExpectedSolution {
        objective: f64,
        trenches: Vec<(VertexId, VertexId)>,
    }

    // Helper function to run a test from a test file
    fn run_test_file(test_file: &Path) {
        println!("Running test for file: {:?}", test_file);

        let failure_message = format!("Failed to read test file: {}", test_file.display());
        let yaml_content = read_to_string(test_file).expect(&failure_message);

        // Split the file content at the "solution:" marker to separate input and expected output
        let parts: Vec<&str> = yaml_content.split("solution:").collect();

        // Parse the input part
        let failure_message = format!("Failed to parse input YAML: {}", test_file.display());
        let input_yaml = parts.first().expect("No input found in test file").trim();
        let input = Problem::from_yaml(input_yaml).expect(&failure_message);

        let failure_message = format!("Failed to parse expected YAML: {}", test_file.display());
        let expected_yaml = parts.get(1).expect(&failure_message);
        let expected: ExpectedSolution =
            serde_yaml::from_str(expected_yaml).expect(&failure_message);

        // Run the solver
        let failure_message = format!("Failed to solve test file: {}", test_file.display());
        let solution = input.solve().expect(&failure_message);

        assert_approx_eq!(
            f64,
            expected.objective,
            solution.objective,
            epsilon = 1e-6
        );
        let mut expected_trenches = expected.trenches;
        expected_trenches.sort();
        assert_eq!(expected_trenches, solution.trenches, "{}", test_file.display());
    }

    #[test]
    fn run_all_test_files() {
        // Read all files from the test_data directory
        let test_data_dir = Path::new("test_data");
        let mut entries: Vec<_> = read_dir(test_data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "yaml").unwrap_or(false)
            })
            .collect();

        // Sort paths lexically by filename
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        // Process each file in sorted order
        for path in entries {
            run_test_file(&path);
        }
    }

    /// Answers every model with the known optimum of the seven vertex example
    struct KnownOptimum;

    impl Solver for KnownOptimum {
        fn solve(
            &self,
            model: CableTrenchModel,
        ) -> std::result::Result<ModelSolution, SolverError> {
            let values: Assignment = example_optimum()
                .into_iter()
                .map(|(name, value)| (model.variable(name).unwrap(), value))
                .collect();
            Ok(ModelSolution::from_assignment(&model, &values))
        }
    }

    /// Fails every solve
    struct AlwaysInfeasible;

    impl Solver for AlwaysInfeasible {
        fn solve(&self, _: CableTrenchModel) -> std::result::Result<ModelSolution, SolverError> {
            Err(SolverError::new(SolverErrorKind::Infeasible, "Infeasible"))
        }
    }

    const EXAMPLE_YAML: &str = "
vertices: 7
edges: [[1, 2], [1, 3], [1, 7], [2, 4], [3, 4], [3, 5], [3, 6], [3, 7], [4, 5], [5, 6], [6, 7]]
trenchCost: [50, 60, 60, 30, 30, 40, 40, 10, 30, 30, 39]
";

    #[test]
    fn test_from_yaml_defaults() {
        let problem = Problem::from_yaml(EXAMPLE_YAML).unwrap();

        assert_eq!(problem.vertices, 7);
        assert_eq!(problem.edges.len(), 11);
        assert_eq!(problem.cable_cost, None);
        assert_eq!(problem.prices().unwrap(), Prices::default());
        assert!(!problem.verbose);

        let graph = problem.graph().unwrap();
        assert_eq!(graph.cable_costs(), graph.trench_costs());
    }

    #[test]
    fn test_from_yaml_malformed() {
        assert!(matches!(
            Problem::from_yaml("vertices: [1, 2]"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_solve_with_returns_full_solution() {
        let problem = Problem::from_yaml(EXAMPLE_YAML).unwrap();
        let solution = problem.solve_with(&KnownOptimum).unwrap();

        assert_approx_eq!(f64, solution.objective, 575.0);
        assert_eq!(
            solution.trenches,
            [(1, 2), (1, 3), (2, 4), (3, 5), (3, 6), (3, 7)]
        );
        assert_eq!(solution.variables.len(), 30);
        assert_eq!(
            solution.cable_flows[0],
            CableFlow {
                from: 1,
                to: 2,
                flow: 2.0
            }
        );
    }

    #[test]
    fn test_solve_with_passes_solver_error_through() {
        let problem = Problem::from_yaml(EXAMPLE_YAML).unwrap();
        let err = problem.solve_with(&AlwaysInfeasible).unwrap_err();

        let Error::Solver(err) = err else {
            panic!("Expected a solver error, got {err:?}");
        };
        assert_eq!(err.kind, SolverErrorKind::Infeasible);
        assert_eq!(err.message, "Infeasible");
    }

    #[test]
    fn test_solve_with_rejects_bad_topology_before_solving() {
        let mut problem = Problem::from_yaml(EXAMPLE_YAML).unwrap();
        problem.edges.push((7, 8));
        problem.trench_cost.push(1.0);

        let err = problem.solve_with(&AlwaysInfeasible).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTopology(InvalidTopologyError::VertexOutOfRange { vertex: 8, .. })
        ));
    }

    #[test]
    fn test_solve_with_rejects_bad_price() {
        let mut problem = Problem::from_yaml(EXAMPLE_YAML).unwrap();
        problem.trench_price = 0.0;

        let err = problem.solve_with(&KnownOptimum).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTopology(InvalidTopologyError::NonPositivePrice { kind: "trench", .. })
        ));
    }
}
