//! Fixtures for tests
use crate::graph::{Edge, Graph};
use crate::model::Prices;
use rstest::fixture;

/// The seven vertex, eleven edge network with equal cable and trench costs
#[fixture]
pub fn example_graph() -> Graph {
    let edges = [
        (1, 2),
        (1, 3),
        (1, 7),
        (2, 4),
        (3, 4),
        (3, 5),
        (3, 6),
        (3, 7),
        (4, 5),
        (5, 6),
        (6, 7),
    ]
    .into_iter()
    .map(|(from, to)| Edge::new(from, to))
    .collect();
    let costs = vec![
        50.0, 60.0, 60.0, 30.0, 30.0, 40.0, 40.0, 10.0, 30.0, 30.0, 39.0,
    ];

    Graph::with_uniform_costs(7, edges, costs).unwrap()
}

#[fixture]
pub fn example_prices() -> Prices {
    Prices::new(1.0, 0.5).unwrap()
}

/// The non-zero variables of the unique optimum for [`example_graph`] (objective 575)
pub fn example_optimum() -> Vec<(&'static str, f64)> {
    vec![
        ("x[1,2]", 2.0),
        ("x[1,3]", 4.0),
        ("x[2,4]", 1.0),
        ("x[3,5]", 1.0),
        ("x[3,6]", 1.0),
        ("x[3,7]", 1.0),
        ("y[1,2]", 1.0),
        ("y[1,3]", 1.0),
        ("y[2,4]", 1.0),
        ("y[3,5]", 1.0),
        ("y[3,6]", 1.0),
        ("y[3,7]", 1.0),
    ]
}
