use crate::error::InvalidTopologyError;
use crate::graph::{Edge, Graph, ROOT, VertexId, has_reverse_arc};
use good_lp::{Constraint, Expression, ProblemVariables, Variable, variable, variables};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Lookup from a directed vertex pair to its variable
pub type ArcMap = BTreeMap<(VertexId, VertexId), Variable>;

/// A linear expression as `(variable, coefficient)` terms
pub type Terms = Vec<(Variable, f64)>;

/// Values assigned to the model's variables, e.g. by a solver or by hand
pub type Assignment = HashMap<Variable, f64>;

/// Unit prices applied to the total cable and trench costs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prices {
    cable: f64,
    trench: f64,
}

impl Prices {
    pub fn new(cable: f64, trench: f64) -> Result<Self, InvalidTopologyError> {
        check_price("cable", cable)?;
        check_price("trench", trench)?;
        Ok(Self { cable, trench })
    }

    pub fn cable(&self) -> f64 {
        self.cable
    }

    pub fn trench(&self) -> f64 {
        self.trench
    }
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            cable: 1.0,
            trench: 0.5,
        }
    }
}

fn check_price(kind: &'static str, price: f64) -> Result<(), InvalidTopologyError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(InvalidTopologyError::NonPositivePrice { kind, price })
    }
}

/// What a decision variable stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Continuous, non-negative cable flow along the arc `from -> to`
    CableFlow { from: VertexId, to: VertexId },
    /// Binary: whether a trench is dug along the edge
    TrenchUse(Edge),
}

/// A declared decision variable
#[derive(Debug, Clone)]
pub struct ModelVariable {
    pub name: String,
    pub kind: VariableKind,
    pub variable: Variable,
}

impl ModelVariable {
    pub fn is_binary(&self) -> bool {
        matches!(self.kind, VariableKind::TrenchUse(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ge,
    Le,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Eq => "==",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
        })
    }
}

/// The families of constraints making up the formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    /// The root sends one unit of cable to every other vertex
    RootOutDegree,
    /// Every non-root vertex consumes exactly one unit of cable
    FlowConservation,
    /// The trenches form a spanning tree's worth of edges
    TrenchCount,
    /// Cable may only flow along an edge with a trench
    CapacityLink,
    /// Cable flows are non-negative
    NonNegativity,
}

impl ConstraintFamily {
    /// The prefix used when labelling constraints of this family
    pub fn label_prefix(&self) -> &'static str {
        match self {
            ConstraintFamily::RootOutDegree => "c.2",
            ConstraintFamily::FlowConservation => "c.3",
            ConstraintFamily::TrenchCount => "c.4",
            ConstraintFamily::CapacityLink => "c.5",
            ConstraintFamily::NonNegativity => "c.6",
        }
    }
}

/// A constraint of the form `terms <comparison> rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub family: ConstraintFamily,
    pub label: String,
    pub terms: Terms,
    pub comparison: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    fn new(
        family: ConstraintFamily,
        key: impl fmt::Display,
        terms: Terms,
        comparison: Comparison,
        rhs: f64,
    ) -> Self {
        Self {
            family,
            label: format!("{}{key}", family.label_prefix()),
            terms,
            comparison,
            rhs,
        }
    }

    /// Evaluate the left-hand side. Variables missing from `values` count as zero.
    pub fn lhs(&self, values: &Assignment) -> f64 {
        evaluate(&self.terms, values)
    }

    /// Whether `values` satisfies the constraint, up to `tolerance`
    pub fn is_satisfied(&self, values: &Assignment, tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.comparison {
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
            Comparison::Ge => lhs >= self.rhs - tolerance,
            Comparison::Le => lhs <= self.rhs + tolerance,
        }
    }

    /// Convert into a constraint the solver understands
    pub fn to_constraint(&self) -> Constraint {
        let lhs = to_expression(&self.terms);
        match self.comparison {
            Comparison::Eq => lhs.eq(self.rhs),
            Comparison::Ge => lhs.geq(self.rhs),
            Comparison::Le => lhs.leq(self.rhs),
        }
    }
}

fn evaluate(terms: &[(Variable, f64)], values: &Assignment) -> f64 {
    terms
        .iter()
        .map(|(var, coeff)| coeff * values.get(var).copied().unwrap_or(0.0))
        .sum()
}

/// Build the solver expression for a list of terms
pub fn to_expression(terms: &[(Variable, f64)]) -> Expression {
    terms
        .iter()
        .fold(Expression::from(0.0), |sum, &(var, coeff)| sum + var * coeff)
}

/// A complete MILP for one cable trench instance: variables, objective (to be minimised) and
/// constraints
pub struct CableTrenchModel {
    problem_variables: ProblemVariables,
    declared: Vec<ModelVariable>,
    cable_flows: ArcMap,
    trench_uses: ArcMap,
    objective: Terms,
    constraints: Vec<LinearConstraint>,
}

impl CableTrenchModel {
    /// Add a constraint to the model
    fn with(mut self, constraint: LinearConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Every declared variable, cable flows first
    pub fn variables(&self) -> &[ModelVariable] {
        &self.declared
    }

    /// Find a variable by name, e.g. `x[1,2]` or `y[3,4]`
    pub fn variable(&self, name: &str) -> Option<Variable> {
        self.declared
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.variable)
    }

    /// The cable flow variable for the arc `from -> to`, if that arc exists
    pub fn cable_flow(&self, from: VertexId, to: VertexId) -> Option<Variable> {
        self.cable_flows.get(&(from, to)).copied()
    }

    /// The trench variable for the edge between `a` and `b`, in either orientation
    pub fn trench_use(&self, a: VertexId, b: VertexId) -> Option<Variable> {
        self.trench_uses
            .get(&(a, b))
            .or_else(|| self.trench_uses.get(&(b, a)))
            .copied()
    }

    pub fn cable_flows(&self) -> &ArcMap {
        &self.cable_flows
    }

    pub fn trench_uses(&self) -> &ArcMap {
        &self.trench_uses
    }

    pub fn objective(&self) -> &[(Variable, f64)] {
        &self.objective
    }

    /// The objective coefficient of every variable, keyed by variable name
    pub fn objective_coefficients(&self) -> BTreeMap<String, f64> {
        let names: HashMap<Variable, &str> = self
            .declared
            .iter()
            .map(|v| (v.variable, v.name.as_str()))
            .collect();
        self.objective.iter().fold(BTreeMap::new(), |mut map, (var, coeff)| {
            *map.entry(names[var].to_string()).or_insert(0.0) += coeff;
            map
        })
    }

    /// The objective value of the given assignment
    pub fn objective_value(&self, values: &Assignment) -> f64 {
        evaluate(&self.objective, values)
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Iterate over the constraints belonging to one family
    pub fn constraints_in(
        &self,
        family: ConstraintFamily,
    ) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// The constraints not satisfied by the given assignment
    pub fn violated_constraints(
        &self,
        values: &Assignment,
        tolerance: f64,
    ) -> Vec<&LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .collect()
    }

    /// Take the solver's variable declarations out of the model, leaving the rest readable
    pub(crate) fn take_problem_variables(&mut self) -> ProblemVariables {
        std::mem::replace(&mut self.problem_variables, ProblemVariables::new())
    }
}

/// Build the MILP for the given graph and prices.
///
/// The cable network is a single-commodity flow in which [`ROOT`] sends one unit to every other
/// vertex. The trench network is a spanning tree of binary edge selections, and cable may only
/// flow along an edge with a trench.
///
/// The inputs are validated on construction, so this cannot fail.
pub fn build_model(graph: &Graph, prices: &Prices) -> CableTrenchModel {
    let model = init_variables(graph);
    let model = set_objective(model, graph, prices);

    // Add constraints
    let model = constrain_root_out_degree(model, graph);
    let model = constrain_flow_conservation(model, graph);
    let model = constrain_trench_count(model, graph);
    let model = constrain_capacity_links(model, graph);
    let model = constrain_non_negative_flows(model);

    debug!(
        "Built cable trench model with {} cable flow variables, {} trench variables and {} constraints",
        model.cable_flows.len(),
        model.trench_uses.len(),
        model.constraints.len()
    );

    model
}

/// Create all variables, and LUTs of type (vertex, vertex) → Variable
fn init_variables(graph: &Graph) -> CableTrenchModel {
    let mut problem_variables = variables!();
    let mut declared = Vec::new();
    let mut cable_flows = ArcMap::new();
    let mut trench_uses = ArcMap::new();

    let mut add_cable_flow = |from: VertexId, to: VertexId| {
        let name = format!("x[{from},{to}]");
        let var = problem_variables.add(variable().min(0).name(name.clone()));
        cable_flows.insert((from, to), var);
        declared.push(ModelVariable {
            name,
            kind: VariableKind::CableFlow { from, to },
            variable: var,
        });
    };
    for edge in graph.edges() {
        add_cable_flow(edge.from, edge.to);
        if has_reverse_arc(edge) {
            add_cable_flow(edge.to, edge.from);
        }
    }

    for edge in graph.edges() {
        let name = format!("y[{},{}]", edge.from, edge.to);
        let var = problem_variables.add(variable().binary().name(name.clone()));
        trench_uses.insert((edge.from, edge.to), var);
        declared.push(ModelVariable {
            name,
            kind: VariableKind::TrenchUse(*edge),
            variable: var,
        });
    }

    CableTrenchModel {
        problem_variables,
        declared,
        cable_flows,
        trench_uses,
        objective: Terms::new(),
        constraints: Vec::new(),
    }
}

/// The cable flow variables on both directions of an edge (only one for root edges)
fn edge_flows(model: &CableTrenchModel, edge: &Edge) -> Vec<Variable> {
    let forward = model.cable_flows[&(edge.from, edge.to)];
    if has_reverse_arc(edge) {
        vec![forward, model.cable_flows[&(edge.to, edge.from)]]
    } else {
        vec![forward]
    }
}

/// cable price * Σ (cable flow along the edge) * cable cost
///   + trench price * Σ (trench use) * trench cost
fn set_objective(model: CableTrenchModel, graph: &Graph, prices: &Prices) -> CableTrenchModel {
    let mut objective = Terms::new();
    for (_, edge, _, cable_cost) in graph.iter_edges() {
        for flow in edge_flows(&model, edge) {
            objective.push((flow, prices.cable() * cable_cost));
        }
    }
    for (_, edge, trench_cost, _) in graph.iter_edges() {
        let trench = model.trench_uses[&(edge.from, edge.to)];
        objective.push((trench, prices.trench() * trench_cost));
    }

    CableTrenchModel { objective, ..model }
}

/// The root sends out `V - 1` units of cable
fn constrain_root_out_degree(model: CableTrenchModel, graph: &Graph) -> CableTrenchModel {
    let terms = model
        .cable_flows
        .iter()
        .filter(|((from, _), _)| *from == ROOT)
        .map(|(_, &var)| (var, 1.0))
        .collect();
    let constraint = LinearConstraint::new(
        ConstraintFamily::RootOutDegree,
        format_args!("[{ROOT}]"),
        terms,
        Comparison::Eq,
        graph.max_flow(),
    );
    model.with(constraint)
}

/// Outflow minus inflow is -1 at every non-root vertex
fn constrain_flow_conservation(model: CableTrenchModel, graph: &Graph) -> CableTrenchModel {
    graph.non_root_vertices().fold(model, |m, vertex| {
        let terms = m
            .cable_flows
            .iter()
            .filter_map(|(&(from, to), &var)| {
                if from == vertex {
                    Some((var, 1.0))
                } else if to == vertex {
                    Some((var, -1.0))
                } else {
                    None
                }
            })
            .collect();
        let constraint = LinearConstraint::new(
            ConstraintFamily::FlowConservation,
            format_args!("[{vertex}]"),
            terms,
            Comparison::Eq,
            -1.0,
        );
        m.with(constraint)
    })
}

/// Exactly `V - 1` trenches are dug
fn constrain_trench_count(model: CableTrenchModel, graph: &Graph) -> CableTrenchModel {
    let terms = model.trench_uses.values().map(|&var| (var, 1.0)).collect();
    let constraint = LinearConstraint::new(
        ConstraintFamily::TrenchCount,
        "",
        terms,
        Comparison::Eq,
        graph.max_flow(),
    );
    model.with(constraint)
}

/// (V - 1) * trench use - cable flow in either direction >= 0, for every edge.
///
/// `V - 1` bounds the flow on any arc of a spanning arborescence. Constraints are keyed by edge
/// position, so edges sharing a source vertex get distinct labels.
fn constrain_capacity_links(model: CableTrenchModel, graph: &Graph) -> CableTrenchModel {
    graph.iter_edges().fold(model, |m, (index, edge, _, _)| {
        let trench = m.trench_uses[&(edge.from, edge.to)];
        let terms = std::iter::once((trench, graph.max_flow()))
            .chain(edge_flows(&m, edge).into_iter().map(|flow| (flow, -1.0)))
            .collect();
        let constraint = LinearConstraint::new(
            ConstraintFamily::CapacityLink,
            format_args!("[{index}]"),
            terms,
            Comparison::Ge,
            0.0,
        );
        m.with(constraint)
    })
}

/// Every cable flow is non-negative.
///
/// This duplicates the variables' lower bound, but is kept as explicit rows.
fn constrain_non_negative_flows(model: CableTrenchModel) -> CableTrenchModel {
    let flows: Vec<_> = model
        .declared
        .iter()
        .filter_map(|v| match v.kind {
            VariableKind::CableFlow { from, to } => Some((from, to, v.variable)),
            VariableKind::TrenchUse(_) => None,
        })
        .collect();
    flows.into_iter().fold(model, |m, (from, to, var)| {
        let constraint = LinearConstraint::new(
            ConstraintFamily::NonNegativity,
            format_args!("[{from},{to}]"),
            vec![(var, 1.0)],
            Comparison::Ge,
            0.0,
        );
        m.with(constraint)
    })
}
