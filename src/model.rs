//! Mixed-integer formulation of the capacitated facility location problem.
//!
//! # Variables
//!
//! - `open[i] ∈ {0, 1}` for each site `i`
//! - `flow[i][j] ≥ 0` for each site `i` and customer `j`
//!
//! # Objective (minimize)
//!
//! `Σ fixed_cost[i]·open[i] + Σ shipping·distance(i, j)·flow[i][j]`
//!
//! # Constraints
//!
//! - **Demand**, per customer `j`: `Σ_i flow[i][j] ≥ demand[j]`
//! - **Capacity linking**, per site `i`:
//!   `Σ_j flow[i][j] − min(capacity[i], total_demand)·open[i] ≤ 0`
//!
//! The model is solver-agnostic; a [`SolverBackend`](crate::solver::SolverBackend)
//! translates it into its engine's native form.

use rayon::prelude::*;

use crate::domain::ProblemInstance;
use crate::error::Result;

/// Index of a variable in [`Model::variables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Variable domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    /// Integer in `{0, 1}`.
    Binary,
    /// Real within its bounds.
    Continuous,
}

/// A decision variable with its objective coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// Name for diagnostics (`open_3`, `flow_1_7`).
    pub name: String,
    /// Domain.
    pub kind: VarKind,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound, possibly infinite.
    pub upper: f64,
    /// Objective coefficient.
    pub objective: f64,
}

/// Constraint direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    /// `activity ≤ rhs`
    LessEqual,
    /// `activity ≥ rhs`
    GreaterEqual,
}

/// A linear row `Σ coef·var (sense) rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    /// Name for diagnostics (`demand_4`, `capacity_0`).
    pub name: String,
    /// Non-zero coefficients.
    pub terms: Vec<(VarId, f64)>,
    /// Direction.
    pub sense: Sense,
    /// Right-hand side.
    pub rhs: f64,
}

#[cfg(test)]
impl LinearConstraint {
    fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(var, coef)| coef * values[var.0]).sum()
    }

    fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(values);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + tolerance,
            Sense::GreaterEqual => lhs >= self.rhs - tolerance,
        }
    }
}

/// Returns why `instance` cannot possibly be feasible, if it cannot.
///
/// Checked before formulation so no solver time is spent on instances whose
/// total demand exceeds total capacity.
///
/// ```
/// use facility_location::domain::{Customer, GeoPoint, ProblemInstance, Site};
/// use facility_location::model::precheck;
///
/// let p = GeoPoint::new(40.0, -100.0);
/// let instance = ProblemInstance::new(
///     "short",
///     vec![Customer::new(0, "c", p).with_demand(10.0)],
///     vec![Site::new(0, "s", p).with_capacity(5.0)],
///     1.0,
/// )
/// .unwrap();
///
/// assert_eq!(
///     precheck(&instance).as_deref(),
///     Some("Total demand (10) exceeds total capacity (5)")
/// );
/// ```
pub fn precheck(instance: &ProblemInstance) -> Option<String> {
    let demand = instance.total_demand();
    let capacity = instance.total_capacity();
    if demand > capacity {
        Some(format!(
            "Total demand ({}) exceeds total capacity ({})",
            demand, capacity
        ))
    } else {
        None
    }
}

/// A formulated facility location model.
///
/// # Examples
///
/// ```
/// use facility_location::domain::{Customer, GeoPoint, ProblemInstance, Site};
/// use facility_location::model::Model;
///
/// let p = GeoPoint::new(40.0, -100.0);
/// let instance = ProblemInstance::new(
///     "tiny",
///     vec![
///         Customer::new(0, "a", p).with_demand(10.0),
///         Customer::new(1, "b", p).with_demand(5.0),
///     ],
///     vec![Site::new(0, "s", p).with_capacity(100.0).with_fixed_cost(1000.0)],
///     1.0,
/// )
/// .unwrap();
///
/// let model = Model::formulate(&instance).unwrap();
/// assert_eq!(model.variables().len(), 1 + 2);
/// assert_eq!(model.constraints().len(), 2 + 1);
/// ```
#[derive(Clone, Debug)]
pub struct Model {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    n_sites: usize,
    n_customers: usize,
    shipping_costs: Vec<Vec<f64>>,
}

impl Model {
    /// Builds the model. Fails only if a site-customer distance is undefined.
    pub fn formulate(instance: &ProblemInstance) -> Result<Self> {
        let sites = instance.sites();
        let customers = instance.customers();
        let n_sites = sites.len();
        let n_customers = customers.len();
        let total_demand = instance.total_demand();

        // Row per site, computed in parallel
        let shipping_costs: Vec<Vec<f64>> = sites
            .par_iter()
            .map(|site| {
                customers
                    .iter()
                    .map(|customer| instance.shipping_cost(site.id, customer.id))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut variables = Vec::with_capacity(n_sites + n_sites * n_customers);
        for site in sites {
            variables.push(Variable {
                name: format!("open_{}", site.id),
                kind: VarKind::Binary,
                lower: 0.0,
                upper: 1.0,
                objective: site.fixed_cost,
            });
        }
        for (i, row) in shipping_costs.iter().enumerate() {
            for (j, &cost) in row.iter().enumerate() {
                variables.push(Variable {
                    name: format!("flow_{}_{}", i, j),
                    kind: VarKind::Continuous,
                    lower: 0.0,
                    upper: f64::INFINITY,
                    objective: cost,
                });
            }
        }

        let mut model = Self {
            variables,
            constraints: Vec::with_capacity(n_customers + n_sites),
            n_sites,
            n_customers,
            shipping_costs,
        };

        for customer in customers {
            let j = customer.id;
            let terms = (0..n_sites).map(|i| (model.flow_var(i, j), 1.0)).collect();
            model.constraints.push(LinearConstraint {
                name: format!("demand_{}", j),
                terms,
                sense: Sense::GreaterEqual,
                rhs: customer.demand,
            });
        }

        for site in sites {
            let i = site.id;
            let big_m = site.capacity.min(total_demand);
            let mut terms: Vec<(VarId, f64)> =
                (0..n_customers).map(|j| (model.flow_var(i, j), 1.0)).collect();
            terms.push((model.open_var(i), -big_m));
            model.constraints.push(LinearConstraint {
                name: format!("capacity_{}", i),
                terms,
                sense: Sense::LessEqual,
                rhs: 0.0,
            });
        }

        Ok(model)
    }

    /// All variables; `open` first, then `flow` in site-major order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Demand rows (one per customer) followed by capacity rows (one per site).
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Number of customers.
    pub fn n_customers(&self) -> usize {
        self.n_customers
    }

    /// The `open[site]` variable.
    pub fn open_var(&self, site: usize) -> VarId {
        VarId(site)
    }

    /// The `flow[site][customer]` variable.
    pub fn flow_var(&self, site: usize, customer: usize) -> VarId {
        VarId(self.n_sites + site * self.n_customers + customer)
    }

    /// Cost of shipping one unit from `site` to `customer`.
    pub fn shipping_cost(&self, site: usize, customer: usize) -> f64 {
        self.shipping_costs[site][customer]
    }
}

#[cfg(test)]
impl Model {
    fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(var, value)| var.objective * value)
            .sum()
    }

    fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(var, &v)| v >= var.lower - tolerance && v <= var.upper + tolerance)
            && self
                .constraints
                .iter()
                .all(|row| row.is_satisfied(values, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, GeoPoint, Site};

    fn instance() -> ProblemInstance {
        ProblemInstance::new(
            "t",
            vec![
                Customer::new(0, "a", GeoPoint::new(0.0, 0.0)).with_demand(10.0),
                Customer::new(1, "b", GeoPoint::new(0.0, 1.0)).with_demand(20.0),
            ],
            vec![
                Site::new(0, "x", GeoPoint::new(0.0, 0.0))
                    .with_capacity(100.0)
                    .with_fixed_cost(500.0),
                Site::new(1, "y", GeoPoint::new(0.0, 1.0))
                    .with_capacity(25.0)
                    .with_fixed_cost(300.0),
            ],
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn test_variable_layout() {
        let model = Model::formulate(&instance()).unwrap();
        assert_eq!(model.variables().len(), 2 + 4);
        assert_eq!(model.open_var(1), VarId(1));
        assert_eq!(model.flow_var(1, 0), VarId(4));
        assert_eq!(model.variables()[4].name, "flow_1_0");

        let open = &model.variables()[0];
        assert_eq!(open.kind, VarKind::Binary);
        assert_eq!(open.objective, 500.0);

        let flow = &model.variables()[model.flow_var(0, 1).0];
        assert_eq!(flow.kind, VarKind::Continuous);
        assert_eq!(flow.lower, 0.0);
        assert!(flow.upper.is_infinite());
    }

    #[test]
    fn test_objective_uses_scaled_distance() {
        let model = Model::formulate(&instance()).unwrap();
        let km = GeoPoint::new(0.0, 0.0)
            .distance_km(&GeoPoint::new(0.0, 1.0))
            .unwrap();

        assert_eq!(model.shipping_cost(0, 0), 0.0);
        assert!((model.shipping_cost(0, 1) - 2.0 * km).abs() < 1e-9);
        assert!((model.shipping_cost(1, 0) - 2.0 * km).abs() < 1e-9);
        assert_eq!(
            model.variables()[model.flow_var(0, 1).0].objective,
            model.shipping_cost(0, 1)
        );
    }

    #[test]
    fn test_demand_rows() {
        let model = Model::formulate(&instance()).unwrap();
        let row = &model.constraints()[1];
        assert_eq!(row.name, "demand_1");
        assert_eq!(row.sense, Sense::GreaterEqual);
        assert_eq!(row.rhs, 20.0);
        assert_eq!(
            row.terms,
            vec![(model.flow_var(0, 1), 1.0), (model.flow_var(1, 1), 1.0)]
        );
    }

    #[test]
    fn test_capacity_rows_use_tightened_big_m() {
        let model = Model::formulate(&instance()).unwrap();

        // Site 0 capacity 100 exceeds total demand 30
        let row = &model.constraints()[2];
        assert_eq!(row.name, "capacity_0");
        assert_eq!(row.sense, Sense::LessEqual);
        assert_eq!(row.rhs, 0.0);
        assert_eq!(row.terms.last(), Some(&(model.open_var(0), -30.0)));

        // Site 1 capacity 25 is below total demand
        let row = &model.constraints()[3];
        assert_eq!(row.terms.last(), Some(&(model.open_var(1), -25.0)));
    }

    #[test]
    fn test_feasibility_check() {
        let model = Model::formulate(&instance()).unwrap();
        let mut values = vec![0.0; model.variables().len()];

        // Everything from site 0
        values[model.open_var(0).0] = 1.0;
        values[model.flow_var(0, 0).0] = 10.0;
        values[model.flow_var(0, 1).0] = 20.0;
        assert!(model.is_feasible(&values, 1e-9));
        assert!((model.objective_value(&values) - (500.0 + 20.0 * model.shipping_cost(0, 1))).abs() < 1e-9);

        // Flow out of a closed site violates its linking row
        values[model.flow_var(1, 1).0] = 1.0;
        assert!(!model.is_feasible(&values, 1e-9));
    }

    #[test]
    fn test_precheck() {
        assert!(precheck(&instance()).is_none());

        let short = ProblemInstance::new(
            "t",
            vec![Customer::new(0, "a", GeoPoint::new(0.0, 0.0)).with_demand(10.0)],
            vec![Site::new(0, "x", GeoPoint::new(0.0, 0.0)).with_capacity(5.0)],
            1.0,
        )
        .unwrap();
        assert_eq!(
            precheck(&short).unwrap(),
            "Total demand (10) exceeds total capacity (5)"
        );
    }
}
