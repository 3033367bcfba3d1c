//! Turns raw solver values into a [`Solution`] with a cost breakdown.
//!
//! Every value at or below [`EPSILON`] is treated as solver noise and dropped.
//! Costs are recomputed from the filtered plan and must agree with the
//! solver's objective; a disagreement points at this module, not the model.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::error;

use crate::domain::{Flow, ProblemInstance, Solution, SolveStatus};
use crate::error::{Error, Result};
use crate::model::Model;

/// Values at or below this are zero.
pub const EPSILON: f64 = 1e-4;

/// Relative tolerance between the solver objective and recomputed costs.
pub const OBJECTIVE_TOLERANCE: f64 = 1e-3;

/// Solver-side facts about one solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveMetadata {
    /// Objective reported by the solver.
    pub objective_value: f64,
    /// Wall-clock seconds spent so far.
    pub solve_time_seconds: f64,
}

/// Default message for a solver status.
///
/// ```
/// use facility_location::domain::SolveStatus;
/// use facility_location::extract::status_message;
///
/// assert_eq!(status_message(SolveStatus::Optimal), "Model optimal");
/// ```
pub fn status_message(status: SolveStatus) -> &'static str {
    match status {
        SolveStatus::Optimal => "Model optimal",
        SolveStatus::Infeasible => "Model is infeasible",
        SolveStatus::NotSolved => "Model not solved to optimality",
    }
}

/// Builds the solution for `instance` from the solver's variable values.
///
/// `values` is indexed like [`Model::variables`]; missing entries count as
/// zero. Only an [`Optimal`](SolveStatus::Optimal) status yields a plan.
pub fn extract(
    instance: Arc<ProblemInstance>,
    model: &Model,
    status: SolveStatus,
    values: &[f64],
    metadata: &SolveMetadata,
) -> Solution {
    if status != SolveStatus::Optimal {
        return Solution::without_plan(
            instance,
            status,
            status_message(status),
            metadata.solve_time_seconds,
        );
    }

    let value = |index: usize| values.get(index).copied().unwrap_or(0.0);

    let open_sites: BTreeSet<usize> = (0..model.n_sites())
        .filter(|&i| value(model.open_var(i).0) > EPSILON)
        .collect();

    let mut flows = BTreeMap::new();
    let mut site_volumes = vec![0.0; model.n_sites()];
    let mut customer_volumes = vec![0.0; model.n_customers()];

    for site in instance.sites() {
        for customer in instance.customers() {
            let units = value(model.flow_var(site.id, customer.id).0);
            if units <= EPSILON {
                continue;
            }
            site_volumes[site.id] += units;
            customer_volumes[customer.id] += units;
            flows.insert(
                (site.id, customer.id),
                Flow {
                    site_id: site.id,
                    customer_id: customer.id,
                    units,
                    from: site.location,
                    to: customer.location,
                },
            );
        }
    }

    let fixed_costs = open_sites
        .iter()
        .map(|&i| instance.sites()[i].fixed_cost)
        .sum();
    let variable_costs = flows
        .values()
        .map(|flow| model.shipping_cost(flow.site_id, flow.customer_id) * flow.units)
        .sum();

    let solution = Solution {
        instance,
        status,
        message: status_message(status).to_string(),
        objective_value: metadata.objective_value,
        solve_time_seconds: metadata.solve_time_seconds,
        open_sites,
        flows,
        fixed_costs,
        variable_costs,
        site_volumes,
        customer_volumes,
    };

    let consistency = check_consistency(&solution);
    if let Err(err) = &consistency {
        error!(error = %err, "Extracted costs disagree with solver objective");
    }
    debug_assert!(
        consistency.is_ok(),
        "extracted costs disagree with solver objective: {:?}",
        consistency
    );

    solution
}

/// Checks `objective_value ≈ fixed_costs + variable_costs` for optimal solutions.
///
/// ```
/// use facility_location::domain::{ProblemInstance, Solution, SolveStatus};
/// use facility_location::extract::check_consistency;
/// use std::sync::Arc;
///
/// let instance = Arc::new(ProblemInstance::new("empty", vec![], vec![], 1.0).unwrap());
/// let mut solution = Solution::without_plan(instance, SolveStatus::Optimal, "ok", 0.0);
/// assert!(check_consistency(&solution).is_ok());
///
/// solution.objective_value = 10.0;
/// assert!(check_consistency(&solution).is_err());
/// ```
pub fn check_consistency(solution: &Solution) -> Result<()> {
    if !solution.is_optimal() {
        return Ok(());
    }

    let recomputed = solution.total_costs();
    let scale = solution.objective_value.abs().max(1.0);
    if (solution.objective_value - recomputed).abs() <= OBJECTIVE_TOLERANCE * scale {
        Ok(())
    } else {
        Err(Error::ObjectiveMismatch {
            objective: solution.objective_value,
            recomputed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Customer, GeoPoint, Site};

    fn instance() -> Arc<ProblemInstance> {
        Arc::new(
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
                        .with_capacity(100.0)
                        .with_fixed_cost(300.0),
                ],
                2.0,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_noise_is_filtered_and_costs_recomputed() {
        let instance = instance();
        let model = Model::formulate(&instance).unwrap();

        let mut values = vec![0.0; model.variables().len()];
        values[model.open_var(0).0] = 0.999_999_9;
        values[model.open_var(1).0] = 5e-5;
        values[model.flow_var(0, 0).0] = 10.0;
        values[model.flow_var(0, 1).0] = 20.0;
        values[model.flow_var(1, 1).0] = 1e-6;

        let objective = 500.0 + 20.0 * model.shipping_cost(0, 1);
        let solution = extract(
            instance.clone(),
            &model,
            SolveStatus::Optimal,
            &values,
            &SolveMetadata {
                objective_value: objective,
                solve_time_seconds: 0.5,
            },
        );

        assert_eq!(solution.open_sites, BTreeSet::from([0]));
        assert_eq!(solution.flows.len(), 2);
        assert_eq!(solution.flow_units(1, 1), 0.0);
        assert_eq!(solution.fixed_costs, 500.0);
        assert!((solution.variable_costs - 20.0 * model.shipping_cost(0, 1)).abs() < 1e-9);
        assert!(check_consistency(&solution).is_ok());
        assert_eq!(solution.message, "Model optimal");
        assert_eq!(solution.solve_time_seconds, 0.5);
    }

    #[test]
    fn test_flows_carry_coordinates_and_volumes() {
        let instance = instance();
        let model = Model::formulate(&instance).unwrap();

        let mut values = vec![0.0; model.variables().len()];
        values[model.open_var(0).0] = 1.0;
        values[model.open_var(1).0] = 1.0;
        values[model.flow_var(0, 0).0] = 10.0;
        values[model.flow_var(1, 1).0] = 20.0;

        let solution = extract(
            instance.clone(),
            &model,
            SolveStatus::Optimal,
            &values,
            &SolveMetadata {
                objective_value: 800.0,
                solve_time_seconds: 0.0,
            },
        );

        let flow = solution.flows[&(1, 1)];
        assert_eq!(flow.units, 20.0);
        assert_eq!(flow.from, instance.sites()[1].location);
        assert_eq!(flow.to, instance.customers()[1].location);

        assert_eq!(solution.site_volumes, vec![10.0, 20.0]);
        assert_eq!(solution.customer_volumes, vec![10.0, 20.0]);
        assert_eq!(solution.total_costs(), 800.0);
    }

    #[test]
    fn test_non_optimal_status_has_no_plan() {
        let instance = instance();
        let model = Model::formulate(&instance).unwrap();
        let values = vec![1.0; model.variables().len()];

        let solution = extract(
            instance,
            &model,
            SolveStatus::NotSolved,
            &values,
            &SolveMetadata {
                objective_value: f64::NAN,
                solve_time_seconds: 120.0,
            },
        );

        assert_eq!(solution.status, SolveStatus::NotSolved);
        assert_eq!(solution.message, "Model not solved to optimality");
        assert!(solution.flows.is_empty());
        assert!(solution.open_sites.is_empty());
        assert_eq!(solution.solve_time_seconds, 120.0);
    }

    #[test]
    fn test_consistency_reports_mismatch() {
        let mut solution = Solution::without_plan(instance(), SolveStatus::Optimal, "ok", 0.0);
        solution.fixed_costs = 1_000.0;
        solution.variable_costs = 0.5;
        solution.objective_value = 1_000.9;
        assert!(check_consistency(&solution).is_ok());

        solution.objective_value = 1_100.0;
        assert_eq!(
            check_consistency(&solution).unwrap_err(),
            Error::ObjectiveMismatch {
                objective: 1_100.0,
                recomputed: 1_000.5
            }
        );
    }
}
