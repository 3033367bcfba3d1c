//! DTOs for REST API requests/responses.
//!
//! Coordinates are flattened into `lat`/`lon` fields so the map frontend can
//! plot sites, customers and flow lines without reshaping.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Customer, GeoPoint, ProblemInstance, Site, Solution};
use crate::error::Result;
use crate::solver::SolverStatus;

/// Customer as exchanged with the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    /// Position in the instance's customer list.
    pub id: usize,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Units required.
    pub demand: f64,
    /// Units received in a solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Candidate site as exchanged with the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteDto {
    /// Position in the instance's site list.
    pub id: usize,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Maximum units shipped.
    pub capacity: f64,
    /// Cost paid when opened.
    pub fixed_cost: f64,
    /// Whether the solution opens this site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    /// Units shipped in a solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// A problem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDto {
    /// Instance name.
    pub name: String,
    /// Cost of shipping one unit one kilometer.
    pub shipping_cost_per_unit_distance: f64,
    /// Customers ordered by id.
    pub customers: Vec<CustomerDto>,
    /// Sites ordered by id.
    pub sites: Vec<SiteDto>,
}

impl InstanceDto {
    /// Converts a domain instance for API responses.
    pub fn from_instance(instance: &ProblemInstance) -> Self {
        Self {
            name: instance.name.clone(),
            shipping_cost_per_unit_distance: instance.shipping_cost_per_unit_distance(),
            customers: instance
                .customers()
                .iter()
                .map(|c| CustomerDto {
                    id: c.id,
                    name: c.name.clone(),
                    lat: c.location.lat,
                    lon: c.location.lon,
                    demand: c.demand,
                    volume: None,
                })
                .collect(),
            sites: instance
                .sites()
                .iter()
                .map(|s| SiteDto {
                    id: s.id,
                    name: s.name.clone(),
                    lat: s.location.lat,
                    lon: s.location.lon,
                    capacity: s.capacity,
                    fixed_cost: s.fixed_cost,
                    open: None,
                    volume: None,
                })
                .collect(),
        }
    }

    /// Converts to a validated domain instance for solving.
    ///
    /// Solution-only fields (`open`, `volume`) are ignored.
    pub fn to_domain(&self) -> Result<ProblemInstance> {
        let customers = self
            .customers
            .iter()
            .map(|c| {
                Customer::new(c.id, c.name.clone(), GeoPoint::new(c.lat, c.lon))
                    .with_demand(c.demand)
            })
            .collect();
        let sites = self
            .sites
            .iter()
            .map(|s| {
                Site::new(s.id, s.name.clone(), GeoPoint::new(s.lat, s.lon))
                    .with_capacity(s.capacity)
                    .with_fixed_cost(s.fixed_cost)
            })
            .collect();
        ProblemInstance::new(
            self.name.clone(),
            customers,
            sites,
            self.shipping_cost_per_unit_distance,
        )
    }
}

/// Units shipped along one site → customer line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowDto {
    /// Shipping site.
    pub site_id: usize,
    /// Receiving customer.
    pub customer_id: usize,
    /// Units shipped.
    pub units: f64,
    /// Latitude of the shipping site.
    pub from_lat: f64,
    /// Longitude of the shipping site.
    pub from_lon: f64,
    /// Latitude of the receiving customer.
    pub to_lat: f64,
    /// Longitude of the receiving customer.
    pub to_lon: f64,
}

/// Cost table of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostsDto {
    /// Sum of fixed costs over open sites.
    pub fixed: f64,
    /// Sum of shipping costs over flows.
    pub variable: f64,
    /// `fixed + variable`.
    pub total: f64,
}

/// Solution of a job, or the instance alone while solving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDto {
    /// Instance name.
    pub name: String,
    /// Job state ("NOT_SOLVING" or "SOLVING").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_status: Option<String>,
    /// Outcome ("OPTIMAL", "INFEASIBLE", "NOT_SOLVED"); absent while solving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Objective reported by the solver; present only for optimal solutions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    /// Wall-clock seconds spent solving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solve_time_seconds: Option<f64>,
    /// Cost table; present only for optimal solutions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<CostsDto>,
    /// Sites with open flag and shipped volume.
    pub sites: Vec<SiteDto>,
    /// Customers with received volume.
    pub customers: Vec<CustomerDto>,
    /// Non-zero flows.
    pub flows: Vec<FlowDto>,
}

impl SolutionDto {
    /// Instance without a plan, for jobs still solving.
    pub fn pending(instance: &ProblemInstance, status: SolverStatus) -> Self {
        let instance = InstanceDto::from_instance(instance);
        Self {
            name: instance.name,
            solver_status: Some(status.as_str().to_string()),
            status: None,
            message: None,
            objective_value: None,
            solve_time_seconds: None,
            costs: None,
            sites: instance.sites,
            customers: instance.customers,
            flows: Vec::new(),
        }
    }

    /// Converts a solution for API responses.
    pub fn from_solution(solution: &Solution, status: Option<SolverStatus>) -> Self {
        let instance = InstanceDto::from_instance(&solution.instance);
        let optimal = solution.is_optimal();

        let sites = instance
            .sites
            .into_iter()
            .map(|mut site| {
                if optimal {
                    site.open = Some(solution.is_open(site.id));
                    site.volume = solution.site_volumes.get(site.id).copied();
                }
                site
            })
            .collect();
        let customers = instance
            .customers
            .into_iter()
            .map(|mut customer| {
                if optimal {
                    customer.volume = solution.customer_volumes.get(customer.id).copied();
                }
                customer
            })
            .collect();
        let flows = solution
            .flows
            .values()
            .map(|flow| FlowDto {
                site_id: flow.site_id,
                customer_id: flow.customer_id,
                units: flow.units,
                from_lat: flow.from.lat,
                from_lon: flow.from.lon,
                to_lat: flow.to.lat,
                to_lon: flow.to.lon,
            })
            .collect();

        Self {
            name: instance.name,
            solver_status: status.map(|s| s.as_str().to_string()),
            status: Some(solution.status.as_str().to_string()),
            message: Some(solution.message.clone()),
            objective_value: optimal.then_some(solution.objective_value),
            solve_time_seconds: Some(solution.solve_time_seconds),
            costs: optimal.then(|| CostsDto {
                fixed: solution.fixed_costs,
                variable: solution.variable_costs,
                total: solution.total_costs(),
            }),
            sites,
            customers,
            flows,
        }
    }
}
