//! Domain model for the capacitated facility location problem.
//!
//! # Overview
//!
//! - [`GeoPoint`]: latitude/longitude pair with great-circle distance
//! - [`Customer`]: demand point with a fixed demand
//! - [`Site`]: candidate facility with capacity and fixed opening cost
//! - [`ProblemInstance`]: validated, immutable set of customers and sites
//! - [`Solution`]: outcome of one solve attempt with its cost breakdown
//!
//! # Design
//!
//! Customer and site ids equal their position in the instance lists. The
//! formulation and the extractor index by position, so
//! [`ProblemInstance::new`] refuses anything else.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Earth radius in kilometers used for distance calculation.
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// Overshoot of the cosine-law value past ±1 that is treated as rounding noise.
const COSINE_TOLERANCE: f64 = 0.01;

/// A geographic point in degrees.
///
/// # Examples
///
/// ```
/// use facility_location::domain::GeoPoint;
///
/// let chicago = GeoPoint::new(41.8781, -87.6298);
/// let milwaukee = GeoPoint::new(43.0389, -87.9065);
///
/// // Roughly 130 km apart
/// let km = chicago.distance_km(&milwaukee).unwrap();
/// assert!(km > 120.0 && km < 140.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in degrees (-180 to 180).
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new point. Range checks happen in [`GeoPoint::is_valid`].
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both coordinates are inside their degree ranges.
    ///
    /// ```
    /// use facility_location::domain::GeoPoint;
    ///
    /// assert!(GeoPoint::new(90.0, -180.0).is_valid());
    /// assert!(!GeoPoint::new(91.0, 0.0).is_valid());
    /// assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in kilometers using the spherical law of cosines.
    ///
    /// Identical points short-circuit to exactly `0.0`. Cosine values that
    /// overshoot `[-1, 1]` by at most `0.01` are clamped; anything further out
    /// (including NaN) is a [`Error::DistanceDomain`].
    ///
    /// # Examples
    ///
    /// ```
    /// use facility_location::domain::GeoPoint;
    ///
    /// let a = GeoPoint::new(0.0, 0.0);
    /// let b = GeoPoint::new(0.0, 1.0);
    ///
    /// // One degree of longitude at the equator
    /// let km = a.distance_km(&b).unwrap();
    /// assert!((km - 111.3).abs() < 0.1);
    /// assert_eq!(a.distance_km(&a).unwrap(), 0.0);
    /// ```
    pub fn distance_km(&self, other: &GeoPoint) -> Result<f64> {
        if self.lat == other.lat && self.lon == other.lon {
            return Ok(0.0);
        }

        let lat_a = self.lat.to_radians();
        let lat_b = other.lat.to_radians();
        let delta_lon = (other.lon.to_radians() - self.lon.to_radians()).abs();

        let v = lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * delta_lon.cos();
        let cosine = clamp_cosine(v).ok_or(Error::DistanceDomain {
            from: *self,
            to: *other,
            value: v,
        })?;

        Ok(EARTH_RADIUS_KM * cosine.acos())
    }
}

/// Snaps a cosine within `COSINE_TOLERANCE` outside `[-1, 1]` back onto the
/// boundary. Anything further out, or NaN, has no arc cosine.
fn clamp_cosine(v: f64) -> Option<f64> {
    if (-1.0..=1.0).contains(&v) {
        Some(v)
    } else if v > 1.0 && v <= 1.0 + COSINE_TOLERANCE {
        Some(1.0)
    } else if v < -1.0 && v >= -1.0 - COSINE_TOLERANCE {
        Some(-1.0)
    } else {
        None
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// A demand point.
///
/// # Examples
///
/// ```
/// use facility_location::domain::{Customer, GeoPoint};
///
/// let customer = Customer::new(0, "Denver", GeoPoint::new(39.7392, -104.9903))
///     .with_demand(42.0);
///
/// assert_eq!(customer.demand, 42.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Position in [`ProblemInstance::customers`].
    pub id: usize,
    /// Label of the reference point this customer was drawn from.
    pub name: String,
    /// Where the customer is.
    pub location: GeoPoint,
    /// Units that must be delivered.
    pub demand: f64,
}

impl Customer {
    /// Creates a customer with zero demand.
    pub fn new(id: usize, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            demand: 0.0,
        }
    }

    /// Sets the demand.
    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand = demand;
        self
    }
}

/// A candidate facility site.
///
/// # Examples
///
/// ```
/// use facility_location::domain::{GeoPoint, Site};
///
/// let site = Site::new(0, "Omaha", GeoPoint::new(41.2565, -95.9345))
///     .with_capacity(2_500.0)
///     .with_fixed_cost(4_000_000.0);
///
/// assert_eq!(site.capacity, 2_500.0);
/// assert_eq!(site.fixed_cost, 4_000_000.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Position in [`ProblemInstance::sites`].
    pub id: usize,
    /// Label of the reference point this site was drawn from.
    pub name: String,
    /// Where the site is.
    pub location: GeoPoint,
    /// Maximum total outflow.
    pub capacity: f64,
    /// Cost incurred once if the site is opened.
    pub fixed_cost: f64,
}

impl Site {
    /// Creates a site with zero capacity and zero fixed cost.
    pub fn new(id: usize, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            capacity: 0.0,
            fixed_cost: 0.0,
        }
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the fixed opening cost.
    pub fn with_fixed_cost(mut self, fixed_cost: f64) -> Self {
        self.fixed_cost = fixed_cost;
        self
    }
}

/// An immutable facility location instance.
///
/// # Examples
///
/// ```
/// use facility_location::domain::{Customer, GeoPoint, ProblemInstance, Site};
///
/// let p = GeoPoint::new(40.0, -100.0);
/// let instance = ProblemInstance::new(
///     "tiny",
///     vec![Customer::new(0, "c0", p).with_demand(10.0)],
///     vec![Site::new(0, "s0", p).with_capacity(100.0).with_fixed_cost(1000.0)],
///     1.0,
/// )
/// .unwrap();
///
/// assert_eq!(instance.total_demand(), 10.0);
/// assert!(instance.is_capacity_sufficient());
///
/// // Ids must match list positions
/// let err = ProblemInstance::new("bad", vec![Customer::new(3, "c", p)], vec![], 1.0);
/// assert!(err.is_err());
/// ```
#[derive(Clone, Debug)]
pub struct ProblemInstance {
    /// Display name (preset name or caller supplied).
    pub name: String,
    customers: Vec<Customer>,
    sites: Vec<Site>,
    shipping_cost_per_unit_distance: f64,
}

impl ProblemInstance {
    /// Validates and builds an instance.
    pub fn new(
        name: impl Into<String>,
        customers: Vec<Customer>,
        sites: Vec<Site>,
        shipping_cost_per_unit_distance: f64,
    ) -> Result<Self> {
        if !(shipping_cost_per_unit_distance.is_finite() && shipping_cost_per_unit_distance >= 0.0) {
            return Err(Error::InvalidInstance(format!(
                "shipping cost per unit distance must be finite and non-negative, got {}",
                shipping_cost_per_unit_distance
            )));
        }

        for (position, customer) in customers.iter().enumerate() {
            if customer.id != position {
                return Err(Error::InvalidInstance(format!(
                    "customer at position {} has id {}",
                    position, customer.id
                )));
            }
            check_location("customer", position, &customer.location)?;
            check_quantity("customer", position, "demand", customer.demand)?;
        }

        for (position, site) in sites.iter().enumerate() {
            if site.id != position {
                return Err(Error::InvalidInstance(format!(
                    "site at position {} has id {}",
                    position, site.id
                )));
            }
            check_location("site", position, &site.location)?;
            check_quantity("site", position, "capacity", site.capacity)?;
            check_quantity("site", position, "fixed cost", site.fixed_cost)?;
        }

        Ok(Self {
            name: name.into(),
            customers,
            sites,
            shipping_cost_per_unit_distance,
        })
    }

    /// Customers ordered by id.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Sites ordered by id.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Cost of shipping one unit over one kilometer.
    pub fn shipping_cost_per_unit_distance(&self) -> f64 {
        self.shipping_cost_per_unit_distance
    }

    /// Sum of all customer demands.
    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(|c| c.demand).sum()
    }

    /// Sum of all site capacities.
    pub fn total_capacity(&self) -> f64 {
        self.sites.iter().map(|s| s.capacity).sum()
    }

    /// Returns false when demand exceeds capacity, i.e. no plan can exist.
    pub fn is_capacity_sufficient(&self) -> bool {
        self.total_demand() <= self.total_capacity()
    }

    /// Cost of shipping one unit from `site` to `customer`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn shipping_cost(&self, site: usize, customer: usize) -> Result<f64> {
        let km = self.sites[site]
            .location
            .distance_km(&self.customers[customer].location)?;
        Ok(self.shipping_cost_per_unit_distance * km)
    }
}

fn check_location(kind: &str, position: usize, location: &GeoPoint) -> Result<()> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidInstance(format!(
            "{} {} has out-of-range coordinates {}",
            kind, position, location
        )))
    }
}

fn check_quantity(kind: &str, position: usize, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInstance(format!(
            "{} {} has invalid {} {}",
            kind, position, field, value
        )))
    }
}

/// Outcome of a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal; flows and costs are populated.
    Optimal,
    /// No plan satisfies demand within capacity.
    Infeasible,
    /// Timeout, numerical trouble or any other termination.
    NotSolved,
}

impl SolveStatus {
    /// Returns the status as a SCREAMING_SNAKE_CASE string for API responses.
    ///
    /// ```
    /// use facility_location::domain::SolveStatus;
    ///
    /// assert_eq!(SolveStatus::Optimal.as_str(), "OPTIMAL");
    /// assert_eq!(SolveStatus::NotSolved.as_str(), "NOT_SOLVED");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::NotSolved => "NOT_SOLVED",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units shipped from one site to one customer.
///
/// Both endpoint coordinates are copied in so map layers can draw the
/// flow without joining back against the instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Shipping site.
    pub site_id: usize,
    /// Receiving customer.
    pub customer_id: usize,
    /// Units shipped.
    pub units: f64,
    /// Site location.
    pub from: GeoPoint,
    /// Customer location.
    pub to: GeoPoint,
}

/// Result of one solve attempt.
///
/// Non-optimal outcomes carry no open sites, no flows and zero costs; the
/// reason is in `message`.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The instance that was solved.
    pub instance: Arc<ProblemInstance>,
    /// Solver outcome.
    pub status: SolveStatus,
    /// Human-readable description of the outcome.
    pub message: String,
    /// Objective value reported by the solver.
    pub objective_value: f64,
    /// Wall-clock time from formulation to extraction.
    pub solve_time_seconds: f64,
    /// Ids of opened sites.
    pub open_sites: BTreeSet<usize>,
    /// Non-zero flows keyed by `(site_id, customer_id)`.
    pub flows: BTreeMap<(usize, usize), Flow>,
    /// Sum of fixed costs of opened sites.
    pub fixed_costs: f64,
    /// Sum of shipping costs over all flows.
    pub variable_costs: f64,
    /// Total outflow per site, indexed by site id.
    pub site_volumes: Vec<f64>,
    /// Total inflow per customer, indexed by customer id.
    pub customer_volumes: Vec<f64>,
}

impl Solution {
    /// Builds a solution for an outcome that produced no usable plan.
    pub fn without_plan(
        instance: Arc<ProblemInstance>,
        status: SolveStatus,
        message: impl Into<String>,
        solve_time_seconds: f64,
    ) -> Self {
        let site_volumes = vec![0.0; instance.sites().len()];
        let customer_volumes = vec![0.0; instance.customers().len()];
        Self {
            instance,
            status,
            message: message.into(),
            objective_value: 0.0,
            solve_time_seconds,
            open_sites: BTreeSet::new(),
            flows: BTreeMap::new(),
            fixed_costs: 0.0,
            variable_costs: 0.0,
            site_volumes,
            customer_volumes,
        }
    }

    /// Returns true if the solver proved optimality.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Fixed plus variable costs.
    pub fn total_costs(&self) -> f64 {
        self.fixed_costs + self.variable_costs
    }

    /// Returns true if `site` was opened.
    pub fn is_open(&self, site: usize) -> bool {
        self.open_sites.contains(&site)
    }

    /// Units shipped from `site` to `customer`, zero if there is no flow.
    pub fn flow_units(&self, site: usize, customer: usize) -> f64 {
        self.flows.get(&(site, customer)).map_or(0.0, |flow| flow.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in point(), b in point()) {
            prop_assert_eq!(a.distance_km(&b).unwrap(), b.distance_km(&a).unwrap());
        }

        #[test]
        fn distance_to_self_is_zero(a in point()) {
            prop_assert_eq!(a.distance_km(&a).unwrap(), 0.0);
        }

        #[test]
        fn distance_is_finite_and_bounded(a in point(), b in point()) {
            let km = a.distance_km(&b).unwrap();
            prop_assert!(km.is_finite());
            prop_assert!(km >= 0.0);
            prop_assert!(km <= EARTH_RADIUS_KM * std::f64::consts::PI + 1e-6);
        }
    }

    #[test]
    fn test_antipodal_points() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let km = a.distance_km(&b).unwrap();
        assert!((km - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);

        let north = GeoPoint::new(90.0, 0.0);
        let south = GeoPoint::new(-90.0, 0.0);
        assert!(north.distance_km(&south).unwrap().is_finite());
    }

    #[test]
    fn test_nearly_identical_points() {
        let a = GeoPoint::new(45.0, 7.0);
        let b = GeoPoint::new(45.0, 7.0 + 1e-12);
        let km = a.distance_km(&b).unwrap();
        assert!(km >= 0.0 && km < 1e-3);
    }

    #[test]
    fn test_clamp_cosine_tolerance_band() {
        assert_eq!(clamp_cosine(0.5), Some(0.5));
        assert_eq!(clamp_cosine(1.0), Some(1.0));
        assert_eq!(clamp_cosine(1.005), Some(1.0));
        assert_eq!(clamp_cosine(1.01), Some(1.0));
        assert_eq!(clamp_cosine(1.02), None);
        assert_eq!(clamp_cosine(-1.005), Some(-1.0));
        assert_eq!(clamp_cosine(-1.01), Some(-1.0));
        assert_eq!(clamp_cosine(-1.02), None);
        assert_eq!(clamp_cosine(f64::NAN), None);
    }

    #[test]
    fn test_nan_coordinates_are_a_domain_error() {
        let a = GeoPoint::new(f64::NAN, 0.0);
        let b = GeoPoint::new(10.0, 10.0);
        assert!(matches!(a.distance_km(&b), Err(Error::DistanceDomain { .. })));
    }

    #[test]
    fn test_instance_rejects_bad_data() {
        let p = GeoPoint::new(10.0, 10.0);

        let site_ids = ProblemInstance::new(
            "x",
            vec![],
            vec![Site::new(1, "s", p)],
            1.0,
        );
        assert!(matches!(site_ids, Err(Error::InvalidInstance(_))));

        let negative_demand = ProblemInstance::new(
            "x",
            vec![Customer::new(0, "c", p).with_demand(-1.0)],
            vec![],
            1.0,
        );
        assert!(matches!(negative_demand, Err(Error::InvalidInstance(_))));

        let bad_point = ProblemInstance::new(
            "x",
            vec![Customer::new(0, "c", GeoPoint::new(120.0, 0.0))],
            vec![],
            1.0,
        );
        assert!(matches!(bad_point, Err(Error::InvalidInstance(_))));

        let bad_cost = ProblemInstance::new("x", vec![], vec![], -0.5);
        assert!(matches!(bad_cost, Err(Error::InvalidInstance(_))));
    }

    #[test]
    fn test_totals_and_shipping_cost() {
        let instance = ProblemInstance::new(
            "x",
            vec![
                Customer::new(0, "a", GeoPoint::new(0.0, 0.0)).with_demand(3.0),
                Customer::new(1, "b", GeoPoint::new(0.0, 1.0)).with_demand(4.0),
            ],
            vec![Site::new(0, "s", GeoPoint::new(0.0, 0.0)).with_capacity(5.0)],
            2.0,
        )
        .unwrap();

        assert_eq!(instance.total_demand(), 7.0);
        assert_eq!(instance.total_capacity(), 5.0);
        assert!(!instance.is_capacity_sufficient());
        assert_eq!(instance.shipping_cost(0, 0).unwrap(), 0.0);

        let km = GeoPoint::new(0.0, 0.0)
            .distance_km(&GeoPoint::new(0.0, 1.0))
            .unwrap();
        assert!((instance.shipping_cost(0, 1).unwrap() - 2.0 * km).abs() < 1e-9);
    }

    #[test]
    fn test_solution_without_plan() {
        let instance = Arc::new(
            ProblemInstance::new(
                "x",
                vec![Customer::new(0, "c", GeoPoint::new(0.0, 0.0)).with_demand(1.0)],
                vec![],
                1.0,
            )
            .unwrap(),
        );
        let solution = Solution::without_plan(instance, SolveStatus::Infeasible, "nope", 0.0);
        assert!(!solution.is_optimal());
        assert!(solution.open_sites.is_empty());
        assert_eq!(solution.total_costs(), 0.0);
        assert_eq!(solution.customer_volumes, vec![0.0]);
        assert_eq!(solution.flow_units(0, 0), 0.0);
    }
}
