//! Random instance generation.
//!
//! Integer quantities are drawn uniformly from half-open ranges `[min, max)`.
//! A fixed-cost range with `min == max` is a constant instead of a draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Customer, ProblemInstance, Site};
use crate::error::{Error, Result};
use crate::locations::{LocationSource, ReferenceTable};

/// Kilometers per statute mile.
pub const KM_PER_MILE: f64 = 1.609344;

/// Converts a per-unit-mile shipping cost into a per-unit-kilometer one.
///
/// ```
/// use facility_location::generator::cost_per_mile_to_km;
///
/// assert!((cost_per_mile_to_km(1.609344) - 1.0).abs() < 1e-12);
/// ```
pub fn cost_per_mile_to_km(cost_per_mile: f64) -> f64 {
    cost_per_mile / KM_PER_MILE
}

/// An integer range, half-open when drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IntRange {
    /// Inclusive lower bound.
    pub min: u64,
    /// Exclusive upper bound.
    pub max: u64,
}

impl IntRange {
    /// Creates a range.
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Returns true if the range collapses to a single value.
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        rng.gen_range(self.min..self.max) as f64
    }
}

/// Parameters accepted by [`InstanceGenerator::generate`].
///
/// The default matches the interactive app's initial settings; missing JSON
/// fields fall back to it.
///
/// ```
/// use facility_location::generator::GeneratorConfig;
///
/// let config = GeneratorConfig::default();
/// assert_eq!(config.n_customers, 50);
/// assert_eq!(config.n_sites, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Number of customers.
    pub n_customers: usize,
    /// Customer demand range.
    pub demand_range: IntRange,
    /// Number of candidate sites.
    pub n_sites: usize,
    /// Site capacity range.
    pub capacity_range: IntRange,
    /// Site fixed cost range; `min == max` means a constant.
    pub fixed_cost_range: IntRange,
    /// Cost of shipping one unit one kilometer.
    pub shipping_cost_per_unit_distance: f64,
    /// Seed for reproducible instances; OS entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_customers: 50,
            demand_range: IntRange::new(20, 80),
            n_sites: 5,
            capacity_range: IntRange::new(1_000, 4_000),
            fixed_cost_range: IntRange::new(4_000_000, 6_000_000),
            shipping_cost_per_unit_distance: cost_per_mile_to_km(0.1),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects empty counts and ranges that cannot be drawn from.
    pub fn validate(&self) -> Result<()> {
        if self.n_customers == 0 {
            return Err(Error::InvalidParameters(
                "number of customers must be positive".to_string(),
            ));
        }
        if self.n_sites == 0 {
            return Err(Error::InvalidParameters(
                "number of sites must be positive".to_string(),
            ));
        }
        check_drawable("demand", self.demand_range)?;
        check_drawable("capacity", self.capacity_range)?;
        if self.fixed_cost_range.min > self.fixed_cost_range.max {
            return Err(Error::InvalidParameters(format!(
                "fixed cost range [{}, {}) is reversed",
                self.fixed_cost_range.min, self.fixed_cost_range.max
            )));
        }
        if !(self.shipping_cost_per_unit_distance.is_finite()
            && self.shipping_cost_per_unit_distance >= 0.0)
        {
            return Err(Error::InvalidParameters(format!(
                "shipping cost must be finite and non-negative, got {}",
                self.shipping_cost_per_unit_distance
            )));
        }
        Ok(())
    }
}

fn check_drawable(what: &str, range: IntRange) -> Result<()> {
    if range.min < range.max {
        Ok(())
    } else {
        Err(Error::InvalidParameters(format!(
            "{} range [{}, {}) is empty",
            what, range.min, range.max
        )))
    }
}

/// Draws random instances from a [`LocationSource`].
///
/// # Examples
///
/// ```
/// use facility_location::generator::{GeneratorConfig, InstanceGenerator};
///
/// let generator = InstanceGenerator::us_cities();
/// let config = GeneratorConfig::default().with_seed(1);
///
/// let instance = generator.generate("demo", &config).unwrap();
/// assert_eq!(instance.customers().len(), 50);
/// assert_eq!(instance.sites().len(), 5);
///
/// // Same seed, same instance
/// let again = generator.generate("demo", &config).unwrap();
/// assert_eq!(instance.customers(), again.customers());
/// ```
pub struct InstanceGenerator<S = ReferenceTable> {
    source: S,
}

impl InstanceGenerator<ReferenceTable> {
    /// A generator backed by the built-in US city table.
    pub fn us_cities() -> Self {
        Self::new(ReferenceTable::us_cities())
    }
}

impl<S: LocationSource> InstanceGenerator<S> {
    /// Creates a generator over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Generates a validated instance.
    ///
    /// Customers and sites are sampled independently, so the source needs at
    /// least `max(n_customers, n_sites)` distinct points.
    pub fn generate(&self, name: &str, config: &GeneratorConfig) -> Result<ProblemInstance> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let customers: Vec<Customer> = self
            .source
            .sample(config.n_customers, &mut rng)?
            .into_iter()
            .enumerate()
            .map(|(id, point)| {
                Customer::new(id, point.name, point.location)
                    .with_demand(config.demand_range.draw(&mut rng))
            })
            .collect();

        let sites: Vec<Site> = self
            .source
            .sample(config.n_sites, &mut rng)?
            .into_iter()
            .enumerate()
            .map(|(id, point)| {
                let fixed_cost = if config.fixed_cost_range.is_constant() {
                    config.fixed_cost_range.min as f64
                } else {
                    config.fixed_cost_range.draw(&mut rng)
                };
                Site::new(id, point.name, point.location)
                    .with_capacity(config.capacity_range.draw(&mut rng))
                    .with_fixed_cost(fixed_cost)
            })
            .collect();

        let instance = ProblemInstance::new(
            name,
            customers,
            sites,
            config.shipping_cost_per_unit_distance,
        )?;

        info!(
            name = %instance.name,
            customers = instance.customers().len(),
            sites = instance.sites().len(),
            total_demand = instance.total_demand(),
            total_capacity = instance.total_capacity(),
            "Generated instance"
        );

        Ok(instance)
    }
}
