//! Named, seeded generator presets.
//!
//! - `small`: 10 customers, 3 sites, solves in well under a second
//! - `default`: the interactive app's initial settings (50 customers, 5 sites)
//! - `tight`: 40 customers, 8 sites with a constant fixed cost and little slack
//! - `infeasible`: demand always exceeds capacity

use crate::domain::ProblemInstance;
use crate::error::Result;
use crate::generator::{cost_per_mile_to_km, GeneratorConfig, InstanceGenerator, IntRange};

const DATASETS: &[&str] = &["small", "default", "tight", "infeasible"];

/// Returns the names of the available presets.
///
/// ```
/// use facility_location::demo_data::available_datasets;
///
/// assert!(available_datasets().contains(&"default"));
/// ```
pub fn available_datasets() -> &'static [&'static str] {
    DATASETS
}

/// Looks up a preset's generator configuration (case-insensitive).
pub fn config_by_name(name: &str) -> Option<GeneratorConfig> {
    let config = match name.to_lowercase().as_str() {
        "small" => GeneratorConfig {
            n_customers: 10,
            demand_range: IntRange::new(20, 80),
            n_sites: 3,
            capacity_range: IntRange::new(300, 600),
            fixed_cost_range: IntRange::new(100_000, 200_000),
            shipping_cost_per_unit_distance: cost_per_mile_to_km(1.0),
            seed: Some(7),
        },
        "default" => GeneratorConfig::default().with_seed(42),
        "tight" => GeneratorConfig {
            n_customers: 40,
            demand_range: IntRange::new(20, 80),
            n_sites: 8,
            capacity_range: IntRange::new(300, 700),
            fixed_cost_range: IntRange::new(1_000_000, 1_000_000),
            shipping_cost_per_unit_distance: cost_per_mile_to_km(0.5),
            seed: Some(11),
        },
        "infeasible" => GeneratorConfig {
            n_customers: 30,
            demand_range: IntRange::new(50, 100),
            n_sites: 2,
            capacity_range: IntRange::new(100, 200),
            fixed_cost_range: IntRange::new(1_000, 2_000),
            shipping_cost_per_unit_distance: cost_per_mile_to_km(0.1),
            seed: Some(13),
        },
        _ => return None,
    };
    Some(config)
}

/// Generates a preset instance from the built-in US city table.
///
/// Returns `None` for an unknown name.
///
/// ```
/// use facility_location::demo_data::generate_by_name;
///
/// let instance = generate_by_name("small").unwrap().unwrap();
/// assert_eq!(instance.customers().len(), 10);
/// assert!(generate_by_name("atlantis").is_none());
/// ```
pub fn generate_by_name(name: &str) -> Option<Result<ProblemInstance>> {
    let config = config_by_name(name)?;
    Some(InstanceGenerator::us_cities().generate(&name.to_lowercase(), &config))
}
