//! Error taxonomy for the facility location pipeline.
//!
//! Only input and programming errors live here. Solver outcomes such as an
//! infeasible instance or a timeout are reported through
//! [`SolveStatus`](crate::domain::SolveStatus) on the returned solution.

use thiserror::Error;

use crate::domain::GeoPoint;

/// Errors raised by generation, formulation and extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The spherical law of cosines produced a value outside `[-1, 1]`
    /// beyond the rounding tolerance, which means the coordinates are bad.
    #[error("distance between {from} and {to} is undefined (cosine value {value})")]
    DistanceDomain {
        /// First endpoint.
        from: GeoPoint,
        /// Second endpoint.
        to: GeoPoint,
        /// The offending cosine-law value.
        value: f64,
    },

    /// More distinct reference points were requested than the source holds.
    #[error("requested {requested} distinct locations but only {available} are available")]
    InsufficientLocations {
        /// Number of points requested.
        requested: usize,
        /// Number of distinct points the source can supply.
        available: usize,
    },

    /// Generator parameters were rejected before any sampling happened.
    #[error("invalid generator parameters: {0}")]
    InvalidParameters(String),

    /// A problem instance violated one of its structural invariants.
    #[error("invalid problem instance: {0}")]
    InvalidInstance(String),

    /// The extracted cost breakdown disagrees with the solver's objective.
    #[error("objective {objective} does not match recomputed cost {recomputed}")]
    ObjectiveMismatch {
        /// Objective value reported by the solver.
        objective: f64,
        /// `fixed_costs + variable_costs` after extraction.
        recomputed: f64,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = Error::InsufficientLocations {
            requested: 12,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "requested 12 distinct locations but only 10 are available"
        );

        let err = Error::DistanceDomain {
            from: GeoPoint::new(0.0, 0.0),
            to: GeoPoint::new(f64::NAN, 0.0),
            value: f64::NAN,
        };
        assert!(err.to_string().starts_with("distance between (0.0000, 0.0000)"));
    }
}
