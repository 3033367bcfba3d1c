//! Capacitated Facility Location
//!
//! Chooses which candidate sites to open and how much each open site ships
//! to each customer so that fixed plus shipping costs are minimal, every
//! customer's demand is met and no site exceeds its capacity. The problem is
//! formulated as a mixed-integer linear program and solved with HiGHS.
//!
//! # Pipeline
//!
//! [`InstanceGenerator`](generator::InstanceGenerator) →
//! [`ProblemInstance`](domain::ProblemInstance) →
//! [`Model`](model::Model) →
//! [`SolverBackend`](solver::SolverBackend) →
//! [`extract`](extract::extract) →
//! [`Solution`](domain::Solution)
//!
//! [`solve_instance`](solver::solve_instance) runs the whole chain.
//!
//! # Model
//!
//! - `open[i]` (binary): site `i` is opened, paying its fixed cost
//! - `flow[i][j]` (continuous, ≥ 0): units shipped from site `i` to customer `j`
//! - **Demand**: each customer receives at least its demand
//! - **Capacity**: a site ships nothing unless open, and never more than its capacity
//! - **Objective**: fixed costs of open sites plus shipping cost times units

pub mod api;
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod extract;
pub mod generator;
pub mod locations;
pub mod model;
pub mod solver;
