//! Solver integration for the facility location model.
//!
//! - [`SolverBackend`]: the boundary to a MILP engine, [`HighsBackend`] the
//!   default implementation
//! - [`solve_instance`]: pre-check, formulate, solve, extract
//! - [`SolverService`]: background solve jobs for the REST API

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::console;
use crate::domain::{ProblemInstance, Solution, SolveStatus};
use crate::error::Result;
use crate::extract::{extract, SolveMetadata};
use crate::model::{precheck, Model, Sense, VarKind};

/// Default solving time: 120 seconds.
const DEFAULT_TIME_LIMIT_SECS: u64 = 120;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget handed to the backend.
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(DEFAULT_TIME_LIMIT_SECS),
        }
    }
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Default configuration with a time limit given in seconds.
    ///
    /// Returns `None` unless `secs` is positive and fits a [`Duration`].
    ///
    /// ```
    /// use facility_location::solver::SolverConfig;
    /// use std::time::Duration;
    ///
    /// let config = SolverConfig::with_time_limit_secs(2.5).unwrap();
    /// assert_eq!(config.time_limit, Duration::from_millis(2500));
    /// assert!(SolverConfig::with_time_limit_secs(1e20).is_none());
    /// ```
    pub fn with_time_limit_secs(secs: f64) -> Option<Self> {
        if secs <= 0.0 {
            return None;
        }
        let time_limit = Duration::try_from_secs_f64(secs).ok()?;
        Some(Self::default().with_time_limit(time_limit))
    }
}

/// What a backend reports after a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResult {
    /// Outcome mapped onto the crate's three-way status.
    pub status: SolveStatus,
    /// Objective value; NaN when not optimal.
    pub objective: f64,
    /// One value per [`Model::variables`] entry; zeros when not optimal.
    pub values: Vec<f64>,
}

impl BackendResult {
    /// A result carrying no assignment.
    pub fn without_values(status: SolveStatus, n_variables: usize) -> Self {
        Self {
            status,
            objective: f64::NAN,
            values: vec![0.0; n_variables],
        }
    }
}

/// A MILP engine able to solve a [`Model`] within a time limit.
///
/// Timeouts and numerical failures must come back as
/// [`SolveStatus::NotSolved`], never as a hang or a panic.
pub trait SolverBackend: Send + Sync {
    /// Engine name for logs and the info endpoint.
    fn name(&self) -> &'static str;

    /// Solves `model`, giving up after `time_limit`.
    fn solve(&self, model: &Model, time_limit: Duration) -> BackendResult;
}

/// [`SolverBackend`] on top of the HiGHS MIP solver.
#[derive(Debug, Clone, Default)]
pub struct HighsBackend {
    /// Let HiGHS write its own progress log to stdout.
    pub verbose: bool,
}

impl SolverBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "HiGHS"
    }

    fn solve(&self, model: &Model, time_limit: Duration) -> BackendResult {
        let mut problem = RowProblem::new();

        let cols: Vec<Col> = model
            .variables()
            .iter()
            .map(|var| match var.kind {
                VarKind::Binary => problem.add_integer_column(var.objective, var.lower..=var.upper),
                VarKind::Continuous => problem.add_column(var.objective, var.lower..=var.upper),
            })
            .collect();

        for row in model.constraints() {
            let terms: Vec<(Col, f64)> = row
                .terms
                .iter()
                .map(|&(var, coef)| (cols[var.0], coef))
                .collect();
            match row.sense {
                Sense::LessEqual => {
                    problem.add_row(..=row.rhs, terms);
                }
                Sense::GreaterEqual => {
                    problem.add_row(row.rhs.., terms);
                }
            }
        }

        let mut highs = problem.optimise(HighsSense::Minimise);
        highs.set_option("time_limit", time_limit.as_secs_f64());
        if !self.verbose {
            highs.make_quiet();
        }

        let solved = highs.solve();
        let native = solved.status();
        let status = map_status(native);

        if status != SolveStatus::Optimal {
            warn!(native_status = ?native, "HiGHS finished without an optimal solution");
            return BackendResult::without_values(status, cols.len());
        }

        let solution = solved.get_solution();
        BackendResult {
            status,
            objective: solved.objective_value(),
            values: cols.iter().map(|&col| solution[col]).collect(),
        }
    }
}

/// Maps a native HiGHS status onto [`SolveStatus`].
fn map_status(status: HighsModelStatus) -> SolveStatus {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolveStatus::Optimal,
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            SolveStatus::Infeasible
        }
        _ => SolveStatus::NotSolved,
    }
}

/// Runs the whole pipeline for one instance.
///
/// Infeasible and unsolved outcomes are returned as a [`Solution`] with the
/// matching status. Instances whose demand exceeds capacity never reach the
/// backend. Only a distance computation failure is an `Err`.
///
/// # Examples
///
/// ```
/// use facility_location::domain::{Customer, GeoPoint, ProblemInstance, Site, SolveStatus};
/// use facility_location::solver::{solve_instance, HighsBackend, SolverConfig};
/// use std::sync::Arc;
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
/// let solution =
///     solve_instance(Arc::new(instance), &HighsBackend::default(), &SolverConfig::default()).unwrap();
/// assert_eq!(solution.status, SolveStatus::Infeasible);
/// assert_eq!(solution.message, "Total demand (10) exceeds total capacity (5)");
/// ```
pub fn solve_instance(
    instance: Arc<ProblemInstance>,
    backend: &dyn SolverBackend,
    config: &SolverConfig,
) -> Result<Solution> {
    let start = Instant::now();

    if let Some(message) = precheck(&instance) {
        warn!(name = %instance.name, %message, "Instance infeasible by construction, solver skipped");
        return Ok(Solution::without_plan(
            instance,
            SolveStatus::Infeasible,
            message,
            start.elapsed().as_secs_f64(),
        ));
    }

    let model = Model::formulate(&instance)?;

    info!(
        name = %instance.name,
        backend = backend.name(),
        variables = model.variables().len(),
        constraints = model.constraints().len(),
        time_limit_secs = config.time_limit.as_secs_f64(),
        "Solving model"
    );

    let result = backend.solve(&model, config.time_limit);
    let metadata = SolveMetadata {
        objective_value: result.objective,
        solve_time_seconds: start.elapsed().as_secs_f64(),
    };
    let solution = extract(instance, &model, result.status, &result.values, &metadata);

    if solution.is_optimal() {
        info!(
            objective = solution.objective_value,
            fixed_costs = solution.fixed_costs,
            variable_costs = solution.variable_costs,
            open_sites = solution.open_sites.len(),
            flows = solution.flows.len(),
            duration_secs = solution.solve_time_seconds,
            "Model optimal"
        );
    } else {
        warn!(
            status = %solution.status,
            duration_secs = solution.solve_time_seconds,
            message = %solution.message,
            "No usable solution"
        );
    }

    Ok(solution)
}

/// Status of a solving job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    /// Not currently solving.
    NotSolving,
    /// Actively solving.
    Solving,
}

impl SolverStatus {
    /// Returns the status as a SCREAMING_SNAKE_CASE string for API responses.
    ///
    /// ```
    /// use facility_location::solver::SolverStatus;
    ///
    /// assert_eq!(SolverStatus::NotSolving.as_str(), "NOT_SOLVING");
    /// assert_eq!(SolverStatus::Solving.as_str(), "SOLVING");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::NotSolving => "NOT_SOLVING",
            SolverStatus::Solving => "SOLVING",
        }
    }
}

/// A solving job with its current state.
pub struct SolveJob {
    /// Unique job identifier.
    pub id: String,
    /// Current status.
    pub status: SolverStatus,
    /// Instance being solved.
    pub instance: Arc<ProblemInstance>,
    /// Solver configuration.
    pub config: SolverConfig,
    /// Outcome, once solving finished.
    pub solution: Option<Solution>,
    /// Pipeline error, if solving failed outright.
    pub error: Option<String>,
}

impl SolveJob {
    /// Creates a job that has not started yet.
    pub fn new(id: String, instance: Arc<ProblemInstance>, config: SolverConfig) -> Self {
        Self {
            id,
            status: SolverStatus::NotSolving,
            instance,
            config,
            solution: None,
            error: None,
        }
    }
}

/// Manages facility location solving jobs.
///
/// Solves are serialized through a single lock because the backend is not
/// assumed to be reentrant.
///
/// # Examples
///
/// ```
/// use facility_location::demo_data::generate_by_name;
/// use facility_location::solver::{SolverConfig, SolverService, SolverStatus};
/// use std::sync::Arc;
///
/// let service = SolverService::new();
/// let instance = generate_by_name("small").unwrap().unwrap();
///
/// // Create a job (doesn't start solving yet)
/// let job = service.create_job("test-1".to_string(), Arc::new(instance), SolverConfig::default());
/// assert_eq!(job.read().status, SolverStatus::NotSolving);
/// assert_eq!(service.list_jobs(), vec!["test-1".to_string()]);
/// ```
pub struct SolverService {
    jobs: RwLock<HashMap<String, Arc<RwLock<SolveJob>>>>,
    backend: Arc<dyn SolverBackend>,
    solve_lock: Arc<Mutex<()>>,
}

impl SolverService {
    /// Creates a service backed by HiGHS.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(HighsBackend::default()))
    }

    /// Creates a service backed by `backend`.
    pub fn with_backend(backend: Arc<dyn SolverBackend>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            backend,
            solve_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Name of the backend engine.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Creates a new job for `instance`.
    pub fn create_job(
        &self,
        id: String,
        instance: Arc<ProblemInstance>,
        config: SolverConfig,
    ) -> Arc<RwLock<SolveJob>> {
        let job = Arc::new(RwLock::new(SolveJob::new(id.clone(), instance, config)));
        self.jobs.write().insert(id, job.clone());
        job
    }

    /// Gets a job by ID.
    pub fn get_job(&self, id: &str) -> Option<Arc<RwLock<SolveJob>>> {
        self.jobs.read().get(id).cloned()
    }

    /// Lists all job IDs.
    pub fn list_jobs(&self) -> Vec<String> {
        self.jobs.read().keys().cloned().collect()
    }

    /// Removes a job, returning it if it existed.
    ///
    /// A job still solving keeps running to completion; its outcome is simply
    /// no longer reachable through the service.
    pub fn remove_job(&self, id: &str) -> Option<Arc<RwLock<SolveJob>>> {
        let job = self.jobs.write().remove(id);
        if job.is_some() {
            info!(job_id = %id, "Removed solve job");
        }
        job
    }

    /// Starts solving a job in the background. Requires a Tokio runtime.
    pub fn start_solving(&self, job: Arc<RwLock<SolveJob>>) {
        job.write().status = SolverStatus::Solving;

        let backend = self.backend.clone();
        let solve_lock = self.solve_lock.clone();
        tokio::task::spawn_blocking(move || {
            solve_blocking(&job, backend.as_ref(), &solve_lock);
        });
    }

    /// Solves a job on the calling thread.
    pub fn solve_now(&self, job: &Arc<RwLock<SolveJob>>) {
        job.write().status = SolverStatus::Solving;
        solve_blocking(job, self.backend.as_ref(), &self.solve_lock);
    }
}

impl Default for SolverService {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the pipeline for a job and stores the outcome.
fn solve_blocking(job: &Arc<RwLock<SolveJob>>, backend: &dyn SolverBackend, solve_lock: &Mutex<()>) {
    let _guard = solve_lock.lock();

    let (job_id, instance, config) = {
        let guard = job.read();
        (guard.id.clone(), guard.instance.clone(), guard.config.clone())
    };

    console::print_config(
        instance.customers().len(),
        instance.sites().len(),
        instance.total_demand(),
        instance.total_capacity(),
    );
    info!(job_id = %job_id, "Starting solve job");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        solve_instance(instance, backend, &config)
    }));

    let mut guard = job.write();
    match outcome {
        Ok(Ok(solution)) => {
            console::print_solving_ended(&solution);
            guard.solution = Some(solution);
        }
        Ok(Err(err)) => {
            warn!(job_id = %job_id, error = %err, "Solve job failed");
            guard.error = Some(err.to_string());
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(job_id = %job_id, %reason, "Solver panicked");
            guard.error = Some(format!("Solver panicked: {}", reason));
        }
    }
    guard.status = SolverStatus::NotSolving;
}
