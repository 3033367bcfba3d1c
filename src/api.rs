//! REST API for capacitated facility location.
//!
//! Provides endpoints for:
//! - Demo data retrieval and instance generation
//! - Solve jobs (create, list, get, status, delete)
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::demo_data::{available_datasets, generate_by_name};
use crate::dto::{CostsDto, CustomerDto, FlowDto, InstanceDto, SiteDto, SolutionDto};
use crate::error::Error;
use crate::generator::{GeneratorConfig, InstanceGenerator, IntRange};
use crate::solver::{SolverConfig, SolverService};

/// Application state shared across handlers.
pub struct AppState {
    pub solver: SolverService,
    pub generator: InstanceGenerator,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_solver(SolverService::new())
    }

    /// State around an existing solver service.
    pub fn with_solver(solver: SolverService) -> Self {
        Self {
            solver,
            generator: InstanceGenerator::us_cities(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router() -> Router {
    router(Arc::new(AppState::new()))
}

/// Creates the API router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{name}", get(get_demo_data))
        .route("/instances", post(generate_instance))
        // Solve jobs
        .route("/solutions", post(create_solution))
        .route("/solutions", get(list_solutions))
        .route("/solutions/{id}", get(get_solution))
        .route("/solutions/{id}", delete(delete_solution))
        .route("/solutions/{id}/status", get(get_solution_status))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Error body returned with every non-2xx response that has a cause.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// What went wrong.
    pub message: String,
}

/// A handler failure: status code plus message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{} not found", what),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidParameters(_)
            | Error::InvalidInstance(_)
            | Error::InsufficientLocations { .. } => StatusCode::BAD_REQUEST,
            Error::DistanceDomain { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::ObjectiveMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    /// Application name.
    pub name: &'static str,
    /// Application version.
    pub version: &'static str,
    /// Solver engine name.
    pub solver_engine: &'static str,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Capacitated Facility Location",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: state.solver.backend_name(),
    })
}

// ============================================================================
// Demo Data
// ============================================================================

/// GET /demo-data - List available demo datasets.
#[utoipa::path(
    get,
    path = "/demo-data",
    responses((status = 200, description = "List of demo dataset names", body = Vec<String>))
)]
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(available_datasets().to_vec())
}

/// GET /demo-data/{name} - Generate a preset instance.
#[utoipa::path(
    get,
    path = "/demo-data/{name}",
    params(("name" = String, Path, description = "Demo dataset name")),
    responses(
        (status = 200, description = "Demo data generated", body = InstanceDto),
        (status = 404, description = "Dataset not found", body = ErrorResponse)
    )
)]
async fn get_demo_data(Path(name): Path<String>) -> Result<Json<InstanceDto>, ApiError> {
    let instance = generate_by_name(&name).ok_or_else(|| ApiError::not_found("Demo dataset"))??;
    Ok(Json(InstanceDto::from_instance(&instance)))
}

/// POST /instances - Generate an instance from generator parameters.
///
/// Omitted parameters take the defaults of the interactive app.
#[utoipa::path(
    post,
    path = "/instances",
    request_body = GeneratorConfig,
    responses(
        (status = 200, description = "Instance generated", body = InstanceDto),
        (status = 400, description = "Invalid parameters", body = ErrorResponse)
    )
)]
async fn generate_instance(
    State(state): State<Arc<AppState>>,
    Json(config): Json<GeneratorConfig>,
) -> Result<Json<InstanceDto>, ApiError> {
    let instance = state.generator.generate("custom", &config)?;
    Ok(Json(InstanceDto::from_instance(&instance)))
}

// ============================================================================
// Solve Jobs
// ============================================================================

/// Request to solve an instance.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    /// Instance to solve.
    pub instance: InstanceDto,
    /// Solver time limit in seconds; 120 when absent.
    #[serde(default)]
    pub time_limit_seconds: Option<f64>,
}

/// POST /solutions - Create and start solving a job.
#[utoipa::path(
    post,
    path = "/solutions",
    request_body = SolveRequest,
    responses(
        (status = 200, description = "Job ID", body = String),
        (status = 400, description = "Invalid instance or time limit", body = ErrorResponse)
    )
)]
async fn create_solution(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SolveRequest>,
) -> Result<String, ApiError> {
    let instance = request.instance.to_domain()?;

    let config = match request.time_limit_seconds {
        None => SolverConfig::default(),
        Some(secs) => SolverConfig::with_time_limit_secs(secs).ok_or_else(|| {
            ApiError::bad_request(format!(
                "time limit must be a positive number of seconds, got {}",
                secs
            ))
        })?,
    };

    let id = Uuid::new_v4().to_string();
    info!(job_id = %id, name = %instance.name, "Accepted solve request");

    let job = state.solver.create_job(id.clone(), Arc::new(instance), config);
    state.solver.start_solving(job);
    Ok(id)
}

/// GET /solutions - List all job IDs.
#[utoipa::path(
    get,
    path = "/solutions",
    responses((status = 200, description = "List of job IDs", body = Vec<String>))
)]
async fn list_solutions(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.solver.list_jobs())
}

/// GET /solutions/{id} - Get the current state of a job.
///
/// Returns the instance without a plan while the job is still solving.
#[utoipa::path(
    get,
    path = "/solutions/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Solution retrieved", body = SolutionDto),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 422, description = "Solving failed", body = ErrorResponse)
    )
)]
async fn get_solution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SolutionDto>, ApiError> {
    let job = state.solver.get_job(&id).ok_or_else(|| ApiError::not_found("Job"))?;
    let guard = job.read();

    if let Some(message) = &guard.error {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.clone(),
        });
    }

    let dto = match &guard.solution {
        Some(solution) => SolutionDto::from_solution(solution, Some(guard.status)),
        None => SolutionDto::pending(&guard.instance, guard.status),
    };
    Ok(Json(dto))
}

/// DELETE /solutions/{id} - Forget a job and return its last state.
///
/// A job still solving runs to completion in the background, but its
/// outcome is discarded.
#[utoipa::path(
    delete,
    path = "/solutions/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job removed", body = SolutionDto),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
async fn delete_solution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SolutionDto>, ApiError> {
    let job = state.solver.remove_job(&id).ok_or_else(|| ApiError::not_found("Job"))?;
    let guard = job.read();

    let dto = match &guard.solution {
        Some(solution) => SolutionDto::from_solution(solution, Some(guard.status)),
        None => {
            let mut dto = SolutionDto::pending(&guard.instance, guard.status);
            dto.message = guard.error.clone();
            dto
        }
    };
    Ok(Json(dto))
}

/// Status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Job state.
    pub solver_status: String,
    /// Outcome once solved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Total costs once solved to optimality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_costs: Option<f64>,
}

/// GET /solutions/{id}/status - Get job status only.
#[utoipa::path(
    get,
    path = "/solutions/{id}/status",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Status retrieved", body = StatusResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
async fn get_solution_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state.solver.get_job(&id).ok_or_else(|| ApiError::not_found("Job"))?;
    let guard = job.read();
    let solution = guard.solution.as_ref();

    Ok(Json(StatusResponse {
        solver_status: guard.status.as_str().to_string(),
        status: solution.map(|s| s.status.as_str().to_string()),
        total_costs: solution.filter(|s| s.is_optimal()).map(|s| s.total_costs()),
    }))
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        list_demo_data,
        get_demo_data,
        generate_instance,
        create_solution,
        list_solutions,
        get_solution,
        delete_solution,
        get_solution_status,
    ),
    components(schemas(
        HealthResponse,
        InfoResponse,
        ErrorResponse,
        GeneratorConfig,
        IntRange,
        CustomerDto,
        SiteDto,
        InstanceDto,
        FlowDto,
        CostsDto,
        SolutionDto,
        SolveRequest,
        StatusResponse,
    ))
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SolveStatus;
    use crate::model::Model;
    use crate::solver::{BackendResult, SolverBackend};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Reports every model as unsolved without doing any work.
    struct UnsolvedBackend;

    impl SolverBackend for UnsolvedBackend {
        fn name(&self) -> &'static str {
            "unsolved"
        }

        fn solve(&self, model: &Model, _time_limit: Duration) -> BackendResult {
            BackendResult::without_values(SolveStatus::NotSolved, model.variables().len())
        }
    }

    fn app() -> (Arc<AppState>, Router) {
        let state = Arc::new(AppState::with_solver(SolverService::with_backend(Arc::new(
            UnsolvedBackend,
        ))));
        (state.clone(), router(state))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let (_, app) = app();
        let (status, body) = send(app.clone(), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");

        let (_, body) = send(app, get_request("/info")).await;
        assert_eq!(body["solverEngine"], "unsolved");
    }

    #[tokio::test]
    async fn test_demo_data() {
        let (_, app) = app();
        let (_, body) = send(app.clone(), get_request("/demo-data")).await;
        assert_eq!(body, json!(["small", "default", "tight", "infeasible"]));

        let (status, body) = send(app.clone(), get_request("/demo-data/small")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customers"].as_array().unwrap().len(), 10);
        assert_eq!(body["sites"].as_array().unwrap().len(), 3);

        let (status, _) = send(app, get_request("/demo-data/atlantis")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_instance() {
        let (_, app) = app();
        let (status, body) = send(
            app.clone(),
            post_json("/instances", json!({"nCustomers": 4, "nSites": 2, "seed": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customers"].as_array().unwrap().len(), 4);

        let (status, body) = send(app.clone(), post_json("/instances", json!({"nSites": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("sites"));

        let (status, _) = send(app, post_json("/instances", json!({"nCustomers": 100_000}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let (_, app) = app();
        let (status, _) = send(app.clone(), get_request("/solutions/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(app, get_request("/solutions/nope/status")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_solve_requests() {
        let (_, app) = app();
        let instance = InstanceDto::from_instance(&generate_by_name("small").unwrap().unwrap());

        let mut bad = instance.clone();
        bad.customers[0].lat = 123.0;
        let (status, _) = send(app.clone(), post_json("/solutions", json!({"instance": bad}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for secs in [json!(0.0), json!(-3.0), json!(1e20)] {
            let (status, body) = send(
                app.clone(),
                post_json("/solutions", json!({"instance": instance, "timeLimitSeconds": secs})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["message"].as_str().unwrap().contains("time limit"));
        }
    }

    #[tokio::test]
    async fn test_solve_job_lifecycle() {
        let (state, app) = app();
        let instance = InstanceDto::from_instance(&generate_by_name("small").unwrap().unwrap());

        let (status, body) = send(
            app.clone(),
            post_json("/solutions", json!({"instance": instance, "timeLimitSeconds": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body.as_str().unwrap().to_string();
        assert_eq!(state.solver.list_jobs(), vec![id.clone()]);

        let status_uri = format!("/solutions/{}/status", id);
        let mut finished = false;
        for _ in 0..200 {
            let (_, body) = send(app.clone(), get_request(&status_uri)).await;
            if body["solverStatus"] == "NOT_SOLVING" {
                assert_eq!(body["status"], "NOT_SOLVED");
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(finished);

        let (status, body) = send(app, get_request(&format!("/solutions/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "NOT_SOLVED");
        assert_eq!(body["message"], "Model not solved to optimality");
        assert!(body.get("costs").is_none());
        assert_eq!(body["sites"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_job() {
        let (state, app) = app();
        let instance = generate_by_name("small").unwrap().unwrap();
        let job = state.solver.create_job(
            "done".to_string(),
            Arc::new(instance),
            SolverConfig::default(),
        );
        state.solver.solve_now(&job);

        let (status, body) = send(app.clone(), delete_request("/solutions/done")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["solverStatus"], "NOT_SOLVING");
        assert_eq!(body["status"], "NOT_SOLVED");
        assert!(state.solver.list_jobs().is_empty());

        let (_, body) = send(app.clone(), get_request("/solutions")).await;
        assert_eq!(body, json!([]));

        let (status, _) = send(app.clone(), get_request("/solutions/done")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(app, delete_request("/solutions/done")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::InvalidParameters("x".into()), StatusCode::BAD_REQUEST),
            (Error::InvalidInstance("x".into()), StatusCode::BAD_REQUEST),
            (
                Error::InsufficientLocations {
                    requested: 2,
                    available: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::DistanceDomain {
                    from: crate::domain::GeoPoint::new(0.0, 0.0),
                    to: crate::domain::GeoPoint::new(0.0, 0.0),
                    value: 2.0,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }
}
