use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::{Event, Sse}, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use log::{error, warn};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tower_http::cors::CorsLayer;

use crate::benchmarks::{Benchmark, BenchmarkContext, BenchmarkError};
use crate::config::ServerConfig;
use crate::error::PsoError;
use crate::models::{OptimizationStatus, Problem, PsoParameters, PsoResult};
use crate::pso::observer::{IterationInfo, Observer};
use crate::pso::optimizer::optimize_with_observer;

#[derive(Clone)]
pub struct AppState {
    pub status_tx: broadcast::Sender<OptimizationStatus>,
    next_run_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(capacity: usize) -> Self {
        let (status_tx, _) = broadcast::channel(capacity);
        AppState {
            status_tx,
            next_run_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_run_id(&self) -> u64 {
        self.next_run_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptimizationRequest {
    pub benchmark: Benchmark,
    pub varmin: Vec<f64>,
    pub varmax: Vec<f64>,
    #[serde(default)]
    pub context: BenchmarkContext,
    #[serde(default)]
    pub parameters: PsoParameters,
}

/// Forwards every iteration to the `/status` subscribers.
pub struct BroadcastObserver {
    status_tx: broadcast::Sender<OptimizationStatus>,
    run_id: u64,
    last: Option<OptimizationStatus>,
}

impl BroadcastObserver {
    pub fn new(status_tx: broadcast::Sender<OptimizationStatus>, run_id: u64) -> Self {
        BroadcastObserver {
            status_tx,
            run_id,
            last: None,
        }
    }
}

impl Observer for BroadcastObserver {
    fn observe(&mut self, info: &IterationInfo<'_>) {
        let status = info.to_status(self.run_id);
        // No receivers is fine.
        let _ = self.status_tx.send(status.clone());
        self.last = Some(status);
    }

    fn finish(&mut self, _result: &PsoResult) {
        if let Some(mut status) = self.last.take() {
            status.is_finished = true;
            let _ = self.status_tx.send(status);
        }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/optimize", post(optimize_handler))
        .route("/status", get(status_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn status_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>> + 'static> {
    let mut rx = state.status_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(status) => match serde_json::to_string(&status) {
                    Ok(data) => {
                        yield Ok(Event::default().data(data).event("status"));
                    }
                    Err(e) => error!("Serialization error: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Status subscriber lagged, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

type Outcome = Result<Result<PsoResult, PsoError<BenchmarkError>>, JoinError>;

pub async fn optimize_handler(
    State(state): State<AppState>,
    Json(req): Json<OptimizationRequest>,
) -> Response {
    let status_tx = state.status_tx.clone();
    let run_id = state.next_run_id();

    // The search is CPU bound; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || -> Result<PsoResult, PsoError<BenchmarkError>> {
        let problem = Problem::new(req.benchmark, req.varmin, req.varmax)?;
        optimize_with_observer(
            &problem,
            &req.parameters,
            &req.context,
            BroadcastObserver::new(status_tx, run_id),
        )
    })
    .await;

    respond(run_id, outcome)
}

fn respond(run_id: u64, outcome: Outcome) -> Response {
    match outcome {
        Ok(Ok(result)) => Json(json!({
            "success": true,
            "run_id": run_id,
            "best_cost": result.best_cost,
            "best_position": result.best_position,
            "best_costs": result.best_costs,
            "iterations": result.iterations,
            "stop_reason": result.stop_reason,
            "evaluations": result.evaluations,
        }))
        .into_response(),
        Ok(Err(PsoError::Configuration(e))) => {
            warn!("Rejected optimization request {}: {}", run_id, e);
            failure(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(PsoError::CostFunction(e))) => {
            warn!("Cost function failed in run {}: {}", run_id, e);
            failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => {
            error!("Optimization task {} failed: {}", run_id, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "optimization task failed".to_string())
        }
    }
}
