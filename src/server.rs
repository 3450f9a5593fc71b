//! Thin HTTP transport over the engine: request validation, serialization
//! and status mapping. No algorithmic content lives here.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::SumAiError;
use crate::evaluation::{EvaluationConfig, EvaluationReport, EvaluationRunner};
use crate::jobs::{submit_evaluation, JobStore};
use crate::orchestrator::Summarizer;
use crate::types::{GenerationSettings, Strategy};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub runner: Arc<EvaluationRunner>,
    pub jobs: Arc<JobStore>,
    /// Default dataset for evaluation requests.
    pub dataset_path: PathBuf,
    /// Allowed CORS origins; `["*"]` allows any.
    pub allow_origins: Vec<String>,
}

/// Decoding knobs accepted on requests; defaults mirror the engine defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationOverrides {
    pub abstractive_num_beams: u32,
    pub abstractive_length_penalty: f32,
    pub abstractive_repetition_penalty: f32,
    pub abstractive_no_repeat_ngram_size: u32,
}

impl Default for GenerationOverrides {
    fn default() -> Self {
        let base = GenerationSettings::default();
        Self {
            abstractive_num_beams: base.num_beams,
            abstractive_length_penalty: base.length_penalty,
            abstractive_repetition_penalty: base.repetition_penalty,
            abstractive_no_repeat_ngram_size: base.no_repeat_ngram_size,
        }
    }
}

impl GenerationOverrides {
    fn to_settings(&self) -> GenerationSettings {
        GenerationSettings {
            num_beams: self.abstractive_num_beams,
            length_penalty: self.abstractive_length_penalty,
            repetition_penalty: self.abstractive_repetition_penalty,
            no_repeat_ngram_size: self.abstractive_no_repeat_ngram_size,
            ..GenerationSettings::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummarizeBody {
    pub text: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_length")]
    pub length: u32,
    pub extractive_length: Option<u32>,
    pub abstractive_length: Option<u32>,
    #[serde(flatten)]
    pub generation: GenerationOverrides,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateBody {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_length")]
    pub length: u32,
    pub extractive_length: Option<u32>,
    pub abstractive_length: Option<u32>,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(flatten)]
    pub generation: GenerationOverrides,
}

fn default_method() -> String {
    "extractive".to_string()
}

fn default_length() -> u32 {
    30
}

fn default_max_samples() -> usize {
    30
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Serialize)]
struct SummarizeResponse {
    ok: bool,
    summary: String,
    method: String,
    original_length_chars: usize,
    original_length_sentences: usize,
    summary_length_chars: usize,
    summary_length_sentences: usize,
    compression_ratio: f64,
    processing_time_sec: f64,
    request_id: String,
    extra: serde_json::Value,
}

/// All routes with CORS applied.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let mut cors = warp::cors()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type", "authorization"]);
    if state.allow_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &state.allow_origins {
            cors = cors.allow_origin(origin.as_str());
        }
    }

    let root = warp::path::end().and(warp::get()).map(|| {
        warp::reply::json(&json!({
            "message": "sumai summarization API is running",
            "endpoints": {
                "summarize": "/api/summarize",
                "evaluate": "/api/evaluate",
                "evaluate_async": "/api/evaluate/async",
            }
        }))
    });

    let healthz = warp::path!("healthz")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ok"})));

    let readyz = warp::path!("readyz")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ready"})));

    let summarize = warp::path!("api" / "summarize")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(handle_summarize);

    let evaluate_async = warp::path!("api" / "evaluate" / "async")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(handle_evaluate_async);

    let evaluate_status = warp::path!("api" / "evaluate" / "status" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_evaluate_status);

    let evaluate = warp::path!("api" / "evaluate")
        .and(warp::post())
        .and(with_state(state))
        .and(warp::body::json())
        .and_then(handle_evaluate);

    root.or(healthz)
        .or(readyz)
        .or(summarize)
        .or(evaluate_async)
        .or(evaluate_status)
        .or(evaluate)
        .with(cors)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn status_for(err: &SumAiError) -> StatusCode {
    match err {
        SumAiError::InvalidStrategy(_) | SumAiError::NoValidSamples => StatusCode::BAD_REQUEST,
        SumAiError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
        SumAiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(err: &SumAiError, request_id: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = json!({
        "ok": false,
        "category": err.category(),
        "error": err.to_string(),
        "request_id": request_id,
    });
    warp::reply::with_status(warp::reply::json(&body), status_for(err))
}

async fn handle_summarize(
    state: AppState,
    body: SummarizeBody,
) -> Result<impl Reply, Infallible> {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    let strategy: Strategy = match body.method.parse() {
        Ok(s) => s,
        Err(err) => return Ok(error_reply(&err, &request_id)),
    };

    let extractive_ratio = body.extractive_length.unwrap_or(body.length) as f64 / 100.0;
    let abstractive_ratio = body.abstractive_length.unwrap_or(body.length) as f64 / 100.0;
    let settings = body.generation.to_settings();
    let original_chars = body.text.trim().chars().count();

    let result = match state
        .summarizer
        .summarize(&body.text, strategy, extractive_ratio, abstractive_ratio, &settings)
        .await
    {
        Ok(result) => result,
        Err(err) => return Ok(error_reply(&err, &request_id)),
    };

    info!(request_id = %request_id, strategy = %strategy, "summarize request served");
    let response = SummarizeResponse {
        ok: true,
        summary_length_chars: result.summary.chars().count(),
        original_length_chars: original_chars,
        original_length_sentences: result.num_original_sentences,
        summary_length_sentences: result.num_summary_sentences,
        compression_ratio: result.compression_ratio,
        method: strategy.to_string(),
        processing_time_sec: started.elapsed().as_secs_f64(),
        request_id,
        extra: json!({
            "selected_indices": result.selected_indices,
            "num_chunks": result.chunk_summaries.len(),
        }),
        summary: result.summary,
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}

fn evaluation_config(state: &AppState, body: &EvaluateBody) -> Result<EvaluationConfig, SumAiError> {
    let strategy: Strategy = body.method.parse()?;
    Ok(EvaluationConfig {
        dataset_path: state.dataset_path.clone(),
        strategy,
        length_percent: body.length,
        extractive_length_percent: body.extractive_length,
        abstractive_length_percent: body.abstractive_length,
        settings: body.generation.to_settings(),
        max_samples: Some(body.max_samples),
        start_index: body.start_index,
        shuffle: body.shuffle,
        seed: body.seed,
    })
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    ok: bool,
    #[serde(flatten)]
    report: EvaluationReport,
    request_id: String,
}

async fn handle_evaluate(state: AppState, body: EvaluateBody) -> Result<impl Reply, Infallible> {
    let request_id = Uuid::new_v4().to_string();
    let config = match evaluation_config(&state, &body) {
        Ok(config) => config,
        Err(err) => return Ok(error_reply(&err, &request_id)),
    };

    match state.runner.run(&config, |_| {}).await {
        Ok(report) => Ok(warp::reply::with_status(
            warp::reply::json(&EvaluateResponse {
                ok: true,
                report,
                request_id,
            }),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(&err, &request_id)),
    }
}

async fn handle_evaluate_async(
    state: AppState,
    body: EvaluateBody,
) -> Result<impl Reply, Infallible> {
    let request_id = Uuid::new_v4().to_string();
    let config = match evaluation_config(&state, &body) {
        Ok(config) => config,
        Err(err) => return Ok(error_reply(&err, &request_id)),
    };

    let job_id = submit_evaluation(state.jobs.clone(), state.runner.clone(), config);
    info!(request_id = %request_id, job = %job_id, "evaluation job submitted");
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({
            "ok": true,
            "job_id": job_id,
            "status": "queued",
            "request_id": request_id,
        })),
        StatusCode::OK,
    ))
}

async fn handle_evaluate_status(job_id: String, state: AppState) -> Result<impl Reply, Infallible> {
    match state.jobs.get(&job_id) {
        Some(record) => {
            let body = json!({
                "ok": true,
                "status": record.state,
                "progress": record.progress,
                "result": record.result,
                "error": record.error,
            });
            Ok(warp::reply::with_status(
                warp::reply::json(&body),
                StatusCode::OK,
            ))
        }
        None => Ok(warp::reply::with_status(
            warp::reply::json(&json!({
                "ok": false,
                "category": "job_not_found",
                "error": format!("no evaluation job with id {}", job_id),
            })),
            StatusCode::NOT_FOUND,
        )),
    }
}
