//! sumai server binary: wires configuration, collaborators and routes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sumai::budget::LengthBudgetPlanner;
use sumai::chunker::ChunkedGenerator;
use sumai::config::Config;
use sumai::evaluation::EvaluationRunner;
use sumai::interfaces::ModelHandle;
use sumai::jobs::JobStore;
use sumai::orchestrator::Summarizer;
use sumai::remote::build_model_parts;
use sumai::scoring::RougeScorer;
use sumai::segment::UnicodeSegmenter;
use sumai::server::{routes, AppState};
use sumai::similarity::TfIdfSimilarity;
use sumai::textrank::SimilarityGraphRanker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(version = sumai::VERSION, "starting sumai server");

    let model_config = config.model.clone();
    let max_input_length = config.chunking.max_input_length;
    let model = Arc::new(ModelHandle::new(move || {
        build_model_parts(&model_config, max_input_length)
    }));

    let summarizer = Arc::new(Summarizer::new(
        Arc::new(UnicodeSegmenter),
        SimilarityGraphRanker::new(config.ranking.clone(), Arc::new(TfIdfSimilarity)),
        ChunkedGenerator::new(
            config.chunking.clone(),
            LengthBudgetPlanner::new(config.budget.clone()),
        ),
        model,
    ));

    let runner = Arc::new(EvaluationRunner::new(
        summarizer.clone(),
        Arc::new(sumai::dataset::TsvDatasetSource::default()),
        Arc::new(RougeScorer),
    ));

    let jobs = Arc::new(JobStore::new(Duration::from_secs(
        config.evaluation.job_ttl_secs,
    )));

    let state = AppState {
        summarizer,
        runner,
        jobs,
        dataset_path: config.evaluation.dataset_path.clone(),
        allow_origins: config.server.allow_origins.clone(),
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    tracing::info!(%addr, "listening");
    warp::serve(routes(state)).run(addr).await;
    Ok(())
}
