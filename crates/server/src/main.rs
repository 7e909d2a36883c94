//! Simple test harness for the recommendation orchestrator.
//!
//! Loads a snapshot directory (`catalog.json`, `interactions.json`, optional
//! `community.json`), trains the latent model when community data exists,
//! and prints recommendations from both strategies.
//!
//! Usage: `server [SNAPSHOT_DIR]` (default `data/snapshot`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use data_loader::SnapshotBundle;
use latent_model::TrainingData;
use server::{OrchestratorConfig, RecommendationOrchestrator, StrategyKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/snapshot"));

    info!("Loading snapshot from {}", data_dir.display());
    let bundle = SnapshotBundle::load_from_dir(&data_dir).context("Failed to load snapshot")?;
    let (movies, rated, liked) = bundle.catalog.counts();
    info!("Catalog: {} movies ({} rated, {} liked)", movies, rated, liked);

    let orchestrator = RecommendationOrchestrator::new(OrchestratorConfig::default());
    let movies = bundle.catalog.into_movies();

    if bundle.community.reviews.is_empty() {
        warn!("No community reviews, latent requests will use the heuristic ranker");
    } else {
        let data = Arc::new(TrainingData::new(movies.clone(), bundle.community));
        let version = orchestrator.refresh_model(data).await?;
        info!("Latent model version {} ready", version);
    }

    for strategy in [StrategyKind::Heuristic, StrategyKind::Latent] {
        let response = orchestrator
            .get_recommendations(movies.clone(), bundle.interactions.clone(), None, strategy)
            .await?;

        info!(
            "Requested {}, ranked by {} ({} results):",
            strategy,
            response.strategy,
            response.recommendations.len()
        );
        for (i, rec) in response.recommendations.iter().enumerate() {
            info!(
                "{}. {} ({}) [{}] - {}",
                i + 1,
                rec.title,
                rec.director,
                rec.genres.join(", "),
                rec.explanation
            );
        }
    }

    Ok(())
}
