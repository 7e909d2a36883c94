//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation request:
//! 1. Pick the ranking strategy (heuristic, or latent when a model is ready)
//! 2. Run the CPU-bound ranking on the blocking thread pool
//! 3. Enrich ranked ids with catalog metadata and explanations
//!
//! It also owns the latent [`ModelCache`], so model refreshes and requests
//! share one place of truth for the current snapshot.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use data_loader::{InteractionSnapshot, MovieId, MovieRecord, UserId, DEFAULT_TOP_K};
use latent_model::{LatentConfig, LatentStrategy, TrainingData};
use pipeline::{
    compute_director_scores, DirectorScore, HeuristicRanker, RankingConfig, RankingOutcome,
    RankingRequest, RankingStrategy,
};

use crate::model_cache::ModelCache;

/// Which ranking engine serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Heuristic,
    Latent,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Heuristic => write!(f, "heuristic"),
            StrategyKind::Latent => write!(f, "latent"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(StrategyKind::Heuristic),
            "latent" => Ok(StrategyKind::Latent),
            other => bail!("unknown strategy '{}'", other),
        }
    }
}

/// Settings for both engines plus request defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub ranking: RankingConfig,
    pub latent: LatentConfig,
    /// List size used when a request does not ask for one
    pub default_top_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            latent: LatentConfig::default(),
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_latent(mut self, latent: LatentConfig) -> Self {
        self.latent = latent;
        self
    }
}

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub director: String,
    pub genres: Vec<String>,
    pub score: f64,
    pub explanation: String,
}

/// Everything one request produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendations: Vec<MovieRecommendation>,
    pub director_scores: Vec<DirectorScore>,
    pub has_preference_signals: bool,
    /// Strategy that actually ranked the request
    pub strategy: StrategyKind,
}

/// Main orchestrator; cheap to clone and share across tasks
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    config: Arc<OrchestratorConfig>,
    heuristic: Arc<HeuristicRanker>,
    model_cache: Arc<ModelCache>,
}

impl RecommendationOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let heuristic = Arc::new(HeuristicRanker::new(config.ranking.clone()));
        let model_cache = Arc::new(ModelCache::new(config.latent.clone()));
        Self {
            config: Arc::new(config),
            heuristic,
            model_cache,
        }
    }

    /// Retrain the latent model and publish it; returns the new version
    pub async fn refresh_model(&self, data: Arc<TrainingData>) -> Result<u64> {
        self.model_cache.refresh(data).await
    }

    /// Main entry point: rank `movies` for the user behind `interactions`
    ///
    /// # Arguments
    /// * `top_k` - Requested list size; `None` uses the configured default
    /// * `strategy` - Requested engine; latent falls back to heuristic until
    ///   a model snapshot exists
    #[instrument(skip(self, movies, interactions), fields(movies = movies.len(), user = ?interactions.user_id))]
    pub async fn get_recommendations(
        &self,
        movies: Vec<MovieRecord>,
        interactions: InteractionSnapshot,
        top_k: Option<usize>,
        strategy: StrategyKind,
    ) -> Result<RecommendationResponse> {
        let start_time = Instant::now();

        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let request = Arc::new(RankingRequest::new(movies, interactions).with_top_k(top_k));
        let (ranker, used) = self.select_strategy(strategy).await;

        let outcome = tokio::task::spawn_blocking({
            let ranker = ranker.clone();
            let request = request.clone();
            move || ranker.rank(&request)
        })
        .await
        .context("Ranking task panicked")?;

        let recommendations = build_recommendations(&request.movies, &outcome, used);
        info!(
            "Ranked {} recommendations with {} in {:.2?}",
            recommendations.len(),
            ranker.name(),
            start_time.elapsed()
        );

        Ok(RecommendationResponse {
            recommendations,
            director_scores: outcome.director_scores,
            has_preference_signals: outcome.has_preference_signals,
            strategy: used,
        })
    }

    /// Director affinity table for one user
    pub async fn director_scores(
        &self,
        movies: Vec<MovieRecord>,
        interactions: InteractionSnapshot,
    ) -> Result<Vec<DirectorScore>> {
        let config = self.config.ranking.clone();
        tokio::task::spawn_blocking(move || compute_director_scores(&movies, &interactions, &config))
            .await
            .context("Director scoring task panicked")
    }

    /// Predicted rating from the current latent snapshot
    pub async fn predict(&self, user_id: UserId, movie_id: MovieId) -> Result<f32> {
        let snapshot = self
            .model_cache
            .current()
            .await
            .ok_or_else(|| anyhow!("No latent model has been trained yet"))?;
        Ok(snapshot.predict(user_id, movie_id))
    }

    async fn select_strategy(
        &self,
        requested: StrategyKind,
    ) -> (Arc<dyn RankingStrategy>, StrategyKind) {
        if requested == StrategyKind::Latent {
            if let Some(snapshot) = self.model_cache.current().await {
                let strategy: Arc<dyn RankingStrategy> = Arc::new(
                    LatentStrategy::new(snapshot).with_max_top_k(self.config.ranking.max_top_k),
                );
                return (strategy, StrategyKind::Latent);
            }
            warn!("No latent model snapshot yet, falling back to heuristic ranking");
        }
        let strategy: Arc<dyn RankingStrategy> = self.heuristic.clone();
        (strategy, StrategyKind::Heuristic)
    }
}

/// Join ranked ids with catalog rows; ids missing from the catalog are dropped
fn build_recommendations(
    movies: &[MovieRecord],
    outcome: &RankingOutcome,
    strategy: StrategyKind,
) -> Vec<MovieRecommendation> {
    let by_id: HashMap<MovieId, &MovieRecord> = movies.iter().map(|m| (m.id, m)).collect();
    let director_lookup: HashMap<&str, f64> = outcome
        .director_scores
        .iter()
        .map(|d| (d.director.as_str(), d.score))
        .collect();

    outcome
        .ranked_movies
        .iter()
        .filter_map(|scored| {
            let movie = by_id.get(&scored.movie_id)?;
            let explanation = match strategy {
                StrategyKind::Latent => format!("Predicted rating: {:.2}", scored.score),
                StrategyKind::Heuristic if !outcome.has_preference_signals => {
                    format!("Score: {:.3}, top rated overall", scored.score)
                }
                StrategyKind::Heuristic => match director_lookup.get(movie.director_key()) {
                    Some(affinity) => format!(
                        "Score: {:.3}, director {} affinity {:.2}",
                        scored.score,
                        movie.director_key(),
                        affinity
                    ),
                    None => format!("Score: {:.3}", scored.score),
                },
            };
            Some(MovieRecommendation {
                movie_id: movie.id,
                title: movie.title.clone(),
                director: movie.director_key().to_string(),
                genres: movie.genres.clone(),
                score: scored.score,
                explanation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{CommunityData, Review};
    use pipeline::ScoredMovie;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn build_test_catalog() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new(1, "A")
                .with_title("Memories of Murder")
                .with_genres(["crime", "drama"])
                .with_rating(8.1, 900),
            MovieRecord::new(2, "B")
                .with_title("Old Boy")
                .with_genres(["thriller"])
                .with_rating(8.4, 1_200),
            MovieRecord::new(3, "A")
                .with_title("Mother")
                .with_genres(["drama"])
                .with_rating(7.8, 400),
            MovieRecord::new(4, "C")
                .with_title("The Host")
                .with_genres(["sf"])
                .with_rating(7.1, 600),
            MovieRecord::new(5, "")
                .with_title("Untitled")
                .with_genres(["drama"]),
        ]
    }

    fn build_training_data() -> Arc<TrainingData> {
        let reviews = vec![
            Review { user_id: 1, movie_id: 1, rating: 9.0 },
            Review { user_id: 1, movie_id: 2, rating: 7.0 },
            Review { user_id: 2, movie_id: 3, rating: 4.0 },
            Review { user_id: 2, movie_id: 4, rating: 6.0 },
        ];
        Arc::new(TrainingData::new(
            build_test_catalog(),
            CommunityData::new(reviews, vec![]),
        ))
    }

    fn build_test_orchestrator() -> RecommendationOrchestrator {
        let latent = LatentConfig::default().with_factors(8).with_epochs(5).with_seed(17);
        RecommendationOrchestrator::new(OrchestratorConfig::default().with_latent(latent))
    }

    // ============================================================================
    // Unit Tests: StrategyKind
    // ============================================================================

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("heuristic".parse::<StrategyKind>().unwrap(), StrategyKind::Heuristic);
        assert_eq!(" Latent ".parse::<StrategyKind>().unwrap(), StrategyKind::Latent);
        assert!("svd".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::Latent.to_string(), "latent");
    }

    #[test]
    fn test_config_from_json() {
        let config: OrchestratorConfig = serde_json::from_str(
            r#"{"default_top_k": 10, "latent": {"epochs": 3}, "ranking": {"max_top_k": 12}}"#,
        )
        .unwrap();
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.latent.epochs, 3);
        assert_eq!(config.latent.factors, 40);
        assert_eq!(config.ranking.max_top_k, 12);
    }

    // ============================================================================
    // Unit Tests: build_recommendations
    // ============================================================================

    #[test]
    fn test_build_recommendations_enriches_and_skips_missing() {
        let outcome = RankingOutcome {
            ranked_movies: vec![
                ScoredMovie { movie_id: 3, score: 0.9 },
                ScoredMovie { movie_id: 999, score: 0.8 },
                ScoredMovie { movie_id: 5, score: 0.5 },
            ],
            director_scores: vec![DirectorScore {
                director: "A".to_string(),
                score: 0.62,
                liked_count: 1,
                seen_count: 1,
                avg_quality: 8.1,
            }],
            has_preference_signals: true,
        };

        let recs = build_recommendations(&build_test_catalog(), &outcome, StrategyKind::Heuristic);

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Mother");
        assert!(recs[0].explanation.contains("director A affinity 0.62"));
        assert_eq!(recs[1].director, data_loader::UNKNOWN_DIRECTOR);
        assert_eq!(recs[1].explanation, "Score: 0.500");
    }

    // ============================================================================
    // Integration Tests
    // ============================================================================

    #[tokio::test]
    async fn test_heuristic_recommendations() {
        let orchestrator = build_test_orchestrator();
        let interactions = InteractionSnapshot::for_user(1).with_likes([1]);

        let response = orchestrator
            .get_recommendations(build_test_catalog(), interactions, None, StrategyKind::Heuristic)
            .await
            .unwrap();

        assert_eq!(response.strategy, StrategyKind::Heuristic);
        assert!(response.has_preference_signals);
        assert_eq!(response.recommendations.len(), 4);
        assert!(response.recommendations.iter().all(|r| r.movie_id != 1));
        // Same director as the liked movie
        assert_eq!(response.recommendations[0].movie_id, 3);
    }

    #[tokio::test]
    async fn test_cold_start_uses_quality_order() {
        let orchestrator = build_test_orchestrator();

        let response = orchestrator
            .get_recommendations(build_test_catalog(), InteractionSnapshot::new(), Some(2), StrategyKind::Heuristic)
            .await
            .unwrap();

        assert!(!response.has_preference_signals);
        let ids: Vec<_> = response.recommendations.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(response.recommendations[0].explanation.contains("top rated"));
    }

    #[tokio::test]
    async fn test_latent_falls_back_without_snapshot() {
        let orchestrator = build_test_orchestrator();
        let interactions = InteractionSnapshot::for_user(1).with_likes([1]);

        let response = orchestrator
            .get_recommendations(build_test_catalog(), interactions, Some(3), StrategyKind::Latent)
            .await
            .unwrap();

        assert_eq!(response.strategy, StrategyKind::Heuristic);
        assert_eq!(response.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_latent_recommendations_after_refresh() {
        let orchestrator = build_test_orchestrator();
        let version = orchestrator.refresh_model(build_training_data()).await.unwrap();
        assert_eq!(version, 1);

        let response = orchestrator
            .get_recommendations(
                build_test_catalog(),
                InteractionSnapshot::for_user(1),
                Some(10),
                StrategyKind::Latent,
            )
            .await
            .unwrap();

        assert_eq!(response.strategy, StrategyKind::Latent);
        // Movies 1 and 2 were reviewed by user 1 in the training data
        let ids: Vec<_> = response.recommendations.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(&1) && !ids.contains(&2));
        assert!(response.director_scores.is_empty());
        for rec in &response.recommendations {
            assert!((1.0..=10.0).contains(&rec.score));
            assert!(rec.explanation.starts_with("Predicted rating"));
        }
    }

    #[tokio::test]
    async fn test_predict_requires_snapshot() {
        let orchestrator = build_test_orchestrator();
        assert!(orchestrator.predict(1, 3).await.is_err());

        orchestrator.refresh_model(build_training_data()).await.unwrap();
        let rating = orchestrator.predict(1, 3).await.unwrap();
        assert!((1.0..=10.0).contains(&rating));
    }

    #[tokio::test]
    async fn test_director_scores() {
        let orchestrator = build_test_orchestrator();
        let interactions = InteractionSnapshot::for_user(1)
            .with_likes([1])
            .with_rating(4, 3.0);

        let scores = orchestrator
            .director_scores(build_test_catalog(), interactions)
            .await
            .unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].director, "A");
        assert_eq!(scores[1].director, "C");
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let orchestrator = build_test_orchestrator();
        orchestrator.refresh_model(build_training_data()).await.unwrap();

        let mut handles = Vec::new();
        for user in 1..=8u32 {
            let orchestrator = orchestrator.clone();
            let strategy = if user % 2 == 0 { StrategyKind::Latent } else { StrategyKind::Heuristic };
            handles.push(tokio::spawn(async move {
                orchestrator
                    .get_recommendations(
                        build_test_catalog(),
                        InteractionSnapshot::for_user(user).with_likes([user % 5 + 1]),
                        Some(2),
                        strategy,
                    )
                    .await
            }));
        }

        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.recommendations.len(), 2);
        }
    }
}
