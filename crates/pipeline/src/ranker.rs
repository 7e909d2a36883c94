//! Heuristic ranking engine.
//!
//! ## Algorithm
//! 1. Compute catalog quality (global average, per-movie smoothed quality)
//! 2. Without likes or ratings: return the catalog by quality (cold start)
//! 3. Score directors the user has interacted with
//! 4. Build the user's genre/director frequency profile
//! 5. Candidate pool = unseen movies (full catalog if everything is seen)
//! 6. Score each candidate as a weighted sum of its components
//! 7. Stable sort descending, keep the top K

use crate::candidates::candidate_pool;
use crate::config::RankingConfig;
use crate::content::ContentProfile;
use crate::director::director_scores_for;
use crate::features::FeatureEngineer;
use crate::profile::UserProfile;
use crate::quality::CatalogQuality;
use crate::traits::{sort_descending, RankingOutcome, RankingRequest, RankingStrategy, ScoredMovie};
use data_loader::{InteractionSnapshot, MovieRecord};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Deterministic, explainable ranker over a catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct HeuristicRanker {
    config: RankingConfig,
}

impl HeuristicRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Rank `movies` for the user described by `interactions`
    #[instrument(skip_all, fields(movies = movies.len(), top_k = top_k))]
    pub fn rank_movies(
        &self,
        movies: &[MovieRecord],
        interactions: &InteractionSnapshot,
        top_k: usize,
    ) -> RankingOutcome {
        let config = &self.config;
        let top_k = config.effective_top_k(top_k);
        let profile = UserProfile::build(interactions);
        let has_preference_signals = profile.has_preference_signals();

        if movies.is_empty() {
            return RankingOutcome {
                has_preference_signals,
                ..RankingOutcome::default()
            };
        }

        let quality = CatalogQuality::compute(movies, config.min_votes, config.default_global_average);
        debug!(
            "Catalog quality: global_average={:.3}, quality_mean={:.3}",
            quality.global_average, quality.global_quality_mean
        );

        if !has_preference_signals {
            debug!("No preference signals, ranking by quality");
            return RankingOutcome {
                ranked_movies: rank_by_quality(movies, &quality, top_k),
                director_scores: Vec::new(),
                has_preference_signals,
            };
        }

        let director_scores = director_scores_for(movies, &profile, &quality, config);
        let director_lookup: HashMap<String, f64> = director_scores
            .iter()
            .map(|d| (d.director.clone(), d.score))
            .collect();

        let content = ContentProfile::build(movies, &profile);
        let pool = candidate_pool(movies, &profile.seen);
        debug!("Scoring {} candidates", pool.len());

        let engineer = FeatureEngineer::new(movies, &quality, &profile, &content, &director_lookup, config);
        let mut ranked: Vec<ScoredMovie> = engineer
            .compute_features(&pool)
            .into_iter()
            .map(|features| ScoredMovie {
                movie_id: features.movie_id,
                score: features.score(&config.weights),
            })
            .collect();

        sort_descending(&mut ranked);
        ranked.truncate(top_k);

        debug!(
            "Ranked {} movies, {} directors",
            ranked.len(),
            director_scores.len()
        );

        RankingOutcome {
            ranked_movies: ranked,
            director_scores,
            has_preference_signals,
        }
    }
}

impl RankingStrategy for HeuristicRanker {
    fn name(&self) -> &str {
        "HeuristicRanker"
    }

    fn rank(&self, request: &RankingRequest) -> RankingOutcome {
        self.rank_movies(&request.movies, &request.interactions, request.top_k)
    }
}

/// Cold-start ranking: smoothed quality alone, catalog order breaking ties
fn rank_by_quality(movies: &[MovieRecord], quality: &CatalogQuality, top_k: usize) -> Vec<ScoredMovie> {
    let mut ranked: Vec<ScoredMovie> = movies
        .iter()
        .map(|movie| ScoredMovie {
            movie_id: movie.id,
            score: quality.quality(movie.id),
        })
        .collect();
    sort_descending(&mut ranked);
    ranked.truncate(top_k);
    ranked
}

/// Rank with the default configuration
pub fn rank(movies: &[MovieRecord], interactions: &InteractionSnapshot, top_k: usize) -> RankingOutcome {
    HeuristicRanker::default().rank_movies(movies, interactions, top_k)
}
