//! Ranking with a trained latent-factor snapshot.

use crate::snapshot::ModelSnapshot;
use data_loader::MovieId;
use pipeline::{
    candidate_pool, sort_descending, RankingConfig, RankingOutcome, RankingRequest,
    RankingStrategy, ScoredMovie,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Scores every unseen movie with the model's predicted rating
#[derive(Debug, Clone)]
pub struct LatentStrategy {
    snapshot: Arc<ModelSnapshot>,
    max_top_k: usize,
}

impl LatentStrategy {
    pub fn new(snapshot: Arc<ModelSnapshot>) -> Self {
        Self {
            snapshot,
            max_top_k: RankingConfig::default().max_top_k,
        }
    }

    /// Configure the maximum list size (default: 20)
    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k.max(1);
        self
    }
}

impl RankingStrategy for LatentStrategy {
    fn name(&self) -> &str {
        "LatentStrategy"
    }

    #[instrument(skip_all, fields(movies = request.movies.len(), top_k = request.top_k))]
    fn rank(&self, request: &RankingRequest) -> RankingOutcome {
        let interactions = &request.interactions;
        let user = interactions.user_id;
        let top_k = request.top_k.clamp(1, self.max_top_k);

        let mut seen: HashSet<MovieId> = interactions.seen_movie_ids();
        if let Some(user_id) = user {
            seen.extend(self.snapshot.implicit_movies(user_id));
        }

        let pool = candidate_pool(&request.movies, &seen);
        let mut ranked: Vec<ScoredMovie> = pool
            .par_iter()
            .map(|movie| ScoredMovie {
                movie_id: movie.id,
                score: f64::from(self.snapshot.predict_for(user, movie.id)),
            })
            .collect();

        sort_descending(&mut ranked);
        ranked.truncate(top_k);
        debug!("Ranked {} of {} candidates", ranked.len(), pool.len());

        RankingOutcome {
            ranked_movies: ranked,
            director_scores: Vec::new(),
            has_preference_signals: interactions.has_preference_signals(),
        }
    }
}
