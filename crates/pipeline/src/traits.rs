//! The seam shared by every ranking strategy.
//!
//! The heuristic ranker and the latent-factor model both take the same
//! request snapshot and hand back the same ranked list, so callers pick a
//! strategy without changing anything else.

use crate::director::DirectorScore;
use data_loader::{InteractionSnapshot, MovieId, MovieRecord, DEFAULT_TOP_K};
use serde::Serialize;

/// One recommendation request: a catalog snapshot plus one user's interactions
#[derive(Debug, Clone)]
pub struct RankingRequest {
    pub movies: Vec<MovieRecord>,
    pub interactions: InteractionSnapshot,
    /// Requested list size, clamped by the strategy
    pub top_k: usize,
}

impl RankingRequest {
    pub fn new(movies: Vec<MovieRecord>, interactions: InteractionSnapshot) -> Self {
        Self {
            movies,
            interactions,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// A movie and its score; list order defines the recommendation order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f64,
}

/// Ranked recommendations plus optional director diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingOutcome {
    pub ranked_movies: Vec<ScoredMovie>,
    pub director_scores: Vec<DirectorScore>,
    pub has_preference_signals: bool,
}

/// Core trait for ranking strategies.
///
/// ## Design Note
/// - `Send + Sync` lets the orchestrator share strategies across tasks
/// - Ranking never fails: sparse or missing data degrades to priors
pub trait RankingStrategy: Send + Sync {
    /// Returns the name of this strategy (for logging/debugging)
    fn name(&self) -> &str;

    /// Rank the request's catalog for the request's user
    fn rank(&self, request: &RankingRequest) -> RankingOutcome;
}

/// Stable descending sort by score; equal scores keep input order
pub fn sort_descending(scored: &mut [ScoredMovie]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
