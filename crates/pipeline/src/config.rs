//! Tunable constants for the heuristic ranking engine.
//!
//! Defaults reproduce the production weights. Every knob has a `with_*`
//! builder so callers can override single values, and the structs
//! deserialize from JSON so a config file can override them in bulk.

use serde::{Deserialize, Serialize};

/// Weights of the per-movie score components.
///
/// The weights are per signal and do not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub director: f64,
    pub quality: f64,
    pub genre: f64,
    pub content: f64,
    pub popularity: f64,
}

impl RankingWeights {
    /// Director, quality and selected-genre terms only
    pub fn basic() -> Self {
        Self {
            content: 0.0,
            popularity: 0.0,
            ..Self::default()
        }
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            director: 0.5,
            quality: 0.35,
            genre: 0.15,
            content: 0.35,
            popularity: 0.15,
        }
    }
}

/// Weights of the three director affinity components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorWeights {
    pub rating: f64,
    pub like: f64,
    pub quality: f64,
}

impl Default for DirectorWeights {
    fn default() -> Self {
        Self {
            rating: 0.5,
            like: 0.3,
            quality: 0.2,
        }
    }
}

/// Full configuration of the heuristic ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    pub director_weights: DirectorWeights,
    /// Vote count at which a movie's own average and the prior weigh equally
    pub min_votes: f64,
    /// Prior used when the catalog has no rated movie at all
    pub default_global_average: f64,
    /// z for the Wilson lower bound (one-sided 90%)
    pub wilson_z: f64,
    /// Pseudo-count damping directors rated only a few times
    pub rating_shrink: f64,
    /// Divisor inside tanh for the rating component
    pub rating_temperature: f64,
    pub content_genre_weight: f64,
    pub content_director_weight: f64,
    /// Upper bound for the requested list size
    pub max_top_k: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            director_weights: DirectorWeights::default(),
            min_votes: crate::quality::DEFAULT_MIN_VOTES,
            default_global_average: crate::quality::DEFAULT_GLOBAL_AVERAGE,
            wilson_z: crate::statistics::WILSON_Z_90,
            rating_shrink: 3.0,
            rating_temperature: 0.7,
            content_genre_weight: 0.6,
            content_director_weight: 0.4,
            max_top_k: 20,
        }
    }
}

impl RankingConfig {
    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Configure the shrinkage vote count (default: 150)
    pub fn with_min_votes(mut self, min_votes: f64) -> Self {
        self.min_votes = min_votes;
        self
    }

    /// Configure the maximum list size (default: 20)
    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k.max(1);
        self
    }

    /// Clamp a requested list size into `[1, max_top_k]`
    pub fn effective_top_k(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_top_k.max(1))
    }
}
