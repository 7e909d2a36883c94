//! Rating normalization.
//!
//! Raw averages from a handful of votes are not comparable with averages
//! from thousands, so every movie's rating is shrunk toward the catalog mean
//! in proportion to how little evidence backs it (the IMDB weighted rating).

use data_loader::{MovieId, MovieRecord};
use std::collections::HashMap;

/// Prior used when the catalog carries no rating information at all
pub const DEFAULT_GLOBAL_AVERAGE: f64 = 6.5;

/// Vote count at which a movie's own average and the prior weigh equally
pub const DEFAULT_MIN_VOTES: f64 = 150.0;

/// Bayesian weighted rating.
///
/// `v/(v+m) * R + m/(v+m) * C`, where a missing `rating` falls back to the
/// prior `C`. No votes means no evidence, so the prior is returned as is.
pub fn weighted_rating(
    rating: Option<f64>,
    vote_count: Option<u32>,
    global_average: f64,
    min_votes: f64,
) -> f64 {
    let votes = match vote_count {
        Some(v) if v > 0 => v as f64,
        _ => return global_average,
    };
    let r = rating.unwrap_or(global_average);
    let denom = votes + min_votes;
    if denom <= 0.0 {
        return global_average;
    }
    (votes / denom) * r + (min_votes / denom) * global_average
}

/// Map a 0-10 quality value into [0, 1], using `baseline` for non-finite input
pub fn normalize_quality(value: f64, baseline: f64) -> f64 {
    let value = if value.is_finite() { value } else { baseline };
    (value / 10.0).clamp(0.0, 1.0)
}

/// Per-request quality statistics for a catalog snapshot
#[derive(Debug, Clone)]
pub struct CatalogQuality {
    /// Mean of the known ratings in the catalog
    pub global_average: f64,
    /// Mean of the per-movie quality values
    pub global_quality_mean: f64,
    quality_by_movie: HashMap<MovieId, f64>,
    display_by_movie: HashMap<MovieId, f64>,
}

impl CatalogQuality {
    /// Compute quality values for every movie in the snapshot
    pub fn compute(movies: &[MovieRecord], min_votes: f64, default_global_average: f64) -> Self {
        let samples: Vec<f64> = movies.iter().filter_map(|m| m.display_rating()).collect();
        let global_average = mean(&samples).unwrap_or(default_global_average);

        let mut quality_by_movie = HashMap::with_capacity(movies.len());
        let mut display_by_movie = HashMap::with_capacity(movies.len());
        let mut quality_values = Vec::with_capacity(movies.len());

        for movie in movies {
            let quality = movie.weighted_rating.unwrap_or_else(|| {
                weighted_rating(
                    movie.display_rating(),
                    movie.vote_count,
                    global_average,
                    min_votes,
                )
            });
            quality_by_movie.insert(movie.id, quality);
            display_by_movie.insert(movie.id, movie.display_rating().unwrap_or(global_average));
            quality_values.push(quality);
        }

        let global_quality_mean = mean(&quality_values).unwrap_or(global_average);

        Self {
            global_average,
            global_quality_mean,
            quality_by_movie,
            display_by_movie,
        }
    }

    /// Smoothed quality of a movie; unknown ids get the catalog mean
    pub fn quality(&self, movie_id: MovieId) -> f64 {
        self.quality_by_movie
            .get(&movie_id)
            .copied()
            .unwrap_or(self.global_quality_mean)
    }

    /// Rating shown for explanations (raw average, else weighted, else prior)
    pub fn display_quality(&self, movie_id: MovieId) -> f64 {
        self.display_by_movie
            .get(&movie_id)
            .copied()
            .unwrap_or(self.global_quality_mean)
    }

    /// Quality of a movie mapped into [0, 1]
    pub fn normalized(&self, movie_id: MovieId) -> f64 {
        normalize_quality(self.quality(movie_id), self.global_quality_mean)
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
