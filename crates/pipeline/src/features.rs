//! Score components for candidate movies.
//!
//! Each candidate gets five normalized components; the ranker combines them
//! with the configured weights. Keeping the components around (rather than
//! only the sum) lets callers explain a recommendation.

use crate::config::{RankingConfig, RankingWeights};
use crate::content::ContentProfile;
use crate::profile::UserProfile;
use crate::quality::CatalogQuality;
use data_loader::{MovieId, MovieRecord};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Components computed for each candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFeatures {
    pub movie_id: MovieId,
    /// Affinity score of the movie's director (0 for unseen directors)
    pub director: f64,
    /// Smoothed quality in [0, 1]
    pub quality: f64,
    /// Share of the selected genres this movie carries
    pub genre: f64,
    /// Overlap with the user's genre/director frequency profile
    pub content: f64,
    /// log-scaled like count relative to the catalog maximum
    pub popularity: f64,
}

impl CandidateFeatures {
    /// Weighted sum of the components
    pub fn score(&self, weights: &RankingWeights) -> f64 {
        weights.director * self.director
            + weights.quality * self.quality
            + weights.genre * self.genre
            + weights.content * self.content
            + weights.popularity * self.popularity
    }
}

/// Shared per-request state the components are computed from
pub struct FeatureEngineer<'a> {
    quality: &'a CatalogQuality,
    profile: &'a UserProfile<'a>,
    content: &'a ContentProfile,
    director_scores: &'a HashMap<String, f64>,
    max_like_count: u32,
    config: &'a RankingConfig,
}

impl<'a> FeatureEngineer<'a> {
    pub fn new(
        movies: &[MovieRecord],
        quality: &'a CatalogQuality,
        profile: &'a UserProfile<'a>,
        content: &'a ContentProfile,
        director_scores: &'a HashMap<String, f64>,
        config: &'a RankingConfig,
    ) -> Self {
        let max_like_count = movies
            .iter()
            .map(|m| m.like_count.unwrap_or(0))
            .max()
            .unwrap_or(0);
        Self {
            quality,
            profile,
            content,
            director_scores,
            max_like_count,
            config,
        }
    }

    /// Compute features for all candidates in parallel.
    ///
    /// Returns one entry per candidate, in the same order.
    pub fn compute_features(&self, candidates: &[&MovieRecord]) -> Vec<CandidateFeatures> {
        candidates
            .par_iter()
            .map(|movie| self.compute_single(movie))
            .collect()
    }

    fn compute_single(&self, movie: &MovieRecord) -> CandidateFeatures {
        CandidateFeatures {
            movie_id: movie.id,
            director: self
                .director_scores
                .get(movie.director_key())
                .copied()
                .unwrap_or(0.0),
            quality: self.quality.normalized(movie.id),
            genre: genre_overlap(&movie.genres, &self.profile.selected_genres),
            content: self.content.affinity(
                movie,
                self.config.content_genre_weight,
                self.config.content_director_weight,
            ),
            popularity: popularity(movie.like_count.unwrap_or(0), self.max_like_count),
        }
    }
}

/// `|movie genres ∩ selected| / |selected|`, 0 when nothing is selected
pub fn genre_overlap(movie_genres: &[String], selected: &HashSet<&str>) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }
    let overlap = movie_genres
        .iter()
        .filter(|g| selected.contains(g.as_str()))
        .count();
    overlap as f64 / selected.len() as f64
}

/// `log1p(likes) / log1p(max_likes)`, 0 when no movie has likes
pub fn popularity(like_count: u32, max_like_count: u32) -> f64 {
    if max_like_count == 0 {
        return 0.0;
    }
    (like_count as f64).ln_1p() / (max_like_count as f64).ln_1p()
}
