//! Director affinity.
//!
//! Aggregates the movies a user liked or rated by director and turns each
//! director's record into one explainable score built from three parts:
//!
//! - **rating**: how far the user's ratings for this director sit above or
//!   below their overall mean, damped for thin samples and squashed by tanh
//! - **like**: Wilson lower bound of liked / seen
//! - **quality**: mean smoothed quality of the director's movies, in [0, 1]

use crate::config::RankingConfig;
use crate::profile::UserProfile;
use crate::quality::{normalize_quality, CatalogQuality};
use crate::statistics::wilson_lower_bound_with_z;
use data_loader::{InteractionSnapshot, MovieRecord};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Affinity of one user for one director
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorScore {
    pub director: String,
    pub score: f64,
    pub liked_count: u32,
    /// Liked or rated
    pub seen_count: u32,
    /// Mean display rating of the movies backing the quality component
    pub avg_quality: f64,
}

#[derive(Debug, Default)]
struct DirectorAccumulator {
    liked_count: u32,
    seen_count: u32,
    rating_count: u32,
    rating_sum: f64,
    liked_quality_sum: f64,
    seen_quality_sum: f64,
    liked_display_sum: f64,
    seen_display_sum: f64,
}

impl DirectorAccumulator {
    /// Liked movies back the quality figures when there are any, else
    /// every seen movie does, so rated-only directors keep a quality value
    fn quality_source(&self, liked_sum: f64, seen_sum: f64) -> Option<f64> {
        let (sum, count) = if self.liked_count > 0 {
            (liked_sum, self.liked_count)
        } else {
            (seen_sum, self.seen_count)
        };
        (count > 0).then(|| sum / count as f64)
    }
}

/// Score every director the user has interacted with, best first.
///
/// Returns an empty list when the user has neither likes nor ratings.
pub fn compute_director_scores(
    movies: &[MovieRecord],
    interactions: &InteractionSnapshot,
    config: &RankingConfig,
) -> Vec<DirectorScore> {
    let quality = CatalogQuality::compute(movies, config.min_votes, config.default_global_average);
    let profile = UserProfile::build(interactions);
    director_scores_for(movies, &profile, &quality, config)
}

pub(crate) fn director_scores_for(
    movies: &[MovieRecord],
    profile: &UserProfile<'_>,
    quality: &CatalogQuality,
    config: &RankingConfig,
) -> Vec<DirectorScore> {
    if !profile.has_preference_signals() {
        return Vec::new();
    }

    // First-seen order keeps ties stable across runs
    let mut order: Vec<&str> = Vec::new();
    let mut stats: HashMap<&str, DirectorAccumulator> = HashMap::new();

    for movie in movies {
        let liked = profile.liked.contains(&movie.id);
        let user_rating = profile.rating_for(movie.id);
        if !liked && user_rating.is_none() {
            continue;
        }

        let director = movie.director_key();
        let acc = stats.entry(director).or_insert_with(|| {
            order.push(director);
            DirectorAccumulator::default()
        });

        let movie_quality = quality.quality(movie.id);
        let display_quality = quality.display_quality(movie.id);
        acc.seen_count += 1;
        acc.seen_quality_sum += movie_quality;
        acc.seen_display_sum += display_quality;
        if liked {
            acc.liked_count += 1;
            acc.liked_quality_sum += movie_quality;
            acc.liked_display_sum += display_quality;
        }
        if let Some(rating) = user_rating {
            acc.rating_count += 1;
            acc.rating_sum += rating;
        }
    }

    let weights = config.director_weights;
    let mut scores: Vec<DirectorScore> = order
        .into_iter()
        .filter_map(|director| {
            let acc = stats.get(director)?;

            let rating_component = rating_component(acc, profile.rating_mean, config);
            let like_component =
                wilson_lower_bound_with_z(acc.liked_count, acc.seen_count, config.wilson_z);
            let avg_quality_for_score = acc
                .quality_source(acc.liked_quality_sum, acc.seen_quality_sum)
                .unwrap_or(quality.global_quality_mean);
            let display_avg_quality = acc
                .quality_source(acc.liked_display_sum, acc.seen_display_sum)
                .unwrap_or(quality.global_quality_mean);
            let quality_component =
                normalize_quality(avg_quality_for_score, quality.global_quality_mean);

            let score = weights.rating * rating_component
                + weights.like * like_component
                + weights.quality * quality_component;

            Some(DirectorScore {
                director: director.to_string(),
                score,
                liked_count: acc.liked_count,
                seen_count: acc.seen_count,
                avg_quality: display_avg_quality,
            })
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!("Scored {} directors", scores.len());
    scores
}

/// tanh-squashed deviation of this director's ratings from the user's mean
fn rating_component(
    acc: &DirectorAccumulator,
    user_rating_mean: Option<f64>,
    config: &RankingConfig,
) -> f64 {
    if acc.rating_count == 0 {
        return 0.0;
    }
    let director_mean = acc.rating_sum / acc.rating_count as f64;
    let delta = user_rating_mean.map_or(0.0, |mean| director_mean - mean);
    let count = acc.rating_count as f64;
    let shrink = count / (count + config.rating_shrink);
    if shrink <= 0.0 || config.rating_temperature <= 0.0 {
        return 0.0;
    }
    ((delta * shrink) / config.rating_temperature).tanh()
}
