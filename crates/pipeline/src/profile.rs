//! Per-request user profile.
//!
//! Gathers everything the scorers need from an interaction snapshot once,
//! so the per-movie loops only do set lookups.

use data_loader::{InteractionSnapshot, MovieId};
use std::collections::{BTreeMap, HashSet};

/// Lookup-friendly view of one user's interactions
#[derive(Debug, Clone)]
pub struct UserProfile<'a> {
    pub liked: HashSet<MovieId>,
    /// Liked or rated
    pub seen: HashSet<MovieId>,
    pub ratings: &'a BTreeMap<MovieId, f64>,
    /// Mean over all of the user's ratings, `None` without ratings
    pub rating_mean: Option<f64>,
    pub selected_genres: HashSet<&'a str>,
}

impl<'a> UserProfile<'a> {
    pub fn build(interactions: &'a InteractionSnapshot) -> Self {
        let ratings = &interactions.user_ratings_by_movie;
        let rating_mean = if ratings.is_empty() {
            None
        } else {
            Some(ratings.values().sum::<f64>() / ratings.len() as f64)
        };

        Self {
            liked: interactions.liked_movie_ids.iter().copied().collect(),
            seen: interactions.seen_movie_ids(),
            ratings,
            rating_mean,
            selected_genres: interactions
                .effective_selected_genres()
                .iter()
                .map(String::as_str)
                .collect(),
        }
    }

    /// True when the user has liked or rated at least one movie
    pub fn has_preference_signals(&self) -> bool {
        !self.liked.is_empty() || !self.ratings.is_empty()
    }

    pub fn is_seen(&self, movie_id: MovieId) -> bool {
        self.seen.contains(&movie_id)
    }

    pub fn rating_for(&self, movie_id: MovieId) -> Option<f64> {
        self.ratings.get(&movie_id).copied()
    }
}
