//! Core domain types for catalog and interaction snapshots.
//!
//! Every request works on its own snapshot: catalog rows already joined with
//! aggregate rating statistics, plus one user's likes, ratings and genre
//! choices. Nothing here is persisted or shared between requests.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// Director display name used when the catalog has no director for a movie
pub const UNKNOWN_DIRECTOR: &str = "미상";

/// Number of recommendations returned when the caller does not ask for a size
pub const DEFAULT_TOP_K: usize = 6;

fn unknown_director() -> String {
    UNKNOWN_DIRECTOR.to_string()
}

// =============================================================================
// Movie-related Types
// =============================================================================

/// A credited cast member, in billing order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// One catalog row as seen by the ranking engines.
///
/// `weighted_rating` is a precomputed Bayesian estimate and wins over
/// `avg_rating` whenever both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default = "unknown_director")]
    pub director: String,
    /// Normalized genre slugs
    #[serde(default)]
    pub genres: Vec<String>,
    /// Mean rating on a 0-10 scale
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub weighted_rating: Option<f64>,
    #[serde(default)]
    pub like_count: Option<u32>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl MovieRecord {
    /// Create a record with no statistics attached
    pub fn new(id: MovieId, director: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            director: director.into(),
            genres: Vec::new(),
            avg_rating: None,
            vote_count: None,
            weighted_rating: None,
            like_count: None,
            cast: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the raw rating aggregate (average and vote count)
    pub fn with_rating(mut self, avg_rating: f64, vote_count: u32) -> Self {
        self.avg_rating = Some(avg_rating);
        self.vote_count = Some(vote_count);
        self
    }

    pub fn with_weighted_rating(mut self, weighted_rating: f64) -> Self {
        self.weighted_rating = Some(weighted_rating);
        self
    }

    pub fn with_like_count(mut self, like_count: u32) -> Self {
        self.like_count = Some(like_count);
        self
    }

    pub fn with_cast(mut self, cast: Vec<CastMember>) -> Self {
        self.cast = cast;
        self
    }

    /// Director name used as an aggregation key.
    ///
    /// Blank names collapse into [`UNKNOWN_DIRECTOR`] so accumulation and
    /// lookup always agree on the key.
    pub fn director_key(&self) -> &str {
        let trimmed = self.director.trim();
        if trimmed.is_empty() {
            UNKNOWN_DIRECTOR
        } else {
            &self.director
        }
    }

    /// Whether the director is the unknown sentinel (or blank)
    pub fn has_known_director(&self) -> bool {
        self.director_key() != UNKNOWN_DIRECTOR
    }

    /// Rating shown to users: the raw average, else the weighted estimate
    pub fn display_rating(&self) -> Option<f64> {
        self.avg_rating.or(self.weighted_rating)
    }
}

// =============================================================================
// Interaction Types
// =============================================================================

/// One user's interaction state for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSnapshot {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub liked_movie_ids: Vec<MovieId>,
    /// At most one rating per movie, each in [1, 10].
    ///
    /// Ordered so that aggregates over the map are reproducible.
    #[serde(default)]
    pub user_ratings_by_movie: BTreeMap<MovieId, f64>,
    /// Genres chosen for this request
    #[serde(default)]
    pub selected_genres: Vec<String>,
    /// Genres stored in the user's profile
    #[serde(default)]
    pub preferred_genres: Vec<String>,
}

impl InteractionSnapshot {
    /// Snapshot for an anonymous visitor with no history
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_likes(mut self, liked: impl IntoIterator<Item = MovieId>) -> Self {
        self.liked_movie_ids.extend(liked);
        self
    }

    pub fn with_rating(mut self, movie_id: MovieId, rating: f64) -> Self {
        self.user_ratings_by_movie.insert(movie_id, rating);
        self
    }

    pub fn with_selected_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preferred_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// True when the user has liked or rated at least one movie
    pub fn has_preference_signals(&self) -> bool {
        !self.liked_movie_ids.is_empty() || !self.user_ratings_by_movie.is_empty()
    }

    /// Movies the user has liked or rated
    pub fn seen_movie_ids(&self) -> HashSet<MovieId> {
        self.liked_movie_ids
            .iter()
            .copied()
            .chain(self.user_ratings_by_movie.keys().copied())
            .collect()
    }

    /// Explicit selection wins; stored preferences fill in when it is empty
    pub fn effective_selected_genres(&self) -> &[String] {
        if self.selected_genres.is_empty() {
            &self.preferred_genres
        } else {
            &self.selected_genres
        }
    }
}

/// A community review used to train the latent-factor model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 1.0 to 10.0
    pub rating: f64,
}

/// A community like used as implicit feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

/// All reviews and likes across users, the latent model's training input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityData {
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub likes: Vec<Like>,
}

impl CommunityData {
    pub fn new(reviews: Vec<Review>, likes: Vec<Like>) -> Self {
        Self { reviews, likes }
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty() && self.likes.is_empty()
    }
}
