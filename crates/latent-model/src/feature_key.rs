//! Typed identifiers for content features.

use data_loader::MovieRecord;
use std::fmt;

/// A content attribute a movie can carry.
///
/// Each kind is its own namespace, so a genre and a director with the same
/// name never share a vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    Genre(String),
    Director(String),
    /// Cast member id
    Actor(u32),
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Genre(genre) => write!(f, "genre:{}", genre),
            FeatureKey::Director(director) => write!(f, "director:{}", director),
            FeatureKey::Actor(id) => write!(f, "actor:{}", id),
        }
    }
}

/// Content features of a movie: every genre, the director when known, and
/// the first `max_cast` billed cast members
pub fn content_features(movie: &MovieRecord, max_cast: usize) -> Vec<FeatureKey> {
    let mut features: Vec<FeatureKey> = movie
        .genres
        .iter()
        .map(|g| FeatureKey::Genre(g.clone()))
        .collect();
    if movie.has_known_director() {
        features.push(FeatureKey::Director(movie.director_key().to_string()));
    }
    features.extend(
        movie
            .cast
            .iter()
            .take(max_cast)
            .map(|member| FeatureKey::Actor(member.id)),
    );
    features
}
