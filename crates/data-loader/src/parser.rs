//! Parser for JSON snapshot files.
//!
//! Three files make up a request snapshot:
//! - catalog.json: array of movie rows with rating aggregates
//! - interactions.json: one user's likes, ratings and genre choices
//! - community.json: every user's reviews and likes (latent model input)
//!
//! The parser also applies the caller-side invariants the ranking engines
//! assume: normalized genre slugs and ratings clamped to [1, 10].

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Lowest rating a user can give
pub const MIN_USER_RATING: f64 = 1.0;

/// Highest rating a user can give
pub const MAX_USER_RATING: f64 = 10.0;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    serde_json::from_str(&content).map_err(|source| DataLoadError::Json {
        file: path.display().to_string(),
        source,
    })
}

/// Parse a catalog file into normalized movie records
pub fn parse_catalog(path: &Path) -> Result<Vec<MovieRecord>> {
    let movies: Vec<MovieRecord> = read_json(path)?;
    movies.into_iter().map(normalize_movie).collect()
}

/// Parse one user's interaction snapshot
pub fn parse_interactions(path: &Path) -> Result<InteractionSnapshot> {
    let snapshot: InteractionSnapshot = read_json(path)?;
    normalize_interactions(snapshot)
}

/// Parse community reviews and likes
pub fn parse_community(path: &Path) -> Result<CommunityData> {
    let mut community: CommunityData = read_json(path)?;
    for review in &mut community.reviews {
        review.rating = clamp_rating("review.rating", review.rating)?;
    }
    Ok(community)
}

/// Normalize a movie row coming from the catalog service
pub fn normalize_movie(mut movie: MovieRecord) -> Result<MovieRecord> {
    movie.genres = sanitize_genre_slugs(&movie.genres);
    if movie.director.trim().is_empty() {
        movie.director = UNKNOWN_DIRECTOR.to_string();
    }
    for (field, value) in [
        ("avgRating", movie.avg_rating),
        ("weightedRating", movie.weighted_rating),
    ] {
        if let Some(v) = value
            && !v.is_finite()
        {
            return Err(DataLoadError::InvalidValue {
                field: format!("movie {} {}", movie.id, field),
                value: v.to_string(),
            });
        }
    }
    Ok(movie)
}

/// Normalize genre choices and clamp ratings into the valid range
pub fn normalize_interactions(mut snapshot: InteractionSnapshot) -> Result<InteractionSnapshot> {
    snapshot.selected_genres = sanitize_genre_slugs(&snapshot.selected_genres);
    snapshot.preferred_genres = sanitize_genre_slugs(&snapshot.preferred_genres);
    for (movie_id, rating) in snapshot.user_ratings_by_movie.iter_mut() {
        *rating = clamp_rating(&format!("rating for movie {}", movie_id), *rating)?;
    }
    Ok(snapshot)
}

fn clamp_rating(field: &str, rating: f64) -> Result<f64> {
    if !rating.is_finite() {
        return Err(DataLoadError::InvalidValue {
            field: field.to_string(),
            value: rating.to_string(),
        });
    }
    let clamped = rating.clamp(MIN_USER_RATING, MAX_USER_RATING);
    if clamped != rating {
        debug!("Clamped {} from {} to {}", field, rating, clamped);
    }
    Ok(clamped)
}

/// Normalize a genre name into a slug
///
/// Example: "  Science Fiction " -> "science-fiction"
///          "Sci-Fi & Fantasy"   -> "sci-fi-fantasy"
///          "드라마"              -> "드라마"
///
/// Only the raw input is trimmed; a whitespace run left at an edge after
/// dropping symbols still becomes `-` ("& Drama" -> "-drama").
pub fn normalize_genre_slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else if c.is_ascii_alphanumeric() || is_hangul_syllable(c) || c == '-' {
            slug.push(c);
            in_whitespace = false;
        }
    }
    slug
}

/// Normalize a list of genre names, dropping blanks and duplicates
/// while keeping first-occurrence order
pub fn sanitize_genre_slugs<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut slugs: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let slug = normalize_genre_slug(value.as_ref());
        if !slug.is_empty() && !slugs.contains(&slug) {
            slugs.push(slug);
        }
    }
    slugs
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_genre_slug() {
        assert_eq!(normalize_genre_slug("  Science Fiction "), "science-fiction");
        assert_eq!(normalize_genre_slug("Sci-Fi & Fantasy"), "sci-fi-fantasy");
        assert_eq!(normalize_genre_slug("Action"), "action");
        assert_eq!(normalize_genre_slug("드라마"), "드라마");
        assert_eq!(normalize_genre_slug("Café"), "caf");
        assert_eq!(normalize_genre_slug("!!!"), "");
    }

    #[test]
    fn test_normalize_keeps_edge_dashes_from_dropped_symbols() {
        assert_eq!(normalize_genre_slug("& Drama"), "-drama");
        assert_eq!(normalize_genre_slug("Drama &"), "drama-");
        // Symbols between spaces leave one run, not two
        assert_eq!(normalize_genre_slug("War & Politics"), "war-politics");
        assert_eq!(normalize_genre_slug("a - b"), "a---b");
        assert_eq!(normalize_genre_slug("   "), "");
    }

    #[test]
    fn test_sanitize_dedups_and_drops_blanks() {
        let slugs = sanitize_genre_slugs(&["Drama", "drama ", "", "War", "  "]);
        assert_eq!(slugs, vec!["drama".to_string(), "war".to_string()]);
    }

    #[test]
    fn test_normalize_interactions_clamps() {
        let snapshot = InteractionSnapshot::for_user(1)
            .with_rating(1, 12.0)
            .with_rating(2, 0.0)
            .with_rating(3, 7.5)
            .with_selected_genres(["Action", "action"]);

        let normalized = normalize_interactions(snapshot).unwrap();
        assert_eq!(normalized.user_ratings_by_movie[&1], 10.0);
        assert_eq!(normalized.user_ratings_by_movie[&2], 1.0);
        assert_eq!(normalized.user_ratings_by_movie[&3], 7.5);
        assert_eq!(normalized.selected_genres, vec!["action".to_string()]);
    }

    #[test]
    fn test_normalize_interactions_rejects_nan() {
        let snapshot = InteractionSnapshot::for_user(1).with_rating(1, f64::NAN);
        assert!(normalize_interactions(snapshot).is_err());
    }

    #[test]
    fn test_normalize_movie_fills_unknown_director() {
        let movie = normalize_movie(MovieRecord::new(1, "  ").with_genres(["Drama"])).unwrap();
        assert_eq!(movie.director, UNKNOWN_DIRECTOR);
        assert_eq!(movie.genres, vec!["drama".to_string()]);
    }

    #[test]
    fn test_missing_file() {
        let result = parse_catalog(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
