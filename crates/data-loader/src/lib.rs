//! # Data Loader Crate
//!
//! This crate holds the request snapshots the ranking engines consume.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieRecord, InteractionSnapshot, Review, Like)
//! - **parser**: Parse JSON snapshot files and normalize genre slugs
//! - **index**: Catalog id lookups and directory loading
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::SnapshotBundle;
//! use std::path::Path;
//!
//! let bundle = SnapshotBundle::load_from_dir(Path::new("data/snapshot"))?;
//! let movie = bundle.catalog.get_movie(42).unwrap();
//! println!("{} by {}", movie.title, movie.director_key());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{Catalog, SnapshotBundle};
pub use parser::{normalize_genre_slug, sanitize_genre_slugs};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    CastMember,
    MovieRecord,
    InteractionSnapshot,
    Review,
    Like,
    CommunityData,
    // Constants
    UNKNOWN_DIRECTOR,
    DEFAULT_TOP_K,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_snapshot_signals() {
        let empty = InteractionSnapshot::new();
        assert!(!empty.has_preference_signals());
        assert!(empty.seen_movie_ids().is_empty());

        let snapshot = InteractionSnapshot::for_user(1)
            .with_likes([3, 4])
            .with_rating(4, 8.0)
            .with_rating(9, 2.0);
        assert!(snapshot.has_preference_signals());

        let seen = snapshot.seen_movie_ids();
        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&3) && seen.contains(&4) && seen.contains(&9));
    }

    #[test]
    fn test_effective_selected_genres() {
        let stored = InteractionSnapshot::new().with_preferred_genres(["drama"]);
        assert_eq!(stored.effective_selected_genres(), &["drama".to_string()]);

        let explicit = stored.with_selected_genres(["war"]);
        assert_eq!(explicit.effective_selected_genres(), &["war".to_string()]);
    }

    #[test]
    fn test_director_key() {
        assert_eq!(MovieRecord::new(1, "").director_key(), UNKNOWN_DIRECTOR);
        assert_eq!(MovieRecord::new(1, "   ").director_key(), UNKNOWN_DIRECTOR);
        assert!(!MovieRecord::new(1, UNKNOWN_DIRECTOR).has_known_director());
        assert_eq!(MovieRecord::new(1, "Bong Joon-ho").director_key(), "Bong Joon-ho");
    }

    #[test]
    fn test_movie_record_json_shape() {
        let movie: MovieRecord = serde_json::from_str(
            r#"{"id": 5, "genres": ["drama"], "weightedRating": 7.2, "likeCount": 3,
                "cast": [{"id": 11, "name": "Lead"}]}"#,
        )
        .unwrap();
        assert_eq!(movie.director, UNKNOWN_DIRECTOR);
        assert_eq!(movie.weighted_rating, Some(7.2));
        assert_eq!(movie.avg_rating, None);
        assert_eq!(movie.display_rating(), Some(7.2));
        assert_eq!(movie.cast[0].id, 11);
    }
}
