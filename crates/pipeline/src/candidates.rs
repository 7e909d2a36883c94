//! Candidate pool selection.
//!
//! Movies the user already liked or rated are not recommended again, unless
//! that would leave nothing to recommend.

use data_loader::{MovieId, MovieRecord};
use std::collections::HashSet;

/// Catalog movies not in `seen`, or the whole catalog when every movie is seen.
///
/// Uses the `seen` HashSet for O(1) lookups and keeps catalog order.
pub fn candidate_pool<'a>(movies: &'a [MovieRecord], seen: &HashSet<MovieId>) -> Vec<&'a MovieRecord> {
    let unseen: Vec<&MovieRecord> = movies.iter().filter(|m| !seen.contains(&m.id)).collect();
    if unseen.is_empty() {
        movies.iter().collect()
    } else {
        unseen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<MovieRecord> {
        [100, 101, 200, 300]
            .into_iter()
            .map(|id| MovieRecord::new(id, "A"))
            .collect()
    }

    #[test]
    fn test_excludes_seen_movies() {
        let movies = catalog();
        let seen: HashSet<MovieId> = [100, 200].into_iter().collect();

        let pool = candidate_pool(&movies, &seen);
        let ids: Vec<MovieId> = pool.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![101, 300]);
    }

    #[test]
    fn test_falls_back_to_full_catalog() {
        let movies = catalog();
        let seen: HashSet<MovieId> = movies.iter().map(|m| m.id).collect();

        let pool = candidate_pool(&movies, &seen);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool[0].id, 100);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(candidate_pool(&[], &HashSet::new()).is_empty());
    }
}
