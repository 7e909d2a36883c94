//! Content affinity.
//!
//! Frequency profile of the genres and directors in the user's liked or
//! rated movies. A candidate scores by how much of that profile it shares,
//! independently of how the user rated those directors.

use crate::profile::UserProfile;
use data_loader::MovieRecord;
use std::collections::HashMap;

/// Genre and director frequencies over the user's seen movies
#[derive(Debug, Clone, Default)]
pub struct ContentProfile {
    genre_frequency: HashMap<String, u32>,
    director_frequency: HashMap<String, u32>,
    total_genre_signals: u32,
    total_director_signals: u32,
}

impl ContentProfile {
    /// Count one occurrence per genre tag and per director of each seen movie
    pub fn build(movies: &[MovieRecord], profile: &UserProfile<'_>) -> Self {
        let mut content = Self::default();
        for movie in movies.iter().filter(|m| profile.is_seen(m.id)) {
            for genre in &movie.genres {
                *content.genre_frequency.entry(genre.clone()).or_insert(0) += 1;
                content.total_genre_signals += 1;
            }
            *content
                .director_frequency
                .entry(movie.director_key().to_string())
                .or_insert(0) += 1;
            content.total_director_signals += 1;
        }
        content
    }

    pub fn genre_count(&self, genre: &str) -> u32 {
        self.genre_frequency.get(genre).copied().unwrap_or(0)
    }

    pub fn director_count(&self, director: &str) -> u32 {
        self.director_frequency.get(director).copied().unwrap_or(0)
    }

    pub fn total_genre_signals(&self) -> u32 {
        self.total_genre_signals
    }

    pub fn total_director_signals(&self) -> u32 {
        self.total_director_signals
    }

    /// `genre_weight * genre_score + director_weight * director_score`.
    ///
    /// The genre score is the mean share of the user's genre signals held by
    /// each of the movie's genres; the director score is the director's
    /// share of director signals. Both are 0 without signals.
    pub fn affinity(&self, movie: &MovieRecord, genre_weight: f64, director_weight: f64) -> f64 {
        let genre_score = if self.total_genre_signals > 0 {
            let total = self.total_genre_signals as f64;
            let sum: f64 = movie
                .genres
                .iter()
                .map(|g| self.genre_count(g) as f64 / total)
                .sum();
            sum / movie.genres.len().max(1) as f64
        } else {
            0.0
        };

        let director_score = if self.total_director_signals > 0 {
            self.director_count(movie.director_key()) as f64 / self.total_director_signals as f64
        } else {
            0.0
        };

        genre_weight * genre_score + director_weight * director_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::InteractionSnapshot;

    fn catalog() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new(1, "A").with_genres(["drama", "war"]),
            MovieRecord::new(2, "A").with_genres(["drama"]),
            MovieRecord::new(3, "B").with_genres(["comedy"]),
            MovieRecord::new(4, "A").with_genres(["drama", "comedy"]),
            MovieRecord::new(5, "C").with_genres(Vec::<String>::new()),
        ]
    }

    #[test]
    fn test_frequencies_count_occurrences() {
        let interactions = InteractionSnapshot::for_user(1)
            .with_likes([1])
            .with_rating(2, 7.0)
            .with_rating(3, 4.0);
        let profile = UserProfile::build(&interactions);
        let content = ContentProfile::build(&catalog(), &profile);

        assert_eq!(content.genre_count("drama"), 2);
        assert_eq!(content.genre_count("war"), 1);
        assert_eq!(content.total_genre_signals(), 4);
        assert_eq!(content.director_count("A"), 2);
        assert_eq!(content.total_director_signals(), 3);
    }

    #[test]
    fn test_affinity() {
        let interactions = InteractionSnapshot::for_user(1)
            .with_likes([1])
            .with_rating(2, 7.0)
            .with_rating(3, 4.0);
        let profile = UserProfile::build(&interactions);
        let content = ContentProfile::build(&catalog(), &profile);
        let movies = catalog();

        // Movie 4: drama 2/4, comedy 1/4 -> genre 0.375; director A 2/3
        let expected = 0.6 * 0.375 + 0.4 * (2.0 / 3.0);
        assert!((content.affinity(&movies[3], 0.6, 0.4) - expected).abs() < 1e-12);

        // No genres and an unseen director
        assert_eq!(content.affinity(&movies[4], 0.6, 0.4), 0.0);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let interactions = InteractionSnapshot::new();
        let profile = UserProfile::build(&interactions);
        let content = ContentProfile::build(&catalog(), &profile);

        for movie in catalog() {
            assert_eq!(content.affinity(&movie, 0.6, 0.4), 0.0);
        }
    }
}
