//! Catalog indexing.
//!
//! The ranking engines walk movies in catalog order (ties in every sort are
//! broken by that order), so the catalog keeps the original `Vec` and adds an
//! id index on the side for O(1) lookups.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::{CommunityData, InteractionSnapshot, MovieId, MovieRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Catalog snapshot with id lookups
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
    by_id: HashMap<MovieId, usize>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate movie ids
    pub fn from_movies(movies: Vec<MovieRecord>) -> Result<Self> {
        let mut catalog = Self::new();
        for movie in movies {
            catalog.insert_movie(movie)?;
        }
        Ok(catalog)
    }

    /// Insert a movie at the end of the catalog
    pub fn insert_movie(&mut self, movie: MovieRecord) -> Result<()> {
        if self.by_id.contains_key(&movie.id) {
            return Err(DataLoadError::ValidationError(format!(
                "duplicate movie id {}",
                movie.id
            )));
        }
        self.by_id.insert(movie.id, self.movies.len());
        self.movies.push(movie);
        Ok(())
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&MovieRecord> {
        self.by_id.get(&id).map(|&idx| &self.movies[idx])
    }

    /// All movies in catalog order
    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Counts for logging: (movies, movies with rating stats, movies with likes)
    pub fn counts(&self) -> (usize, usize, usize) {
        let rated = self
            .movies
            .iter()
            .filter(|m| m.display_rating().is_some())
            .count();
        let liked = self
            .movies
            .iter()
            .filter(|m| m.like_count.unwrap_or(0) > 0)
            .count();
        (self.movies.len(), rated, liked)
    }

    /// Hand the movies back in catalog order
    pub fn into_movies(self) -> Vec<MovieRecord> {
        self.movies
    }
}

/// Everything one recommendation request needs, loaded from a directory
#[derive(Debug, Clone)]
pub struct SnapshotBundle {
    pub catalog: Catalog,
    pub interactions: InteractionSnapshot,
    pub community: CommunityData,
}

impl SnapshotBundle {
    /// Load catalog.json, interactions.json and community.json from a directory
    ///
    /// The three files are parsed in parallel. A missing community.json is
    /// not an error: the heuristic strategy does not need it.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading snapshot from {:?}", data_dir);

        let catalog_path = data_dir.join("catalog.json");
        let interactions_path = data_dir.join("interactions.json");
        let community_path = data_dir.join("community.json");

        let ((movies, interactions), community) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_catalog(&catalog_path),
                    || parser::parse_interactions(&interactions_path),
                )
            },
            || {
                if community_path.exists() {
                    parser::parse_community(&community_path)
                } else {
                    Ok(CommunityData::default())
                }
            },
        );

        let catalog = Catalog::from_movies(movies?)?;
        let interactions = interactions?;
        let community = community?;

        info!(
            "Loaded {} movies, {} likes, {} ratings, {} community reviews",
            catalog.len(),
            interactions.liked_movie_ids.len(),
            interactions.user_ratings_by_movie.len(),
            community.reviews.len()
        );

        Ok(Self {
            catalog,
            interactions,
            community,
        })
    }
}
