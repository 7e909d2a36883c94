//! Immutable trained models.
//!
//! Training happens on a private `LatentFactorModel`; once finished it is
//! frozen into a `ModelSnapshot` that readers share behind an `Arc` and
//! predict from without locking.

use crate::config::LatentConfig;
use crate::model::{LatentFactorModel, Parameters, TrainingReport};
use data_loader::{CommunityData, MovieId, MovieRecord, UserId};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("no reviews to train on")]
    NoTrainingData,

    #[error("model has not been trained")]
    NotTrained,
}

/// Frozen parameters of a trained model
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    params: Parameters,
    report: TrainingReport,
}

impl ModelSnapshot {
    pub(crate) fn new(params: Parameters, report: TrainingReport) -> Self {
        Self { params, report }
    }

    /// Predicted rating in `[1, 10]`
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        self.params.clamped_prediction(Some(user_id), movie_id)
    }

    /// `None` is a visitor without an id (all-zero user vectors)
    pub fn predict_for(&self, user: Option<UserId>, movie_id: MovieId) -> f32 {
        self.params.clamped_prediction(user, movie_id)
    }

    pub fn global_bias(&self) -> f32 {
        self.params.global_bias()
    }

    /// Movies the user liked or reviewed in the training data
    pub fn implicit_movies(&self, user_id: UserId) -> &[MovieId] {
        self.params.implicit_set(user_id)
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }
}

/// Everything one training run reads
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub movies: Vec<MovieRecord>,
    pub community: CommunityData,
}

impl TrainingData {
    pub fn new(movies: Vec<MovieRecord>, community: CommunityData) -> Self {
        Self { movies, community }
    }
}

/// Train a fresh model on `data` and freeze it.
///
/// Fails with [`ModelError::NoTrainingData`] when there are no reviews.
#[instrument(skip_all, fields(movies = data.movies.len(), reviews = data.community.reviews.len()))]
pub fn train_snapshot(data: &TrainingData, config: &LatentConfig) -> Result<ModelSnapshot, ModelError> {
    let reviews = &data.community.reviews;
    if reviews.is_empty() {
        return Err(ModelError::NoTrainingData);
    }

    let mut model = LatentFactorModel::new(config.clone());
    model.initialize(&data.movies, reviews, &data.community.likes);
    let report = model.train(reviews);
    model.into_snapshot(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Like, Review};

    fn training_data() -> TrainingData {
        let movies = vec![
            MovieRecord::new(1, "A").with_genres(["drama"]),
            MovieRecord::new(2, "B").with_genres(["action"]),
        ];
        let reviews = vec![
            Review { user_id: 1, movie_id: 1, rating: 9.0 },
            Review { user_id: 2, movie_id: 2, rating: 5.0 },
        ];
        let likes = vec![Like { user_id: 1, movie_id: 2 }];
        TrainingData::new(movies, CommunityData::new(reviews, likes))
    }

    #[test]
    fn test_no_reviews_is_an_error() {
        let data = TrainingData::new(training_data().movies, CommunityData::default());
        let result = train_snapshot(&data, &LatentConfig::default().with_seed(1));
        assert_eq!(result.err(), Some(ModelError::NoTrainingData));
    }

    #[test]
    fn test_snapshot_predictions() {
        let config = LatentConfig::default().with_seed(11);
        let snapshot = train_snapshot(&training_data(), &config).unwrap();

        assert_eq!(snapshot.global_bias(), 7.0);
        assert_eq!(snapshot.report().observations, 2);
        assert_eq!(snapshot.implicit_movies(1), &[1, 2]);

        let p = snapshot.predict(1, 1);
        assert!((1.0..=10.0).contains(&p));
        let anonymous = snapshot.predict_for(None, 1);
        assert!((1.0..=10.0).contains(&anonymous));
        assert_eq!(snapshot.predict_for(Some(1), 1), p);
    }
}
