//! Latent-factor model combining explicit ratings, implicit feedback and
//! movie content.
//!
//! ## Prediction
//! ```text
//! r̂(u, i) = μ + b_u + b_i + Y_u · content(i) + M_i · (S_u + implicit(u))
//! content(i)  = Σ H_c / √|R(i)|   over the content features c of movie i
//! implicit(u) = Σ W_k / √|N(u)|   over the movies k user u liked or reviewed
//! ```
//!
//! ## Lifecycle
//! `Uninitialized → Initialized → Trained`. `initialize` may be called again
//! at any point and returns the model to `Initialized`; parameters already
//! allocated for known users, movies and features are kept.

use crate::config::LatentConfig;
use crate::feature_key::{content_features, FeatureKey};
use crate::snapshot::{ModelError, ModelSnapshot};
use crate::vector::{add_scaled, dot, normalized_sum, random_vector, Vector};
use data_loader::{Like, MovieId, MovieRecord, Review, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Lower bound of a trained prediction
pub const MIN_PREDICTION: f32 = 1.0;

/// Upper bound of a trained prediction
pub const MAX_PREDICTION: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelState {
    Uninitialized,
    Initialized,
    Trained,
}

/// Summary of one `train` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub epochs: usize,
    /// Reviews whose user and movie both have parameters
    pub observations: usize,
    /// Training loss before the first epoch
    pub initial_mse: Option<f64>,
    /// Training loss after the last epoch
    pub final_mse: Option<f64>,
}

/// Learned parameters and the interaction sets they are read through
#[derive(Debug, Clone, Default)]
pub(crate) struct Parameters {
    factors: usize,
    global_bias: f32,
    user_bias: HashMap<UserId, f32>,
    item_bias: HashMap<MovieId, f32>,
    /// S_u
    user_factors: HashMap<UserId, Vector>,
    /// Y_u
    user_content: HashMap<UserId, Vector>,
    /// M_i
    item_factors: HashMap<MovieId, Vector>,
    /// W_k
    implicit_weights: HashMap<MovieId, Vector>,
    /// H_c
    content_factors: HashMap<FeatureKey, Vector>,
    /// N(u) in first-interaction order
    implicit_sets: HashMap<UserId, Vec<MovieId>>,
    /// R(i)
    content_sets: HashMap<MovieId, Vec<FeatureKey>>,
}

impl Parameters {
    pub(crate) fn global_bias(&self) -> f32 {
        self.global_bias
    }

    pub(crate) fn implicit_set(&self, user_id: UserId) -> &[MovieId] {
        self.implicit_sets
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn implicit_vector(&self, user: Option<UserId>) -> Vector {
        let items = user.map_or(&[][..], |u| self.implicit_set(u));
        normalized_sum(
            items.iter().filter_map(|k| self.implicit_weights.get(k)),
            items.len(),
            self.factors,
        )
    }

    fn content_vector(&self, movie_id: MovieId) -> Vector {
        let features = self
            .content_sets
            .get(&movie_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        normalized_sum(
            features.iter().filter_map(|c| self.content_factors.get(c)),
            features.len(),
            self.factors,
        )
    }

    /// Unclamped prediction; unknown users and movies contribute zero vectors
    pub(crate) fn raw_prediction(&self, user: Option<UserId>, movie_id: MovieId) -> f32 {
        let user_bias = user
            .and_then(|u| self.user_bias.get(&u))
            .copied()
            .unwrap_or(0.0);
        let item_bias = self.item_bias.get(&movie_id).copied().unwrap_or(0.0);

        let content_term = match user.and_then(|u| self.user_content.get(&u)) {
            Some(y_u) => dot(y_u, &self.content_vector(movie_id)),
            None => 0.0,
        };

        let collaborative_term = match self.item_factors.get(&movie_id) {
            Some(m_i) => {
                let mut p_u = self.implicit_vector(user);
                if let Some(s_u) = user.and_then(|u| self.user_factors.get(&u)) {
                    add_scaled(&mut p_u, s_u, 1.0);
                }
                dot(m_i, &p_u)
            }
            None => 0.0,
        };

        self.global_bias + user_bias + item_bias + content_term + collaborative_term
    }

    pub(crate) fn clamped_prediction(&self, user: Option<UserId>, movie_id: MovieId) -> f32 {
        self.raw_prediction(user, movie_id)
            .clamp(MIN_PREDICTION, MAX_PREDICTION)
    }

    fn is_trainable(&self, review: &Review) -> bool {
        self.item_factors.contains_key(&review.movie_id)
            && self.user_factors.contains_key(&review.user_id)
    }

    fn mean_squared_error(&self, reviews: &[Review]) -> Option<f64> {
        let (sum, count) = reviews
            .iter()
            .filter(|r| self.is_trainable(r))
            .fold((0.0f64, 0usize), |(sum, count), r| {
                let error = r.rating - f64::from(self.raw_prediction(Some(r.user_id), r.movie_id));
                (sum + error * error, count + 1)
            });
        (count > 0).then(|| sum / count as f64)
    }

    /// One SGD update. Returns the prediction error, or `None` when the
    /// review's user or movie has no parameters.
    ///
    /// Every gradient is taken at the pre-update parameter values.
    fn sgd_step(&mut self, review: &Review, config: &LatentConfig) -> Option<f32> {
        let (u, i) = (review.user_id, review.movie_id);
        let implicit = self.implicit_vector(Some(u));
        let content = self.content_vector(i);

        let Parameters {
            global_bias,
            user_bias,
            item_bias,
            user_factors,
            user_content,
            item_factors,
            implicit_weights,
            content_factors,
            implicit_sets,
            content_sets,
            ..
        } = self;

        let s_u = user_factors.get_mut(&u)?;
        let y_u = user_content.get_mut(&u)?;
        let m_i = item_factors.get_mut(&i)?;

        let mut p_u = implicit;
        add_scaled(&mut p_u, s_u, 1.0);

        let b_u = user_bias.get(&u).copied().unwrap_or(0.0);
        let b_i = item_bias.get(&i).copied().unwrap_or(0.0);
        let prediction = *global_bias + b_u + b_i + dot(y_u, &content) + dot(m_i, &p_u);
        let error = review.rating as f32 - prediction;

        let lambda = config.lambda;
        user_bias.insert(u, b_u + config.gamma_bias * (error - lambda * b_u));
        item_bias.insert(i, b_i + config.gamma_bias * (error - lambda * b_i));

        let m_old = m_i.clone();
        let y_old = y_u.clone();
        let gamma = config.gamma_factor;
        for k in 0..m_old.len().min(y_old.len()) {
            let s = s_u[k];
            y_u[k] += gamma * (error * content[k] - lambda * y_old[k]);
            s_u[k] += gamma * (error * m_old[k] - lambda * s);
            m_i[k] += gamma * (error * p_u[k] - lambda * m_old[k]);
        }

        if let Some(items) = implicit_sets.get(&u) {
            let step = error / (items.len().max(1) as f32).sqrt();
            for j in items {
                if let Some(w_j) = implicit_weights.get_mut(j) {
                    for (w, m) in w_j.iter_mut().zip(&m_old) {
                        *w += config.gamma_implicit * (step * m - lambda * *w);
                    }
                }
            }
        }

        if let Some(features) = content_sets.get(&i) {
            let step = error / (features.len().max(1) as f32).sqrt();
            for c in features {
                if let Some(h_c) = content_factors.get_mut(c) {
                    for (h, y) in h_c.iter_mut().zip(&y_old) {
                        *h += config.gamma_content * (step * y - lambda * *h);
                    }
                }
            }
        }

        Some(error)
    }
}

/// Stateful latent-factor model.
///
/// The random source is a type parameter so tests can inject a seeded
/// generator; [`LatentFactorModel::new`] picks one from the config.
pub struct LatentFactorModel<R: Rng = StdRng> {
    config: LatentConfig,
    params: Parameters,
    state: ModelState,
    rng: R,
}

impl LatentFactorModel<StdRng> {
    /// Seeded from `config.seed` when set, else from the OS
    pub fn new(config: LatentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> LatentFactorModel<R> {
    pub fn with_rng(config: LatentConfig, rng: R) -> Self {
        let params = Parameters {
            factors: config.factors,
            ..Parameters::default()
        };
        Self {
            config,
            params,
            state: ModelState::Uninitialized,
            rng,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Mean review rating seen by the last `initialize` (0 without reviews)
    pub fn global_bias(&self) -> f32 {
        self.params.global_bias
    }

    /// Movies the user liked or reviewed, in first-interaction order
    pub fn implicit_set(&self, user_id: UserId) -> &[MovieId] {
        self.params.implicit_set(user_id)
    }

    /// Build the interaction sets and allocate parameters for new users,
    /// movies and content features
    #[instrument(skip_all, fields(movies = movies.len(), reviews = reviews.len(), likes = likes.len()))]
    pub fn initialize(&mut self, movies: &[MovieRecord], reviews: &[Review], likes: &[Like]) {
        let factors = self.config.factors;
        let scale = self.config.init_scale;
        let max_cast = self.config.max_cast;
        let params = &mut self.params;
        let rng = &mut self.rng;

        params.factors = factors;
        params.global_bias = if reviews.is_empty() {
            0.0
        } else {
            (reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64) as f32
        };

        params.implicit_sets.clear();
        let mut user_order: Vec<UserId> = Vec::new();
        let mut pairs: HashSet<(UserId, MovieId)> = HashSet::new();
        let interactions = reviews
            .iter()
            .map(|r| (r.user_id, r.movie_id))
            .chain(likes.iter().map(|l| (l.user_id, l.movie_id)));
        for (user, movie) in interactions {
            if !pairs.insert((user, movie)) {
                continue;
            }
            params
                .implicit_sets
                .entry(user)
                .or_insert_with(|| {
                    user_order.push(user);
                    Vec::new()
                })
                .push(movie);
        }

        params.content_sets.clear();
        for movie in movies {
            let features = content_features(movie, max_cast);
            params.item_bias.entry(movie.id).or_insert(0.0);
            params
                .item_factors
                .entry(movie.id)
                .or_insert_with(|| random_vector(rng, factors, scale));
            params
                .implicit_weights
                .entry(movie.id)
                .or_insert_with(|| random_vector(rng, factors, scale));
            for feature in &features {
                if !params.content_factors.contains_key(feature) {
                    params
                        .content_factors
                        .insert(feature.clone(), random_vector(rng, factors, scale));
                }
            }
            params.content_sets.insert(movie.id, features);
        }

        // Allocation order follows first interaction, so a seeded run is reproducible
        for user in &user_order {
            params.user_bias.entry(*user).or_insert(0.0);
            params
                .user_factors
                .entry(*user)
                .or_insert_with(|| random_vector(rng, factors, scale));
            params
                .user_content
                .entry(*user)
                .or_insert_with(|| random_vector(rng, factors, scale));
        }

        debug!(
            "Initialized: global_bias={:.3}, users={}, movies={}, content_features={}",
            params.global_bias,
            params.user_factors.len(),
            params.item_factors.len(),
            params.content_factors.len()
        );
        self.state = ModelState::Initialized;
    }

    /// Run the configured number of SGD epochs over `reviews`, in order.
    ///
    /// Does nothing before `initialize` or when `reviews` is empty. Reviews
    /// for users or movies without parameters are skipped.
    #[instrument(skip_all, fields(reviews = reviews.len()))]
    pub fn train(&mut self, reviews: &[Review]) -> TrainingReport {
        if self.state == ModelState::Uninitialized {
            warn!("train called before initialize, skipping");
            return TrainingReport::default();
        }
        if reviews.is_empty() {
            debug!("No reviews, skipping training");
            return TrainingReport::default();
        }

        let observations = reviews
            .iter()
            .filter(|r| self.params.is_trainable(r))
            .count();
        let initial_mse = self.params.mean_squared_error(reviews);
        info!(
            "Training latent model: {} observations, {} epochs",
            observations, self.config.epochs
        );

        for epoch in 0..self.config.epochs {
            let mut squared_error = 0.0f64;
            for review in reviews {
                if let Some(error) = self.params.sgd_step(review, &self.config) {
                    squared_error += f64::from(error * error);
                }
            }
            if observations > 0 {
                debug!(
                    "Epoch {}: mse={:.4}",
                    epoch + 1,
                    squared_error / observations as f64
                );
            }
        }

        self.state = ModelState::Trained;
        let final_mse = self.params.mean_squared_error(reviews);
        info!(
            "Training complete: mse {:?} -> {:?}",
            initial_mse, final_mse
        );

        TrainingReport {
            epochs: self.config.epochs,
            observations,
            initial_mse,
            final_mse,
        }
    }

    /// Predicted rating in `[1, 10]`, or the global bias before training.
    ///
    /// Unknown users and movies contribute zero vectors.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        if self.state != ModelState::Trained {
            return self.params.global_bias;
        }
        self.params.clamped_prediction(Some(user_id), movie_id)
    }

    /// Mean squared training error over `reviews`, unclamped.
    ///
    /// `None` when no review has parameters.
    pub fn mean_squared_error(&self, reviews: &[Review]) -> Option<f64> {
        self.params.mean_squared_error(reviews)
    }

    /// Freeze a trained model into an immutable snapshot
    pub fn into_snapshot(self, report: TrainingReport) -> Result<ModelSnapshot, ModelError> {
        if self.state != ModelState::Trained {
            return Err(ModelError::NotTrained);
        }
        Ok(ModelSnapshot::new(self.params, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> LatentFactorModel {
        LatentFactorModel::new(LatentConfig::default().with_seed(seed))
    }

    fn catalog() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new(1, "A").with_genres(["drama"]),
            MovieRecord::new(2, "B").with_genres(["action", "sf"]),
            MovieRecord::new(3, "").with_genres(["drama"]),
        ]
    }

    fn review(user_id: UserId, movie_id: MovieId, rating: f64) -> Review {
        Review {
            user_id,
            movie_id,
            rating,
        }
    }

    #[test]
    fn test_predict_before_training_returns_global_bias() {
        let mut model = seeded(1);
        assert_eq!(model.predict(1, 1), 0.0);

        let reviews = vec![review(1, 1, 8.0), review(2, 2, 4.0)];
        model.initialize(&catalog(), &reviews, &[]);
        assert_eq!(model.state(), ModelState::Initialized);
        assert_eq!(model.predict(1, 1), 6.0);
        assert_eq!(model.predict(99, 99), 6.0);
    }

    #[test]
    fn test_train_before_initialize_is_noop() {
        let mut model = seeded(1);
        let report = model.train(&[review(1, 1, 8.0)]);
        assert_eq!(report, TrainingReport::default());
        assert_eq!(model.state(), ModelState::Uninitialized);
    }

    #[test]
    fn test_train_with_no_reviews_keeps_state() {
        let mut model = seeded(1);
        model.initialize(&catalog(), &[], &[Like { user_id: 1, movie_id: 1 }]);
        let report = model.train(&[]);

        assert_eq!(report.epochs, 0);
        assert_eq!(model.state(), ModelState::Initialized);
        assert_eq!(model.predict(1, 2), 0.0);
    }

    #[test]
    fn test_implicit_set_deduplicates() {
        let mut model = seeded(1);
        let reviews = vec![review(1, 2, 7.0), review(1, 1, 5.0)];
        let likes = vec![
            Like { user_id: 1, movie_id: 2 },
            Like { user_id: 1, movie_id: 3 },
        ];
        model.initialize(&catalog(), &reviews, &likes);

        assert_eq!(model.implicit_set(1), &[2, 1, 3]);
        assert!(model.implicit_set(2).is_empty());
    }

    #[test]
    fn test_unknown_movie_reviews_are_skipped() {
        let mut model = seeded(1);
        let reviews = vec![review(1, 1, 9.0), review(1, 42, 2.0)];
        model.initialize(&catalog(), &reviews, &[]);
        let report = model.train(&reviews);

        assert_eq!(report.observations, 1);
        assert_eq!(model.state(), ModelState::Trained);
    }

    #[test]
    fn test_trained_predictions_are_clamped() {
        let mut model = seeded(3);
        let reviews = vec![review(1, 1, 10.0), review(1, 2, 10.0), review(2, 3, 1.0)];
        model.initialize(&catalog(), &reviews, &[]);
        model.train(&reviews);

        for user in [1, 2, 77] {
            for movie in [1, 2, 3, 404] {
                let p = model.predict(user, movie);
                assert!((MIN_PREDICTION..=MAX_PREDICTION).contains(&p));
            }
        }
    }

    #[test]
    fn test_reinitialize_keeps_parameters_and_resets_state() {
        let mut model = seeded(5);
        let reviews = vec![review(1, 1, 9.0), review(2, 2, 3.0)];
        model.initialize(&catalog(), &reviews, &[]);
        model.train(&reviews);
        let before = model.params.item_factors.get(&1).cloned();

        model.initialize(&catalog(), &reviews, &[]);
        assert_eq!(model.state(), ModelState::Initialized);
        assert_eq!(model.params.item_factors.get(&1).cloned(), before);
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_sgd_step_update_rule() {
        let drama = FeatureKey::Genre("drama".to_string());
        let mut params = Parameters {
            factors: 1,
            global_bias: 1.0,
            user_bias: HashMap::from([(1, 0.5)]),
            item_bias: HashMap::from([(10, -0.25)]),
            user_factors: HashMap::from([(1, vec![0.5])]),
            user_content: HashMap::from([(1, vec![0.4])]),
            item_factors: HashMap::from([(10, vec![1.0])]),
            implicit_weights: HashMap::from([(10, vec![0.5]), (20, vec![-0.3])]),
            content_factors: HashMap::from([(drama.clone(), vec![0.8])]),
            implicit_sets: HashMap::from([(1, vec![10, 20])]),
            content_sets: HashMap::from([(10, vec![drama.clone()])]),
        };

        // implicit = (0.5 - 0.3) / √2, p_u = 0.5 + implicit, content = 0.8
        // r̂ = 1 + 0.5 - 0.25 + 0.4·0.8 + 1.0·p_u = 2.2114214
        let error = params
            .sgd_step(&review(1, 10, 10.0), &LatentConfig::default())
            .unwrap();
        assert!((error - 7.788_578_6).abs() < 1e-5);

        assert_close(params.user_bias[&1], 0.515_575_16);
        assert_close(params.item_bias[&10], -0.234_421_84);
        assert_close(params.user_factors[&1][0], 0.507_787_6);
        assert_close(params.user_content[&1][0], 0.406_230_06);
        assert_close(params.item_factors[&10][0], 1.004_993_8);
        // W_k and H_c step against the pre-update M_i and Y_u
        assert_close(params.implicit_weights[&10][0], 0.505_506_36);
        assert_close(params.implicit_weights[&20][0], -0.294_492_04);
        assert_close(params.content_factors[&drama][0], 0.809_341_5);
    }

    #[test]
    fn test_sgd_step_skips_unknown_user() {
        let mut params = Parameters {
            factors: 1,
            item_factors: HashMap::from([(10, vec![1.0])]),
            ..Parameters::default()
        };
        assert_eq!(params.sgd_step(&review(7, 10, 5.0), &LatentConfig::default()), None);
        assert!(params.user_bias.is_empty());
        assert_eq!(params.item_factors[&10], vec![1.0]);
    }

    #[test]
    fn test_into_snapshot_requires_training() {
        let mut model = seeded(1);
        model.initialize(&catalog(), &[], &[]);
        assert_eq!(
            model.into_snapshot(TrainingReport::default()).err(),
            Some(ModelError::NotTrained)
        );
    }
}
