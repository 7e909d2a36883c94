//! Latent-factor recommendation model.
//!
//! An alternative to the heuristic ranker: a matrix-factorization model
//! that blends explicit ratings with implicit feedback (likes and reviews)
//! and content features (genres, director, top-billed cast), trained with
//! stochastic gradient descent.
//!
//! ## Example Usage
//! ```ignore
//! use latent_model::{train_snapshot, LatentConfig, LatentStrategy, TrainingData};
//!
//! let data = TrainingData::new(movies, community);
//! let snapshot = train_snapshot(&data, &LatentConfig::default().with_seed(7))?;
//! let strategy = LatentStrategy::new(Arc::new(snapshot));
//! ```

pub mod config;
pub mod feature_key;
pub mod model;
pub mod snapshot;
pub mod strategy;
pub mod vector;

pub use config::LatentConfig;
pub use feature_key::{content_features, FeatureKey};
pub use model::{LatentFactorModel, ModelState, TrainingReport, MAX_PREDICTION, MIN_PREDICTION};
pub use snapshot::{train_snapshot, ModelError, ModelSnapshot, TrainingData};
pub use strategy::LatentStrategy;
