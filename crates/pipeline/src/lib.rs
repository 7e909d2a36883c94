//! Heuristic movie ranking.
//!
//! This crate provides:
//! - Rating normalization (IMDB weighted rating) and the Wilson lower bound
//! - Director affinity and content affinity scorers
//! - `HeuristicRanker`, which combines them into a ranked list
//! - The `RankingStrategy` trait shared with the latent-factor model
//!
//! ## Architecture
//! A request is a catalog snapshot plus one user's interactions. Ranking
//! runs in stages:
//! 1. Catalog quality statistics are computed once per request
//! 2. Directors and content preferences are profiled from likes and ratings
//! 3. Unseen candidates get per-component features (computed in parallel)
//! 4. Features are combined with the configured weights and sorted
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{HeuristicRanker, RankingConfig, RankingRequest, RankingStrategy};
//!
//! let ranker = HeuristicRanker::new(RankingConfig::default());
//! let request = RankingRequest::new(movies, interactions).with_top_k(6);
//! let outcome = ranker.rank(&request);
//! ```

pub mod candidates;
pub mod config;
pub mod content;
pub mod director;
pub mod features;
pub mod profile;
pub mod quality;
pub mod ranker;
pub mod statistics;
pub mod traits;

// Re-export main types
pub use candidates::candidate_pool;
pub use config::{DirectorWeights, RankingConfig, RankingWeights};
pub use content::ContentProfile;
pub use director::{compute_director_scores, DirectorScore};
pub use features::{CandidateFeatures, FeatureEngineer};
pub use profile::UserProfile;
pub use quality::{weighted_rating, CatalogQuality, DEFAULT_GLOBAL_AVERAGE, DEFAULT_MIN_VOTES};
pub use ranker::{rank, HeuristicRanker};
pub use statistics::{wilson_lower_bound, wilson_lower_bound_with_z, WILSON_Z_90};
pub use traits::{sort_descending, RankingOutcome, RankingRequest, RankingStrategy, ScoredMovie};
