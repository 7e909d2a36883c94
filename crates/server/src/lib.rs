//! Server crate for the movie ranking engine.
//!
//! This crate contains the orchestrator that routes requests to a ranking
//! strategy and the cache that serves trained latent-factor models.

pub mod model_cache;
pub mod orchestrator;

pub use model_cache::ModelCache;
pub use orchestrator::{
    MovieRecommendation, OrchestratorConfig, RecommendationOrchestrator, RecommendationResponse,
    StrategyKind,
};
