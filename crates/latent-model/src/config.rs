//! Hyperparameters of the latent-factor model.

use serde::{Deserialize, Serialize};

/// SGD hyperparameters.
///
/// Defaults follow the values the model was tuned with: 40 factors, 20
/// epochs, and separate learning rates for biases, factors, implicit
/// weights and content weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentConfig {
    /// Latent vector dimension (K)
    pub factors: usize,
    /// Learning rate for user and item biases
    pub gamma_bias: f32,
    /// Learning rate for the explicit user, content-preference and item vectors
    pub gamma_factor: f32,
    /// Learning rate for the implicit-feedback weights
    pub gamma_implicit: f32,
    /// Learning rate for the content feature vectors
    pub gamma_content: f32,
    /// L2 penalty shared by every update
    pub lambda: f32,
    pub epochs: usize,
    /// New vectors are drawn uniformly from `[-init_scale, init_scale)`
    pub init_scale: f32,
    /// Billed cast members used as content features per movie
    pub max_cast: usize,
    /// Fixed seed for reproducible initialization; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for LatentConfig {
    fn default() -> Self {
        Self {
            factors: 40,
            gamma_bias: 0.002,
            gamma_factor: 0.001,
            gamma_implicit: 0.001,
            gamma_content: 0.003,
            lambda: 0.002,
            epochs: 20,
            init_scale: 0.05,
            max_cast: 3,
            seed: None,
        }
    }
}

impl LatentConfig {
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_cast(mut self, max_cast: usize) -> Self {
        self.max_cast = max_cast;
        self
    }
}
