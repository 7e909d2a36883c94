//! # Latent Model Cache
//!
//! Training a latent-factor model is far too slow for a request path, so
//! training and serving are split:
//! - `refresh` trains a fresh model on a blocking thread, then swaps the
//!   frozen snapshot in under the write lock
//! - readers clone the current `Arc<ModelSnapshot>` and predict without
//!   holding any lock
//!
//! Each refresh takes a generation ticket before it starts training. A
//! snapshot is only published if its ticket is newer than the one being
//! served, so a slow retrain on older data never replaces a newer model.
//! Every successful swap bumps a monotonic version number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use latent_model::{train_snapshot, LatentConfig, ModelSnapshot, TrainingData};

/// The snapshot being served and the generation it was trained for
#[derive(Default)]
struct Published {
    snapshot: Option<Arc<ModelSnapshot>>,
    generation: u64,
}

/// Versioned holder of the latest trained snapshot
pub struct ModelCache {
    config: LatentConfig,
    current: RwLock<Published>,
    /// Last generation ticket handed out
    generations: AtomicU64,
    version: AtomicU64,
}

impl ModelCache {
    pub fn new(config: LatentConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Published::default()),
            generations: AtomicU64::new(0),
            version: AtomicU64::new(0),
        }
    }

    /// Latest snapshot, `None` until the first successful refresh
    pub async fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.current.read().await.snapshot.clone()
    }

    /// Number of snapshots swapped in so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Train on `data` and publish the result.
    ///
    /// Returns the version served once this call is done. That is the
    /// previous version when a refresh started later has already published.
    /// On failure the previous snapshot stays in place.
    #[instrument(skip_all, fields(movies = data.movies.len(), reviews = data.community.reviews.len()))]
    pub async fn refresh(&self, data: Arc<TrainingData>) -> Result<u64> {
        let start = Instant::now();
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let config = self.config.clone();

        let snapshot = tokio::task::spawn_blocking(move || train_snapshot(&data, &config))
            .await
            .context("Training task panicked")?
            .context("Failed to train latent model")?;

        match self.publish(generation, Arc::new(snapshot)).await {
            Some(version) => {
                info!(
                    "Swapped in latent model version {} (trained in {:.2?})",
                    version,
                    start.elapsed()
                );
                Ok(version)
            }
            None => {
                warn!(
                    "Discarded latent model for generation {}, a newer one is already served",
                    generation
                );
                Ok(self.version())
            }
        }
    }

    /// Swap `snapshot` in if `generation` is newer than the served one.
    ///
    /// Returns the new version, or `None` when the snapshot was stale.
    async fn publish(&self, generation: u64, snapshot: Arc<ModelSnapshot>) -> Option<u64> {
        let mut guard = self.current.write().await;
        if generation <= guard.generation {
            return None;
        }
        guard.snapshot = Some(snapshot);
        guard.generation = generation;
        Some(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Retrain every `period` from whatever `source` returns at that moment.
    ///
    /// The first refresh runs immediately. Failures are logged and the loop
    /// keeps going; abort the returned handle to stop it.
    pub fn spawn_periodic_refresh<F>(self: Arc<Self>, period: Duration, source: F) -> JoinHandle<()>
    where
        F: Fn() -> Arc<TrainingData> + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh(source()).await {
                    warn!("Periodic model refresh failed: {:#}", e);
                }
            }
        })
    }
}
