use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::parser::{parse_catalog, parse_community, parse_interactions};
use data_loader::{Catalog, CommunityData, InteractionSnapshot, MovieId, MovieRecord, UserId};
use latent_model::TrainingData;
use pipeline::DirectorScore;
use rand::Rng;
use server::{MovieRecommendation, OrchestratorConfig, RecommendationOrchestrator, StrategyKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// reel-rank - Explainable movie ranking engine
#[derive(Parser)]
#[command(name = "reel-rank")]
#[command(about = "Movie ranking with director affinity and latent factors", long_about = None)]
struct Cli {
    /// JSON file overriding ranking and latent-model settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vote count at which a movie's own rating and the catalog prior weigh equally
    #[arg(long, global = true)]
    min_votes: Option<f64>,

    /// Billed cast members used as latent content features
    #[arg(long, global = true)]
    max_cast: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Heuristic,
    Latent,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Heuristic => StrategyKind::Heuristic,
            StrategyArg::Latent => StrategyKind::Latent,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the catalog for one user
    Recommend {
        /// Catalog JSON (array of movie records)
        #[arg(long)]
        catalog: PathBuf,

        /// Interaction snapshot JSON for the user
        #[arg(long)]
        interactions: PathBuf,

        /// Community reviews and likes JSON (needed by the latent strategy)
        #[arg(long)]
        community: Option<PathBuf>,

        /// Ranking strategy
        #[arg(long, value_enum, default_value = "heuristic")]
        strategy: StrategyArg,

        /// Number of recommendations to return (clamped to 1..=20)
        #[arg(long)]
        top_k: Option<usize>,

        /// Seed for latent-model initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Show the explanation and director table
        #[arg(long)]
        explain: bool,
    },

    /// Show the user's director affinity table
    Directors {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        interactions: PathBuf,
    },

    /// Predict one user's rating for one movie with the latent model
    Predict {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        community: PathBuf,

        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        movie_id: MovieId,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run concurrent heuristic requests and report latency
    Benchmark {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        interactions: PathBuf,

        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = apply_overrides(load_config(cli.config.as_deref())?, cli.min_votes, cli.max_cast);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            catalog,
            interactions,
            community,
            strategy,
            top_k,
            seed,
            explain,
        } => {
            handle_recommend(
                config,
                &catalog,
                &interactions,
                community.as_deref(),
                strategy.into(),
                top_k,
                seed,
                explain,
            )
            .await?
        }
        Commands::Directors {
            catalog,
            interactions,
        } => handle_directors(config, &catalog, &interactions).await?,
        Commands::Predict {
            catalog,
            community,
            user_id,
            movie_id,
            seed,
        } => handle_predict(config, &catalog, &community, user_id, movie_id, seed).await?,
        Commands::Benchmark {
            catalog,
            interactions,
            requests,
            concurrent,
        } => handle_benchmark(config, &catalog, &interactions, requests, concurrent).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    let Some(path) = path else {
        return Ok(OrchestratorConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load and validate a catalog, reporting how long it took
fn load_movies(path: &Path) -> Result<Vec<MovieRecord>> {
    let start = Instant::now();
    let catalog = Catalog::from_movies(
        parse_catalog(path).with_context(|| format!("Failed to load catalog {}", path.display()))?,
    )?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        catalog.len(),
        start.elapsed()
    );
    Ok(catalog.into_movies())
}

fn load_interactions(path: &Path) -> Result<InteractionSnapshot> {
    parse_interactions(path).with_context(|| format!("Failed to load interactions {}", path.display()))
}

fn load_community(path: &Path) -> Result<CommunityData> {
    parse_community(path).with_context(|| format!("Failed to load community data {}", path.display()))
}

/// Command-line flags win over the config file
fn apply_overrides(
    mut config: OrchestratorConfig,
    min_votes: Option<f64>,
    max_cast: Option<usize>,
) -> OrchestratorConfig {
    if let Some(min_votes) = min_votes {
        let ranking = config.ranking.clone().with_min_votes(min_votes);
        config = config.with_ranking(ranking);
    }
    if let Some(max_cast) = max_cast {
        let latent = config.latent.clone().with_max_cast(max_cast);
        config = config.with_latent(latent);
    }
    config
}

fn with_seed(mut config: OrchestratorConfig, seed: Option<u64>) -> OrchestratorConfig {
    if seed.is_some() {
        config.latent.seed = seed;
    }
    config
}

/// Handle the 'recommend' command
#[allow(clippy::too_many_arguments)]
async fn handle_recommend(
    config: OrchestratorConfig,
    catalog: &Path,
    interactions: &Path,
    community: Option<&Path>,
    strategy: StrategyKind,
    top_k: Option<usize>,
    seed: Option<u64>,
    explain: bool,
) -> Result<()> {
    let movies = load_movies(catalog)?;
    let interactions = load_interactions(interactions)?;
    let orchestrator = RecommendationOrchestrator::new(with_seed(config, seed));

    if strategy == StrategyKind::Latent {
        match community {
            Some(path) => {
                let data = TrainingData::new(movies.clone(), load_community(path)?);
                let start = Instant::now();
                orchestrator.refresh_model(Arc::new(data)).await?;
                println!("{} Trained latent model in {:?}", "✓".green(), start.elapsed());
            }
            None => println!(
                "{} No --community file, using the heuristic ranker",
                "!".yellow()
            ),
        }
    }

    let response = orchestrator
        .get_recommendations(movies, interactions, top_k, strategy)
        .await?;

    if !response.has_preference_signals && response.strategy == StrategyKind::Heuristic {
        println!("{}", "No likes or ratings yet, showing top rated movies".dimmed());
    }
    print_recommendations(&response.recommendations, response.strategy, explain);

    if explain && !response.director_scores.is_empty() {
        println!();
        print_director_scores(&response.director_scores);
    }
    Ok(())
}

/// Handle the 'directors' command
async fn handle_directors(config: OrchestratorConfig, catalog: &Path, interactions: &Path) -> Result<()> {
    let movies = load_movies(catalog)?;
    let interactions = load_interactions(interactions)?;
    let orchestrator = RecommendationOrchestrator::new(config);

    let scores = orchestrator.director_scores(movies, interactions).await?;
    if scores.is_empty() {
        println!("{}", "No likes or ratings, nothing to score".dimmed());
        return Ok(());
    }
    print_director_scores(&scores);
    Ok(())
}

/// Handle the 'predict' command
async fn handle_predict(
    config: OrchestratorConfig,
    catalog: &Path,
    community: &Path,
    user_id: UserId,
    movie_id: MovieId,
    seed: Option<u64>,
) -> Result<()> {
    let movies = load_movies(catalog)?;
    let title = movies
        .iter()
        .find(|m| m.id == movie_id)
        .map(|m| m.title.clone())
        .unwrap_or_else(|| format!("movie {}", movie_id));
    let community = load_community(community)?;

    let orchestrator = RecommendationOrchestrator::new(with_seed(config, seed));
    let start = Instant::now();
    orchestrator
        .refresh_model(Arc::new(TrainingData::new(movies, community)))
        .await?;
    println!("{} Trained latent model in {:?}", "✓".green(), start.elapsed());

    let rating = orchestrator.predict(user_id, movie_id).await?;
    println!(
        "User {} → {}: {}",
        user_id,
        title.bold(),
        format!("{:.2}", rating).green()
    );
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    config: OrchestratorConfig,
    catalog: &Path,
    interactions: &Path,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let movies = Arc::new(load_movies(catalog)?);
    if movies.is_empty() {
        bail!("Catalog is empty");
    }
    let base = load_interactions(interactions)?;
    let orchestrator = RecommendationOrchestrator::new(config);

    // Vary each request with a few random extra likes
    let mut rng = rand::rng();
    let snapshots: Vec<InteractionSnapshot> = (0..requests)
        .map(|_| {
            let extra: Vec<MovieId> = (0..3)
                .map(|_| movies[rng.random_range(0..movies.len())].id)
                .collect();
            base.clone().with_likes(extra)
        })
        .collect();

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let total_start = Instant::now();
    let mut handles = vec![];
    for interactions in snapshots {
        let orchestrator = orchestrator.clone();
        let movies = movies.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            orchestrator
                .get_recommendations(movies.to_vec(), interactions, None, StrategyKind::Heuristic)
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = total_start.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[MovieRecommendation], strategy: StrategyKind, explain: bool) {
    println!("{}", format!("Recommendations ({}):", strategy).bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        let title = if rec.title.is_empty() {
            format!("Movie {}", rec.movie_id)
        } else {
            rec.title.clone()
        };
        println!(
            "{}. {} - {} [{}] - Score: {:.3}",
            (i + 1).to_string().green(),
            title.bold(),
            rec.director,
            rec.genres.join(", "),
            rec.score
        );
        if explain {
            println!("   {}", rec.explanation.dimmed());
        }
    }
}

fn print_director_scores(scores: &[DirectorScore]) {
    println!("{}", "Director affinity:".bold().blue());
    for score in scores {
        println!(
            "{}{:<24} score {:>6.3}  liked {}/{}  avg quality {:.2}",
            "• ".cyan(),
            score.director,
            score.score,
            score.liked_count,
            score.seen_count,
            score.avg_quality
        );
    }
}
