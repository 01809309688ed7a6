//! Atrium - content discovery and AI analysis backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atrium::{
    ai::{AiClient, AiClientConfig, RetryPolicy},
    analysis::{AnalysisOrchestrator, MongoAnalysisStore},
    auth::JwtVerifier,
    config::Args,
    db::schemas::{
        ANALYSIS_CACHE_COLLECTION, ANALYSIS_JOB_COLLECTION, CONSULTATION_COLLECTION,
        JOB_DEFINITION_COLLECTION, POST_COLLECTION, USER_COLLECTION,
    },
    db::MongoClient,
    feed::{FeedService, MongoPostStore},
    routes::rate_limit::RateLimiter,
    search::{MongoUserStore, SearchService},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("atrium={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Atrium - discovery & analysis API");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Feed strategy: {:?}", args.feed_strategy);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("AI model: {}", args.ai_model);
    info!("======================================");

    // Every subsystem is store-backed, so MongoDB is mandatory
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            client
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let posts = mongo.collection(POST_COLLECTION).await?;
    let users = mongo.collection(USER_COLLECTION).await?;
    let jobs = mongo.collection(ANALYSIS_JOB_COLLECTION).await?;
    let definitions = mongo.collection(JOB_DEFINITION_COLLECTION).await?;
    let analysis_cache = mongo.collection(ANALYSIS_CACHE_COLLECTION).await?;
    let consultations = mongo.collection(CONSULTATION_COLLECTION).await?;

    let post_store = Arc::new(MongoPostStore::new(posts));
    let feed = Arc::new(FeedService::new(post_store.clone(), args.feed_strategy));
    let search = Arc::new(SearchService::new(
        post_store,
        Arc::new(MongoUserStore::new(users)),
    ));

    // The AI credential is resolved once, here; handlers never consult the
    // environment
    let orchestrator = match args.ai_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let client = Arc::new(AiClient::new(AiClientConfig {
                api_key: key.to_string(),
                model: args.ai_model.clone(),
                base_url: args.ai_base_url.clone(),
                retry: RetryPolicy::default(),
            }));
            let store = Arc::new(MongoAnalysisStore::new(
                jobs,
                definitions,
                analysis_cache,
                consultations,
            ));
            Some(Arc::new(AnalysisOrchestrator::new(
                store,
                client.clone(),
                client,
            )))
        }
        _ => {
            warn!("AI_API_KEY not set - analysis routes disabled");
            None
        }
    };

    let verifier = JwtVerifier::new(&args.jwt_secret());

    let state = Arc::new(AppState {
        args,
        verifier,
        feed,
        search,
        orchestrator,
        rate_limiter: RateLimiter::default(),
    });

    server::run(state).await?;
    Ok(())
}
