//! Configuration for Atrium
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::feed::FeedStrategy;

/// Atrium - backend gateway for a social content app
#[derive(Parser, Debug, Clone)]
#[command(name = "atrium")]
#[command(about = "Discovery feed, search, and AI analysis gateway")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "atrium")]
    pub mongodb_db: String,

    /// JWT secret for bearer token verification (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// API key for the generative AI service (required in production)
    #[arg(long, env = "AI_API_KEY")]
    pub ai_api_key: Option<String>,

    /// Generative model identifier
    #[arg(long, env = "AI_MODEL", default_value = "gemini-2.0-flash-lite-001")]
    pub ai_model: String,

    /// Base URL of the generative API
    #[arg(
        long,
        env = "AI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub ai_base_url: String,

    /// Feed ordering strategy (chronological or ranked)
    #[arg(long, env = "FEED_STRATEGY", default_value = "chronological")]
    pub feed_strategy: FeedStrategy,

    /// Enable development mode (disables auth, relaxes required secrets)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    ///
    /// The AI credential is resolved once here; routes that reach the
    /// analysis orchestrator must not start without it.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.jwt_secret.is_none() {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            match self.ai_api_key.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err("AI_API_KEY is required in production mode".to_string());
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}
