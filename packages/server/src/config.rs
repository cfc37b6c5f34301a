use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::domains::incidents::DEFAULT_CONVERSATION_IDLE;
use crate::domains::services::DirectorySeed;
use crate::kernel::mailer::{DEFAULT_SMTP_FROM, DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT};
use crate::kernel::{SmtpConfig, DEFAULT_NOMINATIM_URL};

const DEFAULT_DATABASE_URL: &str = "sqlite://sos.sqlite?mode=rwc";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge";
const DEFAULT_INDEX_DIR: &str = "local_knowledge_index";
const DEFAULT_GEOCODER_USER_AGENT: &str = concat!("sos-dispatch/", env!("CARGO_PKG_VERSION"));

/// Guideline corpus and index settings (shared by the server and the index builder)
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub openai_api_key: Option<String>,
    pub embedding_model: String,
    pub knowledge_dir: PathBuf,
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub knowledge: KnowledgeConfig,
    pub smtp: SmtpConfig,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub directory_seed: DirectorySeed,
    pub conversation_idle: std::time::Duration,
}

impl KnowledgeConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            openai_api_key: optional("OPENAI_API_KEY"),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| knowledge::embedders::openai::DEFAULT_EMBEDDING_MODEL.to_string()),
            knowledge_dir: env::var("KNOWLEDGE_DIR")
                .unwrap_or_else(|_| DEFAULT_KNOWLEDGE_DIR.to_string())
                .into(),
            index_dir: env::var("KNOWLEDGE_INDEX_PATH")
                .unwrap_or_else(|_| DEFAULT_INDEX_DIR.to_string())
                .into(),
            top_k: parse_or("KNOWLEDGE_TOP_K", knowledge::DEFAULT_TOP_K)?,
            chunk_size: parse_or("CHUNK_SIZE", knowledge::DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_or("CHUNK_OVERLAP", knowledge::DEFAULT_CHUNK_OVERLAP)?,
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").context("SMTP_HOST must be set")?,
            port: parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            username: optional("SMTP_USER"),
            password: optional("SMTP_PASSWORD"),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_SMTP_FROM.to_string()),
            use_ssl: env::var("SMTP_USE_SSL")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            timeout: std::time::Duration::from_secs(parse_or(
                "SMTP_TIMEOUT_SECS",
                DEFAULT_SMTP_TIMEOUT.as_secs(),
            )?),
        };

        let directory_seed = match (optional("OVERRIDE_CITY"), optional("OVERRIDE_CONTACT")) {
            (Some(city), Some(contact)) => DirectorySeed::with_override(city, contact),
            (None, None) => DirectorySeed::default(),
            _ => anyhow::bail!("OVERRIDE_CITY and OVERRIDE_CONTACT must be set together"),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            port: parse_or("PORT", DEFAULT_PORT)?,
            knowledge: KnowledgeConfig::from_env()?,
            smtp,
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            directory_seed,
            conversation_idle: std::time::Duration::from_secs(parse_or(
                "CONVERSATION_IDLE_SECS",
                DEFAULT_CONVERSATION_IDLE.as_secs(),
            )?),
        })
    }
}

/// Set and non-blank, or `None`.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
