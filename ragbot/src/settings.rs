//! Runtime settings read from the process environment.
//!
//! `config::load_and_apply` fills the environment from `.env` and the XDG config
//! file first; this module only reads variables.

use std::path::PathBuf;

use async_openai::config::OpenAIConfig;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const ENV_MODEL: &str = "RAGBOT_MODEL";
pub const ENV_EMBEDDING_MODEL: &str = "RAGBOT_EMBEDDING_MODEL";
pub const ENV_PERSIST_DIR: &str = "RAGBOT_CHROMA_DIR";
pub const ENV_COLLECTION: &str = "RAGBOT_COLLECTION";
pub const ENV_TOP_K: &str = "RAGBOT_TOP_K";
pub const ENV_MAX_GENERATIONS: &str = "RAGBOT_MAX_GENERATIONS";

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_PERSIST_DIR: &str = "./.chroma";
pub const DEFAULT_COLLECTION: &str = "ragbot-chroma";
pub const DEFAULT_MAX_GENERATIONS: u32 = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid value for {key}: {value:?} (expected a positive integer)")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub tavily_api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub persist_dir: PathBuf,
    pub collection: String,
    pub top_k: usize,
    pub max_generations: u32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            tavily_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: crate::vectorstore::DEFAULT_EMBEDDING_MODEL.to_string(),
            persist_dir: PathBuf::from(DEFAULT_PERSIST_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
            top_k: crate::vectorstore::DEFAULT_TOP_K,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }
}

impl RagSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Ok(Self {
            openai_api_key: get(ENV_OPENAI_API_KEY),
            openai_base_url: get(ENV_OPENAI_BASE_URL),
            tavily_api_key: get(ENV_TAVILY_API_KEY),
            model: get(ENV_MODEL).unwrap_or(defaults.model),
            embedding_model: get(ENV_EMBEDDING_MODEL).unwrap_or(defaults.embedding_model),
            persist_dir: get(ENV_PERSIST_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.persist_dir),
            collection: get(ENV_COLLECTION).unwrap_or(defaults.collection),
            top_k: parse_positive(ENV_TOP_K, get(ENV_TOP_K))?.unwrap_or(defaults.top_k),
            max_generations: parse_positive(ENV_MAX_GENERATIONS, get(ENV_MAX_GENERATIONS))?
                .map(|n| n as u32)
                .unwrap_or(defaults.max_generations),
        })
    }

    /// Online when an OpenAI key is configured.
    pub fn is_online(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn web_search_online(&self) -> bool {
        self.tavily_api_key.is_some()
    }

    /// OpenAI client config, or `None` in offline mode.
    pub fn openai_config(&self) -> Option<OpenAIConfig> {
        let key = self.openai_api_key.as_ref()?;
        let mut config = OpenAIConfig::new().with_api_key(key);
        if let Some(base) = &self.openai_base_url {
            config = config.with_api_base(base);
        }
        Some(config)
    }
}

fn parse_positive(key: &'static str, value: Option<String>) -> Result<Option<usize>, SettingsError> {
    match value {
        None => Ok(None),
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 && n <= u32::MAX as usize => Ok(Some(n)),
            _ => Err(SettingsError::InvalidNumber { key, value: v }),
        },
    }
}
