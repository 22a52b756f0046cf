use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AssistantConfig {
    pub llm: LlmSettings,
    pub retrieval: RetrievalConfig,
    pub synthesis: SynthesisConfig,
    pub gatekeeper: GatekeeperConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub router_max_tokens: usize,
    pub synthesis_max_tokens: usize,
    pub analysis_max_tokens: usize,
    pub expansion_max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    /// Each query variant fetches `top_k * candidate_multiplier` neighbours.
    pub candidate_multiplier: usize,
    pub expansion_variants: usize,
    /// Character window used when splitting long reviews at ingestion.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Synthesis only runs when confidence is strictly above this value.
    pub confidence_threshold: f64,
    pub max_context_chars: usize,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub min_words: usize,
    pub mixed_min_words: usize,
    pub keyword_min_words: usize,
    pub contrast_words: Vec<String>,
    pub issue_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "MEGALLM_API_KEY".to_string(),
            timeout_secs: 60,
            router_max_tokens: 20,
            synthesis_max_tokens: 500,
            analysis_max_tokens: 300,
            expansion_max_tokens: 200,
        }
    }
}

impl LlmSettings {
    /// Build settings from `MEGALLM_BASE_URL` / `MEGALLM_MODEL`, keeping
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = std::env::var("MEGALLM_BASE_URL") {
            if !url.trim().is_empty() {
                settings.base_url = url.trim().to_string();
            }
        }
        if let Ok(model) = std::env::var("MEGALLM_MODEL") {
            if !model.trim().is_empty() {
                settings.model = model.trim().to_string();
            }
        }
        settings
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            candidate_multiplier: 2,
            expansion_variants: 2,
            chunk_size: 500,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            max_context_chars: 3000,
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2000,
            multiplier: 2,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            self.multiplier,
        )
    }
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            min_words: 10,
            mixed_min_words: 50,
            keyword_min_words: 30,
            contrast_words: ["but", "however", "although", "except", "though"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            issue_keywords: [
                "but", "however", "although", "except", "issue", "problem",
                "late", "delay", "never arrived", "wrong address", "lost package",
                "refund", "return", "cancelled", "charged", "unauthorized",
                "customer service", "support", "no help", "rude", "unhelpful",
                "prime", "subscription", "account", "locked", "suspended",
                "disappointed", "frustrat*", "angry", "worst", "terrible",
                "never again", "waste", "scam", "fake", "misleading",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 200,
        }
    }
}

impl AssistantConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.retrieval.default_top_k == 0 {
            return Err("retrieval.default_top_k must be > 0".into());
        }
        if self.retrieval.candidate_multiplier == 0 {
            return Err("retrieval.candidate_multiplier must be > 0".into());
        }
        if self.retrieval.chunk_size == 0 {
            return Err("retrieval.chunk_size must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.synthesis.confidence_threshold) {
            return Err("synthesis.confidence_threshold must be in [0.0, 1.0]".into());
        }
        if self.synthesis.retry.max_attempts == 0 {
            return Err("synthesis.retry.max_attempts must be >= 1".into());
        }
        if self.gatekeeper.keyword_min_words > self.gatekeeper.mixed_min_words {
            return Err("gatekeeper.keyword_min_words must be <= mixed_min_words".into());
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err("cache.capacity must be > 0 when the cache is enabled".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/review-router/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("review-router")
            .join("config.json")
    }

    /// Load from [`default_path`](Self::default_path) when it exists,
    /// otherwise defaults with LLM settings taken from the environment.
    pub fn load_or_default() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            return Self::from_file(&path);
        }
        Ok(Self {
            llm: LlmSettings::from_env(),
            ..Self::default()
        })
    }
}
