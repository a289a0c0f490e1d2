use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which chat-completion backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenRouter, authenticated with OPENROUTER_API_KEY
    OpenRouter,
    /// A local OpenAI-compatible server, no credentials
    Local,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::Local => "local",
        }
    }
}

/// Main taleforge configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub endpoints: EndpointsConfig,
    pub models: ModelsConfig,
    pub output_dir: PathBuf,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub openrouter: String,
    pub local: String,
}

impl EndpointsConfig {
    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenRouter => &self.openrouter,
            Provider::Local => &self.local,
        }
    }
}

/// Model identifiers per role, per provider
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub openrouter: OpenRouterModels,
    pub local: LocalModels,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenRouterModels {
    pub storyteller: String,
    pub critic: String,
    pub card_creator: String,
    pub card_critic: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalModels {
    pub storyteller: String,
    pub critic: String,
}

impl ModelsConfig {
    /// (storyteller, critic) pair for the story pipeline
    pub fn story_models(&self, provider: Provider) -> (&str, &str) {
        match provider {
            Provider::OpenRouter => (&self.openrouter.storyteller, &self.openrouter.critic),
            Provider::Local => (&self.local.storyteller, &self.local.critic),
        }
    }

    /// (creator, critic) pair for the card pipeline
    pub fn card_models(&self, provider: Provider) -> (&str, &str) {
        match provider {
            Provider::OpenRouter => (&self.openrouter.card_creator, &self.openrouter.card_critic),
            Provider::Local => (&self.local.storyteller, &self.local.critic),
        }
    }
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::OpenRouter,
            endpoints: EndpointsConfig::default(),
            models: ModelsConfig::default(),
            output_dir: PathBuf::from("."),
            log_level: LogLevel::default(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            openrouter: "https://openrouter.ai/api/v1".to_string(),
            local: "http://localhost:11434/v1".to_string(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            openrouter: OpenRouterModels::default(),
            local: LocalModels::default(),
        }
    }
}

impl Default for OpenRouterModels {
    fn default() -> Self {
        Self {
            storyteller: "gryphe/mythomist-7b:free".to_string(),
            critic: "nousresearch/nous-capybara-7b:free".to_string(),
            card_creator: "google/gemma-2-9b-it:free".to_string(),
            card_critic: "meta-llama/llama-3-8b-instruct:free".to_string(),
        }
    }
}

impl Default for LocalModels {
    fn default() -> Self {
        Self {
            storyteller: "tiamat".to_string(),
            critic: "gemma2".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check TALEFORGE_CONFIG env var
        if let Ok(env_path) = std::env::var("TALEFORGE_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from TALEFORGE_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try TALEFORGE_DIR/taleforge.yaml
        if let Ok(taleforge_dir) = std::env::var("TALEFORGE_DIR") {
            let path = PathBuf::from(taleforge_dir).join("taleforge.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from TALEFORGE_DIR: {}", e);
                    }
                }
            }
        }

        // Try ~/.config/taleforge/taleforge.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("taleforge").join("taleforge.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./taleforge.yaml (for development)
        let local_config = PathBuf::from("taleforge.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Get the taleforge directory (where taleforge.yaml lives)
    pub fn taleforge_dir() -> PathBuf {
        std::env::var("TALEFORGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("taleforge"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::OpenRouter);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.endpoints.openrouter.starts_with("https://openrouter.ai"));
    }

    #[test]
    fn test_default_models() {
        let models = ModelsConfig::default();
        let (storyteller, critic) = models.story_models(Provider::OpenRouter);
        assert_eq!(storyteller, "gryphe/mythomist-7b:free");
        assert_eq!(critic, "nousresearch/nous-capybara-7b:free");

        let (storyteller, critic) = models.story_models(Provider::Local);
        assert_eq!(storyteller, "tiamat");
        assert_eq!(critic, "gemma2");
    }

    #[test]
    fn test_base_url_per_provider() {
        let endpoints = EndpointsConfig::default();
        assert!(endpoints.base_url(Provider::OpenRouter).contains("openrouter.ai"));
        assert!(endpoints.base_url(Provider::Local).contains("localhost"));
    }

    #[test]
    fn test_provider_parse() {
        let provider: Provider = serde_yaml::from_str("local").unwrap();
        assert_eq!(provider, Provider::Local);
        let provider: Provider = serde_yaml::from_str("openrouter").unwrap();
        assert_eq!(provider, Provider::OpenRouter);
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/usr/local/bin");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/cards");
        let expanded = Config::expand_path(&path);
        // Should expand ~ to home directory
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("cards"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.models.openrouter.card_creator, config.models.openrouter.card_creator);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Debug.as_filter(), log::LevelFilter::Debug);
        assert_eq!(LogLevel::Off.as_filter(), log::LevelFilter::Off);
    }
}
