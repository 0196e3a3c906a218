use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerConfig {
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_urls: default_max_urls(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_urls() -> usize {
    20
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrainingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub default_website: Option<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            delay_ms: default_delay_ms(),
            default_website: None,
        }
    }
}

fn default_chunk_size() -> usize {
    crate::chunk::DEFAULT_CHUNK_SIZE
}
fn default_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            source_prefix: default_source_prefix(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    [
        "txt", "md", "js", "jsx", "ts", "tsx", "html", "css", "json", "yml", "yaml", "csv", "xml",
    ]
    .iter()
    .map(|ext| format!("**/*.{}", ext))
    .collect()
}
fn default_source_prefix() -> String {
    "visafy.com/project-plan".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SitesConfig {
    #[serde(default = "default_brands")]
    pub brands: Vec<BrandConfig>,
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            brands: default_brands(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrandConfig {
    pub name: String,
    pub domain: String,
}

pub fn default_brands() -> Vec<BrandConfig> {
    vec![
        BrandConfig {
            name: "visafy".to_string(),
            domain: "visafy.com".to_string(),
        },
        BrandConfig {
            name: "supernova".to_string(),
            domain: "supernova.to".to_string(),
        },
    ]
}

/// Facts inserted when training yields nothing for the fallback site, and
/// always at the end of local training.
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_site")]
    pub site: String,
    #[serde(default = "default_fallback_facts")]
    pub facts: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            site: default_fallback_site(),
            facts: default_fallback_facts(),
        }
    }
}

fn default_fallback_site() -> String {
    "visafy.com".to_string()
}
fn default_fallback_facts() -> Vec<String> {
    vec![
        "Visafy is a platform designed to help users navigate immigration processes and requirements.".to_string(),
        "Visafy provides personalized immigration roadmaps based on user assessments and profiles.".to_string(),
        "Visafy offers document management tools for immigration applications.".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Read from `OPENROUTER_API_KEY`, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_model(),
            base_url: default_base_url(),
            referer: None,
            title: None,
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_model() -> Option<String> {
    Some("openai/gpt-3.5-turbo".to_string())
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

/// Load configuration from `path` (defaults when the file does not exist),
/// apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let _ = dotenvy::dotenv();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Overlay environment variables onto a parsed config.
///
/// `lookup` is injected so the overlay can be tested without touching the
/// process environment.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(max) = lookup("MAX_URLS") {
        config.crawler.max_urls = max
            .trim()
            .parse()
            .with_context(|| format!("MAX_URLS must be a positive integer, got '{}'", max))?;
    }

    if let Some(site) = lookup("DEFAULT_WEBSITE").filter(|s| !s.trim().is_empty()) {
        config.training.default_website = Some(site);
    }

    if let Some(key) = lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.generator.api_key = Some(key);
        config.generator.enabled = true;
    }

    if let Some(port) = lookup("PORT") {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got '{}'", port))?;
        let host = config
            .server
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind = format!("{}:{}", host, port);
    }

    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if config.crawler.max_urls == 0 {
        anyhow::bail!("crawler.max_urls must be >= 1");
    }

    if config.training.chunk_size == 0 {
        anyhow::bail!("training.chunk_size must be > 0");
    }

    if config.generator.enabled && config.generator.model.is_none() {
        anyhow::bail!("generator.model must be specified when the generator is enabled");
    }

    Ok(())
}

impl Config {
    /// Path used when `--config` is not given.
    pub fn default_path() -> PathBuf {
        PathBuf::from("./config/sitechat.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.crawler.max_urls, 20);
        assert_eq!(cfg.training.chunk_size, 1000);
        assert_eq!(cfg.training.delay_ms, 500);
        assert_eq!(cfg.fallback.facts.len(), 3);
        assert!(!cfg.generator.enabled);
        assert!(cfg.local.include_globs.contains(&"**/*.md".to_string()));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[crawler]
max_urls = 5

[[sites.brands]]
name = "acme"
domain = "acme.io"
"#,
        )
        .unwrap();
        assert_eq!(cfg.crawler.max_urls, 5);
        assert_eq!(cfg.crawler.timeout_secs, 30);
        assert_eq!(cfg.sites.brands.len(), 1);
        assert_eq!(cfg.sites.brands[0].domain, "acme.io");
        assert_eq!(cfg.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("MAX_URLS", "7"),
                ("DEFAULT_WEBSITE", "visafy.com"),
                ("OPENROUTER_API_KEY", "sk-test"),
                ("PORT", "8080"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.crawler.max_urls, 7);
        assert_eq!(cfg.training.default_website.as_deref(), Some("visafy.com"));
        assert!(cfg.generator.enabled);
        assert_eq!(cfg.generator.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_bad_max_urls_is_error() {
        let mut cfg = Config::default();
        assert!(apply_env_overrides(&mut cfg, env(&[("MAX_URLS", "lots")])).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_urls() {
        let mut cfg = Config::default();
        cfg.crawler.max_urls = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert!(cfg.training.chunk_size > 0);
    }
}
