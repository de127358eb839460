//! Configuration management for Magpie
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (MAGPIE_*, plus provider-conventional names)
//! 3. Config file (~/.config/magpie/config.toml)
//! 4. Default values

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{PlanLimits, PlanTier};
use crate::router::ProviderKind;
use crate::{Error, Result};

/// GitHub-related configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Personal access token or installation token
    pub token: Option<String>,

    /// Repository in `owner/name` form
    pub repository: Option<String>,
}

/// LLM provider credentials and routing preferences
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_base: Option<String>,

    /// Explicit `provider:model` override, bypassing complexity routing
    pub model: Option<String>,
}

/// Review behavior knobs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Glob patterns for paths excluded from review entirely
    pub ignore_globs: Vec<String>,

    /// Extra reviewer instructions folded into the prompt (paid plans only)
    pub custom_instructions: Option<String>,
}

/// Subscription settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Plan tier name; unknown values fall back to free
    pub tier: String,

    /// Plan expiry; an expired plan behaves as free
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            tier: "free".to_string(),
            expires_at: None,
        }
    }
}

/// Database location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the sqlite file; defaults to the cache directory
    pub path: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub llm: LlmConfig,
    pub review: ReviewConfig,
    pub plan: PlanConfig,
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/magpie/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("magpie").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// MAGPIE_* variables win over the provider-conventional names
    /// (GITHUB_TOKEN, OPENAI_API_KEY, ANTHROPIC_API_KEY).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = env_first(&["MAGPIE_GITHUB_TOKEN", "GITHUB_TOKEN"]) {
            self.github.token = Some(token);
        }
        if let Ok(repo) = std::env::var("MAGPIE_REPOSITORY") {
            self.github.repository = Some(repo);
        }
        if let Ok(key) = env_first(&["MAGPIE_OPENAI_API_KEY", "OPENAI_API_KEY"]) {
            self.llm.openai_api_key = Some(key);
        }
        if let Ok(key) = env_first(&["MAGPIE_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY"]) {
            self.llm.anthropic_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("MAGPIE_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(tier) = std::env::var("MAGPIE_PLAN") {
            self.plan.tier = tier;
        }
        if let Ok(path) = std::env::var("MAGPIE_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        repository: Option<String>,
        model: Option<String>,
        plan: Option<String>,
    ) -> Self {
        if let Some(repo) = repository {
            self.github.repository = Some(repo);
        }
        if let Some(m) = model {
            self.llm.model = Some(m);
        }
        if let Some(tier) = plan {
            self.plan.tier = tier;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        repository: Option<String>,
        model: Option<String>,
        plan: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(repository, model, plan))
    }

    /// Providers with configured credentials, in preference order
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        let mut providers = Vec::new();
        if self.llm.openai_api_key.is_some() {
            providers.push(ProviderKind::OpenAi);
        }
        if self.llm.anthropic_api_key.is_some() {
            providers.push(ProviderKind::Anthropic);
        }
        providers
    }

    /// Derive the effective plan limits at `now`
    pub fn plan_limits(&self, now: DateTime<Utc>) -> PlanLimits {
        PlanLimits::for_plan(PlanTier::parse(&self.plan.tier), self.plan.expires_at, now)
    }

    /// Human-readable settings dump with secrets redacted
    pub fn redacted_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "github.token = {}\n",
            redact(self.github.token.as_deref())
        ));
        out.push_str(&format!(
            "github.repository = {}\n",
            self.github.repository.as_deref().unwrap_or("(unset)")
        ));
        out.push_str(&format!(
            "llm.openai_api_key = {}\n",
            redact(self.llm.openai_api_key.as_deref())
        ));
        out.push_str(&format!(
            "llm.anthropic_api_key = {}\n",
            redact(self.llm.anthropic_api_key.as_deref())
        ));
        out.push_str(&format!(
            "llm.model = {}\n",
            self.llm.model.as_deref().unwrap_or("(auto)")
        ));
        out.push_str(&format!("plan.tier = {}\n", self.plan.tier));
        out.push_str(&format!(
            "review.ignore_globs = {:?}\n",
            self.review.ignore_globs
        ));
        out.push_str(&format!(
            "database.path = {}\n",
            self.database
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())
        ));
        out
    }
}

fn env_first(names: &[&str]) -> std::result::Result<String, std::env::VarError> {
    for name in names {
        if let Ok(value) = std::env::var(name) {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    Err(std::env::VarError::NotPresent)
}

fn redact(value: Option<&str>) -> &'static str {
    match value {
        Some(_) => "***",
        None => "(unset)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.plan.tier, "free");
        assert!(config.review.ignore_globs.is_empty());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some("acme/widgets".to_string()),
            Some("openai:gpt-4o".to_string()),
            Some("pro".to_string()),
        );

        assert_eq!(config.github.repository, Some("acme/widgets".to_string()));
        assert_eq!(config.llm.model, Some("openai:gpt-4o".to_string()));
        assert_eq!(config.plan.tier, "pro");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[github]
token = "ghp_local"
repository = "acme/widgets"

[llm]
openai_api_key = "sk-test"
model = "openai:gpt-4o-mini"

[plan]
tier = "enterprise"

[review]
ignore_globs = ["vendor/**", "*.lock"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.github.repository, Some("acme/widgets".to_string()));
        assert_eq!(config.llm.openai_api_key, Some("sk-test".to_string()));
        assert_eq!(config.plan.tier, "enterprise");
        assert_eq!(config.review.ignore_globs.len(), 2);
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[plan]
tier = "pro"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.plan.tier, "pro");
        // Everything else keeps defaults
        assert!(config.github.token.is_none());
        assert!(config.llm.model.is_none());
    }

    #[test]
    fn test_configured_providers_order() {
        let mut config = Config::default();
        assert!(config.configured_providers().is_empty());

        config.llm.anthropic_api_key = Some("k".to_string());
        assert_eq!(config.configured_providers(), vec![ProviderKind::Anthropic]);

        config.llm.openai_api_key = Some("k".to_string());
        assert_eq!(
            config.configured_providers(),
            vec![ProviderKind::OpenAi, ProviderKind::Anthropic]
        );
    }

    #[test]
    fn test_plan_limits_from_config() {
        let mut config = Config::default();
        config.plan.tier = "enterprise".to_string();
        let limits = config.plan_limits(Utc::now());
        assert!(limits.allow_batching);

        config.plan.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        let limits = config.plan_limits(Utc::now());
        assert_eq!(limits.tier, PlanTier::Free);
    }

    #[test]
    fn test_redacted_summary_hides_secrets() {
        let mut config = Config::default();
        config.github.token = Some("ghp_secret".to_string());
        config.llm.openai_api_key = Some("sk-secret".to_string());

        let summary = config.redacted_summary();
        assert!(!summary.contains("ghp_secret"));
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("***"));
    }
}
