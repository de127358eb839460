//! CLI command implementations

pub mod review;
pub mod worker;

pub use review::ReviewArgs;
pub use worker::WorkerArgs;

use std::sync::Arc;

use magpie_core::config::Config;
use magpie_core::context::NullRetriever;
use magpie_core::llm::{AnthropicClient, LlmClient, OpenAiClient};
use magpie_core::pipeline::ReviewPipeline;
use magpie_core::router::ProviderKind;
use magpie_db::Database;
use magpie_github::GitHubClient;

/// Build the GitHub client from config
pub fn github_client(config: &Config) -> anyhow::Result<GitHubClient> {
    let repository = config
        .github
        .repository
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no repository configured; pass --repository owner/name"))?;
    let token = config.github.token.clone().unwrap_or_default();

    Ok(GitHubClient::from_url(repository, token)?)
}

/// Pick the LLM client matching the provider the router will prefer
pub fn select_llm(config: &Config) -> anyhow::Result<Option<Arc<dyn LlmClient>>> {
    // An explicit provider:model override wins when that provider has a key.
    let preferred = config
        .llm
        .model
        .as_deref()
        .and_then(|spec| spec.split_once(':'))
        .and_then(|(provider, _)| match provider.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "anthropic" => Some(ProviderKind::Anthropic),
            _ => None,
        });

    let configured = config.configured_providers();
    let chosen = preferred
        .filter(|p| configured.contains(p))
        .or_else(|| configured.first().copied());

    let client: Option<Arc<dyn LlmClient>> = match chosen {
        Some(ProviderKind::OpenAi) => {
            let key = config
                .llm
                .openai_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("openai selected but no API key configured"))?;
            Some(Arc::new(OpenAiClient::new(
                key,
                config.llm.openai_api_base.clone(),
            )?))
        }
        Some(ProviderKind::Anthropic) => {
            let key = config
                .llm
                .anthropic_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("anthropic selected but no API key configured"))?;
            Some(Arc::new(AnthropicClient::new(
                key,
                config.llm.anthropic_api_base.clone(),
            )?))
        }
        None => None,
    };

    Ok(client)
}

/// Open the database at the configured or default location
pub async fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match &config.database.path {
        Some(path) => Database::new(path).await?,
        None => Database::default().await?,
    };
    Ok(db)
}

/// Wire up a full review pipeline from config
pub async fn build_pipeline(config: &Config) -> anyhow::Result<ReviewPipeline> {
    let vcs = Arc::new(github_client(config)?);
    let llm = select_llm(config)?;
    let db = open_database(config).await?;

    Ok(ReviewPipeline::new(
        vcs,
        llm,
        Arc::new(NullRetriever),
        db,
        config.clone(),
    ))
}
