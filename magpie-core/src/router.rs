//! Complexity-based model routing
//!
//! Maps the available providers and the PR's complexity tier to a concrete
//! provider/model pair plus a context budget. Routing never fails: with no
//! provider configured it returns the `none` route and the caller skips AI
//! work entirely.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::complexity::ComplexityTier;

/// LLM provider kinds Magpie can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "anthropic" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }

    /// Cheapest model suitable for trivial/simple PRs
    fn cheap_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Strongest model for complex PRs
    fn strong_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Anthropic => "claude-sonnet-4-5",
        }
    }
}

/// Which providers have configured credentials, in caller preference order
#[derive(Debug, Clone, Default)]
pub struct ProviderInventory {
    /// Configured providers; the first entry is the default preference
    pub available: Vec<ProviderKind>,
}

impl ProviderInventory {
    pub fn new(available: Vec<ProviderKind>) -> Self {
        Self { available }
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    fn has(&self, kind: ProviderKind) -> bool {
        self.available.contains(&kind)
    }
}

/// Sentinel model name for the "skip AI" route
pub const MODEL_NONE: &str = "none";

/// The routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub provider: Option<ProviderKind>,
    pub model: String,
    /// Token budget for prompt context at this tier
    pub context_budget: usize,
}

impl Route {
    /// The route that signals "skip AI work"
    pub fn none() -> Self {
        Self {
            provider: None,
            model: MODEL_NONE.to_string(),
            context_budget: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.provider.is_none() || self.model == MODEL_NONE
    }
}

fn context_budget_for(tier: ComplexityTier) -> usize {
    match tier {
        ComplexityTier::Trivial => 16_000,
        ComplexityTier::Simple => 32_000,
        ComplexityTier::Complex => 64_000,
    }
}

/// Pick a provider and model for this PR
///
/// `user_override` names an explicit `provider:model` pair and wins when that
/// provider is configured; otherwise the caller's preference order decides.
pub fn route(
    providers: &ProviderInventory,
    tier: ComplexityTier,
    user_override: Option<&str>,
) -> Route {
    if let Some(override_spec) = user_override {
        if let Some((provider_str, model)) = override_spec.split_once(':') {
            if let Some(kind) = ProviderKind::parse(provider_str) {
                if providers.has(kind) && !model.trim().is_empty() {
                    debug!(provider = kind.as_str(), model, "user override route");
                    return Route {
                        provider: Some(kind),
                        model: model.trim().to_string(),
                        context_budget: context_budget_for(tier),
                    };
                }
            }
        }
        debug!(spec = override_spec, "ignoring unusable model override");
    }

    let Some(&provider) = providers.available.first() else {
        return Route::none();
    };

    let model = match tier {
        ComplexityTier::Trivial | ComplexityTier::Simple => provider.cheap_model(),
        ComplexityTier::Complex => provider.strong_model(),
    };

    Route {
        provider: Some(provider),
        model: model.to_string(),
        context_budget: context_budget_for(tier),
    }
}
