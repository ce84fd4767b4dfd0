//! Endpoint Resolver
//!
//! Matches the policy's preference list against the live catalog, walks the
//! fixed fallback chain when nothing matches, and records the winner in the
//! shared [`SelectionState`].

use std::sync::Arc;

use automode_core::SelectionConfig;
use tracing::{debug, info, warn};

use crate::endpoint::{ChatEndpoint, EndpointDescriptor, EndpointProvider, ProviderError};

use super::prompt_classifier::{PromptClassifier, TaskSignal};
use super::selection_policy::SelectionPolicy;
use super::selection_state::SelectionState;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Nothing in the catalog matched and the baseline endpoint does not exist.
    #[error("No usable endpoint among {candidates} candidate(s); baseline `{baseline}` not found")]
    NoCandidates { candidates: usize, baseline: String },

    /// Catalog failures propagate unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// How the resolved endpoint was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSource {
    /// Matched the preference list at 0-based `rank`.
    Preferred { rank: usize },
    /// Matched one of the fallback chain ids.
    Fallback { id: String },
    /// Looked up directly from the provider as a last resort.
    Baseline,
}

/// The routing decision for one request.
#[derive(Clone)]
pub struct Resolution {
    pub endpoint: Arc<dyn ChatEndpoint>,
    /// Signal that chose the preference list; `None` for the default list or
    /// when no prompt was given.
    pub signal: Option<TaskSignal>,
    pub source: SelectionSource,
    /// Human-readable explanation of the choice.
    pub reasoning: String,
}

impl Resolution {
    /// Identity and capabilities of the chosen endpoint.
    pub fn descriptor(&self) -> EndpointDescriptor {
        self.endpoint.descriptor()
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("endpoint", &self.endpoint.id())
            .field("signal", &self.signal)
            .field("source", &self.source)
            .field("reasoning", &self.reasoning)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// First candidate matching the earliest possible preference.
///
/// Preferences are scanned in order and the scan stops at the first id that
/// any candidate answers to; candidate order only matters between candidates
/// answering to the same id.
pub fn first_match<'a>(
    preferences: &[String],
    candidates: &'a [Arc<dyn ChatEndpoint>],
) -> Option<(usize, &'a Arc<dyn ChatEndpoint>)> {
    preferences.iter().enumerate().find_map(|(rank, preferred)| {
        candidates
            .iter()
            .find(|c| c.matches_id(preferred))
            .map(|c| (rank, c))
    })
}

// ---------------------------------------------------------------------------
// EndpointResolver
// ---------------------------------------------------------------------------

pub struct EndpointResolver {
    provider: Arc<dyn EndpointProvider>,
    classifier: PromptClassifier,
    policy: SelectionPolicy,
    state: Arc<SelectionState>,
    fallback_chain: Vec<String>,
    baseline: String,
}

impl EndpointResolver {
    /// Resolver with the default selection tables.
    pub fn new(provider: Arc<dyn EndpointProvider>, state: Arc<SelectionState>) -> Self {
        Self::with_config(provider, state, &SelectionConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn EndpointProvider>,
        state: Arc<SelectionState>,
        config: &SelectionConfig,
    ) -> Self {
        Self {
            provider,
            classifier: PromptClassifier::new(config.long_context_chars),
            policy: SelectionPolicy::from_config(config),
            state,
            fallback_chain: config
                .fallback_chain()
                .iter()
                .map(|id| (*id).to_string())
                .collect(),
            baseline: config.baseline.clone(),
        }
    }

    /// The state this resolver writes to.
    pub fn state(&self) -> &Arc<SelectionState> {
        &self.state
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Pick an endpoint for `prompt`.
    pub async fn resolve(
        &self,
        prompt: Option<&str>,
    ) -> Result<Arc<dyn ChatEndpoint>, ResolveError> {
        self.route(prompt).await.map(|r| r.endpoint)
    }

    /// Pick an endpoint for `prompt` and explain the choice.
    pub async fn route(&self, prompt: Option<&str>) -> Result<Resolution, ResolveError> {
        let candidates = self.provider.get_all_chat_endpoints().await?;
        let prompt = prompt.filter(|p| !p.trim().is_empty());

        let resolution = match prompt {
            Some(text) => {
                let classification = self.classifier.classify(Some(text));
                debug!(
                    signals = ?classification.active_signals(),
                    length = classification.length,
                    "Classified prompt"
                );
                let choice = self.policy.choose(&classification, &candidates);
                match first_match(&choice.preferences, &candidates) {
                    Some((rank, endpoint)) => {
                        let label = choice
                            .signal
                            .map_or_else(|| "default".to_string(), |s| s.to_string());
                        Resolution {
                            endpoint: Arc::clone(endpoint),
                            signal: choice.signal,
                            source: SelectionSource::Preferred { rank },
                            reasoning: format!(
                                "{label} preference #{} matched {}",
                                rank + 1,
                                endpoint.id()
                            ),
                        }
                    }
                    None => {
                        info!(
                            signal = ?choice.signal,
                            candidates = candidates.len(),
                            "No preferred model available, using fallback chain"
                        );
                        let mut resolution = self.fallback(&candidates).await?;
                        resolution.signal = choice.signal;
                        resolution
                    }
                }
            }
            None => self.fallback(&candidates).await?,
        };

        let selected = resolution.descriptor();
        self.state.update(&selected.name);
        info!(
            model = %selected.id,
            vendor = %selected.vendor,
            source = ?resolution.source,
            "Auto-selected endpoint"
        );
        Ok(resolution)
    }

    /// Primary, secondary, tertiary, then the baseline lookup.
    async fn fallback(
        &self,
        candidates: &[Arc<dyn ChatEndpoint>],
    ) -> Result<Resolution, ResolveError> {
        if let Some((_, endpoint)) = first_match(&self.fallback_chain, candidates) {
            let id = endpoint.id().to_string();
            return Ok(Resolution {
                endpoint: Arc::clone(endpoint),
                signal: None,
                reasoning: format!("fallback chain matched {id}"),
                source: SelectionSource::Fallback { id },
            });
        }

        warn!(
            baseline = %self.baseline,
            candidates = candidates.len(),
            "Fallback chain exhausted, requesting baseline endpoint"
        );
        match self.provider.get_chat_endpoint(&self.baseline).await {
            Ok(endpoint) => Ok(Resolution {
                reasoning: format!("baseline endpoint {}", endpoint.id()),
                endpoint,
                signal: None,
                source: SelectionSource::Baseline,
            }),
            Err(ProviderError::NotFound(_)) => Err(ResolveError::NoCandidates {
                candidates: candidates.len(),
                baseline: self.baseline.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
