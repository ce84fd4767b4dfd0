//! Endpoint collaborator traits and descriptors.
//!
//! Concrete endpoints and the catalog that lists them live outside this
//! crate; they plug in through [`ChatEndpoint`] and [`EndpointProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::routing::ResolveError;
use crate::types::{ChatRequest, ChatResponse, StreamChunk};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by the endpoint catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Endpoint not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Errors returned by endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The operation must be invoked on a concrete endpoint.
    #[error("{0} is not supported on the auto endpoint; call it on the resolved endpoint")]
    NotImplemented(&'static str),

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<EndpointError> for automode_core::AutoModeError {
    fn from(err: EndpointError) -> Self {
        use automode_core::AutoModeError;
        match err {
            EndpointError::NotImplemented(op) => AutoModeError::Unsupported(op.to_string()),
            EndpointError::Cancelled => AutoModeError::Cancelled,
            EndpointError::Resolve(e @ ResolveError::NoCandidates { .. }) => {
                AutoModeError::NoModel(e.to_string())
            }
            EndpointError::Resolve(ResolveError::Provider(e)) => {
                AutoModeError::Catalog(e.to_string())
            }
            EndpointError::Transport(msg) => AutoModeError::Internal(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Tokenizer family used to count prompt tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    Cl100k,
    O200k,
}

/// Static capability flags and limits of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCapabilities {
    pub supports_tool_calls: bool,
    pub supports_vision: bool,
    pub supports_prediction: bool,
    pub max_output_tokens: u32,
    /// Maximum prompt token budget.
    pub max_prompt_tokens: u32,
    pub tokenizer: TokenizerKind,
}

/// Counts tokens for a specific tokenizer family.
pub trait Tokenizer: Send + Sync {
    fn kind(&self) -> TokenizerKind;
    fn count_tokens(&self, text: &str) -> usize;
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Read-only description of an endpoint as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Model identifier, either bare (`gpt-4o`) or vendor-prefixed (`openai/gpt-4o`).
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub capabilities: EndpointCapabilities,
}

/// Two-form identifier equality used everywhere ids are compared: the bare
/// id, or the `{vendor}/{id}` alias.
pub fn ids_match(candidate_id: &str, vendor: &str, preferred: &str) -> bool {
    if candidate_id == preferred {
        return true;
    }
    candidate_id
        .strip_prefix(vendor)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|bare| bare == preferred)
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A model endpoint that can serve chat requests.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Model identifier.
    fn id(&self) -> &str;

    /// Vendor name used for prefixed id aliases.
    fn vendor(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> String;

    /// Static capability flags and limits.
    fn capabilities(&self) -> &EndpointCapabilities;

    /// Whether this endpoint answers to `preferred`.
    fn matches_id(&self, preferred: &str) -> bool {
        ids_match(self.id(), self.vendor(), preferred)
    }

    /// Snapshot of the endpoint's identity and capabilities.
    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor {
            id: self.id().to_string(),
            name: self.name(),
            vendor: self.vendor().to_string(),
            capabilities: self.capabilities().clone(),
        }
    }

    async fn tokenizer(&self) -> Result<Arc<dyn Tokenizer>, EndpointError>;

    /// Non-streaming completion.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, EndpointError>;

    /// Streaming completion; returns a channel that yields chunks.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamChunk>, EndpointError>;

    /// Turn a raw transport payload into a response.
    fn process_response(&self, raw: &serde_json::Value) -> Result<ChatResponse, EndpointError>;

    /// Accept the vendor usage policy for this endpoint.
    async fn accept_usage_policy(&self) -> Result<bool, EndpointError>;

    /// A copy of this endpoint with a different prompt token budget.
    fn with_max_prompt_tokens(
        &self,
        max_prompt_tokens: u32,
    ) -> Result<Arc<dyn ChatEndpoint>, EndpointError>;
}

/// Catalog of available chat endpoints.
#[async_trait]
pub trait EndpointProvider: Send + Sync {
    /// Every endpoint currently on offer (may be empty).
    async fn get_all_chat_endpoints(&self) -> Result<Vec<Arc<dyn ChatEndpoint>>, ProviderError>;

    /// Look up a single endpoint; fails with [`ProviderError::NotFound`].
    async fn get_chat_endpoint(&self, id: &str) -> Result<Arc<dyn ChatEndpoint>, ProviderError>;
}
