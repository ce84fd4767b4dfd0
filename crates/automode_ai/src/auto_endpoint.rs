//! Auto Endpoint
//!
//! A stand-in endpoint with a stable identity. Static metadata answers
//! immediately from a fixed [`EndpointCapabilities`] value; anything that
//! needs a real model resolves one per call through the
//! [`EndpointResolver`] and delegates to it.

use std::sync::Arc;

use async_trait::async_trait;
use automode_core::SelectionConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::endpoint::{
    ChatEndpoint, EndpointCapabilities, EndpointError, EndpointProvider, Tokenizer, TokenizerKind,
};
use crate::routing::{EndpointResolver, SelectionState};
use crate::types::{ChatRequest, ChatResponse, StreamChunk};

/// Model id the auto endpoint is listed under.
pub const AUTO_ENDPOINT_ID: &str = "auto";

/// Capability surface advertised before any model is resolved.
pub fn auto_capabilities() -> EndpointCapabilities {
    EndpointCapabilities {
        supports_tool_calls: true,
        supports_vision: true,
        supports_prediction: true,
        max_output_tokens: 16_384,
        max_prompt_tokens: 64_000,
        tokenizer: TokenizerKind::O200k,
    }
}

pub struct AutoEndpoint {
    capabilities: EndpointCapabilities,
    resolver: Arc<EndpointResolver>,
}

impl AutoEndpoint {
    pub fn new(resolver: Arc<EndpointResolver>) -> Self {
        Self {
            capabilities: auto_capabilities(),
            resolver,
        }
    }

    /// Compose a fresh [`SelectionState`], resolver and facade over `provider`.
    pub fn from_config(provider: Arc<dyn EndpointProvider>, config: &SelectionConfig) -> Self {
        let state = Arc::new(SelectionState::new(config.notification_capacity));
        Self::new(Arc::new(EndpointResolver::with_config(provider, state, config)))
    }

    pub fn resolver(&self) -> &Arc<EndpointResolver> {
        &self.resolver
    }

    /// Shared selection state, for display and change subscriptions.
    pub fn state(&self) -> &Arc<SelectionState> {
        self.resolver.state()
    }

    /// Resolve for `request`'s latest user message.
    pub async fn resolve_for(
        &self,
        request: &ChatRequest,
    ) -> Result<Arc<dyn ChatEndpoint>, EndpointError> {
        Ok(self.resolver.resolve(request.latest_user_prompt()).await?)
    }

    /// Like [`ChatEndpoint::chat`], but abandons the forward once `cancel`
    /// fires. Resolution itself always completes.
    pub async fn chat_cancellable(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatResponse, EndpointError> {
        let endpoint = self.resolve_for(request).await?;
        if cancel.is_cancelled() {
            debug!(model = endpoint.id(), "Request cancelled before forwarding");
            return Err(EndpointError::Cancelled);
        }

        let routed = routed_request(request, endpoint.as_ref());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(model = endpoint.id(), "Request cancelled while forwarding");
                Err(EndpointError::Cancelled)
            }
            response = endpoint.chat(&routed) => response,
        }
    }

    fn unsupported(&self, operation: &'static str) -> EndpointError {
        warn!(operation, "Unsupported operation invoked on auto endpoint");
        EndpointError::NotImplemented(operation)
    }
}

/// Copy of `request` addressed to `endpoint`.
fn routed_request(request: &ChatRequest, endpoint: &dyn ChatEndpoint) -> ChatRequest {
    let mut routed = request.clone();
    routed.model = endpoint.id().to_string();
    debug!(model = %routed.model, "Forwarding auto request");
    routed
}

#[async_trait]
impl ChatEndpoint for AutoEndpoint {
    fn id(&self) -> &str {
        AUTO_ENDPOINT_ID
    }

    fn vendor(&self) -> &str {
        AUTO_ENDPOINT_ID
    }

    /// Live: reflects the most recent resolution.
    fn name(&self) -> String {
        self.state().current_display_name()
    }

    fn capabilities(&self) -> &EndpointCapabilities {
        &self.capabilities
    }

    async fn tokenizer(&self) -> Result<Arc<dyn Tokenizer>, EndpointError> {
        let endpoint = self.resolver.resolve(None).await?;
        endpoint.tokenizer().await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, EndpointError> {
        let endpoint = self.resolve_for(request).await?;
        endpoint.chat(&routed_request(request, endpoint.as_ref())).await
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamChunk>, EndpointError> {
        let endpoint = self.resolve_for(request).await?;
        endpoint
            .stream_chat(&routed_request(request, endpoint.as_ref()))
            .await
    }

    fn process_response(&self, _raw: &serde_json::Value) -> Result<ChatResponse, EndpointError> {
        Err(self.unsupported("process_response"))
    }

    async fn accept_usage_policy(&self) -> Result<bool, EndpointError> {
        Err(self.unsupported("accept_usage_policy"))
    }

    fn with_max_prompt_tokens(
        &self,
        _max_prompt_tokens: u32,
    ) -> Result<Arc<dyn ChatEndpoint>, EndpointError> {
        Err(self.unsupported("with_max_prompt_tokens"))
    }
}
