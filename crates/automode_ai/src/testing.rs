//! In-memory endpoints and catalog for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::endpoint::{
    ChatEndpoint, EndpointCapabilities, EndpointError, EndpointProvider, ProviderError,
    Tokenizer, TokenizerKind,
};
use crate::types::{ChatRequest, ChatResponse, FinishReason, StreamChunk, TokenUsage};

pub(crate) struct MockTokenizer(TokenizerKind);

impl Tokenizer for MockTokenizer {
    fn kind(&self) -> TokenizerKind {
        self.0
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[derive(Debug)]
pub(crate) struct MockEndpoint {
    id: String,
    vendor: String,
    name: Option<String>,
    caps: EndpointCapabilities,
    latency: Option<Duration>,
    pub(crate) chat_calls: AtomicUsize,
    pub(crate) last_model: parking_lot::Mutex<Option<String>>,
}

impl MockEndpoint {
    pub(crate) fn new(id: &str, vendor: &str) -> Self {
        Self {
            id: id.to_string(),
            vendor: vendor.to_string(),
            name: None,
            caps: EndpointCapabilities {
                supports_tool_calls: true,
                supports_vision: false,
                supports_prediction: false,
                max_output_tokens: 4_096,
                max_prompt_tokens: 16_000,
                tokenizer: TokenizerKind::Cl100k,
            },
            latency: None,
            chat_calls: AtomicUsize::new(0),
            last_model: parking_lot::Mutex::new(None),
        }
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub(crate) fn vision(mut self) -> Self {
        self.caps.supports_vision = true;
        self
    }

    pub(crate) fn max_prompt_tokens(mut self, tokens: u32) -> Self {
        self.caps.max_prompt_tokens = tokens;
        self
    }

    pub(crate) fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn chat_count(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn record(&self, request: &ChatRequest) {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock() = Some(request.model.clone());
    }
}

#[async_trait]
impl ChatEndpoint for MockEndpoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.clone())
    }

    fn capabilities(&self) -> &EndpointCapabilities {
        &self.caps
    }

    async fn tokenizer(&self) -> Result<Arc<dyn Tokenizer>, EndpointError> {
        Ok(Arc::new(MockTokenizer(self.caps.tokenizer)))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, EndpointError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.record(request);
        Ok(ChatResponse {
            content: format!("reply from {}", self.id),
            model: request.model.clone(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
            tool_calls: None,
        })
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamChunk>, EndpointError> {
        self.record(request);
        let (tx, rx) = mpsc::channel(4);
        for (content, done) in [(self.id.clone(), false), (String::new(), true)] {
            let _ = tx
                .send(StreamChunk {
                    content,
                    done,
                    usage: None,
                })
                .await;
        }
        Ok(rx)
    }

    fn process_response(&self, raw: &serde_json::Value) -> Result<ChatResponse, EndpointError> {
        let content = raw
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| EndpointError::Transport("missing content".into()))?;
        Ok(ChatResponse {
            content: content.to_string(),
            model: self.id.clone(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
            tool_calls: None,
        })
    }

    async fn accept_usage_policy(&self) -> Result<bool, EndpointError> {
        Ok(true)
    }

    fn with_max_prompt_tokens(
        &self,
        max_prompt_tokens: u32,
    ) -> Result<Arc<dyn ChatEndpoint>, EndpointError> {
        let mut copy =
            MockEndpoint::new(&self.id, &self.vendor).max_prompt_tokens(max_prompt_tokens);
        copy.name = self.name.clone();
        Ok(Arc::new(copy))
    }
}

pub(crate) struct MockProvider {
    endpoints: Vec<Arc<dyn ChatEndpoint>>,
    baseline: Option<Arc<dyn ChatEndpoint>>,
    baseline_error: Option<ProviderError>,
    catalog_error: Option<ProviderError>,
    pub(crate) catalog_calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(endpoints: Vec<MockEndpoint>) -> Self {
        Self::shared(
            endpoints
                .into_iter()
                .map(|e| Arc::new(e) as Arc<dyn ChatEndpoint>)
                .collect(),
        )
    }

    pub(crate) fn shared(endpoints: Vec<Arc<dyn ChatEndpoint>>) -> Self {
        Self {
            endpoints,
            baseline: None,
            baseline_error: None,
            catalog_error: None,
            catalog_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_ids(ids: &[&str]) -> Self {
        Self::new(ids.iter().map(|id| MockEndpoint::new(id, "acme")).collect())
    }

    pub(crate) fn failing(error: ProviderError) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.catalog_error = Some(error);
        provider
    }

    pub(crate) fn baseline(mut self, endpoint: MockEndpoint) -> Self {
        self.baseline = Some(Arc::new(endpoint));
        self
    }

    pub(crate) fn baseline_error(mut self, error: ProviderError) -> Self {
        self.baseline_error = Some(error);
        self
    }
}

#[async_trait]
impl EndpointProvider for MockProvider {
    async fn get_all_chat_endpoints(&self) -> Result<Vec<Arc<dyn ChatEndpoint>>, ProviderError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        match &self.catalog_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.endpoints.clone()),
        }
    }

    async fn get_chat_endpoint(&self, id: &str) -> Result<Arc<dyn ChatEndpoint>, ProviderError> {
        if let Some(e) = &self.baseline_error {
            return Err(e.clone());
        }
        self.baseline
            .iter()
            .chain(self.endpoints.iter())
            .find(|e| e.matches_id(id))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}
