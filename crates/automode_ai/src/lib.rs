pub mod auto_endpoint;
pub mod endpoint;
pub mod routing;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types at crate root for convenience.
pub use auto_endpoint::{AUTO_ENDPOINT_ID, AutoEndpoint, auto_capabilities};
pub use endpoint::{
    ChatEndpoint, EndpointCapabilities, EndpointDescriptor, EndpointError, EndpointProvider,
    ProviderError, Tokenizer, TokenizerKind, ids_match,
};
pub use routing::{
    ClassificationResult, EndpointResolver, PromptClassifier, ResolveError, Resolution,
    SelectionPolicy, SelectionSource, SelectionState, TaskSignal,
};
pub use types::*;
