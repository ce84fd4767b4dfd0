//! Automatic Model Selection
//!
//! Lexical prompt classification, a priority-ordered preference policy,
//! endpoint resolution with a fixed fallback chain, and the shared record of
//! the active selection.

mod endpoint_resolver;
mod prompt_classifier;
mod selection_policy;
mod selection_state;

pub use endpoint_resolver::*;
pub use prompt_classifier::*;
pub use selection_policy::*;
pub use selection_state::*;
