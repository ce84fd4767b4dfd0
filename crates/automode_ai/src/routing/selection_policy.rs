//! Selection Policy
//!
//! Turns classifier signals into a ranked list of model ids. The policy is an
//! ordered list of rules; the first rule whose signal is raised decides the
//! list, later rules are never merged in.

use std::sync::Arc;

use automode_core::SelectionConfig;
use serde::Serialize;
use tracing::debug;

use crate::endpoint::{ChatEndpoint, EndpointCapabilities};

use super::prompt_classifier::{ClassificationResult, TaskSignal};

/// Ranked model ids, most preferred first.
pub type PreferenceList = Vec<String>;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Capability predicate used to derive a preference list from the live
/// candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapabilityFilter {
    Vision,
    /// Strictly more prompt tokens than the given budget.
    PromptTokensAbove(u32),
}

impl CapabilityFilter {
    pub fn accepts(&self, caps: &EndpointCapabilities) -> bool {
        match *self {
            Self::Vision => caps.supports_vision,
            Self::PromptTokensAbove(min) => caps.max_prompt_tokens > min,
        }
    }
}

/// Where a rule's preference list comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PreferenceSource {
    Static(PreferenceList),
    /// Candidates passing `filter`, in catalog order; `fallback` if none do.
    Dynamic {
        filter: CapabilityFilter,
        fallback: PreferenceList,
    },
}

/// One `(signal, preference source)` pair of the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub signal: TaskSignal,
    pub source: PreferenceSource,
}

/// Outcome of evaluating the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyChoice {
    /// The signal that decided the list, `None` for the default list.
    pub signal: Option<TaskSignal>,
    pub preferences: PreferenceList,
}

// ---------------------------------------------------------------------------
// SelectionPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    rules: Vec<PolicyRule>,
    default: PreferenceList,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl SelectionPolicy {
    /// Build the rule list in priority order from configuration.
    pub fn from_config(config: &SelectionConfig) -> Self {
        let rules = TaskSignal::PRIORITY
            .into_iter()
            .map(|signal| {
                let source = match signal {
                    TaskSignal::ComplexReasoning => {
                        PreferenceSource::Static(config.reasoning.clone())
                    }
                    TaskSignal::CodeGeneration => {
                        PreferenceSource::Static(config.code_generation.clone())
                    }
                    TaskSignal::CodeReview => PreferenceSource::Static(config.code_review.clone()),
                    TaskSignal::CreativeWriting => {
                        PreferenceSource::Static(config.creative_writing.clone())
                    }
                    TaskSignal::VisionTask => PreferenceSource::Dynamic {
                        filter: CapabilityFilter::Vision,
                        fallback: config.vision_fallback.clone(),
                    },
                    TaskSignal::LongContext => PreferenceSource::Dynamic {
                        filter: CapabilityFilter::PromptTokensAbove(
                            config.long_context_min_prompt_tokens,
                        ),
                        fallback: config.long_context_fallback.clone(),
                    },
                };
                PolicyRule { signal, source }
            })
            .collect();

        Self {
            rules,
            default: config.default.clone(),
        }
    }

    /// The rules, highest priority first.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// List used when no rule fires.
    pub fn default_list(&self) -> &[String] {
        &self.default
    }

    pub fn preference_list(
        &self,
        classification: &ClassificationResult,
        candidates: &[Arc<dyn ChatEndpoint>],
    ) -> PreferenceList {
        self.choose(classification, candidates).preferences
    }

    /// Evaluate the rules in order and return the first raised signal's list.
    pub fn choose(
        &self,
        classification: &ClassificationResult,
        candidates: &[Arc<dyn ChatEndpoint>],
    ) -> PolicyChoice {
        let Some(rule) = self.rules.iter().find(|r| r.signal.is_set(classification)) else {
            debug!("No task signal raised, using default preferences");
            return PolicyChoice {
                signal: None,
                preferences: self.default.clone(),
            };
        };

        let preferences = match &rule.source {
            PreferenceSource::Static(list) => list.clone(),
            PreferenceSource::Dynamic { filter, fallback } => {
                let derived: PreferenceList = candidates
                    .iter()
                    .filter(|c| filter.accepts(c.capabilities()))
                    .map(|c| c.id().to_string())
                    .collect();
                if derived.is_empty() {
                    debug!(signal = %rule.signal, "No capable candidates, using static fallback");
                    fallback.clone()
                } else {
                    derived
                }
            }
        };

        debug!(signal = %rule.signal, count = preferences.len(), "Preference list chosen");
        PolicyChoice {
            signal: Some(rule.signal),
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PromptClassifier;
    use crate::testing::MockEndpoint;

    fn candidates(list: Vec<MockEndpoint>) -> Vec<Arc<dyn ChatEndpoint>> {
        list.into_iter()
            .map(|e| Arc::new(e) as Arc<dyn ChatEndpoint>)
            .collect()
    }

    #[test]
    fn rules_follow_fixed_priority() {
        let policy = SelectionPolicy::default();
        let order: Vec<TaskSignal> = policy.rules().iter().map(|r| r.signal).collect();
        assert_eq!(order, TaskSignal::PRIORITY.to_vec());
    }

    #[test]
    fn code_review_prompt_uses_code_review_list() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let c = PromptClassifier::default().classify(Some("Can you debug this module?"));
        assert!(c.code_review && !c.complex_reasoning);
        assert_eq!(policy.preference_list(&c, &[]), cfg.code_review);
    }

    #[test]
    fn code_generation_beats_creative_writing() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let c = PromptClassifier::default()
            .classify(Some("Write a function that prints a short story"));
        assert!(c.code_generation && c.creative_writing);

        let choice = policy.choose(&c, &[]);
        assert_eq!(choice.signal, Some(TaskSignal::CodeGeneration));
        assert_eq!(choice.preferences, cfg.code_generation);
    }

    #[test]
    fn code_nouns_in_review_prompts_use_code_review_list() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let classifier = PromptClassifier::default();
        for prompt in [
            "refactor this function",
            "debug this code",
            "fix the bug in this method",
            "review my class",
        ] {
            let choice = policy.choose(&classifier.classify(Some(prompt)), &[]);
            assert_eq!(choice.signal, Some(TaskSignal::CodeReview), "{prompt:?}");
            assert_eq!(choice.preferences, cfg.code_review, "{prompt:?}");
        }
    }

    #[test]
    fn each_priority_step_wins_over_the_next() {
        let policy = SelectionPolicy::default();
        let classifier = PromptClassifier::default();
        let long_review = format!("review {}", "x ".repeat(5_000));
        let cases = [
            ("analyze and debug this", TaskSignal::ComplexReasoning),
            ("analyze this algorithm and implement it", TaskSignal::ComplexReasoning),
            ("implement a function and fix the bug", TaskSignal::CodeGeneration),
            ("review my essay", TaskSignal::CodeReview),
            ("write a poem about this photo", TaskSignal::CreativeWriting),
            (long_review.as_str(), TaskSignal::CodeReview),
        ];
        for (prompt, expected) in cases {
            let c = classifier.classify(Some(prompt));
            assert!(c.active_signals().len() >= 2, "{prompt:?} raised a single signal");
            let choice = policy.choose(&c, &[]);
            assert_eq!(choice.signal, Some(expected), "{prompt:?}");
        }
    }

    #[test]
    fn no_signal_uses_default_list() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let choice = policy.choose(&ClassificationResult::default(), &[]);
        assert_eq!(choice.signal, None);
        assert_eq!(choice.preferences, cfg.default);
    }

    #[test]
    fn vision_list_is_derived_from_capable_candidates() {
        let policy = SelectionPolicy::default();
        let c = ClassificationResult {
            vision_task: true,
            ..Default::default()
        };
        let cands = candidates(vec![
            MockEndpoint::new("o3-mini", "openai"),
            MockEndpoint::new("gpt-4o", "openai").vision(),
            MockEndpoint::new("anthropic/claude-sonnet-4", "anthropic").vision(),
        ]);
        assert_eq!(
            policy.preference_list(&c, &cands),
            vec!["gpt-4o".to_string(), "anthropic/claude-sonnet-4".to_string()]
        );
    }

    #[test]
    fn vision_without_capable_candidates_falls_back_to_static() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let c = ClassificationResult {
            vision_task: true,
            ..Default::default()
        };
        let cands = candidates(vec![MockEndpoint::new("o3-mini", "openai")]);
        assert_eq!(policy.preference_list(&c, &cands), cfg.vision_fallback);
    }

    #[test]
    fn long_prompt_derives_list_from_large_windows() {
        let policy = SelectionPolicy::default();
        let prompt = "lorem ipsum ".repeat(800);
        let c = PromptClassifier::default().classify(Some(&prompt));
        assert!(c.long_context);
        assert_eq!(c.active_signals(), vec![TaskSignal::LongContext]);

        let cands = candidates(vec![
            MockEndpoint::new("small", "acme").max_prompt_tokens(16_000),
            MockEndpoint::new("exact", "acme").max_prompt_tokens(32_000),
            MockEndpoint::new("large", "acme").max_prompt_tokens(128_000),
        ]);
        assert_eq!(policy.preference_list(&c, &cands), vec!["large".to_string()]);
    }

    #[test]
    fn long_context_without_large_windows_falls_back() {
        let cfg = SelectionConfig::default();
        let policy = SelectionPolicy::from_config(&cfg);
        let c = ClassificationResult {
            long_context: true,
            length: 9_000,
            ..Default::default()
        };
        let cands = candidates(vec![MockEndpoint::new("small", "acme").max_prompt_tokens(8_000)]);
        assert_eq!(policy.preference_list(&c, &cands), cfg.long_context_fallback);
    }

    #[test]
    fn vision_outranks_long_context() {
        let policy = SelectionPolicy::default();
        let c = ClassificationResult {
            vision_task: true,
            long_context: true,
            ..Default::default()
        };
        let cands = candidates(vec![
            MockEndpoint::new("seer", "acme").vision().max_prompt_tokens(8_000),
            MockEndpoint::new("reader", "acme").max_prompt_tokens(200_000),
        ]);
        let choice = policy.choose(&c, &cands);
        assert_eq!(choice.signal, Some(TaskSignal::VisionTask));
        assert_eq!(choice.preferences, vec!["seer".to_string()]);
    }

    #[test]
    fn filter_accepts() {
        let e = MockEndpoint::new("m", "acme").max_prompt_tokens(32_001);
        assert!(CapabilityFilter::PromptTokensAbove(32_000).accepts(e.capabilities()));
        assert!(!CapabilityFilter::Vision.accepts(e.capabilities()));
    }
}
