//! Prompt Classifier
//!
//! Lexical, multi-label task detection over the user's prompt. Every signal
//! is computed independently; choosing between them is the policy's job.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A task-type signal, listed in selection priority order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSignal {
    ComplexReasoning,
    CodeGeneration,
    CodeReview,
    CreativeWriting,
    VisionTask,
    LongContext,
}

impl TaskSignal {
    /// All signals, highest priority first.
    pub const PRIORITY: [TaskSignal; 6] = [
        Self::ComplexReasoning,
        Self::CodeGeneration,
        Self::CodeReview,
        Self::CreativeWriting,
        Self::VisionTask,
        Self::LongContext,
    ];

    /// Whether this signal is raised in `result`.
    pub fn is_set(self, result: &ClassificationResult) -> bool {
        match self {
            Self::ComplexReasoning => result.complex_reasoning,
            Self::CodeGeneration => result.code_generation,
            Self::CodeReview => result.code_review,
            Self::CreativeWriting => result.creative_writing,
            Self::VisionTask => result.vision_task,
            Self::LongContext => result.long_context,
        }
    }
}

impl std::fmt::Display for TaskSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ComplexReasoning => "complex reasoning",
            Self::CodeGeneration => "code generation",
            Self::CodeReview => "code review",
            Self::CreativeWriting => "creative writing",
            Self::VisionTask => "vision",
            Self::LongContext => "long context",
        };
        f.write_str(s)
    }
}

/// Independent task signals extracted from one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub complex_reasoning: bool,
    pub code_generation: bool,
    pub code_review: bool,
    pub creative_writing: bool,
    pub vision_task: bool,
    pub long_context: bool,
    /// Prompt length in characters.
    pub length: usize,
}

impl ClassificationResult {
    /// Raised signals in priority order.
    pub fn active_signals(&self) -> Vec<TaskSignal> {
        TaskSignal::PRIORITY
            .into_iter()
            .filter(|s| s.is_set(self))
            .collect()
    }

    /// Whether no signal is raised.
    pub fn is_empty(&self) -> bool {
        self.active_signals().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Vocabulary (word-boundary, case-insensitive)
// ---------------------------------------------------------------------------

static COMPLEX_REASONING: Lazy<Regex> = Lazy::new(|| {
    vocabulary(&[
        r"reason(?:ing)?",
        r"analy[sz]e",
        r"analysis",
        r"prove",
        r"proof",
        r"derive",
        r"step[- ]by[- ]step",
        r"think through",
        r"trade-?offs?",
        r"architecture",
        r"algorithms?",
        r"complex(?:ity)?",
        r"mathematical",
        r"theorem",
    ])
});

// Generation intent: a producing verb, up to three words, then a code noun.
// A bare code noun ("this function", "the code") is not a signal here.
static CODE_GENERATION: Lazy<Regex> = Lazy::new(|| {
    vocabulary(&[
        r"implement(?:s|ing)?",
        r"scaffold(?:ing)?",
        r"boilerplate",
        concat!(
            r"(?:write|create|generate|build)(?:\s+\w+){0,3}?\s+",
            r"(?:code|functions?|class(?:es)?|methods?|scripts?|snippets?|programs?|",
            r"modules?|components?)",
        ),
    ])
});

static CODE_REVIEW: Lazy<Regex> = Lazy::new(|| {
    vocabulary(&[
        r"review",
        r"refactor(?:ing)?",
        r"debug(?:ging)?",
        r"bugs?",
        r"fix",
        r"lint",
        r"code smells?",
        r"stack trace",
    ])
});

static CREATIVE_WRITING: Lazy<Regex> = Lazy::new(|| {
    vocabulary(&[
        r"story",
        r"stories",
        r"poem",
        r"poetry",
        r"haiku",
        r"essay",
        r"creative",
        r"fiction",
        r"narrative",
        r"lyrics",
        r"novel",
        r"brainstorm",
    ])
});

static VISION_TASK: Lazy<Regex> = Lazy::new(|| {
    vocabulary(&[
        r"images?",
        r"pictures?",
        r"photos?",
        r"screenshots?",
        r"diagrams?",
        r"charts?",
        r"visual",
        r"ocr",
    ])
});

/// Build one alternation wrapped in word boundaries.
fn vocabulary(words: &[&str]) -> Regex {
    let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("Bad vocabulary pattern `{pattern}`: {e}"))
}

// ---------------------------------------------------------------------------
// PromptClassifier
// ---------------------------------------------------------------------------

/// Stateless mapping from prompt text to [`ClassificationResult`].
#[derive(Debug, Clone)]
pub struct PromptClassifier {
    long_context_chars: usize,
}

impl Default for PromptClassifier {
    fn default() -> Self {
        Self::new(8_000)
    }
}

impl PromptClassifier {
    /// `long_context_chars`: prompts strictly longer than this raise
    /// [`TaskSignal::LongContext`].
    pub fn new(long_context_chars: usize) -> Self {
        let _ = &*COMPLEX_REASONING;
        let _ = &*CODE_GENERATION;
        let _ = &*CODE_REVIEW;
        let _ = &*CREATIVE_WRITING;
        let _ = &*VISION_TASK;

        Self { long_context_chars }
    }

    pub fn classify(&self, prompt: Option<&str>) -> ClassificationResult {
        let Some(text) = prompt.filter(|p| !p.trim().is_empty()) else {
            return ClassificationResult::default();
        };

        let length = text.chars().count();
        ClassificationResult {
            complex_reasoning: COMPLEX_REASONING.is_match(text),
            code_generation: CODE_GENERATION.is_match(text),
            code_review: CODE_REVIEW.is_match(text),
            creative_writing: CREATIVE_WRITING.is_match(text),
            vision_task: VISION_TASK.is_match(text),
            long_context: length > self.long_context_chars,
            length,
        }
    }
}
