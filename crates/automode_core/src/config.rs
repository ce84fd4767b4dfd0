use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AutoModeError;

// ---------------------------------------------------------------------------
// SelectionConfig
// ---------------------------------------------------------------------------

/// Tunables for automatic endpoint selection.
///
/// Preference tables are ranked: the first id is the most preferred. The
/// fallback chain (`primary`, `secondary`, `tertiary`, then `baseline`) is
/// independent of the prompt and is tried only when no preferred id matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Prompts longer than this many characters raise the long-context signal.
    pub long_context_chars: usize,
    /// Candidates must accept strictly more prompt tokens than this to be
    /// considered for long-context prompts.
    pub long_context_min_prompt_tokens: u32,

    // Static preference tables
    pub reasoning: Vec<String>,
    pub code_generation: Vec<String>,
    pub code_review: Vec<String>,
    pub creative_writing: Vec<String>,
    pub default: Vec<String>,

    // Used when the capability-filtered candidate list comes back empty
    pub vision_fallback: Vec<String>,
    pub long_context_fallback: Vec<String>,

    // Fallback chain
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
    pub baseline: String,

    /// Buffer size of the selection-change broadcast channel.
    pub notification_capacity: usize,
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            long_context_chars: 8_000,
            long_context_min_prompt_tokens: 32_000,
            reasoning: ids(&["o3", "o1", "claude-opus-4", "gemini-2.5-pro", "claude-sonnet-4"]),
            code_generation: ids(&["claude-sonnet-4", "gpt-4.1", "gemini-2.5-pro", "gpt-4o"]),
            code_review: ids(&["claude-sonnet-4", "o4-mini", "gpt-4.1"]),
            creative_writing: ids(&["gpt-4o", "claude-sonnet-4", "gemini-2.0-flash"]),
            // Same ids as the fallback chain so "no prompt" and "no signal"
            // land on the same endpoint.
            default: ids(&["gpt-4.1", "gpt-4o", "claude-sonnet-4"]),
            vision_fallback: ids(&["gpt-4o", "claude-sonnet-4", "gemini-2.0-flash"]),
            long_context_fallback: ids(&["gemini-2.5-pro", "gpt-4.1", "claude-sonnet-4"]),
            primary: "gpt-4.1".into(),
            secondary: "gpt-4o".into(),
            tertiary: "claude-sonnet-4".into(),
            baseline: "gpt-4o-mini".into(),
            notification_capacity: 16,
        }
    }
}

impl SelectionConfig {
    /// The three chain ids tried before the baseline lookup, in order.
    pub fn fallback_chain(&self) -> [&str; 3] {
        [
            self.primary.as_str(),
            self.secondary.as_str(),
            self.tertiary.as_str(),
        ]
    }

    /// Reject settings the resolver cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("tertiary", &self.tertiary),
            ("baseline", &self.baseline),
        ] {
            if value.trim().is_empty() {
                bail!(AutoModeError::Config(format!(
                    "selection.{field} must not be empty"
                )));
            }
        }
        if self.notification_capacity == 0 {
            bail!(AutoModeError::Config(
                "selection.notification_capacity must be at least 1".into()
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AutoModeConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.automode/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoModeConfig {
    pub log_level: String,
    pub selection: SelectionConfig,
}

impl Default for AutoModeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            selection: SelectionConfig::default(),
        }
    }
}

impl AutoModeConfig {
    /// Returns the base config directory: `~/.automode/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".automode"))
    }

    /// Returns the config file path: `~/.automode/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Returns the logs directory: `~/.automode/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Loads config from disk, or creates the default file if missing.
    pub fn load() -> Result<Self> {
        let base = Self::base_dir()?;
        std::fs::create_dir_all(&base)
            .with_context(|| format!("Failed to create directory: {}", base.display()))?;
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config = Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Reject a log level `tracing` does not know, then check `selection`.
    pub fn validate(&self) -> Result<()> {
        if self.log_level.parse::<tracing::Level>().is_err() {
            bail!(AutoModeError::Config(format!(
                "log_level `{}` is not one of trace, debug, info, warn, error",
                self.log_level
            )));
        }
        self.selection.validate()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}
