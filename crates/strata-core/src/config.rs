//! Session configuration
//!
//! Every section carries `#[serde(default)]`, so a TOML file only needs the
//! keys it overrides:
//!
//! ```toml
//! [budget]
//! budget = 4000
//! max_callers = 5
//!
//! [surface]
//! api_name_prefixes = ["api_", "rpc_"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};

/// Complete configuration passed to each component constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub surface: SurfaceConfig,
    pub ranking: RankingConfig,
    pub snippet: SnippetConfig,
    pub inference: InferenceConfig,
    pub budget: BudgetConfig,
}

/// Rules deciding whether a unit is part of the public API surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Case-insensitive substrings of decorator names.
    pub api_decorators: Vec<String>,
    /// Globs matched against the unit's file path.
    pub api_file_patterns: Vec<String>,
    pub api_name_prefixes: Vec<String>,
    /// Names starting with this are never promoted by the reachability rule.
    pub private_prefix: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            api_decorators: strings(&["route", "api", "endpoint", "view", "handler"]),
            api_file_patterns: strings(&["*/api/*", "*/routes/*", "*/views/*", "*/endpoints/*"]),
            api_name_prefixes: strings(&["api_", "handle_", "public_"]),
            private_prefix: "_".to_string(),
        }
    }
}

/// Textual patterns used to score caller entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Matched case-insensitively against caller text of public units.
    pub api_patterns: Vec<String>,
    pub error_markers: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            api_patterns: strings(&["@route", "@api_view", "@endpoint", "@get", "@post"]),
            error_markers: strings(&["try:", "except"]),
        }
    }
}

/// Signature detection for windowed excerpts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// A signature ends at the first line whose trimmed text ends with one of these.
    pub signature_terminators: Vec<String>,
    /// Give up looking for the terminator after this many lines.
    pub signature_scan_limit: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            signature_terminators: strings(&[":"]),
            signature_scan_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Run the decorator and callable-parameter rules.
    pub enabled: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Which size measure enforces the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    /// Character count divided by four.
    #[default]
    Chars,
    /// cl100k_base token count; needs the `tiktoken` feature.
    Tiktoken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum measured size of a bundle.
    pub budget: usize,
    pub max_callers: usize,
    pub max_inferred: usize,
    /// Context lines kept around highlights on the first windowing pass.
    pub wide_context: u32,
    /// Context lines kept on the narrowing pass.
    pub narrow_context: u32,
    pub measure: MeasureKind,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            budget: 6000,
            max_callers: 3,
            max_inferred: 3,
            wide_context: 10,
            narrow_context: 5,
            measure: MeasureKind::Chars,
        }
    }
}

impl StrataConfig {
    pub fn from_toml_str(text: &str) -> StrataResult<Self> {
        let config: StrataConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> StrataResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StrataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> StrataResult<String> {
        toml::to_string_pretty(self).map_err(|e| StrataError::Config(e.to_string()))
    }

    pub fn validate(&self) -> StrataResult<()> {
        let budget = &self.budget;
        if budget.budget == 0 {
            return Err(StrataError::Config("budget.budget must be positive".into()));
        }
        if budget.narrow_context == 0 || budget.wide_context == 0 {
            return Err(StrataError::Config(
                "budget.wide_context and budget.narrow_context must be positive".into(),
            ));
        }
        if budget.narrow_context > budget.wide_context {
            return Err(StrataError::Config(
                "budget.narrow_context must not exceed budget.wide_context".into(),
            ));
        }
        if self.snippet.signature_scan_limit == 0 {
            return Err(StrataError::Config(
                "snippet.signature_scan_limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
