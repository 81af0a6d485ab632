// Optimization suggestions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionType {
    Virtualization,
    Memoization,
    Cleanup,
    LazyLoading,
}

impl SuggestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionType::Virtualization => "virtualization",
            SuggestionType::Memoization => "memoization",
            SuggestionType::Cleanup => "cleanup",
            SuggestionType::LazyLoading => "lazy-loading",
        }
    }
}

/// Three-step scale used for both impact and effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryOptimizationSuggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: SuggestionType,
    pub component: String,
    pub description: String,
    pub impact: Level,
    pub effort: Level,
    #[serde(rename = "projectedSavingsMB")]
    pub projected_savings_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    pub one_click_fix: bool,
}
