//! Token estimation and budget checks.
//!
//! Uses a word-based heuristic: ~1.3 tokens per whitespace-separated word,
//! rounded up. Good enough to warn before a request; the provider's reported
//! usage is the authoritative count.

use radimpress_config::BudgetConfig;
use serde::{Deserialize, Serialize};

/// Estimate the token count for a string.
///
/// Heuristic: `ceil(words × 1.3)`.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 13).div_ceil(10)
}

/// How an estimate compares with the budget thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Within limits
    Ok,
    /// Large context
    Warn,
    /// May exceed the model's context window
    Error,
}

impl BudgetStatus {
    /// Operator-facing description of `tokens` at this status.
    pub fn describe(&self, tokens: usize) -> String {
        let n = group_thousands(tokens);
        match self {
            BudgetStatus::Ok => format!("Estimated {n} tokens - Within limits"),
            BudgetStatus::Warn => format!("Estimated {n} tokens - Large context"),
            BudgetStatus::Error => format!("Estimated {n} tokens - May exceed context window!"),
        }
    }
}

/// Token thresholds for the assembled system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub warn: usize,
    pub error: usize,
    /// Hard limit: prompts above this are never sent.
    pub ceiling: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            warn: 50_000,
            error: 100_000,
            ceiling: 120_000,
        }
    }
}

impl From<&BudgetConfig> for TokenBudget {
    fn from(config: &BudgetConfig) -> Self {
        Self {
            warn: config.warn_tokens,
            error: config.error_tokens,
            ceiling: config.ceiling_tokens,
        }
    }
}

impl TokenBudget {
    pub fn validate(&self, tokens: usize) -> BudgetStatus {
        if tokens > self.error {
            BudgetStatus::Error
        } else if tokens > self.warn {
            BudgetStatus::Warn
        } else {
            BudgetStatus::Ok
        }
    }

    pub fn is_blocked(&self, tokens: usize) -> bool {
        tokens > self.ceiling
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
