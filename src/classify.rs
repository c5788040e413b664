//! Capture classification
//!
//! Sorts free-form captures into categories with an ordered rule table:
//! user-defined rules from config.toml first, then the built-ins, first
//! match wins. Unmatched text lands in the journal.

use crate::config::CaptureRule;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Category assigned when no rule matches.
pub const DEFAULT_CATEGORY: &str = "journal";

/// Built-in classification rules, tried after any user-defined ones.
const BUILTIN_RULES: &[(&str, &str)] = &[
    (r"(?i)^(todo|task)\b", "task"),
    (
        r"(?i)\b(call|email|text|buy|fix|schedule|book|pay|send|renew|cancel|pick up)\b",
        "task",
    ),
    (r"(?i)^(idea|what if)\b", "idea"),
    (r"(?i)\b(should (build|make|write|try)|idea for)\b", "idea"),
    (
        r"(?i)\b(met|talked to|talked with|lunch with|coffee with|dinner with|caught up with)\b",
        "contact",
    ),
];

/// Result of classifying one capture
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Classification {
    pub category: String,
    /// The pattern that decided the category; None for the fallback.
    pub matched_rule: Option<String>,
}

/// Error type for classification
#[derive(Debug)]
pub enum ClassifyError {
    Regex(regex::Error),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::Regex(e) => write!(f, "Invalid classification rule: {}", e),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<regex::Error> for ClassifyError {
    fn from(e: regex::Error) -> Self {
        ClassifyError::Regex(e)
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Compute SHA256 hash of capture content (dedup key)
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CompiledRule {
    pattern: Regex,
    source: String,
    category: String,
}

/// Ordered rule table for capture classification
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    /// Build a classifier from user-defined rules plus the built-ins.
    /// User rules are tried first, in config order. A bad user pattern
    /// fails fast rather than being skipped silently.
    pub fn new(custom: &[CaptureRule]) -> Result<Self> {
        let mut rules = Vec::with_capacity(custom.len() + BUILTIN_RULES.len());

        for rule in custom {
            // Case-insensitive unless the pattern opts out itself
            let source = if rule.pattern.starts_with("(?") {
                rule.pattern.clone()
            } else {
                format!("(?i){}", rule.pattern)
            };
            rules.push(CompiledRule {
                pattern: Regex::new(&source)?,
                source: rule.pattern.clone(),
                category: rule.category.clone(),
            });
        }

        for (pattern, category) in BUILTIN_RULES {
            rules.push(CompiledRule {
                pattern: Regex::new(pattern)?,
                source: (*pattern).to_string(),
                category: (*category).to_string(),
            });
        }

        Ok(Self { rules })
    }

    /// Classify one capture. First matching rule wins.
    pub fn classify(&self, content: &str) -> Classification {
        for rule in &self.rules {
            if rule.pattern.is_match(content) {
                return Classification {
                    category: rule.category.clone(),
                    matched_rule: Some(rule.source.clone()),
                };
            }
        }
        Classification {
            category: DEFAULT_CATEGORY.to_string(),
            matched_rule: None,
        }
    }
}
