//! Rule table configuration
//!
//! Replaces the built-in rule table with one read from TOML. The order of the
//! `[[rules]]` entries is the evaluation order.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use tablog_types::SeverityLevel;

use crate::error::{LogError, Result};
use crate::rules::RuleSet;

/// One level's worth of authored rule strings
#[derive(Clone, Debug, Deserialize)]
pub struct LevelRuleSpec {
    pub level: SeverityLevel,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Ordered mapping of level to rule strings
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub rules: Vec<LevelRuleSpec>,
}

impl RulesConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LogError::config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| LogError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Compile into a rule set. Invalid patterns become diagnostics.
    pub fn into_rule_set(self) -> RuleSet {
        self.rules
            .into_iter()
            .fold(RuleSet::builder(), |builder, entry| {
                builder.level(entry.level, entry.patterns)
            })
            .build()
    }
}
