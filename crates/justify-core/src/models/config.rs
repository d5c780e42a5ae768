use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How a candidate set is grown until it entails the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionStrategy {
    /// One statement at a time, in set order
    Simple,
    /// Relevance closure from the entailment signature
    #[default]
    Structural,
    /// Relevance closure that follows defining statements first
    TypePriority,
    /// A single check of the whole (module-reduced) input
    Modularity,
}

/// How an entailing set is shrunk to a minimal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractionStrategy {
    /// Linear one-at-a-time removal
    Simple,
    /// Window removal with module recompute, then a linear pass
    Windowed,
    /// Recursive halving
    #[default]
    DivideAndConquer,
}

impl ExpansionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ExpansionStrategy::Simple => "simple",
            ExpansionStrategy::Structural => "structural",
            ExpansionStrategy::TypePriority => "type-priority",
            ExpansionStrategy::Modularity => "modularity",
        }
    }
}

impl ContractionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ContractionStrategy::Simple => "simple",
            ContractionStrategy::Windowed => "windowed",
            ContractionStrategy::DivideAndConquer => "divide-and-conquer",
        }
    }
}

impl fmt::Display for ExpansionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ContractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpansionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(ExpansionStrategy::Simple),
            "structural" => Ok(ExpansionStrategy::Structural),
            "type-priority" | "typepriority" => Ok(ExpansionStrategy::TypePriority),
            "modularity" => Ok(ExpansionStrategy::Modularity),
            other => Err(Error::Config(format!(
                "unknown expansion strategy '{}' (expected simple, structural, type-priority or modularity)",
                other
            ))),
        }
    }
}

impl FromStr for ContractionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(ContractionStrategy::Simple),
            "windowed" => Ok(ContractionStrategy::Windowed),
            "divide-and-conquer" | "dnc" => Ok(ContractionStrategy::DivideAndConquer),
            other => Err(Error::Config(format!(
                "unknown contraction strategy '{}' (expected simple, windowed or divide-and-conquer)",
                other
            ))),
        }
    }
}

/// Tuning knobs for a justification search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub expansion: ExpansionStrategy,
    pub contraction: ContractionStrategy,
    /// Remove statements shared by many justifications first
    pub order_by_frequency: bool,
    /// Wrap the oracle in a monotonicity-aware answer cache
    pub cache_oracle: bool,
    /// Type-priority expansion checks the whole input before growing
    pub initial_entailment_check: bool,
    /// Windowed contraction uses windows of `max(1, n / window_divisor)`
    pub window_divisor: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            expansion: ExpansionStrategy::default(),
            contraction: ContractionStrategy::default(),
            order_by_frequency: true,
            cache_oracle: true,
            initial_entailment_check: true,
            window_divisor: 20,
        }
    }
}

impl SearchConfig {
    pub fn with_expansion(mut self, expansion: ExpansionStrategy) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn with_contraction(mut self, contraction: ContractionStrategy) -> Self {
        self.contraction = contraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_divisor == 0 {
            return Err(Error::Config("window_divisor must be at least 1".into()));
        }
        if self.contraction != ContractionStrategy::Windowed && self.window_divisor != 20 {
            return Err(Error::Config(format!(
                "window_divisor only applies to windowed contraction, not {}",
                self.contraction
            )));
        }
        if self.expansion != ExpansionStrategy::TypePriority && !self.initial_entailment_check {
            return Err(Error::Config(format!(
                "initial_entailment_check only applies to type-priority expansion, not {}",
                self.expansion
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.expansion, ExpansionStrategy::Structural);
        assert_eq!(config.contraction, ContractionStrategy::DivideAndConquer);
        assert!(config.order_by_frequency);
        assert!(config.cache_oracle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SearchConfig::from_json(r#"{"expansion": "type-priority", "cache_oracle": false}"#).unwrap();
        assert_eq!(config.expansion, ExpansionStrategy::TypePriority);
        assert!(!config.cache_oracle);
        assert_eq!(config.contraction, ContractionStrategy::DivideAndConquer);
    }

    #[test]
    fn test_unknown_strategy_name_rejected() {
        assert!(SearchConfig::from_json(r#"{"expansion": "greedy"}"#).is_err());
        assert!("greedy".parse::<ExpansionStrategy>().is_err());
    }

    #[test]
    fn test_names_parse_back() {
        for s in [
            ExpansionStrategy::Simple,
            ExpansionStrategy::Structural,
            ExpansionStrategy::TypePriority,
            ExpansionStrategy::Modularity,
        ] {
            assert_eq!(s.name().parse::<ExpansionStrategy>().unwrap(), s);
        }
        for c in [
            ContractionStrategy::Simple,
            ContractionStrategy::Windowed,
            ContractionStrategy::DivideAndConquer,
        ] {
            assert_eq!(c.to_string().parse::<ContractionStrategy>().unwrap(), c);
        }
    }

    #[test]
    fn test_validate_rejects_inapplicable_settings() {
        let zero_window = SearchConfig {
            contraction: ContractionStrategy::Windowed,
            window_divisor: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(zero_window.validate(), Err(Error::Config(_))));

        let stray_window = SearchConfig {
            window_divisor: 10,
            ..SearchConfig::default()
        };
        assert!(stray_window.validate().is_err());

        let stray_check = SearchConfig {
            initial_entailment_check: false,
            ..SearchConfig::default()
        };
        assert!(stray_check.validate().is_err());

        let type_priority = SearchConfig {
            expansion: ExpansionStrategy::TypePriority,
            initial_entailment_check: false,
            ..SearchConfig::default()
        };
        assert!(type_priority.validate().is_ok());
    }
}
