//! Feature flags and compiler settings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FEATURES_ENV: &str = "MQL_FEATURES";

/// Default maximum nesting of blocks (`x { y { ... } }`, `where`, `if`).
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// Register watches for resolved fields and honor invalidations.
    Watch,
    /// Trace every chunk evaluation.
    Trace,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Watch => "watch",
            Feature::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature `{0}` (expected one of: watch, trace)")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "watch" => Ok(Feature::Watch),
            "trace" => Ok(Feature::Trace),
            other => Err(UnknownFeature(other.to_string())),
        }
    }
}

/// Set of enabled features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features(Vec<Feature>);

impl Features {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: Feature) -> Self {
        if !self.0.contains(&feature) {
            self.0.push(feature);
        }
        self
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Parses a comma separated list such as `watch,trace`.
    pub fn parse(list: &str) -> Result<Self, UnknownFeature> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(Features::none(), |features, name| {
                Ok(features.with(name.parse()?))
            })
    }

    /// Reads `MQL_FEATURES`; an unset variable means no features.
    pub fn from_env() -> Result<Self, UnknownFeature> {
        match std::env::var(FEATURES_ENV) {
            Ok(list) => Self::parse(&list),
            Err(_) => Ok(Self::none()),
        }
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|f| f.name()).collect();
        write!(f, "{}", names.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub features: Features,
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            features: Features::none(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompilerConfig {
    pub fn new(features: Features) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_lists() {
        let features = Features::parse(" watch, trace,watch ").unwrap();
        assert!(features.is_enabled(Feature::Watch));
        assert!(features.is_enabled(Feature::Trace));
        assert_eq!(features.to_string(), "watch,trace");
        assert_eq!(Features::parse("").unwrap(), Features::none());
    }

    #[test]
    fn rejects_unknown_features() {
        let err = Features::parse("watch,turbo").unwrap_err();
        assert_eq!(err, UnknownFeature("turbo".into()));
    }
}
