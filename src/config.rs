//! Analysis settings.

use anyhow::{Context, Result};

/// Minimum populated cells a route-matrix row or column needs to be kept.
pub const DEFAULT_ROUTE_DENSITY_THRESHOLD: usize = 10;

/// Environment variable overriding [`DEFAULT_ROUTE_DENSITY_THRESHOLD`].
pub const ROUTE_DENSITY_THRESHOLD_VAR: &str = "ROUTE_DENSITY_THRESHOLD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub route_density_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            route_density_threshold: DEFAULT_ROUTE_DENSITY_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Builds the config from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `ROUTE_DENSITY_THRESHOLD` is set but is not a
    /// non-negative integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ROUTE_DENSITY_THRESHOLD_VAR) {
            config.route_density_threshold = raw.trim().parse().with_context(|| {
                format!("{ROUTE_DENSITY_THRESHOLD_VAR} must be a non-negative integer, got '{raw}'")
            })?;
        }

        Ok(config)
    }

    /// Overrides the route density threshold when `threshold` is set.
    pub fn with_route_threshold(mut self, threshold: Option<usize>) -> Self {
        if let Some(threshold) = threshold {
            self.route_density_threshold = threshold;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        assert_eq!(AnalysisConfig::default().route_density_threshold, 10);
    }

    #[test]
    fn test_lookup_overrides_default() {
        let config = AnalysisConfig::from_lookup(|_| Some(" 4 ".to_string())).unwrap();
        assert_eq!(config.route_density_threshold, 4);
    }

    #[test]
    fn test_lookup_missing_keeps_default() {
        let config = AnalysisConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = AnalysisConfig::from_lookup(|_| Some("ten".to_string())).unwrap_err();
        assert!(err.to_string().contains(ROUTE_DENSITY_THRESHOLD_VAR));
    }

    #[test]
    fn test_cli_override() {
        let config = AnalysisConfig::default().with_route_threshold(Some(3));
        assert_eq!(config.route_density_threshold, 3);
        let config = config.with_route_threshold(None);
        assert_eq!(config.route_density_threshold, 3);
    }
}
