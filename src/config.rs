//! stanceflow configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use stanceflow_core::{Error, ModeConfig, Result};
use stanceflow_decay::DecayConfig;
use stanceflow_rollback::RollbackConfig;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceflowConfig {
    /// Mode used to seed new conversations.
    pub mode: ModeConfig,
    /// Decay projection parameters.
    pub decay: DecayConfig,
    /// Checkpoint history limits.
    pub rollback: RollbackConfig,
}

impl StanceflowConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject settings the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.mode.max_drift_per_turn > 0.0) {
            return Err(Error::Config("mode.maxDriftPerTurn must be positive".into()));
        }
        if !(self.mode.drift_budget > 0.0) {
            return Err(Error::Config("mode.driftBudget must be positive".into()));
        }
        if self.decay.search_horizon_hours == 0 {
            return Err(Error::Config("decay.searchHorizonHours must be at least 1".into()));
        }
        if self.rollback.max_checkpoints_per_branch == 0 {
            return Err(Error::Config(
                "rollback.maxCheckpointsPerBranch must be at least 1".into(),
            ));
        }
        if self.rollback.default_branch.trim().is_empty() {
            return Err(Error::Config("rollback.defaultBranch must not be empty".into()));
        }
        Ok(())
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanceflow_core::Frame;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: StanceflowConfig = toml::from_str(
            r#"
            [mode]
            frame = "poetic"
            driftBudget = 250.0

            [rollback]
            maxCheckpointsPerBranch = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.mode.frame, Frame::Poetic);
        assert_eq!(config.mode.drift_budget, 250.0);
        assert_eq!(config.mode.max_drift_per_turn, 20.0);
        assert_eq!(config.rollback.max_checkpoints_per_branch, 10);
        assert_eq!(config.rollback.default_branch, "main");
        assert_eq!(config.decay, DecayConfig::default());
    }

    #[test]
    fn validate_rejects_unusable_limits() {
        assert!(StanceflowConfig::default().validate().is_ok());

        let mut config = StanceflowConfig::default();
        config.mode.drift_budget = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = StanceflowConfig::default();
        config.rollback.max_checkpoints_per_branch = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = StanceflowConfig::default();
        config.mode.max_drift_per_turn = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn to_toml_round_trips() {
        let config = StanceflowConfig::default();
        let rendered = config.to_toml();
        assert!(rendered.contains("[mode]"));
        assert!(rendered.contains("[decay]"));
        assert!(rendered.contains("[rollback]"));
        let parsed: StanceflowConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
