//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use cycler_core::{AggregationConfig, EmptyInputPolicy, PhaseConvention};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Which phase even half-cycle indices denote.
    pub phase_convention: PhaseConvention,

    /// Whether a run without records is an error or an empty result.
    pub empty_input: EmptyInputPolicy,

    /// Extension of decoded record files when discovering inputs in a directory.
    pub records_extension: String,

    /// Extension of the companion acquisition log.
    pub log_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phase_convention: PhaseConvention::default(),
            empty_input: EmptyInputPolicy::default(),
            records_extension: "jsonl".to_string(),
            log_extension: "mpl".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CYCLER_*)
        figment = figment.merge(Env::prefixed("CYCLER_"));

        figment.extract()
    }

    /// Aggregation settings derived from this configuration.
    pub const fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            phase_convention: self.phase_convention,
            empty_input: self.empty_input,
        }
    }
}

/// Returns the platform-specific config directory for cycler.
///
/// On Linux: `~/.config/cycler`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cycler"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_cycler() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "cycler");
    }

    #[test]
    fn test_default_config_matches_eclab_layout() {
        let config = Config::default();
        assert_eq!(config.records_extension, "jsonl");
        assert_eq!(config.log_extension, "mpl");
        assert_eq!(config.phase_convention, PhaseConvention::ChargeFirst);
        assert_eq!(config.empty_input, EmptyInputPolicy::Fail);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cycler.toml");
        std::fs::write(
            &path,
            "phase_convention = \"discharge_first\"\nempty_input = \"empty_output\"\nlog_extension = \"txt\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.phase_convention, PhaseConvention::DischargeFirst);
        assert_eq!(config.empty_input, EmptyInputPolicy::EmptyOutput);
        assert_eq!(config.log_extension, "txt");
        assert_eq!(config.records_extension, "jsonl");

        let aggregation = config.aggregation();
        assert_eq!(aggregation.phase_convention, PhaseConvention::DischargeFirst);
        assert_eq!(aggregation.empty_input, EmptyInputPolicy::EmptyOutput);
    }

    #[test]
    fn test_invalid_convention_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cycler.toml");
        std::fs::write(&path, "phase_convention = \"sideways\"\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }
}
