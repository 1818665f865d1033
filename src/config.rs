use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::bundle::FLUSH_WINDOW_NS;
use crate::source::DATA_SOURCE_NAME;

/// Top-level configuration for hcitrace.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Logging verbosity (trace, debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data source and aggregation settings.
    #[serde(default)]
    pub tracing: TracingConfig,

    /// Record output settings for the replay tool.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Data source and aggregation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Name the data source registers under.
    #[serde(default = "default_data_source_name")]
    pub data_source_name: String,

    /// Minimum time between window flushes. Default: 100ms.
    #[serde(default = "default_flush_window", with = "humantime_serde")]
    pub flush_window: Duration,

    /// Flush early once this many distinct bundles are pending.
    /// Unbounded when unset.
    #[serde(default)]
    pub max_bundles: Option<usize>,
}

/// Record output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print each JSON record across several lines. Meant for
    /// reading in a terminal; the output is then not line-delimited.
    #[serde(default)]
    pub pretty: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_source_name() -> String {
    DATA_SOURCE_NAME.to_string()
}

fn default_flush_window() -> Duration {
    Duration::from_nanos(FLUSH_WINDOW_NS)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tracing: TracingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            data_source_name: default_data_source_name(),
            flush_window: default_flush_window(),
            max_bundles: None,
        }
    }
}

impl TracingConfig {
    /// Flush window in nanoseconds, saturating at `u64::MAX`.
    pub fn flush_window_ns(&self) -> u64 {
        u64::try_from(self.flush_window.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.tracing.data_source_name.trim().is_empty() {
            bail!("tracing.data_source_name is required");
        }

        if self.tracing.flush_window.is_zero() {
            bail!("tracing.flush_window must be positive");
        }

        if self.tracing.max_bundles == Some(0) {
            bail!("tracing.max_bundles must be positive when set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.tracing.data_source_name, "android.bluetooth_tracing");
        assert_eq!(cfg.tracing.flush_window, Duration::from_millis(100));
        assert_eq!(cfg.tracing.flush_window_ns(), FLUSH_WINDOW_NS);
        assert_eq!(cfg.tracing.max_bundles, None);
        assert!(!cfg.output.pretty);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(cfg.tracing.flush_window, Duration::from_millis(100));
        assert_eq!(cfg.tracing.data_source_name, DATA_SOURCE_NAME);
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
log_level: debug
tracing:
  data_source_name: test.hci
  flush_window: 250ms
  max_bundles: 64
output:
  pretty: true
"#;
        let cfg: Config = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.tracing.data_source_name, "test.hci");
        assert_eq!(cfg.tracing.flush_window, Duration::from_millis(250));
        assert_eq!(cfg.tracing.flush_window_ns(), 250_000_000);
        assert_eq!(cfg.tracing.max_bundles, Some(64));
        assert!(cfg.output.pretty);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let mut cfg = Config::default();
        cfg.tracing.data_source_name = "  ".to_string();
        let err = cfg.validate().expect_err("empty name");
        assert!(err.to_string().contains("data_source_name"));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut cfg = Config::default();
        cfg.tracing.flush_window = Duration::ZERO;
        let err = cfg.validate().expect_err("zero window");
        assert!(err.to_string().contains("flush_window"));
    }

    #[test]
    fn test_validate_rejects_zero_max_bundles() {
        let mut cfg = Config::default();
        cfg.tracing.max_bundles = Some(0);
        assert!(cfg.validate().is_err());

        cfg.tracing.max_bundles = Some(1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "tracing:\n  flush_window: 1s").expect("write");

        let cfg = Config::load(file.path()).expect("load");
        assert_eq!(cfg.tracing.flush_window, Duration::from_secs(1));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "tracing:\n  flush_window: 0s").expect("write");

        let err = Config::load(file.path()).expect_err("invalid");
        assert!(err.to_string().contains("flush_window"));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = Config::load(Path::new("/nonexistent/hcitrace.yaml")).expect_err("missing");
        assert!(err.to_string().contains("reading config file"));
    }
}
