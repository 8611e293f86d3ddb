//! Gateway configuration — deserialization and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::WhoisError;

/// Default WHOIS client executable.
pub const DEFAULT_COMMAND: &str = "whois";

/// Default subprocess timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default stdout cap for one invocation (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Default minimum spacing between two WHOIS invocations.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

/// Default `raw` length for domain/IP/ASN lookups.
pub const DEFAULT_LOOKUP_MAX_CHARS: usize = 3000;

/// Default length for `raw_whois` output.
pub const DEFAULT_RAW_MAX_CHARS: usize = 5000;

/// Top-level configuration, parsed from TOML. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// How the external WHOIS client is invoked.
///
/// The client is run via `tokio::process::Command` with an argument vector,
/// never through a shell.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// The executable to run.
    #[serde(default = "default_command")]
    pub command: String,
    /// Extra flags placed before the server override and the query target.
    #[serde(default)]
    pub args: Vec<String>,
    /// Kill the client after this many milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Stdout bytes kept before the client is killed.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

/// Rate limiting and response truncation.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Minimum spacing between invocations. Can be raised above the
    /// 1000 ms default, never lowered below it.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_lookup_max_chars")]
    pub lookup_max_chars: usize,
    #[serde(default = "default_raw_max_chars")]
    pub raw_max_chars: usize,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL_MS
}

fn default_lookup_max_chars() -> usize {
    DEFAULT_LOOKUP_MAX_CHARS
}

fn default_raw_max_chars() -> usize {
    DEFAULT_RAW_MAX_CHARS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            timeout_ms: default_timeout_ms(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            lookup_max_chars: default_lookup_max_chars(),
            raw_max_chars: default_raw_max_chars(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LimitsConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl GatewayConfig {
    /// Parse a TOML document. `origin` names the source in error messages.
    pub fn from_toml(content: &str, origin: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| WhoisError::ConfigParse(origin.to_string(), e.to_string()))
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WhoisError::ConfigRead(origin.clone(), e.to_string()))?;
        let config = Self::from_toml(&content, &origin)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config, failing fast before the gateway is built.
    pub fn validate(&self) -> crate::Result<()> {
        if self.client.command.trim().is_empty() {
            return Err(WhoisError::InvalidConfig(
                "client.command".to_string(),
                "must be a non-empty executable name or path".to_string(),
            ));
        }

        if self.client.timeout_ms == 0 {
            return Err(WhoisError::InvalidConfig(
                "client.timeout_ms".to_string(),
                "must be > 0".to_string(),
            ));
        }

        if self.client.max_output_bytes == 0 {
            return Err(WhoisError::InvalidConfig(
                "client.max_output_bytes".to_string(),
                "must be > 0".to_string(),
            ));
        }

        if self.limits.min_interval_ms < DEFAULT_MIN_INTERVAL_MS {
            return Err(WhoisError::InvalidConfig(
                "limits.min_interval_ms".to_string(),
                format!("must be >= {}", DEFAULT_MIN_INTERVAL_MS),
            ));
        }

        for (field, value) in [
            ("limits.lookup_max_chars", self.limits.lookup_max_chars),
            ("limits.raw_max_chars", self.limits.raw_max_chars),
        ] {
            if value == 0 {
                return Err(WhoisError::InvalidConfig(
                    field.to_string(),
                    "must be > 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_toml(toml_str: &str) -> GatewayConfig {
        GatewayConfig::from_toml(toml_str, "test").expect("valid TOML")
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_toml("");
        assert_eq!(config.client.command, "whois");
        assert!(config.client.args.is_empty());
        assert_eq!(config.client.timeout(), Duration::from_millis(15_000));
        assert_eq!(config.client.max_output_bytes, 1024 * 1024);
        assert_eq!(config.limits.min_interval(), Duration::from_millis(1000));
        assert_eq!(config.limits.lookup_max_chars, 3000);
        assert_eq!(config.limits.raw_max_chars, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_toml(
            r#"
            [client]
            command = "/usr/local/bin/whois"
            args = ["-H"]
            "#,
        );
        assert_eq!(config.client.command, "/usr/local/bin/whois");
        assert_eq!(config.client.args, vec!["-H".to_string()]);
        assert_eq!(config.client.timeout_ms, 15_000);
        assert_eq!(config.limits.min_interval_ms, 1000);
    }

    #[test]
    fn test_limits_override() {
        let config = parse_toml(
            r#"
            [limits]
            min_interval_ms = 2000
            lookup_max_chars = 100
            raw_max_chars = 200
            "#,
        );
        assert_eq!(config.limits.min_interval(), Duration::from_secs(2));
        assert_eq!(config.limits.lookup_max_chars, 100);
        assert_eq!(config.limits.raw_max_chars, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = parse_toml(
            r#"
            [client]
            command = "  "
            "#,
        );
        let result = config.validate();
        assert!(
            matches!(result, Err(WhoisError::InvalidConfig(field, _)) if field == "client.command")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = parse_toml(
            r#"
            [client]
            timeout_ms = 0
            "#,
        );
        let result = config.validate();
        assert!(
            matches!(result, Err(WhoisError::InvalidConfig(field, _)) if field == "client.timeout_ms")
        );
    }

    #[test]
    fn test_interval_below_floor_rejected() {
        for interval in ["0", "999"] {
            let config = parse_toml(&format!("[limits]\nmin_interval_ms = {}", interval));
            let result = config.validate();
            assert!(
                matches!(result, Err(WhoisError::InvalidConfig(field, _)) if field == "limits.min_interval_ms"),
                "min_interval_ms = {} should be rejected",
                interval
            );
        }
    }

    #[test]
    fn test_zero_char_limit_rejected() {
        let config = parse_toml(
            r#"
            [limits]
            raw_max_chars = 0
            "#,
        );
        let result = config.validate();
        assert!(
            matches!(result, Err(WhoisError::InvalidConfig(field, _)) if field == "limits.raw_max_chars")
        );
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = GatewayConfig::from_toml("[client]\ntimeout_ms = \"soon\"\n", "inline");
        assert!(matches!(result, Err(WhoisError::ConfigParse(origin, _)) if origin == "inline"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[client]\ntimeout_ms = 2500\n\n[limits]\nmin_interval_ms = 1500").unwrap();
        let config = GatewayConfig::load(file.path()).expect("config should load");
        assert_eq!(config.client.timeout_ms, 2500);
        assert_eq!(config.limits.min_interval_ms, 1500);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = GatewayConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(WhoisError::ConfigRead(..))));
    }

    #[test]
    fn test_load_validates() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[client]\nmax_output_bytes = 0").unwrap();
        let result = GatewayConfig::load(file.path());
        assert!(
            matches!(result, Err(WhoisError::InvalidConfig(field, _)) if field == "client.max_output_bytes")
        );
    }
}
