use std::path::{Path, PathBuf};

use facet::Facet;

use crate::error::MprovError;

/// Default config filename, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mprov.toml";

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct Config {
    /// Multipass binary to invoke: a name resolved via PATH, or an
    /// absolute path.
    #[facet(default = "multipass")]
    pub multipass_bin: String,

    /// Image used when a request doesn't name one.
    #[facet(default = "22.04")]
    pub default_image: String,

    /// Append-only log of launch command vectors and their raw output.
    #[facet(default = "multipass.log")]
    pub log_file: String,

    /// Presleep bounds (whole seconds) before a create attempt.
    /// `jitter_max_s = 0` disables the presleep entirely.
    #[facet(default = 1)]
    pub jitter_min_s: u64,
    #[facet(default = 9)]
    pub jitter_max_s: u64,

    /// `--timeout` value passed to `multipass launch`.
    #[facet(default = 1800)]
    pub launch_timeout_s: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multipass_bin: "multipass".into(),
            default_image: "22.04".into(),
            log_file: "multipass.log".into(),
            jitter_min_s: 1,
            jitter_max_s: 9,
            launch_timeout_s: 1800,
        }
    }
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(&self.log_file)
    }
}

// ── validation ────────────────────────────────────────────

fn validate_config(config: &Config) -> Result<(), MprovError> {
    if config.multipass_bin.is_empty() {
        return Err(MprovError::Validation {
            message: "multipass_bin must not be empty".into(),
        });
    }
    if config.default_image.is_empty() {
        return Err(MprovError::Validation {
            message: "default_image must not be empty".into(),
        });
    }
    if config.log_file.is_empty() {
        return Err(MprovError::Validation {
            message: "log_file must not be empty".into(),
        });
    }
    if config.jitter_max_s != 0 && config.jitter_min_s > config.jitter_max_s {
        return Err(MprovError::Validation {
            message: format!(
                "jitter_min_s ({}) must not exceed jitter_max_s ({})",
                config.jitter_min_s, config.jitter_max_s
            ),
        });
    }
    if config.launch_timeout_s == 0 {
        return Err(MprovError::Validation {
            message: "launch_timeout_s must be at least 1".into(),
        });
    }
    Ok(())
}

// ── public API ────────────────────────────────────────────

/// Load config from an explicit path, or fall back to `mprov.toml` in the
/// working directory. The tool must run bare in a pipeline, so a missing
/// default file means built-in defaults; an explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, MprovError> {
    let path = match path {
        Some(p) => p,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                return Ok(Config::default());
            }
            default
        }
    };

    let contents = std::fs::read_to_string(path).map_err(|source| MprovError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    let config: Config = facet_toml::from_str(&contents).map_err(|e| MprovError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    validate_config(&config)?;

    Ok(config)
}
