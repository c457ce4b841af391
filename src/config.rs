//! Configuration for the kernel and for configuration-built benches.
//!
//! A configuration file declares kernel options, the signals of a bench and
//! the processes to instantiate from the [`ModelRegistry`].
//!
//! # Configuration File Structure
//!
//! ```yaml
//! kernel:
//!   fault_policy: isolate
//!   time_limit: 1000
//!   record_changes: true
//!   log_level: tickwire=debug
//!
//! signals:
//!   - name: clk
//!     initial: 0
//!   - name: reset
//!   - name: enable
//!   - name: count
//!
//! processes:
//!   - name: clock
//!     model: clock
//!     attrs:
//!       signal: clk
//!       half_period: "1"
//!   - name: counter
//!     model: counter
//!     attrs:
//!       clock: clk
//!       reset: reset
//!       enable: enable
//!       count: count
//!   - name: master
//!     model: driver
//!     attrs:
//!       script: "delay 10; set enable 1; delay 40; finish"
//! ```
//!
//! [`ModelRegistry`]: crate::registry::ModelRegistry

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::hook::Edge;
use crate::types::{SimTime, Value};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error("Process '{process}' is missing attribute '{attr}'")]
    MissingAttr { process: String, attr: String },

    #[error("Process '{process}' has invalid attribute '{attr}': {reason}")]
    InvalidAttr {
        process: String,
        attr: String,
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What happens when a process body panics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Terminate the faulting process, record the fault, keep running.
    #[default]
    Isolate,
    /// Terminate the faulting process and return the fault from `run`.
    Abort,
}

/// Kernel options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Behavior on process panics
    #[serde(default)]
    pub fault_policy: FaultPolicy,

    /// Stop `run` before the clock passes this tick
    #[serde(default)]
    pub time_limit: Option<SimTime>,

    /// Keep a log of every committed value change
    #[serde(default)]
    pub record_changes: bool,

    /// Settle once more when the event queue drains, so the last writes
    /// commit and wake their waiters before `run` returns
    #[serde(default)]
    pub settle_on_drain: bool,

    /// Filter directive for `init_logging_from` (`info`, `tickwire=debug`, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::default(),
            time_limit: None,
            record_changes: false,
            settle_on_drain: false,
            log_level: default_log_level(),
        }
    }
}

/// A signal declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalConfig {
    pub name: String,

    #[serde(default)]
    pub initial: Value,
}

/// A static trigger of a configured process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Signal name
    pub signal: String,

    #[serde(default = "default_edge")]
    pub edge: Edge,
}

fn default_edge() -> Edge {
    Edge::Rising
}

/// A process instantiated from a registered model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Unique process name
    pub name: String,

    /// Registered model name
    pub model: String,

    /// Model parameters as key-value pairs
    #[serde(default)]
    pub attrs: HashMap<String, String>,

    /// Extra static sensitivity on top of what the model declares
    #[serde(default)]
    pub sensitivity: Vec<SensitivityConfig>,
}

impl ProcessConfig {
    /// Creates a process entry for a model.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            attrs: HashMap::new(),
            sensitivity: Vec::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Adds a static trigger.
    pub fn with_sensitivity(mut self, signal: impl Into<String>, edge: Edge) -> Self {
        self.sensitivity.push(SensitivityConfig {
            signal: signal.into(),
            edge,
        });
        self
    }

    /// Returns a required attribute.
    pub fn attr(&self, key: &str) -> ConfigResult<&str> {
        self.attrs
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingAttr {
                process: self.name.clone(),
                attr: key.to_string(),
            })
    }

    /// Parses an optional attribute.
    pub fn parse_attr<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.attrs.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| {
                ConfigError::InvalidAttr {
                    process: self.name.clone(),
                    attr: key.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Kernel options
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Signal declarations
    #[serde(default)]
    pub signals: Vec<SignalConfig>,

    /// Process instances
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
}

impl SimConfig {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.kernel.time_limit == Some(0) {
            tracing::warn!("time_limit of 0 only runs the first instant");
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.kernel.log_level) {
            return Err(ConfigError::Validation(format!(
                "Invalid log_level {:?}: {e}",
                self.kernel.log_level
            )));
        }

        let mut signal_names = HashSet::new();
        for sig in &self.signals {
            if sig.name.is_empty() {
                return Err(ConfigError::Validation("Signal with empty name".to_string()));
            }
            if !signal_names.insert(sig.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate signal name: {}",
                    sig.name
                )));
            }
        }

        let mut process_names = HashSet::new();
        for proc in &self.processes {
            if !process_names.insert(proc.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate process name: {}",
                    proc.name
                )));
            }
            for trigger in &proc.sensitivity {
                if !signal_names.contains(trigger.signal.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Process {} is sensitive to undeclared signal: {}",
                        proc.name, trigger.signal
                    )));
                }
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Finds a signal declaration by name.
    pub fn find_signal(&self, name: &str) -> Option<&SignalConfig> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Finds a process entry by name.
    pub fn find_process(&self, name: &str) -> Option<&ProcessConfig> {
        self.processes.iter().find(|p| p.name == name)
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fault policy.
    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.config.kernel.fault_policy = policy;
        self
    }

    /// Sets the time limit.
    pub fn time_limit(mut self, limit: SimTime) -> Self {
        self.config.kernel.time_limit = Some(limit);
        self
    }

    /// Enables the value-change log.
    pub fn record_changes(mut self, enable: bool) -> Self {
        self.config.kernel.record_changes = enable;
        self
    }

    /// Commits writes left pending when the event queue drains.
    pub fn settle_on_drain(mut self, enable: bool) -> Self {
        self.config.kernel.settle_on_drain = enable;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.kernel.log_level = level.into();
        self
    }

    /// Declares a signal.
    pub fn signal(mut self, name: impl Into<String>, initial: Value) -> Self {
        self.config.signals.push(SignalConfig {
            name: name.into(),
            initial,
        });
        self
    }

    /// Adds a process entry.
    pub fn process(mut self, process: ProcessConfig) -> Self {
        self.config.processes.push(process);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
