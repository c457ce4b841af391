//! Model factory registry for configuration-built benches.
//!
//! A model is registered by name together with a factory that turns a
//! [`ProcessConfig`] into a process body. Factories see the simulator so
//! they can resolve the signal names given in their attributes.
//!
//! # Example
//!
//! ```
//! use tickwire::config::ProcessConfig;
//! use tickwire::registry::ModelRegistry;
//! use tickwire::{Context, Simulator, Suspend};
//!
//! let mut registry = ModelRegistry::new();
//! registry.register("idle", |_cfg, _sim| {
//!     Ok(Box::new(|_: &mut Context<'_>| Suspend::Done))
//! });
//!
//! let sim = Simulator::new();
//! let body = registry.create(&ProcessConfig::new("p", "idle"), &sim);
//! assert!(body.is_ok());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, ProcessConfig};
use crate::error::{SimError, SimResult};
use crate::kernel::Simulator;
use crate::process::Process;
use crate::types::SignalId;

/// Type alias for model factory functions.
pub type ModelFactory =
    Arc<dyn Fn(&ProcessConfig, &Simulator) -> SimResult<Box<dyn Process>> + Send + Sync>;

/// A registry of model factories.
#[derive(Default)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model factory, replacing any factory of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProcessConfig, &Simulator) -> SimResult<Box<dyn Process>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Instantiates the model a process entry names.
    pub fn create(&self, process: &ProcessConfig, sim: &Simulator) -> SimResult<Box<dyn Process>> {
        let factory = self
            .factories
            .get(&process.model)
            .ok_or_else(|| SimError::UnknownModel(process.model.clone()))?;
        tracing::debug!(process = %process.name, model = %process.model, "instantiating model");
        factory(process, sim)
    }

    /// Returns true if a model is registered.
    pub fn contains(&self, model: &str) -> bool {
        self.factories.contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered model names.
    pub fn model_names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a model.
    pub fn unregister(&mut self, model: &str) -> bool {
        self.factories.remove(model).is_some()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolves a signal named by a required attribute.
pub fn signal_attr(process: &ProcessConfig, sim: &Simulator, key: &str) -> SimResult<SignalId> {
    let name = process.attr(key)?;
    sim.find_signal(name).ok_or_else(|| {
        SimError::Config(ConfigError::InvalidAttr {
            process: process.name.clone(),
            attr: key.to_string(),
            reason: format!("no signal named '{name}'"),
        })
    })
}

/// Creates a registry with the built-in models.
///
/// - `clock`: [`ClockGen`](crate::models::ClockGen). Attributes `signal`,
///   `half_period` (default 1), `start` (0 or 1, default 1) and `toggles`.
/// - `counter`: [`Counter`](crate::models::Counter). Attributes `clock`,
///   `reset`, `enable`, `count` and `width` (default 64).
/// - `driver`: [`Driver`](crate::models::Driver). Attribute `script`.
pub fn create_default_registry() -> ModelRegistry {
    use crate::models::{ClockGen, Counter, Driver};

    let mut registry = ModelRegistry::new();

    registry.register("clock", |cfg, sim| {
        let signal = signal_attr(cfg, sim, "signal")?;
        let half_period = cfg.parse_attr("half_period")?.unwrap_or(1);
        let mut clock = ClockGen::new(signal, half_period);
        if cfg.parse_attr::<u8>("start")? == Some(0) {
            clock = clock.starting_low();
        }
        if let Some(toggles) = cfg.parse_attr("toggles")? {
            clock = clock.with_max_toggles(toggles);
        }
        Ok(Box::new(clock))
    });

    registry.register("counter", |cfg, sim| {
        let counter = Counter::new(
            signal_attr(cfg, sim, "clock")?,
            signal_attr(cfg, sim, "reset")?,
            signal_attr(cfg, sim, "enable")?,
            signal_attr(cfg, sim, "count")?,
        );
        let width = cfg.parse_attr("width")?.unwrap_or(64);
        Ok(Box::new(counter.with_width(width)))
    });

    registry.register("driver", |cfg, sim| {
        let script = cfg.attr("script")?;
        let driver = Driver::parse(script, |name| sim.find_signal(name)).map_err(|e| {
            ConfigError::InvalidAttr {
                process: cfg.name.clone(),
                attr: "script".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Box::new(driver))
    });

    registry
}
