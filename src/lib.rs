//! # Tickwire
//!
//! A discrete-event simulation kernel for clocked digital logic.
//!
//! A simulation is a set of named integer **signals** and a set of
//! **processes**. Processes run one at a time, read signals freely and
//! schedule writes that stay invisible until the scheduler commits them at
//! the end of the current delta cycle. A process suspends by asking for a
//! delay, for an edge on one of several signals, or for its static
//! sensitivity to fire.
//!
//! ## Design Principles
//!
//! - **Deterministic**: one thread, one process at a time, and a fixed
//!   wake-up order inside each delta cycle.
//! - **Delta cycles**: every write made in an instant commits together, so
//!   processes woken by an edge see a consistent snapshot.
//! - **Arenas and ids**: signals, hooks and processes live in kernel-owned
//!   tables and are referred to by copyable ids.
//!
//! ## Quick Start
//!
//! ```rust
//! use tickwire::models::{ClockGen, Counter, Driver};
//! use tickwire::{RunOutcome, Simulator};
//!
//! let mut sim = Simulator::new();
//! let clk = sim.signal("clk", 0);
//! let reset = sim.signal("reset", 0);
//! let enable = sim.signal("enable", 0);
//! let count = sim.signal("count", 0);
//!
//! sim.process("clock", ClockGen::new(clk, 1));
//! sim.process("counter", Counter::new(clk, reset, enable, count));
//! sim.process(
//!     "master",
//!     Driver::new().delay(10).set(enable, 1).delay(10).finish(),
//! );
//!
//! assert_eq!(sim.run().unwrap(), RunOutcome::Finished);
//! assert_eq!(sim.time(), 20);
//! assert_eq!(sim.get(count), 5);
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use tickwire::{create_default_registry, SimConfig, Simulator};
//!
//! let config = SimConfig::from_yaml_file("bench.yaml")?;
//! let mut sim = Simulator::from_config(&config, &create_default_registry())?;
//! sim.run()?;
//! ```

pub mod types;
pub mod error;
pub mod signal;
pub mod hook;
pub mod queue;
pub mod process;
pub mod kernel;
pub mod config;
pub mod waveform;
pub mod registry;
pub mod stats;
pub mod models;

// Re-export commonly used types
pub use types::{ProcessId, SignalId, SimTime, Value};
pub use error::{SimError, SimResult};
pub use hook::Edge;
pub use process::{Context, Process, ProcessState, Suspend, Trigger};
pub use kernel::{KernelStats, ProcessFault, RunOutcome, Simulator};
pub use config::{
    ConfigError, FaultPolicy, KernelConfig, ProcessConfig, SimConfig, SimConfigBuilder,
};
pub use waveform::{ChangeLog, ValueChange};
pub use registry::{create_default_registry, ModelRegistry};
pub use stats::{SimulationStats, StatsCollector, Timer};

/// Initialize logging with the level configured in `config`.
///
/// # Example
///
/// ```rust,ignore
/// let config = tickwire::KernelConfig::default();
/// tickwire::init_logging_from(&config);
/// let mut sim = tickwire::Simulator::with_config(config);
/// ```
pub fn init_logging_from(config: &KernelConfig) {
    init_logging(&config.log_level);
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// tickwire::init_logging("tickwire=debug");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
