//! Reference models built on the process API.
//!
//! These are ordinary user-level processes. The kernel knows nothing about
//! them; they exist to drive benches, tests and the configuration registry.
//!
//! - [`ClockGen`] - toggles a signal every half period
//! - [`Counter`] - synchronous up-counter with reset and enable
//! - [`Driver`] - scripted testbench stimulus
//! - [`Monitor`] - samples a signal whenever a trigger fires

pub mod clock;
pub mod counter;
pub mod driver;
pub mod monitor;

pub use clock::ClockGen;
pub use counter::Counter;
pub use driver::{Driver, ScriptError, Step};
pub use monitor::{Monitor, MonitorHandle, Sample};
