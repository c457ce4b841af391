//! Error types for the simulation kernel.
//!
//! The scheduling loop itself has no recoverable failure modes. Errors come
//! from name lookups, bench construction and, under [`FaultPolicy::Abort`],
//! from a process body that panicked.
//!
//! [`FaultPolicy::Abort`]: crate::config::FaultPolicy::Abort

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::SimTime;

/// Errors reported by the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("unknown signal: {0}")]
    UnknownSignal(String),

    #[error("signal already declared: {0}")]
    DuplicateSignal(String),

    #[error("unknown process model: {0}")]
    UnknownModel(String),

    #[error("process '{process}' faulted at tick {time}: {message}")]
    ProcessFault {
        process: String,
        time: SimTime,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::UnknownSignal("clk".to_string());
        assert_eq!(err.to_string(), "unknown signal: clk");

        let err = SimError::ProcessFault {
            process: "counter".to_string(),
            time: 12,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "process 'counter' faulted at tick 12: boom");
    }

    #[test]
    fn test_config_error_converts() {
        let err: SimError = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, SimError::Config(_)));
        assert!(err.to_string().contains("bad"));
    }
}
