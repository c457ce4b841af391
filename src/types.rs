//! Core type definitions for the simulation kernel.
//!
//! Signals and processes live in arenas owned by the [`Simulator`]; the ids
//! defined here are the typed indices into those arenas.
//!
//! [`Simulator`]: crate::kernel::Simulator

use serde::{Deserialize, Serialize};

/// Simulation time in ticks.
///
/// Time only moves forward, and only when the scheduler resumes a process
/// whose delay has elapsed.
pub type SimTime = u64;

/// The value carried by a signal.
///
/// Edges are defined by crossing the zero/nonzero boundary, so single-bit
/// signals use 0 and 1 while buses may carry any value.
pub type Value = u64;

/// Handle to a signal declared on a simulator.
///
/// Only the simulator that declared the signal can resolve it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalId(u32);

impl SignalId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the arena index of this signal.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sig#{}", self.0)
    }
}

/// Handle to a process registered on a simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the arena index of this process.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proc#{}", self.0)
    }
}
