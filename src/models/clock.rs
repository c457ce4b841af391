//! Clock generator.

use crate::process::{Context, Process, Suspend};
use crate::types::{SignalId, SimTime, Value};

/// Drives a signal alternately high and low, one half period each.
///
/// The first level is driven at the instant the process starts.
#[derive(Debug, Clone)]
pub struct ClockGen {
    signal: SignalId,
    half_period: SimTime,
    level: Value,
    max_toggles: Option<u64>,
    toggles: u64,
}

impl ClockGen {
    /// Creates a clock that starts high.
    pub fn new(signal: SignalId, half_period: SimTime) -> Self {
        Self {
            signal,
            half_period,
            level: 1,
            max_toggles: None,
            toggles: 0,
        }
    }

    /// Starts low instead of high.
    pub fn starting_low(mut self) -> Self {
        self.level = 0;
        self
    }

    /// Stops after driving `toggles` levels.
    pub fn with_max_toggles(mut self, toggles: u64) -> Self {
        self.max_toggles = Some(toggles);
        self
    }

    /// Number of levels driven so far.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

impl Process for ClockGen {
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend {
        if self.max_toggles.is_some_and(|max| self.toggles >= max) {
            return Suspend::Done;
        }
        ctx.set(self.signal, self.level);
        self.level = if self.level == 0 { 1 } else { 0 };
        self.toggles += 1;
        Suspend::Delay(self.half_period)
    }
}
