//! Synchronous up-counter.

use crate::process::{Context, Process, Suspend, Trigger};
use crate::types::{SignalId, Value};

/// Up-counter with synchronous active-high reset and active-high enable.
///
/// Statically sensitive to the rising edge of its clock. On every edge it
/// loads 0 while `reset` is high, otherwise increments `count` (wrapping at
/// its width) while `enable` is high.
#[derive(Debug, Clone)]
pub struct Counter {
    clock: SignalId,
    reset: SignalId,
    enable: SignalId,
    count: SignalId,
    mask: Value,
    started: bool,
}

impl Counter {
    /// Creates a full-width counter.
    pub fn new(clock: SignalId, reset: SignalId, enable: SignalId, count: SignalId) -> Self {
        Self {
            clock,
            reset,
            enable,
            count,
            mask: Value::MAX,
            started: false,
        }
    }

    /// Limits the counter to `bits` bits.
    pub fn with_width(mut self, bits: u32) -> Self {
        self.mask = if bits >= Value::BITS {
            Value::MAX
        } else {
            (1 << bits) - 1
        };
        self
    }
}

impl Process for Counter {
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend {
        if !self.started {
            self.started = true;
            return Suspend::Wait;
        }

        if ctx.get(self.reset) != 0 {
            ctx.set(self.count, 0);
        } else if ctx.get(self.enable) != 0 {
            let next = ctx.get(self.count).wrapping_add(1) & self.mask;
            tracing::trace!(time = ctx.time(), value = next, "counter increment");
            ctx.set(self.count, next);
        }
        Suspend::Wait
    }

    fn sensitivity(&self) -> Vec<Trigger> {
        vec![Trigger::posedge(self.clock)]
    }
}
