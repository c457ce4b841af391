//! Signal monitor.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::process::{Context, Process, Suspend, Trigger};
use crate::types::{SignalId, SimTime, Value};

/// A value observed by a [`Monitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub time: SimTime,
    pub value: Value,
}

/// Samples a signal every time a trigger fires.
///
/// The sample is taken when the monitor resumes, so it sees the value the
/// signal holds after the delta cycle that fired the trigger.
#[derive(Debug)]
pub struct Monitor {
    signal: SignalId,
    trigger: Trigger,
    samples: Arc<Mutex<Vec<Sample>>>,
    started: bool,
}

/// Read side of a [`Monitor`], usable after the monitor moved into the
/// simulator.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl Monitor {
    pub fn new(signal: SignalId, trigger: Trigger) -> (Self, MonitorHandle) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let monitor = Self {
            signal,
            trigger,
            samples: Arc::clone(&samples),
            started: false,
        };
        (monitor, MonitorHandle { samples })
    }
}

impl Process for Monitor {
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend {
        if self.started {
            self.samples.lock().push(Sample {
                time: ctx.time(),
                value: ctx.get(self.signal),
            });
        }
        self.started = true;
        Suspend::Wait
    }

    fn sensitivity(&self) -> Vec<Trigger> {
        vec![self.trigger]
    }
}

impl MonitorHandle {
    /// Copies out every sample taken so far.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn last(&self) -> Option<Sample> {
        self.samples.lock().last().copied()
    }
}
