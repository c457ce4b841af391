//! Processes: cooperatively scheduled units of work.
//!
//! A process is a state machine. The scheduler calls [`Process::resume`]
//! whenever the process becomes runnable; the body does its work through the
//! [`Context`] and returns a [`Suspend`] saying what it waits for next. All
//! state that must survive a suspension lives in the process value itself.
//!
//! ```
//! use tickwire::{Context, Simulator, Suspend};
//!
//! let mut sim = Simulator::new();
//! let clk = sim.signal("clk", 0);
//!
//! let mut level = 1;
//! sim.process("clock", move |ctx: &mut Context<'_>| {
//!     if ctx.time() >= 10 {
//!         return Suspend::Done;
//!     }
//!     ctx.set(clk, level);
//!     level ^= 1;
//!     Suspend::Delay(1)
//! });
//!
//! sim.run().unwrap();
//! assert_eq!(sim.time(), 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::hook::{Edge, HookId};
use crate::signal::SignalTable;
use crate::types::{ProcessId, SignalId, SimTime, Value};

/// A signal plus the edge that should wake a waiting process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    pub signal: SignalId,
    pub edge: Edge,
}

impl Trigger {
    pub fn new(signal: SignalId, edge: Edge) -> Self {
        Self { signal, edge }
    }

    pub fn posedge(signal: SignalId) -> Self {
        Self::new(signal, Edge::Rising)
    }

    pub fn negedge(signal: SignalId) -> Self {
        Self::new(signal, Edge::Falling)
    }
}

/// What a process waits for after returning from [`Process::resume`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Suspend {
    /// Resume after the given number of ticks. `Delay(0)` yields to every
    /// other process ready at the current instant.
    Delay(SimTime),
    /// Park until one of the process's static triggers fires.
    Wait,
    /// Resume on the first committed edge matching any of the triggers.
    /// The triggers are dropped as soon as the wait ends.
    Edge(Vec<Trigger>),
    /// Terminate the process.
    Done,
}

impl Suspend {
    pub fn delay(ticks: SimTime) -> Self {
        Suspend::Delay(ticks)
    }

    pub fn on(signal: SignalId, edge: Edge) -> Self {
        Suspend::Edge(vec![Trigger::new(signal, edge)])
    }

    pub fn posedge(signal: SignalId) -> Self {
        Self::on(signal, Edge::Rising)
    }

    pub fn negedge(signal: SignalId) -> Self {
        Self::on(signal, Edge::Falling)
    }

    /// Waits for the first of several triggers.
    pub fn any_of(triggers: impl IntoIterator<Item = Trigger>) -> Self {
        Suspend::Edge(triggers.into_iter().collect())
    }
}

/// The behavior of a simulated process.
///
/// Closures of the form `FnMut(&mut Context<'_>) -> Suspend` implement this
/// trait directly.
pub trait Process: Send {
    /// Runs the process until its next suspension point.
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend;

    /// Triggers the process stays sensitive to for its whole life.
    ///
    /// Queried once when the process is registered.
    fn sensitivity(&self) -> Vec<Trigger> {
        Vec::new()
    }
}

impl<F> Process for F
where
    F: FnMut(&mut Context<'_>) -> Suspend + Send,
{
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend {
        self(ctx)
    }
}

/// Lifecycle state of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Registered, not yet run.
    NotStarted,
    /// Queued to run at the current instant.
    Ready,
    /// Queued to run after a delay.
    Delayed,
    /// Parked until a hook matches.
    Waiting,
    /// Finished or faulted; never resumes again.
    Terminated,
}

/// The view of the simulator handed to a running process.
pub struct Context<'a> {
    pid: ProcessId,
    name: &'a str,
    time: SimTime,
    signals: &'a mut SignalTable,
    finish: &'a mut bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        pid: ProcessId,
        name: &'a str,
        time: SimTime,
        signals: &'a mut SignalTable,
        finish: &'a mut bool,
    ) -> Self {
        Self {
            pid,
            name,
            time,
            signals,
            finish,
        }
    }

    /// Id of the running process.
    pub fn id(&self) -> ProcessId {
        self.pid
    }

    /// Name of the running process.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Current simulated time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Current committed value of a signal.
    pub fn get(&self, signal: SignalId) -> Value {
        self.signals.get(signal)
    }

    /// Stages a new value; it becomes visible after the next delta cycle.
    pub fn set(&mut self, signal: SignalId, value: Value) {
        if self.signals.set(signal, value) {
            tracing::trace!(
                time = self.time,
                process = self.name,
                signal = self.signals.name(signal),
                value,
                "signal activated"
            );
        }
    }

    /// Finds a signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals.find(name)
    }

    /// Finds a signal by name, failing if it is not declared.
    pub fn lookup(&self, name: &str) -> SimResult<SignalId> {
        self.find_signal(name)
            .ok_or_else(|| SimError::UnknownSignal(name.to_string()))
    }

    /// Name of a signal.
    pub fn signal_name(&self, signal: SignalId) -> &str {
        self.signals.name(signal)
    }

    /// Ends the simulation once this process suspends.
    ///
    /// Nothing else resumes afterwards, even processes already queued for
    /// the current instant.
    pub fn finish(&mut self) {
        *self.finish = true;
    }
}

/// Per-process bookkeeping owned by the simulator.
pub(crate) struct ProcessSlot {
    pub name: String,
    pub body: Option<Box<dyn Process>>,
    pub state: ProcessState,
    /// Hooks created by the current `Suspend::Edge` wait.
    pub wait_hooks: Vec<HookId>,
    /// Hooks living as long as the process.
    pub static_hooks: Vec<HookId>,
}

impl ProcessSlot {
    pub fn new(name: String, body: Box<dyn Process>) -> Self {
        Self {
            name,
            body: Some(body),
            state: ProcessState::NotStarted,
            wait_hooks: Vec::new(),
            static_hooks: Vec::new(),
        }
    }
}
