//! The simulator: process table, clock and main loop.
//!
//! One outer-loop iteration either resumes the process at the head of the
//! event queue or, when nothing more is ready at the current instant,
//! settles a delta cycle first:
//!
//! 1. If the head of the queue is delayed, drain the active-signal list.
//!    For each signal, walk its hooks, skip processes that are already
//!    queued, and push every process whose edge filter matches the pending
//!    transition to the front of the queue. Then commit the signal.
//! 2. Pop the head, advance the clock by its delay and resume it.
//! 3. Stop once the queue is empty or `finish` was called. Writes staged
//!    by the last process to run stay pending, and nothing waiting on them
//!    wakes, unless [`KernelConfig::settle_on_drain`] is set.
//!
//! Matching always compares a signal's committed value with its pending
//! one, and no process runs while a delta cycle settles, so every process
//! woken off one instant observes the same committed values.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::config::{FaultPolicy, KernelConfig, SimConfig};
use crate::error::{SimError, SimResult};
use crate::hook::{Edge, HookArena};
use crate::process::{Context, Process, ProcessSlot, ProcessState, Suspend, Trigger};
use crate::queue::EventQueue;
use crate::registry::ModelRegistry;
use crate::signal::SignalTable;
use crate::types::{ProcessId, SignalId, SimTime, Value};
use crate::waveform::{ChangeLog, ValueChange};

/// Counters collected by the simulator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KernelStats {
    /// Processes started by the first run
    pub processes_started: u64,
    /// Total process resumptions
    pub resumptions: u64,
    /// Delta cycles settled
    pub delta_cycles: u64,
    /// Writes that put a signal on the active list
    pub signal_activations: u64,
    /// Commits that changed a value
    pub signal_commits: u64,
    /// Hooks that woke their process
    pub hook_matches: u64,
    /// Processes that returned `Suspend::Done` or faulted
    pub processes_terminated: u64,
    /// Processes that panicked
    pub faults: u64,
    /// Simulated time at the last resumption
    pub final_time: SimTime,
}

/// A process body that panicked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessFault {
    pub process: String,
    pub time: SimTime,
    pub message: String,
}

/// Why a run returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// A process or the caller called `finish`.
    Finished,
    /// The event queue is empty.
    Exhausted,
    /// The next wakeup lies beyond the time limit; call `run` again to go on.
    TimeLimit,
}

/// The discrete-event simulator.
///
/// # Example
///
/// ```
/// use tickwire::{Context, Simulator, Suspend};
///
/// let mut sim = Simulator::new();
/// let req = sim.signal("req", 0);
/// let ack = sim.signal("ack", 0);
///
/// sim.process("requester", move |ctx: &mut Context<'_>| {
///     if ctx.get(ack) != 0 {
///         ctx.finish();
///         return Suspend::Done;
///     }
///     ctx.set(req, 1);
///     Suspend::Delay(1)
/// });
///
/// let mut seen = false;
/// sim.process("responder", move |ctx: &mut Context<'_>| {
///     if seen {
///         ctx.set(ack, 1);
///         return Suspend::Done;
///     }
///     seen = true;
///     Suspend::posedge(req)
/// });
///
/// sim.run().unwrap();
/// assert!(sim.is_finished());
/// assert_eq!(sim.get(ack), 1);
/// assert_eq!(sim.time(), 1);
/// ```
pub struct Simulator {
    config: KernelConfig,
    time: SimTime,
    signals: SignalTable,
    hooks: HookArena,
    processes: Vec<ProcessSlot>,
    queue: EventQueue,
    started: bool,
    finished: bool,
    stats: KernelStats,
    changes: ChangeLog,
    faults: Vec<ProcessFault>,
}

impl Simulator {
    /// Creates an empty simulator with the clock at tick 0.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Creates an empty simulator with the given options.
    pub fn with_config(config: KernelConfig) -> Self {
        let changes = ChangeLog::new(config.record_changes);
        Self {
            config,
            time: 0,
            signals: SignalTable::new(),
            hooks: HookArena::new(),
            processes: Vec::new(),
            queue: EventQueue::new(),
            started: false,
            finished: false,
            stats: KernelStats::default(),
            changes,
            faults: Vec::new(),
        }
    }

    /// Builds a bench from a configuration, instantiating processes through
    /// the registry.
    pub fn from_config(config: &SimConfig, registry: &ModelRegistry) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Self::with_config(config.kernel.clone());

        for sig in &config.signals {
            sim.try_signal(&sig.name, sig.initial)?;
        }

        for proc in &config.processes {
            let body = registry.create(proc, &sim)?;
            let triggers = proc
                .sensitivity
                .iter()
                .map(|t| Ok(Trigger::new(sim.lookup(&t.signal)?, t.edge)))
                .collect::<SimResult<Vec<_>>>()?;
            sim.add_process(proc.name.clone(), body, &triggers);
        }

        tracing::debug!(
            signals = sim.signals.len(),
            processes = sim.processes.len(),
            "bench built from configuration"
        );
        Ok(sim)
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Declares a signal, or returns the existing one with that name.
    pub fn signal(&mut self, name: &str, initial: Value) -> SignalId {
        if let Some(id) = self.signals.find(name) {
            if self.signals.get(id) != initial {
                tracing::warn!(signal = name, "signal redeclared, initial value ignored");
            }
            return id;
        }
        self.try_signal(name, initial)
            .unwrap_or_else(|_| unreachable!("name checked above"))
    }

    /// Declares a signal, failing if the name is taken.
    pub fn try_signal(&mut self, name: &str, initial: Value) -> SimResult<SignalId> {
        self.signals
            .declare(name, initial)
            .ok_or_else(|| SimError::DuplicateSignal(name.to_string()))
    }

    /// Registers a process.
    pub fn process<P>(&mut self, name: impl Into<String>, body: P) -> ProcessId
    where
        P: Process + 'static,
    {
        self.add_process(name.into(), Box::new(body), &[])
    }

    /// Registers a process that stays sensitive to `triggers` for its whole
    /// life, in addition to whatever [`Process::sensitivity`] declares.
    ///
    /// Such a process parks with [`Suspend::Wait`].
    pub fn process_with_sensitivity<P>(
        &mut self,
        name: impl Into<String>,
        body: P,
        triggers: &[Trigger],
    ) -> ProcessId
    where
        P: Process + 'static,
    {
        self.add_process(name.into(), Box::new(body), triggers)
    }

    /// Registers an already boxed process.
    pub fn add_process(
        &mut self,
        name: String,
        body: Box<dyn Process>,
        triggers: &[Trigger],
    ) -> ProcessId {
        let pid = self.queue.add_process();
        let mut slot = ProcessSlot::new(name, body);

        let declared = slot.body.as_ref().map(|b| b.sensitivity()).unwrap_or_default();
        for trigger in declared.iter().chain(triggers) {
            let hook = self
                .hooks
                .attach(&mut self.signals, pid, trigger.signal, trigger.edge);
            slot.static_hooks.push(hook);
        }

        tracing::debug!(process = %slot.name, %pid, triggers = slot.static_hooks.len(), "process registered");
        self.processes.push(slot);

        // Late registrations start at the current instant.
        if self.started && !self.finished {
            self.start_process(pid);
        }
        pid
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current simulated time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Current committed value of a signal.
    pub fn get(&self, signal: SignalId) -> Value {
        self.signals.get(signal)
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

    pub fn signal_name(&self, signal: SignalId) -> &str {
        self.signals.name(signal)
    }

    /// All declared signals.
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    pub fn process_name(&self, pid: ProcessId) -> &str {
        &self.processes[pid.index()].name
    }

    pub fn process_state(&self, pid: ProcessId) -> ProcessState {
        self.processes[pid.index()].state
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Number of hooks currently registered across all signals.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Number of processes waiting in the event queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn stats(&self) -> &KernelStats {
        &self.stats
    }

    /// Faults recorded under [`FaultPolicy::Isolate`].
    pub fn faults(&self) -> &[ProcessFault] {
        &self.faults
    }

    /// The value-change log (empty unless `record_changes` is set).
    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    /// Value of a signal after `time` settled, from the change log.
    ///
    /// Returns `None` when the log is disabled.
    pub fn value_at(&self, signal: SignalId, time: SimTime) -> Option<Value> {
        if !self.changes.is_enabled() {
            return None;
        }
        Some(
            self.changes
                .value_at(signal, time)
                .unwrap_or_else(|| self.signals.get(signal)),
        )
    }

    /// Renders the change log as CSV.
    pub fn changes_csv(&self) -> String {
        self.changes.to_csv(|id| self.signals.name(id))
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Stages a signal value from outside any process.
    pub fn set(&mut self, signal: SignalId, value: Value) {
        if self.signals.set(signal, value) {
            self.stats.signal_activations += 1;
        }
    }

    /// Ends the simulation: empties the event queue so the loop stops.
    ///
    /// Parked processes keep their state; calling this again is a no-op.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.queue.clear();
        tracing::debug!(time = self.time, "simulation finished");
    }

    /// Runs until nothing is runnable, `finish` is called, or the configured
    /// time limit is reached.
    pub fn run(&mut self) -> SimResult<RunOutcome> {
        self.run_bounded(self.config.time_limit)
    }

    /// Runs without letting the clock pass `limit`.
    ///
    /// Every delta cycle of the last instant at or before `limit` settles
    /// before this returns. A `limit` already behind the clock finishes the
    /// current instant and stops there.
    pub fn run_until(&mut self, limit: SimTime) -> SimResult<RunOutcome> {
        self.run_bounded(Some(limit))
    }

    /// Settles pending signals if nothing is ready, then resumes one process.
    ///
    /// Returns `false` when there was nothing left to resume.
    pub fn step(&mut self) -> SimResult<bool> {
        self.start();
        if self.finished {
            return Ok(false);
        }
        self.settle_if_idle();
        self.resume_next()
    }

    fn run_bounded(&mut self, limit: Option<SimTime>) -> SimResult<RunOutcome> {
        self.start();
        let limit = limit.map(|l| l.max(self.time));
        let outcome = loop {
            if self.finished {
                break RunOutcome::Finished;
            }
            self.settle_if_idle();
            match self.queue.head_delay() {
                None => break RunOutcome::Exhausted,
                Some(delay) if limit.is_some_and(|l| self.time.saturating_add(delay) > l) => {
                    break RunOutcome::TimeLimit;
                }
                Some(_) => {}
            }
            self.resume_next()?;
        };

        tracing::info!(
            time = self.time,
            ?outcome,
            resumptions = self.stats.resumptions,
            delta_cycles = self.stats.delta_cycles,
            "run returned"
        );
        Ok(outcome)
    }

    /// Queues every registered process, last registered first.
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if self.finished {
            return;
        }
        for index in 0..self.processes.len() {
            self.start_process(ProcessId::from_index(index));
        }
    }

    fn start_process(&mut self, pid: ProcessId) {
        self.queue.push_front(pid);
        self.processes[pid.index()].state = ProcessState::Ready;
        self.stats.processes_started += 1;
    }

    // ------------------------------------------------------------------
    // Delta cycles
    // ------------------------------------------------------------------

    /// Settles once nothing more is ready at the current instant.
    fn settle_if_idle(&mut self) {
        let idle = match self.queue.head_delay() {
            Some(delay) => delay > 0,
            None => self.config.settle_on_drain,
        };
        if idle {
            self.settle();
        }
    }

    /// Settles one delta cycle: drains the active list, waking matching
    /// processes before committing each signal.
    fn settle(&mut self) {
        if !self.signals.has_active() {
            return;
        }
        self.stats.delta_cycles += 1;
        tracing::trace!(
            time = self.time,
            active = self.signals.active_count(),
            "delta cycle"
        );

        while let Some(signal) = self.signals.pop_active() {
            let (from, to) = self.signals.transition(signal);

            let mut cursor = self.signals.hook_head(signal);
            while let Some(id) = cursor {
                let Some(hook) = self.hooks.get(id).copied() else {
                    break;
                };
                cursor = hook.next();

                if self.queue.is_queued(hook.process) || !hook.edge.matches(from, to) {
                    continue;
                }
                self.queue.push_front(hook.process);
                self.processes[hook.process.index()].state = ProcessState::Ready;
                self.stats.hook_matches += 1;
                tracing::trace!(
                    time = self.time,
                    signal = self.signals.name(signal),
                    edge = %hook.edge,
                    process = %self.processes[hook.process.index()].name,
                    "process activated"
                );
            }

            self.signals.commit(signal);
            if from != to {
                self.stats.signal_commits += 1;
                self.changes.record(ValueChange {
                    time: self.time,
                    signal,
                    from,
                    to,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Resumption
    // ------------------------------------------------------------------

    fn resume_next(&mut self) -> SimResult<bool> {
        let Some((pid, delay)) = self.queue.pop() else {
            return Ok(false);
        };
        self.time += delay;
        self.stats.final_time = self.time;

        // The wait that queued this process is over.
        self.release_wait_hooks(pid);

        let index = pid.index();
        let Some(mut body) = self.processes[index].body.take() else {
            return Ok(true);
        };

        let active_before = self.signals.active_count();
        let mut finish = false;
        let result = {
            let mut ctx = Context::new(
                pid,
                &self.processes[index].name,
                self.time,
                &mut self.signals,
                &mut finish,
            );
            panic::catch_unwind(AssertUnwindSafe(|| body.resume(&mut ctx)))
        };
        self.stats.resumptions += 1;
        self.stats.signal_activations +=
            self.signals.active_count().saturating_sub(active_before) as u64;

        if finish {
            self.finish();
        }

        match result {
            Ok(suspend) => {
                self.processes[index].body = Some(body);
                self.suspend(pid, suspend);
                Ok(true)
            }
            Err(payload) => {
                drop(body);
                self.fault(pid, panic_message(payload.as_ref()))?;
                Ok(true)
            }
        }
    }

    fn suspend(&mut self, pid: ProcessId, suspend: Suspend) {
        let state = match suspend {
            Suspend::Delay(ticks) => {
                if self.time.checked_add(ticks).is_none() {
                    // The deadline lies past the end of time and never arrives.
                    tracing::warn!(
                        process = %self.processes[pid.index()].name,
                        time = self.time,
                        ticks,
                        "delay overflows the clock, parking process"
                    );
                } else if !self.finished {
                    self.queue.insert_delayed(pid, ticks);
                }
                if ticks == 0 {
                    ProcessState::Ready
                } else {
                    ProcessState::Delayed
                }
            }
            Suspend::Wait => ProcessState::Waiting,
            Suspend::Edge(triggers) => {
                for trigger in triggers {
                    self.wait_on(pid, trigger.signal, trigger.edge);
                }
                ProcessState::Waiting
            }
            Suspend::Done => {
                self.terminate(pid);
                return;
            }
        };
        self.processes[pid.index()].state = state;
    }

    fn wait_on(&mut self, pid: ProcessId, signal: SignalId, edge: Edge) {
        let hook = self.hooks.attach(&mut self.signals, pid, signal, edge);
        self.processes[pid.index()].wait_hooks.push(hook);
    }

    fn release_wait_hooks(&mut self, pid: ProcessId) {
        let hooks = std::mem::take(&mut self.processes[pid.index()].wait_hooks);
        for hook in hooks {
            self.hooks.detach(&mut self.signals, hook);
        }
    }

    fn terminate(&mut self, pid: ProcessId) {
        self.release_wait_hooks(pid);
        let slot = &mut self.processes[pid.index()];
        let hooks = std::mem::take(&mut slot.static_hooks);
        slot.body = None;
        slot.state = ProcessState::Terminated;
        for hook in hooks {
            self.hooks.detach(&mut self.signals, hook);
        }
        self.stats.processes_terminated += 1;
        tracing::debug!(time = self.time, process = %self.processes[pid.index()].name, "process terminated");
    }

    fn fault(&mut self, pid: ProcessId, message: String) -> SimResult<()> {
        self.terminate(pid);
        self.stats.faults += 1;
        let fault = ProcessFault {
            process: self.processes[pid.index()].name.clone(),
            time: self.time,
            message,
        };

        match self.config.fault_policy {
            FaultPolicy::Isolate => {
                tracing::warn!(
                    time = fault.time,
                    process = %fault.process,
                    message = %fault.message,
                    "process faulted, continuing without it"
                );
                self.faults.push(fault);
                Ok(())
            }
            FaultPolicy::Abort => Err(SimError::ProcessFault {
                process: fault.process,
                time: fault.time,
                message: fault.message,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Exports kernel counters, signal values and process states as JSON.
    pub fn export_stats(&self) -> serde_json::Value {
        let mut signals = serde_json::Map::new();
        for (_, sig) in self.signals.iter() {
            signals.insert(sig.name().to_string(), sig.get().into());
        }

        let mut processes = serde_json::Map::new();
        for slot in &self.processes {
            processes.insert(
                slot.name.clone(),
                serde_json::to_value(slot.state).unwrap_or(serde_json::Value::Null),
            );
        }

        serde_json::json!({
            "kernel": {
                "current_time": self.time,
                "finished": self.finished,
                "processes_started": self.stats.processes_started,
                "resumptions": self.stats.resumptions,
                "delta_cycles": self.stats.delta_cycles,
                "signal_activations": self.stats.signal_activations,
                "signal_commits": self.stats.signal_commits,
                "hook_matches": self.stats.hook_matches,
                "processes_terminated": self.stats.processes_terminated,
                "faults": self.stats.faults,
                "process_count": self.processes.len(),
                "signal_count": self.signals.len(),
            },
            "signals": signals,
            "processes": processes,
        })
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("time", &self.time)
            .field("signals", &self.signals.len())
            .field("processes", &self.processes.len())
            .field("queued", &self.queue.len())
            .field("finished", &self.finished)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_fn<F>(f: F) -> F
    where
        F: FnMut(&mut Context<'_>) -> Suspend + Send,
    {
        f
    }

    #[test]
    fn test_new_simulator() {
        let sim = Simulator::new();
        assert_eq!(sim.time(), 0);
        assert_eq!(sim.process_count(), 0);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_empty_run_is_exhausted() {
        let mut sim = Simulator::new();
        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.time(), 0);
    }

    #[test]
    fn test_signal_redeclare_returns_same_id() {
        let mut sim = Simulator::new();
        let a = sim.signal("a", 0);
        assert_eq!(sim.signal("a", 0), a);
        assert!(matches!(sim.try_signal("a", 0), Err(SimError::DuplicateSignal(_))));
        assert!(sim.lookup("b").is_err());
    }

    #[test]
    fn test_delay_advances_clock() {
        let mut sim = Simulator::new();
        let mut n = 0;
        sim.process(
            "p",
            ctx_fn(move |_| {
                n += 1;
                if n > 3 {
                    Suspend::Done
                } else {
                    Suspend::Delay(5)
                }
            }),
        );

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.time(), 15);
        assert_eq!(sim.stats().resumptions, 4);
        assert_eq!(sim.process_state(ProcessId::from_index(0)), ProcessState::Terminated);
    }

    #[test]
    fn test_start_order_is_reverse_registration() {
        let mut sim = Simulator::new();
        let order = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = order.clone();
            sim.process(
                name,
                ctx_fn(move |ctx| {
                    order.lock().push(ctx.name().to_string());
                    Suspend::Done
                }),
            );
        }
        sim.run().unwrap();
        assert_eq!(*order.lock(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_edge_wait_wakes_on_commit() {
        let mut sim = Simulator::new();
        let sig = sim.signal("sig", 0);
        let mut step = 0;
        let waiter = sim.process(
            "waiter",
            ctx_fn(move |_| {
                step += 1;
                match step {
                    1 => Suspend::posedge(sig),
                    _ => Suspend::Done,
                }
            }),
        );
        sim.process(
            "driver",
            ctx_fn(move |ctx| match ctx.time() {
                0 => Suspend::Delay(3),
                3 => {
                    ctx.set(sig, 1);
                    Suspend::Delay(1)
                }
                _ => Suspend::Done,
            }),
        );

        sim.run().unwrap();
        assert_eq!(sim.get(sig), 1);
        assert_eq!(sim.time(), 4);
        assert_eq!(sim.process_state(waiter), ProcessState::Terminated);
        assert_eq!(sim.hook_count(), 0);
        assert_eq!(sim.stats().hook_matches, 1);
    }

    fn last_writer(sim: &mut Simulator) -> SignalId {
        let sig = sim.signal("sig", 0);
        sim.process(
            "writer",
            ctx_fn(move |ctx| {
                ctx.set(sig, 9);
                Suspend::Done
            }),
        );
        sig
    }

    #[test]
    fn test_pending_signal_stays_staged_when_queue_drains() {
        let mut sim = Simulator::new();
        let sig = last_writer(&mut sim);

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.get(sig), 0);
        assert_eq!(sim.stats().delta_cycles, 0);
        assert!(!sim.step().unwrap());
        assert_eq!(sim.get(sig), 0);
    }

    #[test]
    fn test_settle_on_drain_commits_last_writes() {
        let mut sim = Simulator::with_config(KernelConfig {
            settle_on_drain: true,
            ..Default::default()
        });
        let sig = last_writer(&mut sim);

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.get(sig), 9);
        assert_eq!(sim.stats().delta_cycles, 1);
    }

    #[test]
    fn test_overflowing_delay_parks_process() {
        let mut sim = Simulator::new();
        let half = SimTime::MAX / 2 + 1;
        let mut resumed = 0;
        let pid = sim.process(
            "sleeper",
            ctx_fn(move |_| {
                resumed += 1;
                assert!(resumed <= 2, "resumed past the end of time");
                Suspend::Delay(half)
            }),
        );

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.time(), half);
        assert_eq!(sim.stats().resumptions, 2);
        assert_eq!(sim.process_state(pid), ProcessState::Delayed);
        assert!(sim.faults().is_empty());
    }

    #[test]
    fn test_delay_to_end_of_time() {
        let mut sim = Simulator::new();
        let mut n = 0;
        sim.process(
            "p",
            ctx_fn(move |_| {
                n += 1;
                if n == 1 {
                    Suspend::Delay(SimTime::MAX)
                } else {
                    Suspend::Done
                }
            }),
        );

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.time(), SimTime::MAX);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut sim = Simulator::new();
        sim.process("p", ctx_fn(|_| Suspend::Delay(1)));
        sim.finish();
        sim.finish();
        assert_eq!(sim.run().unwrap(), RunOutcome::Finished);
        assert_eq!(sim.stats().resumptions, 0);
        assert_eq!(sim.queued(), 0);
    }

    #[test]
    fn test_export_stats() {
        let mut sim = Simulator::new();
        let sig = sim.signal("count", 0);
        sim.process(
            "p",
            ctx_fn(move |ctx| {
                if ctx.time() > 0 {
                    return Suspend::Done;
                }
                ctx.set(sig, 2);
                Suspend::Delay(1)
            }),
        );
        sim.run().unwrap();

        let stats = sim.export_stats();
        assert_eq!(stats["kernel"]["resumptions"], 2);
        assert_eq!(stats["kernel"]["signal_commits"], 1);
        assert_eq!(stats["signals"]["count"], 2);
        assert_eq!(stats["processes"]["p"], "terminated");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
