//! Signals: named value cells with deferred commit.
//!
//! A write never changes what readers see. It stages a pending value and, if
//! that value differs from the current one, puts the signal on the active
//! list. The scheduler promotes pending values during delta-cycle settling,
//! so every process resumed off one instant observes the same committed
//! values.

use std::collections::HashMap;

use crate::hook::HookId;
use crate::types::{SignalId, Value};

/// A named value cell.
#[derive(Clone, Debug)]
pub struct Signal {
    name: String,
    value: Value,
    pending: Value,
    active: bool,
    /// Head of the intrusive hook list (most recently attached first).
    hooks: Option<HookId>,
}

impl Signal {
    fn new(name: impl Into<String>, initial: Value) -> Self {
        Self {
            name: name.into(),
            value: initial,
            pending: initial,
            active: false,
            hooks: None,
        }
    }

    /// Returns the signal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current committed value.
    pub fn get(&self) -> Value {
        self.value
    }

    /// Returns true while the signal waits on the active list for commit.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Arena of signals plus the active-signal list.
///
/// The active list is a stack: the signal activated last is settled first.
#[derive(Debug, Default)]
pub struct SignalTable {
    signals: Vec<Signal>,
    by_name: HashMap<String, SignalId>,
    active: Vec<SignalId>,
}

impl SignalTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new signal. Returns `None` if the name is taken.
    pub fn declare(&mut self, name: &str, initial: Value) -> Option<SignalId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = SignalId::from_index(self.signals.len());
        self.signals.push(Signal::new(name, initial));
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    /// Finds a signal by name.
    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.by_name.get(name).copied()
    }

    /// Returns the signal behind an id.
    ///
    /// # Panics
    /// If the id was issued by a different simulator.
    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id.index()]
    }

    /// Returns the current committed value.
    pub fn get(&self, id: SignalId) -> Value {
        self.signals[id.index()].value
    }

    /// Returns the signal name.
    pub fn name(&self, id: SignalId) -> &str {
        &self.signals[id.index()].name
    }

    /// Stages `value` for the next commit.
    ///
    /// Returns true if this write put the signal on the active list.
    /// Writing the current value to an inactive signal does nothing; a later
    /// write to an already active signal only replaces the pending value.
    pub fn set(&mut self, id: SignalId, value: Value) -> bool {
        let signal = &mut self.signals[id.index()];
        signal.pending = value;
        if value != signal.value && !signal.active {
            signal.active = true;
            self.active.push(id);
            return true;
        }
        false
    }

    /// Returns true if any signal is waiting for commit.
    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Number of signals on the active list.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Takes the head of the active list without committing it.
    pub(crate) fn pop_active(&mut self) -> Option<SignalId> {
        self.active.pop()
    }

    /// The transition the next commit will make, as `(current, pending)`.
    pub(crate) fn transition(&self, id: SignalId) -> (Value, Value) {
        let signal = &self.signals[id.index()];
        (signal.value, signal.pending)
    }

    /// Promotes the pending value and clears the active flag.
    pub(crate) fn commit(&mut self, id: SignalId) {
        let signal = &mut self.signals[id.index()];
        signal.value = signal.pending;
        signal.active = false;
    }

    pub(crate) fn hook_head(&self, id: SignalId) -> Option<HookId> {
        self.signals[id.index()].hooks
    }

    pub(crate) fn set_hook_head(&mut self, id: SignalId, head: Option<HookId>) {
        self.signals[id.index()].hooks = head;
    }

    /// Number of declared signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if no signals are declared.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterates over all signals in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(i, s)| (SignalId::from_index(i), s))
    }
}
