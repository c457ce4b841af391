//! Sensitivity hooks.
//!
//! A hook binds one waiting process to one signal with an edge filter. Each
//! signal keeps its hooks in a doubly linked list threaded through the
//! [`HookArena`]; attaching prepends and detaching unlinks in O(1) from any
//! position. The kernel owns every hook and removes it when the wait that
//! created it ends or its process terminates.

use serde::{Deserialize, Serialize};

use crate::signal::SignalTable;
use crate::types::{ProcessId, SignalId, Value};

/// Which committed transitions a hook reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// 0 → nonzero.
    Rising,
    /// Nonzero → 0.
    Falling,
    /// Either rising or falling.
    Either,
    /// Any change of value, including between two nonzero values.
    Change,
}

impl Edge {
    /// Returns true if the transition `from → to` fires this filter.
    pub fn matches(self, from: Value, to: Value) -> bool {
        match self {
            Edge::Rising => from == 0 && to != 0,
            Edge::Falling => from != 0 && to == 0,
            Edge::Either => (from == 0) != (to == 0),
            Edge::Change => from != to,
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Edge::Rising => "posedge",
            Edge::Falling => "negedge",
            Edge::Either => "edge",
            Edge::Change => "change",
        };
        f.write_str(s)
    }
}

/// Index of a hook slot in the [`HookArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u32);

impl HookId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One registration of a process on a signal.
#[derive(Clone, Copy, Debug)]
pub struct Hook {
    pub process: ProcessId,
    pub signal: SignalId,
    pub edge: Edge,
    prev: Option<HookId>,
    next: Option<HookId>,
}

impl Hook {
    /// The hook after this one on the same signal.
    pub fn next(&self) -> Option<HookId> {
        self.next
    }
}

/// Slot storage for hooks with a free list.
#[derive(Debug, Default)]
pub struct HookArena {
    slots: Vec<Option<Hook>>,
    free: Vec<HookId>,
    live: usize,
}

impl HookArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hook and prepends it to the signal's hook list.
    pub fn attach(
        &mut self,
        signals: &mut SignalTable,
        process: ProcessId,
        signal: SignalId,
        edge: Edge,
    ) -> HookId {
        let head = signals.hook_head(signal);
        let hook = Hook {
            process,
            signal,
            edge,
            prev: None,
            next: head,
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(hook);
                id
            }
            None => {
                self.slots.push(Some(hook));
                HookId((self.slots.len() - 1) as u32)
            }
        };

        if let Some(next) = head {
            self.slot_mut(next).prev = Some(id);
        }
        signals.set_hook_head(signal, Some(id));
        self.live += 1;
        id
    }

    /// Unlinks a hook from its signal and frees the slot.
    ///
    /// Detaching an already freed hook is a no-op.
    pub fn detach(&mut self, signals: &mut SignalTable, id: HookId) {
        let Some(hook) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return;
        };

        if let Some(next) = hook.next {
            self.slot_mut(next).prev = hook.prev;
        }
        match hook.prev {
            Some(prev) => self.slot_mut(prev).next = hook.next,
            None => signals.set_hook_head(hook.signal, hook.next),
        }

        self.free.push(id);
        self.live -= 1;
    }

    /// Returns a live hook.
    pub fn get(&self, id: HookId) -> Option<&Hook> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Iterates over the hooks registered on a signal, newest first.
    pub fn on_signal<'a>(
        &'a self,
        signals: &SignalTable,
        signal: SignalId,
    ) -> impl Iterator<Item = &'a Hook> + 'a {
        let mut cursor = signals.hook_head(signal);
        std::iter::from_fn(move || {
            let hook = self.get(cursor?)?;
            cursor = hook.next;
            Some(hook)
        })
    }

    /// Number of live hooks.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn slot_mut(&mut self, id: HookId) -> &mut Hook {
        self.slots[id.index()]
            .as_mut()
            .expect("hook list links to a freed slot")
    }
}
