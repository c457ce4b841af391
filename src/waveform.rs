//! Value-change log.
//!
//! When enabled, the kernel appends one record for every commit that changes
//! a signal's value. Commits that write back the current value are glitches
//! the kernel suppresses, so they never appear here.

use serde::{Deserialize, Serialize};

use crate::types::{SignalId, SimTime, Value};

/// One committed value change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange {
    pub time: SimTime,
    pub signal: SignalId,
    pub from: Value,
    pub to: Value,
}

/// Ordered list of committed value changes.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    enabled: bool,
    changes: Vec<ValueChange>,
}

impl ChangeLog {
    /// Creates a log; a disabled log ignores every record.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            changes: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn record(&mut self, change: ValueChange) {
        if self.enabled {
            self.changes.push(change);
        }
    }

    /// All changes in commit order.
    pub fn changes(&self) -> &[ValueChange] {
        &self.changes
    }

    /// Changes of one signal in commit order.
    pub fn of(&self, signal: SignalId) -> impl Iterator<Item = &ValueChange> + '_ {
        self.changes.iter().filter(move |c| c.signal == signal)
    }

    /// The value a signal held once every delta cycle of `time` settled.
    ///
    /// Returns `None` when the log holds no change of the signal, in which
    /// case the value never moved from its initial value.
    pub fn value_at(&self, signal: SignalId, time: SimTime) -> Option<Value> {
        let mut changes = self.of(signal).peekable();
        let first_from = changes.peek()?.from;
        Some(
            changes
                .take_while(|c| c.time <= time)
                .last()
                .map_or(first_from, |c| c.to),
        )
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Renders the log as CSV, resolving signal names through `name_of`.
    pub fn to_csv<'a>(&self, name_of: impl Fn(SignalId) -> &'a str) -> String {
        let mut csv = String::from("time,signal,from,to\n");
        for c in &self.changes {
            csv.push_str(&format!("{},{},{},{}\n", c.time, name_of(c.signal), c.from, c.to));
        }
        csv
    }
}
