//! Scripted testbench driver.
//!
//! A driver walks a list of [`Step`]s: it applies writes immediately,
//! suspends on delays and edge waits, and may end the whole simulation.
//!
//! Scripts can be written as text, one command per line or separated by
//! `;`:
//!
//! ```text
//! delay 10
//! set reset 1
//! wait rising clk
//! finish
//! ```

use thiserror::Error;

use crate::hook::Edge;
use crate::process::{Context, Process, Suspend, Trigger};
use crate::types::{SignalId, SimTime, Value};

/// One stimulus step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Delay(SimTime),
    Set(SignalId, Value),
    Wait(Trigger),
    Finish,
}

/// Errors from parsing a driver script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("command {index}: unknown command '{command}'")]
    UnknownCommand { index: usize, command: String },

    #[error("command {index}: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("command {index}: unknown signal '{name}'")]
    UnknownSignal { index: usize, name: String },
}

/// Runs a fixed sequence of steps, then terminates.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    steps: Vec<Step>,
    pc: usize,
}

impl Driver {
    /// Creates an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, ticks: SimTime) -> Self {
        self.steps.push(Step::Delay(ticks));
        self
    }

    pub fn set(mut self, signal: SignalId, value: Value) -> Self {
        self.steps.push(Step::Set(signal, value));
        self
    }

    pub fn wait(mut self, signal: SignalId, edge: Edge) -> Self {
        self.steps.push(Step::Wait(Trigger::new(signal, edge)));
        self
    }

    pub fn finish(mut self) -> Self {
        self.steps.push(Step::Finish);
        self
    }

    /// Parses a script, resolving signal names through `resolve`.
    pub fn parse<F>(script: &str, resolve: F) -> Result<Self, ScriptError>
    where
        F: Fn(&str) -> Option<SignalId>,
    {
        let mut steps = Vec::new();
        let commands = script
            .split(|c| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.starts_with('#'));

        for (index, command) in commands.enumerate() {
            let words: Vec<&str> = command.split_whitespace().collect();
            let malformed = |reason: &str| ScriptError::Malformed {
                index,
                reason: reason.to_string(),
            };
            let signal = |name: &str| {
                resolve(name).ok_or_else(|| ScriptError::UnknownSignal {
                    index,
                    name: name.to_string(),
                })
            };

            let step = match words.as_slice() {
                ["delay", ticks] => Step::Delay(
                    ticks
                        .parse()
                        .map_err(|_| malformed("delay expects a tick count"))?,
                ),
                ["set", name, value] => Step::Set(
                    signal(*name)?,
                    value
                        .parse()
                        .map_err(|_| malformed("set expects a numeric value"))?,
                ),
                ["wait", edge, name] => {
                    let edge = match *edge {
                        "rising" | "posedge" => Edge::Rising,
                        "falling" | "negedge" => Edge::Falling,
                        "either" | "edge" => Edge::Either,
                        "change" => Edge::Change,
                        _ => return Err(malformed("unknown edge kind")),
                    };
                    Step::Wait(Trigger::new(signal(*name)?, edge))
                }
                ["finish"] => Step::Finish,
                [cmd @ ("delay" | "set" | "wait" | "finish"), ..] => {
                    let reason = format!("wrong number of arguments for '{cmd}'");
                    return Err(malformed(reason.as_str()));
                }
                [cmd, ..] => {
                    return Err(ScriptError::UnknownCommand {
                        index,
                        command: cmd.to_string(),
                    });
                }
                [] => continue,
            };
            steps.push(step);
        }

        Ok(Self { steps, pc: 0 })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl Process for Driver {
    fn resume(&mut self, ctx: &mut Context<'_>) -> Suspend {
        while let Some(step) = self.steps.get(self.pc).copied() {
            self.pc += 1;
            match step {
                Step::Delay(ticks) => return Suspend::Delay(ticks),
                Step::Set(signal, value) => ctx.set(signal, value),
                Step::Wait(trigger) => return Suspend::Edge(vec![trigger]),
                Step::Finish => {
                    tracing::debug!(time = ctx.time(), process = ctx.name(), "driver finishing simulation");
                    ctx.finish();
                    return Suspend::Done;
                }
            }
        }
        Suspend::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{RunOutcome, Simulator};

    #[test]
    fn test_parse_script() {
        let a = SignalId::from_index(0);
        let resolve = |name: &str| (name == "a").then_some(a);

        let driver = Driver::parse(
            "delay 5; set a 3\n# comment\nwait posedge a\nfinish",
            resolve,
        )
        .unwrap();

        assert_eq!(
            driver.steps(),
            &[
                Step::Delay(5),
                Step::Set(a, 3),
                Step::Wait(Trigger::posedge(a)),
                Step::Finish
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        let resolve = |_: &str| None;

        assert!(matches!(
            Driver::parse("jump 4", resolve),
            Err(ScriptError::UnknownCommand { index: 0, .. })
        ));
        assert!(matches!(
            Driver::parse("finish; delay soon", resolve),
            Err(ScriptError::Malformed { index: 1, .. })
        ));
        assert!(matches!(
            Driver::parse("set ghost 1", resolve),
            Err(ScriptError::UnknownSignal { .. })
        ));
        assert!(matches!(
            Driver::parse("delay", resolve),
            Err(ScriptError::Malformed { .. })
        ));
    }

    #[test]
    fn test_runs_steps_in_order() {
        let mut sim = Simulator::new();
        let a = sim.signal("a", 0);
        let driver = Driver::new().set(a, 1).delay(4).set(a, 2).delay(6).finish().set(a, 9);
        sim.process("driver", driver);

        assert_eq!(sim.run().unwrap(), RunOutcome::Finished);
        assert_eq!(sim.time(), 10);
        // Steps after finish never run.
        assert_eq!(sim.get(a), 2);
    }

    #[test]
    fn test_wait_step() {
        let mut sim = Simulator::new();
        let go = sim.signal("go", 0);
        let done = sim.signal("done", 0);
        sim.process("waiter", Driver::new().wait(go, Edge::Rising).set(done, 1));
        sim.process("kick", Driver::new().delay(7).set(go, 1).delay(1));

        assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.get(done), 1);
        assert_eq!(sim.time(), 8);
    }
}
