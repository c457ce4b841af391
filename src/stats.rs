//! Run statistics and their export.
//!
//! [`StatsCollector`] wraps a run with a wall-clock timer and folds in the
//! JSON produced by [`Simulator::export_stats`]. The result renders as JSON,
//! CSV or a readable summary.
//!
//! [`Simulator::export_stats`]: crate::kernel::Simulator::export_stats

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::types::{SimTime, Value};

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub metadata: RunMetadata,

    /// Kernel counters at the end of the run
    pub kernel: KernelSummary,

    /// Final committed value per signal
    pub signals: BTreeMap<String, Value>,

    /// Final state per process
    pub processes: BTreeMap<String, String>,

    pub timing: TimingStats,
}

/// Metadata about the run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    pub name: String,

    /// Wall-clock start, seconds since the Unix epoch
    pub start_time: Option<String>,

    /// Wall-clock end, seconds since the Unix epoch
    pub end_time: Option<String>,

    pub version: String,

    /// Configuration file the bench was built from, if any
    pub config_file: Option<String>,
}

/// Kernel counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KernelSummary {
    pub final_time: SimTime,
    pub finished: bool,
    pub processes_started: u64,
    pub resumptions: u64,
    pub delta_cycles: u64,
    pub signal_activations: u64,
    pub signal_commits: u64,
    pub hook_matches: u64,
    pub processes_terminated: u64,
    pub faults: u64,
    pub process_count: usize,
    pub signal_count: usize,
}

/// Wall-clock performance figures.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    pub total_wall_time_ms: f64,

    /// Simulated ticks per wall-clock second
    pub sim_time_per_second: f64,

    pub resumptions_per_second: f64,

    pub delta_cycles_per_second: f64,
}

impl SimulationStats {
    pub fn new() -> Self {
        Self {
            metadata: RunMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the run name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    pub fn record_start(&mut self) {
        self.metadata.start_time = Some(epoch_now());
    }

    pub fn record_end(&mut self) {
        self.metadata.end_time = Some(epoch_now());
    }

    /// Derives rates from the wall-clock duration of the run.
    pub fn compute_timing(&mut self, wall_time_ms: f64) {
        self.timing.total_wall_time_ms = wall_time_ms;

        if wall_time_ms > 0.0 {
            let seconds = wall_time_ms / 1000.0;
            self.timing.sim_time_per_second = self.kernel.final_time as f64 / seconds;
            self.timing.resumptions_per_second = self.kernel.resumptions as f64 / seconds;
            self.timing.delta_cycles_per_second = self.kernel.delta_cycles as f64 / seconds;
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports kernel counters and timing as `metric,value` rows.
    pub fn to_csv(&self) -> String {
        let k = &self.kernel;
        let mut csv = String::from("metric,value\n");

        for (metric, value) in [
            ("final_time", k.final_time),
            ("processes_started", k.processes_started),
            ("resumptions", k.resumptions),
            ("delta_cycles", k.delta_cycles),
            ("signal_activations", k.signal_activations),
            ("signal_commits", k.signal_commits),
            ("hook_matches", k.hook_matches),
            ("processes_terminated", k.processes_terminated),
            ("faults", k.faults),
            ("process_count", k.process_count as u64),
            ("signal_count", k.signal_count as u64),
        ] {
            csv.push_str(&format!("{metric},{value}\n"));
        }

        csv.push_str(&format!("wall_time_ms,{:.2}\n", self.timing.total_wall_time_ms));
        csv.push_str(&format!("sim_time_per_second,{:.2}\n", self.timing.sim_time_per_second));
        csv.push_str(&format!(
            "resumptions_per_second,{:.2}\n",
            self.timing.resumptions_per_second
        ));

        csv
    }

    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Final signal values as `signal,value` rows.
    pub fn signals_to_csv(&self) -> String {
        let mut csv = String::from("signal,value\n");
        for (name, value) in &self.signals {
            csv.push_str(&format!("{name},{value}\n"));
        }
        csv
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== Simulation Statistics ===")?;
        writeln!(w)?;

        if !self.metadata.name.is_empty() {
            writeln!(w, "Name: {}", self.metadata.name)?;
        }
        if let Some(ref start) = self.metadata.start_time {
            writeln!(w, "Started: {start}")?;
        }
        if let Some(ref end) = self.metadata.end_time {
            writeln!(w, "Ended: {end}")?;
        }
        writeln!(w)?;

        let k = &self.kernel;
        writeln!(w, "--- Kernel ---")?;
        writeln!(w, "Final simulation time: {}", k.final_time)?;
        writeln!(w, "Finished: {}", k.finished)?;
        writeln!(w, "Resumptions: {}", k.resumptions)?;
        writeln!(w, "Delta cycles: {}", k.delta_cycles)?;
        writeln!(w, "Signal commits: {} of {} activations", k.signal_commits, k.signal_activations)?;
        writeln!(w, "Hook matches: {}", k.hook_matches)?;
        writeln!(w, "Processes: {} ({} terminated)", k.process_count, k.processes_terminated)?;
        if k.faults > 0 {
            writeln!(w, "Faults: {}", k.faults)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Timing ---")?;
        writeln!(w, "Wall time: {:.2} ms", self.timing.total_wall_time_ms)?;
        writeln!(w, "Sim time/sec: {:.2}", self.timing.sim_time_per_second)?;
        writeln!(w, "Resumptions/sec: {:.2}", self.timing.resumptions_per_second)?;

        if !self.signals.is_empty() {
            writeln!(w)?;
            writeln!(w, "--- Signals ---")?;
            for (name, value) in &self.signals {
                writeln!(w, "{name} = {value}")?;
            }
        }

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Wall-clock stopwatch.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

fn epoch_now() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}s", duration.as_secs())
}

/// Collects statistics around a run.
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: SimulationStats,
    timer: Option<Timer>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            stats: SimulationStats::new(),
            timer: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.stats.metadata.name = name.into();
    }

    pub fn set_config_file(&mut self, path: impl Into<String>) {
        self.stats.metadata.config_file = Some(path.into());
    }

    /// Starts the wall-clock timer.
    pub fn start(&mut self) {
        self.timer = Some(Timer::start());
        self.stats.record_start();
    }

    /// Stops timing and derives rates from the counters collected so far.
    pub fn stop(&mut self) {
        self.stats.record_end();
        if let Some(ref timer) = self.timer {
            self.stats.compute_timing(timer.elapsed_ms());
        }
    }

    /// Folds in a simulator's JSON export.
    pub fn update_from_json(&mut self, json: &serde_json::Value) {
        if let Some(kernel) = json.get("kernel") {
            let counter = |key: &str| kernel[key].as_u64().unwrap_or(0);
            let k = &mut self.stats.kernel;
            k.final_time = counter("current_time");
            k.finished = kernel["finished"].as_bool().unwrap_or(false);
            k.processes_started = counter("processes_started");
            k.resumptions = counter("resumptions");
            k.delta_cycles = counter("delta_cycles");
            k.signal_activations = counter("signal_activations");
            k.signal_commits = counter("signal_commits");
            k.hook_matches = counter("hook_matches");
            k.processes_terminated = counter("processes_terminated");
            k.faults = counter("faults");
            k.process_count = counter("process_count") as usize;
            k.signal_count = counter("signal_count") as usize;
        }

        if let Some(signals) = json.get("signals").and_then(|s| s.as_object()) {
            self.stats.signals = signals
                .iter()
                .filter_map(|(name, v)| Some((name.clone(), v.as_u64()?)))
                .collect();
        }

        if let Some(processes) = json.get("processes").and_then(|p| p.as_object()) {
            self.stats.processes = processes
                .iter()
                .filter_map(|(name, v)| Some((name.clone(), v.as_str()?.to_string())))
                .collect();
        }
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn into_stats(self) -> SimulationStats {
        self.stats
    }
}
