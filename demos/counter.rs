//! Clocked counter bench.
//!
//! A free-running clock drives a counter with synchronous reset and enable.
//! A master script holds reset for 20 ticks, enables counting for 40 ticks
//! and ends the simulation. A monitor prints every change of the count.
//!
//! Run with `cargo run --example counter`. Pass a filter such as
//! `tickwire=debug` as the first argument, or set `RUST_LOG`, to see
//! scheduler activity.

use tickwire::models::{ClockGen, Counter, Driver, Monitor};
use tickwire::{Edge, KernelConfig, SimResult, Simulator, StatsCollector, Trigger};

const MASTER_SCRIPT: &str = "
    delay 10
    set reset 1
    delay 20
    set reset 0
    delay 10
    set enable 1
    delay 40
    set enable 0
    finish
";

fn main() -> SimResult<()> {
    let mut config = KernelConfig::default();
    if let Some(level) = std::env::args().nth(1) {
        config.log_level = level;
    }
    tickwire::init_logging_from(&config);

    let mut sim = Simulator::with_config(config);
    let clk = sim.signal("clk", 0);
    let reset = sim.signal("reset", 0);
    let enable = sim.signal("enable", 0);
    let count = sim.signal("count", 0);

    sim.process("clock", ClockGen::new(clk, 1));
    sim.process("counter", Counter::new(clk, reset, enable, count));

    let master = Driver::parse(MASTER_SCRIPT, |name| sim.find_signal(name)).map_err(|e| {
        tickwire::SimError::Config(tickwire::ConfigError::Validation(e.to_string()))
    })?;
    sim.process("master", master);

    let (monitor, samples) = Monitor::new(count, Trigger::new(count, Edge::Change));
    sim.process("monitor", monitor);

    let mut collector = StatsCollector::new();
    collector.set_name("counter");
    collector.start();
    let outcome = sim.run()?;
    collector.stop();
    collector.update_from_json(&sim.export_stats());

    for sample in samples.samples() {
        println!("t={:>3}  count={}", sample.time, sample.value);
    }
    println!();
    println!("run ended at t={} ({outcome:?}), count={}", sim.time(), sim.get(count));
    println!();
    print!("{}", collector.stats().summary());

    Ok(())
}
