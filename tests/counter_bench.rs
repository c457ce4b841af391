//! End-to-end tests on the clocked counter bench.
//!
//! The bench is a free-running clock, a counter with synchronous reset and
//! enable, and a master script that pulses reset, enables counting for 40
//! ticks and then ends the simulation.

use std::sync::Arc;

use parking_lot::Mutex;

use tickwire::config::{ConfigError, KernelConfig, ProcessConfig};
use tickwire::models::{ClockGen, Counter, Driver, Monitor, MonitorHandle, Sample};
use tickwire::{
    create_default_registry, Context, Edge, RunOutcome, SignalId, SimConfig, SimConfigBuilder,
    SimError, Simulator, StatsCollector, Suspend, Trigger,
};

const MASTER_SCRIPT: &str =
    "delay 10; set reset 1; delay 20; set reset 0; delay 10; set enable 1; delay 40; set enable 0; finish";

struct Bench {
    sim: Simulator,
    clk: SignalId,
    reset: SignalId,
    count: SignalId,
    samples: MonitorHandle,
}

fn build_bench(width: u32) -> Bench {
    let mut sim = Simulator::with_config(KernelConfig {
        record_changes: true,
        ..Default::default()
    });
    let clk = sim.signal("clk", 0);
    let reset = sim.signal("reset", 0);
    let enable = sim.signal("enable", 0);
    let count = sim.signal("count", 0);

    sim.process("clock", ClockGen::new(clk, 1));
    sim.process(
        "counter",
        Counter::new(clk, reset, enable, count).with_width(width),
    );
    let master = Driver::parse(MASTER_SCRIPT, |name| sim.find_signal(name)).unwrap();
    sim.process("master", master);

    let (monitor, samples) = Monitor::new(count, Trigger::new(count, Edge::Change));
    sim.process("monitor", monitor);

    Bench {
        sim,
        clk,
        reset,
        count,
        samples,
    }
}

#[test]
fn test_reference_scenario() {
    let mut bench = build_bench(64);

    assert_eq!(bench.sim.run().unwrap(), RunOutcome::Finished);
    assert_eq!(bench.sim.time(), 80);
    assert_eq!(bench.sim.get(bench.count), 20);

    // Reset and idle keep the counter at zero through tick 30.
    for t in [0, 10, 20, 30, 39] {
        assert_eq!(bench.sim.value_at(bench.count, t), Some(0), "tick {t}");
    }
    assert_eq!(bench.sim.value_at(bench.reset, 15), Some(1));
    assert_eq!(bench.sim.value_at(bench.reset, 30), Some(0));

    let expected: Vec<Sample> = (0..20)
        .map(|i| Sample {
            time: 40 + 2 * i,
            value: i + 1,
        })
        .collect();
    assert_eq!(bench.samples.samples(), expected);
}

#[test]
fn test_clock_rises_on_even_ticks() {
    let mut bench = build_bench(64);
    bench.sim.run().unwrap();

    let rising: Vec<_> = bench
        .sim
        .changes()
        .of(bench.clk)
        .filter(|c| c.to == 1)
        .map(|c| c.time)
        .collect();
    assert_eq!(rising.len(), 40);
    assert!(rising.iter().all(|t| t % 2 == 0));
    assert_eq!(rising.last(), Some(&78));
}

#[test]
fn test_narrow_counter_wraps() {
    let mut bench = build_bench(4);
    assert_eq!(bench.sim.run().unwrap(), RunOutcome::Finished);
    assert_eq!(bench.sim.get(bench.count), 4);
    assert_eq!(bench.sim.value_at(bench.count, 70), Some(0));
}

#[test]
fn test_stopping_early_leaves_partial_count() {
    let mut bench = build_bench(64);
    assert_eq!(bench.sim.run_until(50).unwrap(), RunOutcome::TimeLimit);
    // Edges at 40, 42, 44, 46, 48 and 50.
    assert_eq!(bench.sim.get(bench.count), 6);

    assert_eq!(bench.sim.run().unwrap(), RunOutcome::Finished);
    assert_eq!(bench.sim.get(bench.count), 20);
}

#[test]
fn test_stats_export() {
    let mut bench = build_bench(64);
    let mut collector = StatsCollector::new();
    collector.set_name("counter bench");

    collector.start();
    bench.sim.run().unwrap();
    collector.stop();
    collector.update_from_json(&bench.sim.export_stats());

    let stats = collector.stats();
    assert_eq!(stats.kernel.final_time, 80);
    assert!(stats.kernel.finished);
    assert_eq!(stats.kernel.process_count, 4);
    assert_eq!(stats.kernel.signal_count, 4);
    assert_eq!(stats.signals["count"], 20);
    assert_eq!(stats.processes["master"], "terminated");
    assert!(stats.summary().contains("counter bench"));

    let csv = bench.sim.changes_csv();
    assert!(csv.contains("40,count,0,1"));
    assert!(csv.contains("78,count,19,20"));
}

// ============================================================================
// Configuration-built benches
// ============================================================================

const BENCH_YAML: &str = r#"
kernel:
  record_changes: true

signals:
  - name: clk
  - name: reset
  - name: enable
  - name: count

processes:
  - name: clock
    model: clock
    attrs:
      signal: clk
      half_period: "1"
  - name: counter
    model: counter
    attrs:
      clock: clk
      reset: reset
      enable: enable
      count: count
  - name: master
    model: driver
    attrs:
      script: "delay 10; set reset 1; delay 20; set reset 0; delay 10; set enable 1; delay 40; set enable 0; finish"
"#;

#[test]
fn test_bench_from_yaml() {
    let config = SimConfig::from_yaml(BENCH_YAML).unwrap();
    let mut sim = Simulator::from_config(&config, &create_default_registry()).unwrap();

    assert_eq!(sim.run().unwrap(), RunOutcome::Finished);
    assert_eq!(sim.time(), 80);
    let count = sim.lookup("count").unwrap();
    assert_eq!(sim.get(count), 20);
    assert_eq!(sim.value_at(count, 30), Some(0));
}

#[test]
fn test_bench_from_builder_with_width() {
    let config = SimConfigBuilder::new()
        .time_limit(1000)
        .signal("clk", 0)
        .signal("reset", 0)
        .signal("enable", 0)
        .signal("count", 0)
        .process(
            ProcessConfig::new("clock", "clock")
                .with_attr("signal", "clk")
                .with_attr("half_period", "1"),
        )
        .process(
            ProcessConfig::new("counter", "counter")
                .with_attr("clock", "clk")
                .with_attr("reset", "reset")
                .with_attr("enable", "enable")
                .with_attr("count", "count")
                .with_attr("width", "4"),
        )
        .process(ProcessConfig::new("master", "driver").with_attr("script", MASTER_SCRIPT))
        .build()
        .unwrap();

    // The configuration survives a JSON round trip unchanged in meaning.
    let config = SimConfig::from_json(&config.to_json().unwrap()).unwrap();
    let mut sim = Simulator::from_config(&config, &create_default_registry()).unwrap();

    assert_eq!(sim.run().unwrap(), RunOutcome::Finished);
    assert_eq!(sim.get(sim.lookup("count").unwrap()), 4);
}

#[test]
fn test_configured_sensitivity() {
    let wakes = Arc::new(Mutex::new(Vec::new()));
    let mut registry = create_default_registry();
    let seen = Arc::clone(&wakes);
    registry.register("tally", move |_cfg, _sim| {
        let seen = Arc::clone(&seen);
        let mut started = false;
        Ok(Box::new(move |ctx: &mut Context<'_>| {
            if started {
                seen.lock().push(ctx.time());
            }
            started = true;
            Suspend::Wait
        }))
    });

    let config = SimConfigBuilder::new()
        .signal("clk", 0)
        .process(
            ProcessConfig::new("clock", "clock")
                .with_attr("signal", "clk")
                .with_attr("half_period", "2")
                .with_attr("toggles", "6"),
        )
        .process(ProcessConfig::new("tally", "tally").with_sensitivity("clk", Edge::Falling))
        .build()
        .unwrap();

    let mut sim = Simulator::from_config(&config, &registry).unwrap();
    assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
    assert_eq!(*wakes.lock(), vec![2, 6, 10]);
}

#[test]
fn test_unknown_model_is_rejected() {
    let config = SimConfigBuilder::new()
        .signal("clk", 0)
        .process(ProcessConfig::new("mystery", "oscillator"))
        .build()
        .unwrap();

    let result = Simulator::from_config(&config, &create_default_registry());
    assert!(matches!(result, Err(SimError::UnknownModel(m)) if m == "oscillator"));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let yaml = r#"
signals:
  - name: clk
processes:
  - name: watcher
    model: driver
    attrs:
      script: "finish"
    sensitivity:
      - signal: missing
"#;
    assert!(matches!(
        SimConfig::from_yaml(yaml),
        Err(ConfigError::Validation(_))
    ));

    // Benches assembled by hand are validated again before building.
    let mut config = SimConfig::new();
    config.processes.push(
        ProcessConfig::new("watcher", "driver")
            .with_attr("script", "finish")
            .with_sensitivity("missing", Edge::Rising),
    );
    let result = Simulator::from_config(&config, &create_default_registry());
    assert!(matches!(result, Err(SimError::Config(_))));
}
