//! Integration tests for progress throttling and engine-level reporting.

use std::time::Duration;

use cairn::config::Config;
use cairn::runner::{Orchestrator, ProgressThrottle, MIN_DELIVERY_INTERVAL};
use cairn::unit::{ProbeResult, ProgressFn, Unit, UnitRegistry, UnitResult};
use cairn::Result;

struct ChattyUnit {
    name: String,
    updates: usize,
}

impl Unit for ChattyUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "emits many rapid progress updates"
    }

    fn probe(&self) -> ProbeResult {
        ProbeResult::missing("not present")
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        for i in 0..=self.updates {
            let percent = i as f64 / self.updates as f64;
            progress(percent, &format!("step {i}"), None);
        }
        Ok(UnitResult::success("done"))
    }
}

#[test]
fn default_interval_is_one_hundred_millis() {
    assert_eq!(MIN_DELIVERY_INTERVAL, Duration::from_millis(100));
}

#[test]
fn rapid_updates_are_throttled_but_forced_ones_pass() {
    let mut delivered: Vec<f64> = Vec::new();
    {
        let mut observer = |percent: f64, _message: &str, _detail: Option<&str>| {
            delivered.push(percent);
        };
        let mut throttle = ProgressThrottle::new(&mut observer);

        for i in 0..100 {
            throttle.maybe_deliver(i as f64 / 100.0, "update", None, false);
        }
        throttle.maybe_deliver(1.0, "milestone", None, true);
    }

    // First update goes through, the burst is dropped, the forced one lands.
    assert!(delivered.len() <= 5, "delivered {} updates", delivered.len());
    assert_eq!(delivered.first().copied(), Some(0.0));
    assert_eq!(delivered.last().copied(), Some(1.0));
}

#[test]
fn engine_progress_is_bounded_and_ends_at_one() {
    let mut registry = UnitRegistry::new();
    for name in ["first", "second", "third"] {
        registry.register(name, move |_c, _o| {
            Box::new(ChattyUnit {
                name: name.to_string(),
                updates: 500,
            })
        });
    }
    let config = Config::default();
    let orchestrator = Orchestrator::new(&registry, &config);

    let mut delivered: Vec<f64> = Vec::new();
    let mut observer = |percent: f64, _message: &str, _detail: Option<&str>| {
        delivered.push(percent);
    };
    let requested: Vec<String> = ["first", "second", "third"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    orchestrator
        .execute(&requested, Some(&mut observer), None)
        .unwrap();

    assert!(!delivered.is_empty());
    assert!(delivered.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(delivered.last().copied(), Some(1.0));
    // Unit completion milestones are always delivered.
    let thirds = [1.0 / 3.0, 2.0 / 3.0];
    for milestone in thirds {
        assert!(
            delivered.iter().any(|p| (p - milestone).abs() < 1e-9),
            "missing milestone {milestone}"
        );
    }
}

#[test]
fn successful_run_progress_is_monotonic() {
    let mut registry = UnitRegistry::new();
    for name in ["one", "two"] {
        registry.register(name, move |_c, _o| {
            Box::new(ChattyUnit {
                name: name.to_string(),
                updates: 50,
            })
        });
    }
    let config = Config::default();
    let orchestrator = Orchestrator::new(&registry, &config);

    let mut delivered: Vec<f64> = Vec::new();
    let mut observer = |percent: f64, _message: &str, _detail: Option<&str>| {
        delivered.push(percent);
    };
    orchestrator
        .execute(
            &["one".to_string(), "two".to_string()],
            Some(&mut observer),
            None,
        )
        .unwrap();

    assert!(
        delivered.windows(2).all(|w| w[0] <= w[1] + 1e-9),
        "progress went backwards: {delivered:?}"
    );
}
