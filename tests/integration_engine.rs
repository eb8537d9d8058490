mod common;

use approx::assert_relative_eq;
use proptest::prelude::*;

use ev_charge_sim::Error;
use ev_charge_sim::config::{ArrivalPolicyKind, ChargepointType, SimulationConfig};
use ev_charge_sim::sim::types::ChargingEvent;
use ev_charge_sim::sim::{compute_statistics, simulate};

#[test]
fn same_seed_gives_identical_runs() {
    let cfg = common::hourly_config(42);
    let a = simulate(&cfg).expect("valid config");
    let b = simulate(&cfg).expect("valid config");
    assert_eq!(a.per_tick.len(), 8760);
    assert!(!a.events.is_empty());
    assert_eq!(a, b);
}

#[test]
fn different_seeds_give_different_runs() {
    let a = simulate(&common::hourly_config(1)).expect("valid config");
    let b = simulate(&common::hourly_config(2)).expect("valid config");
    assert_ne!(a.events, b.events);
}

#[test]
fn unseeded_run_completes() {
    let mut cfg = common::hourly_config(0);
    cfg.simulation.seed = None;
    let result = simulate(&cfg).expect("valid config");
    assert_eq!(result.per_tick.len(), 8760);
}

#[test]
fn quarter_hour_granularity_covers_the_year() {
    let mut cfg = SimulationConfig::single();
    cfg.simulation.seed = Some(3);
    let result = simulate(&cfg).expect("valid config");
    assert_eq!(result.per_tick.len(), 365 * 24 * 4);
}

#[test]
fn daily_certain_arrival_scenario() {
    let cfg = common::single_daily_arrival();
    let result = simulate(&cfg).expect("valid config");

    assert_eq!(
        result.events[0],
        ChargingEvent {
            chargepoint_id: 0,
            start_tick: 0,
            end_tick: 2
        }
    );
    assert_eq!(result.events.len(), 365);
    assert!(result.events.iter().all(|e| e.duration_ticks() == 2));
    assert!(
        result
            .events
            .iter()
            .enumerate()
            .all(|(day, e)| e.start_tick == day * 24)
    );

    let stats = compute_statistics(&cfg, &result.per_tick);
    assert_relative_eq!(stats.theoretical_max_power_kw, 11.0);
    assert_relative_eq!(stats.actual_max_power_kw, 11.0);
    assert_relative_eq!(stats.concurrency_factor, 1.0);
    // Two full ticks at 11 kW per day.
    assert_relative_eq!(stats.total_energy_kwh, 365.0 * 22.0, epsilon = 1e-6);
}

#[test]
fn events_are_sorted_by_end_tick() {
    for policy in common::ALL_POLICIES {
        let mut cfg = common::hourly_config(5);
        cfg.simulation.policy = policy;
        let result = simulate(&cfg).expect("valid config");
        assert!(
            result
                .events
                .windows(2)
                .all(|w| w[0].end_tick <= w[1].end_tick),
            "{policy:?}"
        );
    }
}

#[test]
fn energy_matches_completed_sessions() {
    for policy in common::ALL_POLICIES {
        let cfg = common::morning_only(policy, 4);
        let result = simulate(&cfg).expect("valid config");
        let stats = compute_statistics(&cfg, &result.per_tick);

        let tick_hours = cfg.tick_hours();
        let from_events: f64 = result
            .events
            .iter()
            .map(|e| e.duration_ticks() as f64 * tick_hours * 11.0)
            .sum();

        assert!(!result.events.is_empty(), "{policy:?}");
        assert_relative_eq!(stats.total_energy_kwh, from_events, max_relative = 1e-9);
    }
}

#[test]
fn occupied_arrivals_are_dropped_not_queued() {
    let cfg = common::single_saturated(ArrivalPolicyKind::NoArrivalIfOccupied);
    let result = simulate(&cfg).expect("valid config");

    // One vehicle at a time: sessions never overlap.
    assert!(
        result
            .events
            .windows(2)
            .all(|w| w[1].start_tick >= w[0].end_tick)
    );
    assert!(result.events.len() <= result.per_tick.len() / 2);
}

#[test]
fn queueing_completes_at_least_as_many_sessions() {
    let dropped = simulate(&common::single_saturated(
        ArrivalPolicyKind::NoArrivalIfOccupied,
    ))
    .expect("valid config");
    let per_cp = simulate(&common::single_saturated(
        ArrivalPolicyKind::PerChargepointQueue,
    ))
    .expect("valid config");
    let global = simulate(&common::single_saturated(
        ArrivalPolicyKind::FindFreeOrGlobalQueue,
    ))
    .expect("valid config");

    assert!(per_cp.events.len() >= dropped.events.len());
    assert!(global.events.len() >= dropped.events.len());
}

#[test]
fn global_queue_site_charges_on_every_group() {
    let mut cfg = common::morning_only(ArrivalPolicyKind::FindFreeOrGlobalQueue, 2);
    cfg.chargepoints.push(ChargepointType {
        power_kw: 50.0,
        count: 1,
    });
    let result = simulate(&cfg).expect("valid config");
    assert!(result.events.iter().any(|e| e.chargepoint_id == 2));
}

#[test]
fn invalid_configuration_never_runs() {
    let mut cfg = common::hourly_config(1);
    cfg.simulation.granularity_ms = 0;
    cfg.arrivals.multiplier = 5.0;
    match simulate(&cfg) {
        Err(Error::InvalidConfig(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn site_without_chargepoints_has_zero_concurrency() {
    let mut cfg = common::hourly_config(1);
    cfg.chargepoints.clear();
    let result = simulate(&cfg).expect("valid config");
    let stats = compute_statistics(&cfg, &result.per_tick);
    assert_eq!(stats.theoretical_max_power_kw, 0.0);
    assert_eq!(stats.concurrency_factor, 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn concurrency_factor_stays_in_unit_interval(
        seed in any::<u64>(),
        small in 0usize..4,
        fast in 0usize..3,
        multiplier in 0.2f64..=2.0,
        policy in prop::sample::select(common::ALL_POLICIES.to_vec()),
    ) {
        let mut cfg = common::hourly_config(seed);
        cfg.simulation.policy = policy;
        cfg.arrivals.multiplier = multiplier;
        cfg.chargepoints = vec![
            ChargepointType { power_kw: 11.0, count: small },
            ChargepointType { power_kw: 50.0, count: fast },
        ];
        let result = simulate(&cfg).expect("valid config");
        let stats = compute_statistics(&cfg, &result.per_tick);
        prop_assert!(stats.concurrency_factor >= 0.0);
        prop_assert!(stats.concurrency_factor <= 1.0 + 1e-12);
        prop_assert!(stats.actual_max_power_kw <= stats.theoretical_max_power_kw + 1e-9);
    }
}
