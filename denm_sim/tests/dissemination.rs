//! End-to-end dissemination tests through the simulated world.
//!
//! These drive real agents over the router and check the recorded scalars
//! the way offline analysis would read them.

use approx::assert_relative_eq;
use denm_core::{names, TriggerCause};
use denm_env::{NetworkController, Position, SimTime};
use denm_sim::scenarios::ScenarioId;
use denm_sim::{DisseminationSummary, InfrastructureProfile, ScenarioRunner, SimConfig, SimWorld, Storyboard};
use proptest::prelude::*;
use std::time::Duration;

fn still_world() -> SimWorld {
    let config = SimConfig::default()
        .with_speed(0.0, 0.0)
        .with_link_latency(0.0)
        .with_vehicle_range(500.0)
        .with_deadline(0.5);
    SimWorld::new(config).unwrap()
}

fn slow_antenna() -> InfrastructureProfile {
    InfrastructureProfile {
        downlink_latency: Duration::from_millis(100),
        ..InfrastructureProfile::terrestrial().with_reliability(1.0)
    }
}

#[test]
fn test_relayed_crash_reaches_receiver() {
    let mut world = still_world();
    let a = world.add_vehicle(Position::zeros(), Some(TriggerCause::CrashIncident)).unwrap();
    // Out of A's range, inside the antenna's
    let b = world.add_vehicle(Position::new(-700.0, 0.0), None).unwrap();
    let r = world.add_relay(&slow_antenna(), Position::new(-300.0, 20.0)).unwrap();
    world.network_controller.set_link_latency(a, r, Duration::from_millis(100));
    
    world.apply_storyboard(&Storyboard::crash(a, SimTime::from_secs_f64(5.0)));
    world.run_until(SimTime::from_secs_f64(10.0));
    
    let relay = world.station(r).unwrap().agent().relay().unwrap();
    let cloud = relay.cloud_delivery().unwrap();
    // Heard at 5.1, plus the antenna's 5 ms processing latency
    assert_eq!(cloud.delivery_time, SimTime::from_secs_f64(5.105));
    assert_eq!(relay.relayed_count(), 1);
    
    let receiver_b = world.station(b).unwrap().agent().receiver().unwrap();
    let first = receiver_b.first_reception().unwrap();
    assert_eq!(first.reception_time, SimTime::from_secs_f64(5.2));
    assert_eq!(first.delay, Duration::from_millis(200));
    assert!(first.within_deadline);
    assert_eq!(first.relay_origin, "terrestrial");
    
    // A hears its own relayed copy and drops it
    let receiver_a = world.station(a).unwrap().agent().receiver().unwrap();
    assert!(!receiver_a.has_received());
    
    let report = world.finish();
    assert_eq!(report.scalars.get("node[0].receiver", names::DENM_RECEIVED_FLAG), Some(0.0));
    assert_eq!(report.scalars.get("node[1].receiver", names::DENM_RECEIVED_FLAG), Some(1.0));
    assert_relative_eq!(
        report.scalars.get("node[1].receiver", names::DENM_RECEPTION_DELAY).unwrap(),
        0.2,
        epsilon = 1e-9
    );
    assert_eq!(report.scalars.get("node[1].receiver", names::DENM_WITHIN_DEADLINE), Some(1.0));
    assert_eq!(report.scalars.get("antenna[0].relay", names::DENMS_RELAYED), Some(1.0));
    assert_relative_eq!(
        report.scalars.get("antenna[0].relay", names::CLOUD_RECEPTION_TIME).unwrap(),
        5.105,
        epsilon = 1e-9
    );
}

#[test]
fn test_unreached_vehicle_out_of_coverage() {
    let mut world = still_world();
    let a = world.add_vehicle(Position::zeros(), Some(TriggerCause::CrashIncident)).unwrap();
    world.add_vehicle(Position::new(-5000.0, 0.0), None).unwrap();
    
    world.apply_storyboard(&Storyboard::crash(a, SimTime::from_secs_f64(1.0)));
    world.run_until(SimTime::from_secs_f64(5.0));
    let report = world.finish();
    
    let c = "node[1].receiver";
    assert_eq!(report.scalars.get(c, names::DENM_RECEIVED_FLAG), Some(0.0));
    assert_eq!(report.scalars.get(c, names::DENM_OUT_OF_COVERAGE), Some(1.0));
    assert_eq!(report.scalars.get(c, names::DENM_RELIABILITY_DROP), Some(0.0));
    assert_eq!(report.scalars.get(c, names::DENMS_RECEIVED), Some(0.0));
}

#[test]
fn test_reliability_drop_reported_as_out_of_coverage() {
    let mut world = still_world();
    let a = world.add_vehicle(Position::zeros(), Some(TriggerCause::CrashIncident)).unwrap();
    world.add_vehicle(Position::new(-700.0, 0.0), None).unwrap();
    let dead = InfrastructureProfile::terrestrial().with_reliability(0.0);
    let r = world.add_relay(&dead, Position::new(-300.0, 20.0)).unwrap();
    
    world.apply_storyboard(&Storyboard::crash(a, SimTime::from_secs_f64(1.0)));
    world.run_until(SimTime::from_secs_f64(5.0));
    
    let stats = world.station(r).unwrap().agent().relay().unwrap().stats();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.reliability_drops, 1);
    
    let report = world.finish();
    assert_eq!(report.scalars.get("node[1].receiver", names::DENM_OUT_OF_COVERAGE), Some(1.0));
    assert_eq!(report.scalars.get("node[1].receiver", names::DENM_RELIABILITY_DROP), Some(0.0));
    assert_eq!(report.scalars.get("antenna[0].relay", names::DENMS_RELAYED), Some(0.0));
}

#[test]
fn test_overlapping_relays_dedup() {
    let mut world = still_world();
    let a = world.add_vehicle(Position::zeros(), Some(TriggerCause::CrashIncident)).unwrap();
    let b = world.add_vehicle(Position::new(-700.0, 0.0), None).unwrap();
    let satellite = InfrastructureProfile::satellite().with_reliability(1.0);
    let r1 = world.add_relay(&satellite, Position::new(-300.0, 20.0)).unwrap();
    let r2 = world.add_relay(&satellite, Position::new(-300.0, -20.0)).unwrap();
    
    world.apply_storyboard(&Storyboard::crash(a, SimTime::from_secs_f64(1.0)));
    world.run_until(SimTime::from_secs_f64(5.0));
    
    for r in [r1, r2] {
        let stats = world.station(r).unwrap().agent().relay().unwrap().stats();
        // Original from A, then the other satellite's copy which is ignored
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.relayed_copies, 1);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.relayed, 1);
    }
    
    let receiver_b = world.station(b).unwrap().agent().receiver().unwrap();
    assert_eq!(receiver_b.received_count(), 2);
    assert_eq!(receiver_b.first_reception().unwrap().delay, Duration::from_millis(45));
}

#[test]
fn test_single_infrastructure_hop() {
    let mut world = still_world();
    let a = world.add_vehicle(Position::zeros(), Some(TriggerCause::CrashIncident)).unwrap();
    let b = world.add_vehicle(Position::new(-1500.0, 0.0), None).unwrap();
    let satellite = world
        .add_relay(&InfrastructureProfile::satellite().with_reliability(1.0), Position::new(-100.0, 0.0))
        .unwrap();
    // Out of A's range, only hears the satellite's copy
    let antenna = world
        .add_relay(&InfrastructureProfile::terrestrial().with_reliability(1.0), Position::new(-1200.0, 20.0))
        .unwrap();
    
    world.apply_storyboard(&Storyboard::crash(a, SimTime::from_secs_f64(1.0)));
    world.run_until(SimTime::from_secs_f64(5.0));
    
    let sat_relay = world.station(satellite).unwrap().agent().relay().unwrap();
    assert_eq!(sat_relay.relayed_count(), 1);
    assert!(sat_relay.cloud_delivery().is_some());
    
    let antenna_relay = world.station(antenna).unwrap().agent().relay().unwrap();
    assert_eq!(antenna_relay.relayed_count(), 0);
    assert!(antenna_relay.cloud_delivery().is_none());
    assert_eq!(antenna_relay.stats().accepted, 0);
    assert_eq!(antenna_relay.stats().relayed_copies, 1);
    
    let receiver_b = world.station(b).unwrap().agent().receiver().unwrap();
    assert_eq!(receiver_b.received_count(), 1);
    assert_eq!(receiver_b.first_reception().unwrap().relay_origin, "satellite");
    
    let report = world.finish();
    assert_eq!(report.scalars.get("antenna[0].relay", names::DENMS_RELAYED), Some(0.0));
    assert_eq!(report.scalars.get("antenna[0].relay", names::CLOUD_RECEIVED_FLAG), Some(0.0));
    assert_eq!(report.scalars.get("satellite[0].relay", names::CLOUD_RECEIVED_FLAG), Some(1.0));
    assert_eq!(DisseminationSummary::from_scalars(&report.scalars).cloud_latency.count, 1);
}

#[test]
fn test_same_seed_same_scalars() {
    let run = || {
        ScenarioRunner::new(2024)
            .with_vehicles(12)
            .run(ScenarioId::WitnessHybrid)
            .unwrap()
    };
    let first = run();
    let second = run();
    
    assert!(first.passed, "{:?}", first.failure_reason);
    assert_eq!(first.scalars, second.scalars);
    assert_eq!(first.events_processed, second.events_processed);
}

#[test]
fn test_witness_delay_shifts_event_time() {
    let result = ScenarioRunner::new(9)
        .with_vehicles(6)
        .with_witness_delay(1.5)
        .run(ScenarioId::WitnessTerrestrial)
        .unwrap();
    
    assert!(result.passed, "{:?}", result.failure_reason);
    assert_relative_eq!(
        result.scalars.get("node[1].originator", names::DENM_EVENT_TIME).unwrap(),
        201.5,
        epsilon = 1e-9
    );
    assert_eq!(result.scalars.get("node[0].originator", names::DENM_EVENT_TIME), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]
    
    #[test]
    fn prop_invariants_hold_for_any_seed(seed in any::<u64>(), vehicles in 2usize..10) {
        let result = ScenarioRunner::new(seed)
            .with_vehicles(vehicles)
            .run(ScenarioId::CrashedHybrid)
            .unwrap();
        prop_assert!(result.passed, "{:?}", result.failure_reason);
        prop_assert_eq!(result.summary.denms_sent, 1);
    }
}
