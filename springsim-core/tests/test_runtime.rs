//! Frame clock, snapshots, and whole-scene runs

use glam::Vec3;
use springsim_core::tests::test_helpers::{approx_eq_f32, load_script, positions, run_steps};
use springsim_core::{SimulationConfig, SimulationState};

#[test]
fn test_frame_clock_substeps() {
    let mut state = SimulationState::default();
    assert!(approx_eq_f32(state.dt(), 0.001, 1e-9));

    // 16.67 ms of frame covers 16 whole 1 ms steps
    assert_eq!(state.advance_frame(1.0 / 60.0), 16);
    // The remainder carries into the next frame
    assert_eq!(state.advance_frame(1.0 / 60.0), 17);
    assert!(approx_eq_f32(state.time(), 0.033, 1e-5));
}

#[test]
fn test_frame_clock_clamps_long_frames() {
    let mut state = SimulationState::default();
    // A one-second stall only simulates max_frame_dt
    assert_eq!(state.advance_frame(1.0), 33);
    assert_eq!(state.advance_frame(-1.0), 0);
}

#[test]
fn test_custom_config() {
    let config = SimulationConfig {
        gravity: 1.0,
        dt: 0.01,
        max_frame_dt: 0.105,
        ..SimulationConfig::default()
    };
    let mut state = SimulationState::new(config);
    assert_eq!(state.system.gravity, Vec3::new(0.0, -1.0, 0.0));
    assert_eq!(state.advance_frame(0.5), 10);
    assert!(state.set_dt(0.0).is_err());
    assert!(state.set_dt(f32::NAN).is_err());
}

#[test]
fn test_snapshot_contents() {
    let (mut state, report) = load_script("chain.sim").unwrap();
    assert!(!report.has_errors() && !report.has_warnings(), "{:?}", report);
    run_steps(&mut state, 10);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.particles.len(), 8);
    assert_eq!(snapshot.springs.len(), 7);
    assert_eq!(snapshot.curve.len(), 1001);
    assert!(snapshot.particles[0].driven);
    assert!(snapshot.particles[1..].iter().all(|p| !p.driven));
    assert!(approx_eq_f32(snapshot.time, 0.01, 1e-6));

    for segment in &snapshot.springs {
        let s = state.system.spring(segment.index).unwrap();
        assert_eq!(segment.a, state.system.particle(s.a).unwrap().position);
        assert_eq!(segment.b, state.system.particle(s.b).unwrap().position);
    }
}

#[test]
fn test_empty_state_snapshot() {
    let state = SimulationState::default();
    let snapshot = state.snapshot();
    assert!(snapshot.particles.is_empty());
    assert!(snapshot.springs.is_empty());
    assert!(snapshot.curve.is_empty());
}

#[test]
fn test_chain_stays_bounded() {
    let (mut state, _) = load_script("chain.sim").unwrap();
    for _ in 0..300 {
        state.advance_frame(1.0 / 60.0);
    }

    assert!(state.system.is_finite());
    state.system.validate_topology().unwrap();
    for (_, spring) in state.system.springs() {
        let a = state.system.particle(spring.a).unwrap().position;
        let b = state.system.particle(spring.b).unwrap().position;
        assert!(a.distance(b) < 5.0, "spring stretched to {}", a.distance(b));
    }
    // Nothing left below the ground once contact has been resolved
    for (index, p) in state.system.particles() {
        assert!(p.position.y > -0.1, "particle {} at {}", index, p.position);
    }
    // The top of the chain rides the curve
    let driver = state.system.driven().unwrap();
    assert_eq!(state.system.particle(0).unwrap().position, state.spline.position(driver.phase));
}

#[test]
fn test_same_script_same_result() {
    let (mut first, _) = load_script("chain.sim").unwrap();
    let (mut second, _) = load_script("chain.sim").unwrap();
    run_steps(&mut first, 2000);
    run_steps(&mut second, 2000);
    assert_eq!(positions(&first), positions(&second));
}

#[test]
fn test_spring_scene_oscillates() {
    let (mut state, _) = load_script("spring.sim").unwrap();
    let rest = state.system.spring(0).unwrap().rest_length();
    run_steps(&mut state, 3000);

    let p = positions(&state);
    let gap = p[0].distance(p[1]);
    assert!((gap - rest).abs() < 1.0, "gap {}", gap);
    // No gravity in this scene, so the centre of mass stays at height 4
    assert!(approx_eq_f32((p[0].y + p[1].y) / 2.0, 4.0, 1e-4));
}

#[test]
fn test_speed_multiplier_beyond_frame_clamp() {
    let mut fast = SimulationState::default();
    // Four times a 60 Hz frame is past max_frame_dt, but still runs in full
    assert_eq!(fast.advance_scaled(1.0 / 60.0, 4.0), 66);
    assert!(approx_eq_f32(fast.time(), 0.066, 1e-5));

    let mut slow = SimulationState::default();
    assert_eq!(slow.advance_scaled(1.0 / 60.0, 0.5), 8);

    // A stalled frame is still clamped before scaling
    let mut stalled = SimulationState::default();
    assert_eq!(stalled.advance_scaled(1.0, 1.0), 33);
    assert_eq!(stalled.advance_scaled(1.0 / 60.0, -2.0), 0);
}
