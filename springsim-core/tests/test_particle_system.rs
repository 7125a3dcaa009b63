//! Topology edits and step ordering of the particle system

use glam::Vec3;
use springsim_core::tests::test_helpers::{approx_eq_f32, approx_eq_vec3};
use springsim_core::{
    HermiteSpline, IndexKind, IntegrationMethod, Particle, ParticleSystem, SimError,
    SimulationConfig,
};

fn system_with(n: usize) -> ParticleSystem {
    let mut system = ParticleSystem::new();
    system.create_particles(n);
    for i in 0..n {
        system
            .set_particle(i, 1.0, Vec3::new(i as f32, 5.0, 0.0), Vec3::ZERO)
            .unwrap();
    }
    system
}

#[test]
fn test_create_particles_uses_defaults() {
    let mut system = ParticleSystem::new();
    system.create_particles(3);
    assert_eq!(system.particle_slots(), 3);
    for (_, p) in system.particles() {
        assert_eq!(p, &Particle::default());
        assert_eq!(p.mass, 1.0);
    }

    // Reset semantics
    system.create_particles(1);
    assert_eq!(system.particle_slots(), 1);
}

#[test]
fn test_create_springs_reserves_vacant_slots() {
    let mut system = system_with(2);
    system.create_springs(3);
    assert_eq!(system.spring_slots(), 3);
    assert_eq!(system.springs().count(), 0);

    system.create_springs(2);
    assert_eq!(system.spring_slots(), 5);
}

#[test]
fn test_link_fills_slot_or_appends() {
    let mut system = system_with(3);
    system.create_springs(2);

    system.link(1, 0, 1, 10.0, 1.0, 1.0).unwrap();
    assert!(system.spring(0).is_none());
    assert_eq!(system.spring(1).unwrap().a, 0);

    // Overwrites an existing slot
    system.link(1, 1, 2, 3.0, 0.0, 2.0).unwrap();
    assert_eq!(system.spring(1).unwrap().a, 1);
    assert_eq!(system.spring(1).unwrap().ks, 3.0);

    // Next index past the end appends
    system.link(2, 0, 2, 10.0, 1.0, 1.0).unwrap();
    assert_eq!(system.spring_slots(), 3);

    let err = system.link(7, 0, 2, 10.0, 1.0, 1.0).unwrap_err();
    assert!(matches!(
        err,
        SimError::IndexOutOfRange { kind: IndexKind::Spring, index: 7, len: 3 }
    ));
    assert_eq!(system.spring_slots(), 3);
}

#[test]
fn test_link_rejects_bad_particle() {
    let mut system = system_with(2);
    let err = system.link(0, 0, 2, 10.0, 1.0, 1.0).unwrap_err();
    assert!(matches!(
        err,
        SimError::IndexOutOfRange { kind: IndexKind::Particle, index: 2, .. }
    ));
    assert_eq!(system.spring_slots(), 0);
}

#[test]
fn test_link_negative_rest_takes_distance() {
    let mut system = system_with(3);
    system.link(0, 0, 2, 10.0, 1.0, -1.0).unwrap();
    assert!(approx_eq_f32(system.spring(0).unwrap().rest_length(), 2.0, 1e-6));
}

#[test]
fn test_recreating_particles_drops_dangling_springs() {
    let mut system = system_with(3);
    system.link(0, 0, 1, 10.0, 1.0, 1.0).unwrap();
    system.link(1, 1, 2, 10.0, 1.0, 1.0).unwrap();

    system.create_particles(2);
    assert!(system.spring(0).is_some());
    assert!(system.spring(1).is_none());
    assert_eq!(system.spring_slots(), 2);
    system.validate_topology().unwrap();
}

#[test]
fn test_remove_particle_leaves_hole() {
    let mut system = system_with(3);
    system.link(0, 0, 1, 10.0, 1.0, 1.0).unwrap();
    system.link(1, 0, 2, 10.0, 1.0, 1.0).unwrap();

    let removed = system.remove_particle(1).unwrap();
    assert_eq!(removed.position, Vec3::new(1.0, 5.0, 0.0));
    assert_eq!(system.particle_slots(), 3);
    assert!(system.particle(1).is_none());
    assert_eq!(system.particle(2).unwrap().position, Vec3::new(2.0, 5.0, 0.0));
    assert!(system.spring(0).is_none());
    assert!(system.spring(1).is_some());
    system.validate_topology().unwrap();

    assert!(system.remove_particle(1).is_err());
    assert!(system.link(2, 1, 2, 1.0, 0.0, 1.0).is_err());
}

#[test]
fn test_set_particle_validation() {
    let mut system = system_with(1);
    assert!(matches!(
        system.set_particle(0, 0.0, Vec3::ZERO, Vec3::ZERO),
        Err(SimError::InvalidParameter(_))
    ));
    assert!(matches!(
        system.set_particle(4, 1.0, Vec3::ZERO, Vec3::ZERO),
        Err(SimError::IndexOutOfRange { kind: IndexKind::Particle, index: 4, len: 1 })
    ));
    assert_eq!(system.particle(0).unwrap().position, Vec3::new(0.0, 5.0, 0.0));
}

#[test]
fn test_all_velocities() {
    let mut system = system_with(4);
    system.set_all_velocities(Vec3::new(1.0, 2.0, 3.0));
    assert!(system.particles().all(|(_, p)| p.velocity == Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_gravity_and_ground_parameters() {
    let mut system = ParticleSystem::new();
    system.set_gravity(3.0);
    assert_eq!(system.gravity, Vec3::new(0.0, -3.0, 0.0));

    system.contact = None;
    system.set_ground(10.0, 2.0);
    system.set_friction(0.4, 0.2);
    let contact = system.contact.unwrap();
    assert_eq!(contact.elasticity, 10.0);
    assert_eq!(contact.viscosity, 2.0);
    assert_eq!(contact.static_friction, 0.4);
    assert_eq!(contact.kinetic_friction, 0.2);
    assert_eq!(contact.restitution, 0.8);
}

#[test]
fn test_update_integrates_sum_of_forces() {
    let mut system = ParticleSystem::new();
    system.contact = None;
    system.set_integration(IntegrationMethod::SymplecticEuler);
    system.add_particle(Particle::new(2.0, Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO)).unwrap();
    system.add_particle(Particle::new(2.0, Vec3::new(3.0, 5.0, 0.0), Vec3::ZERO)).unwrap();
    system.link(0, 0, 1, 4.0, 0.0, 1.0).unwrap();

    let dt = 0.01;
    system.update(dt);

    // Spring pulls with 4 * 2 = 8, gravity adds m*g; both divided by m = 2
    let expected = Vec3::new(4.0, -9.81, 0.0) * dt;
    let p0 = system.particle(0).unwrap();
    assert!(approx_eq_vec3(p0.velocity, expected, 1e-5), "v = {}", p0.velocity);
    assert_eq!(p0.force, Vec3::ZERO);
    assert_eq!(p0.acceleration, Vec3::ZERO);
    assert!(approx_eq_f32(system.time(), dt, 1e-9));
}

#[test]
fn test_driven_particle_follows_curve() {
    let mut spline = HermiteSpline::new();
    spline.add_point(Vec3::new(0.0, 5.0, 0.0), Vec3::new(4.0, 0.0, 0.0)).unwrap();
    spline.add_point(Vec3::new(4.0, 5.0, 0.0), Vec3::new(4.0, 0.0, 0.0)).unwrap();

    let mut system = system_with(2);
    system.link(0, 0, 1, 10.0, 1.0, -1.0).unwrap();
    system.set_driven(0, 0.5).unwrap();

    let dt = 0.01;
    for _ in 0..50 {
        system.advance_driver(&spline, dt);
        system.update(dt);
    }

    let driver = system.driven().unwrap();
    assert!(approx_eq_f32(driver.phase, 0.25, 1e-4));
    let p0 = system.particle(0).unwrap();
    assert!(approx_eq_vec3(p0.position, spline.position(driver.phase), 1e-6));
    // No gravity on the driven particle: it stays on the curve
    assert!(approx_eq_f32(p0.position.y, 5.0, 1e-5));
    // Velocity matches the curve speed along x (4 units per unit t, 0.5 t/s)
    assert!(approx_eq_f32(p0.velocity.x, 2.0, 1e-2), "vx = {}", p0.velocity.x);
    // The other particle fell under gravity
    assert!(system.particle(1).unwrap().position.y < 5.0);
}

#[test]
fn test_driver_phase_wraps() {
    let mut spline = HermiteSpline::new();
    spline.add_point(Vec3::ZERO, Vec3::X).unwrap();
    spline.add_point(Vec3::X, Vec3::X).unwrap();
    let mut system = system_with(1);
    system.set_driven(0, 1.0).unwrap();

    for _ in 0..15 {
        system.advance_driver(&spline, 0.1);
    }
    let phase = system.driven().unwrap().phase;
    assert!((0.0..1.0).contains(&phase));
    assert!(approx_eq_f32(phase, 0.5, 1e-4), "phase = {}", phase);
}

#[test]
fn test_driving_missing_particle_rejected() {
    let mut system = system_with(1);
    assert!(system.set_driven(3, 0.1).is_err());
    assert!(system.driven().is_none());

    system.set_driven(0, 0.1).unwrap();
    system.create_particles(0);
    assert!(system.driven().is_none());
}

#[test]
fn test_driving_off_curve_particle_does_not_kick_neighbours() {
    let mut spline = HermiteSpline::new();
    spline.add_point(Vec3::new(10.0, 5.0, 0.0), Vec3::X).unwrap();
    spline.add_point(Vec3::new(11.0, 5.0, 0.0), Vec3::X).unwrap();

    let mut system = ParticleSystem::new();
    system.set_gravity(0.0);
    system.create_particles(2);
    system.set_particle(0, 1.0, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO).unwrap();
    system.set_particle(1, 1.0, Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO).unwrap();
    system.link(0, 0, 1, 10.0, 1.0, 1.0).unwrap();
    system.set_driven(0, 0.1).unwrap();

    let dt = 0.001;
    system.advance_driver(&spline, dt);
    system.update(dt);

    // The first advance only snaps onto the curve
    let driven = system.particle(0).unwrap();
    assert_eq!(driven.velocity, Vec3::ZERO);
    assert!(approx_eq_vec3(driven.position, Vec3::new(10.0, 5.0, 0.0), 1e-3));
    let neighbour = system.particle(1).unwrap().velocity;
    assert!(neighbour.length() < 1.0, "neighbour v = {}", neighbour);

    // Later advances move along the curve at speed * |dP/dt|
    system.advance_driver(&spline, dt);
    let driven = system.particle(0).unwrap();
    assert!(approx_eq_f32(driven.velocity.x, 0.1, 1e-2), "vx = {}", driven.velocity.x);
    assert!(approx_eq_f32(driven.velocity.y, 0.0, 1e-3));
}

#[test]
fn test_reenabled_ground_keeps_configured_material() {
    let config = SimulationConfig {
        restitution: 0.5,
        static_friction: 0.3,
        kinetic_friction: 0.1,
        ..SimulationConfig::default()
    };
    let mut system = ParticleSystem::with_config(&config);
    system.contact = None;
    system.set_ground(100.0, 1.0);

    let contact = system.contact.unwrap();
    assert_eq!(contact.elasticity, 100.0);
    assert_eq!(contact.restitution, 0.5);
    assert_eq!(contact.static_friction, 0.3);
    assert_eq!(contact.kinetic_friction, 0.1);

    system.contact = None;
    system.set_friction(0.7, 0.6);
    let contact = system.contact.unwrap();
    assert_eq!(contact.restitution, 0.5);
    assert_eq!(contact.elasticity, 0.0);
}
