//! Tunable simulation constants

use crate::integrator::IntegrationMethod;

/// Defaults for a fresh [`SimulationState`](crate::runtime::SimulationState)
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Magnitude of gravity along -Y
    pub gravity: f32,
    pub restitution: f32,
    pub static_friction: f32,
    pub kinetic_friction: f32,
    /// Fixed sub-step size in seconds
    pub dt: f32,
    /// Longest wall-clock frame the frame clock will simulate
    pub max_frame_dt: f32,
    /// Spline parameter advanced per second by a driven particle
    pub drive_speed: f32,
    pub method: IntegrationMethod,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            restitution: 0.8,
            static_friction: 0.9,
            kinetic_friction: 0.5,
            dt: 1.0 / 1000.0,
            max_frame_dt: 1.0 / 30.0,
            drive_speed: 0.1,
            method: IntegrationMethod::ExplicitEuler,
        }
    }
}
