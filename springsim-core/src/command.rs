//! Text commands accepted by a [`SimulationState`](crate::runtime::SimulationState)
//!
//! Indices in every command are 0-based.

use crate::integrator::IntegrationMethod;
use glam::Vec3;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add point x y z tx ty tz`
    AddPoint { position: Vec3, tangent: Vec3 },
    /// `set point i x y z`
    SetPoint { index: usize, position: Vec3 },
    /// `set tangent i x y z`
    SetTangent { index: usize, tangent: Vec3 },
    /// `create particles n`
    CreateParticles(usize),
    /// `create springs n`
    CreateSprings(usize),
    /// `particle i mass px py pz vx vy vz`
    Particle {
        index: usize,
        mass: f32,
        position: Vec3,
        velocity: Vec3,
    },
    /// `all_velocities vx vy vz`
    AllVelocities(Vec3),
    /// `link s p1 p2 ks kd rest`
    Link {
        spring: usize,
        p1: usize,
        p2: usize,
        ks: f32,
        kd: f32,
        rest_length: f32,
    },
    /// `ground elasticity viscosity`
    Ground { elasticity: f32, viscosity: f32 },
    /// `gravity g`
    Gravity(f32),
    /// `integration {euler|symplectic|verlet} dt`
    Integration { method: IntegrationMethod, dt: f32 },
    /// `friction mu_s mu_k`
    Friction {
        static_friction: f32,
        kinetic_friction: f32,
    },
    /// `drive i [speed]`, speed defaulting to the configured one
    Drive { index: usize, speed: Option<f32> },
}

struct V(Vec3);

impl fmt::Display for V {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0.x, self.0.y, self.0.z)
    }
}

/// Prints the command back in script syntax
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::AddPoint { position, tangent } => {
                write!(f, "add point {} {}", V(*position), V(*tangent))
            }
            Command::SetPoint { index, position } => write!(f, "set point {index} {}", V(*position)),
            Command::SetTangent { index, tangent } => {
                write!(f, "set tangent {index} {}", V(*tangent))
            }
            Command::CreateParticles(n) => write!(f, "create particles {n}"),
            Command::CreateSprings(n) => write!(f, "create springs {n}"),
            Command::Particle {
                index,
                mass,
                position,
                velocity,
            } => write!(f, "particle {index} {mass} {} {}", V(*position), V(*velocity)),
            Command::AllVelocities(v) => write!(f, "all_velocities {}", V(*v)),
            Command::Link {
                spring,
                p1,
                p2,
                ks,
                kd,
                rest_length,
            } => write!(f, "link {spring} {p1} {p2} {ks} {kd} {rest_length}"),
            Command::Ground {
                elasticity,
                viscosity,
            } => write!(f, "ground {elasticity} {viscosity}"),
            Command::Gravity(g) => write!(f, "gravity {g}"),
            Command::Integration { method, dt } => write!(f, "integration {method} {dt}"),
            Command::Friction {
                static_friction,
                kinetic_friction,
            } => write!(f, "friction {static_friction} {kinetic_friction}"),
            Command::Drive { index, speed: Some(speed) } => write!(f, "drive {index} {speed}"),
            Command::Drive { index, speed: None } => write!(f, "drive {index}"),
        }
    }
}
