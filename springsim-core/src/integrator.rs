use crate::engine::Particle;
use std::fmt;
use std::str::FromStr;

/// Explicit integration scheme shared by every particle of a system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    #[default]
    ExplicitEuler,
    SymplecticEuler,
    VelocityVerlet,
}

/// Advances one particle by `dt` and clears its accumulators
pub type IntegrateFn = fn(&mut Particle, f32);

impl IntegrationMethod {
    pub fn integrator(self) -> IntegrateFn {
        match self {
            IntegrationMethod::ExplicitEuler => explicit_euler,
            IntegrationMethod::SymplecticEuler => symplectic_euler,
            IntegrationMethod::VelocityVerlet => velocity_verlet,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            IntegrationMethod::ExplicitEuler => "euler",
            IntegrationMethod::SymplecticEuler => "symplectic",
            IntegrationMethod::VelocityVerlet => "verlet",
        }
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for IntegrationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euler" => Ok(IntegrationMethod::ExplicitEuler),
            "symplectic" => Ok(IntegrationMethod::SymplecticEuler),
            "verlet" => Ok(IntegrationMethod::VelocityVerlet),
            other => Err(format!(
                "unknown integration method '{other}' (expected euler, symplectic or verlet)"
            )),
        }
    }
}

/// Forward Euler: position moves with the velocity from before this step
pub fn explicit_euler(particle: &mut Particle, dt: f32) {
    particle.position += particle.velocity * dt;
    particle.velocity += particle.acceleration * dt;
    particle.clear_accumulators();
}

/// Semi-implicit Euler: v += a*dt, then x += v*dt
pub fn symplectic_euler(particle: &mut Particle, dt: f32) {
    particle.velocity += particle.acceleration * dt;
    particle.position += particle.velocity * dt;
    particle.clear_accumulators();
}

/// Velocity Verlet without a mid-step force evaluation, so the acceleration at
/// the end of the step is the one at the start.
pub fn velocity_verlet(particle: &mut Particle, dt: f32) {
    let a_old = particle.acceleration;
    particle.position += particle.velocity * dt + a_old * (0.5 * dt * dt);
    let a_new = particle.acceleration;
    particle.velocity += (a_old + a_new) * (0.5 * dt);
    particle.clear_accumulators();
}
