use crate::command::Command;
use crate::config::SimulationConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, SourceLocation};
use crate::engine::ParticleSystem;
use crate::error::{SimError, SimResult};
use crate::parser::{parse_command, parse_script};
use crate::spline::HermiteSpline;
use glam::Vec3;

/// Number of segments in the curve polyline handed to renderers
pub const CURVE_SAMPLES: usize = 1000;

/// Everything one simulation owns: the curve, the particles, and the clock
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub spline: HermiteSpline,
    pub system: ParticleSystem,
    pub config: SimulationConfig,
    /// Sub-step size used by [`advance_frame`](Self::advance_frame)
    dt: f32,
    /// Frame time not yet covered by whole sub-steps
    pending: f32,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// Particle as seen by a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    pub index: usize,
    pub position: Vec3,
    pub mass: f32,
    pub driven: bool,
}

/// Endpoints of one spring
#[derive(Debug, Clone, PartialEq)]
pub struct SpringSegment {
    pub index: usize,
    pub a: Vec3,
    pub b: Vec3,
}

/// Owned copy of everything a renderer draws for one frame
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub time: f32,
    pub particles: Vec<ParticleState>,
    pub springs: Vec<SpringSegment>,
    pub curve: Vec<Vec3>,
}

impl SimulationState {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            spline: HermiteSpline::new(),
            system: ParticleSystem::with_config(&config),
            dt: config.dt,
            pending: 0.0,
            config,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn set_dt(&mut self, dt: f32) -> SimResult<()> {
        if dt > 0.0 && dt.is_finite() {
            self.dt = dt;
            Ok(())
        } else {
            Err(SimError::InvalidParameter(format!(
                "timestep must be positive, got {dt}"
            )))
        }
    }

    /// Apply one command, returning a human-readable summary of what it did
    pub fn apply(&mut self, command: &Command) -> SimResult<String> {
        match *command {
            Command::AddPoint { position, tangent } => {
                self.spline.add_point(position, tangent)?;
                Ok(format!(
                    "Point added: {position}, tangent: {tangent} ({} points)",
                    self.spline.len()
                ))
            }
            Command::SetPoint { index, position } => {
                self.spline.set_point(index, position)?;
                Ok(format!("Point {index} set to {position}"))
            }
            Command::SetTangent { index, tangent } => {
                self.spline.set_tangent(index, tangent)?;
                Ok(format!("Tangent {index} set to {tangent}"))
            }
            Command::CreateParticles(n) => {
                self.system.create_particles(n);
                Ok(format!("Created {n} particles"))
            }
            Command::CreateSprings(n) => {
                self.system.create_springs(n);
                Ok(format!("Created {n} springs"))
            }
            Command::Particle {
                index,
                mass,
                position,
                velocity,
            } => {
                self.system.set_particle(index, mass, position, velocity)?;
                Ok(format!(
                    "Particle {index}: mass {mass}, position {position}, velocity {velocity}"
                ))
            }
            Command::AllVelocities(velocity) => {
                self.system.set_all_velocities(velocity);
                Ok(format!("All velocities set to {velocity}"))
            }
            Command::Link {
                spring,
                p1,
                p2,
                ks,
                kd,
                rest_length,
            } => {
                self.system.link(spring, p1, p2, ks, kd, rest_length)?;
                let rest = self
                    .system
                    .spring(spring)
                    .map_or(rest_length, |s| s.rest_length());
                Ok(format!(
                    "Linked particles {p1} and {p2} with spring {spring} (ks {ks}, kd {kd}, rest {rest})"
                ))
            }
            Command::Ground {
                elasticity,
                viscosity,
            } => {
                self.system.set_ground(elasticity, viscosity);
                Ok(format!("Ground elasticity {elasticity}, viscosity {viscosity}"))
            }
            Command::Gravity(g) => {
                self.system.set_gravity(g);
                Ok(format!("Gravity {}", self.system.gravity))
            }
            Command::Integration { method, dt } => {
                self.set_dt(dt)?;
                self.system.set_integration(method);
                Ok(format!("Integration {method}, dt {dt}"))
            }
            Command::Friction {
                static_friction,
                kinetic_friction,
            } => {
                self.system.set_friction(static_friction, kinetic_friction);
                Ok(format!(
                    "Friction static {static_friction}, kinetic {kinetic_friction}"
                ))
            }
            Command::Drive { index, speed } => {
                let speed = speed.unwrap_or(self.config.drive_speed);
                self.system.set_driven(index, speed)?;
                Ok(format!("Particle {index} driven along the spline at {speed}/s"))
            }
        }
    }

    /// Parse and apply a single command line
    pub fn apply_line(&mut self, line: &str) -> SimResult<String> {
        let command = parse_command(line)?;
        self.apply(&command)
    }

    /// Advance by one fixed sub-step, moving the driven particle first
    pub fn step(&mut self) {
        self.system.advance_driver(&self.spline, self.dt);
        self.system.update(self.dt);
    }

    /// Simulate one display frame of `frame_dt` seconds, clamped to
    /// `max_frame_dt`. Returns how many sub-steps ran; the leftover carries
    /// over to the next frame.
    pub fn advance_frame(&mut self, frame_dt: f32) -> usize {
        self.pending += frame_dt.clamp(0.0, self.config.max_frame_dt);
        let mut steps = 0;
        while self.pending >= self.dt {
            self.step();
            self.pending -= self.dt;
            steps += 1;
        }
        steps
    }

    /// Simulate a frame of `frame_dt` wall-clock seconds at `speed` times
    /// real time. The frame is clamped like in
    /// [`advance_frame`](Self::advance_frame), then the scaled time runs in
    /// slices no longer than `max_frame_dt`.
    pub fn advance_scaled(&mut self, frame_dt: f32, speed: f32) -> usize {
        let max = self.config.max_frame_dt;
        if max <= 0.0 {
            return 0;
        }
        let mut remaining = frame_dt.clamp(0.0, max) * speed.max(0.0);
        let mut steps = 0;
        while remaining > 0.0 {
            let slice = remaining.min(max);
            steps += self.advance_frame(slice);
            remaining -= slice;
        }
        steps
    }

    pub fn time(&self) -> f32 {
        self.system.time()
    }

    pub fn snapshot(&self) -> Snapshot {
        let driven = self.system.driven().map(|d| d.index);
        let particles = self
            .system
            .particles()
            .map(|(index, p)| ParticleState {
                index,
                position: p.position,
                mass: p.mass,
                driven: Some(index) == driven,
            })
            .collect();
        let springs = self
            .system
            .springs()
            .filter_map(|(index, s)| {
                let a = self.system.particle(s.a)?.position;
                let b = self.system.particle(s.b)?.position;
                Some(SpringSegment { index, a, b })
            })
            .collect();

        Snapshot {
            time: self.time(),
            particles,
            springs,
            curve: if self.spline.is_empty() {
                Vec::new()
            } else {
                self.spline.sample_polyline(CURVE_SAMPLES)
            },
        }
    }
}

/// Apply every command of `source` to `state`. Bad lines and rejected
/// operations are reported and skipped; the rest of the script still runs.
pub fn run_script(state: &mut SimulationState, source: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for line in parse_script(source) {
        let location = Some(SourceLocation { line: line.line });
        let command = match line.command {
            Ok(command) => command,
            Err(err) => {
                diagnostics.push(Diagnostic::error(err.to_string(), location));
                continue;
            }
        };
        match state.apply(&command) {
            Ok(summary) => diagnostics.push(Diagnostic::info(summary, location)),
            Err(err) => diagnostics.push(Diagnostic::warning(
                format!("{}: {}", line.text, err),
                location,
            )),
        }
    }

    ftlog::info!(
        "script applied: {} commands, {} control points, {} particle slots, {} spring slots",
        diagnostics.len(),
        state.spline.len(),
        state.system.particle_slots(),
        state.system.spring_slots()
    );
    diagnostics
}

/// Build a fresh state from a script
pub fn build_simulation_from_source(
    source: &str,
    config: SimulationConfig,
) -> (SimulationState, Diagnostics) {
    let mut state = SimulationState::new(config);
    let diagnostics = run_script(&mut state, source);
    (state, diagnostics)
}
