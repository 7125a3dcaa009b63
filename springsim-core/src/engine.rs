use crate::arena::SlotArena;
use crate::config::SimulationConfig;
use crate::error::{IndexKind, SimError, SimResult};
use crate::integrator::IntegrationMethod;
use crate::spline::HermiteSpline;
use glam::Vec3;

/// The ground plane passes through this point
pub const GROUND_POINT: Vec3 = Vec3::ZERO;
/// Upward ground normal
pub const GROUND_NORMAL: Vec3 = Vec3::Y;

/// A point mass in the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub mass: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Sum of the forces applied since the last integration
    pub force: Vec3,
    /// `force / mass`, kept in step with every `apply_force`
    pub acceleration: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(1.0, Vec3::ZERO, Vec3::ZERO)
    }
}

impl Particle {
    pub fn new(mass: f32, position: Vec3, velocity: Vec3) -> Self {
        Self {
            mass,
            position,
            velocity,
            force: Vec3::ZERO,
            acceleration: Vec3::ZERO,
        }
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
        self.acceleration = self.force / self.mass;
    }

    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
    }

    /// Advance by `dt` with the given scheme
    pub fn integrate(&mut self, method: IntegrationMethod, dt: f32) {
        (method.integrator())(self, dt);
    }

    /// Signed distance to the ground plane, negative when below it
    pub fn ground_distance(&self) -> f32 {
        (self.position - GROUND_POINT).dot(GROUND_NORMAL)
    }

    /// Penalty forces against the ground, plus position and velocity
    /// correction when the particle is below it.
    ///
    /// Must run after every other force of the step has been applied: the
    /// friction split reads the accumulated force.
    pub fn resolve_ground_contact(&mut self, contact: &GroundContact) {
        let n = GROUND_NORMAL;
        let distance = self.ground_distance();
        let normal_speed = self.velocity.dot(n);
        let tangential_velocity = self.velocity - n * normal_speed;
        let normal_load = (-self.force.dot(n)).max(0.0);

        let penalty = n * (contact.elasticity * distance.max(0.0));
        let damping = n * (contact.viscosity * normal_speed);
        self.apply_force(penalty - damping);

        if distance >= 0.0 {
            return;
        }

        self.position += n * -distance;
        self.velocity -= n * (normal_speed * (1.0 + contact.restitution));

        if tangential_velocity.length() <= 0.0 {
            return;
        }

        let tangential_force = self.force - n * self.force.dot(n);
        let threshold = contact.static_friction * normal_load;
        if tangential_force.length() < threshold {
            let factor = tangential_force.length() / threshold;
            self.velocity = n * self.velocity.dot(n) + tangential_velocity * factor;
            let normal_accel = n * self.acceleration.dot(n);
            self.acceleration = normal_accel + (self.acceleration - normal_accel) * factor;
        } else {
            let direction = -tangential_velocity.normalize();
            self.apply_force(direction * (contact.kinetic_friction * normal_load));
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Ground plane material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub elasticity: f32,
    pub viscosity: f32,
    pub static_friction: f32,
    pub kinetic_friction: f32,
    pub restitution: f32,
}

impl GroundContact {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            elasticity: 0.0,
            viscosity: 0.0,
            static_friction: config.static_friction,
            kinetic_friction: config.kinetic_friction,
            restitution: config.restitution,
        }
    }
}

impl Default for GroundContact {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Damped Hookean spring between two particles of the same system
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
    pub ks: f32,
    pub kd: f32,
    rest_length: f32,
}

impl Spring {
    /// A negative `rest_length` is replaced by the current distance between
    /// the endpoints.
    pub fn new(a: usize, b: usize, ks: f32, kd: f32, rest_length: f32, pa: &Particle, pb: &Particle) -> Self {
        let rest_length = if rest_length < 0.0 {
            pa.position.distance(pb.position)
        } else {
            rest_length
        };
        Self {
            a,
            b,
            ks,
            kd,
            rest_length,
        }
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Force on endpoint `a`; endpoint `b` receives the negation
    pub fn force(&self, pa: &Particle, pb: &Particle) -> Vec3 {
        let delta = pb.position - pa.position;
        let direction = delta.normalize_or_zero();
        let stretch = delta.length() - self.rest_length;
        let closing_speed = (pb.velocity - pa.velocity).dot(direction);
        direction * (self.ks * stretch + self.kd * closing_speed)
    }

    /// Accumulate the spring force into both endpoints.
    ///
    /// `Err` carries the index of an endpoint that is not in `particles`.
    pub fn apply_spring_force(&self, particles: &mut SlotArena<Particle>) -> Result<(), usize> {
        for endpoint in [self.a, self.b] {
            if !particles.contains(endpoint) {
                return Err(endpoint);
            }
        }
        // Both ends on one particle: the direction is zero, so is the force
        let Some((pa, pb)) = particles.pair_mut(self.a, self.b) else {
            return Ok(());
        };
        let f = self.force(pa, pb);
        pa.apply_force(f);
        pb.apply_force(-f);
        Ok(())
    }
}

/// A particle whose position follows a curve instead of being integrated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivenParticle {
    pub index: usize,
    /// Curve parameter advanced per second
    pub speed: f32,
    /// Current curve parameter in `[0, 1)`
    pub phase: f32,
    /// False until the first advance has placed the particle on the curve
    pub on_curve: bool,
}

/// Owns every particle and spring of one simulation
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: SlotArena<Particle>,
    springs: SlotArena<Spring>,
    pub gravity: Vec3,
    /// `None` disables the ground plane entirely
    pub contact: Option<GroundContact>,
    /// Material restored by `set_ground`/`set_friction` once `contact` is `None`
    contact_defaults: GroundContact,
    method: IntegrationMethod,
    driven: Option<DrivenParticle>,
    time: f32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::with_config(&SimulationConfig::default())
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SimulationConfig) -> Self {
        Self {
            particles: SlotArena::new(),
            springs: SlotArena::new(),
            gravity: Vec3::new(0.0, -config.gravity, 0.0),
            contact: Some(GroundContact::from_config(config)),
            contact_defaults: GroundContact::from_config(config),
            method: config.method,
            driven: None,
            time: 0.0,
        }
    }

    pub fn particles(&self) -> impl Iterator<Item = (usize, &Particle)> {
        self.particles.iter()
    }

    pub fn springs(&self) -> impl Iterator<Item = (usize, &Spring)> {
        self.springs.iter()
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn particle_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn spring(&self, index: usize) -> Option<&Spring> {
        self.springs.get(index)
    }

    /// Particle slots, vacant ones included
    pub fn particle_slots(&self) -> usize {
        self.particles.len()
    }

    /// Spring slots, vacant ones included
    pub fn spring_slots(&self) -> usize {
        self.springs.len()
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn set_integration(&mut self, method: IntegrationMethod) {
        self.method = method;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn driven(&self) -> Option<DrivenParticle> {
        self.driven
    }

    /// Gravity of magnitude `g` pulling along -Y
    pub fn set_gravity(&mut self, g: f32) {
        self.gravity = Vec3::new(0.0, -g, 0.0);
    }

    pub fn set_ground(&mut self, elasticity: f32, viscosity: f32) {
        let contact = self.contact.get_or_insert(self.contact_defaults);
        contact.elasticity = elasticity;
        contact.viscosity = viscosity;
    }

    pub fn set_friction(&mut self, static_friction: f32, kinetic_friction: f32) {
        let contact = self.contact.get_or_insert(self.contact_defaults);
        contact.static_friction = static_friction;
        contact.kinetic_friction = kinetic_friction;
    }

    /// Replace every particle with `n` default ones. Springs whose endpoints
    /// no longer exist are dropped.
    pub fn create_particles(&mut self, n: usize) {
        self.particles = (0..n).map(|_| Particle::default()).collect();
        self.prune_dangling();
        ftlog::debug!("created {n} particles");
    }

    /// Append `n` vacant spring slots to be filled by [`link`](Self::link)
    pub fn create_springs(&mut self, n: usize) {
        for _ in 0..n {
            self.springs.push_vacant();
        }
        ftlog::debug!("reserved {n} spring slots ({} total)", self.springs.len());
    }

    pub fn add_particle(&mut self, particle: Particle) -> SimResult<usize> {
        check_mass(particle.mass)?;
        Ok(self.particles.push(particle))
    }

    /// Vacate a particle slot along with every spring attached to it
    pub fn remove_particle(&mut self, index: usize) -> SimResult<Particle> {
        let removed = self.particles.vacate(index).ok_or_else(|| {
            ftlog::warn!("remove_particle rejected: no particle {index}");
            SimError::out_of_range(IndexKind::Particle, index, self.particles.len())
        })?;
        self.prune_dangling();
        Ok(removed)
    }

    pub fn set_particle(&mut self, index: usize, mass: f32, position: Vec3, velocity: Vec3) -> SimResult<()> {
        check_mass(mass)?;
        let len = self.particles.len();
        let particle = self.particles.get_mut(index).ok_or_else(|| {
            ftlog::warn!("particle {index} does not exist (len {len})");
            SimError::out_of_range(IndexKind::Particle, index, len)
        })?;
        particle.mass = mass;
        particle.position = position;
        particle.velocity = velocity;
        Ok(())
    }

    pub fn set_all_velocities(&mut self, velocity: Vec3) {
        for (_, particle) in self.particles.iter_mut() {
            particle.velocity = velocity;
        }
    }

    /// Connect two particles with a spring stored at `spring_index`.
    ///
    /// `spring_index` may name an existing slot or the next one past the end.
    /// A negative `rest_length` takes the current distance.
    pub fn link(
        &mut self,
        spring_index: usize,
        p1: usize,
        p2: usize,
        ks: f32,
        kd: f32,
        rest_length: f32,
    ) -> SimResult<()> {
        let len = self.particles.len();
        let (pa, pb) = match (self.particles.get(p1), self.particles.get(p2)) {
            (Some(pa), Some(pb)) => (pa, pb),
            (None, _) | (_, None) => {
                let bad = if self.particles.contains(p1) { p2 } else { p1 };
                ftlog::warn!("link rejected: invalid particle index {p1} or {p2}");
                return Err(SimError::out_of_range(IndexKind::Particle, bad, len));
            }
        };
        let spring = Spring::new(p1, p2, ks, kd, rest_length, pa, pb);
        let slots = self.springs.len();
        self.springs.put(spring_index, spring).map_err(|_| {
            ftlog::warn!("link rejected: invalid spring index {spring_index} (slots {slots})");
            SimError::out_of_range(IndexKind::Spring, spring_index, slots)
        })
    }

    /// Slave a particle to a curve; it is no longer integrated
    pub fn set_driven(&mut self, index: usize, speed: f32) -> SimResult<()> {
        if !self.particles.contains(index) {
            ftlog::warn!("drive rejected: no particle {index}");
            return Err(SimError::out_of_range(IndexKind::Particle, index, self.particles.len()));
        }
        self.driven = Some(DrivenParticle {
            index,
            speed,
            phase: 0.0,
            on_curve: false,
        });
        Ok(())
    }

    pub fn clear_driven(&mut self) {
        self.driven = None;
    }

    /// Move the driven particle along `curve` by `speed * dt` of parameter.
    /// Its velocity becomes the finite difference of the move, except on the
    /// step where the parameter wraps back to the start and on the first
    /// advance, which only snaps the particle onto the curve.
    pub fn advance_driver(&mut self, curve: &HermiteSpline, dt: f32) {
        let Some(driver) = self.driven.as_mut() else {
            return;
        };
        let advanced = driver.phase + driver.speed * dt;
        let wrapped = !(0.0..1.0).contains(&advanced);
        let snapping = !driver.on_curve;
        driver.phase = advanced.rem_euclid(1.0);
        driver.on_curve = true;
        let target = curve.position(driver.phase);
        if let Some(particle) = self.particles.get_mut(driver.index) {
            particle.velocity = if wrapped || snapping || dt <= 0.0 {
                Vec3::ZERO
            } else {
                (target - particle.position) / dt
            };
            particle.position = target;
        }
    }

    /// One fixed step: forces, springs, ground contact, then integration
    pub fn update(&mut self, dt: f32) {
        let driven = self.driven.map(|d| d.index);
        let gravity = self.gravity;

        for (_, particle) in self.particles.iter_mut() {
            particle.clear_accumulators();
        }

        for (index, particle) in self.particles.iter_mut() {
            if Some(index) != driven {
                particle.apply_force(gravity * particle.mass);
            }
        }

        for (index, spring) in self.springs.iter() {
            if let Err(particle) = spring.apply_spring_force(&mut self.particles) {
                ftlog::warn!("{}", SimError::InvalidTopology { spring: index, particle });
            }
        }

        let integrate = self.method.integrator();
        for (index, particle) in self.particles.iter_mut() {
            if Some(index) == driven {
                continue;
            }
            if let Some(contact) = &self.contact {
                particle.resolve_ground_contact(contact);
            }
            integrate(particle, dt);
        }

        self.time += dt;
    }

    /// Check that every spring references live particles
    pub fn validate_topology(&self) -> SimResult<()> {
        for (index, spring) in self.springs.iter() {
            for endpoint in [spring.a, spring.b] {
                if !self.particles.contains(endpoint) {
                    return Err(SimError::InvalidTopology {
                        spring: index,
                        particle: endpoint,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.particles.iter().all(|(_, p)| p.is_finite())
    }

    fn prune_dangling(&mut self) {
        let dangling: Vec<(usize, usize)> = self
            .springs
            .iter()
            .filter_map(|(index, spring)| {
                [spring.a, spring.b]
                    .into_iter()
                    .find(|&p| !self.particles.contains(p))
                    .map(|p| (index, p))
            })
            .collect();
        for (spring, particle) in dangling {
            ftlog::warn!("dropping {}", SimError::InvalidTopology { spring, particle });
            self.springs.vacate(spring);
        }

        if let Some(driver) = self.driven {
            if !self.particles.contains(driver.index) {
                self.driven = None;
            }
        }
    }
}

fn check_mass(mass: f32) -> SimResult<()> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "mass must be positive and finite, got {mass}"
        )))
    }
}
