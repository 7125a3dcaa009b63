pub mod arena;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod parser;
pub mod runtime;
pub mod spline;

pub use arena::SlotArena;
pub use command::Command;
pub use config::SimulationConfig;
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, SourceLocation, Span};
pub use engine::{DrivenParticle, GroundContact, Particle, ParticleSystem, Spring};
pub use error::{IndexKind, SimError, SimResult};
pub use integrator::IntegrationMethod;
pub use parser::{parse_command, parse_script, ParseError};
pub use runtime::{
    build_simulation_from_source, run_script, ParticleState, SimulationState, Snapshot,
    SpringSegment,
};
pub use spline::{HermiteSpline, MAX_CONTROL_POINTS};
