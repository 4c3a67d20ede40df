pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::{Error, Result};

pub use simulation::states::{Dipole, DipoleState, NVec2, Particle, Pole};
pub use simulation::params::{GovernorParams, Parameters, SystemConfig};
pub use simulation::engine::Engine;
pub use simulation::forces::{ChargeForce, SoftenedCoulomb};
pub use simulation::coupling::Transition;
pub use simulation::energy::{EnergyBaseline, EnergyReport, GovernorOutcome};
pub use simulation::history::EnergyHistory;
pub use simulation::system::{ParticleSystem, StepReport};
pub use simulation::scenario::Scenario;

pub use configuration::config::{CouplingConfig, IntegratorConfig, ScenarioConfig};

pub use benchmark::benchmark::bench_step;
