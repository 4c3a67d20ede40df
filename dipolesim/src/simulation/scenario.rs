//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - run settings (`dt`, `steps`, `report_every`)
//! - the particle system with gas and dipoles placed at t = 0

use crate::configuration::config::ScenarioConfig;
use crate::error::Result;
use crate::simulation::engine::Engine;
use crate::simulation::params::{check_positive, GovernorParams, Parameters, SystemConfig};
use crate::simulation::system::ParticleSystem;

/// Runtime bundle constructed from a [`ScenarioConfig`]: the run settings
/// and the system they drive
#[derive(Debug, Clone)]
pub struct Scenario {
    pub dt: f64,
    pub steps: usize,
    pub report_every: usize,
    pub system: ParticleSystem,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        check_positive("dt", cfg.engine.dt)?;
        let system = ParticleSystem::new(Self::system_config(&cfg))?;

        Ok(Self {
            dt: cfg.engine.dt,
            steps: cfg.engine.steps,
            report_every: cfg.engine.report_every,
            system,
        })
    }

    /// Map the YAML sections onto the runtime construction input
    pub fn system_config(cfg: &ScenarioConfig) -> SystemConfig {
        // Parameters (runtime) from DipoleConfig + ParticleConfig
        let d_cfg = &cfg.dipoles;
        let parameters = Parameters {
            charge: d_cfg.charge,
            charge_mass: d_cfg.charge_mass,
            m: cfg.particles.mass,
            coulomb_k: d_cfg.coulomb_k,
            d_radius: d_cfg.charge_radius,
            r: d_cfg.arm,
            min_dist: d_cfg.min_dist.unwrap_or(d_cfg.arm),
        };

        // Engine (runtime) from EngineConfig
        let engine = Engine {
            integrator: cfg.engine.integrator,
            coupling: cfg.engine.coupling,
        };

        let governor = GovernorParams {
            epsilon: cfg.governor.epsilon,
            max_iterations: cfg.governor.max_iterations,
        };

        SystemConfig {
            count: cfg.particles.count,
            radius: cfg.particles.radius,
            width: cfg.arena.width,
            height: cfg.arena.height,
            avg_speed: cfg.particles.avg_speed,
            parameters,
            engine,
            governor,
            seed: cfg.engine.seed,
        }
    }
}
