//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]    – integrator, coupling model, step size and run length
//! - [`ArenaConfig`]     – size of the reflective box
//! - [`ParticleConfig`]  – the ideal gas
//! - [`DipoleConfig`]    – charges, masses and geometry of the two dipoles
//! - [`GovernorConfig`]  – energy governor tolerance and iteration budget
//! - [`ScenarioConfig`]  – top-level wrapper used to load a scenario from YAML
//!
//! Every section and field is optional; missing values fall back to the
//! defaults of the reference demo.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   integrator: "rk4"       # or "euler"
//!   coupling: "sticky"      # or "free" (charge contact stops the run)
//!   dt: 1.0e-4
//!   steps: 20000
//!   seed: 42                # omit for a different placement every run
//!   report_every: 1000
//!
//! arena:
//!   width: 1500.0
//!   height: 500.0
//!
//! particles:
//!   count: 200
//!   radius: 3.0
//!   mass: 10.0
//!   avg_speed: 40000.0
//!
//! dipoles:
//!   charge: 1.0
//!   charge_mass: 1.0
//!   charge_radius: 5.0
//!   arm: 93.0
//!   coulomb_k: 9.0e7
//!   min_dist: 93.0          # stick threshold, defaults to `arm`
//!
//! governor:
//!   epsilon: 1.0e-9
//!   max_iterations: 5
//! ```
//!
//! `Scenario::build_scenario` maps this configuration into the runtime types.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Integrator used for the NORMAL (free) dipole dynamics
/// `integrator: "rk4"` or `integrator: "euler"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[default]
    #[serde(rename = "rk4")] // Classical 4th-order Runge–Kutta
    Rk4,

    #[serde(rename = "euler")] // Semi-implicit Euler, one force evaluation per step
    Euler,
}

/// Coupling model of the dipole pair
/// `coupling: "sticky"` or `coupling: "free"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouplingConfig {
    #[default]
    #[serde(rename = "sticky")] // stick/unstick state machine
    Sticky,

    #[serde(rename = "free")] // no binding, a charge contact is terminal
    Free,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub integrator: IntegratorConfig,
    pub coupling: CouplingConfig,
    pub dt: f64,             // step size in seconds
    pub steps: usize,        // number of steps to run
    pub seed: Option<u64>,   // placement seed
    pub report_every: usize, // steps between energy reports, 0 = never
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Rk4,
            coupling: CouplingConfig::Sticky,
            dt: 1.0e-4,
            steps: 20_000,
            seed: None,
            report_every: 1000,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 500.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    pub radius: f64,
    pub mass: f64,
    pub avg_speed: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 200,
            radius: 3.0,
            mass: 10.0,
            avg_speed: 40_000.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DipoleConfig {
    pub charge: f64,
    pub charge_mass: f64,
    pub charge_radius: f64,    // also the softening length of the force
    pub arm: f64,              // half distance between the two charges
    pub coulomb_k: f64,
    pub min_dist: Option<f64>, // stick threshold, `arm` when absent
}

impl Default for DipoleConfig {
    fn default() -> Self {
        Self {
            charge: 1.0,
            charge_mass: 1.0,
            charge_radius: 5.0,
            arm: 93.0,
            coulomb_k: 9.0e7,
            min_dist: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GovernorConfig {
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0e-9,
            max_iterations: 5,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub arena: ArenaConfig,
    pub particles: ParticleConfig,
    pub dipoles: DipoleConfig,
    pub governor: GovernorConfig,
}

impl ScenarioConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg: ScenarioConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(cfg.arena.width, 1500.0);
        assert_eq!(cfg.particles.count, 200);
        assert_eq!(cfg.engine.integrator, IntegratorConfig::Rk4);
        assert_eq!(cfg.dipoles.min_dist, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "engine:\n  integrator: \"euler\"\n  coupling: \"free\"\n  seed: 3\ndipoles:\n  charge: 0.0\n";
        let cfg = ScenarioConfig::from_reader(yaml.as_bytes()).expect("parse");
        assert_eq!(cfg.engine.integrator, IntegratorConfig::Euler);
        assert_eq!(cfg.engine.coupling, CouplingConfig::Free);
        assert_eq!(cfg.engine.seed, Some(3));
        assert_eq!(cfg.engine.dt, 1.0e-4);
        assert_eq!(cfg.dipoles.charge, 0.0);
        assert_eq!(cfg.dipoles.arm, 93.0);
    }

    #[test]
    fn unknown_integrator_is_an_error() {
        let yaml = "engine:\n  integrator: \"verlet\"\n";
        assert!(ScenarioConfig::from_reader(yaml.as_bytes()).is_err());
    }
}
