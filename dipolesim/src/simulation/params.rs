//! Physical and numerical parameters for the simulation
//!
//! `Parameters` holds the dipole/particle physics that the operator may edit mid-run
//! (`charge`, `charge_mass`, `m`) next to the fixed geometry of the charges.
//! `SystemConfig` is everything needed to build a `ParticleSystem`.

use crate::error::{Error, Result};
use crate::simulation::engine::Engine;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub charge: f64,      // magnitude of each dipole charge
    pub charge_mass: f64, // mass of one charge (a dipole weighs 2 * charge_mass)
    pub m: f64,           // particle mass
    pub coulomb_k: f64,   // Coulomb constant
    pub d_radius: f64,    // charge radius, also the force softening length
    pub r: f64,           // arm length (half distance between the charges)
    pub min_dist: f64,    // stick threshold on the nearest cross-dipole charge separation
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        check_finite_non_negative("charge", self.charge)?;
        check_positive("charge_mass", self.charge_mass)?;
        check_positive("m", self.m)?;
        check_finite_non_negative("coulomb_k", self.coulomb_k)?;
        check_positive("d_radius", self.d_radius)?;
        check_positive("r", self.r)?;
        check_finite_non_negative("min_dist", self.min_dist)?;
        Ok(())
    }

    /// Mass of a whole dipole
    #[inline]
    pub fn dipole_mass(&self) -> f64 {
        2.0 * self.charge_mass
    }

    /// Moment of inertia of a dipole about its center: two solid disks at distance `r`
    #[inline]
    pub fn dipole_inertia(&self) -> f64 {
        self.charge_mass * (4.0 * self.d_radius * self.d_radius / 5.0 + 2.0 * self.r * self.r)
    }

    /// Moment of inertia used when a single charge is hit by a particle
    #[inline]
    pub fn charge_inertia(&self) -> f64 {
        self.charge_mass * (2.0 * self.d_radius * self.d_radius / 5.0 + self.r * self.r)
    }
}

/// Settings of the energy governor
#[derive(Debug, Clone, PartialEq)]
pub struct GovernorParams {
    pub epsilon: f64,          // relative convergence tolerance
    pub max_iterations: usize, // rescale passes per step
}

impl Default for GovernorParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            max_iterations: 5,
        }
    }
}

/// Construction input of a `ParticleSystem`
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub count: usize,     // number of gas particles
    pub radius: f64,      // particle radius
    pub width: f64,       // arena width
    pub height: f64,      // arena height
    pub avg_speed: f64,   // target average particle speed
    pub parameters: Parameters,
    pub engine: Engine,
    pub governor: GovernorParams,
    pub seed: Option<u64>, // placement seed, None for nondeterministic runs
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("radius", self.radius)?;
        check_positive("width", self.width)?;
        check_positive("height", self.height)?;
        check_finite_non_negative("avg_speed", self.avg_speed)?;
        self.parameters.validate()?;

        let span = 2.0 * self.parameters.r;
        if span >= self.width || span >= self.height {
            return Err(Error::InvalidParam(format!(
                "arena {}x{} cannot hold a dipole of length {}",
                self.width, self.height, span
            )));
        }
        if self.width < 2.0 * self.radius || self.height < 2.0 * self.radius {
            return Err(Error::InvalidParam(
                "arena must be at least 2 * radius in every dimension".into(),
            ));
        }
        if !self.governor.epsilon.is_finite() || self.governor.epsilon <= 0.0 {
            return Err(Error::InvalidParam("governor epsilon must be finite and > 0".into()));
        }
        Ok(())
    }
}

pub(crate) fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidParam(format!("{name} must be finite and > 0")));
    }
    Ok(())
}

pub(crate) fn check_finite_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidParam(format!("{name} must be finite and >= 0")));
    }
    Ok(())
}
