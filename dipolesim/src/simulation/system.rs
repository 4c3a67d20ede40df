//! Particle system: owner of the gas and the dipole pair
//!
//! One `step(dt)` runs the whole pipeline in place:
//! 1. particle drift and wall reflection
//! 2. particle-particle contacts (immediate)
//! 3. particle-charge contacts (deferred into `ChargeImpulses`, applied once)
//! 4. stick/unstick evaluation (sticky coupling only)
//! 5. dipole dynamics: RK4/Euler when NORMAL, rigid rotation when STUCK
//! 6. dipole wall confinement (a stuck pair that no longer fits is released)
//! 7. energy governor
//!
//! Renderers and the CLI only read from it; operator edits go through the setters.

use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use super::collision::{charge_pass, particle_pass, ChargeImpulses};
use super::coupling::{self, nearest_cross_pair, Transition};
use super::energy::{measure, EnergyBaseline, EnergyGovernor, EnergyReport, GovernorOutcome};
use super::engine::Engine;
use super::forces::SoftenedCoulomb;
use super::integrator::{euler_integrator, rigid_integrator, rk4_integrator};
use super::params::{check_finite_non_negative, check_positive, Parameters, SystemConfig};
use super::placement::{make_rng, place, random_velocities, Placement};
use super::states::{Dipole, DipoleState, NVec2, Particle};
use super::walls::{advance_particles, charges_inside, confine_dipoles, Bounds};
use crate::configuration::config::{CouplingConfig, IntegratorConfig};
use crate::error::{Error, Result};

/// Speeds below this are treated as "no motion"
const SPEED_FLOOR: f64 = 1e-3;

/// Steps that get per-step trace diagnostics
const TRACED_STEPS: u64 = 20;

/// What one step produced
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// `[dipole0_kinetic, dipole1_kinetic, total_potential, total_energy]`
    pub energies: [f64; 4],
    pub state: DipoleState,
    pub governor: GovernorOutcome,
    pub transition: Option<Transition>,
    pub contacts: usize, // particle-particle + particle-charge contacts resolved
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    dipoles: [Dipole; 2],
    bounds: Bounds,
    radius: f64,
    avg_speed: f64,
    params: Parameters,
    engine: Engine,
    governor: EnergyGovernor,
    impulses: ChargeImpulses,
    iteration: u64,
    time: f64,
    rng: StdRng,
}

impl ParticleSystem {
    /// Build a system with randomized placement
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = make_rng(config.seed);
        let Placement { particles, dipoles } = place(&config, &mut rng)?;
        Ok(Self::assemble(config, particles, dipoles, rng))
    }

    /// Build a system from explicit particles and dipoles
    pub fn from_parts(config: SystemConfig, particles: Vec<Particle>, dipoles: [Dipole; 2]) -> Result<Self> {
        config.validate()?;
        let bounds = Bounds::new(config.width, config.height);
        if let Some(p) = particles.iter().find(|p| !bounds.contains(&p.x)) {
            return Err(Error::InvalidParam(format!(
                "particle at ({}, {}) lies outside the arena",
                p.x.x, p.x.y
            )));
        }
        if dipoles[0].state != dipoles[1].state {
            return Err(Error::InvalidParam("both dipoles must share one coupling state".into()));
        }
        if dipoles.iter().any(|d| d.arm != config.parameters.r) {
            return Err(Error::InvalidParam(format!(
                "dipole arm length must equal r = {}",
                config.parameters.r
            )));
        }
        let rng = make_rng(config.seed);
        Ok(Self::assemble(config, particles, dipoles, rng))
    }

    fn assemble(config: SystemConfig, particles: Vec<Particle>, mut dipoles: [Dipole; 2], rng: StdRng) -> Self {
        let bounds = Bounds::new(config.width, config.height);
        confine_dipoles(&mut dipoles, &bounds);

        let law = SoftenedCoulomb::from_params(&config.parameters);
        let report = measure(&particles, &dipoles, &config.parameters, &law);
        let governor = EnergyGovernor::new(config.governor, &report, &config.parameters);

        debug!(
            particles = particles.len(),
            width = config.width,
            height = config.height,
            total_energy = report.total(),
            "particle system ready"
        );

        Self {
            particles,
            dipoles,
            bounds,
            radius: config.radius,
            avg_speed: config.avg_speed,
            params: config.parameters,
            engine: config.engine,
            governor,
            impulses: ChargeImpulses::default(),
            iteration: 0,
            time: 0.0,
            rng,
        }
    }

    /// Advance the whole system by `dt`
    pub fn step(&mut self, dt: f64) -> Result<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::InvalidParam(format!("dt must be finite and > 0, got {dt}")));
        }

        // without the stick/unstick model a charge contact ends the run
        if self.engine.coupling == CouplingConfig::Free {
            let contact = self.radius + self.params.d_radius;
            let separation = self.min_separation();
            if separation < contact {
                return Err(Error::DipoleCollision { separation, contact });
            }
        }

        let law = SoftenedCoulomb::from_params(&self.params);
        if self.governor.needs_rebaseline(&self.params) {
            let report = measure(&self.particles, &self.dipoles, &self.params, &law);
            self.governor.rebaseline(&report, &self.params);
        }

        advance_particles(&mut self.particles, &self.bounds, dt);
        let mut contacts = particle_pass(&mut self.particles, self.radius, self.params.m);

        self.impulses.reset();
        contacts += charge_pass(
            &mut self.particles,
            &self.dipoles,
            self.radius,
            &self.params,
            &mut self.impulses,
        );
        self.impulses.apply(&mut self.dipoles);

        let mut transition = match self.engine.coupling {
            CouplingConfig::Sticky => coupling::update(&mut self.dipoles, &self.params),
            CouplingConfig::Free => None,
        };

        match self.state() {
            DipoleState::Normal => match self.engine.integrator {
                IntegratorConfig::Rk4 => rk4_integrator(&mut self.dipoles, &law, &self.params, dt),
                IntegratorConfig::Euler => euler_integrator(&mut self.dipoles, &law, &self.params, dt),
            },
            DipoleState::Stuck => rigid_integrator(&mut self.dipoles, dt),
        }
        confine_dipoles(&mut self.dipoles, &self.bounds);
        if self.state() == DipoleState::Stuck && !charges_inside(&self.dipoles, &self.bounds) {
            // each dipole alone always fits: 2 r < min(width, height)
            transition = coupling::force_release(&mut self.dipoles);
            confine_dipoles(&mut self.dipoles, &self.bounds);
        }

        let governor = self
            .governor
            .regulate(&mut self.particles, &mut self.dipoles, &self.params, &law);

        self.iteration += 1;
        self.time += dt;

        let energies = self.energies();
        if !energies.total().is_finite() {
            return Err(Error::MathError(format!(
                "energy became non-finite at iteration {}",
                self.iteration
            )));
        }

        if self.iteration <= TRACED_STEPS {
            trace!(
                iteration = self.iteration,
                contacts,
                total = energies.total(),
                potential = energies.potential,
                state = ?self.state(),
                governor = ?governor,
                "step"
            );
        }

        Ok(StepReport {
            energies: energies.as_array(),
            state: self.state(),
            governor,
            transition,
            contacts,
        })
    }

    /// Energy scalars of the current state
    pub fn energies(&self) -> EnergyReport {
        let law = SoftenedCoulomb::from_params(&self.params);
        measure(&self.particles, &self.dipoles, &self.params, &law)
    }

    /// Mean particle speed, zero without particles
    pub fn average_speed(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.particles.iter().map(Particle::speed).sum::<f64>() / self.particles.len() as f64
    }

    /// Rescale particle velocities to a new mean speed.
    /// A degenerate gas (every particle at rest) gets fresh random directions first.
    pub fn set_average_speed(&mut self, value: f64) -> Result<()> {
        check_finite_non_negative("average speed", value)?;
        self.avg_speed = value;
        self.governor.invalidate();

        if self.particles.is_empty() {
            return Ok(());
        }
        if value < SPEED_FLOOR {
            for p in self.particles.iter_mut() {
                p.v = NVec2::zeros();
            }
            return Ok(());
        }

        let mut current = self.average_speed();
        if current < SPEED_FLOOR {
            warn!(current, target = value, "gas at rest, re-randomizing particle velocities");
            let velocities = random_velocities(self.particles.len(), value, &mut self.rng);
            for (p, v) in self.particles.iter_mut().zip(velocities) {
                p.v = v;
            }
            current = self.average_speed();
            if current < SPEED_FLOOR {
                return Err(Error::MathError("could not re-initialize particle velocities".into()));
            }
        }

        let scale = value / current;
        for p in self.particles.iter_mut() {
            p.v *= scale;
        }
        Ok(())
    }

    pub fn set_charge(&mut self, charge: f64) -> Result<()> {
        check_finite_non_negative("charge", charge)?;
        self.params.charge = charge;
        Ok(())
    }

    pub fn set_charge_mass(&mut self, charge_mass: f64) -> Result<()> {
        check_positive("charge_mass", charge_mass)?;
        self.params.charge_mass = charge_mass;
        Ok(())
    }

    pub fn set_particle_mass(&mut self, m: f64) -> Result<()> {
        check_positive("m", m)?;
        self.params.m = m;
        Ok(())
    }

    /// Pin the governor to the current energy right away
    pub fn rebaseline(&mut self) {
        let report = self.energies();
        self.governor.rebaseline(&report, &self.params);
    }

    /// Smallest cross-dipole charge separation
    pub fn min_separation(&self) -> f64 {
        nearest_cross_pair(&self.dipoles).distance
    }

    /// `[[dipole0 positive, dipole0 negative], [dipole1 positive, dipole1 negative]]`
    pub fn charge_positions(&self) -> [[NVec2; 2]; 2] {
        [self.dipoles[0].charge_positions(), self.dipoles[1].charge_positions()]
    }

    pub fn state(&self) -> DipoleState {
        self.dipoles[0].state
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn dipoles(&self) -> &[Dipole; 2] {
        &self.dipoles
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn baseline(&self) -> EnergyBaseline {
        self.governor.baseline()
    }

    /// Configured target speed (last value given to `set_average_speed`)
    pub fn target_speed(&self) -> f64 {
        self.avg_speed
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::GovernorParams;

    fn config(count: usize, charge: f64) -> SystemConfig {
        SystemConfig {
            count,
            radius: 2.0,
            width: 400.0,
            height: 200.0,
            avg_speed: 100.0,
            parameters: Parameters {
                charge,
                charge_mass: 1.0,
                m: 1.0,
                coulomb_k: 1.0e4,
                d_radius: 3.0,
                r: 20.0,
                min_dist: 20.0,
            },
            engine: Engine::default(),
            governor: GovernorParams::default(),
            seed: Some(7),
        }
    }

    #[test]
    fn placement_is_reproducible() {
        let a = ParticleSystem::new(config(30, 1.0)).expect("valid config");
        let b = ParticleSystem::new(config(30, 1.0)).expect("valid config");
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.dipoles(), b.dipoles());
    }

    #[test]
    fn dipoles_start_in_their_halves() {
        let sys = ParticleSystem::new(config(30, 1.0)).expect("valid config");
        let [d0, d1] = sys.dipoles();
        assert!(d0.x.x <= 200.0 + 20.0, "dipole 0 at {}", d0.x.x);
        assert!(d1.x.x >= 200.0 - 20.0, "dipole 1 at {}", d1.x.x);
        for q in sys.charge_positions().iter().flatten() {
            assert!(sys.bounds().contains(q));
        }
    }

    #[test]
    fn bad_dt_is_rejected() {
        let mut sys = ParticleSystem::new(config(5, 1.0)).expect("valid config");
        assert!(matches!(sys.step(0.0), Err(Error::InvalidParam(_))));
        assert!(matches!(sys.step(f64::NAN), Err(Error::InvalidParam(_))));
        assert_eq!(sys.iteration(), 0);
    }

    #[test]
    fn step_advances_counters() {
        let mut sys = ParticleSystem::new(config(10, 1.0)).expect("valid config");
        sys.step(1e-3).expect("step");
        sys.step(1e-3).expect("step");
        assert_eq!(sys.iteration(), 2);
        assert!((sys.time() - 2e-3).abs() < 1e-15);
    }

    #[test]
    fn setters_validate() {
        let mut sys = ParticleSystem::new(config(5, 1.0)).expect("valid config");
        assert!(sys.set_charge(-1.0).is_err());
        assert!(sys.set_charge_mass(0.0).is_err());
        assert!(sys.set_particle_mass(f64::INFINITY).is_err());
        sys.set_charge(2.0).expect("valid charge");
        assert_eq!(sys.params().charge, 2.0);
    }

    #[test]
    fn mass_edit_moves_the_baseline() {
        let mut sys = ParticleSystem::new(config(20, 0.0)).expect("valid config");
        let before = sys.baseline().particle_kinetic;
        sys.set_particle_mass(2.0).expect("valid mass");
        sys.step(1e-4).expect("step");
        let after = sys.baseline().particle_kinetic;
        assert!((after - 2.0 * before).abs() < 1e-6 * before, "{before} -> {after}");
    }

    #[test]
    fn average_speed_round_trip() {
        let mut sys = ParticleSystem::new(config(40, 0.0)).expect("valid config");
        assert!((sys.average_speed() - 100.0).abs() < 1e-9);
        sys.set_average_speed(250.0).expect("valid speed");
        assert!((sys.average_speed() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn resting_gas_is_reinitialized() {
        let mut sys = ParticleSystem::new(config(40, 0.0)).expect("valid config");
        sys.set_average_speed(0.0).expect("zero speed");
        assert_eq!(sys.average_speed(), 0.0);
        sys.set_average_speed(80.0).expect("valid speed");
        assert!((sys.average_speed() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_arm_is_rejected() {
        let cfg = config(0, 1.0);
        let dipoles = [
            Dipole::new(NVec2::new(100.0, 100.0), 0.0, 5.0),
            Dipole::new(NVec2::new(300.0, 100.0), 0.0, 20.0),
        ];
        assert!(ParticleSystem::from_parts(cfg, Vec::new(), dipoles).is_err());
    }
}
