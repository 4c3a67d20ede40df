//! Energy bookkeeping and the energy governor
//!
//! The governor pins `particle kinetic + dipole kinetic + pair potential` to a
//! baseline. The baseline is taken when the system is built and again whenever
//! `charge`, `charge_mass` or `m` change (or the operator invalidates it), so
//! edits made mid-run define a new, self-consistent energy level.

use tracing::{debug, warn};

use super::coupling::rigid_center_velocity;
use super::forces::{pair_potential, ChargeForce};
use super::params::{GovernorParams, Parameters};
use super::states::{Dipole, DipoleState, Particle};

/// Energy scalars of one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReport {
    pub dipole_kinetic: [f64; 2],
    pub potential: f64,
    pub particle_kinetic: f64,
}

impl EnergyReport {
    pub fn kinetic(&self) -> f64 {
        self.particle_kinetic + self.dipole_kinetic[0] + self.dipole_kinetic[1]
    }

    pub fn total(&self) -> f64 {
        self.kinetic() + self.potential
    }

    /// `[dipole0_kinetic, dipole1_kinetic, total_potential, total_energy]`
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.dipole_kinetic[0],
            self.dipole_kinetic[1],
            self.potential,
            self.total(),
        ]
    }
}

pub fn particle_kinetic(particles: &[Particle], m: f64) -> f64 {
    0.5 * m * particles.iter().map(|p| p.v.norm_squared()).sum::<f64>()
}

/// Translational + rotational energy of each dipole. A stuck dipole's center
/// moves with the rigid pair, so its velocity includes the orbit about the midpoint.
pub fn dipole_kinetic(dipoles: &[Dipole; 2], params: &Parameters) -> [f64; 2] {
    let mass = params.dipole_mass();
    let inertia = params.dipole_inertia();
    let mut out = [0.0; 2];
    for (i, e) in out.iter_mut().enumerate() {
        let v = match dipoles[i].state {
            DipoleState::Normal => dipoles[i].v,
            DipoleState::Stuck => rigid_center_velocity(dipoles, i),
        };
        *e = 0.5 * mass * v.norm_squared() + 0.5 * inertia * dipoles[i].w * dipoles[i].w;
    }
    out
}

pub fn measure<F: ChargeForce>(
    particles: &[Particle],
    dipoles: &[Dipole; 2],
    params: &Parameters,
    law: &F,
) -> EnergyReport {
    EnergyReport {
        dipole_kinetic: dipole_kinetic(dipoles, params),
        potential: pair_potential(law, dipoles, params.charge),
        particle_kinetic: particle_kinetic(particles, params.m),
    }
}

/// Energy level the governor holds the system to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBaseline {
    pub total: f64,            // full potential + kinetic
    pub particle_kinetic: f64, // full particle kinetic
}

/// Result of one governor run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GovernorOutcome {
    /// Nothing to govern (no particles and no charge, or no energy to restore)
    Idle,
    /// Kinetic energy matches the baseline estimate after `iterations` rescales
    Converged { iterations: usize },
    /// Iteration budget exhausted
    Unconverged { residual: f64 },
    /// Kinetic total collapsed to ~0 while energy is owed; the rescale was skipped
    Degraded { kin_est: f64 },
}

/// Parameters whose edits force a new baseline
#[derive(Debug, Clone, Copy, PartialEq)]
struct Watched {
    charge: f64,
    charge_mass: f64,
    m: f64,
}

impl Watched {
    fn of(p: &Parameters) -> Self {
        Self {
            charge: p.charge,
            charge_mass: p.charge_mass,
            m: p.m,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnergyGovernor {
    settings: GovernorParams,
    baseline: EnergyBaseline,
    watched: Watched,
    stale: bool,
}

impl EnergyGovernor {
    pub fn new(settings: GovernorParams, report: &EnergyReport, params: &Parameters) -> Self {
        Self {
            settings,
            baseline: EnergyBaseline {
                total: report.total(),
                particle_kinetic: report.particle_kinetic,
            },
            watched: Watched::of(params),
            stale: false,
        }
    }

    pub fn baseline(&self) -> EnergyBaseline {
        self.baseline
    }

    /// Force a new baseline at the next step (operator edit of velocities etc.)
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn needs_rebaseline(&self, params: &Parameters) -> bool {
        self.stale || self.watched != Watched::of(params)
    }

    pub fn rebaseline(&mut self, report: &EnergyReport, params: &Parameters) {
        self.baseline = EnergyBaseline {
            total: report.total(),
            particle_kinetic: report.particle_kinetic,
        };
        self.watched = Watched::of(params);
        self.stale = false;
        debug!(
            total = self.baseline.total,
            particle_kinetic = self.baseline.particle_kinetic,
            "energy baseline recomputed"
        );
    }

    /// Rescale every velocity so that kinetic energy equals `baseline - potential`
    pub fn regulate<F: ChargeForce>(
        &self,
        particles: &mut [Particle],
        dipoles: &mut [Dipole; 2],
        params: &Parameters,
        law: &F,
    ) -> GovernorOutcome {
        if particles.is_empty() && params.charge == 0.0 {
            return GovernorOutcome::Idle;
        }

        // positions do not change while rescaling
        let potential = pair_potential(law, dipoles, params.charge);
        let kin_est = (self.baseline.total - potential).max(0.0);
        let tol = self.settings.epsilon * kin_est.max(1.0);

        let kinetic_total = |particles: &[Particle], dipoles: &[Dipole; 2]| {
            let [k0, k1] = dipole_kinetic(dipoles, params);
            particle_kinetic(particles, params.m) + k0 + k1
        };

        let mut kinetic = kinetic_total(&*particles, &*dipoles);
        let mut iterations = 0;
        loop {
            let residual = (kin_est - kinetic).abs();
            if residual < tol {
                return GovernorOutcome::Converged { iterations };
            }
            if iterations == self.settings.max_iterations {
                warn!(residual, iterations, "energy governor did not converge");
                return GovernorOutcome::Unconverged { residual };
            }
            if kinetic <= 1e-12 * kin_est.max(1.0) {
                if kin_est < tol {
                    return GovernorOutcome::Idle;
                }
                warn!(kin_est, kinetic, "kinetic energy collapsed, governor skipped");
                return GovernorOutcome::Degraded { kin_est };
            }

            let scale = (kin_est / kinetic).sqrt();
            for p in particles.iter_mut() {
                p.v *= scale;
            }
            for d in dipoles.iter_mut() {
                d.v *= scale;
                d.w *= scale;
            }
            kinetic = kinetic_total(&*particles, &*dipoles);
            iterations += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::forces::SoftenedCoulomb;
    use crate::simulation::states::NVec2;

    fn params(charge: f64) -> Parameters {
        Parameters {
            charge,
            charge_mass: 1.0,
            m: 2.0,
            coulomb_k: 100.0,
            d_radius: 1.0,
            r: 2.0,
            min_dist: 2.0,
        }
    }

    fn dipoles() -> [Dipole; 2] {
        [
            Dipole::new(NVec2::new(10.0, 10.0), 0.0, 2.0),
            Dipole::new(NVec2::new(20.0, 10.0), 1.0, 2.0),
        ]
    }

    #[test]
    fn kinetic_energy_of_a_spinning_dipole() {
        let p = params(0.0);
        let mut d = dipoles();
        d[0].v = NVec2::new(3.0, 4.0);
        d[0].w = 2.0;
        let [k0, k1] = dipole_kinetic(&d, &p);
        // 0.5 * 2 * 25 + 0.5 * I * 4
        let expected = 25.0 + 2.0 * p.dipole_inertia();
        assert!((k0 - expected).abs() < 1e-12);
        assert_eq!(k1, 0.0);
    }

    #[test]
    fn report_total_adds_up() {
        let r = EnergyReport {
            dipole_kinetic: [1.0, 2.0],
            potential: -4.0,
            particle_kinetic: 10.0,
        };
        assert_eq!(r.as_array(), [1.0, 2.0, -4.0, 9.0]);
    }

    #[test]
    fn governor_restores_the_baseline() {
        let p = params(1.0);
        let law = SoftenedCoulomb::from_params(&p);
        let mut particles = vec![
            Particle::new(NVec2::new(1.0, 1.0), NVec2::new(5.0, 0.0)),
            Particle::new(NVec2::new(2.0, 2.0), NVec2::new(0.0, -3.0)),
        ];
        let mut d = dipoles();
        d[1].v = NVec2::new(1.0, 1.0);

        let before = measure(&particles, &d, &p, &law);
        let gov = EnergyGovernor::new(GovernorParams::default(), &before, &p);

        // numerical drift: everything runs 10% too fast
        for q in particles.iter_mut() {
            q.v *= 1.1;
        }
        d[1].v *= 1.1;

        let outcome = gov.regulate(&mut particles, &mut d, &p, &law);
        assert!(matches!(outcome, GovernorOutcome::Converged { iterations } if iterations <= 5));
        let after = measure(&particles, &d, &p, &law);
        assert!((after.total() - before.total()).abs() < 1e-9 * before.total().abs().max(1.0));
    }

    #[test]
    fn governor_reports_collapse_instead_of_dividing_by_zero() {
        let p = params(1.0);
        let law = SoftenedCoulomb::from_params(&p);
        let mut particles = vec![Particle::new(NVec2::new(1.0, 1.0), NVec2::new(5.0, 0.0))];
        let mut d = dipoles();
        let before = measure(&particles, &d, &p, &law);
        let gov = EnergyGovernor::new(GovernorParams::default(), &before, &p);

        particles[0].v = NVec2::zeros();
        let outcome = gov.regulate(&mut particles, &mut d, &p, &law);
        assert!(matches!(outcome, GovernorOutcome::Degraded { .. }), "{:?}", outcome);
        assert_eq!(particles[0].v, NVec2::zeros());
    }

    #[test]
    fn idle_without_particles_or_charge() {
        let p = params(0.0);
        let law = SoftenedCoulomb::from_params(&p);
        let mut d = dipoles();
        let before = measure(&[], &d, &p, &law);
        let gov = EnergyGovernor::new(GovernorParams::default(), &before, &p);
        assert_eq!(gov.regulate(&mut [], &mut d, &p, &law), GovernorOutcome::Idle);
    }

    #[test]
    fn parameter_edit_requests_a_new_baseline() {
        let mut p = params(1.0);
        let law = SoftenedCoulomb::from_params(&p);
        let d = dipoles();
        let report = measure(&[], &d, &p, &law);
        let mut gov = EnergyGovernor::new(GovernorParams::default(), &report, &p);
        assert!(!gov.needs_rebaseline(&p));

        p.charge_mass = 3.0;
        assert!(gov.needs_rebaseline(&p));
        gov.rebaseline(&report, &p);
        assert!(!gov.needs_rebaseline(&p));

        gov.invalidate();
        assert!(gov.needs_rebaseline(&p));
    }
}
