//! Electrostatic force law between dipole charges
//!
//! Defines the point-charge force trait, the softened Coulomb law and the
//! reduction of the four cross-dipole charge pairs into a net force and
//! torque per dipole

use crate::simulation::params::Parameters;
use crate::simulation::states::{cross, Dipole, NVec2, Pole};

/// The four cross pairs: a charge of dipole 0 against a charge of dipole 1
pub const CROSS_PAIRS: [(Pole, Pole); 4] = [
    (Pole::Positive, Pole::Positive),
    (Pole::Positive, Pole::Negative),
    (Pole::Negative, Pole::Positive),
    (Pole::Negative, Pole::Negative),
];

/// Force between two point charges
/// Implementations return the force acting on charge `a`; `b` feels the opposite
pub trait ChargeForce {
    fn force(&self, qa: f64, xa: &NVec2, qb: f64, xb: &NVec2) -> NVec2;
    fn potential(&self, qa: f64, xa: &NVec2, qb: f64, xb: &NVec2) -> f64;
}

/// Coulomb law with an additive offset in the denominator:
/// `F = K qa qb r / (|r| + d)^3` with `r = xa - xb`
pub struct SoftenedCoulomb {
    pub k: f64,         // Coulomb constant
    pub softening: f64, // additive distance offset (charge radius)
}

impl SoftenedCoulomb {
    pub fn from_params(p: &Parameters) -> Self {
        Self {
            k: p.coulomb_k,
            softening: p.d_radius,
        }
    }
}

impl ChargeForce for SoftenedCoulomb {
    fn force(&self, qa: f64, xa: &NVec2, qb: f64, xb: &NVec2) -> NVec2 {
        let r = xa - xb;
        let s = r.norm() + self.softening;
        if s <= 0.0 {
            return NVec2::zeros();
        }
        // same signs push a away from b
        self.k * qa * qb * r / (s * s * s)
    }

    /// Exact potential of the softened force, zero at infinity:
    /// `U(s) = K qa qb (2s + d) / (2 (s + d)^2)`
    fn potential(&self, qa: f64, xa: &NVec2, qb: f64, xb: &NVec2) -> f64 {
        let s = (xa - xb).norm();
        let sd = s + self.softening;
        if sd <= 0.0 {
            return 0.0;
        }
        self.k * qa * qb * (2.0 * s + self.softening) / (2.0 * sd * sd)
    }
}

/// Net force and torque acting on one dipole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Load {
    pub force: NVec2,
    pub torque: f64,
}

impl Load {
    pub fn zero() -> Self {
        Self {
            force: NVec2::zeros(),
            torque: 0.0,
        }
    }
}

/// Sum the four cross-pair forces into a load per dipole.
/// Intra-dipole forces are held by the rod and do not appear.
pub fn pair_loads<F: ChargeForce>(law: &F, dipoles: &[Dipole; 2], charge: f64) -> [Load; 2] {
    let mut loads = [Load::zero(), Load::zero()];
    if charge == 0.0 {
        return loads;
    }

    for (pa, pb) in CROSS_PAIRS {
        let xa = dipoles[0].charge_position(pa);
        let xb = dipoles[1].charge_position(pb);
        let f = law.force(pa.sign() * charge, &xa, pb.sign() * charge, &xb);

        // Newton's third law: dipole 1's charge feels -f
        loads[0].force += f;
        loads[0].torque += cross(&(xa - dipoles[0].x), &f);
        loads[1].force -= f;
        loads[1].torque += cross(&(xb - dipoles[1].x), &(-f));
    }
    loads
}

/// Electrostatic potential energy of the dipole pair (cross pairs only)
pub fn pair_potential<F: ChargeForce>(law: &F, dipoles: &[Dipole; 2], charge: f64) -> f64 {
    if charge == 0.0 {
        return 0.0;
    }
    CROSS_PAIRS
        .iter()
        .map(|&(pa, pb)| {
            law.potential(
                pa.sign() * charge,
                &dipoles[0].charge_position(pa),
                pb.sign() * charge,
                &dipoles[1].charge_position(pb),
            )
        })
        .sum()
}
