//! Elastic contact resolution
//!
//! One impulse routine is shared by the two contact passes of a step:
//! - particle–particle: pairs `i < j` are resolved immediately, so later pairs
//!   see velocities already changed by earlier ones (sequential order matters)
//! - particle–charge: particles are updated immediately, the reaction on the
//!   dipole is accumulated in `ChargeImpulses` and applied once after the scan

use super::integrator::midpoint;
use super::params::Parameters;
use super::states::{cross, Dipole, DipoleState, NVec2, Particle, Pole};

/// Below this squared distance two centers are treated as coincident
const EPS_DIST2: f64 = 1e-24;

/// Impulse of a perfectly elastic contact between disks `a` and `b`.
///
/// Returns the impulse `J` to add to `b` (`a` receives `-J`), or `None` when the
/// centers coincide or the bodies are already separating along the line of centers.
/// For equal masses this exchanges the normal velocity components and leaves the
/// tangential ones untouched.
pub fn elastic_impulse(xa: &NVec2, va: &NVec2, ma: f64, xb: &NVec2, vb: &NVec2, mb: f64) -> Option<NVec2> {
    let d = xb - xa;
    let dist2 = d.norm_squared();
    if dist2 <= EPS_DIST2 {
        return None;
    }

    // closing speed along the normal: negative while approaching
    let u_n = (vb - va).dot(&d) / dist2.sqrt();
    if u_n >= 0.0 {
        return None;
    }

    let n = d / dist2.sqrt();
    let reduced = 2.0 * ma * mb / (ma + mb);
    Some(-reduced * u_n * n)
}

/// Resolve all overlapping particle pairs in index order. Returns the number of contacts.
pub fn particle_pass(particles: &mut [Particle], radius: f64, mass: f64) -> usize {
    let n = particles.len();
    let reach2 = (2.0 * radius) * (2.0 * radius);
    let mut contacts = 0;

    for i in 0..n {
        // split so i can be borrowed mutably next to every j > i
        let (head, tail) = particles.split_at_mut(i + 1);
        let pi = &mut head[i];
        for pj in tail.iter_mut() {
            if (pj.x - pi.x).norm_squared() >= reach2 {
                continue;
            }
            if let Some(j) = elastic_impulse(&pi.x, &pi.v, mass, &pj.x, &pj.v, mass) {
                pi.v -= j / mass;
                pj.v += j / mass;
                contacts += 1;
            }
        }
    }
    contacts
}

/// Velocity change waiting to be applied to one dipole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleDelta {
    pub dv: NVec2,
    pub dw: f64,
}

impl DipoleDelta {
    pub fn zero() -> Self {
        Self {
            dv: NVec2::zeros(),
            dw: 0.0,
        }
    }
}

/// Deferred particle–charge reactions for the two dipoles, reset every step
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeImpulses {
    pub deltas: [DipoleDelta; 2],
}

impl Default for ChargeImpulses {
    fn default() -> Self {
        Self {
            deltas: [DipoleDelta::zero(), DipoleDelta::zero()],
        }
    }
}

impl ChargeImpulses {
    pub fn reset(&mut self) {
        self.deltas = [DipoleDelta::zero(), DipoleDelta::zero()];
    }

    /// Record the impulse `j` received by charge `pole` of dipole `idx`.
    /// Half of the linear response goes to translation (the charge is one of two
    /// equal masses), the rotation follows from `arm × j` over the single-charge inertia.
    pub fn record(&mut self, idx: usize, dipole: &Dipole, pole: Pole, j: &NVec2, params: &Parameters) {
        let delta = &mut self.deltas[idx];
        delta.dv += j / (2.0 * params.charge_mass);
        delta.dw += cross(&dipole.arm_vector(pole), j) / params.charge_inertia();
    }

    pub fn apply(&self, dipoles: &mut [Dipole; 2]) {
        for (d, delta) in dipoles.iter_mut().zip(self.deltas.iter()) {
            d.v += delta.dv;
            d.w += delta.dw;
        }
    }
}

/// Velocity of a charge as a point of the moving body. A stuck pair rotates
/// about the shared midpoint, a free dipole about its own center.
pub fn contact_velocity(dipoles: &[Dipole; 2], idx: usize, pole: Pole) -> NVec2 {
    let d = &dipoles[idx];
    match d.state {
        DipoleState::Normal => d.charge_velocity(pole),
        DipoleState::Stuck => {
            let r = d.charge_position(pole) - midpoint(dipoles);
            d.v + d.w * NVec2::new(-r.y, r.x)
        }
    }
}

/// Collide every particle touching one of the four charges.
/// Dipole state is read as it was at the start of the scan. Returns the number of contacts.
pub fn charge_pass(
    particles: &mut [Particle],
    dipoles: &[Dipole; 2],
    radius: f64,
    params: &Parameters,
    acc: &mut ChargeImpulses,
) -> usize {
    let reach2 = (radius + params.d_radius) * (radius + params.d_radius);
    let mut contacts = 0;

    for (idx, dipole) in dipoles.iter().enumerate() {
        for pole in Pole::BOTH {
            let xc = dipole.charge_position(pole);
            let vc = contact_velocity(dipoles, idx, pole);
            for p in particles.iter_mut() {
                if (p.x - xc).norm_squared() >= reach2 {
                    continue;
                }
                if let Some(j) = elastic_impulse(&xc, &vc, params.charge_mass, &p.x, &p.v, params.m) {
                    p.v += j / params.m;
                    acc.record(idx, dipole, pole, &(-j), params);
                    contacts += 1;
                }
            }
        }
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Parameters {
        Parameters {
            charge: 0.0,
            charge_mass: 1.0,
            m: 1.0,
            coulomb_k: 0.0,
            d_radius: 2.0,
            r: 5.0,
            min_dist: 5.0,
        }
    }

    #[test]
    fn head_on_equal_masses_swap() {
        let mut ps = vec![
            Particle::new(NVec2::new(0.0, 0.0), NVec2::new(1.0, 0.0)),
            Particle::new(NVec2::new(1.5, 0.0), NVec2::new(-2.0, 0.0)),
        ];
        assert_eq!(particle_pass(&mut ps, 1.0, 3.0), 1);
        assert!((ps[0].v - NVec2::new(-2.0, 0.0)).norm() < 1e-12);
        assert!((ps[1].v - NVec2::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn separating_pair_is_left_alone() {
        let mut ps = vec![
            Particle::new(NVec2::new(0.0, 0.0), NVec2::new(-1.0, 0.0)),
            Particle::new(NVec2::new(1.0, 0.0), NVec2::new(1.0, 0.0)),
        ];
        assert_eq!(particle_pass(&mut ps, 1.0, 1.0), 0);
        assert_eq!(ps[0].v, NVec2::new(-1.0, 0.0));
    }

    #[test]
    fn unequal_masses_conserve_momentum_and_energy() {
        let xa = NVec2::new(0.0, 0.0);
        let va = NVec2::new(2.0, 1.0);
        let xb = NVec2::new(1.0, 1.0);
        let vb = NVec2::new(-1.0, 0.5);
        let (ma, mb) = (3.0, 0.5);
        let j = elastic_impulse(&xa, &va, ma, &xb, &vb, mb).expect("approaching");
        let va2 = va - j / ma;
        let vb2 = vb + j / mb;
        let p0 = ma * va + mb * vb;
        let p1 = ma * va2 + mb * vb2;
        assert!((p0 - p1).norm() < 1e-12);
        let e0 = ma * va.norm_squared() + mb * vb.norm_squared();
        let e1 = ma * va2.norm_squared() + mb * vb2.norm_squared();
        assert!((e0 - e1).abs() < 1e-12);
    }

    #[test]
    fn particle_bounces_off_a_resting_charge() {
        let p = params();
        let dipoles = [
            Dipole::new(NVec2::new(50.0, 50.0), 0.0, p.r),
            Dipole::new(NVec2::new(150.0, 50.0), 0.0, p.r),
        ];
        // positive charge of dipole 0 at (55, 50); particle just right of it moving left
        let mut ps = vec![Particle::new(NVec2::new(57.5, 50.0), NVec2::new(-4.0, 0.0))];
        let mut acc = ChargeImpulses::default();
        assert_eq!(charge_pass(&mut ps, &dipoles, 1.0, &p, &mut acc), 1);

        // equal masses: particle stops, the charge carries the momentum
        assert!(ps[0].v.norm() < 1e-12);
        assert!((acc.deltas[0].dv - NVec2::new(-2.0, 0.0)).norm() < 1e-12);
        // impulse along the arm gives no torque
        assert!(acc.deltas[0].dw.abs() < 1e-12);
        assert_eq!(acc.deltas[1], DipoleDelta::zero());

        let mut moved = dipoles.clone();
        acc.apply(&mut moved);
        assert_eq!(moved[0].v, NVec2::new(-2.0, 0.0));
        acc.reset();
        assert_eq!(acc, ChargeImpulses::default());
    }

    #[test]
    fn oblique_equal_masses_exchange_normal_components() {
        // line of centers along x: normal components swap, y components stay
        let mut ps = vec![
            Particle::new(NVec2::new(0.0, 0.0), NVec2::new(30.0, 10.0)),
            Particle::new(NVec2::new(1.5, 0.0), NVec2::new(-20.0, -5.0)),
        ];
        assert_eq!(particle_pass(&mut ps, 1.0, 2.0), 1);
        assert!((ps[0].v - NVec2::new(-20.0, 10.0)).norm() < 1e-12, "v0 = {:?}", ps[0].v);
        assert!((ps[1].v - NVec2::new(30.0, -5.0)).norm() < 1e-12, "v1 = {:?}", ps[1].v);
    }

    #[test]
    fn diagonal_contact_keeps_tangential_velocity() {
        let v0 = NVec2::new(12.0, -3.0);
        let v1 = NVec2::new(-4.0, -9.0);
        let mut ps = vec![
            Particle::new(NVec2::new(10.0, 10.0), v0),
            Particle::new(NVec2::new(11.0, 11.0), v1),
        ];
        assert_eq!(particle_pass(&mut ps, 1.0, 1.0), 1);

        let n = NVec2::new(1.0, 1.0).normalize();
        let t = NVec2::new(-n.y, n.x);
        assert!((ps[0].v.dot(&t) - v0.dot(&t)).abs() < 1e-12);
        assert!((ps[1].v.dot(&t) - v1.dot(&t)).abs() < 1e-12);
        assert!((ps[0].v.dot(&n) - v1.dot(&n)).abs() < 1e-12);
        assert!((ps[1].v.dot(&n) - v0.dot(&n)).abs() < 1e-12);
        assert!(((ps[0].v + ps[1].v) - (v0 + v1)).norm() < 1e-12, "momentum changed");
    }

    #[test]
    fn stuck_charge_moves_about_the_pair_midpoint() {
        let p = params();
        // d0 + at (55, 50), d1 - at (67, 50), midpoint (61, 50), d1 + at (77, 50)
        let mut dipoles = [
            Dipole::new(NVec2::new(50.0, 50.0), 0.0, p.r),
            Dipole::new(NVec2::new(72.0, 50.0), 0.0, p.r),
        ];
        for d in dipoles.iter_mut() {
            d.state = DipoleState::Stuck;
            d.w = 1.0;
        }
        let vc = contact_velocity(&dipoles, 1, Pole::Positive);
        assert!((vc - NVec2::new(0.0, 16.0)).norm() < 1e-12, "vc = {:?}", vc);

        // resting particle just above that charge picks up the rigid velocity
        let mut ps = vec![Particle::new(NVec2::new(77.0, 52.5), NVec2::zeros())];
        let mut acc = ChargeImpulses::default();
        assert_eq!(charge_pass(&mut ps, &dipoles, 1.0, &p, &mut acc), 1);
        assert!((ps[0].v - NVec2::new(0.0, 16.0)).norm() < 1e-12, "v = {:?}", ps[0].v);

        for d in dipoles.iter_mut() {
            d.state = DipoleState::Normal;
        }
        let spin = contact_velocity(&dipoles, 1, Pole::Positive);
        assert!((spin - NVec2::new(0.0, 5.0)).norm() < 1e-12);
    }

    #[test]
    fn off_axis_hit_spins_the_dipole() {
        let p = params();
        let dipoles = [
            Dipole::new(NVec2::new(50.0, 50.0), 0.0, p.r),
            Dipole::new(NVec2::new(150.0, 50.0), 0.0, p.r),
        ];
        // particle above the positive charge, falling onto it
        let mut ps = vec![Particle::new(NVec2::new(55.0, 52.5), NVec2::new(0.0, -3.0))];
        let mut acc = ChargeImpulses::default();
        charge_pass(&mut ps, &dipoles, 1.0, &p, &mut acc);
        // pushed down at +x arm -> clockwise (negative) spin
        assert!(acc.deltas[0].dw < 0.0);
    }
}
