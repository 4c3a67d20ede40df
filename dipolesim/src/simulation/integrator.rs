//! Fixed-step time integrators for the dipole pair
//!
//! NORMAL state: the pair's 12-scalar state is advanced by classical RK4
//! (or a cheaper semi-implicit Euler step) under the cross-dipole
//! electrostatic loads. STUCK state: the pair moves as one rigid unit,
//! rotating about the shared midpoint.

use nalgebra::Rotation2;

use super::forces::{pair_loads, ChargeForce};
use super::params::Parameters;
use super::states::{pack_pair, unpack_pair, Dipole, NVec2, PairState};

/// Time derivative of the pair state:
/// `d(x)/dt = v`, `d(v)/dt = F / (2 charge_mass)`, `d(angle)/dt = w`, `d(w)/dt = torque / I`
pub fn pair_derivative<F: ChargeForce>(
    s: &PairState,
    template: &[Dipole; 2],
    law: &F,
    params: &Parameters,
) -> PairState {
    let mut dipoles = template.clone();
    unpack_pair(s, &mut dipoles);
    let loads = pair_loads(law, &dipoles, params.charge);

    let mass = params.dipole_mass();
    let inertia = params.dipole_inertia();

    let mut ds = PairState::zeros();
    for (i, load) in loads.iter().enumerate() {
        let o = 6 * i;
        ds[o] = s[o + 2];
        ds[o + 1] = s[o + 3];
        ds[o + 2] = load.force.x / mass;
        ds[o + 3] = load.force.y / mass;
        ds[o + 4] = s[o + 5];
        ds[o + 5] = load.torque / inertia;
    }
    ds
}

/// One classical Runge-Kutta step for any state derivative `f`
pub fn rk4_step<D>(y: &PairState, dt: f64, f: D) -> PairState
where
    D: Fn(&PairState) -> PairState,
{
    let half_dt = 0.5 * dt;

    // k1 at t, k2 and k3 at t + dt/2, k4 at t + dt
    let k1 = f(y);
    let k2 = f(&(*y + k1 * half_dt));
    let k3 = f(&(*y + k2 * half_dt));
    let k4 = f(&(*y + k3 * dt));

    *y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// Advance both free dipoles by one RK4 step
pub fn rk4_integrator<F: ChargeForce>(dipoles: &mut [Dipole; 2], law: &F, params: &Parameters, dt: f64) {
    let template = dipoles.clone();
    let y = pack_pair(dipoles);
    let y_next = rk4_step(&y, dt, |s| pair_derivative(s, &template, law, params));
    unpack_pair(&y_next, dipoles);
}

/// Advance both free dipoles by one semi-implicit Euler step
/// (kick velocities first, then drift with the new velocities)
pub fn euler_integrator<F: ChargeForce>(dipoles: &mut [Dipole; 2], law: &F, params: &Parameters, dt: f64) {
    let y = pack_pair(dipoles);
    let dy = pair_derivative(&y, dipoles, law, params);

    let mut y_next = y;
    for o in [0, 6] {
        y_next[o + 2] += dt * dy[o + 2];
        y_next[o + 3] += dt * dy[o + 3];
        y_next[o + 5] += dt * dy[o + 5];

        y_next[o] += dt * y_next[o + 2];
        y_next[o + 1] += dt * y_next[o + 3];
        y_next[o + 4] += dt * y_next[o + 5];
    }
    unpack_pair(&y_next, dipoles);
}

/// Shared midpoint of the two dipole centers
#[inline]
pub fn midpoint(dipoles: &[Dipole; 2]) -> NVec2 {
    (dipoles[0].x + dipoles[1].x) * 0.5
}

/// Rigid motion of a stuck pair: translate the midpoint with the shared
/// linear velocity, rotate both centers and orientations by `w dt` about it.
/// Expects synchronized velocities (see `coupling::synchronize`).
pub fn rigid_integrator(dipoles: &mut [Dipole; 2], dt: f64) {
    let mid = midpoint(dipoles);
    let v = dipoles[0].v;
    let w = dipoles[0].w;

    let rot = Rotation2::new(w * dt);
    let new_mid = mid + v * dt;

    for d in dipoles.iter_mut() {
        d.x = new_mid + rot * (d.x - mid);
        d.angle += w * dt;
    }
}
