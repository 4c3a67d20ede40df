//! Reflective arena walls
//!
//! The arena is `[0, width] x [0, height]`. Particles are clamped onto the wall
//! they crossed and the matching velocity component is negated. Dipoles are
//! corrected through their charges: the center is shifted so the offending charge
//! sits on the wall, the linear velocity is pointed back inside and the spin is
//! reversed when it was carrying that charge into the wall.

use super::states::{Dipole, DipoleState, NVec2, Particle, Pole};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn extent(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.width
        } else {
            self.height
        }
    }

    pub fn contains(&self, p: &NVec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// Drift every particle by `dt` and reflect it off the walls
pub fn advance_particles(particles: &mut [Particle], bounds: &Bounds, dt: f64) {
    for p in particles.iter_mut() {
        p.x += p.v * dt;
        reflect_particle(p, bounds);
    }
}

/// Restitution-1 wall: clamp onto the wall, negate the normal velocity
pub fn reflect_particle(p: &mut Particle, bounds: &Bounds) {
    for axis in 0..2 {
        let hi = bounds.extent(axis);
        if p.x[axis] < 0.0 {
            p.x[axis] = 0.0;
            p.v[axis] = -p.v[axis];
        } else if p.x[axis] > hi {
            p.x[axis] = hi;
            p.v[axis] = -p.v[axis];
        }
    }
}

/// Correction of one charge against one wall
#[derive(Debug, Clone, Copy, PartialEq)]
struct WallHit {
    axis: usize,
    shift: f64,
    flip_spin: bool,
}

/// First wall violation of a charge, if any
fn wall_hit(dipole: &Dipole, pole: Pole, bounds: &Bounds) -> Option<WallHit> {
    let q = dipole.charge_position(pole);
    let spin = dipole.spin_velocity(pole);
    for axis in 0..2 {
        let hi = bounds.extent(axis);
        if q[axis] < 0.0 {
            return Some(WallHit {
                axis,
                shift: -q[axis],
                flip_spin: spin[axis] < 0.0,
            });
        }
        if q[axis] > hi {
            return Some(WallHit {
                axis,
                shift: hi - q[axis],
                flip_spin: spin[axis] > 0.0,
            });
        }
    }
    None
}

fn apply_hit(d: &mut Dipole, hit: &WallHit) {
    d.x[hit.axis] += hit.shift;
    // a positive shift means the low wall was hit: move away from it
    d.v[hit.axis] = if hit.shift > 0.0 {
        d.v[hit.axis].abs()
    } else {
        -d.v[hit.axis].abs()
    };
    if hit.flip_spin {
        d.w = -d.w;
    }
}

/// Keep all four charges inside the arena. A STUCK partner receives the same
/// shift and ends with the same velocities so the rigid link is preserved.
/// Returns the number of corrections made.
pub fn confine_dipoles(dipoles: &mut [Dipole; 2], bounds: &Bounds) -> usize {
    // each charge can touch at most two walls (a corner)
    const MAX_PASSES: usize = 4;
    let mut corrections = 0;

    for _ in 0..MAX_PASSES {
        let mut touched = false;
        for i in 0..2 {
            for pole in Pole::BOTH {
                let Some(hit) = wall_hit(&dipoles[i], pole, bounds) else {
                    continue;
                };
                touched = true;
                corrections += 1;
                apply_hit(&mut dipoles[i], &hit);

                if dipoles[i].state == DipoleState::Stuck {
                    let (v, w) = (dipoles[i].v, dipoles[i].w);
                    let partner = &mut dipoles[1 - i];
                    partner.x[hit.axis] += hit.shift;
                    partner.v = v;
                    partner.w = w;
                }
            }
        }
        if !touched {
            break;
        }
    }
    corrections
}

/// Every charge of both dipoles lies inside the arena
pub fn charges_inside(dipoles: &[Dipole; 2], bounds: &Bounds) -> bool {
    dipoles
        .iter()
        .flat_map(|d| d.charge_positions())
        .all(|q| bounds.contains(&q))
}
