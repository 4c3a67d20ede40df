//! Stick/unstick state machine of the dipole pair
//!
//! Both dipoles always share one `DipoleState`. Once per step, before the
//! dipoles move, the nearest cross-dipole charge pair decides the next state:
//!
//! - NORMAL -> STUCK: nearest separation <= `min_dist` and that pair attracts
//! - STUCK -> NORMAL: nearest separation > `min_dist` or that pair repels
//!
//! While stuck the pair moves rigidly, which keeps every separation fixed, so the
//! state cannot flap between steps without an outside push.

use tracing::debug;

use super::forces::CROSS_PAIRS;
use super::integrator::midpoint;
use super::params::Parameters;
use super::states::{Dipole, DipoleState, NVec2};

/// Nearest cross-dipole charge pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    pub distance: f64,
    pub attractive: bool, // every pair realizing the minimum has opposite signs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stick,
    Unstick,
}

/// Smallest of the four cross separations. When several pairs tie at the minimum
/// the result is attractive only if all of them are.
pub fn nearest_cross_pair(dipoles: &[Dipole; 2]) -> Separation {
    let mut best = Separation {
        distance: f64::INFINITY,
        attractive: false,
    };
    for (pa, pb) in CROSS_PAIRS {
        let d = (dipoles[0].charge_position(pa) - dipoles[1].charge_position(pb)).norm();
        let attractive = pa != pb;
        let tie = (d - best.distance).abs() <= 1e-12 * d.max(1.0);
        if tie {
            best.attractive &= attractive;
        } else if d < best.distance {
            best = Separation { distance: d, attractive };
        }
    }
    best
}

/// Pure transition function
pub fn next_state(current: DipoleState, sep: &Separation, params: &Parameters) -> DipoleState {
    // uncharged dipoles never bind
    if params.charge == 0.0 {
        return DipoleState::Normal;
    }
    let bound = sep.distance <= params.min_dist && sep.attractive;
    match (current, bound) {
        (DipoleState::Normal, true) => DipoleState::Stuck,
        (DipoleState::Stuck, false) => DipoleState::Normal,
        (state, _) => state,
    }
}

/// Give both dipoles the pair's mean linear and angular velocity.
/// The dipoles have equal masses, so the momentum-weighted mean is the plain mean.
pub fn synchronize(dipoles: &mut [Dipole; 2]) {
    let v = (dipoles[0].v + dipoles[1].v) * 0.5;
    let w = 0.5 * (dipoles[0].w + dipoles[1].w);
    for d in dipoles.iter_mut() {
        d.v = v;
        d.w = w;
    }
}

/// Velocity of a stuck dipole's center as a point of the rigid pair
pub fn rigid_center_velocity(dipoles: &[Dipole; 2], i: usize) -> NVec2 {
    let r = dipoles[i].x - midpoint(dipoles);
    dipoles[i].v + dipoles[i].w * NVec2::new(-r.y, r.x)
}

/// On unstick each dipole keeps the velocity it had inside the rigid pair
fn release(dipoles: &mut [Dipole; 2]) {
    let v = [rigid_center_velocity(dipoles, 0), rigid_center_velocity(dipoles, 1)];
    for (d, vi) in dipoles.iter_mut().zip(v) {
        d.v = vi;
    }
}

/// Break a stuck pair regardless of separation (the rigid pair no longer fits the arena)
pub fn force_release(dipoles: &mut [Dipole; 2]) -> Option<Transition> {
    if dipoles[0].state != DipoleState::Stuck {
        return None;
    }
    release(dipoles);
    for d in dipoles.iter_mut() {
        d.state = DipoleState::Normal;
    }
    debug!("stuck pair does not fit the arena, released");
    Some(Transition::Unstick)
}

/// Evaluate the state machine and apply its side effects to both dipoles
pub fn update(dipoles: &mut [Dipole; 2], params: &Parameters) -> Option<Transition> {
    let current = dipoles[0].state;
    let sep = nearest_cross_pair(dipoles);
    let next = next_state(current, &sep, params);

    let transition = match (current, next) {
        (DipoleState::Normal, DipoleState::Stuck) => {
            synchronize(dipoles);
            debug!(separation = sep.distance, "dipoles stuck");
            Some(Transition::Stick)
        }
        (DipoleState::Stuck, DipoleState::Normal) => {
            release(dipoles);
            debug!(separation = sep.distance, attractive = sep.attractive, "dipoles released");
            Some(Transition::Unstick)
        }
        (DipoleState::Stuck, DipoleState::Stuck) => {
            // collisions may have pushed the two halves apart in velocity space
            synchronize(dipoles);
            None
        }
        (DipoleState::Normal, DipoleState::Normal) => None,
    };

    for d in dipoles.iter_mut() {
        d.state = next;
    }
    transition
}
