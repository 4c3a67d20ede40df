//! Core state types for the gas + dipole simulation.
//!
//! - `Particle`: one point of the ideal gas (radius and mass are shared and live in the system)
//! - `Dipole`: rigid rod with a positive and a negative charge at its ends
//! - `Pole`: addresses one of the two charges of a dipole
//! - `DipoleState`: coupling tag shared by both dipoles (NORMAL / STUCK)

use nalgebra::{Vector2, SVector};
pub type NVec2 = Vector2<f64>;

/// Integrable state of the dipole pair, 6 scalars per dipole:
/// `[x, y, vx, vy, angle, w]` for dipole 0 followed by dipole 1
pub type PairState = SVector<f64, 12>;

/// 2D cross product (z component of the 3D cross product)
#[inline]
pub fn cross(a: &NVec2, b: &NVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
}

impl Particle {
    pub fn new(x: NVec2, v: NVec2) -> Self {
        Self { x, v }
    }

    pub fn speed(&self) -> f64 {
        self.v.norm()
    }
}

/// One of the two charges of a dipole.
/// The charge at `x + arm·(cos θ, sin θ)` is positive, the opposite one negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    Positive,
    Negative,
}

impl Pole {
    pub const BOTH: [Pole; 2] = [Pole::Positive, Pole::Negative];

    /// +1 for the positive charge, -1 for the negative one
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Pole::Positive => 1.0,
            Pole::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DipoleState {
    #[default]
    Normal,
    Stuck,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dipole {
    pub x: NVec2,    // center position
    pub v: NVec2,    // linear velocity of the center
    pub angle: f64,  // orientation (radians)
    pub w: f64,      // angular velocity
    pub arm: f64,    // half distance between the two charges
    pub state: DipoleState,
}

impl Dipole {
    /// A dipole at rest in the NORMAL state
    pub fn new(x: NVec2, angle: f64, arm: f64) -> Self {
        Self {
            x,
            v: NVec2::zeros(),
            angle,
            w: 0.0,
            arm,
            state: DipoleState::Normal,
        }
    }

    /// Unit vector from the center towards the positive charge
    #[inline]
    pub fn axis(&self) -> NVec2 {
        NVec2::new(self.angle.cos(), self.angle.sin())
    }

    /// Offset of a charge from the center
    #[inline]
    pub fn arm_vector(&self, pole: Pole) -> NVec2 {
        pole.sign() * self.arm * self.axis()
    }

    pub fn charge_position(&self, pole: Pole) -> NVec2 {
        self.x + self.arm_vector(pole)
    }

    /// `[positive, negative]`
    pub fn charge_positions(&self) -> [NVec2; 2] {
        [self.charge_position(Pole::Positive), self.charge_position(Pole::Negative)]
    }

    /// Contribution of the rotation to a charge's velocity: `w × arm`
    #[inline]
    pub fn spin_velocity(&self, pole: Pole) -> NVec2 {
        let arm = self.arm_vector(pole);
        self.w * NVec2::new(-arm.y, arm.x)
    }

    /// Velocity of a charge as a point of the rigid body
    pub fn charge_velocity(&self, pole: Pole) -> NVec2 {
        self.v + self.spin_velocity(pole)
    }
}

/// Pack the two dipoles into the integrable pair state
pub fn pack_pair(dipoles: &[Dipole; 2]) -> PairState {
    let mut s = PairState::zeros();
    for (i, d) in dipoles.iter().enumerate() {
        let o = 6 * i;
        s[o] = d.x.x;
        s[o + 1] = d.x.y;
        s[o + 2] = d.v.x;
        s[o + 3] = d.v.y;
        s[o + 4] = d.angle;
        s[o + 5] = d.w;
    }
    s
}

/// Write an integrated pair state back into the dipoles (arm and state are untouched)
pub fn unpack_pair(s: &PairState, dipoles: &mut [Dipole; 2]) {
    for (i, d) in dipoles.iter_mut().enumerate() {
        let o = 6 * i;
        d.x = NVec2::new(s[o], s[o + 1]);
        d.v = NVec2::new(s[o + 2], s[o + 3]);
        d.angle = s[o + 4];
        d.w = s[o + 5];
    }
}
