//! Randomized initial placement
//!
//! A regular grid with spacing ~2.5 particle radii covers the arena inside a
//! one-radius margin. `count + 4` distinct cells are drawn without replacement:
//! the first `count` become particles, the last four become two charge pairs
//! that define the dipoles (dipole 0 in the left half, dipole 1 in the right half).

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{rng, Rng, SeedableRng};

use super::params::SystemConfig;
use super::states::{Dipole, NVec2, Particle};
use super::walls::{confine_dipoles, Bounds};
use crate::error::{Error, Result};

/// Seeded RNG for reproducible runs, entropy-seeded otherwise
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::seed_from_u64(rng().random()),
    }
}

/// `n` evenly spaced values from `lo` to `hi` inclusive
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Candidate cell centers over `[radius, width - radius] x [radius, height - radius]`
pub fn placement_grid(width: f64, height: f64, radius: f64) -> Vec<NVec2> {
    let spacing = 2.5 * radius;
    let xs = linspace(radius, width - radius, (width / spacing).floor() as usize);
    let ys = linspace(radius, height - radius, (height / spacing).floor() as usize);

    let mut cells = Vec::with_capacity(xs.len() * ys.len());
    for &x in &xs {
        for &y in &ys {
            cells.push(NVec2::new(x, y));
        }
    }
    cells
}

/// Draw `amount` distinct cells
pub fn sample_cells<R: Rng + ?Sized>(cells: &[NVec2], amount: usize, rng: &mut R) -> Result<Vec<NVec2>> {
    if amount > cells.len() {
        return Err(Error::Placement {
            requested: amount,
            available: cells.len(),
        });
    }
    Ok(index::sample(rng, cells.len(), amount)
        .into_iter()
        .map(|i| cells[i])
        .collect())
}

/// Uniformly random directions scaled to `speed`
pub fn random_velocities<R: Rng + ?Sized>(count: usize, speed: f64, rng: &mut R) -> Vec<NVec2> {
    (0..count)
        .map(|_| {
            let mut dir = NVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            if dir == NVec2::zeros() {
                dir = NVec2::new(1.0, -1.0);
            }
            dir.normalize() * speed
        })
        .collect()
}

/// Dipole at rest centered between `q0` and `q1`, oriented along `q0 - q1`
pub fn dipole_from_pair(q0: NVec2, q1: NVec2, arm: f64) -> Dipole {
    let half = (q0 - q1) * 0.5;
    let len = half.norm();
    let angle = if len > 0.0 {
        let a = (half.y / len).asin();
        if half.x < 0.0 {
            a + PI
        } else {
            a
        }
    } else {
        0.0
    };
    Dipole::new((q0 + q1) * 0.5, angle, arm)
}

#[derive(Debug, Clone)]
pub struct Placement {
    pub particles: Vec<Particle>,
    pub dipoles: [Dipole; 2],
}

/// Place all particles and both dipoles for a new system
pub fn place<R: Rng + ?Sized>(cfg: &SystemConfig, rng: &mut R) -> Result<Placement> {
    let cells = placement_grid(cfg.width, cfg.height, cfg.radius);
    let samples = sample_cells(&cells, cfg.count + 4, rng)?;

    let velocities = random_velocities(cfg.count, cfg.avg_speed, rng);
    let particles = samples[..cfg.count]
        .iter()
        .zip(velocities)
        .map(|(&x, v)| Particle::new(x, v))
        .collect();

    // squeeze each charge pair into its half of the arena
    let half_width = 0.5 * cfg.width;
    let squeeze = |q: NVec2, offset: f64| NVec2::new(0.5 * q.x + offset, q.y);
    let tail = &samples[cfg.count..];
    let arm = cfg.parameters.r;
    let mut dipoles = [
        dipole_from_pair(squeeze(tail[2], 0.0), squeeze(tail[3], 0.0), arm),
        dipole_from_pair(squeeze(tail[0], half_width), squeeze(tail[1], half_width), arm),
    ];
    confine_dipoles(&mut dipoles, &Bounds::new(cfg.width, cfg.height));

    Ok(Placement { particles, dipoles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn linspace_endpoints() {
        let v = linspace(1.0, 9.0, 5);
        assert_eq!(v, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn grid_respects_margin() {
        let cells = placement_grid(100.0, 50.0, 2.0);
        // 100 / 5 = 20 columns, 50 / 5 = 10 rows
        assert_eq!(cells.len(), 200);
        for c in &cells {
            assert!(c.x >= 2.0 && c.x <= 98.0);
            assert!(c.y >= 2.0 && c.y <= 48.0);
        }
    }

    #[test]
    fn samples_are_distinct() {
        let cells = placement_grid(100.0, 100.0, 2.0);
        let mut rng = make_rng(Some(9));
        let picked = sample_cells(&cells, 50, &mut rng).expect("enough cells");
        for i in 0..picked.len() {
            for j in (i + 1)..picked.len() {
                assert!(picked[i] != picked[j]);
            }
        }
    }

    #[test]
    fn too_many_samples_is_an_error() {
        let cells = placement_grid(10.0, 10.0, 2.0);
        let mut rng = make_rng(Some(1));
        let err = sample_cells(&cells, cells.len() + 1, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Placement { .. }));
    }

    #[test]
    fn velocities_have_the_target_speed() {
        let mut rng = make_rng(Some(3));
        for v in random_velocities(100, 250.0, &mut rng) {
            assert!((v.norm() - 250.0).abs() < 1e-9);
        }
    }

    #[test]
    fn dipole_orientation_from_pair() {
        let d = dipole_from_pair(NVec2::new(4.0, 6.0), NVec2::new(4.0, 2.0), 1.0);
        assert_eq!(d.x, NVec2::new(4.0, 4.0));
        assert!((d.angle - FRAC_PI_2).abs() < 1e-12);

        // pair pointing left lands in the left half-plane
        let d = dipole_from_pair(NVec2::new(0.0, 0.0), NVec2::new(2.0, 0.0), 1.0);
        assert!((d.axis() - NVec2::new(-1.0, 0.0)).norm() < 1e-12);
    }
}
