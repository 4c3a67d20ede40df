use std::time::Instant;

use crate::configuration::config::IntegratorConfig;
use crate::error::Result;
use crate::simulation::engine::Engine;
use crate::simulation::params::{GovernorParams, Parameters, SystemConfig};
use crate::simulation::system::ParticleSystem;

/// Helper to build a benchmark configuration with `n` particles
fn make_config(n: usize, integrator: IntegratorConfig) -> SystemConfig {
    SystemConfig {
        count: n,
        radius: 3.0,
        width: 1500.0,
        height: 500.0,
        avg_speed: 40_000.0,
        parameters: Parameters {
            charge: 1.0,
            charge_mass: 1.0,
            m: 10.0,
            coulomb_k: 9.0e7,
            d_radius: 5.0,
            r: 93.0,
            min_dist: 93.0,
        },
        engine: Engine {
            integrator,
            ..Engine::default()
        },
        governor: GovernorParams::default(),
        seed: Some(42),
    }
}

/// Mean wall time of one `step` in milliseconds
fn time_steps(sys: &mut ParticleSystem, steps: usize, dt: f64) -> Result<f64> {
    // Warm up
    sys.step(dt)?;

    let t0 = Instant::now();
    for _ in 0..steps {
        sys.step(dt)?;
    }
    Ok(t0.elapsed().as_secs_f64() * 1000.0 / steps as f64)
}

/// Step throughput over increasing particle counts, RK4 vs Euler dipole integration.
/// Paste output directly into a spreadsheet to graph
pub fn bench_step() -> Result<()> {
    let dt = 1.0e-4;

    println!("N,rk4_ms,euler_ms");

    for n in (200..=3200).step_by(200) {
        // the particle pass is O(N^2): fewer repetitions for large N
        let steps = if n <= 800 { 50 } else { 10 };

        let mut sys_rk4 = ParticleSystem::new(make_config(n, IntegratorConfig::Rk4))?;
        let ms_rk4 = time_steps(&mut sys_rk4, steps, dt)?;

        let mut sys_euler = ParticleSystem::new(make_config(n, IntegratorConfig::Euler))?;
        let ms_euler = time_steps(&mut sys_euler, steps, dt)?;

        println!("{},{:.6},{:.6}", n, ms_rk4, ms_euler);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_config_is_valid() {
        let mut sys = ParticleSystem::new(make_config(50, IntegratorConfig::Euler)).expect("valid config");
        let ms = time_steps(&mut sys, 2, 1.0e-4).expect("steps run");
        assert!(ms >= 0.0);
    }
}
