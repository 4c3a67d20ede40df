//! Rolling window of per-step energy scalars
//!
//! Keeps `(t, [dipole0_kinetic, dipole1_kinetic, potential, total])` samples
//! for the last `window` simulated seconds and reports mean / standard deviation
//! per series.

use std::collections::VecDeque;

/// Number of series in one sample
pub const SERIES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub mean: f64,
    pub std_dev: f64, // population standard deviation
}

#[derive(Debug, Clone)]
pub struct EnergyHistory {
    window: f64,
    samples: VecDeque<(f64, [f64; SERIES])>,
}

impl Default for EnergyHistory {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl EnergyHistory {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Append a sample and drop everything older than `t - window`
    pub fn push(&mut self, t: f64, energies: [f64; SERIES]) {
        self.samples.push_back((t, energies));
        while let Some(&(t0, _)) = self.samples.front() {
            if t - t0 > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time span covered by the stored samples
    pub fn span(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.0 - first.0,
            _ => 0.0,
        }
    }

    /// Mean and standard deviation of series `k`, `None` when empty or `k` is out of range
    pub fn stats(&self, k: usize) -> Option<SeriesStats> {
        if self.samples.is_empty() || k >= SERIES {
            return None;
        }
        let n = self.samples.len() as f64;
        let mean = self.samples.iter().map(|(_, e)| e[k]).sum::<f64>() / n;
        let var = self
            .samples
            .iter()
            .map(|(_, e)| (e[k] - mean) * (e[k] - mean))
            .sum::<f64>()
            / n;
        Some(SeriesStats {
            mean,
            std_dev: var.sqrt(),
        })
    }
}
