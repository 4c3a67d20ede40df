//! High-level runtime engine settings
//!
//! Selects the integrator used for free dipole motion and whether the
//! stick/unstick coupling is active

use crate::configuration::config::{CouplingConfig, IntegratorConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub integrator: IntegratorConfig, // rk4 or euler for the NORMAL state
    pub coupling: CouplingConfig,     // sticky = stick/unstick state machine, free = contact is terminal
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Rk4,
            coupling: CouplingConfig::Sticky,
        }
    }
}
