pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod placement;
pub mod walls;
pub mod collision;
pub mod integrator;
pub mod coupling;
pub mod energy;
pub mod history;
pub mod system;
pub mod scenario;
