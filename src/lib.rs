pub mod config;
pub mod forces;
pub mod particles;
pub mod species;
pub mod universe;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    BoundaryMode, Preset, ResolvedScenario, ScenarioParams, SimulationConfig, PRESETS,
};
pub use particles::{Particle, ParticleSet};
pub use species::SpeciesMatrix;
pub use universe::{Universe, WorldConfig, PICK_RADIUS};
pub use vecmath::Vec2;
