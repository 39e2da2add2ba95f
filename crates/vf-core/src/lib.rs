/// Shared types, configuration, and error taxonomy for vibeflux.
///
/// This crate contains the input/output data contracts, the vibe tuning
/// tables, and the engine configuration used across the vibeflux workspace.

pub mod config;
pub mod error;
pub mod frame;
pub mod state;
pub mod vibe;

pub use config::EngineConfig;
pub use error::CoreError;
pub use frame::FeatureFrame;
pub use state::ControlState;
pub use vibe::{Vibe, VibePhase, VibeTuning};
