pub mod asteroid;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lethality;
pub mod physics;
pub mod simulation;
pub mod upstream;
pub mod web;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use simulation::{ImpactRequest, ImpactSimulator, SimulationResult};
