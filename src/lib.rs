pub mod commands;
pub mod engine;
pub mod geometry;
pub mod grid;
pub mod ledger;
pub mod progression;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use commands::{Command, CommandError};
pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{World, WorldSnapshot};
