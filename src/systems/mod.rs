mod agents;
mod automation;
mod clock;
mod feedback;
mod production;

pub use agents::{AgentSystem, BOAT_CATCH_SECONDS, BOAT_SPEED, VEHICLE_SPEED};
pub use automation::{AutomationAction, AutomationSystem};
pub use clock::{night_overlay, ClockSystem};
pub use feedback::FeedbackSystem;
pub use production::ProductionSystem;
