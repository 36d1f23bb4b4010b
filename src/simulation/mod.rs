mod engine;
mod forces;

pub use self::engine::{ForceSimulation, PositionSnapshot, SimulationParams, TickOutcome};
