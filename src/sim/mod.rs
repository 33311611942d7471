/// Simulation: world state, the per-frame step, levels and the session
/// that drives them.

pub mod event;
pub mod level;
pub mod session;
pub mod step;
pub mod timer;
pub mod world;
