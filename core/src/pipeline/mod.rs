pub mod scheduler;
pub mod simulator;
pub mod step;
