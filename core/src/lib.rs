pub mod audit;
pub mod clock;
pub mod config;
pub mod determinism;
pub mod notifications;
pub mod pipeline;
pub mod session;
pub mod voting;

pub mod error;
