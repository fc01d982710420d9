pub mod config;
pub mod engine;
pub mod matchmaking;
pub mod telemetry;
