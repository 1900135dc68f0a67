pub mod charts;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod narrative;
pub mod output;
pub mod report;
pub mod state;
