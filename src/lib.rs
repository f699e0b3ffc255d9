pub mod config;
pub mod controller;
pub mod domain;
pub mod journal;
pub mod optimizer;
pub mod telemetry;
pub mod weather;
