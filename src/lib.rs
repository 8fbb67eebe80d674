// Library exports for the sensorlog data logger

pub mod actor;
pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod reader;
pub mod scheduler;
pub mod sensors;
pub mod storage;
