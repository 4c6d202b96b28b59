pub mod config;
pub mod runner;

pub use config::{AppConfig, StoreKind};
pub use runner::{health_report, render, BatchFile, BatchStep, Operation, OperationRunner};
