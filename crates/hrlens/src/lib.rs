#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod llm;
pub mod models;
pub mod store;

pub use cli::app::{Cli, Command};
pub use engine::AnalyticsEngine;
