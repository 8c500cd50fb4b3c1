// src/lib.rs
// Library interface for subwatch
pub mod cli;
pub mod config;
pub mod monitor;
pub mod notifier;
pub mod scanner;
pub mod store;
