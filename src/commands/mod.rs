//! Command implementations for the CLI
//!
//! - start: Start the price server
//! - fetch: Run one fetch cycle and print the result
//! - config: Configuration display and validation

pub mod config;
pub mod fetch;
pub mod start;
