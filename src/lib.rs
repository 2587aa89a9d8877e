//! Core library for the `rampstat` CLI.
//!
//! This crate provides the internal building blocks used by the binary: CLI
//! argument types, configuration merging, the HTTP-controlled CPU sampling
//! collector, time-bucket aggregation of load-test samples, and output
//! sinks. The primary user-facing interface is the `rampstat` command-line
//! application; library APIs may evolve as the CLI grows.
pub mod aggregate;
pub mod args;
pub mod config;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod shutdown;
pub mod sinks;
