//! Configuration loading and pipeline bootstrap for sift.

pub mod bootstrap;
pub mod config;

pub use config::Config;
