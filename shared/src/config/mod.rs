//! Configuration module for pxgate.
//!
//! This module contains the file-backed cluster configuration.

pub mod cluster;

pub use cluster::{ClusterConfig, ConfigError};
