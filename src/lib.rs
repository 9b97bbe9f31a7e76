//! Bike-share district demand estimation and bounded station reallocation.

pub mod cli;
pub mod config;
/// District-period tables, feature schemas, and standardization.
pub mod data;
pub mod estimator;
pub mod io;
pub mod metrics;
/// Gradient-boosted regression trees.
pub mod model;
pub mod realloc;
