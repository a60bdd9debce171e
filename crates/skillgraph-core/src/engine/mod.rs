//! The rating engine.
//!
//! This module provides:
//! - **errors**: Error types for configuration and contest failures
//! - **gaussian**: Natural-parameter Gaussian arithmetic
//! - **normal**: Standard normal primitives and truncation corrections
//! - **factor_graph**: Contest-scoped arena of variables and factors
//! - **factors**: Prior, likelihood, sum and truncation factor updates
//! - **config**: Configuration and derived constants
//! - **schedule**: The per-contest message-passing schedule
//! - **ledger**: Ratings persisted across contests

pub mod config;
pub mod errors;
pub mod factor_graph;
pub mod factors;
pub mod gaussian;
pub mod ledger;
pub mod normal;
pub mod schedule;
