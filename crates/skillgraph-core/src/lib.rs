//! # Skillgraph Core
//!
//! Skill estimation from ranked contest outcomes by Gaussian message passing
//! on a small per-contest factor graph (TrueSkill-style).
//!
//! Each contest builds a graph relating every competitor's skill to their
//! observed rank, runs a bounded number of message-passing rounds, and writes
//! the resulting skill posteriors back. Only those posteriors persist between
//! contests.
//!
//! ## Usage
//!
//! ```rust
//! use skillgraph_core::{Player, TrueSkill, TrueSkillConfig};
//!
//! let ts = TrueSkill::new(TrueSkillConfig::default()).expect("valid config");
//! let mut players = [
//!     Player::new(25.0, 25.0 / 3.0, 1),
//!     Player::new(25.0, 25.0 / 3.0, 2),
//! ];
//! ts.adjust_players(&mut players).expect("rated");
//! assert!(players[0].mu > players[1].mu);
//! ```

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::config::{Constants, TrueSkillConfig};
pub use engine::errors::RatingError;
pub use engine::gaussian::Gaussian;
pub use engine::ledger::{PlayerRecord, RatingEvent, RatingLedger};
pub use engine::schedule::{Player, Rating, ScheduleDiagnostics, Team, TrueSkill};
