/// Implemented RL algorithms
pub mod algo;

/// Session configuration
pub mod config;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// The grid game environment
pub mod gym;

/// Experience tuples
pub mod memory;

/// Control loop tying the game and the learner together
pub mod session;

/// Terminal frontend
#[cfg(feature = "viz")]
pub mod viz;

mod error;
mod util;

pub use error::{Error, Result};
