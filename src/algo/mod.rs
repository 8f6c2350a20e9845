/// Tabular methods
pub mod tabular;

pub use tabular::{QLearner, QLearnerConfig};
