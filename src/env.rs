use std::{
    collections::{hash_map::Entry, HashMap},
    ops::Index,
};

use crate::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to a an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` if the action ended the episode
    fn step(&mut self, action: Self::Action) -> Result<(Option<Self::State>, f32)>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Result<Self::State>;
}

/// An environment whose available actions depend on the current state
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// May be empty if the agent is boxed in.
    fn actions(&self) -> Vec<Self::Action>;
}

/// Named per-episode metrics accumulated by an environment
#[derive(Debug, Clone)]
pub struct Report {
    keys: Vec<&'static str>,
    values: HashMap<&'static str, f64>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        let values = keys.iter().map(|&k| (k, 0.0)).collect();
        Self { keys, values }
    }

    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.values.entry(key)
    }

    /// Values in key order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.keys.iter().map(|k| self.values[k])
    }

    /// Take the current values, resetting every metric to zero
    pub fn take(&mut self) -> HashMap<&'static str, f64> {
        let fresh = self.keys.iter().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.values, fresh)
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.values[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_functional() {
        let mut report = Report::new(vec!["score", "steps"]);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("score").and_modify(|x| *x -= 0.5);

        assert_eq!(report["steps"], 1.0);
        assert_eq!(report.values().collect::<Vec<_>>(), vec![-0.5, 1.0], "Values in key order");

        let taken = report.take();
        assert_eq!(taken["score"], -0.5);
        assert_eq!(report["steps"], 0.0, "Report is reset after take");
        assert_eq!(report.keys(), &["score", "steps"]);
    }
}
