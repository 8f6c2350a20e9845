use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::grid_world::{Cell, GridWorld, Pos};
use crate::{Error, Result};

/// Reward received for entering each kind of cell
///
/// Must keep the ordering `goal > reward > empty > penalty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    pub goal: f32,
    pub reward: f32,
    pub empty: f32,
    pub penalty: f32,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            goal: 150.0,
            reward: 15.0,
            empty: -0.5,
            penalty: -5.0,
        }
    }
}

impl RewardSchedule {
    pub fn validate(&self) -> Result<()> {
        (self.goal > self.reward && self.reward > self.empty && self.empty > self.penalty)
            .then_some(())
            .ok_or(Error::InvalidRewardSchedule)
    }

    /// Reward for entering `cell`, `None` for cells that cannot be entered
    pub fn reward_for(&self, cell: Cell) -> Option<f32> {
        match cell {
            Cell::Empty => Some(self.empty),
            Cell::Reward => Some(self.reward),
            Cell::Penalty => Some(self.penalty),
            Cell::Goal => Some(self.goal),
            Cell::Obstacle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EpisodeState {
    #[default]
    Active,
    Won,
    Lost,
}

/// Result of entering a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub reward: f32,
    pub won: bool,
}

/// Score, step and time bookkeeping for one episode
#[derive(Debug, Clone)]
pub struct EpisodeController {
    score: f32,
    steps: u32,
    time_limit: Duration,
    state: EpisodeState,
    rewards: RewardSchedule,
}

impl EpisodeController {
    pub fn new(time_limit: Duration, rewards: RewardSchedule) -> Result<Self> {
        rewards.validate()?;
        Ok(Self {
            score: 0.0,
            steps: 0,
            time_limit,
            state: EpisodeState::Active,
            rewards,
        })
    }

    /// Account for the agent entering `dest`
    ///
    /// A collected reward is cleared from `world`; entering the goal wins the episode.
    /// Rejected with [`Error::EpisodeOver`] once the episode is terminal.
    pub fn apply_outcome(&mut self, world: &mut GridWorld, dest: Pos) -> Result<Outcome> {
        if self.is_terminal() {
            log::warn!("Ignoring move to {dest:?}: episode is over");
            return Err(Error::EpisodeOver);
        }
        let cell = world.cell_at(dest).ok_or(Error::InvalidCoordinate {
            row: dest.0 as isize,
            col: dest.1 as isize,
        })?;
        let reward = self.rewards.reward_for(cell).ok_or(Error::Blocked {
            row: dest.0,
            col: dest.1,
        })?;

        match cell {
            Cell::Reward => {
                world.clear_cell(dest)?;
                log::debug!("Collected reward at {dest:?}");
            }
            Cell::Goal => {
                self.state = EpisodeState::Won;
            }
            _ => {}
        }

        self.steps += 1;
        self.score += reward;

        let won = self.state == EpisodeState::Won;
        if won {
            log::info!(
                "Goal reached in {} steps with score {:.1}",
                self.steps,
                self.score
            );
        }
        Ok(Outcome { reward, won })
    }

    /// Lose the episode if `elapsed` exceeds the time limit
    ///
    /// **Returns** `true` only on the call that made the transition
    pub fn check_time_limit(&mut self, elapsed: Duration) -> bool {
        if self.state == EpisodeState::Active && elapsed > self.time_limit {
            self.state = EpisodeState::Lost;
            log::info!("Time is up after {} steps, score {:.1}", self.steps, self.score);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.score = 0.0;
        self.steps = 0;
        self.state = EpisodeState::Active;
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state != EpisodeState::Active
    }

    pub fn won(&self) -> bool {
        self.state == EpisodeState::Won
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Time left before the limit, zero once exceeded
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.time_limit.saturating_sub(elapsed)
    }
}
