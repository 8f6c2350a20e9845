use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    ensure_interval,
    env::{DiscreteActionSpace, Environment},
    exploration::{Choice, EpsilonGreedy},
    gym::{Action, GridWorld, Pos},
    memory::Exp,
    Error, Result,
};

/// Configuration for the [`QLearner`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearnerConfig {
    /// Learning rate, in `(0,1]`
    pub alpha: f32,
    /// Discount factor, in `[0,1]`
    pub gamma: f32,
    /// Exploration rate, in `[0,1]`
    pub epsilon: f32,
}

impl Default for QLearnerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            gamma: 0.97,
            epsilon: 0.1,
        }
    }
}

impl QLearnerConfig {
    pub fn validate(&self) -> Result<()> {
        let Self {
            alpha,
            gamma,
            epsilon,
        } = *self;
        ensure_interval!(alpha, 0.0, 1.0);
        ensure_interval!(gamma, 0.0, 1.0);
        ensure_interval!(epsilon, 0.0, 1.0);
        if alpha == 0.0 {
            return Err(Error::InvalidHyperparameter {
                name: "alpha",
                value: alpha,
                min: f32::EPSILON,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// Dense table of Q values for a square grid, one slot per `(row, col, action)`
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    size: usize,
    values: Vec<f32>,
}

impl QTable {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size * Action::COUNT],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn offset(&self, pos: Pos) -> Option<usize> {
        (pos.0 < self.size && pos.1 < self.size)
            .then_some((pos.0 * self.size + pos.1) * Action::COUNT)
    }

    /// Q values of every action at `pos`, indexed by [`Action::index`]
    pub fn row(&self, pos: Pos) -> Option<&[f32]> {
        let i = self.offset(pos)?;
        Some(&self.values[i..i + Action::COUNT])
    }

    pub fn get(&self, pos: Pos, action: Action) -> Option<f32> {
        self.row(pos).map(|row| row[action.index()])
    }

    fn get_mut(&mut self, pos: Pos, action: Action) -> Option<&mut f32> {
        let i = self.offset(pos)?;
        self.values.get_mut(i + action.index())
    }

    /// Highest Q value at `pos` over all actions
    pub fn max(&self, pos: Pos) -> Option<f32> {
        self.row(pos)
            .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
    }
}

/// A Q-learning agent for grid environments, storing its estimates in a [`QTable`]
///
/// Action selection is epsilon greedy over a caller-provided candidate set, with ties
/// broken in action order (`Up`, `Right`, `Down`, `Left`).
#[derive(Debug, Clone)]
pub struct QLearner {
    q_table: QTable,
    exploration: EpsilonGreedy,
    alpha: f32,   // learning rate
    gamma: f32,   // discount factor
    episode: u32, // completed episodes
}

impl QLearner {
    /// Initialize a new `QLearner` for a `size`×`size` grid
    ///
    /// Fails if any hyperparameter is outside its interval
    pub fn new(size: usize, config: QLearnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            q_table: QTable::new(size),
            exploration: EpsilonGreedy::new(config.epsilon)?,
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
        })
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_value(&self, state: Pos, action: Action) -> Option<f32> {
        self.q_table.get(state, action)
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    pub fn episodes(&self) -> u32 {
        self.episode
    }

    /// Count a finished episode, for callers driving [`step`](Self::step) themselves
    pub fn finish_episode(&mut self) {
        self.episode += 1;
    }

    fn check(&self, state: Pos) -> Result<&[f32]> {
        self.q_table.row(state).ok_or(Error::InvalidCoordinate {
            row: state.0 as isize,
            col: state.1 as isize,
        })
    }

    /// Choose one of `candidates` with the epsilon greedy policy
    ///
    /// Fails with [`Error::EmptyCandidateSet`] if there is nothing to choose from
    pub fn select_action<R: Rng + ?Sized>(
        &self,
        state: Pos,
        candidates: &[Action],
        rng: &mut R,
    ) -> Result<Action> {
        let values = self.check(state)?;
        if candidates.is_empty() {
            return Err(Error::EmptyCandidateSet);
        }
        match self.exploration.choose(rng) {
            Choice::Explore => candidates
                .choose(rng)
                .copied()
                .ok_or(Error::EmptyCandidateSet),
            Choice::Exploit => Self::exploit(values, candidates),
        }
    }

    /// The candidate with the highest Q value, first in action order on ties
    fn exploit(values: &[f32], candidates: &[Action]) -> Result<Action> {
        Action::iter()
            .filter(|a| candidates.contains(a))
            .fold(None, |best: Option<(Action, f32)>, a| {
                let value = values[a.index()];
                match best {
                    Some((_, best_value)) if best_value >= value => best,
                    _ => Some((a, value)),
                }
            })
            .map(|(a, _)| a)
            .ok_or(Error::EmptyCandidateSet)
    }

    /// Apply the Q-learning update for one transition
    ///
    /// `Q(s,a) ← Q(s,a) + α (r + γ max Q(s',·) − Q(s,a))`
    ///
    /// **Returns** the updated value
    pub fn update(
        &mut self,
        state: Pos,
        action: Action,
        reward: f32,
        next_state: Pos,
    ) -> Result<f32> {
        self.check(next_state)?;
        let max_next_q = self.q_table.max(next_state).unwrap_or(0.0);
        self.apply(state, action, reward, max_next_q)
    }

    /// Learn from an experience, treating a terminal transition as having no future value
    pub fn learn<E>(&mut self, exp: Exp<E>) -> Result<f32>
    where
        E: Environment<State = Pos, Action = Action>,
    {
        let Exp {
            state,
            action,
            next_state,
            reward,
        } = exp;
        match next_state {
            Some(next) => self.update(state, action, reward, next),
            None => self.apply(state, action, reward, 0.0),
        }
    }

    fn apply(&mut self, state: Pos, action: Action, reward: f32, max_next_q: f32) -> Result<f32> {
        let (alpha, gamma) = (self.alpha, self.gamma);
        let q_value = self
            .q_table
            .get_mut(state, action)
            .ok_or(Error::InvalidCoordinate {
                row: state.0 as isize,
                col: state.1 as isize,
            })?;
        let target = reward + gamma * max_next_q;
        *q_value += alpha * (target - *q_value);
        log::debug!("Q({state:?}, {action:?}) <- {:.3} (reward {reward})", *q_value);
        Ok(*q_value)
    }

    /// Take one action in `env` from `state` and learn from the result
    ///
    /// **Returns** the next state, or `None` if the episode ended
    pub fn step<E, R>(&mut self, env: &mut E, state: Pos, rng: &mut R) -> Result<Option<Pos>>
    where
        E: Environment<State = Pos, Action = Action> + DiscreteActionSpace,
        R: Rng + ?Sized,
    {
        let action = self.select_action(state, &env.actions(), rng)?;
        let (next_state, reward) = env.step(action)?;
        self.learn(Exp::<E> {
            state,
            action,
            next_state,
            reward,
        })?;
        Ok(next_state)
    }

    /// Run a full learning episode, stopping early after `max_steps` moves
    /// or when the agent is boxed in
    ///
    /// **Returns** the number of moves taken
    pub fn go<E, R>(&mut self, env: &mut E, rng: &mut R, max_steps: usize) -> Result<usize>
    where
        E: Environment<State = Pos, Action = Action> + DiscreteActionSpace,
        R: Rng + ?Sized,
    {
        let mut next_state = Some(env.reset()?);
        let mut steps = 0;
        while let Some(state) = next_state {
            if steps >= max_steps || !env.is_active() {
                break;
            }
            next_state = match self.step(env, state, rng) {
                Ok(next_state) => next_state,
                Err(Error::EmptyCandidateSet) => {
                    log::warn!("Agent at {state:?} has no open moves, ending the episode");
                    break;
                }
                Err(e) => return Err(e),
            };
            steps += 1;
        }

        self.finish_episode();
        Ok(steps)
    }

    /// Replay the learned policy from `start` toward `goal`, exploring with probability epsilon
    ///
    /// At most `2 × size` moves are made. **Returns** the visited coordinates, including `start`.
    pub fn derive_path<R: Rng + ?Sized>(
        &self,
        start: Pos,
        goal: Pos,
        world: &GridWorld,
        rng: &mut R,
    ) -> Result<Vec<Pos>> {
        self.walk(start, goal, world, |state, candidates| {
            self.select_action(state, candidates, rng)
        })
    }

    /// Like [`derive_path`](Self::derive_path), but always exploits
    pub fn greedy_path(&self, start: Pos, goal: Pos, world: &GridWorld) -> Result<Vec<Pos>> {
        self.walk(start, goal, world, |state, candidates| {
            Self::exploit(self.check(state)?, candidates)
        })
    }

    fn walk<F>(&self, start: Pos, goal: Pos, world: &GridWorld, mut pick: F) -> Result<Vec<Pos>>
    where
        F: FnMut(Pos, &[Action]) -> Result<Action>,
    {
        world.check(start)?;
        let mut path = vec![start];
        let mut current = start;
        for _ in 0..2 * world.size() {
            if current == goal {
                break;
            }
            let candidates = world.preferred_actions(current, goal);
            if candidates.is_empty() {
                break;
            }
            let action = pick(current, &candidates)?;
            let Some(next) = action.apply(current, world.size()) else {
                break;
            };
            current = next;
            path.push(current);
        }
        Ok(path)
    }
}
