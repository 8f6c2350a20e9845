use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    algo::QLearner,
    config::Config,
    env::Environment,
    gym::{GridGame, Pos},
    Error, Result,
};

const MIN_MOVE_INTERVAL: Duration = Duration::from_millis(100);
const MAX_MOVE_INTERVAL: Duration = Duration::from_millis(1500);
const MOVE_INTERVAL_STEP: Duration = Duration::from_millis(100);

/// What the agent does on each tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Act with the epsilon greedy policy and learn from every move
    Learning,
    /// Walk a precomputed greedy path without learning
    Playback { path: Vec<Pos>, index: usize },
}

/// A game session: the grid game, the learner, and the tick logic tying them together
///
/// The caller owns the clock and passes the time elapsed since the last reset to [`tick`](Self::tick).
pub struct Session {
    config: Config,
    game: GridGame,
    learner: QLearner,
    rng: StdRng,
    mode: Mode,
    move_interval: Duration,
    last_move: Duration,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let (layout_rng, rng) = match config.game.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        let game = GridGame::new(
            config.grid.size,
            config.grid.layout,
            config.episode.time_limit(),
            config.episode.rewards,
            layout_rng,
        )?;
        let learner = QLearner::new(config.grid.size, config.learner)?;
        log::info!(
            "Session started on a {0}x{0} grid (alpha {1}, gamma {2}, epsilon {3})",
            config.grid.size,
            config.learner.alpha,
            config.learner.gamma,
            config.learner.epsilon
        );
        Ok(Self {
            move_interval: config.game.move_interval(),
            config,
            game,
            learner,
            rng,
            mode: Mode::Learning,
            last_move: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn game(&self) -> &GridGame {
        &self.game
    }

    pub fn learner(&self) -> &QLearner {
        &self.learner
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn move_interval(&self) -> Duration {
        self.move_interval
    }

    /// Path being played back, if any
    pub fn path(&self) -> Option<&[Pos]> {
        match &self.mode {
            Mode::Playback { path, .. } => Some(path),
            Mode::Learning => None,
        }
    }

    /// Advance the session given the time elapsed since the last reset
    ///
    /// The agent moves at most once per move interval. Does nothing once the episode is over.
    pub fn tick(&mut self, elapsed: Duration) -> Result<()> {
        if !self.game.is_active() || self.game.check_time_limit(elapsed) {
            return Ok(());
        }
        if elapsed.saturating_sub(self.last_move) < self.move_interval {
            return Ok(());
        }
        self.last_move = elapsed;

        if self.mode == Mode::Learning {
            self.learn_step()
        } else {
            self.playback_step()
        }
    }

    fn learn_step(&mut self) -> Result<()> {
        let state = self.game.position();
        match self.learner.step(&mut self.game, state, &mut self.rng) {
            Ok(_) => Ok(()),
            Err(Error::EmptyCandidateSet) => {
                log::warn!("Agent at {state:?} has no open moves");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn playback_step(&mut self) -> Result<()> {
        let Mode::Playback { path, index } = &mut self.mode else {
            return Ok(());
        };
        if *index + 1 >= path.len() {
            log::info!("Path ended at {:?}, resuming learning", self.game.position());
            self.mode = Mode::Learning;
            return Ok(());
        }
        *index += 1;
        let dest = path[*index];
        self.game.enter(dest)?;
        Ok(())
    }

    /// Switch between learning and playing back the greedy path from the agent's position
    pub fn toggle_path(&mut self) -> Result<()> {
        if !self.game.is_active() {
            return Ok(());
        }
        self.mode = match self.mode {
            Mode::Learning => {
                let path = self.learner.greedy_path(
                    self.game.position(),
                    self.game.goal(),
                    self.game.world(),
                )?;
                log::info!("Playing back a {} step path", path.len() - 1);
                Mode::Playback { path, index: 0 }
            }
            Mode::Playback { .. } => Mode::Learning,
        };
        Ok(())
    }

    /// Start a new episode on a fresh grid
    ///
    /// Learned values are discarded unless `keep_q_table_on_reset` is set.
    pub fn reset(&mut self) -> Result<()> {
        if self.game.episode().is_terminal() {
            self.learner.finish_episode();
        }
        self.game.reset()?;
        self.game.report.take();
        if !self.config.game.keep_q_table_on_reset {
            self.learner = QLearner::new(self.config.grid.size, self.config.learner)?;
        }
        self.mode = Mode::Learning;
        self.last_move = Duration::ZERO;
        Ok(())
    }

    /// Shorten the move interval
    pub fn faster(&mut self) {
        self.move_interval = self
            .move_interval
            .saturating_sub(MOVE_INTERVAL_STEP)
            .max(MIN_MOVE_INTERVAL);
    }

    /// Lengthen the move interval
    pub fn slower(&mut self) {
        self.move_interval = (self.move_interval + MOVE_INTERVAL_STEP).min(MAX_MOVE_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{GameConfig, GridConfig},
        gym::{EpisodeState, Layout},
    };

    fn config(seed: u64) -> Config {
        Config {
            grid: GridConfig {
                size: 6,
                layout: Layout {
                    obstacles: 2,
                    rewards: 2,
                    penalties: 1,
                    clearance: 3,
                },
            },
            game: GameConfig {
                move_interval_ms: 100,
                keep_q_table_on_reset: false,
                seed: Some(seed),
            },
            ..Default::default()
        }
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn moves_once_per_interval() {
        let mut session = Session::new(config(1)).unwrap();
        session.tick(ms(50)).unwrap();
        assert_eq!(session.game().episode().steps(), 0, "Too early to move");
        session.tick(ms(100)).unwrap();
        assert_eq!(session.game().episode().steps(), 1);
        session.tick(ms(150)).unwrap();
        assert_eq!(session.game().episode().steps(), 1);
        session.tick(ms(200)).unwrap();
        assert_eq!(session.game().episode().steps(), 2);
    }

    #[test]
    fn learning_reaches_the_goal() {
        let mut open = config(2);
        open.grid.layout.obstacles = 0;
        let mut session = Session::new(open).unwrap();
        let mut t = 0;
        while session.game().is_active() && t < 20_000 {
            t += 100;
            session.tick(ms(t)).unwrap();
        }
        // Without obstacles every move closes in on the goal
        assert_eq!(session.game().episode().state(), EpisodeState::Won);
        assert_eq!(session.game().position(), session.game().goal());

        let steps = session.game().episode().steps();
        session.tick(ms(t + 100)).unwrap();
        assert_eq!(session.game().episode().steps(), steps, "No moves after the episode");
    }

    #[test]
    fn time_limit_loses_the_episode() {
        let mut session = Session::new(config(3)).unwrap();
        session.tick(ms(31_000)).unwrap();
        assert_eq!(session.game().episode().state(), EpisodeState::Lost);
        assert!(!session.game().episode().won());
    }

    #[test]
    fn playback_walks_the_greedy_path() {
        let mut session = Session::new(config(4)).unwrap();
        session.toggle_path().unwrap();
        let path = session.path().unwrap().to_vec();
        assert_eq!(path[0], (0, 0));

        let mut t = 0;
        for &expected in &path[1..] {
            t += 100;
            session.tick(ms(t)).unwrap();
            assert_eq!(session.game().position(), expected);
        }
        if session.game().is_active() {
            session.tick(ms(t + 100)).unwrap();
            assert_eq!(session.mode(), &Mode::Learning, "Learning resumes after the path");
        } else {
            assert!(session.game().episode().won());
        }
    }

    #[test]
    fn reset_policy() {
        let mut session = Session::new(config(5)).unwrap();
        for t in 1..=5 {
            session.tick(ms(t * 100)).unwrap();
        }
        session.reset().unwrap();
        assert_eq!(session.game().position(), (0, 0));
        assert_eq!(session.game().episode().steps(), 0);
        assert!(
            session.learner().q_table().row((0, 0)).unwrap().iter().all(|&q| q == 0.0),
            "Learner is replaced on reset"
        );

        let mut keep = config(5);
        keep.game.keep_q_table_on_reset = true;
        let mut session = Session::new(keep).unwrap();
        session.tick(ms(100)).unwrap();
        let learned = session.learner().q_table().clone();
        session.reset().unwrap();
        assert_eq!(session.learner().q_table(), &learned, "Learner is kept on reset");
    }

    #[test]
    fn kept_learner_counts_finished_episodes() {
        let mut open = config(7);
        open.grid.layout.obstacles = 0;
        open.game.keep_q_table_on_reset = true;
        let mut session = Session::new(open).unwrap();

        for _ in 0..3 {
            let mut t = 0;
            while session.game().is_active() && t < 20_000 {
                t += 100;
                session.tick(ms(t)).unwrap();
            }
            assert!(session.game().episode().won());
            session.reset().unwrap();
        }
        assert_eq!(session.learner().episodes(), 3);

        // Abandoning an active episode does not count it
        session.tick(ms(100)).unwrap();
        session.reset().unwrap();
        assert_eq!(session.learner().episodes(), 3);
    }

    #[test]
    fn speed_bounds() {
        let mut session = Session::new(config(6)).unwrap();
        for _ in 0..20 {
            session.faster();
        }
        assert_eq!(session.move_interval(), MIN_MOVE_INTERVAL);
        for _ in 0..20 {
            session.slower();
        }
        assert_eq!(session.move_interval(), MAX_MOVE_INTERVAL);
    }
}
