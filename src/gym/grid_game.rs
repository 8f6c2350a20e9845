use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};

use super::{
    episode::{EpisodeController, RewardSchedule},
    grid_world::{Action, GridWorld, Layout, Pos},
};
use crate::{
    env::{DiscreteActionSpace, Environment, Report},
    Error, Result,
};

/// The grid game: an agent walking a [`GridWorld`] from the start to the goal,
/// scored by an [`EpisodeController`]
///
/// Intended for use with a [QLearner](crate::algo::QLearner)
#[derive(Debug, Clone)]
pub struct GridGame {
    world: GridWorld,
    episode: EpisodeController,
    layout: Layout,
    pos: Pos,
    rng: StdRng,
    pub report: Report,
}

impl GridGame {
    /// Generate a fresh `size`×`size` game
    pub fn new(
        size: usize,
        layout: Layout,
        time_limit: Duration,
        rewards: RewardSchedule,
        mut rng: StdRng,
    ) -> Result<Self> {
        let world = GridWorld::generate(size, &layout, &mut rng)?;
        let episode = EpisodeController::new(time_limit, rewards)?;
        Ok(Self::with_world(world, episode, layout, rng))
    }

    /// A game on a prepared grid. Layout and rng are only used on [`reset`](Environment::reset).
    pub fn with_world(
        world: GridWorld,
        episode: EpisodeController,
        layout: Layout,
        rng: StdRng,
    ) -> Self {
        Self {
            pos: world.start(),
            world,
            episode,
            layout,
            rng,
            report: Report::new(vec!["score", "steps"]),
        }
    }

    /// A game seeded for reproducible layouts
    pub fn seeded(
        size: usize,
        layout: Layout,
        time_limit: Duration,
        rewards: RewardSchedule,
        seed: u64,
    ) -> Result<Self> {
        Self::new(size, layout, time_limit, rewards, StdRng::seed_from_u64(seed))
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn episode(&self) -> &EpisodeController {
        &self.episode
    }

    pub fn position(&self) -> Pos {
        self.pos
    }

    pub fn goal(&self) -> Pos {
        self.world.goal()
    }

    /// Lose the episode if `elapsed` exceeds the time limit, see [`EpisodeController::check_time_limit`]
    pub fn check_time_limit(&mut self, elapsed: Duration) -> bool {
        self.episode.check_time_limit(elapsed)
    }

    /// Move the agent onto `dest` and account for the cell it lands on
    ///
    /// **Returns** `(next_state, reward)`, `next_state` being `None` when the goal was reached
    pub fn enter(&mut self, dest: Pos) -> Result<(Option<Pos>, f32)> {
        let outcome = self.episode.apply_outcome(&mut self.world, dest)?;
        self.pos = dest;
        self.world.visit(dest);

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report
            .entry("score")
            .and_modify(|x| *x += outcome.reward as f64);

        let next_state = (!outcome.won).then_some(dest);
        Ok((next_state, outcome.reward))
    }
}

impl DiscreteActionSpace for GridGame {
    fn actions(&self) -> Vec<Self::Action> {
        self.world.preferred_actions(self.pos, self.world.goal())
    }
}

impl Environment for GridGame {
    type State = Pos;
    type Action = Action;

    fn is_active(&self) -> bool {
        !self.episode.is_terminal()
    }

    fn step(&mut self, action: Self::Action) -> Result<(Option<Self::State>, f32)> {
        let Some(dest) = action.apply(self.pos, self.world.size()) else {
            let (dr, dc) = action.delta();
            return Err(Error::InvalidCoordinate {
                row: self.pos.0 as isize + dr,
                col: self.pos.1 as isize + dc,
            });
        };
        log::debug!("{action:?}: {:?} -> {dest:?}", self.pos);
        self.enter(dest)
    }

    fn reset(&mut self) -> Result<Self::State> {
        self.world.reset(&self.layout, &mut self.rng)?;
        self.episode.reset();
        self.pos = self.world.start();
        log::info!("New {0}x{0} grid generated", self.world.size());
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gym::{Cell, EpisodeState};

    fn open_game(size: usize) -> GridGame {
        let world = GridWorld::new(size).unwrap();
        let episode =
            EpisodeController::new(Duration::from_secs(30), RewardSchedule::default()).unwrap();
        let layout = Layout {
            obstacles: 0,
            rewards: 0,
            penalties: 0,
            clearance: 0,
        };
        GridGame::with_world(world, episode, layout, StdRng::seed_from_u64(0))
    }

    #[test]
    fn walking_to_the_goal() {
        let mut game = open_game(3);
        assert_eq!(game.actions(), vec![Action::Right, Action::Down]);

        assert_eq!(game.step(Action::Right).unwrap(), (Some((0, 1)), -0.5));
        assert_eq!(game.step(Action::Right).unwrap(), (Some((0, 2)), -0.5));
        assert_eq!(game.actions(), vec![Action::Down], "Only moves toward the goal");
        game.step(Action::Down).unwrap();
        assert_eq!(game.step(Action::Down).unwrap(), (None, 150.0));

        assert!(!game.is_active());
        assert_eq!(game.episode().state(), EpisodeState::Won);
        assert_eq!(game.report["steps"], 4.0);
        assert_eq!(game.report["score"], 148.5);
        assert!(game.world().is_visited((0, 2)));
        assert!(matches!(game.step(Action::Up), Err(Error::EpisodeOver)));
    }

    #[test]
    fn moves_off_the_grid_are_rejected() {
        let mut game = open_game(3);
        assert!(matches!(
            game.step(Action::Up),
            Err(Error::InvalidCoordinate { row: -1, col: 0 })
        ));
        assert_eq!(game.position(), (0, 0));
    }

    #[test]
    fn reset_regenerates() {
        let layout = Layout::default();
        let mut game = GridGame::seeded(
            10,
            layout,
            Duration::from_secs(30),
            RewardSchedule::default(),
            42,
        )
        .unwrap();
        game.step(Action::Right).unwrap();
        assert!(game.check_time_limit(Duration::from_secs(31)));
        assert!(!game.is_active());

        assert_eq!(game.reset().unwrap(), (0, 0));
        assert!(game.is_active());
        assert_eq!(game.episode().steps(), 0);
        assert_eq!(game.world().count(Cell::Reward), layout.rewards);
        assert!(!game.world().is_visited((0, 1)));
    }
}
