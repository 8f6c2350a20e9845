pub mod episode;
pub mod grid_game;
pub mod grid_world;

pub use episode::{EpisodeController, EpisodeState, Outcome, RewardSchedule};
pub use grid_game::GridGame;
pub use grid_world::{manhattan, Action, Cell, GridWorld, Layout, Pos};
