use thiserror::Error;

/// Errors produced by the grid world, the learner and the episode bookkeeping
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("coordinate ({row}, {col}) is outside the grid")]
    InvalidCoordinate { row: isize, col: isize },

    #[error("cell ({row}, {col}) is an obstacle")]
    Blocked { row: usize, col: usize },

    #[error("the goal is fixed at ({row}, {col})")]
    FixedGoal { row: usize, col: usize },

    #[error("cannot place {requested} items: only {available} cells are eligible")]
    InfeasiblePlacement { requested: usize, available: usize },

    #[error("no candidate actions to choose from")]
    EmptyCandidateSet,

    #[error("grid size {size} is too small (must be at least 2)")]
    InvalidGridSize { size: usize },

    #[error("invalid value for `{name}`: {value} is not in the interval [{min}, {max}]")]
    InvalidHyperparameter {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("reward schedule must satisfy goal > reward > empty > penalty")]
    InvalidRewardSchedule,

    #[error("episode is over")]
    EpisodeOver,

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
