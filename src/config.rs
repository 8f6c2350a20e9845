use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    algo::QLearnerConfig,
    gym::{GridWorld, Layout, RewardSchedule},
    Error, Result,
};

const MIN_CLEARANCE: usize = 2;

/// Grid dimensions and item counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: usize,
    #[serde(flatten)]
    pub layout: Layout,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 10,
            layout: Layout::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Seconds before an active episode is lost
    pub time_limit: f32,
    pub rewards: RewardSchedule,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            time_limit: 30.0,
            rewards: RewardSchedule::default(),
        }
    }
}

impl EpisodeConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f32(self.time_limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Milliseconds between agent moves
    pub move_interval_ms: u64,
    /// Keep learned values when the game is reset instead of starting from scratch
    pub keep_q_table_on_reset: bool,
    /// Seed for layout generation and exploration, random if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_interval_ms: 400,
            keep_q_table_on_reset: false,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }
}

/// Session configuration, read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub learner: QLearnerConfig,
    pub episode: EpisodeConfig,
    pub game: GameConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check every section, including that the layout fits on the grid
    pub fn validate(&self) -> Result<()> {
        self.learner.validate()?;
        self.episode.rewards.validate()?;
        if !(self.episode.time_limit.is_finite() && self.episode.time_limit > 0.0) {
            return Err(Error::InvalidHyperparameter {
                name: "time_limit",
                value: self.episode.time_limit,
                min: 0.0,
                max: f32::INFINITY,
            });
        }
        // Items next to the start could box the agent in before its first move
        if self.grid.layout.clearance < MIN_CLEARANCE {
            return Err(Error::InvalidHyperparameter {
                name: "clearance",
                value: self.grid.layout.clearance as f32,
                min: MIN_CLEARANCE as f32,
                max: f32::INFINITY,
            });
        }
        GridWorld::new(self.grid.size)?.check_layout(&self.grid.layout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serialization_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::from_toml_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [grid]
            size = 8
            obstacles = 6

            [learner]
            epsilon = 0.0

            [episode.rewards]
            goal = 200.0
            "#,
        )
        .unwrap();
        assert_eq!(config.grid.size, 8);
        assert_eq!(config.grid.layout.obstacles, 6);
        assert_eq!(config.grid.layout.rewards, 10);
        assert_eq!(config.learner.epsilon, 0.0);
        assert_eq!(config.learner.alpha, 0.4);
        assert_eq!(config.episode.rewards.goal, 200.0);
        assert_eq!(config.episode.rewards.reward, 15.0);
        assert_eq!(config.game.move_interval(), Duration::from_millis(400));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("[grid]\nsize = 3\nobstacles = 20"),
            Err(Error::InfeasiblePlacement { .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[learner]\ngamma = 2.0"),
            Err(Error::InvalidHyperparameter { name: "gamma", .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[episode]\ntime_limit = -1.0"),
            Err(Error::InvalidHyperparameter { name: "time_limit", .. })
        ));
        assert!(matches!(
            Config::from_toml_str("[grid]\nclearance = 1"),
            Err(Error::InvalidHyperparameter { name: "clearance", .. })
        ));
        assert!(Config::from_toml_str("[grid]\nclearance = 2").is_ok());
        assert!(matches!(
            Config::from_toml_str("[grid]\nsize = \"ten\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn read_from_file() {
        let config = Config::load("./qgrid.toml").expect("Failed to read the sample config");
        assert_eq!(config.grid.size, 10);
    }
}
