use std::{error::Error, fs};

use qgrid::{
    algo::QLearner,
    config::Config,
    env::Environment,
    gym::GridGame,
};
use rand::{rngs::StdRng, SeedableRng};

const NUM_EPISODES: u32 = 500;
const SEED: u64 = 7;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::default();
    config.validate()?;
    let size = config.grid.size;
    let max_steps = 4 * size * size;

    let mut env = GridGame::seeded(
        size,
        config.grid.layout,
        config.episode.time_limit(),
        config.episode.rewards,
        SEED,
    )?;
    let mut agent = QLearner::new(size, config.learner)?;
    let mut rng = StdRng::seed_from_u64(SEED + 1);

    fs::create_dir_all("demos/out")?;
    let mut wtr = csv::Writer::from_path("demos/out/training.csv")?;
    wtr.write_record(["episode", "score", "steps", "won"])?;

    let mut wins = 0;
    for e in 0..NUM_EPISODES {
        agent.go(&mut env, &mut rng, max_steps)?;
        let won = env.episode().won();
        wins += won as u32;

        let report = env.report.take();
        wtr.write_record([
            e.to_string(),
            format!("{:.1}", report["score"]),
            report["steps"].to_string(),
            won.to_string(),
        ])?;

        if (e + 1) % 100 == 0 {
            log::info!("Episode {}: {wins} wins so far", e + 1);
        }
    }

    wtr.flush()?;

    // Walk the learned policy on a fresh grid
    env.reset()?;
    let path = agent.greedy_path(env.position(), env.goal(), env.world())?;
    log::info!("Greedy path on a fresh grid: {} cells, {path:?}", path.len());

    Ok(())
}
