use std::{error::Error, path::Path};

use qgrid::{config::Config, session::Session, viz};

const DEFAULT_CONFIG: &str = "qgrid.toml";

fn main() -> Result<(), Box<dyn Error>> {
    let level = log::LevelFilter::Info;
    viz::init_logger(level)?;

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(DEFAULT_CONFIG)?,
        None => Config::default(),
    };

    let session = Session::new(config)?;
    viz::App::new(session, level).run()?;

    Ok(())
}
