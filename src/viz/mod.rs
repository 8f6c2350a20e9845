mod app;
mod components;
mod tui;
mod util;

pub use app::App;

/// Route `log` records to the in-app Logs tab
///
/// Call once before [`App::run`].
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    tui_logger::init_logger(level)?;
    tui_logger::set_default_level(level);
    Ok(())
}
