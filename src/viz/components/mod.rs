pub mod grid;
pub mod help;
pub mod log;
pub mod plot;
pub mod values;

use crossterm::event::Event;
pub use grid::GridView;
pub use log::Logs;
pub use plot::{Plots, Update};
use ratatui::widgets::WidgetRef;
pub use values::ValuesView;

pub trait Component: WidgetRef {
    fn handle_ui_event(&mut self, event: &Event) -> bool;
}
