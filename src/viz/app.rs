use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help::render_help, Component, GridView, Logs, Plots, Update, ValuesView},
    tui::Tui,
    util::event_keycode,
};
use crate::session::Session;

const TABS: [&str; 4] = ["Game", "Values", "Episodes", "Logs"];
const TICK: Duration = Duration::from_millis(16);

#[derive(Default, PartialEq, Eq)]
enum State {
    #[default]
    Running,
    Quit,
}

/// The root TUI component which owns the session and runs the render loop
pub struct App {
    session: Session,
    state: State,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    logs: Logs,
    episode: u32,
    episode_start: Instant,
    finished_at: Option<Duration>,
}

impl App {
    pub fn new(session: Session, log_level: log::LevelFilter) -> Self {
        Self {
            session,
            state: State::default(),
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(vec!["Score", "Steps"]),
            logs: Logs::new(log_level),
            episode: 1,
            episode_start: Instant::now(),
            finished_at: None,
        }
    }

    /// Time on the episode clock, frozen once the episode is over
    fn elapsed(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(|| self.episode_start.elapsed())
    }

    /// Initialize the terminal and run the main loop
    ///
    /// Restores the terminal on exit
    pub fn run(&mut self) -> io::Result<()> {
        let mut terminal = Tui::init()?;
        self.restart_clock();

        while self.state == State::Running {
            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(TICK)? {
                let event = event::read()?;
                self.handle_event(&event);
            }

            self.advance();
        }

        Ok(())
    }

    fn restart_clock(&mut self) {
        self.episode_start = Instant::now();
        self.finished_at = None;
    }

    /// Tick the session and record the episode once it ends
    fn advance(&mut self) {
        if self.finished_at.is_some() {
            return;
        }

        let elapsed = self.elapsed();
        if let Err(e) = self.session.tick(elapsed) {
            log::error!("{e}");
        }

        let episode = self.session.game().episode();
        if episode.is_terminal() {
            self.finished_at = Some(elapsed);
            self.plots.update(Update {
                episode: self.episode,
                data: vec![episode.score() as f64, episode.steps() as f64],
            });
        }
    }

    fn reset(&mut self) {
        match self.session.reset() {
            Ok(()) => {
                self.episode += 1;
                self.restart_clock();
            }
            Err(e) => log::error!("Failed to reset: {e}"),
        }
    }

    fn handle_event(&mut self, event: &Event) {
        let Some(key) = event_keycode(event) else {
            return;
        };

        match key {
            KeyCode::Char('q') => self.state = State::Quit,
            KeyCode::Char('h') => self.show_help = !self.show_help,
            KeyCode::Tab => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            KeyCode::Char('r') => self.reset(),
            _ => match self.selected_tab {
                0 | 1 => match key {
                    KeyCode::Char(' ') => {
                        if let Err(e) = self.session.toggle_path() {
                            log::error!("{e}");
                        }
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') => self.session.faster(),
                    KeyCode::Char('-') | KeyCode::Char('_') => self.session.slower(),
                    _ => {}
                },
                2 => {
                    self.plots.handle_ui_event(event);
                }
                3 => {
                    self.logs.handle_ui_event(event);
                }
                _ => {}
            },
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Layout
        let [menu_area, main_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        // Menu
        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        // Main
        match self.selected_tab {
            0 => GridView::new(&self.session, self.elapsed()).render(main_area, buf),
            1 => ValuesView::new(&self.session).render(main_area, buf),
            2 => self.plots.render_ref(main_area, buf),
            3 => self.logs.render_ref(main_area, buf),
            _ => {}
        }

        // Footer
        Paragraph::new(Line::from(vec![
            format!(" Episode {} ", self.episode).bold(),
            format!(" Recorded {} ", self.plots.recorded()).dark_gray(),
            " h for help ".dark_gray(),
        ]))
        .render(footer_area, buf);

        if self.show_help {
            render_help(main_area, buf, self.selected_tab);
        }
    }
}
