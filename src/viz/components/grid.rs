use std::time::Duration;

use ratatui::{prelude::*, widgets::*};

use crate::{
    gym::{Cell, EpisodeState},
    session::{Mode, Session},
    viz::util::centered,
};

const AGENT: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const GOAL: Style = Style::new().fg(Color::LightBlue).add_modifier(Modifier::BOLD);

/// The game board with a status line, and a banner once the episode is over
pub struct GridView<'a> {
    session: &'a Session,
    elapsed: Duration,
}

impl<'a> GridView<'a> {
    pub fn new(session: &'a Session, elapsed: Duration) -> Self {
        Self { session, elapsed }
    }

    fn glyph(&self, pos: (usize, usize), cell: Cell) -> Span<'static> {
        let game = self.session.game();
        if pos == game.position() {
            return Span::styled(" @ ", AGENT);
        }
        let on_path = self.session.path().is_some_and(|p| p.contains(&pos));
        match cell {
            Cell::Obstacle => Span::styled("███", Style::new().fg(Color::Gray)),
            Cell::Reward => Span::styled(" $ ", Style::new().fg(Color::LightGreen)),
            Cell::Penalty => Span::styled(" ^ ", Style::new().fg(Color::LightRed)),
            Cell::Goal => Span::styled(" G ", GOAL),
            Cell::Empty if on_path => Span::styled(" * ", Style::new().fg(Color::Cyan)),
            Cell::Empty if game.world().is_visited(pos) => {
                Span::styled(" · ", Style::new().fg(Color::Yellow))
            }
            Cell::Empty => Span::styled(" . ", Style::new().fg(Color::DarkGray)),
        }
    }

    fn status(&self) -> Line<'static> {
        let episode = self.session.game().episode();
        let mode = match self.session.mode() {
            Mode::Learning => "Learning",
            Mode::Playback { .. } => "Path",
        };
        Line::from(vec![
            "Time ".dark_gray(),
            format!("{}s", episode.remaining(self.elapsed).as_secs()).bold(),
            "  Score ".dark_gray(),
            format!("{:.1}", episode.score()).bold(),
            "  Steps ".dark_gray(),
            episode.steps().to_string().bold(),
            "  Mode ".dark_gray(),
            mode.light_cyan(),
            "  Interval ".dark_gray(),
            format!("{}ms", self.session.move_interval().as_millis()).into(),
        ])
    }

    fn render_banner(&self, area: Rect, buf: &mut Buffer) {
        let episode = self.session.game().episode();
        let (message, color) = match episode.state() {
            EpisodeState::Won => (
                format!("You Won! Final Score: {:.1}", episode.score()),
                Color::LightGreen,
            ),
            EpisodeState::Lost => ("Time's Up! You Lost.".to_string(), Color::LightRed),
            EpisodeState::Active => return,
        };

        let banner = centered(area, message.len() as u16 + 8, 5);
        Clear.render(banner, buf);
        Paragraph::new(vec![
            Line::from(Span::styled(
                message,
                Style::new().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from("Press r to restart".white()),
        ])
        .alignment(Alignment::Center)
        .block(Block::bordered().border_type(BorderType::Rounded))
        .render(banner, buf);
    }
}

impl Widget for GridView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let world = self.session.game().world();
        let [status_area, board_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);

        Paragraph::new(self.status())
            .alignment(Alignment::Center)
            .render(status_area, buf);

        let rows = world
            .rows()
            .enumerate()
            .map(|(row, cells)| {
                let spans = cells
                    .iter()
                    .enumerate()
                    .map(|(col, &cell)| self.glyph((row, col), cell))
                    .collect::<Vec<_>>();
                Line::from(spans)
            })
            .collect::<Vec<_>>();

        let size = world.size() as u16;
        let board = centered(board_area, size * 3 + 2, size + 2);
        Paragraph::new(rows)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title("Grid"),
            )
            .render(board, buf);

        self.render_banner(board_area, buf);
    }
}
