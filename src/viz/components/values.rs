use ratatui::{prelude::*, widgets::*};

use crate::{gym::Action, session::Session, viz::util::centered};

const CELL_WIDTH: u16 = 8;

/// Heat map of the best Q value in each cell, with the action that achieves it
pub struct ValuesView<'a> {
    session: &'a Session,
}

impl<'a> ValuesView<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }
}

fn arrow(action: Action) -> char {
    match action {
        Action::Up => '↑',
        Action::Right => '→',
        Action::Down => '↓',
        Action::Left => '←',
    }
}

/// Green for positive values, red for negative, brighter with magnitude relative to `scale`
fn heat(value: f32, scale: f32) -> Color {
    let intensity = (value.abs() / scale).clamp(0.0, 1.0);
    let level = (60.0 + 195.0 * intensity) as u8;
    if value > 0.0 {
        Color::Rgb(0, level, 0)
    } else if value < 0.0 {
        Color::Rgb(level, 0, 0)
    } else {
        Color::DarkGray
    }
}

impl Widget for ValuesView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let table = self.session.learner().q_table();
        let size = table.size();
        let scale = self.session.config().episode.rewards.goal.abs().max(1.0);

        let lines = (0..size)
            .map(|row| {
                let spans = (0..size)
                    .map(|col| {
                        let values = table.row((row, col)).unwrap_or(&[]);
                        let best = values
                            .iter()
                            .enumerate()
                            .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
                                Some((_, b)) if b >= v => best,
                                _ => Some((i, v)),
                            });
                        match best.and_then(|(i, v)| Some((Action::from_repr(i)?, v))) {
                            Some((action, v)) if v != 0.0 => Span::styled(
                                format!("{}{:>6.1} ", arrow(action), v),
                                Style::new().fg(heat(v, scale)),
                            ),
                            _ => Span::styled(
                                format!("{:>7} ", "·"),
                                Style::new().fg(Color::DarkGray),
                            ),
                        }
                    })
                    .collect::<Vec<_>>();
                Line::from(spans)
            })
            .collect::<Vec<_>>();

        let size = size as u16;
        let board = centered(area, size * CELL_WIDTH + 2, size + 2);
        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(format!("Q values (episode {})", self.session.learner().episodes())),
            )
            .render(board, buf);
    }
}
