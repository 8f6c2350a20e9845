use ratatui::{prelude::*, widgets::*};

use crate::viz::util::centered;

fn key(label: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::from(label).light_cyan().bold(),
        Span::raw(description),
    ])
}

pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let lines = vec![
        key("  q  ", " : Quit"),
        key("  h  ", " : Toggle help popup"),
        key(" Tab ", " : Switch tabs"),
        key("  r  ", " : Restart the episode on a fresh grid"),
    ];

    let additional_lines = match selected_tab {
        0 | 1 => vec![
            key("Space", " : Toggle between learning and walking the greedy path"),
            key("- / +", " : Slower/faster agent moves"),
        ],
        2 => vec![key("⬅ / ➡", " : Switch plots")],
        3 => vec![
            key("  s  ", " : Toggles target selector widget hidden/visible"),
            key("  f  ", " : Toggle focus on the selected target only"),
            key("⬆ / ⬇", " : Switch log target"),
            key("⬅ / ➡", " : Reduce/increase shown log messages by one level"),
            key("- / +", " : Reduce/increase captured log messages by one level"),
            key("PgUp ", " : Enter page mode and scroll up in log history"),
            key("PgDn ", " : Only in page mode, scroll down in log history"),
            key(" Esc ", " : Exit page mode and go back to scrolling mode"),
            key("Space", " : Toggles hiding of targets with logfilter set to off"),
        ],
        _ => vec![],
    };

    let lines = [lines, additional_lines].concat();
    let popup = centered(area, 80, lines.len() as u16 + 4);

    Clear.render(popup, buf);

    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::proportional(1))
                .title("Help"),
        )
        .wrap(Wrap { trim: false })
        .render(popup, buf);
}
