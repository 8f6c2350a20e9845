use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, style::Stylize, widgets::*};

use crate::viz::util::event_keycode;

use super::Component;

/// Metrics recorded at the end of an episode, in the order the plots were named
pub struct Update {
    pub episode: u32,
    pub data: Vec<f64>,
}

pub struct Plot {
    pub x_title: String,
    pub y_title: String,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
}

fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|x| format!("{x:.1}").bold())
        .collect()
}

impl Plot {
    pub fn new(y_label: &str) -> Self {
        Self {
            x_title: String::from("Episode"),
            y_title: String::from(y_label),
            x_bounds: [0.0, 1.0],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn update(&mut self, point: (f64, f64)) {
        self.x_bounds[0] = self.x_bounds[0].min(point.0);
        self.x_bounds[1] = self.x_bounds[1].max(point.0);
        self.y_bounds[0] = self.y_bounds[0].min(point.1);
        self.y_bounds[1] = self.y_bounds[1].max(point.1);
        self.data.push(point);
    }

    /// Y bounds padded so a flat series still spans the chart
    fn display_y_bounds(&self) -> [f64; 2] {
        if self.data.is_empty() {
            return [0.0, 1.0];
        }
        let [lo, hi] = self.y_bounds;
        if hi - lo < f64::EPSILON {
            [lo - 1.0, hi + 1.0]
        } else {
            [lo, hi]
        }
    }
}

impl Widget for &Plot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .cyan()
            .data(&self.data);

        let x_axis = Axis::default()
            .title(self.x_title.as_str())
            .dark_gray()
            .labels(labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_bounds = self.display_y_bounds();
        let y_axis = Axis::default()
            .title(self.y_title.as_str())
            .dark_gray()
            .labels(labels(y_bounds))
            .bounds(y_bounds);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Episodes")
            .padding(Padding::uniform(4));

        Chart::new(vec![dataset])
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One plot per metric, with a tab bar to switch between them
pub struct Plots {
    plot_names: Vec<&'static str>,
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: Vec<&'static str>) -> Self {
        let plots = names.iter().map(|k| Plot::new(k)).collect();
        Self {
            plot_names: names,
            plots,
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.plot_names.len()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Number of episodes recorded so far
    pub fn recorded(&self) -> usize {
        self.plots.first().map_or(0, Plot::len)
    }

    pub fn next_plot(&mut self) {
        self.selected = (self.selected + 1) % self.len()
    }

    pub fn prev_plot(&mut self) {
        let len = self.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn update(&mut self, update: Update) {
        let Update { episode, data } = update;
        for (plot, metric) in self.plots.iter_mut().zip(data) {
            plot.update((episode as f64, metric));
        }
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        Tabs::new(self.plot_names.iter().copied())
            .block(Block::default().padding(Padding::uniform(2)))
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render(area, buf);
        }
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match event_keycode(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}
