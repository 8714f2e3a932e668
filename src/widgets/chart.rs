//! Plot overlay: numeric columns as line series against row position.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Clear, Dataset, GraphType, LegendPosition, Paragraph, Widget},
};

use crate::chart_data::PlotSeries;

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

pub struct PlotView<'a> {
    series: &'a [PlotSeries],
    border_color: Color,
    text_color: Color,
}

impl<'a> PlotView<'a> {
    pub fn new(series: &'a [PlotSeries], border_color: Color, text_color: Color) -> Self {
        Self {
            series,
            border_color,
            text_color,
        }
    }
}

fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Min and max over all points, widened when the range is empty.
fn bounds(series: &[PlotSeries]) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in series.iter().flat_map(|s| s.points.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if x_max <= x_min {
        x_min -= 0.5;
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max = y_min + 1.0;
    }
    ([x_min, x_max], [y_min, y_max])
}

impl Widget for PlotView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
            .title(Line::from("Plot").centered())
            .title_bottom(Line::from(" Esc Close ").centered());
        let inner = block.inner(area);
        block.render(area, buf);

        if self.series.iter().all(|s| s.points.is_empty()) {
            Paragraph::new("No valid data points")
                .style(Style::default().fg(self.text_color))
                .centered()
                .render(inner, buf);
            return;
        }

        let datasets: Vec<Dataset> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Dataset::default()
                    .name(s.name.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                    .data(&s.points)
            })
            .collect();

        let ([x_min, x_max], [y_min, y_max]) = bounds(self.series);
        let label_style = Style::default().fg(self.text_color);
        let labels = |lo: f64, hi: f64| {
            vec![
                Span::styled(format_axis_label(lo), label_style),
                Span::styled(format_axis_label((lo + hi) / 2.0), label_style),
                Span::styled(format_axis_label(hi), label_style),
            ]
        };

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("row")
                    .bounds([x_min, x_max])
                    .style(label_style)
                    .labels(labels(x_min, x_max)),
            )
            .y_axis(
                Axis::default()
                    .bounds([y_min, y_max])
                    .style(label_style)
                    .labels(labels(y_min, y_max)),
            )
            .legend_position(Some(LegendPosition::TopRight))
            .render(inner, buf);
    }
}
