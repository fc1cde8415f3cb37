//! ratatui rendering of the dashboard.
//!
//! Sections with nothing to show (no reading yet, empty forecast) collapse
//! out of the layout instead of rendering empty frames.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use skydash_core::view::{
    CHART_DATASET_LABEL, ChartSeries, ForecastView, ReadingView, StatusLine,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let mut constraints = vec![
        Constraint::Length(3), // city input
        Constraint::Length(1), // status line
    ];
    if app.reading.is_some() {
        constraints.push(Constraint::Length(8));
    }
    if app.forecast.is_some() {
        constraints.push(Constraint::Length(7)); // cards
        constraints.push(Constraint::Min(10)); // chart
    }
    constraints.push(Constraint::Min(0)); // filler
    constraints.push(Constraint::Length(1)); // key hints

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_input(frame, &app.input, chunks[0]);
    render_status(frame, &app.status, chunks[1]);

    let mut next = 2;
    if let Some(reading) = &app.reading {
        render_reading(frame, reading, chunks[next]);
        next += 1;
    }
    if let Some(forecast) = &app.forecast {
        render_cards(frame, forecast, chunks[next]);
        render_chart(frame, &forecast.chart, chunks[next + 1]);
    }

    render_hints(frame, chunks[chunks.len() - 1]);
}

fn render_input(frame: &mut Frame, input: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" City ");
    frame.render_widget(Paragraph::new(input).block(block), area);

    let cursor_x = area.x + 1 + input.chars().count() as u16;
    frame.set_cursor_position(Position::new(
        cursor_x.min(area.right().saturating_sub(2)),
        area.y + 1,
    ));
}

fn render_status(frame: &mut Frame, status: &StatusLine, area: Rect) {
    let style = if status.is_error() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(status.text.clone(), style))),
        area,
    );
}

fn field(label: &'static str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::DarkGray)),
        Span::raw(value.to_string()),
    ])
}

fn render_reading(frame: &mut Frame, reading: &ReadingView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Current Conditions ");

    let lines = vec![
        Line::from(Span::styled(
            reading.location.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("Temperature  ", &reading.temperature),
        field("Condition    ", &reading.condition),
        field("Humidity     ", &reading.humidity),
        field("Wind         ", &reading.wind),
        field("Coordinates  ", &reading.coord),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_cards(frame: &mut Frame, forecast: &ForecastView, area: Rect) {
    let n = forecast.cards.len();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, n as u32); n])
        .split(area);

    for (card, column) in forecast.cards.iter().zip(columns.iter()) {
        let block = Block::default().borders(Borders::ALL);
        let lines = vec![
            Line::from(Span::styled(
                card.date.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(card.icon.clone())),
            Line::from(Span::raw(card.description.clone())),
            Line::from(Span::styled(card.temps.clone(), Style::default().fg(Color::Cyan))),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), *column);
    }
}

fn render_chart(frame: &mut Frame, series: &ChartSeries, area: Rect) {
    let datasets = vec![
        Dataset::default()
            .name(CHART_DATASET_LABEL)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&series.points),
    ];

    let x_labels = series
        .labels
        .iter()
        .map(|l| Span::styled(l.clone(), Style::default().fg(Color::DarkGray)))
        .collect::<Vec<_>>();

    let [y_lo, y_hi] = series.y_bounds;
    let y_labels = vec![
        Span::raw(format!("{y_lo:.1}")),
        Span::raw(format!("{:.1}", (y_lo + y_hi) / 2.0)),
        Span::raw(format!("{y_hi:.1}")),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" Forecast "))
        .x_axis(Axis::default().bounds(series.x_bounds).labels(x_labels))
        .y_axis(Axis::default().title("°C").bounds(series.y_bounds).labels(y_labels));

    frame.render_widget(chart, area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Enter search · Ctrl+L locate me · Esc quit",
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}
