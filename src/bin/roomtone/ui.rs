//! Rendering: source list, room status, and the EQ response curve.
//!
//! The curve panel plots `eq::response_db` for the selected source —
//! the exact function the engine itself reasons with, so what the user
//! sees while editing is what the audio does.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use roomtone::effects::EffectKind;
use roomtone::eq;

use crate::app::App;

/// Frequency range of the response plot, plotted in log2(Hz).
const PLOT_MIN_HZ: f64 = 40.0;
const PLOT_MAX_HZ: f64 = 16_000.0;
const PLOT_POINTS: usize = 96;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header / effects bar
            Constraint::Min(5),     // Source list
            Constraint::Length(12), // EQ response curve
            Constraint::Length(1),  // Help bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_sources(frame, chunks[1], app);
    render_eq_curve(frame, chunks[2], app);
    render_help(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let effect = |label: &str, enabled: bool| {
        Span::styled(
            format!(" {label}:{} ", if enabled { "on" } else { "off" }),
            Style::default().fg(if enabled { Color::Green } else { Color::DarkGray }),
        )
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} sources  ", app.registry.sound_count()),
            Style::default().fg(Color::Cyan),
        ),
        effect("reverb", app.registry.is_effect_enabled(EffectKind::Reverb)),
        effect("delay", app.registry.is_effect_enabled(EffectKind::Delay)),
        effect("lofi", app.registry.is_effect_enabled(EffectKind::Lofi)),
    ]);

    let block = Block::default().title(" roomtone ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_sources(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::with_capacity(app.ids.len());

    for (index, id) in app.ids.iter().enumerate() {
        let volume = app.registry.get_sound_volume(id).unwrap_or(0.0);
        let muted = app.registry.is_muted(id).unwrap_or(false);
        let (x, y) = app.registry.get_sound_position(id).unwrap_or((0.0, 0.0));
        let emoji = app.registry.sound_emoji(id).unwrap_or("·");

        let bar_width = 16;
        let filled = (volume * bar_width as f32).round() as usize;
        let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);

        let style = if index == app.selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!(
                    " {} {:<12} {} {:>3.0}%  ({:+.2}, {:+.2}) {}",
                    emoji,
                    id,
                    bar,
                    volume * 100.0,
                    x,
                    y,
                    if muted { "[muted]" } else { "" },
                ),
                style,
            ),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            " no sources loaded ",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default().title(" Room ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_eq_curve(frame: &mut Frame, area: Rect, app: &App) {
    let Some(id) = app.ids.get(app.selected) else {
        let block = Block::default().title(" EQ ").borders(Borders::ALL);
        frame.render_widget(block, area);
        return;
    };
    let Some(bands) = app.registry.get_sound_eq(id) else {
        return;
    };

    // Log-spaced samples of the shared response function.
    let ratio = (PLOT_MAX_HZ / PLOT_MIN_HZ).powf(1.0 / (PLOT_POINTS - 1) as f64);
    let mut points = Vec::with_capacity(PLOT_POINTS);
    let mut frequency = PLOT_MIN_HZ;
    for _ in 0..PLOT_POINTS {
        let db = eq::response_db(&bands, frequency as f32) as f64;
        points.push((frequency.log2(), db));
        frequency *= ratio;
    }

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let band = bands[app.band];
    let title = format!(
        " EQ: {}  (band {} @ {} Hz, {:+.0} dB) ",
        id,
        app.band + 1,
        band.frequency_hz,
        band.gain_db,
    );

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([PLOT_MIN_HZ.log2(), PLOT_MAX_HZ.log2()])
                .labels(vec!["40", "400", "4k", "16k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([eq::MIN_GAIN_DB as f64 - 2.0, eq::MAX_GAIN_DB as f64 + 2.0])
                .labels(vec!["-12", "0", "+12"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        " [jk] select  [hl] volume  [wasd] move  [m] mute  [tab -/=] EQ band  [1-6] preset  [r/e/f] effects  [q] quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}
