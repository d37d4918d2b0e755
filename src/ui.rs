pub mod charting;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use velo::config::CursorStyle;
use velo::engine::Status;
use velo::keystroke::CharOutcome;
use velo::metrics;
use velo::word_stats::{self, SpeedBucket};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;

pub fn draw(app: &App, f: &mut Frame) {
    let area = f.area();
    match app.state {
        AppState::Typing => draw_typing(app, f, area),
        AppState::Results => draw_results(app, f, area),
        AppState::History => draw_history(app, f, area),
    }
}

fn bucket_color(bucket: SpeedBucket) -> Color {
    match bucket {
        SpeedBucket::Crawl => Color::Red,
        SpeedBucket::Slow => Color::LightRed,
        SpeedBucket::Steady => Color::Yellow,
        SpeedBucket::Fast => Color::LightGreen,
        SpeedBucket::Blazing => Color::Green,
    }
}

fn draw_typing(app: &App, f: &mut Frame, area: Rect) {
    let dim_bold = Style::default().add_modifier(Modifier::BOLD | Modifier::DIM);

    let prompt = app.engine.prompt();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let mut prompt_occupied_lines =
        ((prompt.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;
    if prompt.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(
                ((area.height as f64 - prompt_occupied_lines as f64) / 2.0).max(0.0) as u16,
            ),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(
                ((area.height as f64 - prompt_occupied_lines as f64) / 2.0).max(0.0) as u16,
            ),
        ])
        .split(area);

    let header = match app.engine.status() {
        Status::Idle => "press any key to start".to_string(),
        Status::Paused => "paused - focus the terminal to resume".to_string(),
        _ => match app.engine.seconds_remaining() {
            Some(rem) => format!(
                "{} wpm   {}% acc   {:.0}s",
                app.engine.wpm(),
                app.engine.accuracy(),
                rem.max(0.0)
            ),
            None => format!(
                "{} wpm   {}% acc   {:.0}s",
                app.engine.wpm(),
                app.engine.accuracy(),
                app.engine.elapsed_ms() as f64 / 1000.0
            ),
        },
    };
    let header_widget = Paragraph::new(Span::styled(header, dim_bold)).alignment(Alignment::Center);
    f.render_widget(header_widget, chunks[1]);

    let prompt_widget = Paragraph::new(Line::from(prompt_spans(app)))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    f.render_widget(prompt_widget, chunks[2]);
}

fn prompt_spans(app: &App) -> Vec<Span<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green = Style::default().patch(bold).fg(Color::Green);
    let red = Style::default().patch(bold).fg(Color::Red);
    let magenta = Style::default().patch(bold).fg(Color::Magenta);
    let dim = Style::default().patch(bold).add_modifier(Modifier::DIM);
    let cursor_style = Style::default().patch(bold).add_modifier(
        match app.settings.cursor_style {
            CursorStyle::Block => Modifier::REVERSED,
            CursorStyle::Underline => Modifier::UNDERLINED,
            CursorStyle::Beam => Modifier::SLOW_BLINK,
        },
    );

    let states = app.engine.char_states();
    let cursor = app.engine.cursor();
    let mut spans = Vec::with_capacity(states.len() + 8);

    for (idx, (expected, state)) in app.engine.prompt().chars().zip(states.iter()).enumerate() {
        // overtyped chars at a space render ahead of the space itself
        for &extra in &state.extras {
            spans.push(Span::styled(extra.to_string(), magenta));
        }
        let at_cursor = idx == cursor;
        let (text, mut style) = match state.outcome {
            CharOutcome::Correct => (expected.to_string(), green),
            CharOutcome::Incorrect => {
                let typed = state.typed.unwrap_or(expected);
                let shown = if typed == ' ' { '\u{b7}' } else { typed };
                (shown.to_string(), red)
            }
            CharOutcome::Untyped => (expected.to_string(), dim),
        };
        if at_cursor {
            style = style.patch(cursor_style);
        }
        spans.push(Span::styled(text, style));
    }

    spans
}

fn draw_results(app: &App, f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold = Style::default().add_modifier(Modifier::BOLD | Modifier::DIM);
    let magenta = Style::default().fg(Color::Magenta);
    let gray = Style::default().fg(Color::DarkGray);
    let cyan = Style::default().fg(Color::Cyan);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // best delta
            Constraint::Length(1), // padding
            Constraint::Length(2), // word heatmap
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let Some(record) = app.engine.record() else {
        let empty = Paragraph::new(Span::styled("no finished session", dim_bold))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    };

    let net = metrics::wpm_series(&record.keystrokes);
    let raw = metrics::raw_series(&record.keystrokes);
    let (overall_duration, highest_wpm) =
        charting::chart_bounds(&[&net, &raw], record.duration_ms as f64 / 1000.0);

    let datasets = vec![
        Dataset::default()
            .name("raw")
            .marker(ratatui::symbols::Marker::Braille)
            .style(gray)
            .graph_type(GraphType::Line)
            .data(&raw),
        Dataset::default()
            .name("wpm")
            .marker(ratatui::symbols::Marker::Braille)
            .style(magenta)
            .graph_type(GraphType::Line)
            .data(&net),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(charting::format_label(overall_duration), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(charting::format_label(highest_wpm), bold),
                ]),
        );
    f.render_widget(chart, chunks[0]);

    let stats = format!(
        "{} wpm   {}% acc   {} raw   {} consistency   {:.1}s",
        record.wpm,
        record.accuracy,
        record.raw_wpm,
        record.consistency,
        record.duration_ms as f64 / 1000.0,
    );
    let stats_widget = Paragraph::new(Span::styled(stats, bold)).alignment(Alignment::Center);
    f.render_widget(stats_widget, chunks[1]);

    if let Some(best) = &app.best {
        let delta = record.wpm as i64 - best.wpm as i64;
        let text = if delta > 0 {
            format!("new personal best for {} (+{} wpm)", record.mode, delta)
        } else {
            format!("{} wpm behind your {} best", -delta, record.mode)
        };
        let delta_widget = Paragraph::new(Span::styled(text, cyan)).alignment(Alignment::Center);
        f.render_widget(delta_widget, chunks[2]);
    }

    if let Some(err) = &app.save_error {
        let notice = Paragraph::new(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        ))
        .alignment(Alignment::Center);
        f.render_widget(notice, chunks[3]);
    }

    let source_chars: Vec<char> = app.engine.prompt().chars().collect();
    let words = word_stats::analyze(&source_chars, &record.keystrokes, record.wpm as f64);
    let mut word_spans: Vec<Span> = Vec::with_capacity(words.len() * 2);
    for word in &words {
        let mut style = Style::default().fg(bucket_color(word.bucket));
        if word.has_error {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if word.skipped_from.is_some() {
            style = style.add_modifier(Modifier::DIM);
        }
        word_spans.push(Span::styled(word.text.clone(), style));
        word_spans.push(Span::raw(" "));
    }
    let heatmap = Paragraph::new(Line::from(word_spans))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(heatmap, chunks[4]);

    let legend = Paragraph::new(Span::styled("(r)etry (n)ew (h)istory (esc)ape", dim_bold))
        .alignment(Alignment::Center);
    f.render_widget(legend, chunks[6]);
}

fn draw_history(app: &App, f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold = Style::default().add_modifier(Modifier::BOLD | Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled("recent sessions", bold)).alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let now = chrono::Local::now();
    let lines: Vec<Line> = app
        .history
        .iter()
        .map(|s| {
            let ago_secs = (now - s.finished_at).num_seconds();
            let ago = HumanTime::from(-ago_secs);
            Line::from(Span::raw(format!(
                "{:>4} wpm  {:>3}%  {:>3} con  {:<8} {:<10} {}",
                s.wpm,
                s.accuracy,
                s.consistency,
                s.mode.to_string(),
                s.category,
                ago
            )))
        })
        .collect();

    if lines.is_empty() {
        let empty = Paragraph::new(Span::styled("nothing here yet", dim_bold))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[2]);
    } else {
        let list = Paragraph::new(lines).alignment(Alignment::Center);
        f.render_widget(list, chunks[2]);
    }

    let legend = Paragraph::new(Span::styled("(b)ack (n)ew (esc)ape", dim_bold))
        .alignment(Alignment::Center);
    f.render_widget(legend, chunks[3]);
}
