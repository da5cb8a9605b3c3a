use crate::audio::AudioEngine;
use crate::model::PlaybackState;
use crate::session::{Progress, Session, View};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "dirplay v0.1.0  ";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(10, 15, 24),
    panel_bg: Color::Rgb(19, 29, 43),
    panel_alt_bg: Color::Rgb(24, 38, 58),
    border: Color::Rgb(69, 121, 176),
    text: Color::Rgb(214, 228, 248),
    muted: Color::Rgb(149, 173, 204),
    accent: Color::Rgb(100, 203, 184),
    alert: Color::Rgb(249, 174, 88),
    selected_bg: Color::Rgb(34, 55, 82),
};

fn main_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area)
}

pub fn list_rect(area: Rect) -> Rect {
    main_layout(area)[1]
}

pub fn draw<A: AudioEngine + ?Sized>(
    frame: &mut Frame,
    session: &Session<A>,
    command_buffer: &str,
    command_mode: bool,
) {
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = main_layout(frame.area());

    let title = if session.title.is_empty() {
        "-"
    } else {
        session.title.as_str()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", session.controller.len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(mode_label(session), Style::default().fg(colors.alert)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            title,
            Style::default()
                .fg(colors.text)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(panel_block(
        "Now Playing",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(header, vertical[0]);

    match session.view {
        View::Playlist => draw_playlist(frame, session, vertical[1], &colors),
        View::Settings => draw_settings(frame, session, vertical[1], &colors),
    }

    let timeline = Paragraph::new(Span::styled(
        timeline_line(&session.progress, session.volume, 26, 14),
        Style::default().fg(colors.text),
    ))
    .block(panel_block(
        "Timeline",
        colors.panel_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(timeline, vertical[2]);

    let footer_line = if command_mode {
        Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(command_buffer, Style::default().fg(colors.text)),
        ])
    } else {
        Line::from(vec![
            Span::styled(keys_hint(session.view), Style::default().fg(colors.muted)),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(session.status.as_str(), Style::default().fg(colors.text)),
        ])
    };
    let footer = Paragraph::new(footer_line).block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, vertical[3]);
}

fn draw_playlist<A: AudioEngine + ?Sized>(
    frame: &mut Frame,
    session: &Session<A>,
    area: Rect,
    colors: &Palette,
) {
    let playing = match session.controller.state() {
        PlaybackState::Playing(index) => Some(index),
        PlaybackState::Stopped => None,
    };

    let items: Vec<ListItem> = session
        .controller
        .playlist()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let marker = if playing == Some(index) { "  > " } else { "    " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(name.as_str(), Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!session.controller.is_empty()).then_some(session.selected));

    let list = List::new(items)
        .block(panel_block(
            "Playlist",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_settings<A: AudioEngine + ?Sized>(
    frame: &mut Frame,
    session: &Session<A>,
    area: Rect,
    colors: &Palette,
) {
    let flags = session.clean_flags;
    let lines = vec![
        Line::from(vec![
            Span::styled(
                "Volume  ",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "{} {:>3}%",
                    progress_bar(Some(f64::from(session.volume) / 100.0), 20),
                    session.volume
                ),
                Style::default().fg(colors.text),
            ),
        ]),
        Line::from(vec![
            Span::styled(
                "Output  ",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                session
                    .audio()
                    .output_name()
                    .unwrap_or_else(|| String::from("-")),
                Style::default().fg(colors.muted),
            ),
        ]),
        setting_line(
            "Loop playlist",
            session.controller.loop_playlist(),
            "l",
            colors,
        ),
        setting_line("Repeat track", session.controller.repeat_one(), "r", colors),
        Line::from(""),
        Line::from(Span::styled(
            "Name cleanup",
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )),
        setting_line("Remove #hashtags", flags.hashtags, "1", colors),
        setting_line("Remove (parentheses)", flags.paren_groups, "2", colors),
        setting_line("Remove [brackets]", flags.bracket_groups, "3", colors),
        Line::from(Span::styled(
            "Press c to clean names (stops playback)",
            Style::default().fg(colors.alert),
        )),
    ];

    let panel = Paragraph::new(lines)
        .block(panel_block(
            "Settings",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn setting_line(label: &str, checked: bool, key: &str, colors: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(checkbox(checked), Style::default().fg(colors.accent)),
        Span::styled(format!(" {label}"), Style::default().fg(colors.text)),
        Span::styled(format!("  ({key})"), Style::default().fg(colors.muted)),
    ])
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn mode_label<A: AudioEngine + ?Sized>(session: &Session<A>) -> String {
    let repeat = if session.controller.repeat_one() {
        "Repeat"
    } else {
        "-"
    };
    let looping = if session.controller.loop_playlist() {
        "Loop"
    } else {
        "-"
    };
    format!("{repeat} {looping}")
}

fn keys_hint(view: View) -> &'static str {
    match view {
        View::Playlist => {
            "Keys: Enter play, Space pause, n next, p back, r repeat, o open, s settings, q quit"
        }
        View::Settings => "Keys: 1/2/3 toggle, c clean, l loop, +/- volume, s back",
    }
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(
    progress: &Progress,
    volume: u8,
    timeline_bar_width: usize,
    volume_bar_width: usize,
) -> String {
    format!(
        "{} / {} {}  |  Vol {} {:>3}%",
        format_duration(progress.position),
        progress
            .duration
            .map(format_duration)
            .unwrap_or_else(|| String::from("--:--")),
        progress_bar(progress.ratio(), timeline_bar_width),
        progress_bar(Some(f64::from(volume) / 100.0), volume_bar_width),
        volume
    )
}
