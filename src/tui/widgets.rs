// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// First row to draw so that `selected` stays on screen.
pub fn window_start(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        0
    } else {
        (selected + 1).saturating_sub(visible)
    }
}

fn heading(text: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )])
}

pub fn get_help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "moviecat - Help",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        heading("Navigation:"),
        Line::from("  ↑/k ↓/j   - Move up / down"),
        Line::from("  PgUp/PgDn - Move by page"),
        Line::from("  Home/End  - Jump to first / last"),
        Line::from("  Tab       - Switch list"),
        Line::from("  Enter     - Open result / play / load"),
        Line::from("  Esc/b     - Back to results"),
        Line::from("  q         - Quit"),
        Line::from(""),
        heading("Search:"),
        Line::from("  /         - Type a query (searches as you type)"),
        Line::from("  Enter     - Search now"),
        Line::from("  p         - Trending titles"),
        Line::from(""),
        heading("Movie:"),
        Line::from("  Enter     - Play quality / toggle subtitle"),
        Line::from("  n         - Subtitles off"),
        Line::from("  t         - Play trailer"),
        Line::from("  i         - Toggle picture-in-picture"),
        Line::from("  o         - Show source link"),
        Line::from(""),
        heading("Playback:"),
        Line::from("  s         - Stop playback"),
        Line::from("  Ctrl+C    - Force quit"),
        Line::from(""),
        Line::from("Press any key to close this help"),
    ]
}

pub fn create_help_widget() -> Paragraph<'static> {
    Paragraph::new(get_help_lines())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Help "),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}
