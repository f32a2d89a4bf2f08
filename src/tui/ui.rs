// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::app::{App, Focus, Screen};
use super::widgets::{centered_rect, create_help_widget, window_start};

/// One list panel: its rows, cursor and the entry currently in use.
struct ListPanel<'a> {
    title: &'a str,
    rows: Vec<String>,
    selected: usize,
    focused: bool,
    active: Option<usize>,
    empty: &'a str,
}

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    app.update_visible_height(size.height as usize);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);
    draw_content(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame, size);
    }

    if let Some(message) = &app.alert {
        draw_alert_overlay(frame, size, message);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let header_text = match app.screen {
        Screen::Home => "moviecat".to_string(),
        Screen::Movie => app
            .movie
            .view()
            .and_then(|v| v.subject.as_ref())
            .map(|s| s.title.clone())
            .unwrap_or_else(|| "Movie".to_string()),
        Screen::Series => app
            .series
            .as_ref()
            .and_then(|v| v.subject.as_ref())
            .map(|s| s.title.clone())
            .unwrap_or_else(|| "Series".to_string()),
    };

    let header = Paragraph::new(header_text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );

    frame.render_widget(header, area);
}

fn draw_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(50),    // Main content
            Constraint::Length(40), // Side panel (logs/info)
        ])
        .split(area);

    match app.screen {
        Screen::Home => draw_home(frame, app, chunks[0]),
        Screen::Movie => draw_movie(frame, app, chunks[0]),
        Screen::Series => draw_series(frame, app, chunks[0]),
    }

    draw_side_panel(frame, app, chunks[1]);
}

fn draw_home(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.results.count_label {
        Some(label) => format!(" Results: {} ", label),
        None => " Results ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.results.cards.is_empty() {
        let text = if app.results_loading {
            "Loading..."
        } else {
            app.results.message.as_deref().unwrap_or("")
        };
        let msg = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    }

    let visible = inner.height as usize;
    let selected = app.results_nav.selected_index;
    let start = window_start(selected, visible);

    let items: Vec<ListItem> = app
        .results
        .cards
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(index, card)| {
            let marker = if index == selected { " ▶ " } else { "   " };
            let mut style = Style::default();
            if card.route.is_none() {
                style = style.fg(Color::DarkGray);
            }
            if index == selected {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(card.title.clone()),
                Span::styled(
                    format!("  {}", card.caption),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
            .style(style)
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

fn info_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", title))
}

fn draw_movie(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    match app.movie.view() {
        None => lines.push(Line::from("Loading...")),
        Some(view) => {
            if let Some(error) = &view.error {
                lines.push(Line::from(error.clone()).style(Style::default().fg(Color::Red)));
            } else if let Some(subject) = &view.subject {
                lines.push(
                    Line::from(subject.title.clone())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                );
                lines.push(Line::from(subject.description.clone()));
                if let Some(cover) = &subject.cover {
                    lines.push(
                        Line::from(format!("Cover: {}", cover))
                            .style(Style::default().fg(Color::DarkGray)),
                    );
                }
            }
            if let Some(trailer) = &view.trailer {
                lines.push(
                    Line::from(format!("Trailer: {}  (t to play)", trailer.embed_url()))
                        .style(Style::default().fg(Color::Cyan)),
                );
            }
        }
    }
    if let Some(link) = app.movie.surface().download_link() {
        lines.push(
            Line::from(format!("Download: {}", link)).style(Style::default().fg(Color::DarkGray)),
        );
    }
    if app.movie.surface().picture_in_picture() {
        lines.push(Line::from("Picture-in-picture on"));
    }

    let info = Paragraph::new(lines)
        .block(info_block("Info"))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let view = app.movie.view();
    let qualities: Vec<String> = view
        .map(|v| v.qualities.iter().map(|q| q.text.clone()).collect())
        .unwrap_or_default();
    draw_list_panel(
        frame,
        columns[0],
        ListPanel {
            title: "Quality",
            rows: qualities,
            selected: app.sources_nav.selected_index,
            focused: app.focus == Focus::Sources,
            active: app.movie.active_source(),
            empty: "No sources",
        },
    );

    let subtitles: Vec<String> = view
        .map(|v| v.subtitles.iter().map(|s| s.name.clone()).collect())
        .unwrap_or_default();
    let active_sub = app
        .movie
        .active_subtitle()
        .and_then(|name| subtitles.iter().position(|s| s == name));
    draw_list_panel(
        frame,
        columns[1],
        ListPanel {
            title: "Subtitles",
            rows: subtitles,
            selected: app.subtitles_nav.selected_index,
            focused: app.focus == Focus::Subtitles,
            active: active_sub,
            empty: "Subtitles (none)",
        },
    );
}

fn draw_series(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    match &app.series {
        None => lines.push(Line::from("Loading series...")),
        Some(view) => {
            if let Some(message) = &view.message {
                lines.push(Line::from(message.clone()).style(Style::default().fg(Color::Red)));
            }
            if let Some(subject) = &view.subject {
                lines.push(
                    Line::from(subject.title.clone())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                );
                lines.push(Line::from(subject.description.clone()));
            }
            for notice in &view.seasons.notices {
                lines.push(Line::from(notice.clone()).style(Style::default().fg(Color::DarkGray)));
            }
        }
    }
    let info = Paragraph::new(lines)
        .block(info_block("Series"))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(45),
            Constraint::Percentage(30),
        ])
        .split(chunks[1]);

    let seasons: Vec<String> = app
        .series
        .as_ref()
        .map(|s| s.seasons.buttons.iter().map(|b| b.label.clone()).collect())
        .unwrap_or_default();
    draw_list_panel(
        frame,
        columns[0],
        ListPanel {
            title: "Seasons",
            rows: seasons,
            selected: app.seasons_nav.selected_index,
            focused: app.focus == Focus::Seasons,
            active: None,
            empty: "",
        },
    );

    let (episodes, episodes_empty) = match &app.episodes {
        _ if app.episodes_loading => (Vec::new(), "Loading episodes..."),
        Some(list) => (
            list.cards.iter().map(|c| c.title.clone()).collect(),
            list.message.as_deref().unwrap_or(""),
        ),
        None => (Vec::new(), ""),
    };
    draw_list_panel(
        frame,
        columns[1],
        ListPanel {
            title: "Episodes",
            rows: episodes,
            selected: app.episodes_nav.selected_index,
            focused: app.focus == Focus::Episodes,
            active: None,
            empty: episodes_empty,
        },
    );

    let player_view = app.episode_player.view();
    let title = player_view.map_or("Episode", |v| v.title.as_str());
    let (sources, sources_empty) = match player_view {
        _ if app.episode_sources_loading => (Vec::new(), "Loading..."),
        Some(v) => (
            v.sources.iter().map(|s| s.label.clone()).collect(),
            v.message.as_deref().unwrap_or(""),
        ),
        None => (Vec::new(), ""),
    };
    draw_list_panel(
        frame,
        columns[2],
        ListPanel {
            title,
            rows: sources,
            selected: app.episode_sources_nav.selected_index,
            focused: app.focus == Focus::EpisodeSources,
            active: app.episode_player.active(),
            empty: sources_empty,
        },
    );
}

fn draw_list_panel(frame: &mut Frame, area: Rect, panel: ListPanel<'_>) {
    let border = if panel.focused {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {} ", panel.title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if panel.rows.is_empty() {
        let msg = Paragraph::new(panel.empty)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }

    let visible = inner.height as usize;
    let start = window_start(panel.selected, visible);
    let items: Vec<ListItem> = panel
        .rows
        .into_iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(index, row)| {
            let active = panel.active == Some(index);
            let marker = match (index == panel.selected && panel.focused, active) {
                (true, _) => " ▶ ",
                (false, true) => " ● ",
                _ => "   ",
            };
            let mut style = Style::default();
            if active {
                style = style.fg(Color::Green);
            }
            if index == panel.selected && panel.focused {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(vec![Span::raw(marker), Span::raw(row)])).style(style)
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

fn draw_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Logs
            Constraint::Length(5), // Info
        ])
        .split(area);

    draw_logs_panel(frame, app, chunks[0]);
    draw_info_panel(frame, app, chunks[1]);
}

fn draw_logs_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Logs ");

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if app.logs.is_empty() {
        return;
    }

    // Show most recent logs that fit in the area
    let visible_count = inner_area.height as usize;
    let start = app.logs.len().saturating_sub(visible_count);

    let log_lines: Vec<Line> = app.logs[start..]
        .iter()
        .map(|(at, msg)| {
            Line::from(vec![
                Span::styled(
                    at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(msg.clone()),
            ])
            .style(Style::default().fg(Color::Gray))
        })
        .collect();

    let logs = Paragraph::new(log_lines).wrap(Wrap { trim: true });
    frame.render_widget(logs, inner_area);
}

fn draw_info_panel(frame: &mut Frame, app: &App, area: Rect) {
    let info_text = match app.screen {
        Screen::Home => vec![
            Line::from("Press '/' to search"),
            Line::from("Press 'p' for trending"),
            Line::from("Press '?' for help"),
        ],
        Screen::Movie => vec![
            Line::from("Tab: quality / subtitles"),
            Line::from("t: trailer  i: pip  n: no subs"),
            Line::from("s: stop  Esc: back"),
        ],
        Screen::Series => vec![
            Line::from("Tab: seasons / episodes / sources"),
            Line::from("s: stop  Esc: back"),
            Line::from("Press '?' for help"),
        ],
    };

    let info = Paragraph::new(info_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Info "),
        )
        .style(Style::default().fg(Color::Cyan));

    frame.render_widget(info, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer_text = if let Some(msg) = &app.status_message {
        if app.input_active && app.search_pending() {
            format!("{} …", msg)
        } else {
            msg.clone()
        }
    } else {
        " ↑↓/jk: Navigate | Enter: Select | /: Search | Esc/b: Back | q: Quit ".to_string()
    };

    let style = if app.input_active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let footer = Paragraph::new(footer_text)
        .style(style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, help_area);
    frame.render_widget(create_help_widget(), help_area);
}

fn draw_alert_overlay(frame: &mut Frame, area: Rect, message: &str) {
    let alert_area = centered_rect(40, 25, area);
    frame.render_widget(Clear, alert_area);

    let alert = Paragraph::new(vec![
        Line::from(""),
        Line::from(message).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from("Press Enter or Esc to continue").style(Style::default().fg(Color::Gray)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Alert "),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(alert, alert_area);
}
