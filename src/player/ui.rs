use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph,
        canvas::{self, Canvas},
    },
};

use super::app::{App, ViewMode};
use super::waveform;

const PLAYED_COLOR: Color = Color::White;
const UNPLAYED_COLOR: Color = Color::Cyan;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    draw_main_ui(f, app);

    if app.view_mode == ViewMode::Playlist {
        draw_playlist(f, size, app);
    }
}

fn layout_chunks(size: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(2), // Track info
            Constraint::Length(3), // Progress bar + time
            Constraint::Min(7),    // Waveform timeline
            Constraint::Length(2), // Controls
        ])
        .split(size)
}

/// Outer rectangle of the waveform timeline, used for mouse hit-testing.
pub fn waveform_area(size: Rect) -> Rect {
    layout_chunks(size)[3]
}

/// Drawable interior of the waveform timeline (inside the border).
pub fn waveform_inner_area(size: Rect) -> Rect {
    waveform_area(size).inner(Margin {
        horizontal: 1,
        vertical: 1,
    })
}

fn draw_main_ui(f: &mut Frame, app: &App) {
    let chunks = layout_chunks(f.area());

    let title = Paragraph::new("▶ wavedeck")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_track_info(f, chunks[1], app);
    draw_progress_bar(f, chunks[2], app);
    draw_waveform(f, chunks[3], app);
    draw_controls(f, chunks[4], app);
}

fn draw_track_info(f: &mut Frame, area: Rect, app: &App) {
    let info = if let Some(message) = &app.status_message {
        Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(file) = &app.current_file {
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        Line::from(vec![
            Span::raw(format!("Loaded: {filename}")),
            Span::styled(
                format!("   vol {:.0}%", app.volume() * 100.0),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        Line::from("No file loaded - press [p] to pick one from the playlist")
    };

    let widget = Paragraph::new(info).style(Style::default().fg(Color::White));
    f.render_widget(widget, area);

    let border = Block::default().borders(Borders::BOTTOM);
    f.render_widget(border, area);
}

fn draw_progress_bar(f: &mut Frame, area: Rect, app: &App) {
    let progress = app.session.position.clamp(0.0, 1.0);

    let time_info = if let Some(duration) = app.duration {
        let total_secs = duration.as_secs();
        let current_secs = (total_secs as f32 * progress) as u64;
        format!(
            "{} / {}",
            format_time(current_secs),
            format_time(total_secs)
        )
    } else {
        "00:00 / 00:00".to_string()
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(15)])
        .split(area);

    let percent = (progress * 100.0) as u16;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(percent)
        .label(Span::raw(format!("{percent}%")));
    f.render_widget(gauge, chunks[0]);

    let time_widget = Paragraph::new(time_info)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(time_widget, chunks[1]);
}

fn draw_waveform(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    if inner.width == 0 || inner.height == 0 {
        f.render_widget(block, area);
        return;
    }

    let Some(envelope) = &app.envelope else {
        let placeholder = if app.current_file.is_some() {
            "extracting waveform..."
        } else {
            "click the waveform to seek once a track is loaded"
        };
        let widget = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(widget, area);
        return;
    };

    let width = inner.width as usize;
    let height = inner.height as f32;
    let segments = waveform::render(envelope, width, height, app.session.position);

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([0.0, inner.width as f64])
        .y_bounds([0.0, inner.height as f64])
        .paint(move |ctx| {
            for seg in &segments {
                let color = if seg.played {
                    PLAYED_COLOR
                } else {
                    UNPLAYED_COLOR
                };
                // Segment y grows downward; canvas y grows upward
                ctx.draw(&canvas::Line {
                    x1: seg.x as f64,
                    y1: (height - seg.y_top) as f64,
                    x2: seg.x as f64,
                    y2: (height - seg.y_bottom) as f64,
                    color,
                });
            }
        });

    f.render_widget(canvas, area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let border = Block::default().borders(Borders::TOP);
    f.render_widget(border, rows[0]);

    let row = vec![
        if app.session.is_playing {
            Span::styled("[space]", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("[space]", Style::default().fg(Color::Green))
        },
        Span::raw(if app.session.is_playing {
            " pause  "
        } else {
            " play  "
        }),
        Span::styled("[←→]", Style::default().fg(Color::Magenta)),
        Span::raw(" seek  "),
        Span::styled("[click]", Style::default().fg(Color::Cyan)),
        Span::raw(" jump  "),
        Span::styled("[+/-]", Style::default().fg(Color::Blue)),
        Span::raw(" volume  "),
        Span::styled("[p]", Style::default().fg(Color::Blue)),
        Span::raw(" playlist  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let widget = Paragraph::new(Line::from(row)).alignment(Alignment::Center);
    let inner = area.inner(Margin {
        horizontal: 0,
        vertical: 1,
    });
    f.render_widget(widget, if inner.height > 0 { inner } else { area });
}

fn draw_playlist(f: &mut Frame, size: Rect, app: &App) {
    let area = centered_rect(60, 70, size);
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let filter_title = if app.filter_active {
        "filter (Enter to apply, Esc to close)"
    } else {
        "filter ( / to edit )"
    };
    let filter = Paragraph::new(app.playlist.filter.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(filter_title)
            .border_style(if app.filter_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            }),
    );
    f.render_widget(filter, chunks[0]);

    let items: Vec<ListItem> = app
        .playlist
        .visible_items()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            ListItem::new(name.to_string())
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("playlist ({} files)", app.playlist.filtered.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !app.playlist.filtered.is_empty() {
        state.select(Some(app.playlist.selected));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn centered_rect(percent_x: u16, percent_y: u16, size: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(size);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(61), "01:01");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn test_waveform_area_is_inside_frame() {
        let size = Rect::new(0, 0, 80, 24);
        let area = waveform_area(size);
        assert!(area.width > 0);
        assert!(area.height >= 7);
        assert!(area.right() <= size.right());
        assert!(area.bottom() <= size.bottom());
    }

    #[test]
    fn test_waveform_inner_area_shrinks_by_border() {
        let size = Rect::new(0, 0, 80, 24);
        let outer = waveform_area(size);
        let inner = waveform_inner_area(size);
        assert_eq!(inner.width, outer.width - 2);
        assert_eq!(inner.height, outer.height - 2);
    }

    #[test]
    fn test_centered_rect() {
        let size = Rect::new(0, 0, 100, 100);
        let rect = centered_rect(60, 70, size);
        assert_eq!(rect.width, 60);
        assert_eq!(rect.height, 70);
        assert_eq!(rect.x, 20);
        assert_eq!(rect.y, 15);
    }
}
