//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, ConnectionStatus, MessageAuthor};
use crate::client::LABEL_YOU;
use crate::command::LABEL_CRYPTO;

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    // Create main layout: header, messages, input
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header/status bar
            Constraint::Min(5),    // Messages area
            Constraint::Length(3), // Input area
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_messages(frame, app, chunks[1]);
    render_input(frame, app, chunks[2]);
}

/// Render the header/status bar.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status_color = match app.status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Error(_) => Color::Red,
        ConnectionStatus::Disconnected => Color::DarkGray,
        ConnectionStatus::Reconnecting => Color::Yellow,
    };

    let status_text = match &app.status {
        ConnectionStatus::Error(e) => format!("Error: {}", e),
        other => other.display().to_string(),
    };

    let title = format!(" iscat - {} ", app.relay_addr);

    let spans = vec![
        Span::styled(
            format!(" {} ", status_text),
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("{}↑ {}↓", app.messages_sent, app.messages_received),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(header, area);
}

/// Wrap text to fit within a given width (word-aware).
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in text.split_inclusive(|c: char| c.is_whitespace()) {
        let word_width = word.chars().count();

        if width + word_width <= max_width {
            current.push_str(word);
            width += word_width;
        } else if word_width <= max_width {
            // Word fits on a fresh line
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            width = word_width;
        } else {
            // Word is wider than the pane, break it mid-word
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            width = 0;
            for ch in word.chars() {
                if width >= max_width {
                    lines.push(std::mem::take(&mut current));
                    width = 0;
                }
                current.push(ch);
                width += 1;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Render the messages area.
fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize; // Account for borders
    let inner_width = area.width.saturating_sub(2) as usize; // Account for borders

    let mut all_lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        let (prefix, style) = match &msg.author {
            MessageAuthor::You => (
                format!("[{}] {}", msg.formatted_time(), LABEL_YOU),
                Style::default().fg(Color::Green),
            ),
            MessageAuthor::Peer(label) => (
                format!("[{}] {}", msg.formatted_time(), label),
                Style::default().fg(Color::Blue),
            ),
            MessageAuthor::Crypto => (
                format!("[{}] {}", msg.formatted_time(), LABEL_CRYPTO),
                Style::default().fg(Color::Magenta),
            ),
            MessageAuthor::System => (
                format!("[{}] ", msg.formatted_time()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
        };

        let prefix_len = prefix.chars().count();
        let content_width = inner_width.saturating_sub(prefix_len);

        if content_width == 0 || msg.content.is_empty() {
            // Just show prefix
            let line = Line::from(vec![
                Span::styled(prefix.clone(), style),
                Span::styled(msg.content.clone(), Style::default()),
            ]);
            all_lines.push(line);
        } else {
            // Wrap content; continuation lines are indented past the prefix
            let wrapped = wrap_text(&msg.content, content_width);
            for (i, part) in wrapped.into_iter().enumerate() {
                let lead = if i == 0 {
                    Span::styled(prefix.clone(), style)
                } else {
                    Span::styled(" ".repeat(prefix_len), Style::default())
                };
                all_lines.push(Line::from(vec![
                    lead,
                    Span::styled(part, Style::default()),
                ]));
            }
        }
    }

    // Calculate visible lines with scroll offset
    let total_lines = all_lines.len();
    let start_index = if total_lines > inner_height {
        total_lines
            .saturating_sub(inner_height)
            .saturating_sub(app.scroll_offset)
    } else {
        0
    };
    let end_index = start_index.saturating_add(inner_height).min(total_lines);

    let items: Vec<ListItem> = all_lines[start_index..end_index]
        .iter()
        .map(|line| ListItem::new(line.clone()))
        .collect();

    let scroll_indicator = if app.scroll_offset > 0 {
        format!(" [↑{}] ", app.scroll_offset)
    } else {
        String::new()
    };

    let messages_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Messages{}", scroll_indicator))
        .border_style(Style::default().fg(Color::White));

    let messages_list = List::new(items).block(messages_block);

    frame.render_widget(messages_list, area);
}

/// Render the input area.
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_style = if app.is_connected() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let placeholder = if app.is_connected() {
        if app.input.is_empty() {
            "Type a message... (/help for commands)"
        } else {
            ""
        }
    } else {
        "Waiting for connection..."
    };

    // Calculate visible portion of input (keep cursor visible)
    let inner_width = area.width.saturating_sub(2) as usize; // Account for borders
    let display_text = if app.input.is_empty() {
        placeholder.to_string()
    } else {
        let cursor = app.cursor_position;
        let input_chars: Vec<char> = app.input.chars().collect();
        let input_len = input_chars.len();

        if input_len <= inner_width {
            // Fits entirely
            app.input.clone()
        } else {
            // Need to scroll - keep cursor visible
            let start = if cursor >= inner_width {
                cursor.saturating_sub(inner_width - 1)
            } else {
                0
            };
            let end = (start + inner_width).min(input_len);
            input_chars[start..end].iter().collect()
        }
    };

    // Calculate cursor position within visible area
    let visible_cursor = if app.input.is_empty() {
        0
    } else {
        let input_len = app.input.chars().count();
        if input_len <= inner_width {
            app.cursor_position
        } else {
            let start = if app.cursor_position >= inner_width {
                app.cursor_position.saturating_sub(inner_width - 1)
            } else {
                0
            };
            app.cursor_position - start
        }
    };

    // Character counter - show remaining chars
    let remaining = app.remaining_chars();
    let counter_style = if remaining == 0 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if remaining <= 20 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title_left = " Input ";
    let counter_text = format!(" {}/{} ", app.input.chars().count(), app.max_message_len);

    let input = Paragraph::new(display_text)
        .style(if app.input.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            input_style
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title_left)
                .title_bottom(
                    Line::from(vec![Span::styled(counter_text, counter_style)]).right_aligned(),
                )
                .border_style(if app.is_connected() {
                    if remaining == 0 {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default().fg(Color::Green)
                    }
                } else {
                    Style::default().fg(Color::DarkGray)
                }),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);

    // Position cursor (using visible_cursor for scrolled input)
    if app.is_connected() {
        let cursor_x = area.x + 1 + visible_cursor as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x.min(area.x + area.width - 2), cursor_y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_fits_on_one_line() {
        assert_eq!(wrap_text("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn test_wrap_text_splits_on_words() {
        let lines = wrap_text("one two three", 8);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 8));
    }

    #[test]
    fn test_wrap_text_breaks_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_empty_input() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
