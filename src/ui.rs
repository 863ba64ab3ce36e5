use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, InputMode, Screen, SelectionFocus};
use crate::chat::ChatRole;
use crate::selection::Step;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    match app.screen {
        Screen::Selection => render_selection_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" 語学トレーニング ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Selection => " SELECT ",
        Screen::Chat => " CHAT ",
    };

    let hints = match (app.screen, app.input_mode) {
        (Screen::Selection, _) => " j/k choose | Tab move | Enter apply | q quit",
        (Screen::Chat, InputMode::Editing) => " Enter send | Esc normal mode",
        (Screen::Chat, InputMode::Normal) => " i edit | j/k scroll | b back | q quit",
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

fn render_selection_screen(app: &App, frame: &mut Frame, area: Rect) {
    let [title_area, steps_area, cards_area, _, start_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(5),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let title = Paragraph::new("出題選択")
        .bold()
        .alignment(Alignment::Center);
    frame.render_widget(title, title_area);

    // Step indicator: a step lights up once its gate opens
    let mut spans: Vec<Span> = Vec::new();
    let steps = [Step::Language, Step::Difficulty, Step::QuestionType];
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ── ", Style::default().fg(Color::DarkGray)));
        }
        let style = if app.flow.step_active(*step) {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("0{} {}", i + 1, step.label()), style));
    }
    let indicator = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(indicator, steps_area);

    // Three option cards, left to right in gate order
    let [lang_area, diff_area, qtype_area] =
        Layout::horizontal([Constraint::Ratio(1, 3); 3]).areas(cards_area);
    render_card(app, frame, lang_area, Step::Language);
    render_card(app, frame, diff_area, Step::Difficulty);
    render_card(app, frame, qtype_area, Step::QuestionType);

    // Start button, enabled only once every step is satisfied
    let can_start = app.flow.can_start();
    let start_focused = app.focus == SelectionFocus::Start;
    let start_style = if can_start {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_color = if start_focused {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let start = Paragraph::new("学習開始")
        .style(start_style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        );
    frame.render_widget(start, start_area);
}

fn render_card(app: &App, frame: &mut Frame, area: Rect, step: Step) {
    let active = app.flow.step_active(step);
    let focused = app.focus == SelectionFocus::Card(step);
    let border_color = if focused {
        Color::Cyan
    } else if active {
        Color::White
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", step.label()));

    let mut lines: Vec<Line> = Vec::new();
    for (i, option) in step.options().iter().enumerate() {
        let selected = app.flow.selected(step) == Some(*option);
        let at_cursor = focused && i == app.card_cursor;
        let marker = if at_cursor { "> " } else { "  " };
        let style = if selected {
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD)
        } else if !active {
            Style::default().fg(Color::DarkGray)
        } else if at_cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, option),
            style,
        )));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store transcript dimensions for scroll calculations (inner size minus borders)
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    let Some(chat) = app.chat.as_ref() else {
        return;
    };

    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", chat.header_title()));

    let transcript_text = if chat.messages().is_empty() && !chat.pending() {
        Text::from(Span::styled(
            "こちらのチャット欄から回答してみましょう。",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in chat.messages() {
            let label = match msg.role {
                ChatRole::User => ("You:", Color::Cyan),
                ChatRole::Assistant => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label.0,
                Style::default().fg(label.1).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if chat.pending() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("AIが入力中{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(transcript_text)
        .block(transcript_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, transcript_area);

    // Input box at the bottom, highlighted while editing
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" 回答 (i to edit) ");

    // Horizontal scroll keeps the cursor visible in a narrow box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (skip_chars, cursor_col) = input_scroll(&app.chat_input, app.chat_cursor, inner_width);

    let mut used = 0usize;
    let visible_text: String = app
        .chat_input
        .chars()
        .skip(skip_chars)
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= inner_width
        })
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let x = input_area.x + 1 + cursor_col;
        let y = input_area.y + 1;
        frame.set_cursor_position((x, y));
    }
}

/// Horizontal scroll for the input box, in display columns: CJK characters
/// are two columns wide, so char counting would drift the cursor. Returns
/// how many leading chars to drop and the cursor's column inside the box.
fn input_scroll(input: &str, cursor: usize, inner_width: usize) -> (usize, u16) {
    let cursor_width: usize = input
        .chars()
        .take(cursor)
        .map(|c| c.width().unwrap_or(0))
        .sum();

    if inner_width == 0 {
        return (0, 0);
    }

    let mut skip_chars = 0;
    let mut skipped_width = 0;
    let mut chars = input.chars();
    // saturating: a wide char can overshoot the cursor in a 1-column box
    while cursor_width.saturating_sub(skipped_width) >= inner_width {
        match chars.next() {
            Some(c) => {
                skipped_width += c.width().unwrap_or(0);
                skip_chars += 1;
            }
            None => break,
        }
    }

    (skip_chars, cursor_width.saturating_sub(skipped_width) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_scroll_matches_plain_offset_for_ascii() {
        assert_eq!(input_scroll("abc", 1, 4), (0, 1));
        // cursor past the right edge: drop chars until it fits on the last column
        assert_eq!(input_scroll("abcdef", 6, 4), (3, 3));
        assert_eq!(input_scroll("", 0, 4), (0, 0));
    }

    #[test]
    fn input_scroll_counts_cjk_as_two_columns() {
        assert_eq!(input_scroll("あいうえお", 0, 6), (0, 0));
        // cursor after 2 chars sits at column 4, still inside a 6-column box
        assert_eq!(input_scroll("あいうえお", 2, 6), (0, 4));
        // cursor at the end (column 10) needs 3 chars dropped to fit
        assert_eq!(input_scroll("あいうえお", 5, 6), (3, 4));
    }

    #[test]
    fn input_scroll_handles_zero_width_box() {
        assert_eq!(input_scroll("あいう", 3, 0), (0, 0));
    }
}
