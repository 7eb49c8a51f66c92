use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::{RgbColor, TopBarButton};

use super::app::{App, Focus, FormState, Modal};
use super::form::FormField;

const APP_TITLE: &str = "CONTACT MANAGER";
const FORM_HELP: &str = "Type to edit  Tab: next field  Enter: add  Esc: cancel edit";
const LIST_HELP: &str = "j/k: move  Enter: view  e: edit  x: delete  Esc: clear  q: quit";
const MODAL_HELP: &str = "Esc/Enter: close";
const FORM_PANE_WIDTH: u16 = 48;

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let buttons = app.top_bar_buttons();
    let total_buttons_width = calculate_buttons_width(buttons);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(total_buttons_width)])
        .split(area);

    let mut spans = vec![Span::styled(APP_TITLE, header_text_style(app))];
    if app.state() == FormState::Editing {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("EDITING", selection_style(app)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    draw_top_bar_buttons(frame, chunks[1], app);
}

fn calculate_buttons_width(buttons: &[TopBarButton]) -> u16 {
    if buttons.is_empty() {
        return 0;
    }

    let max_title_len = buttons
        .iter()
        .map(|b| b.action.title().len())
        .max()
        .unwrap_or(0);

    // Format: " F1: TITLE " = 1 (space) + key.len() + 2 (": ") + title + 1 (space)
    // Keys are F1-F12, so 2-3 chars. Use 3 for consistency.
    let button_width = (1 + 3 + 2 + max_title_len + 1) as u16;

    let num_buttons = buttons.len() as u16;
    let separators = num_buttons.saturating_sub(1);
    button_width * num_buttons + separators
}

fn draw_top_bar_buttons(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let buttons = app.top_bar_buttons();
    if buttons.is_empty() || area.width == 0 {
        return;
    }

    let max_title_len = buttons
        .iter()
        .map(|b| b.action.title().len())
        .max()
        .unwrap_or(0);
    let button_content_width = (1 + 3 + 2 + max_title_len + 1) as u16;

    let colors = app.ui_colors();
    let button_style = Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
        .add_modifier(Modifier::BOLD);

    let mut x = area.x;
    for (idx, button) in buttons.iter().enumerate() {
        if x + button_content_width > area.x + area.width {
            break;
        }

        let text = format!(
            " {}: {:^width$} ",
            button.key,
            button.action.title(),
            width = max_title_len
        );
        let button_area = Rect {
            x,
            y: area.y,
            width: button_content_width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(text).style(button_style).alignment(Alignment::Center),
            button_area,
        );
        x += button_content_width;

        if idx < buttons.len() - 1 && x < area.x + area.width {
            frame.render_widget(Paragraph::new(" "), Rect { x, y: area.y, width: 1, height: 1 });
            x += 1;
        }
    }
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_PANE_WIDTH), Constraint::Min(0)])
        .split(area);
    draw_form(frame, chunks[0], app);
    draw_list(frame, chunks[1], app);
}

fn draw_form(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let title = match app.pending_edit() {
        Some(pending) => format!("EDITING: {}", pending.contact.name.to_uppercase()),
        None => "NEW CONTACT".to_string(),
    };
    let header_line = Line::from(Span::styled(title, header_text_style(app)));
    render_header_with_separator(frame, layout[0], header_line, app, area.width);

    // Label plus colon, padded so values line up
    let label_width = FormField::ALL
        .iter()
        .map(|f| f.label().len() + 1)
        .max()
        .unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor = None;
    for field in FormField::ALL {
        let focused = app.focus == Focus::Field(field);
        let (label_style, value_style) = line_styles(app, focused);
        let label = format!("{:width$} ", format!("{}:", field.label()), width = label_width);
        if focused && app.modal.is_none() {
            let column = Span::raw(&label).width() + app.form.visual_cursor(field);
            cursor = Some((lines.len(), column));
        }
        lines.push(Line::from(vec![
            Span::styled(label, label_style),
            Span::styled(app.form.value(field).to_string(), value_style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), layout[1]);

    if let Some((line_idx, column)) = cursor {
        let x = layout[1].x.saturating_add(column as u16);
        let y = layout[1].y.saturating_add(line_idx as u16);
        frame.set_cursor_position((x, y));
    }
}

fn draw_list(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let names = app.list_names();
    let header_style = if app.focus == Focus::List {
        selection_style(app)
    } else {
        header_text_style(app)
    };
    let header_line = Line::from(Span::styled(format!("CONTACTS ({})", names.len()), header_style));
    render_header_with_separator(frame, layout[0], header_line, app, area.width);

    let items: Vec<ListItem> = if names.is_empty() {
        vec![ListItem::new(Line::from("No contacts"))]
    } else {
        names.into_iter().map(|name| ListItem::new(Line::from(name))).collect()
    };

    let mut state = ListState::default();
    if let Some(selected) = app.selected {
        state.select(Some(selected));
    }

    let list = List::new(items)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ")
        .repeat_highlight_symbol(false);

    frame.render_stateful_widget(list, layout[1], &mut state);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let hint = if app.modal.is_some() {
        MODAL_HELP
    } else if app.focus == Focus::List {
        LIST_HELP
    } else {
        FORM_HELP
    };
    let status = app.status.as_deref().unwrap_or("READY");

    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));
    frame.render_widget(Block::default().style(style), area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(hint.len() as u16)])
        .split(area);
    frame.render_widget(Paragraph::new(status).style(style), chunks[0]);
    frame.render_widget(
        Paragraph::new(hint).style(style).alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.modal.as_ref() else {
        return;
    };

    let label_style = header_text_style(app);
    let (title, mut lines) = match modal {
        Modal::Warning { title, message } => (title.clone(), vec![Line::from(message.clone())]),
        Modal::Details { contact } => {
            let fields = contact.labelled_fields();
            let label_width = fields.iter().map(|(label, _)| label.len() + 1).max().unwrap_or(0);
            let lines = fields
                .iter()
                .map(|(label, value)| {
                    Line::from(vec![
                        Span::styled(
                            format!("{:width$} ", format!("{}:", label), width = label_width),
                            label_style,
                        ),
                        Span::raw(value.to_string()),
                    ])
                })
                .collect();
            ("Contact Information".to_string(), lines)
        }
    };
    lines.push(Line::from(""));
    lines.push(Line::from(MODAL_HELP));

    let title_line = Line::from(Span::styled(title, header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

/// Render a header line with a separator below it.
/// `outer_width` is the full pane width (including borders) for drawing connected separators.
fn render_header_with_separator(
    frame: &mut Frame<'_>,
    area: Rect,
    content: Line<'static>,
    app: &App,
    outer_width: u16,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if area.height == 1 {
        frame.render_widget(Paragraph::new(content), area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(content), layout[0]);

    // ├───┤ spanning the full outer width to meet the side borders
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.repeat(inner_width),
        LINE.vertical_left
    );
    let separator_area = Rect {
        x: layout[1].x.saturating_sub(1),
        y: layout[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, separator_style(app)))),
        separator_area,
    );
}

fn line_styles(app: &App, highlight: bool) -> (Style, Style) {
    if highlight {
        let style = selection_style(app);
        (style, style)
    } else {
        (header_text_style(app), Style::default())
    }
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().separator))
}

fn separator_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().separator))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
