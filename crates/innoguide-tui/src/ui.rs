use innoguide_core::render::RenderPlan;
use innoguide_core::{Accent, Technique, ViewState};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, Focus, NoticeKind};

fn accent_color(accent: Accent) -> Color {
    let (r, g, b) = accent.rgb();
    Color::Rgb(r, g, b)
}

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Headings get their own style; everything else goes through the span parser.
fn markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('#') {
        let heading = trimmed.trim_start_matches('#').trim().replace("**", "");
        return Line::from(Span::styled(
            heading,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }
    parse_markdown_line(text)
}

/// Size of the payload behind a base64 data URI, without decoding it.
fn approx_payload_bytes(uri: &str) -> usize {
    let payload = uri.split_once(',').map(|(_, p)| p).unwrap_or("");
    let padding = payload.chars().rev().take_while(|c| *c == '=').count();
    (payload.len() * 3 / 4).saturating_sub(padding)
}

fn human_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.session.state() {
        ViewState::Idle => render_idle_screen(app, frame, body_area),
        ViewState::Loading => render_loading_screen(app, frame, body_area),
        ViewState::Error => render_error_screen(app, frame, body_area),
        ViewState::Success => render_result_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if let Some(notice) = &app.notice {
        render_notice(notice.kind, &notice.text, frame, area);
    } else if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let model_indicator = match &app.analyzer {
        Some(analyzer) => {
            let key_hint = app
                .api_key
                .as_deref()
                .map(|key| {
                    let tail: String = key.chars().skip(key.chars().count().saturating_sub(4)).collect();
                    format!(" key ...{}", tail)
                })
                .unwrap_or_default();
            format!(" {} / {}{} ", analyzer.text_model(), analyzer.image_model(), key_hint)
        }
        None => " no API key (K to set) ".to_string(),
    };

    let title = Line::from(vec![
        Span::styled(" InnoGuide ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(model_indicator, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.session.state() {
        ViewState::Idle if app.focus != Focus::Techniques => {
            (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black))
        }
        ViewState::Idle => (" CHOOSE ", Style::default().bg(Color::Blue).fg(Color::White)),
        ViewState::Loading => (" WORKING ", Style::default().bg(Color::Magenta).fg(Color::White)),
        ViewState::Error => (" ERROR ", Style::default().bg(Color::Red).fg(Color::White)),
        ViewState::Success => (" RESULT ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: Vec<(&str, &str)> = match app.session.state() {
        ViewState::Idle => match app.focus {
            Focus::Problem => vec![("Enter", "done"), ("Alt+Enter", "newline"), ("Tab", "next")],
            Focus::ImagePath => vec![("Enter", "attach"), ("Esc", "cancel")],
            Focus::Techniques => vec![
                ("j/k", "nav"),
                ("Enter", "apply"),
                ("i", "edit problem"),
                ("a", "attach image"),
                ("x", "clear image"),
                ("K", "api key"),
                ("q", "quit"),
            ],
        },
        ViewState::Loading => vec![("Esc", "back"), ("q", "quit")],
        ViewState::Error => vec![("r", "try again"), ("Esc", "choose different method"), ("q", "quit")],
        ViewState::Success => match app.result_plan() {
            Some(plan @ RenderPlan::Document(_)) => vec![
                ("j/k", "scroll"),
                ("c", plan.action_label()),
                ("r", "regenerate"),
                ("Esc", "back to methods"),
            ],
            Some(plan @ RenderPlan::SingleImage(_)) => vec![
                ("d", plan.action_label()),
                ("r", "regenerate"),
                ("Esc", "back to methods"),
            ],
            _ => vec![
                ("j/k", "select"),
                ("d", "download"),
                ("D", "download all"),
                ("r", "regenerate"),
                ("Esc", "back to methods"),
            ],
        },
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_idle_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [problem_area, image_area, list_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    // Problem statement
    let problem_focused = app.focus == Focus::Problem;
    let problem_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if problem_focused { Color::Cyan } else { Color::DarkGray }))
        .title(" What challenge are you trying to solve? ");

    let problem_text = if app.input.problem_text().is_empty() && !problem_focused {
        Text::from(Span::styled(
            "e.g., Reduce plastic waste, or 'Add a retro filter' (for Visual Prototyping)",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(app.input.problem_text().to_string())
    };
    let problem = Paragraph::new(problem_text)
        .block(problem_block)
        .wrap(Wrap { trim: false });
    frame.render_widget(problem, problem_area);

    if problem_focused {
        // Cursor on the last line of a single-line edit; multi-line text keeps it at the end
        let before: String = app.input.problem_text().chars().take(app.problem_cursor).collect();
        let line = before.lines().count().saturating_sub(1) as u16 + u16::from(before.ends_with('\n'));
        let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) as u16;
        let inner_width = problem_area.width.saturating_sub(2).max(1);
        frame.set_cursor_position((
            problem_area.x + 1 + col % inner_width,
            problem_area.y + 1 + line + col / inner_width,
        ));
    }

    render_image_slot(app, frame, image_area);
    render_technique_list(app, frame, list_area);
}

fn render_image_slot(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::ImagePath;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Cyan } else { Color::DarkGray }))
        .title(" Image (png, jpeg, webp) ");

    let content = if editing {
        Line::from(app.image_path_input.clone())
    } else if let Some(preview) = app.current_preview() {
        Line::from(vec![
            Span::styled("▣ ", Style::default().fg(Color::Magenta)),
            Span::raw(preview.name.clone()),
            Span::styled(format!("  {}  Image attached", human_size(preview.size)), Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(Span::styled(
            "Text input. Press 'a' to attach an image for Visual Prototyping.",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if editing {
        let cursor_x = app.image_path_cursor.min(area.width.saturating_sub(3) as usize) as u16;
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_technique_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Techniques;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Systematic Innovation Toolkit ");

    let items: Vec<ListItem> = Technique::all()
        .into_iter()
        .map(|technique| {
            let def = technique.definition();
            let color = accent_color(def.color);
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!(" {} ", def.icon.glyph()), Style::default().fg(Color::White).bg(color)),
                    Span::raw(" "),
                    Span::styled(def.name, Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("     {}", def.description),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.technique_state);
}

fn render_loading_screen(app: &App, frame: &mut Frame, area: Rect) {
    let technique = app.session.technique();
    let name = technique.map(|t| t.display_name()).unwrap_or("technique");
    let detail = if technique.is_some_and(|t| t.produces_images()) {
        "Generating variations"
    } else {
        "Generating structured solutions for your challenge"
    };
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((app.animation_frame as usize) + 1);

    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            format!("Applying {}{}", name, dots),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::default(),
        Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))).centered(),
    ]);

    let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_error_screen(app: &App, frame: &mut Frame, area: Rect) {
    let message = app.session.error_message().unwrap_or("Something went wrong");

    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Analysis Failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::default(),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::LightRed))).centered(),
        Line::default(),
        Line::from(Span::styled(
            "r: Try Again    Esc: Choose Different Method",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ]);

    let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red));
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn render_result_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(technique) = app.session.technique() else {
        return;
    };
    let def = technique.definition();
    let color = accent_color(def.color);
    let suffix = if technique.produces_images() { "Result" } else { "Analysis" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} {} ", def.name.to_uppercase(), suffix.to_uppercase()),
            Style::default().fg(Color::White).bg(color).add_modifier(Modifier::BOLD),
        ));

    app.result_height = area.height.saturating_sub(2);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.result_plan() {
        Some(RenderPlan::Document(markdown)) => {
            let lines: Vec<Line> = markdown.lines().map(markdown_line).collect();
            let document = Paragraph::new(Text::from(lines))
                .wrap(Wrap { trim: false })
                .scroll((app.result_scroll, 0));
            frame.render_widget(document, inner);
        }
        Some(RenderPlan::SingleImage(uri)) => {
            let size = human_size(approx_payload_bytes(uri));
            let text = Text::from(vec![
                Line::default(),
                Line::from(format!("▣ Generated prototype ({})", size)).centered(),
                Line::default(),
                Line::from(Span::styled(
                    "Press d to download the image",
                    Style::default().fg(Color::DarkGray),
                ))
                .centered(),
            ]);
            frame.render_widget(Paragraph::new(text), inner);
        }
        Some(RenderPlan::ImageGrid(images)) => {
            let images = images.to_vec();
            render_variations(app, &images, frame, inner);
        }
        None => {}
    }
}

fn render_variations(app: &mut App, images: &[String], frame: &mut Frame, area: Rect) {
    let saved_height = if app.saved_paths.is_empty() {
        0
    } else {
        (app.saved_paths.len().min(6) + 1) as u16
    };
    let [intro_area, list_area, saved_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(saved_height),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(format!(
            "Here are {} generated variation(s) based on your request:",
            images.len()
        ))
        .style(Style::default().fg(Color::Gray)),
        intro_area,
    );

    let items: Vec<ListItem> = images
        .iter()
        .enumerate()
        .map(|(i, uri)| {
            let mime = uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .unwrap_or("image");
            ListItem::new(Line::from(vec![
                Span::styled(format!(" ▣ Variation {} ", i + 1), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" {}  {}", mime, human_size(approx_payload_bytes(uri))),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.variation_state);

    if saved_height > 0 {
        let mut lines = vec![Line::from(Span::styled(
            "Saved:",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            app.saved_paths
                .iter()
                .rev()
                .take(6)
                .map(|path| Line::from(format!("  {}", path.display()))),
        );
        frame.render_widget(Paragraph::new(lines), saved_area);
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_notice(kind: NoticeKind, text: &str, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let (title, color) = match kind {
        NoticeKind::Info => (" Notice ", Color::Cyan),
        NoticeKind::Warning => (" Heads up ", Color::Yellow),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let body = Text::from(vec![
        Line::from(text.to_string()),
        Line::default(),
        Line::from(Span::styled("Press any key", Style::default().fg(Color::DarkGray))),
    ]);
    frame.render_widget(Paragraph::new(body).block(block).wrap(Wrap { trim: true }), popup_area);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 60, 7);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Enter Gemini API Key ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Instructions
    let instructions = Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));

    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    // Input field
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);

    // Mask the key with asterisks (show last 4 chars)
    let char_count = app.api_key_input.chars().count();
    let display_text = if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let masked_len = char_count - 4;
        let last_four: String = app.api_key_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };

    let input = Paragraph::new(display_text)
        .style(Style::default().fg(Color::Cyan));

    frame.render_widget(input, input_area);

    // Status line
    let status = Paragraph::new(format!("{} characters", char_count))
        .style(Style::default().fg(Color::DarkGray));

    let status_area = Rect::new(inner.x, inner.y + 4, inner.width, 1);
    frame.render_widget(status, status_area);
}
